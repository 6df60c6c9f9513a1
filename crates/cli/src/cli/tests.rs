use pretty_assertions::assert_eq;

use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(std::iter::once("bramble").chain(args.iter().copied())).unwrap()
}

#[test]
fn parse_file_subcommand() {
	let cli = parse(&["parse", "Shape.java"]);
	assert_eq!(cli.command, Command::Parse { file: PathBuf::from("Shape.java") });
	assert_eq!(cli.config, None);
	assert_eq!(cli.log_level(), tracing::Level::INFO);
}

#[test]
fn global_flags_follow_subcommand() {
	let cli = parse(&["scopes", "A.java", "--strength", "5", "-vv", "-c", "bramble.toml"]);
	assert_eq!(
		cli.command,
		Command::Scopes {
			file: PathBuf::from("A.java"),
			strength: Some(5),
		}
	);
	assert_eq!(cli.config, Some(PathBuf::from("bramble.toml")));
	assert_eq!(cli.log_level(), tracing::Level::TRACE);
}

#[test]
fn strength_out_of_range_is_rejected() {
	let args = ["bramble", "scopes", "A.java", "--strength", "21"];
	assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn vm_agent_takes_no_file() {
	assert_eq!(parse(&["vm-agent"]).command, Command::VmAgent);
	assert!(Cli::try_parse_from(["bramble"]).is_err());
}
