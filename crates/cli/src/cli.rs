use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bramble")]
#[command(about = "Java teaching workbench: structure, scopes and a scratch VM")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults apply when omitted or missing)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Log more; repeat for trace output
	#[arg(long, short = 'v', action = ArgAction::Count, global = true)]
	pub verbose: u8,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Print the node tree of a Java file
	Parse {
		/// Java source file.
		file: PathBuf,
	},
	/// Print the scope boxes of every line
	Scopes {
		/// Java source file.
		file: PathBuf,
		/// Override the configured scope strength (0-20)
		#[arg(long, value_parser = clap::value_parser!(u8).range(0..=20))]
		strength: Option<u8>,
	},
	/// Print each line split into styled segments
	Highlight {
		/// Java source file.
		file: PathBuf,
	},
	/// Serve the scratch VM protocol on stdin/stdout
	VmAgent,
}

impl Cli {
	pub fn log_level(&self) -> tracing::Level {
		match self.verbose {
			0 => tracing::Level::INFO,
			1 => tracing::Level::DEBUG,
			_ => tracing::Level::TRACE,
		}
	}
}

#[cfg(test)]
mod tests;
