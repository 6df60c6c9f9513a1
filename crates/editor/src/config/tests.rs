use std::io::Write;
use std::time::Duration;

use bramble_scope::Rgb;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_empty_input_is_all_defaults() {
	assert_eq!(BrambleConfig::from_toml_str("").unwrap(), BrambleConfig::default());
}

#[test]
fn test_partial_sections_keep_other_defaults() {
	let config = BrambleConfig::from_toml_str(
		r#"
[scheduler]
slice_ms = 40

[scope]
strength = 10

[scope.palette]
class_fill = [1, 2, 3]

[vm]
program = "java"
args = ["-cp", "lib", "bramble.runtime.Agent"]
request_timeout_secs = 3
"#,
	)
	.unwrap();

	assert_eq!(config.parser, ParserConfig::default());
	assert_eq!(config.scheduler.budget(), DrainBudget::time(Duration::from_millis(40)));
	assert_eq!(config.scope.strength, 10);
	assert_eq!(config.scope.char_width, 8);
	assert_eq!(config.scope.palette.class_fill, Rgb(1, 2, 3));
	assert_eq!(config.scope.palette.method_fill, ScopePalette::default().method_fill);
	assert_eq!(config.vm.command.program, "java");
	assert_eq!(config.vm.command.args.len(), 3);
	assert_eq!(config.vm.trace_filters, VmConfig::default().trace_filters);

	let options = config.vm.bridge_options();
	assert_eq!(options.request_timeout, Duration::from_secs(3));
	assert_eq!(options.stack_filter, StackFilter::default());
}

#[test]
fn test_strength_above_maximum_is_rejected() {
	let err = BrambleConfig::from_toml_str("[scope]\nstrength = 21\n").unwrap_err();
	assert!(matches!(err, ConfigError::Strength(21)), "{err}");
}

#[test]
fn test_type_mismatch_is_a_parse_error() {
	let err = BrambleConfig::from_toml_str("[parser]\nmax_parse_piece = \"big\"\n").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn test_load_reads_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "[parser]\nmax_parse_piece = 64").unwrap();
	let config = BrambleConfig::load(file.path()).unwrap();
	assert_eq!(config.parser.max_parse_piece, 64);
}

#[test]
fn test_missing_file_means_defaults() {
	let dir = tempfile::tempdir().unwrap();
	let config = BrambleConfig::load(dir.path().join("bramble.toml")).unwrap();
	assert_eq!(config, BrambleConfig::default());
}

#[test]
fn test_unreadable_path_reports_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let err = BrambleConfig::load(dir.path()).unwrap_err();
	assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}
