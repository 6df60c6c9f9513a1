//! Editor configuration.
//!
//! Read from a TOML file. Every section and key is optional; anything left
//! out keeps its default, and a missing file means all defaults.
//!
//! ```toml
//! [parser]
//! max_parse_piece = 8000
//!
//! [scheduler]
//! slice_ms = 15
//!
//! [scope]
//! strength = 14
//! char_width = 8
//!
//! [scope.palette]
//! class_fill = [245, 255, 235]
//!
//! [vm]
//! program = "bramble"
//! args = ["vm-agent"]
//! request_timeout_secs = 10
//! trace_filters = ["bramble.runtime.*"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use bramble_debugger::exception::DEFAULT_INTERNAL_FRAMES;
use bramble_debugger::{BridgeOptions, StackFilter, VmCommand};
use bramble_primitives::CharLen;
use bramble_scope::{MAX_STRENGTH, MonospaceLayout, Px, ScopePalette};
use bramble_syntax::DEFAULT_MAX_PARSE_PIECE;
use bramble_worker::DrainBudget;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("scope strength {0} is above the maximum of {MAX_STRENGTH}")]
	Strength(u8),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrambleConfig {
	pub parser: ParserConfig,
	pub scheduler: SchedulerConfig,
	pub scope: ScopeConfig,
	pub vm: VmConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
	/// Minimum characters handled by one reparse step.
	pub max_parse_piece: CharLen,
}

impl Default for ParserConfig {
	fn default() -> Self {
		Self {
			max_parse_piece: DEFAULT_MAX_PARSE_PIECE,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
	/// Time the UI thread spends reparsing per slice.
	pub slice_ms: u64,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self { slice_ms: 15 }
	}
}

impl SchedulerConfig {
	pub fn budget(&self) -> DrainBudget {
		DrainBudget::time(Duration::from_millis(self.slice_ms))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
	/// Colour strength from 0 (no scopes) to [`MAX_STRENGTH`].
	pub strength: u8,
	pub char_width: Px,
	pub tab_width: usize,
	pub text_width: Px,
	pub palette: ScopePalette,
}

impl Default for ScopeConfig {
	fn default() -> Self {
		Self {
			strength: MAX_STRENGTH,
			char_width: 8,
			tab_width: 4,
			text_width: 800,
			palette: ScopePalette::default(),
		}
	}
}

impl ScopeConfig {
	/// Palette after applying `strength`.
	pub fn effective_palette(&self) -> ScopePalette {
		self.palette.reduced(self.strength)
	}

	pub fn layout(&self) -> MonospaceLayout {
		MonospaceLayout::new(self.char_width, self.text_width).with_tab_width(self.tab_width)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
	#[serde(flatten)]
	pub command: VmCommand,
	pub request_timeout_secs: u64,
	/// Class patterns hidden from exception stack traces.
	pub trace_filters: Vec<String>,
}

impl Default for VmConfig {
	fn default() -> Self {
		Self {
			command: VmCommand::default(),
			request_timeout_secs: 10,
			trace_filters: DEFAULT_INTERNAL_FRAMES.iter().map(|s| (*s).to_owned()).collect(),
		}
	}
}

impl VmConfig {
	pub fn bridge_options(&self) -> BridgeOptions {
		BridgeOptions {
			request_timeout: Duration::from_secs(self.request_timeout_secs),
			stack_filter: StackFilter::new(self.trace_filters.iter().cloned()),
		}
	}
}

impl BrambleConfig {
	/// Parses a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads a config file, falling back to defaults if it does not exist.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		match std::fs::read_to_string(path) {
			Ok(content) => Self::from_toml_str(&content),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "config.defaults");
				Ok(Self::default())
			}
			Err(error) => Err(ConfigError::Io {
				path: path.to_path_buf(),
				error,
			}),
		}
	}

	fn validate(&self) -> Result<()> {
		if self.scope.strength > MAX_STRENGTH {
			return Err(ConfigError::Strength(self.scope.strength));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
