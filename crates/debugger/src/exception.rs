use std::fmt;

use serde::{Deserialize, Serialize};

/// Class patterns for frames that belong to the VM agent or reflection
/// machinery rather than user code.
pub const DEFAULT_INTERNAL_FRAMES: &[&str] = &["bramble.runtime.*", "java.lang.reflect.*", "jdk.internal.reflect.*", "sun.reflect.*"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
	pub class_name: String,
	pub method: String,
	pub file: Option<String>,
	pub line: Option<u32>,
}

impl StackFrame {
	pub fn new(class_name: impl Into<String>, method: impl Into<String>) -> Self {
		Self {
			class_name: class_name.into(),
			method: method.into(),
			file: None,
			line: None,
		}
	}

	pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
		self.file = Some(file.into());
		self.line = Some(line);
		self
	}
}

impl fmt::Display for StackFrame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "at {}.{}", self.class_name, self.method)?;
		match (&self.file, self.line) {
			(Some(file), Some(line)) => write!(f, "({file}:{line})"),
			(Some(file), None) => write!(f, "({file})"),
			_ => f.write_str("(Unknown Source)"),
		}
	}
}

/// An exception thrown by user code in the execution VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
	pub class_name: String,
	pub message: Option<String>,
	pub stack: Vec<StackFrame>,
}

impl ExceptionInfo {
	pub fn new(class_name: impl Into<String>, message: Option<String>) -> Self {
		Self {
			class_name: class_name.into(),
			message,
			stack: Vec::new(),
		}
	}

	pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
		self.stack = stack;
		self
	}

	/// Drops the frames `filter` marks as internal.
	pub fn filtered(mut self, filter: &StackFilter) -> Self {
		self.stack.retain(|frame| !filter.is_internal(frame));
		self
	}
}

impl fmt::Display for ExceptionInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.class_name)?;
		if let Some(message) = &self.message {
			write!(f, ": {message}")?;
		}
		Ok(())
	}
}

/// Decides which stack frames are hidden from the user.
///
/// A pattern ending in `.*` matches every class in that package and its
/// subpackages; any other pattern matches one class exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackFilter {
	patterns: Vec<String>,
}

impl Default for StackFilter {
	fn default() -> Self {
		Self::new(DEFAULT_INTERNAL_FRAMES.iter().copied())
	}
}

impl StackFilter {
	pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
		Self {
			patterns: patterns.into_iter().map(Into::into).collect(),
		}
	}

	/// A filter that keeps every frame.
	pub fn none() -> Self {
		Self { patterns: Vec::new() }
	}

	pub fn patterns(&self) -> &[String] {
		&self.patterns
	}

	pub fn is_internal(&self, frame: &StackFrame) -> bool {
		let class = frame.class_name.as_str();
		self.patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
			Some(prefix) => class.starts_with(prefix),
			None => class == pattern,
		})
	}
}
