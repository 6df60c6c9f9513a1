//! Document adapter: the only way text changes.
//!
//! Every mutation returns a [`DocEdit`] describing the change. Consumers (the
//! reparse scheduler, the node tree and the scope renderer) are driven from
//! these records in the order the edits were applied.

use std::borrow::Cow;

use ropey::{Rope, RopeSlice};

use crate::range::{CharIdx, CharLen, LineIdx};
use crate::rope::{line_content_end, trim_line_ending};

#[cfg(test)]
mod tests;

/// Error returned for edits or reads outside the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
	#[error("range {pos}..{end} is outside document of length {doc_len}")]
	OutOfBounds { pos: CharIdx, end: CharIdx, doc_len: CharLen },
}

/// Kind of document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
	Insert,
	Remove,
}

/// Notification produced by every document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEdit {
	pub kind: EditKind,
	/// Character offset of the change.
	pub offset: CharIdx,
	/// Number of characters inserted or removed.
	pub length: CharLen,
	/// Inserted text for insertions, removed text for removals.
	pub text: String,
	/// Line on which the change starts.
	pub start_line: LineIdx,
	pub lines_added: usize,
	pub lines_removed: usize,
}

impl DocEdit {
	/// End of the affected range in post-edit coordinates.
	pub fn end(&self) -> CharIdx {
		match self.kind {
			EditKind::Insert => self.offset + self.length,
			EditKind::Remove => self.offset,
		}
	}
}

/// Rope-backed editable document.
#[derive(Debug, Clone, Default)]
pub struct Document {
	text: Rope,
}

impl Document {
	pub fn new() -> Self {
		Self::default()
	}

	/// Read-only view over the whole text.
	pub fn text(&self) -> RopeSlice<'_> {
		self.text.slice(..)
	}

	pub fn rope(&self) -> &Rope {
		&self.text
	}

	pub fn len_chars(&self) -> CharLen {
		self.text.len_chars()
	}

	pub fn is_empty(&self) -> bool {
		self.text.len_chars() == 0
	}

	/// Number of lines, counting the empty line after a trailing newline.
	pub fn line_count(&self) -> usize {
		self.text.len_lines()
	}

	/// Offset of the first character of `line`. Lines past the end map to the document end.
	pub fn line_start(&self, line: LineIdx) -> CharIdx {
		if line >= self.text.len_lines() {
			return self.text.len_chars();
		}
		self.text.line_to_char(line)
	}

	/// Offset of the start of the following line, or the document end for the last line.
	pub fn line_end(&self, line: LineIdx) -> CharIdx {
		self.line_start(line + 1)
	}

	/// Offset just before the terminator of `line`.
	pub fn line_content_end(&self, line: LineIdx) -> CharIdx {
		if line >= self.text.len_lines() {
			return self.text.len_chars();
		}
		line_content_end(self.text(), line)
	}

	/// Line containing `pos`. Positions past the end map to the last line.
	pub fn line_of(&self, pos: CharIdx) -> LineIdx {
		self.text.char_to_line(pos.min(self.text.len_chars()))
	}

	pub fn column_of(&self, pos: CharIdx) -> usize {
		let pos = pos.min(self.text.len_chars());
		pos - self.line_start(self.line_of(pos))
	}

	pub fn char_at(&self, pos: CharIdx) -> Option<char> {
		self.text.get_char(pos)
	}

	/// Reads `len` characters starting at `pos`.
	pub fn read(&self, pos: CharIdx, len: CharLen) -> Result<Cow<'_, str>, EditError> {
		self.check(pos, len)?;
		Ok(self.text.slice(pos..pos + len).into())
	}

	/// Text of `line` without its terminator.
	pub fn line_text(&self, line: LineIdx) -> Cow<'_, str> {
		if line >= self.text.len_lines() {
			return Cow::Borrowed("");
		}
		trim_line_ending(self.text.line(line)).into()
	}

	/// Character iterator starting at `pos`.
	pub fn chars_at(&self, pos: CharIdx) -> ropey::iter::Chars<'_> {
		self.text.chars_at(pos.min(self.text.len_chars()))
	}

	pub fn insert(&mut self, pos: CharIdx, text: &str) -> Result<DocEdit, EditError> {
		self.check(pos, 0)?;
		let start_line = self.line_of(pos);
		let before = self.text.len_lines();
		let length = text.chars().count();
		self.text.insert(pos, text);
		let edit = DocEdit {
			kind: EditKind::Insert,
			offset: pos,
			length,
			text: text.to_owned(),
			start_line,
			lines_added: self.text.len_lines() - before,
			lines_removed: 0,
		};
		tracing::trace!(offset = pos, length, lines_added = edit.lines_added, "document.insert");
		Ok(edit)
	}

	pub fn remove(&mut self, pos: CharIdx, len: CharLen) -> Result<DocEdit, EditError> {
		self.check(pos, len)?;
		let start_line = self.line_of(pos);
		let before = self.text.len_lines();
		let removed = self.text.slice(pos..pos + len).to_string();
		self.text.remove(pos..pos + len);
		let edit = DocEdit {
			kind: EditKind::Remove,
			offset: pos,
			length: len,
			text: removed,
			start_line,
			lines_added: 0,
			lines_removed: before - self.text.len_lines(),
		};
		tracing::trace!(offset = pos, length = len, lines_removed = edit.lines_removed, "document.remove");
		Ok(edit)
	}

	fn check(&self, pos: CharIdx, len: CharLen) -> Result<(), EditError> {
		let doc_len = self.text.len_chars();
		match pos.checked_add(len) {
			Some(end) if end <= doc_len => Ok(()),
			_ => Err(EditError::OutOfBounds {
				pos,
				end: pos.saturating_add(len),
				doc_len,
			}),
		}
	}
}

impl From<&str> for Document {
	fn from(text: &str) -> Self {
		Self { text: Rope::from_str(text) }
	}
}

impl std::fmt::Display for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.text)
	}
}
