//! Bounded record of the most recent document edits.
//!
//! Kept for diagnostics only: when the parser has to abandon a node, the log
//! is dumped so the offending edit sequence can be reproduced.

use std::collections::VecDeque;
use std::fmt;

use crate::document::{DocEdit, EditKind};
use crate::range::{CharIdx, CharLen};

/// Number of edits retained.
pub const EDIT_LOG_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRecord {
	pub kind: EditKind,
	pub offset: CharIdx,
	pub length: CharLen,
}

impl fmt::Display for EditRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let op = match self.kind {
			EditKind::Insert => "insert",
			EditKind::Remove => "remove",
		};
		write!(f, "{op}@{}+{}", self.offset, self.length)
	}
}

#[derive(Debug, Clone, Default)]
pub struct EditLog {
	records: VecDeque<EditRecord>,
}

impl EditLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, edit: &DocEdit) {
		if self.records.len() == EDIT_LOG_CAPACITY {
			self.records.pop_front();
		}
		self.records.push_back(EditRecord {
			kind: edit.kind,
			offset: edit.offset,
			length: edit.length,
		});
	}

	/// Oldest first.
	pub fn iter(&self) -> impl Iterator<Item = &EditRecord> {
		self.records.iter()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

impl fmt::Display for EditLog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, record) in self.records.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{record}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Document;

	#[test]
	fn test_log_keeps_most_recent() {
		let mut doc = Document::new();
		let mut log = EditLog::new();
		for i in 0..12 {
			let edit = doc.insert(i, "x").unwrap();
			log.record(&edit);
		}
		assert_eq!(log.len(), EDIT_LOG_CAPACITY);
		assert_eq!(log.iter().next().map(|r| r.offset), Some(2));
		assert!(log.to_string().starts_with("insert@2+1, insert@3+1"));
	}
}
