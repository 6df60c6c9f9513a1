//! Whether a node shows on a line.
//!
//! A node officially starts on the line holding its first character and ends
//! on the line holding its last, but a scope box should only cover lines
//! where the node has visible content. A node whose start line holds nothing
//! after it but blanks (or a comment that ends on that line) is drawn from the
//! next line down; a node whose end line holds only blanks before its end is
//! drawn up to the previous line.

use bramble_primitives::{CharIdx, Document, LineIdx};
use bramble_syntax::{NodePos, NodeTree};

/// Extent of one document line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineExtent {
	pub line: LineIdx,
	pub start: CharIdx,
	/// Offset of the line terminator, or `end` on the last line.
	pub content_end: CharIdx,
	/// Start of the next line.
	pub end: CharIdx,
}

impl LineExtent {
	pub fn of(doc: &Document, line: LineIdx) -> Option<Self> {
		(line < doc.line_count()).then(|| Self {
			line,
			start: doc.line_start(line),
			content_end: doc.line_content_end(line),
			end: doc.line_end(line),
		})
	}

	/// True if `[start, end)` shares a character with this line.
	pub fn overlaps(&self, node: NodePos) -> bool {
		node.start < self.end.max(self.start + 1) && node.end > self.start
	}
}

fn is_blank(ch: char) -> bool {
	matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// End of a comment node starting exactly at `pos` and ending on `line`.
fn comment_ending_at_line(tree: &NodeTree, pos: CharIdx, line: &LineExtent) -> Option<CharIdx> {
	let node = tree.deepest_at(pos);
	let is_comment = tree.kind(node.id).is_some_and(|k| k.is_comment());
	(is_comment && node.start == pos && node.end <= line.end).then_some(node.end)
}

/// First non-blank character in `[from, until)` on `line`.
pub fn first_nonblank(doc: &Document, line: &LineExtent, from: CharIdx, until: CharIdx) -> Option<CharIdx> {
	let from = from.max(line.start);
	let until = until.min(line.content_end);
	doc.chars_at(from)
		.take(until.saturating_sub(from))
		.position(|ch| !is_blank(ch))
		.map(|offset| from + offset)
}

/// Like [`first_nonblank`], but comment nodes ending on `line` count as blank.
pub fn first_significant(doc: &Document, tree: &NodeTree, line: &LineExtent, from: CharIdx, until: CharIdx) -> Option<CharIdx> {
	let until = until.min(line.content_end);
	let mut pos = from.max(line.start);
	while let Some(found) = first_nonblank(doc, line, pos, until) {
		match comment_ending_at_line(tree, found, line) {
			Some(end) if end > found => pos = end,
			_ => return Some(found),
		}
	}
	None
}

/// Last non-blank character on `line` before `pos`.
pub fn last_nonblank_before(doc: &Document, line: &LineExtent, pos: CharIdx) -> Option<CharIdx> {
	let pos = pos.min(line.content_end);
	doc.chars_at(line.start)
		.take(pos.saturating_sub(line.start))
		.enumerate()
		.filter(|(_, ch)| !is_blank(*ch))
		.last()
		.map(|(offset, _)| line.start + offset)
}

/// True if `node` starts after `line` or has nothing visible on it yet.
///
/// A missing line (above the first) always counts as skipped.
pub fn skips_start(doc: &Document, tree: &NodeTree, node: NodePos, line: Option<&LineExtent>) -> bool {
	let Some(line) = line else {
		return true;
	};
	if node.start > line.start && node.end > line.end {
		return node.start >= line.end || first_significant(doc, tree, line, node.start, line.content_end).is_none();
	}
	false
}

/// True if `node` ended before `line` or has only blanks on it.
///
/// A missing line (below the last) always counts as skipped.
pub fn skips_end(doc: &Document, node: NodePos, line: Option<&LineExtent>) -> bool {
	let Some(line) = line else {
		return true;
	};
	if node.end < line.end && node.start < line.start {
		return node.end <= line.start || first_nonblank(doc, line, line.start, node.end).is_none();
	}
	false
}
