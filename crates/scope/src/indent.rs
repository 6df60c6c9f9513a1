use bramble_primitives::{CharIdx, Document};
use bramble_syntax::{NodeId, NodePos, NodeTree};
use rustc_hash::FxHashMap;

use crate::layout::{Px, TextLayout};
use crate::lines::{LineExtent, first_nonblank};

/// What is known about a node's indent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentState {
	Unknown,
	Cached(Px),
	/// Invalidated, keeping the last value (if any) until recomputed.
	Stale(Option<Px>),
}

impl IndentState {
	/// The value to draw with, current or not.
	pub fn last_known(self) -> Option<Px> {
		match self {
			Self::Unknown => None,
			Self::Cached(px) => Some(px),
			Self::Stale(last) => last,
		}
	}
}

/// Pixel indents per node plus the widths of runs of leading spaces.
///
/// The space-width table lets indents on lines that are not laid out be
/// derived from lines that are: `space_widths[n]` is the left edge of a
/// character preceded by `n` spaces.
#[derive(Debug, Default)]
pub struct IndentCache {
	entries: FxHashMap<NodeId, IndentState>,
	space_widths: Vec<Px>,
}

/// Minimum number of measured space widths before off-screen positions are extrapolated.
const MIN_SPACE_SAMPLES: usize = 4;

impl IndentCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self, id: NodeId) -> IndentState {
		self.entries.get(&id).copied().unwrap_or(IndentState::Unknown)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn store(&mut self, id: NodeId, indent: Px) {
		self.entries.insert(id, IndentState::Cached(indent));
	}

	/// Marks a cached indent stale. Unknown entries stay unknown.
	pub fn invalidate(&mut self, id: NodeId) {
		if let Some(entry) = self.entries.get_mut(&id) {
			*entry = IndentState::Stale(entry.last_known());
		}
	}

	pub fn forget(&mut self, id: NodeId) {
		self.entries.remove(&id);
	}

	/// Drops entries of nodes no longer in `tree`.
	pub fn retain_live(&mut self, tree: &NodeTree) {
		self.entries.retain(|id, _| tree.contains(*id));
	}

	/// Drops all node indents, keeping the space-width table.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Drops everything, including the space-width table.
	pub fn reset(&mut self) {
		self.entries.clear();
		self.space_widths.clear();
	}

	pub fn space_widths(&self) -> &[Px] {
		&self.space_widths
	}

	/// Left edge of the character at `pos`.
	///
	/// Characters preceded only by spaces are served from the space-width
	/// table, which is extended from the layout while it can answer and
	/// extrapolated once enough widths are known.
	pub fn left_edge(&mut self, layout: &dyn TextLayout, doc: &Document, pos: CharIdx) -> Option<Px> {
		let start = doc.line_start(doc.line_of(pos));
		let column = pos.checked_sub(start)?;
		let all_spaces = doc.chars_at(start).take(column).all(|ch| ch == ' ');
		if !all_spaces {
			return layout.left_edge(doc, pos);
		}
		while self.space_widths.len() <= column {
			match layout.left_edge(doc, start + self.space_widths.len()) {
				Some(x) => self.space_widths.push(x),
				None => return self.estimate_spaces(column),
			}
		}
		self.space_widths.get(column).copied()
	}

	fn estimate_spaces(&self, spaces: usize) -> Option<Px> {
		if self.space_widths.len() < MIN_SPACE_SAMPLES {
			return None;
		}
		let first = *self.space_widths.first()?;
		let highest = self.space_widths.len() - 1;
		let span = self.space_widths[highest].checked_sub(first)?;
		let per_space = f64::from(span) / highest as f64;
		Some(first + (per_space * spaces as f64) as Px)
	}

	/// Computes the indent of `node`: the leftmost edge among the first
	/// visible characters of each of its lines, ignoring the interiors of
	/// bodies and comments nested in it.
	///
	/// Returns `None` if no such character could be placed, or if the node
	/// does not fit the document.
	pub fn compute(&mut self, layout: &dyn TextLayout, doc: &Document, tree: &NodeTree, node: NodePos) -> Option<Px> {
		if node.end > doc.len_chars() || !tree.contains(node.id) {
			tracing::debug!(start = node.start, end = node.end, "scope.indent_unknown");
			return None;
		}
		let mut indent: Option<Px> = None;
		let mut pos = node.start;
		while pos < node.end {
			let line = doc.line_of(pos);
			let extent = LineExtent::of(doc, line)?;
			let Some(found) = first_nonblank(doc, &extent, pos, node.end) else {
				pos = extent.end.max(pos + 1);
				continue;
			};
			if let Some(end) = nested_inner_end(tree, node, found) {
				pos = end.max(found + 1);
				continue;
			}
			if let Some(x) = self.left_edge(layout, doc, found) {
				indent = Some(indent.map_or(x, |i| i.min(x)));
			}
			pos = extent.end.max(found + 1);
		}
		indent
	}
}

/// End of the outermost inner node strictly inside `node` containing `pos`.
fn nested_inner_end(tree: &NodeTree, node: NodePos, pos: CharIdx) -> Option<CharIdx> {
	let mut current = node;
	loop {
		let child = tree.children_of(current).find(|c| c.start <= pos && pos < c.end)?;
		if tree.kind(child.id)?.is_inner() {
			return Some(child.end);
		}
		current = child;
	}
}

#[cfg(test)]
mod tests {
	use bramble_syntax::parse_document;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::layout::MonospaceLayout;

	#[test]
	fn test_invalidate_keeps_last_value() {
		let tree = NodeTree::new(0);
		let id = tree.root();
		let mut cache = IndentCache::new();
		cache.invalidate(id);
		assert_eq!(cache.state(id), IndentState::Unknown);
		cache.store(id, 12);
		cache.invalidate(id);
		assert_eq!(cache.state(id), IndentState::Stale(Some(12)));
		assert_eq!(cache.state(id).last_known(), Some(12));
		cache.forget(id);
		assert_eq!(cache.state(id), IndentState::Unknown);
	}

	#[test]
	fn test_space_table_extrapolates_off_screen_indents() {
		let doc = Document::from("        a\n\n            b\n");
		let layout = MonospaceLayout::new(8, 400).with_visible(0..=0);
		let mut cache = IndentCache::new();
		assert_eq!(cache.left_edge(&layout, &doc, 8), Some(64));
		assert_eq!(cache.space_widths().len(), 9);
		let b = doc.line_start(2) + 12;
		assert_eq!(cache.left_edge(&layout, &doc, b), Some(96));
	}

	#[test]
	fn test_space_table_needs_samples() {
		let doc = Document::from("a\n\n    b\n");
		let layout = MonospaceLayout::new(8, 400).with_visible(0..=0);
		let mut cache = IndentCache::new();
		assert_eq!(cache.left_edge(&layout, &doc, 0), Some(0));
		assert_eq!(cache.left_edge(&layout, &doc, doc.line_start(2) + 4), None);
	}

	#[test]
	fn test_compute_skips_bodies() {
		let src = "class A {\n        int x;\n  }\n";
		let doc = Document::from(src);
		let tree = parse_document(doc.text());
		let layout = MonospaceLayout::new(8, 400);
		let mut cache = IndentCache::new();
		let class = tree.children_of(tree.root_pos()).next().unwrap();
		assert_eq!(cache.compute(&layout, &doc, &tree, class), Some(0));
		let body = tree.children_of(class).next().unwrap();
		assert_eq!(cache.compute(&layout, &doc, &tree, body), Some(64));
	}
}
