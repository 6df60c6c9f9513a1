use std::mem;

use bramble_primitives::{CharIdx, DocEdit, Document, EditKind, LineIdx};
use bramble_syntax::{NodeId, NodePos, NodeTree, NodeTreeDelta};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::indent::{IndentCache, IndentState};
use crate::layout::{Px, TextLayout};
use crate::lines::{LineExtent, first_significant, last_nonblank_before, skips_end, skips_start};
use crate::palette::{Rgb, ScopePalette};


const LEFT_INNER_SCOPE_MARGIN: Px = 5;
const LEFT_OUTER_SCOPE_MARGIN: Px = 2;
const RIGHT_SCOPE_MARGIN: Px = 4;
const RIGHT_EDGE_MARGIN: Px = 2;
const CORNER_RADIUS: f32 = 5.0;

/// One nested scope rectangle on one line.
///
/// Boxes of a line are kept outermost first, so later boxes paint over
/// earlier ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeBox {
	pub line: LineIdx,
	pub left: Px,
	pub right: Px,
	/// The scope starts on this line; top corners are rounded.
	pub starts: bool,
	/// The scope ends on this line; bottom corners are rounded.
	pub ends: bool,
	pub fill: Rgb,
	pub edge: Rgb,
	/// Node the left edge is derived from.
	pub source: NodeId,
}

/// Edge thickness between a box's outline and its fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxInsets {
	pub top: Px,
	pub right: Px,
	pub bottom: Px,
	pub left: Px,
}

impl ScopeBox {
	pub fn width(&self) -> Px {
		self.right.saturating_sub(self.left)
	}

	/// Radii as top-left, top-right, bottom-right, bottom-left.
	pub fn corner_radii(&self) -> [f32; 4] {
		let top = if self.starts { CORNER_RADIUS } else { 0.0 };
		let bottom = if self.ends { CORNER_RADIUS } else { 0.0 };
		[top, top, bottom, bottom]
	}

	/// Where the fill sits inside the edge colour.
	pub fn fill_insets(&self) -> BoxInsets {
		BoxInsets {
			top: self.starts.into(),
			right: 1,
			bottom: self.ends.into(),
			left: 1,
		}
	}
}

/// What changed since boxes were last computed.
#[derive(Debug, Clone, Copy)]
pub enum Damage<'a> {
	/// A document edit and the tree changes it caused.
	Edit { edit: &'a DocEdit, delta: &'a NodeTreeDelta },
	/// Tree changes made by a reparse step.
	Reparse(&'a NodeTreeDelta),
	/// The text width changed.
	Resize,
}

/// Scope boxes for one document.
///
/// Recalculated boxes collect in a pending set and become visible through
/// [`ScopeView::apply_pending`], so a half-finished reparse never shows.
#[derive(Debug)]
pub struct ScopeView<L> {
	layout: L,
	palette: ScopePalette,
	indents: IndentCache,
	pending: FxHashMap<LineIdx, Vec<ScopeBox>>,
	live: FxHashMap<LineIdx, Vec<ScopeBox>>,
	rendered: Option<(LineIdx, LineIdx)>,
}

type CharRange = Option<(CharIdx, CharIdx)>;

fn widen(range: &mut CharRange, start: CharIdx, end: CharIdx) {
	*range = Some(match *range {
		Some((s, e)) => (s.min(start), e.max(end)),
		None => (start, end),
	});
}

fn shift_lines(map: &mut FxHashMap<LineIdx, Vec<ScopeBox>>, shift: impl Fn(LineIdx) -> Option<LineIdx>) {
	for (line, mut boxes) in mem::take(map) {
		if let Some(moved) = shift(line) {
			boxes.iter_mut().for_each(|b| b.line = moved);
			map.insert(moved, boxes);
		}
	}
}

impl<L: TextLayout> ScopeView<L> {
	pub fn new(layout: L, palette: ScopePalette) -> Self {
		Self {
			layout,
			palette,
			indents: IndentCache::new(),
			pending: FxHashMap::default(),
			live: FxHashMap::default(),
			rendered: None,
		}
	}

	pub fn layout(&self) -> &L {
		&self.layout
	}

	/// Mutable layout access. Report width or font changes afterwards.
	pub fn layout_mut(&mut self) -> &mut L {
		&mut self.layout
	}

	pub fn palette(&self) -> &ScopePalette {
		&self.palette
	}

	pub fn indents(&self) -> &IndentCache {
		&self.indents
	}

	/// Replaces the colours and repaints everything.
	pub fn set_palette(&mut self, doc: &Document, tree: &NodeTree, palette: ScopePalette) {
		self.palette = palette;
		self.recalculate_all(doc, tree);
		self.apply_pending();
	}

	/// Boxes currently shown on `line`.
	pub fn scopes(&self, line: LineIdx) -> &[ScopeBox] {
		self.live.get(&line).map_or(&[], Vec::as_slice)
	}

	pub fn pending_scopes(&self, line: LineIdx) -> Option<&[ScopeBox]> {
		self.pending.get(&line).map(Vec::as_slice)
	}

	pub fn has_pending(&self) -> bool {
		!self.pending.is_empty()
	}

	/// Recomputes boxes for `first..=last` into the pending set.
	pub fn recalculate_scopes(&mut self, doc: &Document, tree: &NodeTree, first: LineIdx, last: LineIdx) {
		let last = last.min(doc.line_count().saturating_sub(1));
		if first > last {
			return;
		}
		for line in first..=last {
			let boxes = self.line_scopes(doc, tree, line);
			self.pending.insert(line, boxes);
		}
		tracing::trace!(first, last, "scope.recalculate");
	}

	pub fn recalculate_all(&mut self, doc: &Document, tree: &NodeTree) {
		self.recalculate_scopes(doc, tree, 0, doc.line_count());
	}

	/// Makes pending boxes visible. Returns the number of lines updated.
	pub fn apply_pending(&mut self) -> usize {
		let count = self.pending.len();
		for (line, boxes) in self.pending.drain() {
			if boxes.is_empty() {
				self.live.remove(&line);
			} else {
				self.live.insert(line, boxes);
			}
		}
		count
	}

	/// Moves boxes at or below `line` down by `count` lines.
	pub fn lines_added(&mut self, line: LineIdx, count: usize) {
		if count == 0 {
			return;
		}
		let shift = |l: LineIdx| Some(if l < line { l } else { l + count });
		shift_lines(&mut self.live, shift);
		shift_lines(&mut self.pending, shift);
	}

	/// Drops boxes of `first..first + count` and moves later boxes up.
	pub fn lines_removed(&mut self, first: LineIdx, count: usize) {
		if count == 0 {
			return;
		}
		let shift = |l: LineIdx| match l {
			l if l < first => Some(l),
			l if l < first + count => None,
			l => Some(l - count),
		};
		shift_lines(&mut self.live, shift);
		shift_lines(&mut self.pending, shift);
	}

	/// Notes that `from..=to` are on screen, computing boxes for newly exposed lines.
	pub fn rendered_lines(&mut self, doc: &Document, tree: &NodeTree, from: LineIdx, to: LineIdx) {
		match self.rendered {
			None => self.recalculate_scopes(doc, tree, from, to),
			Some((old_from, old_to)) => {
				if from < old_from {
					self.recalculate_scopes(doc, tree, from, (old_from - 1).min(to));
				}
				if to > old_to {
					self.recalculate_scopes(doc, tree, from.max(old_to.saturating_add(1)), to);
				}
			}
		}
		self.rendered = Some((from, to));
		self.apply_pending();
	}

	/// Drops every measured position and repaints. Call after the new font is laid out.
	pub fn font_size_changed(&mut self, doc: &Document, tree: &NodeTree) {
		tracing::debug!("scope.font_changed");
		self.indents.reset();
		self.live.clear();
		self.pending.clear();
		self.recalculate_all(doc, tree);
		self.apply_pending();
	}

	/// Invalidates indents affected by `damage` and recalculates the lines it touches.
	///
	/// Tree changes must already be applied to `tree`, and edits to `doc`.
	pub fn update_damage(&mut self, doc: &Document, tree: &NodeTree, damage: Damage<'_>) {
		let mut range: CharRange = None;
		let mut touched = FxHashSet::default();
		match damage {
			Damage::Resize => {
				tracing::debug!("scope.resized");
				self.indents.clear();
				self.recalculate_all(doc, tree);
				self.apply_pending();
				return;
			}
			Damage::Reparse(delta) => self.note_delta(tree, delta, &mut touched, &mut range),
			Damage::Edit { edit, delta } => {
				match edit.kind {
					EditKind::Insert => {
						self.lines_added(edit.start_line + 1, edit.lines_added);
						widen(&mut range, edit.offset, edit.offset + edit.length);
					}
					EditKind::Remove => {
						self.lines_removed(edit.start_line + 1, edit.lines_removed);
						widen(&mut range, edit.offset, edit.offset);
					}
				}
				let at = tree.deepest_at(edit.offset.min(doc.len_chars()));
				touched.extend(tree.ancestry(at.id));
				self.note_delta(tree, delta, &mut touched, &mut range);
			}
		}

		for id in touched {
			self.reassess(doc, tree, id, &mut range);
		}

		if let Some((start, end)) = range {
			let len = doc.len_chars();
			let first = doc.line_of(start.min(len));
			let last = doc.line_of(end.min(len));
			self.recalculate_scopes(doc, tree, first, last);
		}
	}

	fn note_delta(&mut self, tree: &NodeTree, delta: &NodeTreeDelta, touched: &mut FxHashSet<NodeId>, range: &mut CharRange) {
		for &id in &delta.added {
			if let Some(pos) = tree.node_pos(id) {
				widen(range, pos.start, pos.end);
				touched.extend(tree.ancestry(id));
			}
		}
		for removed in &delta.removed {
			self.indents.forget(removed.id);
			widen(range, removed.start, removed.start + removed.size);
			if let Some(parent) = removed.parent.filter(|p| tree.contains(*p)) {
				touched.extend(tree.ancestry(parent));
			}
		}
		for change in &delta.changed {
			let Some(pos) = tree.node_pos(change.id) else {
				continue;
			};
			widen(range, pos.start.min(change.original_start), pos.end.max(change.original_start + change.original_size));
			touched.extend(tree.ancestry(change.id));
		}
		if !delta.removed.is_empty() {
			self.indents.retain_live(tree);
		}
	}

	/// Recomputes a previously known indent; a change repaints the whole node.
	fn reassess(&mut self, doc: &Document, tree: &NodeTree, id: NodeId, range: &mut CharRange) {
		let Some(before) = self.indents.state(id).last_known() else {
			return;
		};
		let Some(node) = tree.node_pos(id) else {
			self.indents.forget(id);
			return;
		};
		match self.indents.compute(&self.layout, doc, tree, node) {
			Some(now) => {
				self.indents.store(id, now);
				if now != before {
					widen(range, node.start, node.end);
				}
			}
			None => self.indents.invalidate(id),
		}
	}

	fn line_scopes(&mut self, doc: &Document, tree: &NodeTree, line: LineIdx) -> Vec<ScopeBox> {
		let Some(this) = LineExtent::of(doc, line) else {
			return Vec::new();
		};
		let above = line.checked_sub(1).and_then(|l| LineExtent::of(doc, l));
		let below = LineExtent::of(doc, line + 1);
		let full_width = self.layout.text_width().saturating_sub(RIGHT_EDGE_MARGIN);

		let mut boxes = Vec::new();
		let mut stack: Vec<(NodePos, usize)> = vec![(tree.root_pos(), 0)];
		while let Some((node, depth)) = stack.pop() {
			let Some(kind) = tree.kind(node.id) else {
				continue;
			};
			let drawn = (kind.is_container() || kind.is_body())
				&& !skips_start(doc, tree, node, Some(&this))
				&& !skips_end(doc, node, Some(&this));
			if drawn && let Some(indent) = self.node_indent(doc, tree, node, &this).filter(|x| *x <= full_width) {
				let margin = if kind.is_body() { LEFT_INNER_SCOPE_MARGIN } else { LEFT_OUTER_SCOPE_MARGIN };
				let (edge, fill) = self.palette.colors_for(kind);
				boxes.push(ScopeBox {
					line,
					left: indent.saturating_sub(margin),
					right: self.right_bound(doc, tree, node, depth, full_width, &this),
					starts: skips_start(doc, tree, node, above.as_ref()),
					ends: skips_end(doc, node, below.as_ref()),
					fill,
					edge,
					source: node.id,
				});
			}

			let child_depth = depth + usize::from(drawn);
			let first = stack.len();
			stack.extend(
				tree.children_of(node)
					.skip_while(|c| c.end <= this.start)
					.take_while(|c| this.overlaps(*c))
					.map(|c| (c, child_depth)),
			);
			stack[first..].reverse();
		}
		boxes
	}

	/// Indent of `node` as drawn on `line`.
	///
	/// Unknown and stale indents are only recomputed while `line` is visible;
	/// otherwise the last known value is used, if any.
	fn node_indent(&mut self, doc: &Document, tree: &NodeTree, node: NodePos, line: &LineExtent) -> Option<Px> {
		let mut indent = match self.indents.state(node.id) {
			IndentState::Cached(px) => px,
			state if self.layout.is_line_visible(line.line) => match self.indents.compute(&self.layout, doc, tree, node) {
				Some(px) => {
					self.indents.store(node.id, px);
					px
				}
				None => state.last_known()?,
			},
			state => state.last_known()?,
		};

		// A node starting mid-line reaches left only as far as the text before it.
		if node.start > line.start
			&& let Some(prev) = last_nonblank_before(doc, line, node.start)
			&& let Some(edge) = self.indents.left_edge(&self.layout, doc, prev + 1)
		{
			indent = indent.max(edge);
		}
		Some(indent)
	}

	/// Right edge of `node` on `line`, clipped before any text following the node.
	fn right_bound(&mut self, doc: &Document, tree: &NodeTree, node: NodePos, depth: usize, full_width: Px, line: &LineExtent) -> Px {
		let depth = Px::try_from(depth).unwrap_or(Px::MAX);
		let rbound = full_width.saturating_sub(depth.saturating_mul(RIGHT_SCOPE_MARGIN));
		if node.end >= line.end || node.end < line.start {
			return rbound;
		}
		if first_significant(doc, tree, line, node.end, line.content_end).is_some()
			&& let Some(x) = self.indents.left_edge(&self.layout, doc, node.end)
		{
			return rbound.min(x);
		}
		rbound
	}
}
