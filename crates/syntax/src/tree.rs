use bramble_primitives::{CharIdx, CharLen};
use ropey::RopeSlice;
use slab::Slab;

use crate::delta::{NodeTreeDelta, RemovedNode};
use crate::node::{CommentKind, NodeId, NodeKind, ParseState, ParsedNode};


/// A node together with its absolute extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePos {
	pub id: NodeId,
	pub start: CharIdx,
	pub end: CharIdx,
}

impl NodePos {
	#[inline]
	pub fn size(&self) -> CharLen {
		self.end - self.start
	}
}

/// Position-only summary of one node, used to compare trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
	pub depth: usize,
	pub kind: NodeKind,
	pub start: CharIdx,
	pub end: CharIdx,
	pub complete: bool,
}

/// Arena holding the parsed structure of one document.
#[derive(Debug, Clone)]
pub struct NodeTree {
	nodes: Slab<ParsedNode>,
	root: NodeId,
	next_serial: u64,
}

impl NodeTree {
	/// A tree holding only the root, sized to the document.
	pub fn new(doc_len: CharLen) -> Self {
		let mut nodes = Slab::new();
		let key = nodes.insert(ParsedNode {
			kind: NodeKind::CompilationUnit,
			parent: None,
			offset: 0,
			size: doc_len,
			children: Vec::new(),
			complete: true,
			state: ParseState::Body,
			name: None,
			serial: 1,
		});
		Self {
			nodes,
			root: NodeId { key, serial: 1 },
			next_serial: 2,
		}
	}

	#[inline]
	pub fn root(&self) -> NodeId {
		self.root
	}

	pub fn root_pos(&self) -> NodePos {
		NodePos {
			id: self.root,
			start: 0,
			end: self.node(self.root).size,
		}
	}

	/// Number of live nodes, root included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.len() <= 1
	}

	pub fn get(&self, id: NodeId) -> Option<&ParsedNode> {
		self.nodes.get(id.key).filter(|n| n.serial == id.serial)
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.get(id).is_some()
	}

	#[inline]
	pub(crate) fn node(&self, id: NodeId) -> &ParsedNode {
		&self.nodes[id.key]
	}

	#[inline]
	pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ParsedNode {
		&mut self.nodes[id.key]
	}

	pub(crate) fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>, offset: CharLen, size: CharLen) -> NodeId {
		let serial = self.next_serial;
		self.next_serial += 1;
		let key = self.nodes.insert(ParsedNode {
			kind,
			parent,
			offset,
			size,
			children: Vec::new(),
			complete: false,
			state: ParseState::Header,
			name: None,
			serial,
		});
		NodeId { key, serial }
	}

	/// Drops `id` and its descendants, recording the subtree root in `delta`.
	pub(crate) fn free_subtree(&mut self, id: NodeId, start: CharIdx, delta: &mut NodeTreeDelta) {
		let Some(node) = self.get(id) else {
			return;
		};
		delta.removed.push(RemovedNode {
			id,
			kind: node.kind,
			parent: node.parent,
			start,
			size: node.size,
		});
		let mut stack = vec![id];
		while let Some(next) = stack.pop() {
			let node = self.nodes.remove(next.key);
			stack.extend(node.children);
		}
	}

	/// Absolute start of a live node.
	pub fn abs_start(&self, id: NodeId) -> Option<CharIdx> {
		let mut node = self.get(id)?;
		let mut start = node.offset;
		while let Some(parent) = node.parent {
			node = self.get(parent)?;
			start += node.offset;
		}
		Some(start)
	}

	pub fn node_pos(&self, id: NodeId) -> Option<NodePos> {
		let start = self.abs_start(id)?;
		Some(NodePos {
			id,
			start,
			end: start + self.node(id).size,
		})
	}

	pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
		self.get(id).map(|n| n.kind)
	}

	#[inline]
	fn child_pos(&self, parent_start: CharIdx, child: NodeId) -> NodePos {
		let node = self.node(child);
		let start = parent_start + node.offset;
		NodePos {
			id: child,
			start,
			end: start + node.size,
		}
	}

	/// Children of `parent` with absolute extents, in document order.
	pub fn children_of(&self, parent: NodePos) -> impl Iterator<Item = NodePos> + '_ {
		self.node(parent.id)
			.children
			.iter()
			.map(move |&child| self.child_pos(parent.start, child))
	}

	/// First child of `parent` with `start <= pos <= end`.
	pub fn find_node_at(&self, parent: NodePos, pos: CharIdx) -> Option<NodePos> {
		self.find_node_at_or_after(parent, pos).filter(|child| child.start <= pos)
	}

	/// First child of `parent` ending at or after `pos`.
	pub fn find_node_at_or_after(&self, parent: NodePos, pos: CharIdx) -> Option<NodePos> {
		let children = &self.node(parent.id).children;
		let rel = pos.checked_sub(parent.start);
		let idx = match rel {
			Some(rel) => children.partition_point(|&c| {
				let node = self.node(c);
				node.offset + node.size < rel
			}),
			None => 0,
		};
		children.get(idx).map(|&child| self.child_pos(parent.start, child))
	}

	pub fn parent_pos(&self, pos: NodePos) -> Option<NodePos> {
		let node = self.get(pos.id)?;
		let parent = node.parent?;
		let start = pos.start - node.offset;
		Some(NodePos {
			id: parent,
			start,
			end: start + self.node(parent).size,
		})
	}

	pub fn next_sibling(&self, pos: NodePos) -> Option<NodePos> {
		let parent = self.parent_pos(pos)?;
		let siblings = &self.node(parent.id).children;
		let idx = siblings.iter().position(|&c| c == pos.id)?;
		siblings.get(idx + 1).map(|&next| self.child_pos(parent.start, next))
	}

	/// Deepest node whose half-open extent contains `pos`; the root if none.
	pub fn deepest_at(&self, pos: CharIdx) -> NodePos {
		let mut current = self.root_pos();
		while let Some(child) = self.children_of(current).find(|c| c.start <= pos && pos < c.end) {
			current = child;
		}
		current
	}

	/// Chain of nodes from the root down to `id`.
	pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
		let mut chain = Vec::new();
		let mut next = Some(id);
		while let Some(current) = next {
			let Some(node) = self.get(current) else {
				break;
			};
			chain.push(current);
			next = node.parent;
		}
		chain.reverse();
		chain
	}

	/// Pre-order summary of the whole tree, root excluded.
	pub fn structure(&self) -> Vec<NodeSummary> {
		let mut out = Vec::new();
		let mut stack: Vec<(NodePos, usize)> = self.children_of(self.root_pos()).map(|c| (c, 0)).collect();
		stack.reverse();
		while let Some((pos, depth)) = stack.pop() {
			let node = self.node(pos.id);
			out.push(NodeSummary {
				depth,
				kind: node.kind,
				start: pos.start,
				end: pos.end,
				complete: node.complete,
			});
			let first = stack.len();
			stack.extend(self.children_of(pos).map(|c| (c, depth + 1)));
			stack[first..].reverse();
		}
		out
	}

	/// Checks the structural invariants against a document length.
	pub fn check_invariants(&self, doc_len: CharLen) -> Result<(), String> {
		let root = self.root_pos();
		if root.end != doc_len {
			return Err(format!("root spans {} chars, document has {doc_len}", root.end));
		}
		let mut stack = vec![root];
		while let Some(parent) = stack.pop() {
			let mut prev_end = parent.start;
			for child in self.children_of(parent) {
				let node = self.node(child.id);
				if node.parent != Some(parent.id) {
					return Err(format!("{:?} has a stale parent link", child.id));
				}
				if child.start < prev_end || child.end > parent.end {
					return Err(format!(
						"{} at {}..{} escapes or overlaps within {}..{}",
						node.kind.label(),
						child.start,
						child.end,
						parent.start,
						parent.end
					));
				}
				if child.start == child.end && !node.kind.is_body() {
					return Err(format!("zero-size {} at {}", node.kind.label(), child.start));
				}
				prev_end = child.end;
				stack.push(child);
			}
		}
		Ok(())
	}

	/// Shifts and grows nodes for text inserted at `pos`.
	///
	/// `text` is the document after the insertion. Returns false when the
	/// insertion landed strictly inside a complete comment in a way that cannot
	/// change how it ends, in which case no reparse is needed.
	pub fn text_inserted(&mut self, text: RopeSlice<'_>, pos: CharIdx, len: CharLen) -> bool {
		if len == 0 {
			return false;
		}
		let mut current = self.root_pos();
		self.node_mut(current.id).size += len;
		loop {
			let mut grown = None;
			let children = self.node(current.id).children.clone();
			for child in children {
				let child_pos = self.child_pos(current.start, child);
				let node = self.node_mut(child);
				// Text typed right after an opening brace belongs to the body.
				let body_front = node.kind.is_body() && child_pos.start == pos;
				if grown.is_none() && ((child_pos.start < pos && pos <= child_pos.end) || body_front) {
					node.size += len;
					grown = Some(child_pos);
				} else if child_pos.start >= pos {
					node.offset += len;
				}
			}
			match grown {
				Some(child) => current = child,
				None => break,
			}
		}
		let deepest = self.node(current.id);
		match deepest.kind {
			NodeKind::Comment(kind) if deepest.complete => !insertion_keeps_comment(text, kind, current.start, current.end, pos, len),
			_ => true,
		}
	}

	/// Maps node extents through the removal of `[pos, pos + len)`.
	///
	/// Nodes that lie entirely inside the removed range are dropped.
	pub fn text_removed(&mut self, pos: CharIdx, len: CharLen) -> NodeTreeDelta {
		let mut delta = NodeTreeDelta::default();
		if len == 0 {
			return delta;
		}
		let root = self.root;
		self.remove_within(root, 0, 0, pos, len, &mut delta);
		let root_node = self.node_mut(root);
		root_node.size = root_node.size.saturating_sub(len);
		delta
	}

	fn remove_within(&mut self, id: NodeId, old_start: CharIdx, new_start: CharIdx, pos: CharIdx, len: CharLen, delta: &mut NodeTreeDelta) {
		let map = |x: CharIdx| {
			if x <= pos {
				x
			} else if x <= pos + len {
				pos
			} else {
				x - len
			}
		};
		let children = std::mem::take(&mut self.node_mut(id).children);
		let mut kept = Vec::with_capacity(children.len());
		for child in children {
			let node = self.node(child);
			let c_start = old_start + node.offset;
			let c_end = c_start + node.size;
			if c_start >= pos && c_end <= pos + len {
				self.free_subtree(child, c_start, delta);
				continue;
			}
			let (s, e) = (map(c_start), map(c_end));
			if c_start < pos + len && c_end > pos {
				self.remove_within(child, c_start, s, pos, len, delta);
			}
			let node = self.node_mut(child);
			node.offset = s - new_start;
			node.size = e - s;
			kept.push(child);
		}
		self.node_mut(id).children = kept;
	}
}

/// True if inserting `len` chars at `pos` leaves the comment's delimiters intact.
///
/// `start` and `old_end` are the comment's extent before the insertion.
fn insertion_keeps_comment(text: RopeSlice<'_>, kind: CommentKind, start: CharIdx, old_end: CharIdx, pos: CharIdx, len: CharLen) -> bool {
	let inserted = text.slice(pos..pos + len);
	match kind {
		CommentKind::Line => pos >= start + 2 && !inserted.chars().any(|c| c == '\n' || c == '\r'),
		CommentKind::Block | CommentKind::Doc => {
			if pos < start + 3 || pos + 2 > old_end {
				return false;
			}
			let before = text.get_char(pos - 1);
			let after = text.get_char(pos + len);
			let mut prev = before;
			for c in inserted.chars() {
				if prev == Some('*') && c == '/' {
					return false;
				}
				prev = Some(c);
			}
			!(prev == Some('*') && after == Some('/'))
		}
	}
}
