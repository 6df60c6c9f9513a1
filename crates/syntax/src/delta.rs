use bramble_primitives::{CharIdx, CharLen};

use crate::node::{NodeId, NodeKind};

/// A node dropped from the tree. Its id no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
	pub id: NodeId,
	pub kind: NodeKind,
	pub parent: Option<NodeId>,
	pub start: CharIdx,
	pub size: CharLen,
}

/// A node mutated in place, with its extent before the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChange {
	pub id: NodeId,
	pub original_start: CharIdx,
	pub original_size: CharLen,
}

/// Structural changes made by one edit or one reparse step.
///
/// `removed` lists the roots of dropped subtrees; their descendants are gone
/// too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTreeDelta {
	pub added: Vec<NodeId>,
	pub removed: Vec<RemovedNode>,
	pub changed: Vec<NodeChange>,
}

impl NodeTreeDelta {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
	}

	/// Records an in-place change unless the node is new or already recorded.
	pub(crate) fn note_changed(&mut self, id: NodeId, original_start: CharIdx, original_size: CharLen) {
		if self.added.contains(&id) || self.changed.iter().any(|c| c.id == id) {
			return;
		}
		self.changed.push(NodeChange {
			id,
			original_start,
			original_size,
		});
	}

	/// Appends `other`, keeping the first recorded original extent per node.
	pub fn merge(&mut self, other: NodeTreeDelta) {
		let NodeTreeDelta { added, removed, changed } = other;
		for change in changed {
			self.note_changed(change.id, change.original_start, change.original_size);
		}
		for gone in &removed {
			self.added.retain(|id| *id != gone.id);
			self.changed.retain(|c| c.id != gone.id);
		}
		self.added.extend(added);
		self.removed.extend(removed);
	}
}
