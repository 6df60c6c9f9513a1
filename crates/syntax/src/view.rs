use bramble_primitives::{CharIdx, CharLen, DocEdit, Document, EditKind, EditLog};
use bramble_worker::CooperativeTask;

use crate::delta::NodeTreeDelta;
use crate::parser::reparse;
use crate::schedule::ReparseQueue;
use crate::tree::NodeTree;


/// Default minimum number of characters handled by one reparse step.
pub const DEFAULT_MAX_PARSE_PIECE: CharLen = 8000;

/// Structure of one document, kept current incrementally.
///
/// Edits must be reported in the order they were applied to the document.
/// Between edits the tree may be stale wherever the queue holds a record;
/// everything else is guaranteed to match a full parse of the current text.
#[derive(Debug)]
pub struct SyntaxView {
	tree: NodeTree,
	queue: ReparseQueue,
	log: EditLog,
	pending: NodeTreeDelta,
	max_parse_piece: CharLen,
}

impl SyntaxView {
	/// Creates a view with the whole of `doc` queued for parsing.
	pub fn new(doc: &Document) -> Self {
		let mut queue = ReparseQueue::new();
		queue.schedule(0, doc.len_chars());
		Self {
			tree: NodeTree::new(doc.len_chars()),
			queue,
			log: EditLog::new(),
			pending: NodeTreeDelta::default(),
			max_parse_piece: DEFAULT_MAX_PARSE_PIECE,
		}
	}

	/// Creates a view and parses `doc` completely.
	pub fn parsed(doc: &Document) -> Self {
		let mut view = Self::new(doc);
		view.flush_reparse_queue(doc);
		view
	}

	pub fn with_max_parse_piece(mut self, max_parse_piece: CharLen) -> Self {
		self.max_parse_piece = max_parse_piece.max(1);
		self
	}

	#[inline]
	pub fn tree(&self) -> &NodeTree {
		&self.tree
	}

	#[inline]
	pub fn queue(&self) -> &ReparseQueue {
		&self.queue
	}

	pub fn edit_log(&self) -> &EditLog {
		&self.log
	}

	pub fn max_parse_piece(&self) -> CharLen {
		self.max_parse_piece
	}

	/// True when no region is waiting to be reparsed.
	pub fn is_current(&self) -> bool {
		self.queue.is_empty()
	}

	/// Routes a document change notification to the tree and the queue.
	pub fn apply_edit(&mut self, doc: &Document, edit: &DocEdit) {
		self.log.record(edit);
		match edit.kind {
			EditKind::Insert => {
				self.text_inserted(doc, edit.offset, edit.length);
			}
			EditKind::Remove => self.text_removed(edit.offset, edit.length),
		}
	}

	/// Accounts for `len` chars inserted at `pos`. `doc` already holds them.
	///
	/// Returns true if a reparse was scheduled.
	pub fn text_inserted(&mut self, doc: &Document, pos: CharIdx, len: CharLen) -> bool {
		let needs_reparse = self.tree.text_inserted(doc.text(), pos, len);
		self.queue.text_inserted(pos, len);
		if needs_reparse {
			self.queue.schedule(pos, len);
		}
		tracing::trace!(pos, len, needs_reparse, "syntax.inserted");
		needs_reparse
	}

	/// Accounts for the removal of `len` chars at `pos`.
	pub fn text_removed(&mut self, pos: CharIdx, len: CharLen) {
		if len == 0 {
			return;
		}
		let delta = self.tree.text_removed(pos, len);
		self.pending.merge(delta);
		self.queue.text_removed(pos, len);
		self.queue.schedule(pos, 0);
		tracing::trace!(pos, len, "syntax.removed");
	}

	/// Queues `pos..pos + min_size` for reparsing even though no edit touched it.
	pub fn schedule_reparse(&mut self, pos: CharIdx, min_size: CharLen) {
		self.queue.schedule(pos, min_size);
	}

	/// Runs one reparse pass from the earliest queued record, handling at
	/// least `max_amount` characters unless the pass ends earlier.
	///
	/// Returns true while more work remains.
	pub fn poll_reparse_queue(&mut self, doc: &Document, max_amount: CharLen) -> bool {
		let Some(first) = self.queue.first() else {
			return false;
		};
		let outcome = reparse(&mut self.tree, doc.text(), &mut self.queue, first.start, max_amount, &self.log);
		if !outcome.recovered && self.queue.first() == Some(first) {
			tracing::warn!(
				start = first.start,
				size = first.size,
				recent_edits = %self.log,
				"reparse.stalled"
			);
			self.queue.mark_parsed(first.start, first.size);
		}
		self.pending.merge(outcome.delta);
		!self.queue.is_empty()
	}

	/// Polls until the queue is empty.
	pub fn flush_reparse_queue(&mut self, doc: &Document) {
		while self.poll_reparse_queue(doc, CharLen::MAX) {}
	}

	/// Structural changes accumulated since the last call.
	pub fn take_delta(&mut self) -> NodeTreeDelta {
		std::mem::take(&mut self.pending)
	}

	/// Cooperative task running one bounded pass per step.
	pub fn runner<'v>(&'v mut self, doc: &'v Document) -> ReparseRunner<'v> {
		let max_amount = self.max_parse_piece;
		ReparseRunner { view: self, doc, max_amount }
	}
}

/// Drives [`SyntaxView::poll_reparse_queue`] from [`bramble_worker::drain`].
pub struct ReparseRunner<'v> {
	view: &'v mut SyntaxView,
	doc: &'v Document,
	max_amount: CharLen,
}

impl CooperativeTask for ReparseRunner<'_> {
	fn step(&mut self) -> bool {
		self.view.poll_reparse_queue(self.doc, self.max_amount)
	}
}
