//! Incremental reparse engine.
//!
//! A pass starts from the earliest dirty record. It descends from the root to
//! the innermost list (a body or the compilation unit) whose interior holds the
//! record and restarts at the list item containing it. Items are then parsed
//! one at a time. Old children that start exactly on an item boundary, are
//! complete and are untouched by any dirty record are reused as they are. An
//! old child of the same kind found at the boundary is recycled: it keeps its
//! id and its body keeps offering its old children for reuse.
//!
//! The pass ends when the list it started in (the level list) reaches a reused
//! child or when the parse budget is spent. A level list that closes hands
//! control to its compound, which resumes from its persisted [`ParseState`].
//! If the compound still ends where it did before the pass is done; otherwise
//! its parent list becomes the new level list.

use std::collections::VecDeque;

use bramble_primitives::{CharIdx, CharLen, EditLog};
use ropey::RopeSlice;

use crate::delta::NodeTreeDelta;
use crate::node::{NodeId, NodeKind, ParseState};
use crate::schedule::ReparseQueue;
use crate::tree::{NodePos, NodeTree};

mod grammar;
#[cfg(test)]
mod tests;

use grammar::{Cursor, Shape};

/// Result of one step of a node's parse state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	/// The node ended with its own closing token and is complete.
	EndsNode,
	/// The current state ended before the next token; the next state starts at it.
	BeginsNextState,
	/// The current state ended, its closing token included.
	EndsState,
	/// The node ran into the end of its parent or of the document.
	Incomplete,
	/// The persisted state cannot be continued; the node must be replaced.
	EpicFail,
}

/// What a reparse pass did.
#[derive(Debug, Clone, Default)]
pub struct ReparseOutcome {
	pub delta: NodeTreeDelta,
	/// Position the pass restarted from.
	pub restart: CharIdx,
	/// Position the structure is known to be current up to.
	pub end: CharIdx,
	/// True when the pass stopped on its budget and queued the remainder.
	pub budget_stop: bool,
	/// True when bookkeeping was inconsistent and a subtree was abandoned.
	pub recovered: bool,
}

/// An old node offered for reuse, with its absolute extent.
#[derive(Debug, Clone, Copy)]
struct Cand {
	id: NodeId,
	start: CharIdx,
	end: CharIdx,
}

/// Budget stop; unwinds every open frame up to the pass.
#[derive(Debug, Clone, Copy)]
struct Halt {
	at: CharIdx,
}

/// Bookkeeping found to be inconsistent while resuming.
#[derive(Debug, Clone, Copy)]
struct Inconsistent {
	list: NodePos,
	at: CharIdx,
	reason: &'static str,
}

/// A list being parsed.
struct ListCtx {
	id: NodeId,
	start: CharIdx,
	kind: NodeKind,
	cands: VecDeque<Cand>,
	resumable: bool,
}

/// How a list stopped.
#[derive(Debug, Clone, Copy)]
enum ListEnd {
	/// Closing brace at `at`, or the end of the document.
	Closed { at: CharIdx, complete: bool },
	/// Reached a reusable old child at `at`; the rest of the list is unchanged.
	Synced { at: CharIdx },
}

/// Where a new node is attached.
struct Slot<'c> {
	parent: NodeId,
	/// Absolute start of the parent.
	start: CharIdx,
	resumable: bool,
	cands: Option<&'c mut VecDeque<Cand>>,
}

/// A compound node while its state machine runs.
struct Open {
	id: NodeId,
	start: CharIdx,
	shape: Shape,
	state: ParseState,
	old_body: Option<Cand>,
	resumable: bool,
	name: Option<String>,
}

enum PassEnd {
	Done(CharIdx),
	Budget(CharIdx),
	Failed(Inconsistent),
}

/// A compound continued after its body changed.
struct Resumed {
	step: Transition,
	end: CharIdx,
	complete: bool,
	state: ParseState,
}

/// Runs one reparse pass starting at `from_pos`, the start of the earliest
/// dirty record.
///
/// At least `max_amount` characters are processed unless the pass synchronizes
/// with the old tree earlier. The parsed range is removed from `queue`; an
/// unfinished remainder is queued again.
pub fn reparse(tree: &mut NodeTree, text: RopeSlice<'_>, queue: &mut ReparseQueue, from_pos: CharIdx, max_amount: CharLen, log: &EditLog) -> ReparseOutcome {
	let doc_len = text.len_chars();
	let (list, restart) = match find_restart(tree, doc_len, from_pos) {
		Ok(found) => found,
		Err(bad) => return recover(tree, queue, doc_len, bad, NodeTreeDelta::default(), log),
	};
	let mut parser = Reparser {
		tree: &mut *tree,
		text,
		doc_len,
		queue: &*queue,
		from_pos,
		restart,
		max_amount,
		level: list.id,
		level_end: list.end,
		units: 0,
		skipped: 0,
		delta: NodeTreeDelta::default(),
	};
	let end = parser.run(list, restart);
	let Reparser { delta, level_end, .. } = parser;
	let mut outcome = ReparseOutcome {
		delta,
		restart,
		end: restart,
		..ReparseOutcome::default()
	};
	match end {
		PassEnd::Done(end) => {
			queue.mark_parsed(restart, end - restart);
			if end == doc_len {
				queue.mark_parsed(doc_len, 0);
			}
			outcome.end = end;
		}
		PassEnd::Budget(at) => {
			queue.mark_parsed(restart, at - restart);
			queue.schedule(at, level_end - at);
			outcome.end = at;
			outcome.budget_stop = true;
		}
		PassEnd::Failed(bad) => {
			return recover(tree, queue, doc_len, bad, outcome.delta, log);
		}
	}
	outcome.delta.added.retain(|id| tree.contains(*id));
	outcome.delta.changed.retain(|change| tree.contains(change.id));
	tracing::debug!(
		from = from_pos,
		restart,
		end = outcome.end,
		added = outcome.delta.added.len(),
		removed = outcome.delta.removed.len(),
		changed = outcome.delta.changed.len(),
		budget_stop = outcome.budget_stop,
		"reparse.pass"
	);
	outcome
}

/// Builds a tree for `text` from scratch.
pub fn parse_document(text: RopeSlice<'_>) -> NodeTree {
	let mut tree = NodeTree::new(text.len_chars());
	let mut queue = ReparseQueue::new();
	queue.schedule(0, text.len_chars());
	let log = EditLog::new();
	while let Some(record) = queue.first() {
		reparse(&mut tree, text, &mut queue, record.start, CharLen::MAX, &log);
	}
	tree
}

/// Finds the level list and restart position for a record at `pos`.
fn find_restart(tree: &NodeTree, doc_len: CharLen, pos: CharIdx) -> Result<(NodePos, CharIdx), Inconsistent> {
	let mut list = tree.root_pos();
	if list.end != doc_len {
		return Err(Inconsistent {
			list,
			at: 0,
			reason: "root does not span the document",
		});
	}
	loop {
		let mut prev_end = list.start;
		let mut gap = list.start;
		// An incomplete item ended on a token it did not consume, which may
		// lie past any comments that follow it.
		let mut lookahead = None;
		let mut found = None;
		for child in tree.children_of(list) {
			if child.start < prev_end || child.end > list.end {
				return Err(Inconsistent {
					list,
					at: child.start.max(prev_end).min(list.end),
					reason: "child escapes or overlaps",
				});
			}
			prev_end = child.end;
			if child.start < pos && pos <= child.end {
				found = Some(child);
				break;
			}
			if child.start >= pos {
				break;
			}
			let node = tree.node(child.id);
			if !node.complete {
				lookahead.get_or_insert(child.start);
			} else if !node.kind.is_comment() {
				lookahead = None;
			}
			gap = child.end;
		}
		if let Some(start) = lookahead {
			return Ok((list, start));
		}
		let Some(child) = found else {
			return Ok((list, gap));
		};
		if let Some(body) = body_of(tree, child) {
			if tree.node(child.id).state == ParseState::Header || body.start < child.start || body.end > child.end {
				return Err(Inconsistent {
					list,
					at: child.start,
					reason: "body does not match its compound",
				});
			}
			if body.start <= pos && pos < body.end {
				list = body;
				continue;
			}
		}
		return Ok((list, child.start));
	}
}

/// The brace body of a list item, if it has one.
fn body_of(tree: &NodeTree, item: NodePos) -> Option<NodePos> {
	if !tree.node(item.id).kind.is_container() {
		return None;
	}
	let last = *tree.node(item.id).children.last()?;
	let node = tree.node(last);
	node.kind.is_body().then(|| {
		let start = item.start + node.offset;
		NodePos {
			id: last,
			start,
			end: start + node.size,
		}
	})
}

/// Abandons everything in `bad.list` from `bad.at` on and covers it with a
/// placeholder that the next pass will replace.
fn recover(tree: &mut NodeTree, queue: &mut ReparseQueue, doc_len: CharLen, bad: Inconsistent, mut delta: NodeTreeDelta, log: &EditLog) -> ReparseOutcome {
	tracing::warn!(reason = bad.reason, at = bad.at, recent_edits = %log, "reparse.epic_fail");
	let mut list = bad.list;
	if list.id == tree.root() && list.end != doc_len {
		tree.node_mut(list.id).size = doc_len;
		list.end = doc_len;
	}
	let children = std::mem::take(&mut tree.node_mut(list.id).children);
	let mut kept = Vec::with_capacity(children.len());
	for child in children {
		let node = tree.node(child);
		let start = list.start + node.offset;
		if start + node.size <= bad.at {
			kept.push(child);
		} else {
			tree.free_subtree(child, start, &mut delta);
		}
	}
	tree.node_mut(list.id).children = kept;
	if bad.at < list.end {
		let placeholder = tree.alloc(NodeKind::Placeholder, Some(list.id), bad.at - list.start, list.end - bad.at);
		tree.node_mut(list.id).children.push(placeholder);
		delta.added.push(placeholder);
	}
	delta.added.retain(|id| tree.contains(*id));
	delta.changed.retain(|change| tree.contains(change.id));
	queue.schedule(bad.at, list.end - bad.at);
	ReparseOutcome {
		delta,
		restart: bad.at,
		end: bad.at,
		budget_stop: false,
		recovered: true,
	}
}

pub(crate) struct Reparser<'t, 'a> {
	tree: &'t mut NodeTree,
	text: RopeSlice<'a>,
	doc_len: CharLen,
	queue: &'t ReparseQueue,
	from_pos: CharIdx,
	restart: CharIdx,
	max_amount: CharLen,
	/// The list the pass is currently anchored in.
	level: NodeId,
	/// Old end of the level list.
	level_end: CharIdx,
	/// List items parsed or reused so far.
	units: usize,
	/// Characters covered by reused nodes.
	skipped: CharLen,
	delta: NodeTreeDelta,
}

impl<'a> Reparser<'_, 'a> {
	fn cursor(&self, pos: CharIdx) -> Cursor<'a> {
		Cursor::new(self.text, pos)
	}

	fn run(&mut self, mut list_pos: NodePos, mut from: CharIdx) -> PassEnd {
		loop {
			let mut list = self.open_level(list_pos, from);
			let (at, complete) = match self.parse_list(&mut list, from) {
				Ok(ListEnd::Synced { at }) => return PassEnd::Done(at),
				Ok(ListEnd::Closed { at, complete }) => (at, complete),
				Err(halt) => return PassEnd::Budget(halt.at),
			};
			if list.id == self.tree.root() {
				let root = self.tree.node_mut(list.id);
				root.size = self.doc_len;
				root.complete = true;
				return PassEnd::Done(self.doc_len);
			}
			// An unchanged body can still be followed by a changed closing token.
			if list_pos.end != at || self.tree.node(list.id).complete != complete {
				self.delta.note_changed(list.id, list_pos.start, list_pos.size());
				let node = self.tree.node_mut(list.id);
				node.size = at - list_pos.start;
				node.complete = complete;
			}
			let owner = self.tree.node(list.id).parent;

			let Some(compound) = owner.and_then(|id| self.tree.node_pos(id)) else {
				return PassEnd::Failed(Inconsistent {
					list: self.tree.root_pos(),
					at: 0,
					reason: "body without a compound",
				});
			};
			let Some(parent) = self.tree.parent_pos(compound) else {
				return PassEnd::Failed(Inconsistent {
					list: self.tree.root_pos(),
					at: 0,
					reason: "compound without a list",
				});
			};
			let resumed = self.resume_compound(compound, list.id, at, complete);
			if resumed.step == Transition::EpicFail {
				return PassEnd::Failed(Inconsistent {
					list: parent,
					at: compound.start,
					reason: "compound cannot resume after its body",
				});
			}
			let node = self.tree.node(compound.id);
			if resumed.end == compound.end && resumed.complete == node.complete {
				return PassEnd::Done(resumed.end);
			}
			self.delta.note_changed(compound.id, compound.start, compound.size());
			self.finish(compound.id, compound.start, resumed.end, resumed.complete, resumed.state);
			self.level = parent.id;
			self.level_end = parent.end;
			list_pos = parent;
			from = resumed.end;
		}
	}

	/// Opens `list` as the level list at `at`: children ending by `at` stay,
	/// later ones become candidates, anything straddling `at` is dropped.
	///
	/// A compound that grew while resuming already ends at `at`; old siblings
	/// it swallowed overlap it and are dropped too.
	fn open_level(&mut self, list: NodePos, at: CharIdx) -> ListCtx {
		let children = std::mem::take(&mut self.tree.node_mut(list.id).children);
		let mut kept = Vec::with_capacity(children.len());
		let mut cands = VecDeque::new();
		let mut prev_end = list.start;
		for child in children {
			let node = self.tree.node(child);
			let start = list.start + node.offset;
			let end = start + node.size;
			if end <= at && start < at && start >= prev_end {
				prev_end = end;
				kept.push(child);
			} else if start >= at {
				cands.push_back(Cand { id: child, start, end });
			} else {
				self.tree.free_subtree(child, start, &mut self.delta);
			}
		}
		self.tree.node_mut(list.id).children = kept;
		ListCtx {
			id: list.id,
			start: list.start,
			kind: self.tree.node(list.id).kind,
			cands,
			resumable: true,
		}
	}

	fn reusable(&self, cand: Cand) -> bool {
		self.tree
			.get(cand.id)
			.is_some_and(|node| node.complete && node.kind != NodeKind::Placeholder)
			&& !self.queue.touches(cand.start, cand.end)
	}

	fn may_stop(&self, list: &ListCtx, q: CharIdx) -> bool {
		list.resumable
			&& q > self.from_pos
			&& q < self.level_end
			&& self.units > 0
			&& (q - self.restart).saturating_sub(self.skipped) >= self.max_amount
	}

	fn parse_list(&mut self, list: &mut ListCtx, from: CharIdx) -> Result<ListEnd, Halt> {
		let kind = list.kind;
		let mut pos = from;
		loop {
			let (tok, terminated) = self.cursor(pos).peek_raw();
			let q = tok.start;
			while let Some(front) = list.cands.front().copied()
				&& front.start < q
			{
				list.cands.pop_front();
				self.tree.free_subtree(front.id, front.start, &mut self.delta);
			}

			let close = match tok.kind {
				bramble_lexer::TokenKind::Eof => Some((self.doc_len, kind == NodeKind::CompilationUnit)),
				bramble_lexer::TokenKind::RBrace if kind.is_body() => Some((q, true)),
				_ => None,
			};
			if let Some((at, complete)) = close {
				self.free_cands(list);
				return Ok(ListEnd::Closed { at, complete });
			}

			if let Some(front) = list.cands.front().copied()
				&& front.start == q
				&& self.reusable(front)
			{
				if list.id == self.level && q > self.from_pos {
					self.keep_cands(list);
					return Ok(ListEnd::Synced { at: q });
				}
				list.cands.pop_front();
				self.adopt(list, front);
				self.units += 1;
				self.skipped += front.end - front.start;
				pos = front.end;
				continue;
			}

			if self.may_stop(list, q) {
				self.keep_cands(list);
				self.provisional_list(list);
				return Err(Halt { at: q });
			}

			let mut slot = Slot {
				parent: list.id,
				start: list.start,
				resumable: list.resumable,
				cands: Some(&mut list.cands),
			};
			match self.item(&mut slot, kind, tok, terminated) {
				Ok((end, _)) => {
					pos = end;
					self.units += 1;
				}
				Err(halt) => {
					self.free_cands(list);
					self.provisional_list(list);
					return Err(halt);
				}
			}
		}
	}

	fn free_cands(&mut self, list: &mut ListCtx) {
		for cand in list.cands.drain(..) {
			self.tree.free_subtree(cand.id, cand.start, &mut self.delta);
		}
	}

	fn keep_cands(&mut self, list: &mut ListCtx) {
		while let Some(cand) = list.cands.pop_front() {
			self.adopt(list, cand);
		}
	}

	fn adopt(&mut self, list: &ListCtx, cand: Cand) {
		let node = self.tree.node_mut(cand.id);
		node.parent = Some(list.id);
		node.offset = cand.start - list.start;
		self.tree.node_mut(list.id).children.push(cand.id);
	}

	/// Extends an interrupted list to the level end until a later pass finishes it.
	fn provisional_list(&mut self, list: &ListCtx) {
		if list.id == self.level {
			return;
		}
		let node = self.tree.node_mut(list.id);
		node.size = self.level_end.max(list.start) - list.start;
		node.complete = false;
	}

	/// Creates the node for an item at `at`, recycling the front candidate if
	/// it has the same kind. Returns the node and the body it had before.
	fn begin(&mut self, slot: &mut Slot<'_>, kind: NodeKind, at: CharIdx) -> (NodeId, Option<Cand>) {
		if kind != NodeKind::Placeholder
			&& let Some(cands) = slot.cands.as_deref_mut()
			&& let Some(front) = cands.front().copied()
			&& front.start == at
			&& self.tree.node(front.id).kind == kind
		{
			cands.pop_front();
			let old_body = self.recycle(front, slot, at);
			return (front.id, old_body);
		}
		let id = self.tree.alloc(kind, Some(slot.parent), at - slot.start, 0);
		self.delta.added.push(id);
		self.tree.node_mut(slot.parent).children.push(id);
		(id, None)
	}

	fn recycle(&mut self, cand: Cand, slot: &Slot<'_>, at: CharIdx) -> Option<Cand> {
		self.delta.note_changed(cand.id, cand.start, cand.end - cand.start);
		let children = std::mem::take(&mut self.tree.node_mut(cand.id).children);
		let mut old_body = None;
		for child in children {
			let node = self.tree.node(child);
			let start = cand.start + node.offset;
			let end = start + node.size;
			if node.kind.is_body() && old_body.is_none() {
				old_body = Some(Cand { id: child, start, end });
			} else {
				self.tree.free_subtree(child, start, &mut self.delta);
			}
		}
		let node = self.tree.node_mut(cand.id);
		node.parent = Some(slot.parent);
		node.offset = at - slot.start;
		node.size = 0;
		node.complete = false;
		node.state = ParseState::Header;
		node.name = None;
		self.tree.node_mut(slot.parent).children.push(cand.id);
		old_body
	}

	/// Creates or recycles the body node of `open` at `body_start`, returning
	/// the list context to parse it with.
	fn open_body(&mut self, open: &mut Open, kind: NodeKind, body_start: CharIdx) -> ListCtx {
		let mut cands = VecDeque::new();
		let id = match open.old_body.take() {
			Some(old) if self.tree.node(old.id).kind == kind => {
				self.delta.note_changed(old.id, old.start, old.end - old.start);
				let children = std::mem::take(&mut self.tree.node_mut(old.id).children);
				for child in children {
					let node = self.tree.node(child);
					let start = old.start + node.offset;
					cands.push_back(Cand {
						id: child,
						start,
						end: start + node.size,
					});
				}
				let node = self.tree.node_mut(old.id);
				node.offset = body_start - open.start;
				node.size = 0;
				node.complete = false;
				self.tree.node_mut(open.id).children.push(old.id);
				old.id
			}
			other => {
				if let Some(old) = other {
					self.tree.free_subtree(old.id, old.start, &mut self.delta);
				}
				let id = self.tree.alloc(kind, Some(open.id), body_start - open.start, 0);
				self.delta.added.push(id);
				self.tree.node_mut(open.id).children.push(id);
				id
			}
		};
		self.tree.node_mut(id).state = ParseState::Body;
		ListCtx {
			id,
			start: body_start,
			kind,
			cands,
			resumable: open.resumable,
		}
	}

	fn finish(&mut self, id: NodeId, start: CharIdx, end: CharIdx, complete: bool, state: ParseState) {
		let node = self.tree.node_mut(id);
		node.size = end - start;
		node.complete = complete;
		node.state = state;
	}

	/// Parses a compound from its header, driving its state machine.
	fn compound(&mut self, slot: &mut Slot<'_>, kind: NodeKind, shape: Shape, at: CharIdx) -> Result<(CharIdx, bool), Halt> {
		let (id, old_body) = self.begin(slot, kind, at);
		let mut open = Open {
			id,
			start: at,
			shape,
			state: ParseState::Header,
			old_body,
			resumable: slot.resumable,
			name: None,
		};
		let mut cursor = self.cursor(at);
		let result = self.drive(&mut open, &mut cursor);
		if let Some(old) = open.old_body.take() {
			self.tree.free_subtree(old.id, old.start, &mut self.delta);
		}
		self.tree.node_mut(id).name = open.name.take();
		match result {
			Ok((end, complete)) => {
				self.finish(id, at, end, complete, open.state);
				Ok((end, complete))
			}
			Err(halt) => {
				let end = self.level_end.max(at);
				self.finish(id, at, end, false, ParseState::Body);
				Err(halt)
			}
		}
	}

	fn drive(&mut self, open: &mut Open, cursor: &mut Cursor<'a>) -> Result<(CharIdx, bool), Halt> {
		loop {
			let step = match open.state {
				ParseState::Header => self.header(open, cursor),
				ParseState::Body => self.body(open, cursor)?,
				ParseState::Trailer => self.trailer(cursor),
				ParseState::Finished => Transition::EndsNode,
			};
			match step {
				Transition::BeginsNextState => open.state = ParseState::Body,
				Transition::EndsState => {
					open.state = if open.shape == Shape::Do {
						ParseState::Trailer
					} else {
						ParseState::Finished
					};
				}
				Transition::EndsNode => {
					open.state = ParseState::Finished;
					return Ok((cursor.pos(), true));
				}
				Transition::Incomplete | Transition::EpicFail => return Ok((cursor.pos(), false)),
			}
		}
	}

	/// Body state: a brace body or, where allowed, a single nested statement.
	fn body(&mut self, open: &mut Open, cursor: &mut Cursor<'a>) -> Result<Transition, Halt> {
		use bramble_lexer::TokenKind;

		let tok = cursor.peek();
		match tok.kind {
			TokenKind::LBrace => {
				cursor.bump();
				let body_start = cursor.pos();
				let kind = open.shape.body_kind();
				let mut list = self.open_body(open, kind, body_start);
				let closed = self.parse_list(&mut list, body_start)?;
				Ok(self.close_body(list.id, body_start, closed, cursor))
			}
			TokenKind::RBrace | TokenKind::Eof => Ok(Transition::Incomplete),
			TokenKind::Semi if open.shape.braceless() => {
				cursor.bump();
				Ok(open.shape.after_braceless(true))
			}
			_ if open.shape.braceless() => {
				if let Some(old) = open.old_body.take() {
					self.tree.free_subtree(old.id, old.start, &mut self.delta);
				}
				let mut slot = Slot {
					parent: open.id,
					start: open.start,
					resumable: false,
					cands: None,
				};
				let (end, complete) = self.statement(&mut slot, tok)?;
				cursor.seek(end);
				Ok(open.shape.after_braceless(complete))
			}
			_ => Ok(Transition::Incomplete),
		}
	}

	/// Sizes a parsed body and consumes its closing brace.
	fn close_body(&mut self, body: NodeId, body_start: CharIdx, closed: ListEnd, cursor: &mut Cursor<'a>) -> Transition {
		match closed {
			ListEnd::Closed { at, complete: true } => {
				self.finish(body, body_start, at, true, ParseState::Finished);
				cursor.seek(at);
				cursor.bump();
				Transition::EndsState
			}
			ListEnd::Closed { at, complete: false } | ListEnd::Synced { at } => {
				self.finish(body, body_start, at, false, ParseState::Body);
				cursor.seek(self.doc_len);
				Transition::Incomplete
			}
		}
	}
}

impl Reparser<'_, '_> {
	/// Continues `compound` after its body list closed at `at`.
	fn resume_compound(&mut self, compound: NodePos, body: NodeId, at: CharIdx, complete: bool) -> Resumed {
		use bramble_lexer::{Keyword, TokenKind};

		let failed = Resumed {
			step: Transition::EpicFail,
			end: compound.end,
			complete: false,
			state: ParseState::Body,
		};
		let node = self.tree.node(compound.id);
		if node.state == ParseState::Header || node.children.last() != Some(&body) {
			return failed;
		}
		if !complete {
			return Resumed {
				step: Transition::Incomplete,
				end: self.doc_len,
				complete: false,
				state: ParseState::Body,
			};
		}
		let mut cursor = self.cursor(at);
		let (close, _) = cursor.peek_raw();
		if close.kind != TokenKind::RBrace || close.start != at {
			return failed;
		}
		cursor.bump();
		let is_do = node.kind == NodeKind::Iteration && self.cursor(compound.start).peek().kind == TokenKind::Keyword(Keyword::Do);
		if !is_do {
			return Resumed {
				step: Transition::EndsNode,
				end: cursor.pos(),
				complete: true,
				state: ParseState::Finished,
			};
		}
		let step = self.trailer(&mut cursor);
		let complete = step == Transition::EndsNode;
		Resumed {
			step,
			end: cursor.pos(),
			complete,
			state: if complete { ParseState::Finished } else { ParseState::Trailer },
		}
	}
}
