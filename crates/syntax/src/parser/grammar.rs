//! Java constructs recognised by the reparse engine.
//!
//! The grammar is deliberately shallow: it finds the extent of every construct
//! that opens a scope and of the statements between them, and nothing else.
//! Expressions are scanned for balanced brackets and embedded blocks only.

use std::collections::VecDeque;

use bramble_lexer::{Keyword, LexState, Lexer, Token, TokenKind};
use bramble_primitives::CharIdx;
use ropey::RopeSlice;

use super::{Cand, Halt, ListCtx, Open, Reparser, Slot, Transition};
use crate::node::{CommentKind, NodeId, NodeKind, ParseState, TypeDefKind};

/// Token reader positioned on a token boundary.
#[derive(Debug, Clone, Copy)]
pub(super) struct Cursor<'a> {
	text: RopeSlice<'a>,
	pos: CharIdx,
}

impl<'a> Cursor<'a> {
	pub(super) fn new(text: RopeSlice<'a>, pos: CharIdx) -> Self {
		Self { text, pos }
	}

	/// End of the last consumed token.
	#[inline]
	pub(super) fn pos(&self) -> CharIdx {
		self.pos
	}

	#[inline]
	pub(super) fn seek(&mut self, pos: CharIdx) {
		self.pos = pos;
	}

	fn lexer(&self) -> Lexer<'a> {
		Lexer::resume(self.text, self.pos, self.text.len_chars(), LexState::Normal)
	}

	/// Next non-whitespace token, comments included, and whether it was
	/// terminated (false for an unclosed block comment).
	pub(super) fn peek_raw(&self) -> (Token, bool) {
		let mut lexer = self.lexer();
		let token = lexer.next_significant();
		(token, lexer.state() == LexState::Normal)
	}

	/// Next token that is neither whitespace nor a comment.
	pub(super) fn peek(&self) -> Token {
		let mut lexer = self.lexer();
		loop {
			let token = lexer.next_significant();
			if !token.kind.is_comment() {
				return token;
			}
		}
	}

	pub(super) fn bump(&mut self) -> Token {
		let token = self.peek();
		self.pos = token.end();
		token
	}

	fn is(&self, token: &Token, text: &str) -> bool {
		self.text.slice(token.start..token.end()) == text
	}

	fn text_of(&self, token: &Token) -> String {
		self.text.slice(token.start..token.end()).to_string()
	}

	/// Consumes a parenthesised group starting at `(`.
	///
	/// Returns false, leaving the offending token unread, when the group runs
	/// into an unbalanced closing brace or the document end.
	fn skip_parens(&mut self) -> bool {
		let mut parens = 0usize;
		let mut braces = 0usize;
		loop {
			let token = self.peek();
			match token.kind {
				TokenKind::Eof => return false,
				TokenKind::LParen => parens += 1,
				TokenKind::RParen => {
					self.bump();
					parens = parens.saturating_sub(1);
					if parens == 0 {
						return true;
					}
					continue;
				}
				TokenKind::LBrace => braces += 1,
				TokenKind::RBrace if braces == 0 => return false,
				TokenKind::RBrace => braces -= 1,
					_ => {}
			}
			self.bump();
		}
	}

	/// Consumes a brace group that does not open a scope (array initializers).
	fn skip_braces(&mut self) -> bool {
		let mut depth = 0usize;
		loop {
			let token = self.peek();
			match token.kind {
				TokenKind::Eof => return false,
				TokenKind::LBrace => depth += 1,
				TokenKind::RBrace => {
					self.bump();
					depth = depth.saturating_sub(1);
					if depth == 0 {
						return true;
					}
					continue;
				}
				_ => {}
			}
			self.bump();
		}
	}

	/// True if the cursor sits on `record Name (` or `record Name <`.
	fn at_record_header(mut self) -> bool {
		self.bump();
		if self.bump().kind != TokenKind::Ident {
			return false;
		}
		let next = self.peek();
		next.kind == TokenKind::LParen || (next.kind == TokenKind::Operator && self.is(&next, "<"))
	}
}

/// How a compound's state machine proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Shape {
	Type(TypeDefKind),
	Method,
	/// Header then a mandatory brace body: `try`, `catch`, `finally`,
	/// `synchronized`, `switch`, initializers and plain blocks.
	Braced,
	/// `for`, `while`, `if` and `else`: the body may be a single statement.
	Loop,
	/// `do` body followed by a `while (...);` trailer.
	Do,
}

impl Shape {
	pub(super) fn body_kind(self) -> NodeKind {
		match self {
			Self::Type(_) => NodeKind::TypeBody,
			Self::Method => NodeKind::MethodBody,
			Self::Braced | Self::Loop | Self::Do => NodeKind::BlockBody,
		}
	}

	pub(super) fn braceless(self) -> bool {
		matches!(self, Self::Loop | Self::Do)
	}

	pub(super) fn after_braceless(self, complete: bool) -> Transition {
		match (complete, self) {
			(false, _) => Transition::Incomplete,
			(true, Self::Do) => Transition::EndsState,
			(true, _) => Transition::EndsNode,
		}
	}
}

/// What a type body member turns out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
	Type(TypeDefKind),
	Method,
	Field,
	Initializer,
}

fn type_keyword(kind: TokenKind) -> Option<TypeDefKind> {
	match kind {
		TokenKind::Keyword(Keyword::Class) => Some(TypeDefKind::Class),
		TokenKind::Keyword(Keyword::Interface) => Some(TypeDefKind::Interface),
		TokenKind::Keyword(Keyword::Enum) => Some(TypeDefKind::Enum),
		_ => None,
	}
}

/// Looks past modifiers and annotations for a type declaration keyword.
fn type_ahead(mut cursor: Cursor<'_>) -> Option<TypeDefKind> {
	loop {
		let token = cursor.peek();
		match token.kind {
			TokenKind::Annotation if cursor.is(&token, "@interface") => return Some(TypeDefKind::Annotation),
			TokenKind::Annotation => {
				cursor.bump();
				if cursor.peek().kind == TokenKind::LParen && !cursor.skip_parens() {
					return None;
				}
			}
			TokenKind::Keyword(kw) if kw.is_modifier() => {
				cursor.bump();
			}
			TokenKind::Ident if cursor.is(&token, "record") && cursor.at_record_header() => return Some(TypeDefKind::Record),
			kind => return type_keyword(kind),
		}
	}
}

/// Classifies a type body member by scanning to its first decisive token.
fn classify_member(mut cursor: Cursor<'_>) -> Member {
	let mut modifiers_only = true;
	loop {
		let token = cursor.peek();
		match token.kind {
			TokenKind::Annotation if cursor.is(&token, "@interface") => return Member::Type(TypeDefKind::Annotation),
			TokenKind::Annotation => {
				cursor.bump();
				if cursor.peek().kind == TokenKind::LParen && !cursor.skip_parens() {
					return Member::Field;
				}
				continue;
			}
			TokenKind::Keyword(kw) if kw.is_modifier() => {}
			TokenKind::Ident if modifiers_only && cursor.is(&token, "record") && cursor.at_record_header() => {
				return Member::Type(TypeDefKind::Record);
			}
			TokenKind::LParen => return Member::Method,
			TokenKind::Operator if cursor.is(&token, "=") => return Member::Field,
			TokenKind::Semi | TokenKind::Comma | TokenKind::RBrace | TokenKind::Eof => return Member::Field,
			TokenKind::LBrace if modifiers_only => return Member::Initializer,
			TokenKind::LBrace => return Member::Field,
			kind => {
				if let Some(kind) = type_keyword(kind) {
					return Member::Type(kind);
				}
				modifiers_only = false;
			}
		}
		cursor.bump();
	}
}

/// Body kind of a brace group met inside a statement, or `None` when the
/// braces do not open a scope.
fn embedded_body(prev: Option<TokenKind>, seen_new: bool, declaring: bool) -> Option<NodeKind> {
	match prev? {
		TokenKind::Arrow => Some(NodeKind::BlockBody),
		TokenKind::RParen if seen_new || declaring => Some(NodeKind::TypeBody),
		TokenKind::RParen => Some(NodeKind::BlockBody),
		TokenKind::Ident if declaring => Some(NodeKind::TypeBody),
		_ => None,
	}
}

fn type_header(kind: TypeDefKind, open: &mut Open, cursor: &mut Cursor<'_>) -> Transition {
	let mut expect_name = false;
	loop {
		let token = cursor.peek();
		match token.kind {
			TokenKind::LBrace => return Transition::BeginsNextState,
			TokenKind::Semi => {
				cursor.bump();
				return Transition::EndsNode;
			}
			TokenKind::RBrace | TokenKind::Eof => return Transition::Incomplete,
			TokenKind::LParen => {
				if !cursor.skip_parens() {
					return Transition::Incomplete;
				}
				expect_name = false;
				continue;
			}
			_ => {}
		}
		if expect_name && token.kind == TokenKind::Ident {
			open.name = Some(cursor.text_of(&token));
		}
		let keyword = match token.kind {
			TokenKind::Annotation => cursor.is(&token, "@interface"),
			TokenKind::Ident => kind == TypeDefKind::Record && cursor.is(&token, "record"),
			other => type_keyword(other).is_some(),
		};
		expect_name = keyword && open.name.is_none();
		cursor.bump();
	}
}

fn method_header(open: &mut Open, cursor: &mut Cursor<'_>) -> Transition {
	let mut last_ident = None;
	let mut after_annotation = false;
	loop {
		let token = cursor.peek();
		match token.kind {
			TokenKind::LBrace => return Transition::BeginsNextState,
			TokenKind::Semi | TokenKind::Comma => {
				cursor.bump();
				return Transition::EndsNode;
			}
			TokenKind::RBrace | TokenKind::Eof => return Transition::Incomplete,
			TokenKind::LParen => {
				if !after_annotation && open.name.is_none() {
					open.name = last_ident.take().map(|ident| cursor.text_of(&ident));
				}
				after_annotation = false;
				if !cursor.skip_parens() {
					return Transition::Incomplete;
				}
				continue;
			}
			TokenKind::Ident => last_ident = Some(token),
			_ => {}
		}
		after_annotation = token.kind == TokenKind::Annotation;
		cursor.bump();
	}
}

fn braced_header(cursor: &mut Cursor<'_>) -> Transition {
	loop {
		let token = cursor.peek();
		match token.kind {
			TokenKind::LBrace => return Transition::BeginsNextState,
			TokenKind::LParen => {
				if !cursor.skip_parens() {
					return Transition::Incomplete;
				}
				continue;
			}
			TokenKind::RBrace | TokenKind::Eof | TokenKind::Semi => return Transition::Incomplete,
			_ => {
				cursor.bump();
			}
		}
	}
}

fn loop_header(cursor: &mut Cursor<'_>) -> Transition {
	let keyword = cursor.bump();
	if keyword.kind == TokenKind::Keyword(Keyword::Else) {
		if cursor.peek().kind != TokenKind::Keyword(Keyword::If) {
			return Transition::BeginsNextState;
		}
		cursor.bump();
	}
	if cursor.peek().kind != TokenKind::LParen || !cursor.skip_parens() {
		return Transition::Incomplete;
	}
	Transition::BeginsNextState
}

impl<'a> Reparser<'_, 'a> {
	pub(super) fn header(&mut self, open: &mut Open, cursor: &mut Cursor<'a>) -> Transition {
		match open.shape {
			Shape::Type(kind) => type_header(kind, open, cursor),
			Shape::Method => method_header(open, cursor),
			Shape::Braced => braced_header(cursor),
			Shape::Loop => loop_header(cursor),
			Shape::Do => {
				cursor.bump();
				Transition::BeginsNextState
			}
		}
	}

	/// `while (...) ;` after the body of a `do` loop.
	pub(super) fn trailer(&mut self, cursor: &mut Cursor<'a>) -> Transition {
		if cursor.peek().kind != TokenKind::Keyword(Keyword::While) {
			return Transition::Incomplete;
		}
		cursor.bump();
		if cursor.peek().kind != TokenKind::LParen || !cursor.skip_parens() {
			return Transition::Incomplete;
		}
		if cursor.peek().kind != TokenKind::Semi {
			return Transition::Incomplete;
		}
		cursor.bump();
		Transition::EndsNode
	}

	/// Parses one list item starting with `token`.
	pub(super) fn item(&mut self, slot: &mut Slot<'_>, list: NodeKind, token: Token, terminated: bool) -> Result<(CharIdx, bool), Halt> {
		match token.kind {
			TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => Ok(self.comment(slot, token, terminated)),
			TokenKind::Semi | TokenKind::Comma => Ok(self.leaf(slot, token, true)),
			TokenKind::RBrace => Ok(self.leaf(slot, token, false)),
			_ => match list {
				NodeKind::CompilationUnit => self.unit_item(slot, token),
				NodeKind::TypeBody => self.member(slot, token),
				_ => self.statement(slot, token),
			},
		}
	}

	fn discard(&mut self, old_body: Option<Cand>) {
		if let Some(old) = old_body {
			self.tree.free_subtree(old.id, old.start, &mut self.delta);
		}
	}

	fn comment(&mut self, slot: &mut Slot<'_>, token: Token, terminated: bool) -> (CharIdx, bool) {
		let kind = match token.kind {
			TokenKind::LineComment => CommentKind::Line,
			TokenKind::DocComment => CommentKind::Doc,
			_ => CommentKind::Block,
		};
		let complete = kind == CommentKind::Line || terminated;
		let (id, old_body) = self.begin(slot, NodeKind::Comment(kind), token.start);
		self.discard(old_body);
		self.finish(id, token.start, token.end(), complete, ParseState::Finished);
		(token.end(), complete)
	}

	/// A statement made of a single token.
	fn leaf(&mut self, slot: &mut Slot<'_>, token: Token, complete: bool) -> (CharIdx, bool) {
		let (id, old_body) = self.begin(slot, NodeKind::Statement, token.start);
		self.discard(old_body);
		self.finish(id, token.start, token.end(), complete, ParseState::Finished);
		(token.end(), complete)
	}

	fn unit_item(&mut self, slot: &mut Slot<'_>, token: Token) -> Result<(CharIdx, bool), Halt> {
		if matches!(token.kind, TokenKind::Keyword(Keyword::Package | Keyword::Import)) {
			return self.simple(slot, NodeKind::Statement, token.start, false);
		}
		match type_ahead(self.cursor(token.start)) {
			Some(kind) => self.compound(slot, NodeKind::TypeDef(kind), Shape::Type(kind), token.start),
			None => self.simple(slot, NodeKind::Statement, token.start, false),
		}
	}

	fn member(&mut self, slot: &mut Slot<'_>, token: Token) -> Result<(CharIdx, bool), Halt> {
		let at = token.start;
		match classify_member(self.cursor(at)) {
			Member::Type(kind) => self.compound(slot, NodeKind::TypeDef(kind), Shape::Type(kind), at),
			Member::Method => self.compound(slot, NodeKind::MethodDef, Shape::Method, at),
			Member::Initializer => self.compound(slot, NodeKind::Block, Shape::Braced, at),
			Member::Field => self.simple(slot, NodeKind::Field, at, true),
		}
	}

	/// Parses one statement of a method or block body.
	pub(super) fn statement(&mut self, slot: &mut Slot<'_>, token: Token) -> Result<(CharIdx, bool), Halt> {
		let at = token.start;
		match token.kind {
			TokenKind::LBrace => self.compound(slot, NodeKind::Block, Shape::Braced, at),
			TokenKind::Semi => Ok(self.leaf(slot, token, true)),
			TokenKind::Keyword(Keyword::For | Keyword::While) => self.compound(slot, NodeKind::Iteration, Shape::Loop, at),
			TokenKind::Keyword(Keyword::Do) => self.compound(slot, NodeKind::Iteration, Shape::Do, at),
			TokenKind::Keyword(Keyword::If | Keyword::Else) => self.compound(slot, NodeKind::Selection, Shape::Loop, at),
			TokenKind::Keyword(Keyword::Switch) => self.compound(slot, NodeKind::Selection, Shape::Braced, at),
			TokenKind::Keyword(Keyword::Try | Keyword::Catch | Keyword::Finally | Keyword::Synchronized) => {
				self.compound(slot, NodeKind::Block, Shape::Braced, at)
			}
			TokenKind::Keyword(Keyword::Case | Keyword::Default) => Ok(self.label(slot, at)),
			_ => {
				if let Some(kind) = type_ahead(self.cursor(at)) {
					return self.compound(slot, NodeKind::TypeDef(kind), Shape::Type(kind), at);
				}
				let mut after = self.cursor(at);
				after.bump();
				if token.kind == TokenKind::Ident && after.peek().kind == TokenKind::Colon {
					return Ok(self.label(slot, at));
				}
				self.simple(slot, NodeKind::Statement, at, false)
			}
		}
	}

	/// `case ...:`, `default ->` or `name:`.
	fn label(&mut self, slot: &mut Slot<'_>, at: CharIdx) -> (CharIdx, bool) {
		let (id, old_body) = self.begin(slot, NodeKind::Statement, at);
		self.discard(old_body);
		let mut cursor = self.cursor(at);
		cursor.bump();
		let mut depth = 0usize;
		let complete = loop {
			let token = cursor.peek();
			match token.kind {
				TokenKind::Colon | TokenKind::Arrow if depth == 0 => {
					cursor.bump();
					break true;
				}
				TokenKind::LParen | TokenKind::LBracket => depth += 1,
				TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
				TokenKind::Eof | TokenKind::RBrace | TokenKind::LBrace | TokenKind::Semi => break false,
				_ => {}
			}
			cursor.bump();
		};
		self.finish(id, at, cursor.pos(), complete, ParseState::Finished);
		(cursor.pos(), complete)
	}

	/// A statement or field: everything up to `;` outside brackets.
	fn simple(&mut self, slot: &mut Slot<'_>, kind: NodeKind, at: CharIdx, member: bool) -> Result<(CharIdx, bool), Halt> {
		let (id, old_body) = self.begin(slot, kind, at);
		self.discard(old_body);
		let mut cursor = self.cursor(at);
		let mut depth = 0usize;
		let mut prev = None;
		let mut seen_new = false;
		let mut seen_assign = false;
		let mut last_ident = None;
		let mut name = None;
		let complete = loop {
			let token = cursor.peek();
			match token.kind {
				TokenKind::Eof | TokenKind::RBrace => break false,
				TokenKind::Semi if depth == 0 => {
					cursor.bump();
					name = name.or(last_ident);
					break true;
				}
				TokenKind::LBrace => {
					let closed = match embedded_body(prev, seen_new, member && !seen_assign) {
						Some(body) => self.embedded_block(id, at, body, &mut cursor)?,
						None => cursor.skip_braces(),
					};
					if !closed {
						break false;
					}
					prev = Some(TokenKind::RBrace);
					continue;
				}
				TokenKind::LParen | TokenKind::LBracket => depth += 1,
				TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
				TokenKind::Keyword(Keyword::New) => seen_new = true,
				TokenKind::Operator if depth == 0 && cursor.is(&token, "=") => {
					seen_assign = true;
					name = name.or(last_ident);
				}
				TokenKind::Comma if depth == 0 => name = name.or(last_ident),
				TokenKind::Ident if depth == 0 => last_ident = Some(token),
				_ => {}
			}
			cursor.bump();
			prev = Some(token.kind);
		};
		if kind == NodeKind::Field {
			self.tree.node_mut(id).name = name.map(|ident| cursor.text_of(&ident));
		}
		let end = cursor.pos();
		self.finish(id, at, end, complete, ParseState::Finished);
		Ok((end, complete))
	}

	/// A scope opened inside a statement: a lambda body, an anonymous class
	/// body or a switch expression. Returns false if it never closes.
	fn embedded_block(&mut self, parent: NodeId, parent_start: CharIdx, body_kind: NodeKind, cursor: &mut Cursor<'a>) -> Result<bool, Halt> {
		let brace = cursor.bump();
		let block = self.tree.alloc(NodeKind::Block, Some(parent), brace.start - parent_start, 0);
		self.delta.added.push(block);
		self.tree.node_mut(parent).children.push(block);

		let body_start = brace.end();
		let body = self.tree.alloc(body_kind, Some(block), body_start - brace.start, 0);
		self.delta.added.push(body);
		self.tree.node_mut(block).children.push(body);
		self.tree.node_mut(body).state = ParseState::Body;

		let mut list = ListCtx {
			id: body,
			start: body_start,
			kind: body_kind,
			cands: VecDeque::new(),
			resumable: false,
		};
		let closed = self.parse_list(&mut list, body_start)?;
		let complete = self.close_body(body, body_start, closed, cursor) == Transition::EndsState;
		let (end, state) = if complete {
			(cursor.pos(), ParseState::Finished)
		} else {
			(self.doc_len, ParseState::Body)
		};
		self.finish(block, brace.start, end, complete, state);
		Ok(complete)
	}
}
