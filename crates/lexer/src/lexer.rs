use bramble_primitives::CharIdx;
use ropey::RopeSlice;

use crate::keyword::{Keyword, is_primitive};
use crate::token::{Token, TokenKind};

#[cfg(test)]
mod tests;

/// Lexer state that must be carried across a resume point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexState {
	#[default]
	Normal,
	/// Inside an unterminated `/* */` (or `/** */` when `doc`).
	BlockComment { doc: bool },
	/// Inside an unterminated `"""` text block.
	TextBlock,
}

/// Operators tried longest first.
const OPERATORS: &[&str] = &[
	">>>=", "<<=", ">>=", ">>>", "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=",
	"&=", "|=", "^=", "<<", ">>",
];

/// Restartable tokenizer over a rope slice.
///
/// `next_token` never fails: unterminated constructs end at the range end
/// with [`Lexer::state`] left inside the construct, and unknown characters
/// come back as [`TokenKind::Invalid`].
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
	text: RopeSlice<'a>,
	pos: CharIdx,
	end: CharIdx,
	state: LexState,
}

impl<'a> Lexer<'a> {
	/// Lexes the whole slice from the start.
	pub fn new(text: RopeSlice<'a>) -> Self {
		Self::resume(text, 0, text.len_chars(), LexState::Normal)
	}

	/// Resumes lexing at `start` in `state`, stopping at `end`.
	pub fn resume(text: RopeSlice<'a>, start: CharIdx, end: CharIdx, state: LexState) -> Self {
		let end = end.min(text.len_chars());
		Self {
			text,
			pos: start.min(end),
			end,
			state,
		}
	}

	pub fn text(&self) -> RopeSlice<'a> {
		self.text
	}

	/// Offset of the next unread character.
	pub fn pos(&self) -> CharIdx {
		self.pos
	}

	pub fn end(&self) -> CharIdx {
		self.end
	}

	/// State to resume with after the last returned token.
	pub fn state(&self) -> LexState {
		self.state
	}

	/// Moves to `pos`, which must be a token boundary in [`LexState::Normal`].
	pub fn seek(&mut self, pos: CharIdx) {
		self.pos = pos.min(self.end);
		self.state = LexState::Normal;
	}

	/// Extends the lexing limit, never past the text end.
	pub fn set_end(&mut self, end: CharIdx) {
		self.end = end.min(self.text.len_chars()).max(self.pos);
	}

	/// Returns the token text.
	pub fn slice(&self, token: &Token) -> RopeSlice<'a> {
		self.text.slice(token.start..token.end())
	}

	pub fn next_token(&mut self) -> Token {
		let start = self.pos;
		if start >= self.end {
			return Token {
				kind: TokenKind::Eof,
				start,
				len: 0,
			};
		}
		let kind = match self.state {
			LexState::BlockComment { doc } => self.block_comment_body(doc),
			LexState::TextBlock => self.text_block_body(),
			LexState::Normal => self.lex_normal(),
		};
		debug_assert!(self.pos > start);
		Token {
			kind,
			start,
			len: self.pos - start,
		}
	}

	/// Next token that is not whitespace.
	pub fn next_significant(&mut self) -> Token {
		loop {
			let token = self.next_token();
			if !token.kind.is_trivia() {
				return token;
			}
		}
	}

	/// Peeks the next significant token without consuming it.
	pub fn peek_significant(&self) -> Token {
		let mut probe = *self;
		probe.next_significant()
	}

	fn peek(&self, n: usize) -> Option<char> {
		let at = self.pos + n;
		if at < self.end { self.text.get_char(at) } else { None }
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek(0)?;
		self.pos += 1;
		Some(c)
	}

	fn starts_with(&self, s: &str) -> bool {
		s.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c))
	}

	fn lex_normal(&mut self) -> TokenKind {
		let Some(c) = self.bump() else {
			return TokenKind::Eof;
		};
		match c {
			c if c.is_whitespace() => {
				while self.peek(0).is_some_and(char::is_whitespace) {
					self.pos += 1;
				}
				TokenKind::Whitespace
			}
			'/' if self.peek(0) == Some('/') => {
				while self.peek(0).is_some_and(|c| c != '\n' && c != '\r') {
					self.pos += 1;
				}
				TokenKind::LineComment
			}
			'/' if self.peek(0) == Some('*') => {
				self.pos += 1;
				// `/**/` is an empty block comment, not a doc comment.
				let doc = self.peek(0) == Some('*') && self.peek(1) != Some('/');
				if doc {
					self.pos += 1;
				}
				self.block_comment_body(doc)
			}
			'"' if self.starts_with("\"\"") => {
				self.pos += 2;
				self.text_block_body()
			}
			'"' => self.quoted('"', TokenKind::Str),
			'\'' => self.quoted('\'', TokenKind::Char),
			'@' if self.peek(0).is_some_and(is_ident_start) => {
				self.eat_ident();
				TokenKind::Annotation
			}
			c if is_ident_start(c) => {
				let start = self.pos - 1;
				self.eat_ident();
				let ident: String = self.text.slice(start..self.pos).chars().collect();
				if let Some(kw) = Keyword::from_ident(&ident) {
					TokenKind::Keyword(kw)
				} else if is_primitive(&ident) {
					TokenKind::Primitive
				} else {
					TokenKind::Ident
				}
			}
			c if c.is_ascii_digit() => self.number(c),
			'.' if self.peek(0).is_some_and(|c| c.is_ascii_digit()) => self.number('.'),
			'{' => TokenKind::LBrace,
			'}' => TokenKind::RBrace,
			'(' => TokenKind::LParen,
			')' => TokenKind::RParen,
			'[' => TokenKind::LBracket,
			']' => TokenKind::RBracket,
			';' => TokenKind::Semi,
			',' => TokenKind::Comma,
			'?' => TokenKind::Question,
			_ => {
				self.pos -= 1;
				self.operator()
			}
		}
	}

	fn operator(&mut self) -> TokenKind {
		for op in OPERATORS {
			if self.starts_with(op) {
				self.pos += op.len();
				return match *op {
					"->" => TokenKind::Arrow,
					_ => TokenKind::Operator,
				};
			}
		}
		let Some(c) = self.bump() else {
			return TokenKind::Eof;
		};
		match c {
			'.' => TokenKind::Dot,
			':' => TokenKind::Colon,
			'+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '~' | '&' | '|' | '^' => TokenKind::Operator,
			_ => TokenKind::Invalid,
		}
	}

	fn eat_ident(&mut self) {
		while self.peek(0).is_some_and(is_ident_part) {
			self.pos += 1;
		}
	}

	fn number(&mut self, first: char) -> TokenKind {
		let hex = first == '0' && matches!(self.peek(0), Some('x' | 'X'));
		let mut prev = first;
		while let Some(c) = self.peek(0) {
			let exponent_sign = (c == '+' || c == '-') && !hex && matches!(prev, 'e' | 'E');
			let fraction = c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit() || !is_ident_start(n));
			if c.is_ascii_alphanumeric() || c == '_' || exponent_sign || fraction {
				self.pos += 1;
				prev = c;
			} else {
				break;
			}
		}
		TokenKind::Number
	}

	/// String or char literal; stops at the closing quote or the end of the line.
	fn quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
		while let Some(c) = self.peek(0) {
			match c {
				'\n' | '\r' => break,
				'\\' => {
					self.pos += 1;
					if self.peek(0).is_some_and(|c| c != '\n' && c != '\r') {
						self.pos += 1;
					}
				}
				c => {
					self.pos += 1;
					if c == quote {
						break;
					}
				}
			}
		}
		kind
	}

	fn block_comment_body(&mut self, doc: bool) -> TokenKind {
		self.state = LexState::BlockComment { doc };
		while self.pos < self.end {
			if self.starts_with("*/") {
				self.pos += 2;
				self.state = LexState::Normal;
				break;
			}
			self.pos += 1;
		}
		if doc { TokenKind::DocComment } else { TokenKind::BlockComment }
	}

	fn text_block_body(&mut self) -> TokenKind {
		self.state = LexState::TextBlock;
		while let Some(c) = self.peek(0) {
			if c == '\\' {
				self.pos += 1;
				if self.peek(0).is_some() {
					self.pos += 1;
				}
				continue;
			}
			if self.starts_with("\"\"\"") {
				self.pos += 3;
				self.state = LexState::Normal;
				break;
			}
			self.pos += 1;
		}
		TokenKind::TextBlock
	}
}

impl Iterator for Lexer<'_> {
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		let token = self.next_token();
		(token.kind != TokenKind::Eof).then_some(token)
	}
}

fn is_ident_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}
