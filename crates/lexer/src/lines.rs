use bramble_primitives::LineIdx;
use ropey::RopeSlice;

use crate::lexer::{LexState, Lexer};
use crate::token::{Token, TokenKind};

/// Lexer state at the start of each line, filled lazily from the top.
///
/// Entries past the first edited line are dropped on every edit and rebuilt
/// on demand, so a line can always be re-tokenized on its own.
#[derive(Debug, Clone)]
pub struct LineStates {
	starts: Vec<LexState>,
}

impl Default for LineStates {
	fn default() -> Self {
		Self {
			starts: vec![LexState::Normal],
		}
	}
}

impl LineStates {
	pub fn new() -> Self {
		Self::default()
	}

	/// Forgets the states of every line after `line`.
	pub fn invalidate_from(&mut self, line: LineIdx) {
		self.starts.truncate(line + 1);
	}

	pub fn state_at(&mut self, text: RopeSlice<'_>, line: LineIdx) -> LexState {
		let line = line.min(text.len_lines().saturating_sub(1));
		while self.starts.len() <= line {
			let prev = self.starts.len() - 1;
			let (_, end_state) = lex_line(text, prev, self.starts[prev]);
			self.starts.push(end_state);
		}
		self.starts[line]
	}

	/// Tokens of `line` (terminator included) and the state after it.
	///
	/// A construct carried over from the previous line yields a token that
	/// starts at the line start.
	pub fn tokenize_line(&mut self, text: RopeSlice<'_>, line: LineIdx) -> (Vec<Token>, LexState) {
		let state = self.state_at(text, line);
		lex_line(text, line, state)
	}
}

pub(crate) fn lex_line(text: RopeSlice<'_>, line: LineIdx, state: LexState) -> (Vec<Token>, LexState) {
	if line >= text.len_lines() {
		return (Vec::new(), state);
	}
	let start = text.line_to_char(line);
	let end = if line + 1 < text.len_lines() {
		text.line_to_char(line + 1)
	} else {
		text.len_chars()
	};
	let mut lexer = Lexer::resume(text, start, end, state);
	let mut tokens = Vec::new();
	loop {
		let token = lexer.next_token();
		if token.kind == TokenKind::Eof {
			break;
		}
		tokens.push(token);
	}
	(tokens, lexer.state())
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn test_states_follow_block_comments() {
		let rope = Rope::from("a /* b\nc\nd */ e\nf");
		let text = rope.slice(..);
		let mut states = LineStates::new();
		assert_eq!(states.state_at(text, 0), LexState::Normal);
		assert_eq!(states.state_at(text, 1), LexState::BlockComment { doc: false });
		assert_eq!(states.state_at(text, 2), LexState::BlockComment { doc: false });
		assert_eq!(states.state_at(text, 3), LexState::Normal);
	}

	#[test]
	fn test_tokenize_line_matches_full_lex() {
		let rope = Rope::from("int x; /* y\n z */ int w;\n");
		let text = rope.slice(..);
		let (start, end) = (text.line_to_char(1), text.len_chars());
		let mut states = LineStates::new();
		let (line1, after) = states.tokenize_line(text, 1);
		assert_eq!(after, LexState::Normal);
		let full: Vec<Token> = Lexer::new(text)
			.filter(|t| t.end() > start && t.start < end)
			.map(|t| {
				let clipped = t.start.max(start);
				Token {
					kind: t.kind,
					start: clipped,
					len: t.end().min(end) - clipped,
				}
			})
			.collect();
		assert_eq!(line1[0], Token { kind: TokenKind::BlockComment, start, len: 5 });
		assert_eq!(line1, full);
	}

	#[test]
	fn test_invalidate_rebuilds_after_edit() {
		let mut rope = Rope::from("/*\nx\n");
		let mut states = LineStates::new();
		assert_eq!(states.state_at(rope.slice(..), 2), LexState::BlockComment { doc: false });
		rope.insert(2, "*/");
		states.invalidate_from(0);
		assert_eq!(states.state_at(rope.slice(..), 2), LexState::Normal);
	}
}
