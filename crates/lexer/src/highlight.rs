use std::iter;

use bramble_primitives::{DocEdit, LineIdx, trim_line_ending};
use ropey::RopeSlice;

use crate::lexer::LexState;
use crate::lines::{LineStates, lex_line};
use crate::token::TokenStyle;

/// A run of text rendered with one style class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSegment {
	pub style: TokenStyle,
	pub text: String,
}

#[derive(Debug, Clone)]
struct CachedLine {
	start_state: LexState,
	segments: Vec<StyledSegment>,
}

/// Per-line styled segments with a cache keyed by line.
///
/// A cached line is reused only while its start state and its text still
/// match the document, so stale entries can never leak out.
#[derive(Debug, Default)]
pub struct LineStyler {
	states: LineStates,
	cache: Vec<Option<CachedLine>>,
}

impl LineStyler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Segments for `line`, terminator excluded. A blank line yields one empty segment.
	pub fn styled_line(&mut self, text: RopeSlice<'_>, line: LineIdx) -> &[StyledSegment] {
		if line >= text.len_lines() {
			return &[];
		}
		let state = self.states.state_at(text, line);
		let content = trim_line_ending(text.line(line));
		if self.cache.len() <= line {
			self.cache.resize_with(line + 1, || None);
		}
		let fresh = self.cache[line]
			.as_ref()
			.is_some_and(|cached| cached.start_state == state && same_text(&cached.segments, content));
		if !fresh {
			self.cache[line] = Some(CachedLine {
				start_state: state,
				segments: style_line(text, line, state),
			});
		}
		self.cache[line].as_ref().map(|c| c.segments.as_slice()).unwrap_or(&[])
	}

	/// Adjusts the cache for a document edit.
	pub fn edited(&mut self, edit: &DocEdit) {
		let line = edit.start_line;
		self.states.invalidate_from(line);
		if line >= self.cache.len() {
			return;
		}
		self.cache[line] = None;
		let removed_end = (line + 1 + edit.lines_removed).min(self.cache.len());
		self.cache
			.splice(line + 1..removed_end, iter::repeat_n(None, edit.lines_added));
	}

	/// Drops cached segments for `first..=last`.
	pub fn restyle_lines(&mut self, first: LineIdx, last: LineIdx) {
		for entry in self.cache.iter_mut().take(last + 1).skip(first) {
			*entry = None;
		}
	}

	pub fn clear(&mut self) {
		self.cache.clear();
		self.states = LineStates::new();
	}
}

fn same_text(segments: &[StyledSegment], content: RopeSlice<'_>) -> bool {
	let cached_len: usize = segments.iter().map(|s| s.text.chars().count()).sum();
	cached_len == content.len_chars() && segments.iter().flat_map(|s| s.text.chars()).eq(content.chars())
}

fn style_line(text: RopeSlice<'_>, line: LineIdx, state: LexState) -> Vec<StyledSegment> {
	let line_start = text.line_to_char(line);
	let content_end = line_start + trim_line_ending(text.line(line)).len_chars();
	let (tokens, _) = lex_line(text, line, state);
	let mut segments: Vec<StyledSegment> = Vec::new();
	for token in tokens {
		let end = token.end().min(content_end);
		if token.start >= end {
			continue;
		}
		let style = token.kind.style();
		let piece = text.slice(token.start..end);
		match segments.last_mut() {
			Some(last) if last.style == style => last.text.extend(piece.chars()),
			_ => segments.push(StyledSegment {
				style,
				text: piece.to_string(),
			}),
		}
	}
	if segments.is_empty() {
		segments.push(StyledSegment {
			style: TokenStyle::Default,
			text: String::new(),
		});
	}
	segments
}
