use std::ops::RangeInclusive;

use bramble_primitives::{CharIdx, Document, LineIdx};
use unicode_width::UnicodeWidthChar;

/// Horizontal pixel coordinate.
pub type Px = u32;

/// Where text lands on screen.
///
/// Positions are only known for laid-out lines; asking about anything else
/// returns `None`, and callers fall back to cached or estimated values.
pub trait TextLayout {
	/// Left edge of the character at `pos`, if its line is laid out.
	fn left_edge(&self, doc: &Document, pos: CharIdx) -> Option<Px>;

	fn is_line_visible(&self, line: LineIdx) -> bool;

	/// Width available to text, used as the right bound of the outermost scope.
	fn text_width(&self) -> Px;
}

/// Fixed-pitch layout for headless use.
///
/// Every character takes `char_width` pixels per terminal column, tabs
/// advance to the next multiple of `tab_width` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonospaceLayout {
	pub char_width: Px,
	pub tab_width: usize,
	pub left_margin: Px,
	pub text_width: Px,
	visible: RangeInclusive<LineIdx>,
}

impl Default for MonospaceLayout {
	fn default() -> Self {
		Self {
			char_width: 8,
			tab_width: 4,
			left_margin: 0,
			text_width: 800,
			visible: 0..=LineIdx::MAX,
		}
	}
}

impl MonospaceLayout {
	pub fn new(char_width: Px, text_width: Px) -> Self {
		Self {
			char_width,
			text_width,
			..Self::default()
		}
	}

	pub fn with_tab_width(mut self, tab_width: usize) -> Self {
		self.tab_width = tab_width.max(1);
		self
	}

	/// Restricts position queries to `lines`, as a scrolled viewport would.
	pub fn with_visible(mut self, lines: RangeInclusive<LineIdx>) -> Self {
		self.visible = lines;
		self
	}

	pub fn set_visible(&mut self, lines: RangeInclusive<LineIdx>) {
		self.visible = lines;
	}

	pub fn visible(&self) -> &RangeInclusive<LineIdx> {
		&self.visible
	}

	/// Display column of `pos` within its line.
	pub fn column(&self, doc: &Document, pos: CharIdx) -> usize {
		let start = doc.line_start(doc.line_of(pos));
		doc.chars_at(start).take(pos.saturating_sub(start)).fold(0, |col, ch| match ch {
			'\t' => col + self.tab_width - col % self.tab_width,
			ch => col + ch.width().unwrap_or(0),
		})
	}
}

impl TextLayout for MonospaceLayout {
	fn left_edge(&self, doc: &Document, pos: CharIdx) -> Option<Px> {
		if pos > doc.len_chars() || !self.is_line_visible(doc.line_of(pos)) {
			return None;
		}
		let col = Px::try_from(self.column(doc, pos)).ok()?;
		Some(self.left_margin + col * self.char_width)
	}

	fn is_line_visible(&self, line: LineIdx) -> bool {
		self.visible.contains(&line)
	}

	fn text_width(&self) -> Px {
		self.text_width
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_monospace_columns_expand_tabs_and_wide_chars() {
		let doc = Document::from("\tx\n  \u{4e2d}y\n");
		let layout = MonospaceLayout::new(10, 500).with_tab_width(4);
		assert_eq!(layout.left_edge(&doc, 1), Some(40));
		assert_eq!(layout.left_edge(&doc, 5), Some(20));
		assert_eq!(layout.left_edge(&doc, 6), Some(40));
	}

	#[test]
	fn test_monospace_hides_lines_outside_viewport() {
		let doc = Document::from("a\nb\nc\n");
		let mut layout = MonospaceLayout::new(8, 100).with_visible(1..=1);
		assert_eq!(layout.left_edge(&doc, 0), None);
		assert_eq!(layout.left_edge(&doc, 2), Some(0));
		assert!(!layout.is_line_visible(2));
		layout.set_visible(0..=2);
		assert_eq!(layout.left_edge(&doc, 4), Some(0));
	}
}
