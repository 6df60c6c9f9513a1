//! Rope utilities and extensions.

use ropey::RopeSlice;

use crate::range::{CharIdx, LineIdx};

/// Strips a trailing `\n` or `\r\n` from a line slice.
pub fn trim_line_ending(line: RopeSlice<'_>) -> RopeSlice<'_> {
	let len = line.len_chars();
	if len == 0 {
		return line;
	}
	if line.char(len - 1) == '\n' {
		if len >= 2 && line.char(len - 2) == '\r' {
			return line.slice(..len - 2);
		}
		return line.slice(..len - 1);
	}
	line
}

/// Returns the position just before the line terminator of `line`.
///
/// For the final line (which has no terminator) this is the end of the text.
pub fn line_content_end(text: RopeSlice<'_>, line: LineIdx) -> CharIdx {
	let start = text.line_to_char(line);
	start + trim_line_ending(text.line(line)).len_chars()
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn test_trim_line_ending_variants() {
		let text = Rope::from("a\r\nbc\nd");
		assert_eq!(trim_line_ending(text.line(0)).to_string(), "a");
		assert_eq!(trim_line_ending(text.line(1)).to_string(), "bc");
		assert_eq!(trim_line_ending(text.line(2)).to_string(), "d");
	}

	#[test]
	fn test_line_content_end() {
		let text = Rope::from("ab\ncd\n");
		assert_eq!(line_content_end(text.slice(..), 0), 2);
		assert_eq!(line_content_end(text.slice(..), 1), 5);
		assert_eq!(line_content_end(text.slice(..), 2), 6);
	}
}
