/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for bramble.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// A zero-based line number.
pub type LineIdx = usize;

/// A half-open character span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
	pub start: CharIdx,
	pub end: CharIdx,
}

impl Span {
	/// Creates a span from its bounds. `end` is clamped to be at least `start`.
	pub fn new(start: CharIdx, end: CharIdx) -> Self {
		Self { start, end: end.max(start) }
	}

	/// Creates a span from a start and a length.
	pub fn at(start: CharIdx, len: CharLen) -> Self {
		Self { start, end: start + len }
	}

	#[inline]
	pub fn len(&self) -> CharLen {
		self.end - self.start
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if `pos` lies in `[start, end)`.
	#[inline]
	pub fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.start && pos < self.end
	}

	/// Returns true if the closed ranges `[start, end]` of both spans meet.
	///
	/// Touching spans count as intersecting, and so do empty spans sitting on
	/// either boundary.
	#[inline]
	pub fn touches(&self, other: &Span) -> bool {
		self.start <= other.end && other.start <= self.end
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_span_touches_boundaries() {
		let span = Span::new(4, 8);
		assert!(span.touches(&Span::new(8, 8)));
		assert!(span.touches(&Span::new(0, 4)));
		assert!(!span.touches(&Span::new(9, 12)));
		assert!(!span.touches(&Span::new(0, 3)));
	}

	#[test]
	fn test_span_contains_is_half_open() {
		let span = Span::at(2, 3);
		assert!(span.contains(2));
		assert!(span.contains(4));
		assert!(!span.contains(5));
		assert_eq!(span.len(), 3);
	}
}
