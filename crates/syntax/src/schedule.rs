use std::collections::BTreeMap;

use bramble_primitives::{CharIdx, CharLen};


/// A region of the document whose structure is out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparseRecord {
	pub start: CharIdx,
	pub size: CharLen,
}

impl ReparseRecord {
	#[inline]
	pub fn end(&self) -> CharIdx {
		self.start + self.size
	}
}

/// Ordered set of dirty regions.
///
/// Records never overlap or touch: scheduling a region that meets an existing
/// record widens that record instead. Zero-size records mark a position whose
/// surroundings changed, typically the site of a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReparseQueue {
	records: BTreeMap<CharIdx, CharLen>,
}

impl ReparseQueue {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.records.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn clear(&mut self) {
		self.records.clear();
	}

	/// Earliest pending record.
	pub fn first(&self) -> Option<ReparseRecord> {
		self.records.first_key_value().map(|(&start, &size)| ReparseRecord { start, size })
	}

	pub fn iter(&self) -> impl Iterator<Item = ReparseRecord> + '_ {
		self.records.iter().map(|(&start, &size)| ReparseRecord { start, size })
	}

	/// Queues `[pos, pos + min_size)`, merging with any record it meets.
	pub fn schedule(&mut self, pos: CharIdx, min_size: CharLen) {
		let mut start = pos;
		let mut end = pos + min_size;
		if let Some((&s, &size)) = self.records.range(..=pos).next_back()
			&& s + size >= pos
		{
			start = s;
			end = end.max(s + size);
			self.records.remove(&s);
		}
		while let Some((&s, &size)) = self.records.range(start..).next() {
			if s > end {
				break;
			}
			end = end.max(s + size);
			self.records.remove(&s);
		}
		self.records.insert(start, end - start);
	}

	/// True if any record meets the closed range `[start, end]`.
	pub fn touches(&self, start: CharIdx, end: CharIdx) -> bool {
		self.records
			.range(..=end)
			.next_back()
			.is_some_and(|(&s, &size)| s + size >= start)
	}

	/// Shifts records for `len` chars inserted at `offset`.
	///
	/// A record containing `offset` (ends included) grows; later records move.
	pub fn text_inserted(&mut self, offset: CharIdx, len: CharLen) {
		if len == 0 {
			return;
		}
		let old = std::mem::take(&mut self.records);
		for (start, size) in old {
			if start <= offset && offset <= start + size {
				self.records.insert(start, size + len);
			} else if start > offset {
				self.records.insert(start + len, size);
			} else {
				self.records.insert(start, size);
			}
		}
	}

	/// Maps records through the removal of `[offset, offset + len)`.
	///
	/// Records lying entirely inside the removed range are dropped.
	pub fn text_removed(&mut self, offset: CharIdx, len: CharLen) {
		if len == 0 {
			return;
		}
		let map = |x: CharIdx| {
			if x <= offset {
				x
			} else if x <= offset + len {
				offset
			} else {
				x - len
			}
		};
		let old = std::mem::take(&mut self.records);
		for (start, size) in old {
			let end = start + size;
			if start >= offset && end <= offset + len {
				continue;
			}
			let (s, e) = (map(start), map(end));
			self.schedule(s, e - s);
		}
	}

	/// Removes `[pos, pos + len)` from the queue, splitting records as needed.
	///
	/// Zero-size records inside the range are dropped as well; with `len == 0`
	/// only a zero-size record at `pos` goes. A point at `pos + len` is kept.
	pub fn mark_parsed(&mut self, pos: CharIdx, len: CharLen) {
		let end = pos + len;
		let mut hits = Vec::new();
		for (&s, &size) in self.records.range(..=end).rev() {
			if s + size < pos {
				break;
			}
			hits.push((s, size));
		}
		for (s, size) in hits {
			let e = s + size;
			if size == 0 {
				if s < end || s == pos {
					self.records.remove(&s);
				}
				continue;
			}
			if len == 0 || !(s < end && e > pos) {
				continue;
			}
			self.records.remove(&s);
			if s < pos {
				self.records.insert(s, pos - s);
			}
			if e > end {
				self.records.insert(end, e - end);
			}
		}
	}
}
