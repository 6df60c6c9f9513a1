use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn test_insert_reports_lines_added() {
	let mut doc = Document::from("class A {}\n");
	let edit = doc.insert(9, "\n\tint x;\n").unwrap();
	assert_eq!(edit.kind, EditKind::Insert);
	assert_eq!(edit.offset, 9);
	assert_eq!(edit.length, 9);
	assert_eq!(edit.start_line, 0);
	assert_eq!(edit.lines_added, 2);
	assert_eq!(edit.end(), 18);
	assert_eq!(doc.to_string(), "class A {\n\tint x;\n}\n");
}

#[test]
fn test_remove_reports_removed_text() {
	let mut doc = Document::from("a\nb\nc");
	let edit = doc.remove(1, 2).unwrap();
	assert_eq!(edit.text, "\nb");
	assert_eq!(edit.lines_removed, 1);
	assert_eq!(edit.end(), 1);
	assert_eq!(doc.to_string(), "a\nc");
}

#[test]
fn test_out_of_bounds_edits_are_rejected() {
	let mut doc = Document::from("abc");
	assert_eq!(
		doc.insert(4, "x"),
		Err(EditError::OutOfBounds { pos: 4, end: 4, doc_len: 3 })
	);
	assert!(doc.remove(2, 2).is_err());
	assert!(doc.read(1, 3).is_err());
	assert_eq!(doc.to_string(), "abc");
}

#[test]
fn test_line_addressing() {
	let doc = Document::from("ab\ncde\n\nf");
	assert_eq!(doc.line_count(), 4);
	assert_eq!(doc.line_start(1), 3);
	assert_eq!(doc.line_end(1), 7);
	assert_eq!(doc.line_content_end(1), 6);
	assert_eq!(doc.line_of(5), 1);
	assert_eq!(doc.column_of(5), 2);
	assert_eq!(doc.line_text(1), "cde");
	assert_eq!(doc.line_text(2), "");
	assert_eq!(doc.line_start(10), doc.len_chars());
}

#[test]
fn test_read_range_and_chars() {
	let doc = Document::from("public void m()");
	assert_eq!(doc.read(7, 4).unwrap(), "void");
	assert_eq!(doc.chars_at(12).collect::<String>(), "m()");
	assert_eq!(doc.char_at(0), Some('p'));
	assert_eq!(doc.char_at(99), None);
}

#[test]
fn test_multibyte_positions_are_characters() {
	let mut doc = Document::from("// héllo\nx");
	assert_eq!(doc.len_chars(), 10);
	let edit = doc.insert(8, "!").unwrap();
	assert_eq!(edit.length, 1);
	assert_eq!(doc.line_text(0), "// héllo!");
}

#[derive(Debug, Clone)]
enum Op {
	Insert(usize, String),
	Remove(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(any::<usize>(), "[a-z{}\n ]{0,6}").prop_map(|(at, text)| Op::Insert(at, text)),
		(any::<usize>(), 0usize..8).prop_map(|(at, len)| Op::Remove(at, len)),
	]
}

proptest! {
	#[test]
	fn test_edits_track_a_plain_string(ops in proptest::collection::vec(op(), 1..24)) {
		let mut doc = Document::from("class A {\n}\n");
		let mut mirror: Vec<char> = doc.to_string().chars().collect();
		for op in ops {
			let edit = match op {
				Op::Insert(at, text) => {
					let at = at % (mirror.len() + 1);
					mirror.splice(at..at, text.chars());
					doc.insert(at, &text).unwrap()
				}
				Op::Remove(at, len) => {
					let at = at % (mirror.len() + 1);
					let len = len.min(mirror.len() - at);
					mirror.drain(at..at + len);
					doc.remove(at, len).unwrap()
				}
			};
			let newlines = edit.text.matches('\n').count();
			prop_assert_eq!(edit.lines_added + edit.lines_removed, newlines);
			prop_assert_eq!(doc.to_string(), mirror.iter().collect::<String>());
			prop_assert_eq!(doc.line_count(), mirror.iter().filter(|c| **c == '\n').count() + 1);
		}
	}
}
