//! Plain-text dumps of what the editor layers compute for a file.

use std::io::{self, Write};

use bramble_editor::EditorSession;

/// One node per line, indented by depth: `Kind start..end`, `?` marking incomplete nodes.
pub fn write_tree(session: &EditorSession, out: &mut impl Write) -> io::Result<()> {
	for node in session.tree().structure() {
		let open = if node.complete { "" } else { " ?" };
		writeln!(out, "{:indent$}{:?} {}..{}{open}", "", node.kind, node.start, node.end, indent = node.depth * 2)?;
	}
	Ok(())
}

/// Boxes of each line, outermost first: `line: Kind[left-right]`.
pub fn write_scopes(session: &mut EditorSession, out: &mut impl Write) -> io::Result<()> {
	let lines = session.document().line_count();
	session.rendered_lines(0, lines.saturating_sub(1));
	for line in 0..lines {
		let boxes = session.scopes(line);
		if boxes.is_empty() {
			continue;
		}
		write!(out, "{}:", line + 1)?;
		for b in boxes {
			let kind = session.tree().kind(b.source);
			let start = if b.starts { "^" } else { "" };
			let end = if b.ends { "$" } else { "" };
			match kind {
				Some(kind) => write!(out, " {start}{kind:?}[{}-{}]{end}", b.left, b.right)?,
				None => write!(out, " {start}?[{}-{}]{end}", b.left, b.right)?,
			}
		}
		writeln!(out)?;
	}
	Ok(())
}

/// Segments of each line as `<class>text</>`, default text left bare.
pub fn write_highlight(session: &mut EditorSession, out: &mut impl Write) -> io::Result<()> {
	for line in 0..session.document().line_count() {
		for seg in session.styled_line(line) {
			match seg.style.class_name() {
				"token-default" => write!(out, "{}", seg.text)?,
				class => write!(out, "<{class}>{}</>", seg.text)?,
			}
		}
		writeln!(out)?;
	}
	Ok(())
}
