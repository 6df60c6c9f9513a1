use bramble_lexer::TokenStyle;
use bramble_syntax::{NodeKind, TypeDefKind, parse_document};
use pretty_assertions::assert_eq;

use super::*;

const METHOD: &str = "class A {\n    void f() {\n        x();\n    }\n}\n";

const CLASS: NodeKind = NodeKind::TypeDef(TypeDefKind::Class);

fn kinds(session: &EditorSession, line: LineIdx) -> Vec<NodeKind> {
	session.scopes(line).iter().filter_map(|b| session.tree().kind(b.source)).collect()
}

fn assert_fresh(session: &EditorSession) {
	let doc = session.document();
	assert_eq!(session.tree().structure(), parse_document(doc.text()).structure());
}

#[test]
fn test_open_parses_in_slices() {
	let mut config = BrambleConfig::default();
	config.scheduler.slice_ms = 0;
	let mut session = EditorSession::open(METHOD, &config);
	assert!(!session.is_parsed());
	assert!(session.scopes(0).is_empty());

	let first = session.run_reparse_slice();
	assert_eq!(first.steps, 1);
	while !session.run_reparse_slice().idle {}
	assert!(session.is_parsed());
	assert_fresh(&session);
	assert_eq!(kinds(&session, 0), [CLASS]);
	assert_eq!(kinds(&session, 2), [CLASS, NodeKind::TypeBody, NodeKind::MethodDef, NodeKind::MethodBody]);
}

#[test]
fn test_edit_boxes_appear_after_reparse() {
	let mut session = EditorSession::open(METHOD, &BrambleConfig::default());
	session.settle();
	assert!(!session.scope_view().has_pending());

	let end_of_call = session.document().line_start(2) + "        x();".len();
	session.insert(end_of_call, "\n        y();").unwrap();
	assert_eq!(session.document().line_count(), 7);
	assert!(session.scope_view().has_pending());

	session.settle();
	assert!(!session.scope_view().has_pending());
	assert_fresh(&session);
	assert_eq!(kinds(&session, 3), kinds(&session, 2));
	assert_eq!(kinds(&session, 5), [CLASS]);
}

#[test]
fn test_removal_keeps_tree_in_step() {
	let mut session = EditorSession::open(METHOD, &BrambleConfig::default());
	session.settle();
	let body = session.document().line_start(2);
	session.remove(body, "        x();\n".len()).unwrap();
	session.settle();
	assert_fresh(&session);
	assert_eq!(session.document().line_count(), 5);
	assert_eq!(kinds(&session, 0), [CLASS]);
	assert!(kinds(&session, 1).contains(&NodeKind::MethodDef));
}

#[test]
fn test_styled_lines_follow_edits() {
	let mut session = EditorSession::open("int a;\nint b;\n", &BrambleConfig::default());
	assert_eq!(session.styled_line(1)[0].style, TokenStyle::Primitive);

	session.insert(0, "/* ").unwrap();
	assert_eq!(session.styled_line(1)[0].style, TokenStyle::Comment);
	assert!(session.insert(100, "x").is_err());
}

#[test]
fn test_zero_strength_fades_boxes_to_background() {
	let mut session = EditorSession::open(METHOD, &BrambleConfig::default());
	session.settle();
	let before: Vec<_> = session.scopes(2).iter().map(|b| (b.left, b.right)).collect();
	session.set_palette(ScopePalette::default(), 0);
	let after: Vec<_> = session.scopes(2).iter().map(|b| (b.left, b.right)).collect();
	assert_eq!(before, after);
	let background = ScopePalette::default().reduced(0);
	assert!(session.scopes(2).iter().all(|b| b.fill == background.background));
}
