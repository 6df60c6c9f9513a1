use bramble_primitives::{CharLen, EditLog, Rope};
use pretty_assertions::assert_eq;

use super::*;
use crate::node::TypeDefKind;

fn shape(tree: &NodeTree) -> Vec<(usize, NodeKind)> {
	tree.structure().into_iter().map(|n| (n.depth, n.kind)).collect()
}

fn named(tree: &NodeTree, kind: NodeKind, name: &str) -> NodePos {
	let mut stack = vec![tree.root_pos()];
	while let Some(pos) = stack.pop() {
		let node = tree.node(pos.id);
		if node.kind == kind && node.name() == Some(name) {
			return pos;
		}
		stack.extend(tree.children_of(pos));
	}
	panic!("no {} named {name}", kind.label());
}

const CLASS: &str = "package a;\nimport b.C;\n\nclass A {\n\tint x = 1;\n\tvoid f() {\n\t\tfor (int i = 0; i < 3; i++) g();\n\t}\n}\n";

#[test]
fn test_fresh_parse_of_class() {
	let text = Rope::from_str(CLASS);
	let tree = parse_document(text.slice(..));
	assert_eq!(
		shape(&tree),
		vec![
			(0, NodeKind::Statement),
			(0, NodeKind::Statement),
			(0, NodeKind::TypeDef(TypeDefKind::Class)),
			(1, NodeKind::TypeBody),
			(2, NodeKind::Field),
			(2, NodeKind::MethodDef),
			(3, NodeKind::MethodBody),
			(4, NodeKind::Iteration),
			(5, NodeKind::Statement),
		]
	);
	assert!(tree.structure().iter().all(|n| n.complete));
	assert_eq!(tree.check_invariants(text.len_chars()), Ok(()));

	let class = named(&tree, NodeKind::TypeDef(TypeDefKind::Class), "A");
	assert_eq!(class.start, CLASS.find("class").unwrap());
	assert_eq!(class.end, CLASS.len() - 1);
	named(&tree, NodeKind::Field, "x");
	named(&tree, NodeKind::MethodDef, "f");

	let for_loop = tree.structure().into_iter().find(|n| n.kind == NodeKind::Iteration).unwrap();
	assert_eq!(for_loop.start, CLASS.find("for").unwrap());
	assert_eq!(for_loop.end, CLASS.find("g();").unwrap() + 4);
}

#[test]
fn test_unclosed_braces_extend_to_document_end() {
	let src = "class A {\n\tvoid f() {\n\t\tx = 1;\n";
	let text = Rope::from_str(src);
	let tree = parse_document(text.slice(..));
	let nodes = tree.structure();
	assert_eq!(
		nodes.iter().map(|n| (n.kind, n.end, n.complete)).collect::<Vec<_>>(),
		vec![
			(NodeKind::TypeDef(TypeDefKind::Class), src.len(), false),
			(NodeKind::TypeBody, src.len(), false),
			(NodeKind::MethodDef, src.len(), false),
			(NodeKind::MethodBody, src.len(), false),
			(NodeKind::Statement, src.find(';').unwrap() + 1, true),
		]
	);
	assert_eq!(tree.check_invariants(src.len()), Ok(()));
}

const STATEMENTS: &str = "class A {
	Runnable r = new Runnable() {
		public void run() {}
	};
	void f() {
		if (a) {
			b();
		} else c();
		switch (x) {
			case 1:
				break;
			default:
		}
		try {
		} catch (E e) {
		} finally {
		}
		do x++; while (x < 3);
		list.forEach(v -> {
			use(v);
		});
	}
}
";

#[test]
fn test_statement_forms() {
	let text = Rope::from_str(STATEMENTS);
	let tree = parse_document(text.slice(..));
	assert_eq!(
		shape(&tree),
		vec![
			(0, NodeKind::TypeDef(TypeDefKind::Class)),
			(1, NodeKind::TypeBody),
			(2, NodeKind::Field),
			(3, NodeKind::Block),
			(4, NodeKind::TypeBody),
			(5, NodeKind::MethodDef),
			(6, NodeKind::MethodBody),
			(2, NodeKind::MethodDef),
			(3, NodeKind::MethodBody),
			(4, NodeKind::Selection),
			(5, NodeKind::BlockBody),
			(6, NodeKind::Statement),
			(4, NodeKind::Selection),
			(5, NodeKind::Statement),
			(4, NodeKind::Selection),
			(5, NodeKind::BlockBody),
			(6, NodeKind::Statement),
			(6, NodeKind::Statement),
			(6, NodeKind::Statement),
			(4, NodeKind::Block),
			(5, NodeKind::BlockBody),
			(4, NodeKind::Block),
			(5, NodeKind::BlockBody),
			(4, NodeKind::Block),
			(5, NodeKind::BlockBody),
			(4, NodeKind::Iteration),
			(5, NodeKind::Statement),
			(4, NodeKind::Statement),
			(5, NodeKind::Block),
			(6, NodeKind::BlockBody),
			(7, NodeKind::Statement),
		]
	);
	assert!(tree.structure().iter().all(|n| n.complete));
	named(&tree, NodeKind::Field, "r");
	named(&tree, NodeKind::MethodDef, "run");

	let do_loop = tree.structure().into_iter().find(|n| n.kind == NodeKind::Iteration).unwrap();
	assert_eq!(do_loop.start, STATEMENTS.find("do x++").unwrap());
	assert_eq!(do_loop.end, STATEMENTS.find("(x < 3);").unwrap() + 8);
}

#[test]
fn test_type_declaration_forms() {
	let src = "@interface Marker {\n\tint value() default 1;\n}\nenum Color { RED, GREEN; void f() {} }\nrecord Point(int x, int y) implements Shape {\n}\n";
	let text = Rope::from_str(src);
	let tree = parse_document(text.slice(..));
	assert_eq!(
		shape(&tree),
		vec![
			(0, NodeKind::TypeDef(TypeDefKind::Annotation)),
			(1, NodeKind::TypeBody),
			(2, NodeKind::MethodDef),
			(0, NodeKind::TypeDef(TypeDefKind::Enum)),
			(1, NodeKind::TypeBody),
			(2, NodeKind::Field),
			(2, NodeKind::MethodDef),
			(3, NodeKind::MethodBody),
			(0, NodeKind::TypeDef(TypeDefKind::Record)),
			(1, NodeKind::TypeBody),
		]
	);
	named(&tree, NodeKind::TypeDef(TypeDefKind::Annotation), "Marker");
	named(&tree, NodeKind::TypeDef(TypeDefKind::Enum), "Color");
	named(&tree, NodeKind::TypeDef(TypeDefKind::Record), "Point");
	named(&tree, NodeKind::MethodDef, "value");
}

#[test]
fn test_comments_are_nodes_only_between_items() {
	let src = "/** doc */\nclass A {\n\t// note\n\tint /* inline */ x;\n}\n/* open";
	let text = Rope::from_str(src);
	let tree = parse_document(text.slice(..));
	let nodes = tree.structure();
	assert_eq!(
		nodes.iter().map(|n| (n.depth, n.kind, n.complete)).collect::<Vec<_>>(),
		vec![
			(0, NodeKind::Comment(crate::CommentKind::Doc), true),
			(0, NodeKind::TypeDef(TypeDefKind::Class), true),
			(1, NodeKind::TypeBody, true),
			(2, NodeKind::Comment(crate::CommentKind::Line), true),
			(2, NodeKind::Field, true),
			(0, NodeKind::Comment(crate::CommentKind::Block), false),
		]
	);
	assert_eq!(nodes.last().map(|n| n.end), Some(src.len()));
}

#[test]
fn test_inconsistent_state_recovers_with_placeholder() {
	let text = Rope::from_str(CLASS);
	let len = text.len_chars();
	let mut tree = parse_document(text.slice(..));
	let class = named(&tree, NodeKind::TypeDef(TypeDefKind::Class), "A");
	tree.node_mut(class.id).state = ParseState::Header;

	let mut queue = ReparseQueue::new();
	let pos = CLASS.find("x = 1").unwrap();
	queue.schedule(pos, 1);
	let outcome = reparse(&mut tree, text.slice(..), &mut queue, pos, CharLen::MAX, &EditLog::new());
	assert!(outcome.recovered);
	assert!(!tree.contains(class.id));
	assert!(tree.structure().iter().any(|n| n.kind == NodeKind::Placeholder && !n.complete));
	assert_eq!(tree.check_invariants(len), Ok(()));
	assert_eq!(queue.first().map(|r| r.start), Some(class.start));

	while let Some(record) = queue.first() {
		reparse(&mut tree, text.slice(..), &mut queue, record.start, CharLen::MAX, &EditLog::new());
	}
	assert_eq!(tree.structure(), parse_document(text.slice(..)).structure());
}

#[test]
fn test_budget_stop_requeues_remainder() {
	let mut src = String::from("class Big {\n");
	for i in 0..20 {
		src.push_str(&format!("\tvoid m{i}() {{\n\t\tcall({i});\n\t}}\n"));
	}
	src.push_str("}\n");
	let text = Rope::from_str(&src);
	let len = text.len_chars();

	let mut tree = NodeTree::new(len);
	let mut queue = ReparseQueue::new();
	queue.schedule(0, len);
	let log = EditLog::new();

	let first = reparse(&mut tree, text.slice(..), &mut queue, 0, 20, &log);
	assert!(first.budget_stop);
	assert!(first.end > 0 && first.end < len);
	assert_eq!(queue.first().map(|r| r.start), Some(first.end));
	assert_eq!(tree.check_invariants(len), Ok(()));

	let mut passes = 1;
	while let Some(record) = queue.first() {
		let outcome = reparse(&mut tree, text.slice(..), &mut queue, record.start, 20, &log);
		assert!(!outcome.recovered);
		assert_eq!(tree.check_invariants(len), Ok(()));
		passes += 1;
		assert!(passes < 200, "reparse made no progress");
	}
	assert!(passes > 2);
	assert_eq!(tree.structure(), parse_document(text.slice(..)).structure());
}

#[test]
fn test_shape_transitions() {
	assert_eq!(Shape::Loop.after_braceless(true), Transition::EndsNode);
	assert_eq!(Shape::Do.after_braceless(true), Transition::EndsState);
	assert_eq!(Shape::Do.after_braceless(false), Transition::Incomplete);
	assert_eq!(Shape::Method.body_kind(), NodeKind::MethodBody);
	assert!(!Shape::Braced.braceless());
}
