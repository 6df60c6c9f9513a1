use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ropey::Rope;

use super::*;

fn kinds(src: &str) -> Vec<(TokenKind, String)> {
	let rope = Rope::from(src);
	let text = rope.slice(..);
	Lexer::new(text)
		.filter(|t| t.kind != TokenKind::Whitespace)
		.map(|t| (t.kind, text.slice(t.start..t.end()).to_string()))
		.collect()
}

#[test]
fn test_method_header() {
	assert_eq!(
		kinds("public int m(String s) {"),
		vec![
			(TokenKind::Keyword(Keyword::Public), "public".into()),
			(TokenKind::Primitive, "int".into()),
			(TokenKind::Ident, "m".into()),
			(TokenKind::LParen, "(".into()),
			(TokenKind::Ident, "String".into()),
			(TokenKind::Ident, "s".into()),
			(TokenKind::RParen, ")".into()),
			(TokenKind::LBrace, "{".into()),
		]
	);
}

#[test]
fn test_operators_are_greedy() {
	let got: Vec<String> = kinds("a >>>= b -> c :: d ... e").into_iter().map(|(_, s)| s).collect();
	assert_eq!(got, vec!["a", ">>>=", "b", "->", "c", "::", "d", "...", "e"]);
	assert_eq!(kinds("x->y")[1].0, TokenKind::Arrow);
}

#[test]
fn test_literals() {
	assert_eq!(
		kinds(r#"1.5e-3 0x1F "a\"b" 'c' true @Override"#),
		vec![
			(TokenKind::Number, "1.5e-3".into()),
			(TokenKind::Number, "0x1F".into()),
			(TokenKind::Str, r#""a\"b""#.into()),
			(TokenKind::Char, "'c'".into()),
			(TokenKind::Keyword(Keyword::True), "true".into()),
			(TokenKind::Annotation, "@Override".into()),
		]
	);
}

#[test]
fn test_unterminated_string_stops_at_line_end() {
	assert_eq!(
		kinds("\"abc\nx"),
		vec![(TokenKind::Str, "\"abc".into()), (TokenKind::Ident, "x".into())]
	);
}

#[test]
fn test_invalid_characters() {
	assert_eq!(kinds("a # b")[1], (TokenKind::Invalid, "#".into()));
	assert_eq!(kinds("`")[0].0, TokenKind::Invalid);
}

#[test]
fn test_block_comment_state_is_resumable() {
	let rope = Rope::from("x /** doc\nmore */ y");
	let text = rope.slice(..);
	let mut lexer = Lexer::resume(text, 0, 10, LexState::Normal);
	lexer.next_significant();
	let first = lexer.next_significant();
	assert_eq!(first.kind, TokenKind::DocComment);
	assert_eq!(lexer.state(), LexState::BlockComment { doc: true });

	let mut rest = Lexer::resume(text, lexer.pos(), text.len_chars(), lexer.state());
	let tail = rest.next_token();
	assert_eq!(tail.kind, TokenKind::DocComment);
	assert_eq!(text.slice(tail.start..tail.end()).to_string(), "more */");
	assert_eq!(rest.state(), LexState::Normal);
	assert_eq!(rest.next_significant().kind, TokenKind::Ident);
}

#[test]
fn test_empty_block_comment_is_not_doc() {
	assert_eq!(kinds("/**/ a")[0], (TokenKind::BlockComment, "/**/".into()));
}

#[test]
fn test_text_block_spans_lines() {
	let rope = Rope::from("s = \"\"\"\n  hi \"\n\"\"\";");
	let tokens: Vec<Token> = Lexer::new(rope.slice(..)).collect();
	let block = tokens.iter().find(|t| t.kind == TokenKind::TextBlock).unwrap();
	assert_eq!(block.len, 14);
	assert_eq!(tokens.last().unwrap().kind, TokenKind::Semi);
}

#[test]
fn test_eof_is_sticky() {
	let rope = Rope::from("a");
	let mut lexer = Lexer::new(rope.slice(..));
	assert_eq!(lexer.next_token().kind, TokenKind::Ident);
	assert_eq!(lexer.next_token().kind, TokenKind::Eof);
	assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

proptest! {
	#[test]
	fn prop_tokens_tile_input(src in "[a-z0-9 \n{}();/*\"'.=+<>@#-]{0,80}") {
		let rope = Rope::from(src.as_str());
		let mut pos = 0;
		for token in Lexer::new(rope.slice(..)) {
			prop_assert_eq!(token.start, pos);
			prop_assert!(token.len > 0);
			pos = token.end();
		}
		prop_assert_eq!(pos, rope.len_chars());
	}

	#[test]
	fn prop_resume_at_any_token_boundary(src in "[a-z \n{}/*\"]{0,60}") {
		let rope = Rope::from(src.as_str());
		let text = rope.slice(..);
		let mut full = Lexer::new(text);
		let mut boundaries = vec![(0, LexState::Normal)];
		let mut tokens = Vec::new();
		loop {
			let token = full.next_token();
			if token.kind == TokenKind::Eof {
				break;
			}
			tokens.push(token);
			boundaries.push((token.end(), full.state()));
		}
		for (i, (pos, state)) in boundaries.iter().enumerate() {
			let resumed: Vec<Token> = Lexer::resume(text, *pos, text.len_chars(), *state).collect();
			prop_assert_eq!(&resumed[..], &tokens[i..]);
		}
	}
}
