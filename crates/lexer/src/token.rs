use bramble_primitives::{CharIdx, CharLen, Span};

use crate::keyword::Keyword;

/// Closed set of token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// Spaces, tabs and line terminators.
	Whitespace,
	Ident,
	Keyword(Keyword),
	/// `int`, `boolean`, ...
	Primitive,
	Number,
	Str,
	Char,
	/// `"""` text block, possibly spanning lines.
	TextBlock,
	LineComment,
	BlockComment,
	/// `/** ... */`.
	DocComment,
	/// `@Name`, including `@interface`.
	Annotation,
	LBrace,
	RBrace,
	LParen,
	RParen,
	LBracket,
	RBracket,
	Semi,
	Comma,
	Dot,
	Colon,
	Question,
	Arrow,
	Operator,
	/// A character that cannot start any Java token.
	Invalid,
	Eof,
}

impl TokenKind {
	pub const fn is_comment(self) -> bool {
		matches!(self, Self::LineComment | Self::BlockComment | Self::DocComment)
	}

	/// Tokens the parser skips entirely.
	pub const fn is_trivia(self) -> bool {
		matches!(self, Self::Whitespace)
	}

	pub const fn style(self) -> TokenStyle {
		match self {
			Self::Whitespace | Self::Ident | Self::Eof => TokenStyle::Default,
			Self::Keyword(kw) if kw.is_literal() => TokenStyle::Literal,
			Self::Keyword(_) => TokenStyle::Keyword,
			Self::Primitive => TokenStyle::Primitive,
			Self::Number => TokenStyle::Literal,
			Self::Str | Self::Char | Self::TextBlock => TokenStyle::Str,
			Self::LineComment | Self::BlockComment => TokenStyle::Comment,
			Self::DocComment => TokenStyle::DocComment,
			Self::Annotation => TokenStyle::Annotation,
			Self::LBrace
			| Self::RBrace
			| Self::LParen
			| Self::RParen
			| Self::LBracket
			| Self::RBracket
			| Self::Semi
			| Self::Comma
			| Self::Dot
			| Self::Colon
			| Self::Question
			| Self::Arrow
			| Self::Operator => TokenStyle::Operator,
			Self::Invalid => TokenStyle::Invalid,
		}
	}
}

/// Style class handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStyle {
	Default,
	Keyword,
	Primitive,
	Literal,
	Str,
	Comment,
	DocComment,
	Annotation,
	Operator,
	Invalid,
}

impl TokenStyle {
	pub const fn class_name(self) -> &'static str {
		match self {
			Self::Default => "token-default",
			Self::Keyword => "token-keyword",
			Self::Primitive => "token-primitive",
			Self::Literal => "token-literal",
			Self::Str => "token-string",
			Self::Comment => "token-comment",
			Self::DocComment => "token-javadoc",
			Self::Annotation => "token-annotation",
			Self::Operator => "token-operator",
			Self::Invalid => "token-invalid",
		}
	}
}

/// A lexed token. Carries offsets only; text is read back from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
	pub kind: TokenKind,
	pub start: CharIdx,
	pub len: CharLen,
}

impl Token {
	#[inline]
	pub fn end(&self) -> CharIdx {
		self.start + self.len
	}

	#[inline]
	pub fn span(&self) -> Span {
		Span::at(self.start, self.len)
	}

	#[inline]
	pub fn is(&self, kind: TokenKind) -> bool {
		self.kind == kind
	}
}
