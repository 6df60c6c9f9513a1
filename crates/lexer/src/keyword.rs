/// Reserved words recognised by the lexer.
///
/// Contextual words (`record`, `var`, `yield`, `sealed`, `permits`) lex as
/// identifiers; the parser inspects their text where it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
	Abstract,
	Assert,
	Break,
	Case,
	Catch,
	Class,
	Const,
	Continue,
	Default,
	Do,
	Else,
	Enum,
	Extends,
	False,
	Final,
	Finally,
	For,
	Goto,
	If,
	Implements,
	Import,
	Instanceof,
	Interface,
	Native,
	New,
	Null,
	Package,
	Private,
	Protected,
	Public,
	Return,
	Static,
	Strictfp,
	Super,
	Switch,
	Synchronized,
	This,
	Throw,
	Throws,
	Transient,
	True,
	Try,
	Void,
	Volatile,
	While,
}

impl Keyword {
	pub fn from_ident(ident: &str) -> Option<Self> {
		Some(match ident {
			"abstract" => Self::Abstract,
			"assert" => Self::Assert,
			"break" => Self::Break,
			"case" => Self::Case,
			"catch" => Self::Catch,
			"class" => Self::Class,
			"const" => Self::Const,
			"continue" => Self::Continue,
			"default" => Self::Default,
			"do" => Self::Do,
			"else" => Self::Else,
			"enum" => Self::Enum,
			"extends" => Self::Extends,
			"false" => Self::False,
			"final" => Self::Final,
			"finally" => Self::Finally,
			"for" => Self::For,
			"goto" => Self::Goto,
			"if" => Self::If,
			"implements" => Self::Implements,
			"import" => Self::Import,
			"instanceof" => Self::Instanceof,
			"interface" => Self::Interface,
			"native" => Self::Native,
			"new" => Self::New,
			"null" => Self::Null,
			"package" => Self::Package,
			"private" => Self::Private,
			"protected" => Self::Protected,
			"public" => Self::Public,
			"return" => Self::Return,
			"static" => Self::Static,
			"strictfp" => Self::Strictfp,
			"super" => Self::Super,
			"switch" => Self::Switch,
			"synchronized" => Self::Synchronized,
			"this" => Self::This,
			"throw" => Self::Throw,
			"throws" => Self::Throws,
			"transient" => Self::Transient,
			"true" => Self::True,
			"try" => Self::Try,
			"void" => Self::Void,
			"volatile" => Self::Volatile,
			"while" => Self::While,
			_ => return None,
		})
	}

	/// Literal-valued keywords (`true`, `false`, `null`).
	pub const fn is_literal(self) -> bool {
		matches!(self, Self::True | Self::False | Self::Null)
	}

	/// Declaration modifiers that may precede a member or type.
	pub const fn is_modifier(self) -> bool {
		matches!(
			self,
			Self::Abstract
				| Self::Final | Self::Native
				| Self::Private | Self::Protected
				| Self::Public | Self::Static
				| Self::Strictfp | Self::Synchronized
				| Self::Transient | Self::Volatile
				| Self::Default
		)
	}
}

/// Returns true for the primitive type names.
pub fn is_primitive(ident: &str) -> bool {
	matches!(ident, "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double")
}
