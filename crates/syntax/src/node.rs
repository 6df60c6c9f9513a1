use bramble_primitives::CharLen;

/// Generational handle to a node in a [`crate::NodeTree`].
///
/// Handles stay valid while the node is alive; once a node is removed its
/// handle no longer resolves, even if the arena slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	pub(crate) key: usize,
	pub(crate) serial: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDefKind {
	Class,
	Interface,
	Enum,
	Record,
	Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
	Line,
	Block,
	Doc,
}

/// Closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// Root node; always spans the whole document.
	CompilationUnit,
	TypeDef(TypeDefKind),
	/// Members between the braces of a type definition.
	TypeBody,
	/// Method or constructor declaration.
	MethodDef,
	/// Statements between the braces of a method.
	MethodBody,
	Field,
	Comment(CommentKind),
	/// `for`, `while` and `do` loops.
	Iteration,
	/// `if`, `else` and `switch`.
	Selection,
	/// Untyped scope: `try`, `catch`, `finally`, `synchronized`, initializers,
	/// plain blocks and blocks embedded in expressions.
	Block,
	/// Statements between the braces of a block-like node.
	BlockBody,
	/// Package and import declarations and simple statements.
	Statement,
	/// Stand-in for a subtree the parser had to abandon; always incomplete.
	Placeholder,
}

impl NodeKind {
	/// Nodes that establish a scope of their own.
	pub const fn is_container(self) -> bool {
		matches!(self, Self::TypeDef(_) | Self::MethodDef | Self::Iteration | Self::Selection | Self::Block)
	}

	/// Nodes whose interior does not contribute to the indentation of their parent.
	pub const fn is_inner(self) -> bool {
		matches!(self, Self::TypeBody | Self::MethodBody | Self::BlockBody | Self::Comment(_))
	}

	/// Nodes whose children form a list parsed one construct at a time.
	pub const fn is_list(self) -> bool {
		matches!(self, Self::CompilationUnit | Self::TypeBody | Self::MethodBody | Self::BlockBody)
	}

	/// Brace-delimited body nodes.
	pub const fn is_body(self) -> bool {
		matches!(self, Self::TypeBody | Self::MethodBody | Self::BlockBody)
	}

	pub const fn is_comment(self) -> bool {
		matches!(self, Self::Comment(_))
	}

	pub const fn label(self) -> &'static str {
		match self {
			Self::CompilationUnit => "unit",
			Self::TypeDef(TypeDefKind::Class) => "class",
			Self::TypeDef(TypeDefKind::Interface) => "interface",
			Self::TypeDef(TypeDefKind::Enum) => "enum",
			Self::TypeDef(TypeDefKind::Record) => "record",
			Self::TypeDef(TypeDefKind::Annotation) => "annotation",
			Self::TypeBody => "type-body",
			Self::MethodDef => "method",
			Self::MethodBody => "method-body",
			Self::Field => "field",
			Self::Comment(CommentKind::Line) => "line-comment",
			Self::Comment(CommentKind::Block) => "block-comment",
			Self::Comment(CommentKind::Doc) => "doc-comment",
			Self::Iteration => "iteration",
			Self::Selection => "selection",
			Self::Block => "block",
			Self::BlockBody => "block-body",
			Self::Statement => "statement",
			Self::Placeholder => "placeholder",
		}
	}
}

/// Persisted position of a node's parse state machine.
///
/// Compound nodes move `Header -> Body -> (Trailer) -> Finished`. The state a
/// node was left in is what the parser resumes from when the node's body has
/// to be closed again after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseState {
	#[default]
	Header,
	Body,
	/// After the body of a `do` loop: `while (...) ;`.
	Trailer,
	Finished,
}

/// A node of the parsed structure.
///
/// Positions are relative: `offset` is measured from the start of the parent,
/// so inserting text only touches the nodes on the path to the edit and the
/// siblings after it.
#[derive(Debug, Clone)]
pub struct ParsedNode {
	pub(crate) kind: NodeKind,
	pub(crate) parent: Option<NodeId>,
	pub(crate) offset: CharLen,
	pub(crate) size: CharLen,
	pub(crate) children: Vec<NodeId>,
	pub(crate) complete: bool,
	pub(crate) state: ParseState,
	pub(crate) name: Option<String>,
	pub(crate) serial: u64,
}

impl ParsedNode {
	#[inline]
	pub fn kind(&self) -> NodeKind {
		self.kind
	}

	#[inline]
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	/// Offset from the start of the parent.
	#[inline]
	pub fn offset(&self) -> CharLen {
		self.offset
	}

	#[inline]
	pub fn size(&self) -> CharLen {
		self.size
	}

	#[inline]
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// False while the node's closing delimiter has not been seen.
	#[inline]
	pub fn is_complete(&self) -> bool {
		self.complete
	}

	#[inline]
	pub fn state(&self) -> ParseState {
		self.state
	}

	/// Declared name of types, methods and fields.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}
