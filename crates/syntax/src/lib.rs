//! Incremental Java parsing.
//!
//! The [`SyntaxView`] owns a [`NodeTree`] describing the structure of the
//! document and a [`ReparseQueue`] of regions whose structure is out of date.
//! Edits only shift node extents and queue regions; the tree is repaired in
//! small bounded pieces by [`SyntaxView::poll_reparse_queue`], normally driven
//! by a [`ReparseRunner`] on the UI thread under a time budget.

/// Change sets reported by tree mutations.
pub mod delta;
/// Node kinds and per-node data.
pub mod node;
/// The incremental reparse engine.
pub mod parser;
/// Dirty-region bookkeeping.
pub mod schedule;
/// The node tree arena.
pub mod tree;
/// The syntax view tying tree, queue and document together.
pub mod view;

pub use delta::{NodeChange, NodeTreeDelta, RemovedNode};
pub use node::{CommentKind, NodeId, NodeKind, ParseState, ParsedNode, TypeDefKind};
pub use parser::{ReparseOutcome, Transition, parse_document, reparse};
pub use schedule::{ReparseQueue, ReparseRecord};
pub use tree::{NodePos, NodeSummary, NodeTree};
pub use view::{DEFAULT_MAX_PARSE_PIECE, ReparseRunner, SyntaxView};
