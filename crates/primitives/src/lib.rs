//! Core text primitives shared by the lexer, parser and renderer.

/// Editable document adapter over a rope.
pub mod document;
/// Bounded log of recent edits for diagnostics.
pub mod edit_log;
/// Character and line index types.
pub mod range;
/// Rope utilities and extensions.
pub mod rope;

pub use document::{DocEdit, Document, EditError, EditKind};
pub use edit_log::{EditLog, EditRecord};
pub use range::{CharIdx, CharLen, LineIdx, Span};
pub use rope::{line_content_end, trim_line_ending};
pub use ropey::{Rope, RopeSlice};
