//! Restartable Java tokenizer.
//!
//! The lexer works over a [`ropey::RopeSlice`] and can resume at any offset
//! given the [`LexState`] saved there, which is what makes line-local
//! re-tokenization and incremental reparsing cheap.

/// Per-line styled segments for the rendering boundary.
pub mod highlight;
/// Keyword tables.
pub mod keyword;
/// The tokenizer state machine.
pub mod lexer;
/// Cache of lexer states at line starts.
pub mod lines;
/// Token and token-kind definitions.
pub mod token;

pub use highlight::{LineStyler, StyledSegment};
pub use keyword::Keyword;
pub use lexer::{LexState, Lexer};
pub use lines::LineStates;
pub use token::{Token, TokenKind, TokenStyle};
