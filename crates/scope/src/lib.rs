//! Scope highlighting for the Java node tree.
//!
//! A [`ScopeView`] turns the node tree into per-line [`ScopeBox`]es: nested
//! coloured rectangles whose left edge follows the indentation of the node
//! they belong to. Indents need screen positions, so they are cached per node
//! in an [`IndentCache`] and only recomputed for lines the [`TextLayout`]
//! reports as visible.

/// Per-node indentation cache.
pub mod indent;
/// Screen-position boundary.
pub mod layout;
/// Line-local visibility rules for nodes.
pub mod lines;
/// Scope colours.
pub mod palette;
/// The scope view and its boxes.
pub mod view;

pub use indent::{IndentCache, IndentState};
pub use layout::{MonospaceLayout, Px, TextLayout};
pub use palette::{MAX_STRENGTH, Rgb, ScopePalette};
pub use view::{BoxInsets, Damage, ScopeBox, ScopeView};
