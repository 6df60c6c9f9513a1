//! One open Java document and everything derived from it.

use bramble_lexer::{LineStyler, StyledSegment};
use bramble_primitives::{CharIdx, CharLen, DocEdit, Document, EditError, LineIdx};
use bramble_scope::{Damage, MonospaceLayout, ScopeBox, ScopePalette, ScopeView, TextLayout};
use bramble_syntax::{NodeTree, SyntaxView};
use bramble_worker::{DrainBudget, DrainReport, drain};

use crate::config::BrambleConfig;

/// A document with its syntax view, line styling and scope boxes.
///
/// Edits update all three immediately: node extents shift, styled lines are
/// invalidated and scope boxes for the edited lines are queued. Structure is
/// then repaired by [`EditorSession::run_reparse_slice`], called from the UI
/// loop until it reports idle. Scope boxes computed during repair stay pending
/// until the queue drains, so half-parsed structure is never painted.
#[derive(Debug)]
pub struct EditorSession<L = MonospaceLayout> {
	doc: Document,
	syntax: SyntaxView,
	styler: LineStyler,
	scopes: ScopeView<L>,
	budget: DrainBudget,
}

impl EditorSession<MonospaceLayout> {
	/// Opens `text` with the layout and palette described by `config`.
	pub fn open(text: &str, config: &BrambleConfig) -> Self {
		Self::with_layout(text, config.scope.layout(), config)
	}
}

impl<L: TextLayout> EditorSession<L> {
	pub fn with_layout(text: &str, layout: L, config: &BrambleConfig) -> Self {
		let doc = Document::from(text);
		let syntax = SyntaxView::new(&doc).with_max_parse_piece(config.parser.max_parse_piece);
		Self {
			syntax,
			styler: LineStyler::new(),
			scopes: ScopeView::new(layout, config.scope.effective_palette()),
			budget: config.scheduler.budget(),
			doc,
		}
	}

	pub fn document(&self) -> &Document {
		&self.doc
	}

	pub fn syntax(&self) -> &SyntaxView {
		&self.syntax
	}

	pub fn tree(&self) -> &NodeTree {
		self.syntax.tree()
	}

	pub fn scope_view(&self) -> &ScopeView<L> {
		&self.scopes
	}

	/// Layout access; follow with [`Self::resized`] or [`Self::font_changed`].
	pub fn layout_mut(&mut self) -> &mut L {
		self.scopes.layout_mut()
	}

	/// True once the tree matches the whole document.
	pub fn is_parsed(&self) -> bool {
		self.syntax.is_current()
	}

	pub fn insert(&mut self, pos: CharIdx, text: &str) -> Result<DocEdit, EditError> {
		let edit = self.doc.insert(pos, text)?;
		self.edited(&edit);
		Ok(edit)
	}

	pub fn remove(&mut self, pos: CharIdx, len: CharLen) -> Result<DocEdit, EditError> {
		let edit = self.doc.remove(pos, len)?;
		self.edited(&edit);
		Ok(edit)
	}

	fn edited(&mut self, edit: &DocEdit) {
		self.syntax.apply_edit(&self.doc, edit);
		self.styler.edited(edit);
		let delta = self.syntax.take_delta();
		self.scopes.update_damage(&self.doc, self.syntax.tree(), Damage::Edit { edit, delta: &delta });
	}

	/// Runs one budgeted slice of reparsing.
	///
	/// Returns the drain report; schedule another slice unless it is idle.
	pub fn run_reparse_slice(&mut self) -> DrainReport {
		let report = drain(&mut self.syntax.runner(&self.doc), self.budget);
		let delta = self.syntax.take_delta();
		if !delta.is_empty() {
			self.scopes.update_damage(&self.doc, self.syntax.tree(), Damage::Reparse(&delta));
		}
		if self.syntax.is_current() {
			let applied = self.scopes.apply_pending();
			tracing::debug!(steps = report.steps, applied, "session.parse_settled");
		} else {
			tracing::trace!(steps = report.steps, queued = self.syntax.queue().len(), "session.parse_slice");
		}
		report
	}

	/// Reparses until the tree is current.
	pub fn settle(&mut self) {
		while !self.run_reparse_slice().idle {}
	}

	/// Styled segments of `line`.
	pub fn styled_line(&mut self, line: LineIdx) -> &[StyledSegment] {
		self.styler.styled_line(self.doc.text(), line)
	}

	/// Scope boxes currently shown on `line`.
	pub fn scopes(&self, line: LineIdx) -> &[ScopeBox] {
		self.scopes.scopes(line)
	}

	/// Reports the lines on screen so their boxes are computed.
	pub fn rendered_lines(&mut self, from: LineIdx, to: LineIdx) {
		self.scopes.rendered_lines(&self.doc, self.syntax.tree(), from, to);
	}

	pub fn resized(&mut self) {
		self.scopes.update_damage(&self.doc, self.syntax.tree(), Damage::Resize);
	}

	pub fn font_changed(&mut self) {
		self.scopes.font_size_changed(&self.doc, self.syntax.tree());
	}

	pub fn set_palette(&mut self, palette: ScopePalette, strength: u8) {
		self.scopes.set_palette(&self.doc, self.syntax.tree(), palette.reduced(strength));
	}
}

#[cfg(test)]
mod tests;
