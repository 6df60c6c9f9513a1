use bramble_syntax::NodeKind;
use serde::{Deserialize, Serialize};

/// Highest scope highlighting strength; colours are used unreduced.
pub const MAX_STRENGTH: u8 = 20;

/// 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
	/// Mixes `self` over `other` (`alpha` 0.0 = other, 1.0 = self).
	pub fn blend(self, other: Rgb, alpha: f32) -> Rgb {
		let alpha = alpha.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (f32::from(a) * alpha + f32::from(b) * (1.0 - alpha)).round() as u8;
		Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
	}
}

/// Scope colours by node category.
///
/// `*_edge` colours draw a box's border, `*_fill` its interior. Bodies use
/// `inner_edge` with the background as fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopePalette {
	pub background: Rgb,
	pub class_edge: Rgb,
	pub class_fill: Rgb,
	pub inner_edge: Rgb,
	pub method_edge: Rgb,
	pub method_fill: Rgb,
	pub selection_edge: Rgb,
	pub selection_fill: Rgb,
	pub iteration_edge: Rgb,
	pub iteration_fill: Rgb,
}

impl Default for ScopePalette {
	fn default() -> Self {
		Self {
			background: Rgb(255, 255, 255),
			class_edge: Rgb(200, 224, 200),
			class_fill: Rgb(240, 250, 240),
			inner_edge: Rgb(214, 232, 214),
			method_edge: Rgb(232, 220, 168),
			method_fill: Rgb(255, 251, 230),
			selection_edge: Rgb(196, 212, 236),
			selection_fill: Rgb(236, 242, 252),
			iteration_edge: Rgb(236, 196, 212),
			iteration_fill: Rgb(252, 236, 242),
		}
	}
}

impl ScopePalette {
	/// Fades every colour toward the background. `strength` is clamped to
	/// [`MAX_STRENGTH`]; zero leaves only the background.
	pub fn reduced(&self, strength: u8) -> Self {
		let alpha = f32::from(strength.min(MAX_STRENGTH)) / f32::from(MAX_STRENGTH);
		let bg = self.background;
		let fade = |c: Rgb| c.blend(bg, alpha);
		Self {
			background: bg,
			class_edge: fade(self.class_edge),
			class_fill: fade(self.class_fill),
			inner_edge: fade(self.inner_edge),
			method_edge: fade(self.method_edge),
			method_fill: fade(self.method_fill),
			selection_edge: fade(self.selection_edge),
			selection_fill: fade(self.selection_fill),
			iteration_edge: fade(self.iteration_edge),
			iteration_fill: fade(self.iteration_fill),
		}
	}

	/// `(edge, fill)` for a node drawn as a scope.
	pub fn colors_for(&self, kind: NodeKind) -> (Rgb, Rgb) {
		match kind {
			k if k.is_body() => (self.inner_edge, self.background),
			NodeKind::MethodDef => (self.method_edge, self.method_fill),
			NodeKind::Iteration => (self.iteration_edge, self.iteration_fill),
			NodeKind::Selection | NodeKind::Block => (self.selection_edge, self.selection_fill),
			_ => (self.class_edge, self.class_fill),
		}
	}
}
