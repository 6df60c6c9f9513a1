use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation counter shared by every holder of a clone.
///
/// Starts at generation 1. Handles stamped with an older generation are stale.
#[derive(Debug, Clone)]
pub struct GenerationClock {
	current: Arc<AtomicU64>,
}

impl Default for GenerationClock {
	fn default() -> Self {
		Self {
			current: Arc::new(AtomicU64::new(1)),
		}
	}
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the current generation.
	pub fn current(&self) -> u64 {
		self.current.load(Ordering::Acquire)
	}

	/// Moves to the next generation and returns it.
	pub fn advance(&self) -> u64 {
		self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns true if `generation` is the current one.
	pub fn is_current(&self, generation: u64) -> bool {
		self.current() == generation
	}
}

/// Generation-scoped cancellation token for task lifecycles.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub fn new(generation: u64) -> Self {
		Self {
			generation,
			cancel: CancellationToken::new(),
		}
	}

	/// Returns generation ID.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child token in the same generation.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			cancel: self.cancel.child_token(),
		}
	}
}
