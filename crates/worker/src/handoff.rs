//! Thread-safe hand-off into a single consumer thread.
//!
//! Producers (I/O tasks, background invocations) push from any thread; the
//! owning thread drains without blocking at a point of its choosing.

use tokio::sync::mpsc;

/// Sending half, cheap to clone.
#[derive(Debug)]
pub struct HandOffSender<T> {
	tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for HandOffSender<T> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<T> HandOffSender<T> {
	/// Queues `item`. Returns false if the consumer is gone.
	pub fn send(&self, item: T) -> bool {
		self.tx.send(item).is_ok()
	}
}

/// Receiving half, owned by the consumer thread.
#[derive(Debug)]
pub struct HandOff<T> {
	rx: mpsc::UnboundedReceiver<T>,
}

impl<T> HandOff<T> {
	pub fn new() -> (HandOffSender<T>, Self) {
		let (tx, rx) = mpsc::unbounded_channel();
		(HandOffSender { tx }, Self { rx })
	}

	/// Takes every queued item without waiting.
	pub fn drain_now(&mut self) -> Vec<T> {
		let mut items = Vec::new();
		while let Ok(item) = self.rx.try_recv() {
			items.push(item);
		}
		items
	}

	/// Waits for the next item; `None` once every sender is gone.
	pub async fn recv(&mut self) -> Option<T> {
		self.rx.recv().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_items_cross_threads_in_order() {
		let (tx, mut rx) = HandOff::new();
		let producer = std::thread::spawn(move || {
			for i in 0..5 {
				assert!(tx.send(i));
			}
		});
		producer.join().unwrap();
		assert_eq!(rx.drain_now(), vec![0, 1, 2, 3, 4]);
		assert!(rx.drain_now().is_empty());
	}

	#[test]
	fn test_send_fails_after_consumer_drop() {
		let (tx, rx) = HandOff::<u8>::new();
		drop(rx);
		assert!(!tx.send(1));
	}
}
