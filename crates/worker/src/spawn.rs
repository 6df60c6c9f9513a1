//! Spawning for VM traffic and user invocations.
//!
//! Both task classes are I/O bound: [`TaskClass::VmIo`] tasks wait on a
//! connection and [`TaskClass::Invocation`] tasks wait on the VM to answer.
//! They share one runtime. Inside an async context that is the caller's
//! runtime; a UI thread without one gets a small process-wide runtime so
//! invocations never block the thread that issued them.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

static FALLBACK: OnceLock<Runtime> = OnceLock::new();

fn handle() -> Handle {
	if let Ok(current) = Handle::try_current() {
		return current;
	}
	FALLBACK
		.get_or_init(|| {
			Builder::new_multi_thread()
				.enable_all()
				.worker_threads(2)
				.thread_name("bramble-vm")
				.build()
				.expect("failed to build the bramble fallback runtime")
		})
		.handle()
		.clone()
}

/// Spawns `fut` on the current runtime, or on the fallback runtime when
/// called from a plain thread.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	handle().spawn(fut)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_spawn_outside_runtime_uses_fallback() {
		let handle = spawn(TaskClass::Invocation, async { 7 });
		let value = std::thread::spawn(move || {
			tokio::runtime::Builder::new_current_thread()
				.build()
				.unwrap()
				.block_on(handle)
				.unwrap()
		})
		.join()
		.unwrap();
		assert_eq!(value, 7);
	}

	#[tokio::test]
	async fn test_spawn_inside_runtime_uses_current() {
		let handle = spawn(TaskClass::VmIo, async {
			tokio::task::yield_now().await;
			4
		});
		assert_eq!(handle.await.unwrap(), 4);
	}
}
