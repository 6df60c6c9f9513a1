//! Interactive invocations run off the UI thread.
//!
//! A call into the VM may run user code for as long as it likes. The UI gets
//! a [`Ticket`] back immediately and the outcome later, as a [`UiEvent`]
//! drained by the [`EventPump`](crate::EventPump).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bramble_debugger::{CallTarget, DebuggerBridge, MethodSignature, RemoteObjectRef, Value};
use bramble_worker::TaskClass;

use crate::msg::{UiEvent, UiSender};

/// Identifies one invocation until its outcome arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// Owned receiver of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
	Object(RemoteObjectRef),
	Class(String),
}

impl Target {
	fn as_call(&self) -> CallTarget<'_> {
		match self {
			Self::Object(object) => CallTarget::Object(object),
			Self::Class(name) => CallTarget::Class(name),
		}
	}
}

#[derive(Debug)]
pub struct Invoker {
	bridge: Arc<DebuggerBridge>,
	ui: UiSender,
	next: AtomicU64,
}

impl Invoker {
	pub fn new(bridge: Arc<DebuggerBridge>, ui: UiSender) -> Self {
		Self {
			bridge,
			ui,
			next: AtomicU64::new(1),
		}
	}

	fn ticket(&self) -> Ticket {
		Ticket(self.next.fetch_add(1, Ordering::Relaxed))
	}

	/// Calls `method` on `target`; the outcome arrives as [`UiEvent::InvocationFinished`].
	pub fn invoke(&self, target: Target, method: MethodSignature, args: Vec<Value>) -> Ticket {
		let ticket = self.ticket();
		let bridge = self.bridge.clone();
		let ui = self.ui.clone();
		tracing::debug!(ticket = ticket.0, %method, "invoke.submit");
		bramble_worker::spawn(TaskClass::Invocation, async move {
			let outcome = bridge.invoke(target.as_call(), &method, args).await;
			if !ui.send(UiEvent::InvocationFinished { ticket, outcome }) {
				tracing::debug!(ticket = ticket.0, "invoke.ui_gone");
			}
		});
		ticket
	}

	/// Creates an instance of `class_name` to be benched as `name`.
	///
	/// The outcome arrives as [`UiEvent::ObjectCreated`].
	pub fn construct(&self, name: impl Into<String>, class_name: impl Into<String>, args: Vec<Value>) -> Ticket {
		let ticket = self.ticket();
		let name = name.into();
		let class_name = class_name.into();
		let bridge = self.bridge.clone();
		let ui = self.ui.clone();
		tracing::debug!(ticket = ticket.0, %class_name, %name, "invoke.construct");
		bramble_worker::spawn(TaskClass::Invocation, async move {
			let result = bridge.instantiate(&class_name, args).await;
			if !ui.send(UiEvent::ObjectCreated { ticket, name, result }) {
				tracing::debug!(ticket = ticket.0, "invoke.ui_gone");
			}
		});
		ticket
	}
}
