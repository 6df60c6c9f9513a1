//! Application context shared by every open editor.

use std::sync::Arc;

use bramble_debugger::{DebuggerBridge, EventQueue, ProcessLauncher, VmLauncher};
use bramble_worker::HandOff;

use crate::config::BrambleConfig;
use crate::invoke::Invoker;
use crate::msg::EventPump;
use crate::session::EditorSession;

/// Configuration and the VM connection, built once at startup and passed by
/// reference to whatever needs them.
#[derive(Debug)]
pub struct Context {
	config: BrambleConfig,
	bridge: Arc<DebuggerBridge>,
	invoker: Invoker,
}

impl Context {
	/// Builds a context that runs the VM command from `config`.
	///
	/// The returned pump must be drained by the UI thread.
	pub fn new(config: BrambleConfig) -> (Self, EventPump) {
		let launcher = Arc::new(ProcessLauncher::new(config.vm.command.clone()));
		Self::with_launcher(config, launcher)
	}

	pub fn with_launcher(config: BrambleConfig, launcher: Arc<dyn VmLauncher>) -> (Self, EventPump) {
		let (vm_sink, vm_queue) = EventQueue::new();
		let (ui_tx, ui_queue) = HandOff::new();
		let bridge = Arc::new(DebuggerBridge::new(launcher, config.vm.bridge_options(), vm_sink));
		let invoker = Invoker::new(bridge.clone(), ui_tx);
		let context = Self { config, bridge, invoker };
		(context, EventPump::new(ui_queue, vm_queue))
	}

	pub fn config(&self) -> &BrambleConfig {
		&self.config
	}

	pub fn bridge(&self) -> &Arc<DebuggerBridge> {
		&self.bridge
	}

	pub fn invoker(&self) -> &Invoker {
		&self.invoker
	}

	/// Opens a session for `text` using this context's configuration.
	pub fn open(&self, text: &str) -> EditorSession {
		EditorSession::open(text, &self.config)
	}
}
