//! Starting execution VMs.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use crate::error::BridgeError;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Byte streams to a freshly launched VM.
pub struct VmConnection {
	pub reader: BoxedReader,
	pub writer: BoxedWriter,
	/// Present when the VM is a child process owned by the bridge.
	pub process: Option<VmProcess>,
}

impl VmConnection {
	pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
		Self {
			reader: Box::new(reader),
			writer: Box::new(writer),
			process: None,
		}
	}

	pub fn with_process(mut self, process: VmProcess) -> Self {
		self.process = Some(process);
		self
	}
}

impl std::fmt::Debug for VmConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VmConnection").field("process", &self.process).finish_non_exhaustive()
	}
}

/// Kill switch for a VM child process.
#[derive(Debug)]
pub struct VmProcess {
	term_tx: oneshot::Sender<()>,
}

impl VmProcess {
	pub fn new(term_tx: oneshot::Sender<()>) -> Self {
		Self { term_tx }
	}

	/// Asks the monitor task to kill the process. No-op if it already exited.
	pub fn terminate(self) {
		let _ = self.term_tx.send(());
	}
}

pub type LaunchFuture<'a> = Pin<Box<dyn Future<Output = Result<VmConnection, BridgeError>> + Send + 'a>>;

/// Starts execution VMs.
///
/// Production uses [`ProcessLauncher`]; tests connect the bridge to an
/// in-process agent over a duplex pipe.
pub trait VmLauncher: Send + Sync + 'static {
	/// Launches the VM for `generation`.
	fn launch(&self, generation: u64) -> LaunchFuture<'_>;
}

/// Command line of the execution VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmCommand {
	pub program: String,
	pub args: Vec<String>,
	pub env: Vec<(String, String)>,
	pub cwd: Option<PathBuf>,
}

impl Default for VmCommand {
	fn default() -> Self {
		Self {
			program: "bramble".into(),
			args: vec!["vm-agent".into()],
			env: Vec::new(),
			cwd: None,
		}
	}
}

/// Spawns the VM as a child process speaking frames over stdin/stdout.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
	command: VmCommand,
}

impl ProcessLauncher {
	#[must_use]
	pub fn new(command: VmCommand) -> Self {
		Self { command }
	}

	pub fn command(&self) -> &VmCommand {
		&self.command
	}
}

impl VmLauncher for ProcessLauncher {
	/// Spawns the child and a monitor task that owns it until it exits or
	/// termination is requested.
	fn launch(&self, generation: u64) -> LaunchFuture<'_> {
		let command = self.command.clone();
		Box::pin(async move {
			let mut cmd = tokio::process::Command::new(&command.program);
			cmd.args(&command.args)
				.envs(command.env.iter().cloned())
				.stdin(Stdio::piped())
				.stdout(Stdio::piped())
				.stderr(Stdio::inherit())
				.kill_on_drop(true);
			if let Some(cwd) = &command.cwd {
				cmd.current_dir(cwd);
			}
			let mut child = cmd.spawn().map_err(|e| {
				tracing::error!(program = %command.program, error = %e, "debugger.spawn_failed");
				BridgeError::Launch(e)
			})?;

			let missing = || BridgeError::Launch(std::io::Error::other("child stdio not captured"));
			let stdin = child.stdin.take().ok_or_else(missing)?;
			let stdout = child.stdout.take().ok_or_else(missing)?;
			tracing::info!(generation, program = %command.program, pid = ?child.id(), "debugger.vm_spawned");

			let (term_tx, term_rx) = oneshot::channel();
			tokio::spawn(async move {
				tokio::select! {
					res = child.wait() => match res {
						Ok(status) => tracing::info!(generation, ?status, "debugger.vm_exited"),
						Err(e) => tracing::error!(generation, error = %e, "debugger.vm_wait_failed"),
					},
					_ = term_rx => {
						tracing::info!(generation, "debugger.vm_kill");
						if let Err(e) = child.kill().await {
							tracing::warn!(generation, error = %e, "debugger.vm_kill_failed");
						}
					}
				}
			});

			Ok(VmConnection::new(stdout, stdin).with_process(VmProcess::new(term_tx)))
		})
	}
}
