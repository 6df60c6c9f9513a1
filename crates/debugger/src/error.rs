use std::time::Duration;

use crate::wire::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	/// The VM was reset since the reference or request was issued.
	#[error("execution VM was restarted")]
	VmRestarted,
	#[error("execution VM terminated")]
	VmTerminated,
	#[error("execution VM is not running")]
	NotRunning,
	#[error("{request} request timed out after {after:?}")]
	Timeout { request: &'static str, after: Duration },
	#[error("execution VM rejected request: {0}")]
	Remote(#[from] RemoteError),
	#[error("unexpected response to {request} request")]
	UnexpectedResponse { request: &'static str },
	#[error("failed to launch execution VM: {0}")]
	Launch(#[source] std::io::Error),
}

impl BridgeError {
	/// True for failures caused by the VM going away rather than the request.
	pub const fn is_vm_lifecycle(&self) -> bool {
		matches!(self, Self::VmRestarted | Self::VmTerminated | Self::NotRunning)
	}
}
