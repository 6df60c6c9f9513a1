//! Remote debugger bridge.
//!
//! User code never runs in the IDE process. It runs in a separate execution VM
//! reached through a [`VmLauncher`]; the [`DebuggerBridge`] talks to it with
//! length-prefixed postcard [`Frame`]s and hands out [`RemoteObjectRef`]s
//! stamped with the VM generation. Resetting the VM bumps the generation, so
//! any reference minted before the reset fails with
//! [`BridgeError::VmRestarted`] instead of reaching the new VM.
//!
//! The VM side of the protocol lives in [`agent`].

/// VM-side request loop.
pub mod agent;
/// IDE-side bridge.
pub mod bridge;
/// Bridge errors.
pub mod error;
/// Asynchronous VM events.
pub mod events;
/// Exception payloads and stack filtering.
pub mod exception;
/// Built-in scratch host for the agent.
pub mod host;
/// Starting execution VMs.
pub mod launcher;
/// Values and object references.
pub mod value;
/// Frames and framing.
pub mod wire;

pub use agent::{HostError, VmHost, serve};
pub use bridge::{BridgeOptions, CallTarget, DebuggerBridge, InvokeOutcome, NewObject};
pub use error::BridgeError;
pub use events::{EventQueue, EventSink, VmEvent};
pub use exception::{ExceptionInfo, StackFilter, StackFrame};
pub use host::ScratchHost;
pub use launcher::{ProcessLauncher, VmCommand, VmConnection, VmLauncher, VmProcess};
pub use value::{MethodSignature, ObjectHandle, ObjectId, RemoteObjectRef, RemoteValue, Value};
pub use wire::{Frame, MAX_FRAME_LEN};
