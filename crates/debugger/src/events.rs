use bramble_worker::{HandOff, HandOffSender};

use crate::exception::{ExceptionInfo, StackFilter};
use crate::wire::{Event, Location, OutputStream};

/// Notification from the bridge, drained on the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum VmEvent {
	Started { generation: u64 },
	Breakpoint(Location),
	Step(Location),
	Exception(ExceptionInfo),
	Output { stream: OutputStream, text: String },
	/// The VM exited or its connection broke. `code` is set when the VM reported one.
	Terminated { generation: u64, code: Option<i32> },
	/// The VM was reset; every reference from earlier generations is dead.
	Reset { generation: u64 },
}

/// Producer side of the event queue, held by the bridge's reader tasks.
pub type EventSink = HandOffSender<VmEvent>;

/// Unbounded queue of [`VmEvent`]s drained without blocking.
pub type EventQueue = HandOff<VmEvent>;

impl VmEvent {
	pub(crate) fn from_wire(event: Event, generation: u64, filter: &StackFilter) -> Self {
		match event {
			Event::Breakpoint(at) => Self::Breakpoint(at),
			Event::Step(at) => Self::Step(at),
			Event::Exception(info) => Self::Exception(info.filtered(filter)),
			Event::Output { stream, text } => Self::Output { stream, text },
			Event::Exited { code } => Self::Terminated {
				generation,
				code: Some(code),
			},
		}
	}
}
