/// What a spawned task does, recorded with every spawn for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Frame reader and writer of one VM connection; ends when the link is severed.
	VmIo,
	/// A user-requested call into the VM. Runs as long as the user code does.
	Invocation,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::VmIo => "vm_io",
			Self::Invocation => "invocation",
		}
	}
}
