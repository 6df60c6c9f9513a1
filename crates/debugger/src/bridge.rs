//! IDE-side bridge to the execution VM.
//!
//! Each launched VM gets a link: a writer task draining an outgoing frame
//! queue, a reader task routing responses to waiting callers and events into
//! the [`EventQueue`](crate::EventQueue), and a table of in-flight requests.
//! Resetting the VM severs the link, resolves everything in flight as
//! restarted, bumps the generation and launches a fresh VM.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bramble_worker::{GenerationClock, GenerationToken, TaskClass};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::error::BridgeError;
use crate::events::{EventSink, VmEvent};
use crate::exception::{ExceptionInfo, StackFilter};
use crate::launcher::{BoxedReader, BoxedWriter, VmConnection, VmLauncher, VmProcess};
use crate::value::{MethodSignature, ObjectHandle, ObjectId, RemoteObjectRef, RemoteValue, Value};
use crate::wire::{Event, Frame, InvokeTarget, Request, RequestId, RequestPayload, ResponsePayload, read_frame, write_frame};

#[derive(Debug, Clone)]
pub struct BridgeOptions {
	/// Bound on requests that do not run user code.
	pub request_timeout: Duration,
	pub stack_filter: StackFilter,
}

impl Default for BridgeOptions {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			stack_filter: StackFilter::default(),
		}
	}
}

/// Result of invoking a method in the execution VM.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
	Normal(Value),
	VoidNormal,
	Exception(ExceptionInfo),
	/// The VM died while the call was running.
	VmTerminated,
	/// The VM was reset while the call was running.
	VmRestarted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewObject {
	Created(RemoteObjectRef),
	Exception(ExceptionInfo),
}

/// Receiver of an invocation.
#[derive(Debug, Clone, Copy)]
pub enum CallTarget<'a> {
	Object(&'a RemoteObjectRef),
	Class(&'a str),
}

enum Reply {
	Response(ResponsePayload),
	Terminated,
	Restarted,
}

type PendingMap = Arc<Mutex<FxHashMap<RequestId, oneshot::Sender<Reply>>>>;

fn resolve_all(pending: &PendingMap, reply: impl Fn() -> Reply) -> usize {
	let waiters: Vec<_> = pending.lock().drain().collect();
	let count = waiters.len();
	for (_, tx) in waiters {
		let _ = tx.send(reply());
	}
	count
}

struct Link {
	token: GenerationToken,
	outgoing: mpsc::UnboundedSender<Frame>,
	pending: PendingMap,
	process: Option<VmProcess>,
}

impl Link {
	fn generation(&self) -> u64 {
		self.token.generation()
	}

	fn is_live(&self) -> bool {
		!self.token.is_cancelled()
	}

	/// Stops both tasks, resolves every waiter with `reply`, kills the process.
	fn sever(self, reply: impl Fn() -> Reply) {
		self.token.cancel();
		let resolved = resolve_all(&self.pending, reply);
		tracing::debug!(generation = self.generation(), resolved, "debugger.link_severed");
		if let Some(process) = self.process {
			process.terminate();
		}
	}
}

struct InFlight {
	id: RequestId,
	generation: u64,
	pending: PendingMap,
	rx: oneshot::Receiver<Reply>,
}

/// Connection to the execution VM.
///
/// Methods take `&self`; share the bridge behind an `Arc` to issue calls from
/// background tasks.
pub struct DebuggerBridge {
	launcher: Arc<dyn VmLauncher>,
	options: BridgeOptions,
	clock: GenerationClock,
	launched: AtomicBool,
	ids: AtomicU64,
	link: Mutex<Option<Link>>,
	events: EventSink,
}

impl DebuggerBridge {
	pub fn new(launcher: Arc<dyn VmLauncher>, options: BridgeOptions, events: EventSink) -> Self {
		Self {
			launcher,
			options,
			clock: GenerationClock::new(),
			launched: AtomicBool::new(false),
			ids: AtomicU64::new(1),
			link: Mutex::new(None),
			events,
		}
	}

	pub fn options(&self) -> &BridgeOptions {
		&self.options
	}

	/// Generation of the current (or next) VM.
	pub fn generation(&self) -> u64 {
		self.clock.current()
	}

	pub fn is_running(&self) -> bool {
		self.link.lock().as_ref().is_some_and(Link::is_live)
	}

	/// Requests still waiting for the current VM to answer.
	pub fn in_flight(&self) -> usize {
		self.link.lock().as_ref().map_or(0, |l| l.pending.lock().len())
	}

	/// True if `object` was minted by the current VM.
	pub fn is_current(&self, object: &RemoteObjectRef) -> bool {
		self.clock.is_current(object.generation())
	}

	/// Launches the VM unless one is already running.
	///
	/// A VM launched after an earlier one exited gets a new generation.
	pub async fn start(&self) -> Result<u64, BridgeError> {
		let live = self.link.lock().as_ref().filter(|l| l.is_live()).map(Link::generation);
		if let Some(generation) = live {
			return Ok(generation);
		}
		let generation = if self.launched.swap(true, Ordering::AcqRel) {
			self.clock.advance()
		} else {
			self.clock.current()
		};
		self.launch(generation).await
	}

	/// Resets the VM ("Reset Machine").
	///
	/// Every in-flight call resolves as restarted, every existing reference
	/// becomes stale, and a fresh VM is launched.
	pub async fn restart(&self) -> Result<u64, BridgeError> {
		let old = self.link.lock().take();
		let generation = self.clock.advance();
		self.launched.store(true, Ordering::Release);
		if let Some(link) = old {
			link.sever(|| Reply::Restarted);
		}
		tracing::info!(generation, "debugger.reset");
		self.events.send(VmEvent::Reset { generation });
		self.launch(generation).await
	}

	/// Asks the VM to exit, then severs the connection.
	pub async fn shutdown(&self) -> Result<(), BridgeError> {
		if !self.is_running() {
			return Ok(());
		}
		if let Err(e) = self.request(RequestPayload::Shutdown, None).await {
			tracing::warn!(error = %e, "debugger.shutdown_unacknowledged");
		}
		let link = self.link.lock().take();
		if let Some(link) = link {
			link.sever(|| Reply::Terminated);
		}
		Ok(())
	}

	pub async fn ping(&self) -> Result<(), BridgeError> {
		match self.request(RequestPayload::Ping, None).await? {
			ResponsePayload::Pong => Ok(()),
			other => Err(unexpected("ping", other)),
		}
	}

	/// Creates an object in the VM.
	///
	/// # Errors
	///
	/// [`BridgeError::VmRestarted`] if an argument is stale or the VM is reset
	/// before the constructor returns.
	pub async fn instantiate(&self, class_name: &str, args: Vec<Value>) -> Result<NewObject, BridgeError> {
		let mut stamp = None;
		let args = self.lower_args(args, &mut stamp)?;
		let call = self.submit(
			RequestPayload::Instantiate {
				class_name: class_name.to_owned(),
				args,
			},
			stamp,
		)?;
		let generation = call.generation;
		match self.finish(call, "instantiate", None).await? {
			ResponsePayload::Created(handle) => Ok(NewObject::Created(RemoteObjectRef::new(handle.class_name, handle.id, generation))),
			ResponsePayload::Threw(info) => Ok(NewObject::Exception(info.filtered(&self.options.stack_filter))),
			ResponsePayload::Error(e) => Err(e.into()),
			other => Err(unexpected("instantiate", other)),
		}
	}

	/// Invokes `method` on an object or class.
	///
	/// A stale target or argument fails up front with
	/// [`BridgeError::VmRestarted`]; a VM that goes away mid-call resolves the
	/// call with [`InvokeOutcome::VmRestarted`] or [`InvokeOutcome::VmTerminated`].
	pub async fn invoke(&self, target: CallTarget<'_>, method: &MethodSignature, args: Vec<Value>) -> Result<InvokeOutcome, BridgeError> {
		let mut stamp = None;
		let target = match target {
			CallTarget::Object(object) => InvokeTarget::Object(self.resolve(object, &mut stamp)?),
			CallTarget::Class(name) => InvokeTarget::Class(name.to_owned()),
		};
		let args = self.lower_args(args, &mut stamp)?;
		tracing::debug!(method = %method, "debugger.invoke");
		let call = self.submit(
			RequestPayload::Invoke {
				target,
				method: method.clone(),
				args,
			},
			stamp,
		)?;
		let generation = call.generation;
		let payload = match self.finish(call, "invoke", None).await {
			Ok(payload) => payload,
			Err(BridgeError::VmRestarted) => return Ok(InvokeOutcome::VmRestarted),
			Err(BridgeError::VmTerminated) => return Ok(InvokeOutcome::VmTerminated),
			Err(e) => return Err(e),
		};
		match payload {
			ResponsePayload::Returned(value) => Ok(InvokeOutcome::Normal(lift(value, generation))),
			ResponsePayload::ReturnedVoid => Ok(InvokeOutcome::VoidNormal),
			ResponsePayload::Threw(info) => Ok(InvokeOutcome::Exception(info.filtered(&self.options.stack_filter))),
			ResponsePayload::Error(e) => Err(e.into()),
			other => Err(unexpected("invoke", other)),
		}
	}

	pub async fn get_field(&self, object: &RemoteObjectRef, field: &str) -> Result<Value, BridgeError> {
		let mut stamp = None;
		let payload = RequestPayload::GetField {
			object: self.resolve(object, &mut stamp)?,
			field: field.to_owned(),
		};
		match self.request(payload, stamp).await? {
			ResponsePayload::Field(value) => Ok(lift(value, object.generation())),
			ResponsePayload::Error(e) => Err(e.into()),
			other => Err(unexpected("get_field", other)),
		}
	}

	/// Lets the VM collect `object`.
	pub async fn release(&self, object: &RemoteObjectRef) -> Result<(), BridgeError> {
		let mut stamp = None;
		let payload = RequestPayload::Release {
			object: self.resolve(object, &mut stamp)?,
		};
		match self.request(payload, stamp).await? {
			ResponsePayload::Released => Ok(()),
			ResponsePayload::Error(e) => Err(e.into()),
			other => Err(unexpected("release", other)),
		}
	}

	async fn launch(&self, generation: u64) -> Result<u64, BridgeError> {
		let connection = self.launcher.launch(generation).await?;
		if !self.clock.is_current(generation) {
			// Reset while launching; the newer launch owns the link.
			if let Some(process) = connection.process {
				process.terminate();
			}
			return Err(BridgeError::VmRestarted);
		}
		let replaced = self.attach(generation, connection);
		if let Some(old) = replaced {
			old.sever(|| Reply::Terminated);
		}
		tracing::info!(generation, "debugger.vm_started");
		self.events.send(VmEvent::Started { generation });
		Ok(generation)
	}

	fn attach(&self, generation: u64, connection: VmConnection) -> Option<Link> {
		let VmConnection { reader, writer, process } = connection;
		let (outgoing, frames) = mpsc::unbounded_channel();
		let pending = PendingMap::default();
		let token = GenerationToken::new(generation);

		bramble_worker::spawn(TaskClass::VmIo, write_loop(writer, frames, token.child()));
		bramble_worker::spawn(
			TaskClass::VmIo,
			read_loop(
				reader,
				ReadContext {
					token: token.clone(),
					pending: pending.clone(),
					clock: self.clock.clone(),
					events: self.events.clone(),
					filter: self.options.stack_filter.clone(),
				},
			),
		);

		self.link.lock().replace(Link {
			token,
			outgoing,
			pending,
			process,
		})
	}

	/// Maps `object` to its id in the current VM and records its generation
	/// in `stamp`; [`Self::submit`] rechecks it against the link it sends on.
	fn resolve(&self, object: &RemoteObjectRef, stamp: &mut Option<u64>) -> Result<ObjectId, BridgeError> {
		if self.is_current(object) {
			*stamp = Some(object.generation());
			Ok(object.id())
		} else {
			tracing::debug!(object = %object, generation = object.generation(), "debugger.stale_reference");
			Err(BridgeError::VmRestarted)
		}
	}

	fn lower_args(&self, args: Vec<Value>, stamp: &mut Option<u64>) -> Result<Vec<RemoteValue>, BridgeError> {
		let mut lowered = Vec::with_capacity(args.len());
		for arg in args {
			lowered.push(arg.try_map_object(|object| {
				let id = self.resolve(&object, &mut *stamp)?;
				Ok::<_, BridgeError>(ObjectHandle {
					id,
					class_name: object.class_name().to_owned(),
				})
			})?);
		}
		Ok(lowered)
	}

	/// Queues `payload` on the current link.
	///
	/// `stamp` is the generation the payload's object ids were resolved
	/// under; a reset since then makes them name objects of another VM.
	fn submit(&self, payload: RequestPayload, stamp: Option<u64>) -> Result<InFlight, BridgeError> {
		let guard = self.link.lock();
		let link = guard.as_ref().filter(|l| l.is_live()).ok_or(BridgeError::NotRunning)?;
		if let Some(generation) = stamp
			&& generation != link.generation()
		{
			tracing::debug!(generation, current = link.generation(), request = payload.name(), "debugger.stale_request");
			return Err(BridgeError::VmRestarted);
		}
		let id = RequestId(self.ids.fetch_add(1, Ordering::Relaxed));
		let (tx, rx) = oneshot::channel();
		link.pending.lock().insert(id, tx);
		tracing::trace!(id = id.0, request = payload.name(), generation = link.generation(), "debugger.request");
		if link.outgoing.send(Frame::Request(Request { id, payload })).is_err() {
			link.pending.lock().remove(&id);
			return Err(BridgeError::VmTerminated);
		}
		Ok(InFlight {
			id,
			generation: link.generation(),
			pending: link.pending.clone(),
			rx,
		})
	}

	async fn finish(&self, call: InFlight, request: &'static str, timeout: Option<Duration>) -> Result<ResponsePayload, BridgeError> {
		let InFlight { id, pending, rx, .. } = call;
		let reply = match timeout {
			Some(after) => match tokio::time::timeout(after, rx).await {
				Ok(reply) => reply,
				Err(_) => {
					pending.lock().remove(&id);
					tracing::warn!(id = id.0, request, ?after, "debugger.timeout");
					return Err(BridgeError::Timeout { request, after });
				}
			},
			None => rx.await,
		};
		match reply {
			Ok(Reply::Response(payload)) => Ok(payload),
			Ok(Reply::Restarted) => Err(BridgeError::VmRestarted),
			Ok(Reply::Terminated) | Err(_) => Err(BridgeError::VmTerminated),
		}
	}

	/// Sends a control request bounded by the configured timeout.
	async fn request(&self, payload: RequestPayload, stamp: Option<u64>) -> Result<ResponsePayload, BridgeError> {
		let request = payload.name();
		let timeout = (!payload.runs_user_code()).then_some(self.options.request_timeout);
		let call = self.submit(payload, stamp)?;
		self.finish(call, request, timeout).await
	}
}

impl std::fmt::Debug for DebuggerBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DebuggerBridge")
			.field("generation", &self.generation())
			.field("running", &self.is_running())
			.field("in_flight", &self.in_flight())
			.finish_non_exhaustive()
	}
}

impl Drop for DebuggerBridge {
	fn drop(&mut self) {
		if let Some(link) = self.link.get_mut().take() {
			link.sever(|| Reply::Terminated);
		}
	}
}

fn lift(value: RemoteValue, generation: u64) -> Value {
	value.map_object(|handle| RemoteObjectRef::new(handle.class_name, handle.id, generation))
}

fn unexpected(request: &'static str, payload: ResponsePayload) -> BridgeError {
	tracing::warn!(request, ?payload, "debugger.unexpected_response");
	BridgeError::UnexpectedResponse { request }
}

async fn write_loop(mut writer: BoxedWriter, mut frames: mpsc::UnboundedReceiver<Frame>, token: GenerationToken) {
	loop {
		let frame = tokio::select! {
			_ = token.cancelled() => break,
			frame = frames.recv() => match frame {
				Some(frame) => frame,
				None => break,
			},
		};
		if let Err(e) = write_frame(&mut writer, &frame).await {
			tracing::warn!(error = %e, "debugger.write_failed");
			break;
		}
	}
	let _ = writer.shutdown().await;
}

struct ReadContext {
	token: GenerationToken,
	pending: PendingMap,
	clock: GenerationClock,
	events: EventSink,
	filter: StackFilter,
}

async fn read_loop(mut reader: BoxedReader, cx: ReadContext) {
	let generation = cx.token.generation();
	let mut exited = false;
	loop {
		let frame = tokio::select! {
			_ = cx.token.cancelled() => return,
			frame = read_frame(&mut reader) => frame,
		};
		match frame {
			Ok(Some(Frame::Response(response))) => {
				let waiter = cx.pending.lock().remove(&response.id);
				match waiter {
					Some(tx) => {
						let _ = tx.send(Reply::Response(response.payload));
					}
					None => tracing::debug!(id = response.id.0, "debugger.orphan_response"),
				}
			}
			Ok(Some(Frame::Event(event))) => {
				exited |= matches!(event, Event::Exited { .. });
				if cx.clock.is_current(generation) {
					cx.events.send(VmEvent::from_wire(event, generation, &cx.filter));
				}
			}
			Ok(Some(Frame::Request(_))) => tracing::warn!("debugger.unexpected_request"),
			Ok(None) => break,
			Err(e) => {
				tracing::warn!(generation, error = %e, "debugger.read_failed");
				break;
			}
		}
	}

	if cx.token.is_cancelled() {
		return;
	}
	cx.token.cancel();
	if !exited && cx.clock.is_current(generation) {
		cx.events.send(VmEvent::Terminated { generation, code: None });
	}
	let resolved = resolve_all(&cx.pending, || Reply::Terminated);
	tracing::info!(generation, resolved, "debugger.vm_terminated");
}

#[cfg(test)]
mod tests;
