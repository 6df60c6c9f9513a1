use std::sync::atomic::AtomicUsize;

use pretty_assertions::assert_eq;
use tokio::io::{DuplexStream, duplex, split};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::*;
use crate::agent::serve;
use crate::events::EventQueue;
use crate::host::{CONSOLE, INTEGER, OBJECT, STRING_BUILDER, ScratchHost, THREAD};
use crate::launcher::LaunchFuture;
use crate::wire::{ErrorCode, Location};

const WAIT: Duration = Duration::from_secs(5);

/// Runs a [`ScratchHost`] agent per launch on an in-memory pipe.
#[derive(Default)]
struct AgentLauncher {
	launches: AtomicUsize,
	vm_events: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
	agents: Mutex<Vec<JoinHandle<std::io::Result<()>>>>,
}

impl AgentLauncher {
	fn launches(&self) -> usize {
		self.launches.load(Ordering::SeqCst)
	}

	fn emit(&self, event: Event) {
		let senders = self.vm_events.lock();
		senders.last().unwrap().send(event).unwrap();
	}

	fn take_agent(&self) -> JoinHandle<std::io::Result<()>> {
		self.agents.lock().pop().unwrap()
	}
}

impl VmLauncher for AgentLauncher {
	fn launch(&self, _generation: u64) -> LaunchFuture<'_> {
		Box::pin(async move {
			self.launches.fetch_add(1, Ordering::SeqCst);
			let (ide, vm) = duplex(64 * 1024);
			let (tx, rx) = mpsc::unbounded_channel();
			let host = Arc::new(ScratchHost::new().with_output(tx.clone()));
			let (vm_reader, vm_writer) = split(vm);
			self.agents.lock().push(tokio::spawn(serve(host, vm_reader, vm_writer, rx)));
			self.vm_events.lock().push(tx);
			let (reader, writer) = split(ide);
			Ok(VmConnection::new(reader, writer))
		})
	}
}

/// A VM that accepts frames and never answers.
#[derive(Default)]
struct SilentLauncher {
	peers: Mutex<Vec<DuplexStream>>,
}

impl VmLauncher for SilentLauncher {
	fn launch(&self, _generation: u64) -> LaunchFuture<'_> {
		Box::pin(async move {
			let (ide, vm) = duplex(64 * 1024);
			self.peers.lock().push(vm);
			let (reader, writer) = split(ide);
			Ok(VmConnection::new(reader, writer))
		})
	}
}

/// A VM that crashes on its first request.
struct DyingLauncher;

impl VmLauncher for DyingLauncher {
	fn launch(&self, _generation: u64) -> LaunchFuture<'_> {
		Box::pin(async move {
			let (ide, mut vm) = duplex(64 * 1024);
			tokio::spawn(async move {
				let _ = read_frame(&mut vm).await;
				drop(vm);
			});
			let (reader, writer) = split(ide);
			Ok(VmConnection::new(reader, writer))
		})
	}
}

fn bridge_with(launcher: Arc<dyn VmLauncher>, options: BridgeOptions) -> (Arc<DebuggerBridge>, EventQueue) {
	let (sink, queue) = EventQueue::new();
	(Arc::new(DebuggerBridge::new(launcher, options, sink)), queue)
}

fn agent_bridge() -> (Arc<DebuggerBridge>, EventQueue, Arc<AgentLauncher>) {
	let launcher = Arc::new(AgentLauncher::default());
	let (bridge, queue) = bridge_with(launcher.clone(), BridgeOptions::default());
	(bridge, queue, launcher)
}

fn sig(name: &str, params: &[&str], returns: &str) -> MethodSignature {
	MethodSignature::new(name, params.iter().copied(), returns)
}

async fn created(bridge: &DebuggerBridge, class_name: &str, args: Vec<Value>) -> RemoteObjectRef {
	match bridge.instantiate(class_name, args).await {
		Ok(NewObject::Created(object)) => object,
		other => panic!("expected {class_name} instance, got {other:?}"),
	}
}

async fn wait_in_flight(bridge: &DebuggerBridge, count: usize) {
	timeout(WAIT, async {
		while bridge.in_flight() != count {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.unwrap();
}

#[tokio::test]
async fn test_create_call_and_read_field() {
	let (bridge, mut events, _launcher) = agent_bridge();
	assert_eq!(bridge.start().await.unwrap(), 1);
	assert_eq!(bridge.start().await.unwrap(), 1);

	let sb = created(&bridge, STRING_BUILDER, vec![Value::Str("ab".into())]).await;
	assert_eq!(sb.generation(), 1);
	let appended = bridge
		.invoke(CallTarget::Object(&sb), &sig("append", &["String"], STRING_BUILDER), vec![Value::Str("c".into())])
		.await
		.unwrap();
	assert_eq!(appended, InvokeOutcome::Normal(Value::Object(sb.clone())));
	assert_eq!(bridge.get_field(&sb, "count").await.unwrap(), Value::Int(3));

	bridge.release(&sb).await.unwrap();
	match bridge.get_field(&sb, "count").await {
		Err(BridgeError::Remote(e)) => assert_eq!(e.code, ErrorCode::UnknownObject),
		other => panic!("expected remote error, got {other:?}"),
	}
	assert_eq!(bridge.in_flight(), 0);
	assert_eq!(events.drain_now(), vec![VmEvent::Started { generation: 1 }]);
}

#[tokio::test]
async fn test_exception_frames_are_filtered() {
	let (bridge, _events, _launcher) = agent_bridge();
	bridge.start().await.unwrap();

	let outcome = bridge
		.invoke(CallTarget::Class(INTEGER), &sig("parseInt", &["String"], "int"), vec![Value::Str("x".into())])
		.await
		.unwrap();
	let InvokeOutcome::Exception(info) = outcome else {
		panic!("expected an exception, got {outcome:?}");
	};
	assert_eq!(info.class_name, "java.lang.NumberFormatException");
	let frames: Vec<&str> = info.stack.iter().map(|f| f.method.as_str()).collect();
	assert_eq!(frames, ["parseInt"]);

	let parsed = bridge
		.invoke(CallTarget::Class(INTEGER), &sig("parseInt", &["String"], "int"), vec![Value::Str("42".into())])
		.await
		.unwrap();
	assert_eq!(parsed, InvokeOutcome::Normal(Value::Int(42)));
}

#[tokio::test]
async fn test_reset_resolves_pending_invocation() {
	let (bridge, mut events, launcher) = agent_bridge();
	bridge.start().await.unwrap();
	let obj = created(&bridge, OBJECT, vec![]).await;

	let call = {
		let bridge = bridge.clone();
		tokio::spawn(async move {
			bridge
				.invoke(CallTarget::Class(THREAD), &sig("sleep", &["long"], "void"), vec![Value::Long(600_000)])
				.await
		})
	};
	wait_in_flight(&bridge, 1).await;

	assert_eq!(bridge.restart().await.unwrap(), 2);
	let outcome = timeout(WAIT, call).await.unwrap().unwrap();
	assert_eq!(outcome.unwrap(), InvokeOutcome::VmRestarted);

	assert!(!bridge.is_current(&obj));
	let stale = bridge.invoke(CallTarget::Object(&obj), &sig("hashCode", &[], "int"), vec![]).await;
	assert!(matches!(stale, Err(BridgeError::VmRestarted)), "{stale:?}");
	let stale_arg = bridge
		.invoke(CallTarget::Class(CONSOLE), &sig("print", &["Object"], "void"), vec![Value::Object(obj.clone())])
		.await;
	assert!(matches!(stale_arg, Err(BridgeError::VmRestarted)), "{stale_arg:?}");
	assert!(matches!(bridge.get_field(&obj, "size").await, Err(BridgeError::VmRestarted)));
	assert!(matches!(bridge.release(&obj).await, Err(BridgeError::VmRestarted)));

	bridge.ping().await.unwrap();
	let fresh = created(&bridge, OBJECT, vec![]).await;
	assert_eq!(fresh.generation(), 2);
	assert_eq!(launcher.launches(), 2);
	assert_eq!(
		events.drain_now(),
		vec![
			VmEvent::Started { generation: 1 },
			VmEvent::Reset { generation: 2 },
			VmEvent::Started { generation: 2 },
		]
	);
}

#[tokio::test]
async fn test_vm_crash_resolves_call_as_terminated() {
	let (bridge, mut events) = bridge_with(Arc::new(DyingLauncher), BridgeOptions::default());
	bridge.start().await.unwrap();

	let outcome = timeout(WAIT, bridge.invoke(CallTarget::Class(THREAD), &sig("sleep", &["long"], "void"), vec![Value::Long(1)]))
		.await
		.unwrap();
	assert_eq!(outcome.unwrap(), InvokeOutcome::VmTerminated);
	assert!(!bridge.is_running());
	assert!(matches!(bridge.ping().await, Err(BridgeError::NotRunning)));
	assert_eq!(
		events.drain_now(),
		vec![
			VmEvent::Started { generation: 1 },
			VmEvent::Terminated { generation: 1, code: None },
		]
	);

	assert_eq!(bridge.start().await.unwrap(), 2);
}

#[tokio::test]
async fn test_control_requests_time_out() {
	let options = BridgeOptions {
		request_timeout: Duration::from_millis(50),
		..BridgeOptions::default()
	};
	let (bridge, _events) = bridge_with(Arc::new(SilentLauncher::default()), options);
	bridge.start().await.unwrap();

	match bridge.ping().await {
		Err(BridgeError::Timeout { request, after }) => {
			assert_eq!(request, "ping");
			assert_eq!(after, Duration::from_millis(50));
		}
		other => panic!("expected timeout, got {other:?}"),
	}
	assert_eq!(bridge.in_flight(), 0);
	assert!(bridge.is_running());
}

#[tokio::test]
async fn test_ids_resolved_before_a_reset_are_not_sent() {
	let (bridge, _events, _launcher) = agent_bridge();
	bridge.start().await.unwrap();
	let old = created(&bridge, OBJECT, vec![]).await;
	let mut stamp = None;
	let id = bridge.resolve(&old, &mut stamp).unwrap();
	assert_eq!(stamp, Some(1));

	assert_eq!(bridge.restart().await.unwrap(), 2);
	let fresh = created(&bridge, OBJECT, vec![]).await;
	assert_eq!(fresh.id(), id);

	let sent = bridge.submit(RequestPayload::Release { object: id }, stamp);
	assert!(matches!(sent, Err(BridgeError::VmRestarted)));
	assert_eq!(bridge.in_flight(), 0);
	bridge.release(&fresh).await.unwrap();
}

#[tokio::test]
async fn test_requests_need_a_running_vm() {
	let (bridge, _events, launcher) = agent_bridge();
	assert!(matches!(bridge.ping().await, Err(BridgeError::NotRunning)));
	let not_running = bridge.instantiate(OBJECT, vec![]).await;
	assert!(matches!(not_running, Err(BridgeError::NotRunning)));
	bridge.shutdown().await.unwrap();
	assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn test_vm_events_reach_the_queue() {
	let (bridge, mut events, launcher) = agent_bridge();
	bridge.start().await.unwrap();
	assert_eq!(events.recv().await, Some(VmEvent::Started { generation: 1 }));

	let at = Location {
		thread: "main".into(),
		class_name: "Shape".into(),
		method: "area".into(),
		line: 12,
	};
	launcher.emit(Event::Breakpoint(at.clone()));
	launcher.emit(Event::Exception(
		ExceptionInfo::new("java.lang.IllegalStateException", None).with_stack(vec![
			crate::exception::StackFrame::new("Shape", "area"),
			crate::exception::StackFrame::new("bramble.runtime.Invoker", "run"),
		]),
	));

	assert_eq!(timeout(WAIT, events.recv()).await.unwrap(), Some(VmEvent::Breakpoint(at)));
	let Some(VmEvent::Exception(info)) = timeout(WAIT, events.recv()).await.unwrap() else {
		panic!("expected an exception event");
	};
	assert_eq!(info.stack.len(), 1);

	launcher.emit(Event::Exited { code: 3 });
	assert_eq!(
		timeout(WAIT, events.recv()).await.unwrap(),
		Some(VmEvent::Terminated { generation: 1, code: Some(3) })
	);
}

#[tokio::test]
async fn test_shutdown_stops_the_agent() {
	let (bridge, _events, launcher) = agent_bridge();
	bridge.start().await.unwrap();
	bridge.shutdown().await.unwrap();
	assert!(!bridge.is_running());

	let served = timeout(WAIT, launcher.take_agent()).await.unwrap().unwrap();
	assert!(served.is_ok());
	assert!(matches!(bridge.ping().await, Err(BridgeError::NotRunning)));
}
