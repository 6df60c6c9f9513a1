use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};
use tokio::task::JoinHandle;

use super::*;
use crate::host::{CONSOLE, STRING_BUILDER, ScratchHost, THREAD};
use crate::value::Value;
use crate::wire::{ErrorCode, OutputStream, RequestId};

struct Client {
	reader: ReadHalf<DuplexStream>,
	writer: WriteHalf<DuplexStream>,
	agent: JoinHandle<std::io::Result<()>>,
}

impl Client {
	fn start(host: ScratchHost, events: mpsc::UnboundedReceiver<Event>) -> Self {
		let (ide, vm) = duplex(4096);
		let (vm_reader, vm_writer) = split(vm);
		let agent = tokio::spawn(serve(Arc::new(host), vm_reader, vm_writer, events));
		let (reader, writer) = split(ide);
		Self { reader, writer, agent }
	}

	async fn send(&mut self, id: u64, payload: RequestPayload) {
		let frame = Frame::Request(Request { id: RequestId(id), payload });
		write_frame(&mut self.writer, &frame).await.unwrap();
	}

	async fn recv(&mut self) -> Frame {
		let frame = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut self.reader)).await;
		frame.unwrap().unwrap().unwrap()
	}
}

fn quiet() -> mpsc::UnboundedReceiver<Event> {
	mpsc::unbounded_channel().1
}

fn response(id: u64, payload: ResponsePayload) -> Frame {
	Frame::Response(Response { id: RequestId(id), payload })
}

#[tokio::test]
async fn test_requests_are_answered_by_id() {
	let mut client = Client::start(ScratchHost::new(), quiet());
	client.send(1, RequestPayload::Ping).await;
	assert_eq!(client.recv().await, response(1, ResponsePayload::Pong));

	client
		.send(
			2,
			RequestPayload::Instantiate {
				class_name: STRING_BUILDER.into(),
				args: vec![Value::Str("x".into())],
			},
		)
		.await;
	let Frame::Response(Response {
		id,
		payload: ResponsePayload::Created(handle),
	}) = client.recv().await
	else {
		panic!("expected a created object");
	};
	assert_eq!(id, RequestId(2));
	assert_eq!(handle.class_name, STRING_BUILDER);

	client
		.send(
			3,
			RequestPayload::GetField {
				object: handle.id,
				field: "missing".into(),
			},
		)
		.await;
	let Frame::Response(Response {
		payload: ResponsePayload::Error(error),
		..
	}) = client.recv().await
	else {
		panic!("expected an error");
	};
	assert_eq!(error.code, ErrorCode::NoSuchField);
}

#[tokio::test]
async fn test_blocked_call_does_not_stall_other_requests() {
	let mut client = Client::start(ScratchHost::new(), quiet());
	client
		.send(
			1,
			RequestPayload::Invoke {
				target: InvokeTarget::Class(THREAD.into()),
				method: MethodSignature::new("sleep", ["long"], "void"),
				args: vec![Value::Long(60_000)],
			},
		)
		.await;
	client.send(2, RequestPayload::Ping).await;
	assert_eq!(client.recv().await, response(2, ResponsePayload::Pong));

	client.send(3, RequestPayload::Shutdown).await;
	assert_eq!(client.recv().await, response(3, ResponsePayload::ShuttingDown));
	let served = tokio::time::timeout(Duration::from_secs(5), client.agent).await;
	assert!(served.unwrap().unwrap().is_ok());
}

#[tokio::test]
async fn test_events_are_forwarded_between_responses() {
	let (tx, rx) = mpsc::unbounded_channel();
	let mut client = Client::start(ScratchHost::new().with_output(tx.clone()), rx);

	client
		.send(
			1,
			RequestPayload::Invoke {
				target: InvokeTarget::Class(CONSOLE.into()),
				method: MethodSignature::new("print", ["String"], "void"),
				args: vec![Value::Str("hello".into())],
			},
		)
		.await;
	let mut frames = vec![client.recv().await, client.recv().await];
	frames.sort_by_key(|f| matches!(f, Frame::Response(_)));
	assert_eq!(
		frames,
		vec![
			Frame::Event(Event::Output {
				stream: OutputStream::Stdout,
				text: "hello".into(),
			}),
			response(1, ResponsePayload::ReturnedVoid),
		]
	);

	tx.send(Event::Exited { code: 0 }).unwrap();
	assert_eq!(client.recv().await, Frame::Event(Event::Exited { code: 0 }));
}

#[tokio::test]
async fn test_closed_connection_ends_serve() {
	let client = Client::start(ScratchHost::new(), quiet());
	drop(client.reader);
	drop(client.writer);
	let served = tokio::time::timeout(Duration::from_secs(5), client.agent).await;
	assert!(served.is_ok());
}
