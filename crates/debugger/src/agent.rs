//! VM-side request loop.
//!
//! [`serve`] reads requests from the IDE and answers each one from its own
//! task, so user code that never returns blocks neither events nor other
//! requests. Dropping the connection or sending `Shutdown` ends the loop and
//! aborts whatever user code is still running.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::exception::ExceptionInfo;
use crate::value::{MethodSignature, ObjectHandle, ObjectId, RemoteValue};
use crate::wire::{Event, Frame, InvokeTarget, RemoteError, Request, RequestPayload, Response, ResponsePayload, read_frame, write_frame};

/// Why a host operation produced no value.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
	/// User code threw.
	Threw(ExceptionInfo),
	/// The request was invalid for this VM.
	Failed(RemoteError),
}

impl From<RemoteError> for HostError {
	fn from(e: RemoteError) -> Self {
		Self::Failed(e)
	}
}

/// Executes requests inside the VM.
#[async_trait]
pub trait VmHost: Send + Sync + 'static {
	async fn instantiate(&self, class_name: &str, args: Vec<RemoteValue>) -> Result<ObjectHandle, HostError>;

	/// Returns `None` for void methods.
	async fn invoke(&self, target: InvokeTarget, method: &MethodSignature, args: Vec<RemoteValue>) -> Result<Option<RemoteValue>, HostError>;

	async fn get_field(&self, object: ObjectId, field: &str) -> Result<RemoteValue, HostError>;

	async fn release(&self, object: ObjectId) -> Result<(), HostError>;
}

/// Serves one IDE connection until it closes or asks for shutdown.
///
/// `events` carries asynchronous VM events; they are forwarded as they arrive,
/// interleaved with responses.
///
/// # Errors
///
/// Returns an error if a frame cannot be read or the writer fails.
pub async fn serve<H, R, W>(host: Arc<H>, mut reader: R, writer: W, mut events: mpsc::UnboundedReceiver<Event>) -> std::io::Result<()>
where
	H: VmHost + ?Sized,
	R: AsyncRead + Unpin,
	W: AsyncWrite + Send + Unpin + 'static,
{
	let (out_tx, out_rx) = mpsc::unbounded_channel::<Frame>();
	let writer_task = tokio::spawn(write_frames(writer, out_rx));

	let forward_tx = out_tx.clone();
	let forward = tokio::spawn(async move {
		while let Some(event) = events.recv().await {
			if forward_tx.send(Frame::Event(event)).is_err() {
				break;
			}
		}
	});

	let mut calls = JoinSet::new();
	let result = loop {
		let frame = match read_frame(&mut reader).await {
			Ok(Some(frame)) => frame,
			Ok(None) => break Ok(()),
			Err(e) => break Err(e),
		};
		let Frame::Request(Request { id, payload }) = frame else {
			tracing::warn!("agent.unexpected_frame");
			continue;
		};
		tracing::debug!(id = id.0, request = payload.name(), "agent.request");
		if matches!(payload, RequestPayload::Shutdown) {
			let _ = out_tx.send(Frame::Response(Response {
				id,
				payload: ResponsePayload::ShuttingDown,
			}));
			break Ok(());
		}
		let host = host.clone();
		let out = out_tx.clone();
		calls.spawn(async move {
			let payload = dispatch(&*host, payload).await;
			let _ = out.send(Frame::Response(Response { id, payload }));
		});
		while calls.try_join_next().is_some() {}
	};

	tracing::debug!(running = calls.len(), "agent.closing");
	calls.shutdown().await;
	forward.abort();
	let _ = forward.await;
	drop(out_tx);
	let written = writer_task.await.map_err(std::io::Error::other)?;
	result.and(written)
}

async fn dispatch<H: VmHost + ?Sized>(host: &H, payload: RequestPayload) -> ResponsePayload {
	let result = match payload {
		RequestPayload::Ping => return ResponsePayload::Pong,
		RequestPayload::Shutdown => return ResponsePayload::ShuttingDown,
		RequestPayload::Instantiate { class_name, args } => host.instantiate(&class_name, args).await.map(ResponsePayload::Created),
		RequestPayload::Invoke { target, method, args } => host
			.invoke(target, &method, args)
			.await
			.map(|value| value.map_or(ResponsePayload::ReturnedVoid, ResponsePayload::Returned)),
		RequestPayload::GetField { object, field } => host.get_field(object, &field).await.map(ResponsePayload::Field),
		RequestPayload::Release { object } => host.release(object).await.map(|()| ResponsePayload::Released),
	};
	result.unwrap_or_else(|e| match e {
		HostError::Threw(info) => ResponsePayload::Threw(info),
		HostError::Failed(error) => ResponsePayload::Error(error),
	})
}

async fn write_frames<W: AsyncWrite + Unpin>(mut writer: W, mut frames: mpsc::UnboundedReceiver<Frame>) -> std::io::Result<()> {
	while let Some(frame) = frames.recv().await {
		write_frame(&mut writer, &frame).await?;
	}
	writer.shutdown().await
}

#[cfg(test)]
mod tests;
