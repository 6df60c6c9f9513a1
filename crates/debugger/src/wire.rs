//! Frames exchanged between the IDE process and the execution VM.
//!
//! Every frame is a postcard body preceded by its length as a little-endian
//! `u32`. Bodies above [`MAX_FRAME_LEN`] are rejected on both sides.

use std::io::{Error as IoError, ErrorKind};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::exception::ExceptionInfo;
use crate::value::{MethodSignature, ObjectHandle, ObjectId, RemoteValue};

/// Largest accepted frame body in bytes.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Correlates a response with its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
	/// Sent by the IDE.
	Request(Request),
	/// Sent by the VM, one per request.
	Response(Response),
	/// Sent by the VM unprompted.
	Event(Event),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	pub id: RequestId,
	pub payload: RequestPayload,
}

/// Receiver of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeTarget {
	Object(ObjectId),
	/// Static method of the named class.
	Class(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestPayload {
	Ping,
	Instantiate {
		class_name: String,
		args: Vec<RemoteValue>,
	},
	Invoke {
		target: InvokeTarget,
		method: MethodSignature,
		args: Vec<RemoteValue>,
	},
	GetField {
		object: ObjectId,
		field: String,
	},
	Release {
		object: ObjectId,
	},
	Shutdown,
}

impl RequestPayload {
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Ping => "ping",
			Self::Instantiate { .. } => "instantiate",
			Self::Invoke { .. } => "invoke",
			Self::GetField { .. } => "get_field",
			Self::Release { .. } => "release",
			Self::Shutdown => "shutdown",
		}
	}

	/// Requests that execute user code and may therefore run indefinitely.
	pub const fn runs_user_code(&self) -> bool {
		matches!(self, Self::Instantiate { .. } | Self::Invoke { .. })
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	pub id: RequestId,
	pub payload: ResponsePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
	Pong,
	Returned(RemoteValue),
	ReturnedVoid,
	Created(ObjectHandle),
	/// User code threw.
	Threw(ExceptionInfo),
	Field(RemoteValue),
	Released,
	ShuttingDown,
	/// The request itself was invalid.
	Error(RemoteError),
}

/// Failure of a request that never reached user code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct RemoteError {
	pub code: ErrorCode,
	pub message: String,
}

impl RemoteError {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
	UnknownObject,
	UnknownClass,
	NoSuchMethod,
	NoSuchField,
	InvalidArgs,
	Internal,
}

/// Where a thread stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	pub thread: String,
	pub class_name: String,
	pub method: String,
	pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStream {
	Stdout,
	Stderr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
	Breakpoint(Location),
	Step(Location),
	/// Uncaught exception on a user thread.
	Exception(ExceptionInfo),
	Output { stream: OutputStream, text: String },
	Exited { code: i32 },
}

fn invalid(message: impl Into<String>) -> IoError {
	IoError::new(ErrorKind::InvalidData, message.into())
}

/// Writes one length-prefixed frame and flushes.
pub async fn write_frame<W: AsyncWrite + Unpin + ?Sized>(writer: &mut W, frame: &Frame) -> std::io::Result<()> {
	let buf = postcard::to_allocvec(frame).map_err(|e| invalid(e.to_string()))?;
	let len = u32::try_from(buf.len())
		.ok()
		.filter(|len| *len <= MAX_FRAME_LEN)
		.ok_or_else(|| invalid(format!("frame of {} bytes exceeds limit", buf.len())))?;
	writer.write_u32_le(len).await?;
	writer.write_all(&buf).await?;
	writer.flush().await
}

/// Reads one frame. Returns `None` when the stream ends between frames.
pub async fn read_frame<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> std::io::Result<Option<Frame>> {
	let len = match reader.read_u32_le().await {
		Ok(len) => len,
		Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
		Err(e) => return Err(e),
	};
	if len > MAX_FRAME_LEN {
		return Err(invalid(format!("frame of {len} bytes exceeds limit")));
	}
	let mut buf = vec![0u8; len as usize];
	reader.read_exact(&mut buf).await?;
	postcard::from_bytes(&buf).map(Some).map_err(|e| invalid(e.to_string()))
}
