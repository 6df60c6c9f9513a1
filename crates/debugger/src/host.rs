//! A small in-process host for `bramble vm-agent`.
//!
//! It models a handful of JDK classes well enough to exercise the bridge end to
//! end: object creation, instance and static calls, field reads, thrown
//! exceptions, blocking calls and console output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::agent::{HostError, VmHost};
use crate::exception::{ExceptionInfo, StackFrame};
use crate::value::{MethodSignature, ObjectHandle, ObjectId, RemoteValue, Value};
use crate::wire::{ErrorCode, Event, InvokeTarget, OutputStream, RemoteError};

pub const OBJECT: &str = "java.lang.Object";
pub const STRING_BUILDER: &str = "java.lang.StringBuilder";
pub const ARRAY_LIST: &str = "java.util.ArrayList";
pub const INTEGER: &str = "java.lang.Integer";
pub const THREAD: &str = "java.lang.Thread";
pub const CONSOLE: &str = "bramble.runtime.Console";

#[derive(Debug)]
enum Scratch {
	Plain,
	Builder(String),
	List(Vec<RemoteValue>),
}

impl Scratch {
	const fn class_name(&self) -> &'static str {
		match self {
			Self::Plain => OBJECT,
			Self::Builder(_) => STRING_BUILDER,
			Self::List(_) => ARRAY_LIST,
		}
	}
}

#[derive(Debug, Default)]
pub struct ScratchHost {
	objects: Mutex<FxHashMap<ObjectId, Scratch>>,
	next_id: AtomicU64,
	output: Option<mpsc::UnboundedSender<Event>>,
}

impl ScratchHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Routes console output into `events`.
	pub fn with_output(mut self, events: mpsc::UnboundedSender<Event>) -> Self {
		self.output = Some(events);
		self
	}

	pub fn live_objects(&self) -> usize {
		self.objects.lock().len()
	}

	fn store(&self, object: Scratch) -> ObjectHandle {
		let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
		let class_name = object.class_name().to_owned();
		self.objects.lock().insert(id, object);
		ObjectHandle { id, class_name }
	}

	fn invoke_static(&self, class_name: &str, method: &MethodSignature, args: &[RemoteValue]) -> Result<StaticCall, HostError> {
		Ok(match (class_name, method.name.as_str(), args) {
			(INTEGER, "parseInt", [Value::Str(s)]) => match s.trim().parse::<i32>() {
				Ok(n) => StaticCall::Done(Some(Value::Int(n))),
				Err(_) => {
					return Err(thrown(
						"java.lang.NumberFormatException",
						format!("For input string: \"{s}\""),
						StackFrame::new(INTEGER, "parseInt"),
					));
				}
			},
			(THREAD, "sleep", [Value::Long(ms)]) => StaticCall::Sleep(Duration::from_millis((*ms).max(0) as u64)),
			(THREAD, "sleep", [Value::Int(ms)]) => StaticCall::Sleep(Duration::from_millis((*ms).max(0) as u64)),
			(CONSOLE, "print", [value]) => {
				if let Some(output) = &self.output {
					let _ = output.send(Event::Output {
						stream: OutputStream::Stdout,
						text: java_text(value),
					});
				}
				StaticCall::Done(None)
			}
			(INTEGER | THREAD | CONSOLE, _, _) => return Err(no_such_method(class_name, method)),
			_ => return Err(RemoteError::new(ErrorCode::UnknownClass, class_name).into()),
		})
	}

	fn invoke_instance(&self, id: ObjectId, method: &MethodSignature, args: Vec<RemoteValue>) -> Result<Option<RemoteValue>, HostError> {
		let mut objects = self.objects.lock();
		let object = objects.get_mut(&id).ok_or_else(|| unknown_object(id))?;
		let class_name = object.class_name();
		let this = || {
			Value::Object(ObjectHandle {
				id,
				class_name: class_name.to_owned(),
			})
		};
		let value = match (object, method.name.as_str(), &args[..]) {
			(_, "hashCode", []) => Value::Int(id.0 as i32),
			(Scratch::Plain, "toString", []) => Value::Str(format!("{class_name}@{:x}", id.0)),
			(Scratch::Builder(text), "append", [value]) => {
				text.push_str(&java_text(value));
				this()
			}
			(Scratch::Builder(text), "toString", []) => Value::Str(text.clone()),
			(Scratch::Builder(text), "length", []) => Value::Int(text.chars().count() as i32),
			(Scratch::List(items), "add", [item]) => {
				items.push(item.clone());
				Value::Bool(true)
			}
			(Scratch::List(items), "size", []) => Value::Int(items.len() as i32),
			(Scratch::List(items), "get", [Value::Int(index)]) => {
				let index = *index;
				match usize::try_from(index).ok().and_then(|i| items.get(i)) {
					Some(item) => item.clone(),
					None => {
						return Err(thrown(
							"java.lang.IndexOutOfBoundsException",
							format!("Index {index} out of bounds for length {}", items.len()),
							StackFrame::new(ARRAY_LIST, "get"),
						));
					}
				}
			}
			(Scratch::List(items), "clear", []) => {
				items.clear();
				return Ok(None);
			}
			_ => return Err(no_such_method(class_name, method)),
		};
		Ok(Some(value))
	}
}

enum StaticCall {
	Done(Option<RemoteValue>),
	Sleep(Duration),
}

#[async_trait]
impl VmHost for ScratchHost {
	async fn instantiate(&self, class_name: &str, args: Vec<RemoteValue>) -> Result<ObjectHandle, HostError> {
		let object = match (class_name, &args[..]) {
			(OBJECT, []) => Scratch::Plain,
			(STRING_BUILDER, []) => Scratch::Builder(String::new()),
			(STRING_BUILDER, [Value::Str(s)]) => Scratch::Builder(s.clone()),
			(ARRAY_LIST, []) => Scratch::List(Vec::new()),
			(OBJECT | STRING_BUILDER | ARRAY_LIST, _) => {
				return Err(RemoteError::new(ErrorCode::InvalidArgs, format!("no matching constructor for {class_name}")).into());
			}
			_ => return Err(RemoteError::new(ErrorCode::UnknownClass, class_name).into()),
		};
		Ok(self.store(object))
	}

	async fn invoke(&self, target: InvokeTarget, method: &MethodSignature, args: Vec<RemoteValue>) -> Result<Option<RemoteValue>, HostError> {
		match target {
			InvokeTarget::Object(id) => self.invoke_instance(id, method, args),
			InvokeTarget::Class(class_name) => match self.invoke_static(&class_name, method, &args)? {
				StaticCall::Done(value) => Ok(value),
				StaticCall::Sleep(duration) => {
					tokio::time::sleep(duration).await;
					Ok(None)
				}
			},
		}
	}

	async fn get_field(&self, object: ObjectId, field: &str) -> Result<RemoteValue, HostError> {
		let objects = self.objects.lock();
		match (objects.get(&object), field) {
			(None, _) => Err(unknown_object(object)),
			(Some(Scratch::Builder(text)), "count") => Ok(Value::Int(text.chars().count() as i32)),
			(Some(Scratch::List(items)), "size") => Ok(Value::Int(items.len() as i32)),
			(Some(other), _) => Err(RemoteError::new(ErrorCode::NoSuchField, format!("{}.{field}", other.class_name())).into()),
		}
	}

	async fn release(&self, object: ObjectId) -> Result<(), HostError> {
		self.objects.lock().remove(&object).map(drop).ok_or_else(|| unknown_object(object))
	}
}

fn java_text(value: &RemoteValue) -> String {
	match value {
		Value::Str(s) => s.clone(),
		Value::Char(c) => c.to_string(),
		Value::Long(n) => n.to_string(),
		Value::Float(n) => n.to_string(),
		Value::Object(handle) => format!("{}@{:x}", handle.class_name, handle.id.0),
		other => other.to_string(),
	}
}

fn thrown(class_name: &str, message: String, origin: StackFrame) -> HostError {
	HostError::Threw(ExceptionInfo::new(class_name, Some(message)).with_stack(vec![
		origin,
		StackFrame::new("jdk.internal.reflect.DirectMethodHandleAccessor", "invoke"),
		StackFrame::new("bramble.runtime.Invoker", "run"),
	]))
}

fn unknown_object(id: ObjectId) -> HostError {
	RemoteError::new(ErrorCode::UnknownObject, format!("object {}", id.0)).into()
}

fn no_such_method(class_name: &str, method: &MethodSignature) -> HostError {
	RemoteError::new(ErrorCode::NoSuchMethod, format!("{class_name}: {method}")).into()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sig(name: &str, params: &[&str]) -> MethodSignature {
		MethodSignature::new(name, params.iter().copied(), "Object")
	}

	#[tokio::test]
	async fn test_builder_appends_and_reports_count() {
		let host = ScratchHost::new();
		let sb = host.instantiate(STRING_BUILDER, vec![Value::Str("ab".into())]).await.unwrap();
		let this = host.invoke(InvokeTarget::Object(sb.id), &sig("append", &["int"]), vec![Value::Int(3)]).await.unwrap();
		assert_eq!(this, Some(Value::Object(sb.clone())));
		let text = host.invoke(InvokeTarget::Object(sb.id), &sig("toString", &[]), vec![]).await.unwrap();
		assert_eq!(text, Some(Value::Str("ab3".into())));
		assert_eq!(host.get_field(sb.id, "count").await, Ok(Value::Int(3)));
	}

	#[tokio::test]
	async fn test_list_index_out_of_bounds_throws() {
		let host = ScratchHost::new();
		let list = host.instantiate(ARRAY_LIST, vec![]).await.unwrap();
		let target = || InvokeTarget::Object(list.id);
		host.invoke(target(), &sig("add", &["Object"]), vec![Value::Null]).await.unwrap();
		let Err(HostError::Threw(info)) = host.invoke(target(), &sig("get", &["int"]), vec![Value::Int(4)]).await else {
			panic!("expected an exception");
		};
		assert_eq!(info.class_name, "java.lang.IndexOutOfBoundsException");
		assert_eq!(info.message.as_deref(), Some("Index 4 out of bounds for length 1"));
	}

	#[tokio::test]
	async fn test_unknown_class_and_released_object() {
		let host = ScratchHost::new();
		let Err(HostError::Failed(e)) = host.instantiate("Missing", vec![]).await else {
			panic!("expected failure");
		};
		assert_eq!(e.code, ErrorCode::UnknownClass);

		let obj = host.instantiate(OBJECT, vec![]).await.unwrap();
		assert_eq!(host.live_objects(), 1);
		host.release(obj.id).await.unwrap();
		assert_eq!(host.live_objects(), 0);
		let Err(HostError::Failed(e)) = host.get_field(obj.id, "x").await else {
			panic!("expected failure");
		};
		assert_eq!(e.code, ErrorCode::UnknownObject);
	}

	#[tokio::test]
	async fn test_console_print_emits_output() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let host = ScratchHost::new().with_output(tx);
		let done = host
			.invoke(InvokeTarget::Class(CONSOLE.into()), &sig("print", &["String"]), vec![Value::Str("hi".into())])
			.await;
		assert_eq!(done, Ok(None));
		assert_eq!(
			rx.try_recv().ok(),
			Some(Event::Output {
				stream: OutputStream::Stdout,
				text: "hi".into()
			})
		);
	}
}
