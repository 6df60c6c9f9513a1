use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an object inside one execution VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Wire form of an object living in the execution VM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
	pub id: ObjectId,
	pub class_name: String,
}

/// IDE-side reference to an object in the execution VM.
///
/// Holds no pointer into the VM, only the object's id and the VM generation it
/// was minted in. A reference from an older generation is never sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObjectRef {
	class_name: String,
	id: ObjectId,
	generation: u64,
}

impl RemoteObjectRef {
	pub fn new(class_name: impl Into<String>, id: ObjectId, generation: u64) -> Self {
		Self {
			class_name: class_name.into(),
			id,
			generation,
		}
	}

	pub fn class_name(&self) -> &str {
		&self.class_name
	}

	pub const fn id(&self) -> ObjectId {
		self.id
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}
}

impl fmt::Display for RemoteObjectRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.class_name, self.id.0)
	}
}

/// A Java value. Primitives and strings travel inline; objects are referenced.
///
/// On the wire objects are [`ObjectHandle`]s ([`RemoteValue`]); the bridge
/// stamps them with the current generation before handing them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value<O = RemoteObjectRef> {
	Null,
	Bool(bool),
	Char(char),
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Str(String),
	Object(O),
}

/// Value as carried by frames.
pub type RemoteValue = Value<ObjectHandle>;

impl<O> Value<O> {
	/// Rewrites the object payload, leaving every other variant untouched.
	pub fn map_object<P>(self, f: impl FnOnce(O) -> P) -> Value<P> {
		match self.try_map_object(|o| Ok::<_, std::convert::Infallible>(f(o))) {
			Ok(value) => value,
			Err(never) => match never {},
		}
	}

	pub fn try_map_object<P, E>(self, f: impl FnOnce(O) -> Result<P, E>) -> Result<Value<P>, E> {
		Ok(match self {
			Self::Null => Value::Null,
			Self::Bool(v) => Value::Bool(v),
			Self::Char(v) => Value::Char(v),
			Self::Byte(v) => Value::Byte(v),
			Self::Short(v) => Value::Short(v),
			Self::Int(v) => Value::Int(v),
			Self::Long(v) => Value::Long(v),
			Self::Float(v) => Value::Float(v),
			Self::Double(v) => Value::Double(v),
			Self::Str(v) => Value::Str(v),
			Self::Object(o) => Value::Object(f(o)?),
		})
	}

	pub fn as_object(&self) -> Option<&O> {
		match self {
			Self::Object(o) => Some(o),
			_ => None,
		}
	}

	/// Java type name of a primitive or string; `None` for null and objects.
	pub fn primitive_type(&self) -> Option<&'static str> {
		Some(match self {
			Self::Bool(_) => "boolean",
			Self::Char(_) => "char",
			Self::Byte(_) => "byte",
			Self::Short(_) => "short",
			Self::Int(_) => "int",
			Self::Long(_) => "long",
			Self::Float(_) => "float",
			Self::Double(_) => "double",
			Self::Str(_) => "java.lang.String",
			Self::Null | Self::Object(_) => return None,
		})
	}
}

impl<O: fmt::Display> fmt::Display for Value<O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(v) => write!(f, "{v}"),
			Self::Char(v) => write!(f, "'{}'", v.escape_default()),
			Self::Byte(v) => write!(f, "{v}"),
			Self::Short(v) => write!(f, "{v}"),
			Self::Int(v) => write!(f, "{v}"),
			Self::Long(v) => write!(f, "{v}L"),
			Self::Float(v) => write!(f, "{v}f"),
			Self::Double(v) => write!(f, "{v}"),
			Self::Str(v) => write!(f, "\"{}\"", v.escape_default()),
			Self::Object(o) => write!(f, "<{o}>"),
		}
	}
}

impl fmt::Display for ObjectHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.class_name, self.id.0)
	}
}

/// Method selected for invocation: name, parameter types, return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
	pub name: String,
	pub params: Vec<String>,
	pub returns: String,
}

impl MethodSignature {
	pub fn new<P: Into<String>>(name: impl Into<String>, params: impl IntoIterator<Item = P>, returns: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			params: params.into_iter().map(Into::into).collect(),
			returns: returns.into(),
		}
	}

	pub fn is_void(&self) -> bool {
		self.returns == "void"
	}

	pub fn arity(&self) -> usize {
		self.params.len()
	}
}

impl fmt::Display for MethodSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}({})", self.returns, self.name, self.params.join(", "))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_matches_java_literals() {
		let values: Vec<Value<ObjectHandle>> = vec![
			Value::Null,
			Value::Char('\n'),
			Value::Long(3),
			Value::Str("a\"b".into()),
			Value::Object(ObjectHandle {
				id: ObjectId(7),
				class_name: "Point".into(),
			}),
		];
		let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
		assert_eq!(shown, ["null", "'\\n'", "3L", "\"a\\\"b\"", "<Point#7>"]);
	}

	#[test]
	fn test_map_object_stamps_generation() {
		let wire = RemoteValue::Object(ObjectHandle {
			id: ObjectId(1),
			class_name: "A".into(),
		});
		let value = wire.map_object(|h| RemoteObjectRef::new(h.class_name, h.id, 4));
		assert_eq!(value.as_object().map(RemoteObjectRef::generation), Some(4));
		assert_eq!(Value::<ObjectHandle>::Int(2).map_object(|h| h.id), Value::Int(2));
	}

	#[test]
	fn test_signature_display() {
		let sig = MethodSignature::new("add", ["int", "int"], "int");
		assert_eq!(sig.to_string(), "int add(int, int)");
		assert_eq!(sig.arity(), 2);
		assert!(MethodSignature::new("run", Vec::<String>::new(), "void").is_void());
	}
}
