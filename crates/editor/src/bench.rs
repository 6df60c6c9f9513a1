//! Named objects living in the execution VM.

use bramble_debugger::RemoteObjectRef;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
	#[error("an object named {0} is already on the bench")]
	DuplicateName(String),

	#[error("{object} belongs to VM generation {}, the bench holds generation {bench}", object.generation())]
	Stale { object: RemoteObjectRef, bench: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchEntry {
	pub name: String,
	pub object: RemoteObjectRef,
}

/// Objects the user created, in creation order.
///
/// Every entry belongs to the current VM generation. A reset empties the
/// bench, since none of its objects exist any more.
#[derive(Debug, Default)]
pub struct ObjectBench {
	entries: Vec<BenchEntry>,
	generation: u64,
}

impl ObjectBench {
	pub fn new() -> Self {
		Self::default()
	}

	/// Generation of the VM the bench currently mirrors.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &BenchEntry> {
		self.entries.iter()
	}

	pub fn get(&self, name: &str) -> Option<&RemoteObjectRef> {
		self.entries.iter().find(|e| e.name == name).map(|e| &e.object)
	}

	/// Puts `object` on the bench under `name`.
	///
	/// Objects from an older generation are rejected. The first object from a
	/// newer generation clears whatever the bench still holds.
	pub fn add(&mut self, name: impl Into<String>, object: RemoteObjectRef) -> Result<(), BenchError> {
		let name = name.into();
		if object.generation() < self.generation {
			return Err(BenchError::Stale {
				object,
				bench: self.generation,
			});
		}
		if object.generation() > self.generation {
			self.clear_for(object.generation());
		}
		if self.get(&name).is_some() {
			return Err(BenchError::DuplicateName(name));
		}
		tracing::debug!(%name, %object, "bench.add");
		self.entries.push(BenchEntry { name, object });
		Ok(())
	}

	pub fn remove(&mut self, name: &str) -> Option<RemoteObjectRef> {
		let idx = self.entries.iter().position(|e| e.name == name)?;
		Some(self.entries.remove(idx).object)
	}

	/// Drops every entry and moves the bench to `generation`.
	pub fn clear_for(&mut self, generation: u64) {
		if !self.entries.is_empty() {
			tracing::debug!(dropped = self.entries.len(), generation, "bench.cleared");
		}
		self.entries.clear();
		self.generation = generation;
	}

	/// Suggests a free name for a new instance of `class_name`.
	///
	/// The simple class name with a lower-case first letter and a counter:
	/// `java.lang.StringBuilder` becomes `stringBuilder1`.
	pub fn suggest_name(&self, class_name: &str) -> String {
		let simple = class_name.rsplit(['.', '$']).next().unwrap_or(class_name);
		let simple = simple.split('<').next().unwrap_or(simple);
		let mut chars = simple.chars();
		let stem: String = match chars.next() {
			Some(first) => first.to_lowercase().chain(chars).collect(),
			None => "object".to_owned(),
		};
		(1..)
			.map(|n| format!("{stem}{n}"))
			.find(|name| self.get(name).is_none())
			.unwrap_or(stem)
	}
}
