//! Messages from background work to the UI thread.
//!
//! Invocation outcomes travel on the UI queue, VM notifications on the
//! bridge's event queue. The UI loop calls [`EventPump::drain`] between frames;
//! it never blocks, applies bench bookkeeping and hands the events back for
//! display.

use bramble_debugger::{BridgeError, EventQueue, InvokeOutcome, NewObject, VmEvent};
use bramble_worker::{HandOff, HandOffSender};

use crate::bench::{BenchError, ObjectBench};
use crate::invoke::Ticket;

#[derive(Debug)]
pub enum UiEvent {
	InvocationFinished {
		ticket: Ticket,
		outcome: Result<InvokeOutcome, BridgeError>,
	},
	ObjectCreated {
		ticket: Ticket,
		name: String,
		result: Result<NewObject, BridgeError>,
	},
	Vm(VmEvent),
}

/// Sending half of the UI queue.
pub type UiSender = HandOffSender<UiEvent>;

/// Drains the UI and VM queues on the UI thread.
#[derive(Debug)]
pub struct EventPump {
	ui: HandOff<UiEvent>,
	vm: EventQueue,
}

impl EventPump {
	pub fn new(ui: HandOff<UiEvent>, vm: EventQueue) -> Self {
		Self { ui, vm }
	}

	/// Takes everything queued so far, updating `bench` on the way.
	///
	/// VM events come first, so a reset clears the bench before objects from
	/// the new VM are added.
	pub fn drain(&mut self, bench: &mut ObjectBench) -> Vec<UiEvent> {
		let mut events: Vec<UiEvent> = self.vm.drain_now().into_iter().map(UiEvent::Vm).collect();
		events.extend(self.ui.drain_now());
		for event in &events {
			apply(event, bench);
		}
		events
	}
}

fn apply(event: &UiEvent, bench: &mut ObjectBench) {
	match event {
		UiEvent::Vm(VmEvent::Reset { generation }) => bench.clear_for(*generation),
		UiEvent::Vm(VmEvent::Started { generation }) if *generation > bench.generation() => bench.clear_for(*generation),
		UiEvent::Vm(VmEvent::Terminated { generation, .. }) if *generation == bench.generation() => bench.clear_for(*generation),
		UiEvent::ObjectCreated {
			name,
			result: Ok(NewObject::Created(object)),
			..
		} => match bench.add(name.clone(), object.clone()) {
			Ok(()) => {}
			Err(BenchError::DuplicateName(_)) => {
				let fallback = bench.suggest_name(object.class_name());
				tracing::warn!(%name, %fallback, "bench.renamed");
				if let Err(e) = bench.add(fallback, object.clone()) {
					tracing::warn!(error = %e, "bench.rejected");
				}
			}
			Err(e) => tracing::debug!(error = %e, "bench.rejected"),
		},
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use bramble_debugger::{ObjectId, RemoteObjectRef};
	use pretty_assertions::assert_eq;

	use super::*;

	fn created(name: &str, id: u64, generation: u64) -> UiEvent {
		UiEvent::ObjectCreated {
			ticket: Ticket(id),
			name: name.into(),
			result: Ok(NewObject::Created(RemoteObjectRef::new("Shape", ObjectId(id), generation))),
		}
	}

	fn names(bench: &ObjectBench) -> Vec<&str> {
		bench.iter().map(|e| e.name.as_str()).collect()
	}

	#[test]
	fn test_created_objects_land_on_the_bench() {
		let (ui_tx, ui) = HandOff::new();
		let (_vm_tx, vm) = EventQueue::new();
		let mut pump = EventPump::new(ui, vm);
		let mut bench = ObjectBench::new();
		bench.clear_for(1);

		ui_tx.send(created("shape1", 1, 1));
		ui_tx.send(created("shape1", 2, 1));
		let events = pump.drain(&mut bench);
		assert_eq!(events.len(), 2);
		assert_eq!(names(&bench), ["shape1", "shape2"]);
		assert!(pump.drain(&mut bench).is_empty());
	}

	#[test]
	fn test_reset_clears_bench_before_new_objects() {
		let (ui_tx, ui) = HandOff::new();
		let (vm_tx, vm) = EventQueue::new();
		let mut pump = EventPump::new(ui, vm);
		let mut bench = ObjectBench::new();
		bench.clear_for(1);
		ui_tx.send(created("a", 1, 1));
		pump.drain(&mut bench);

		ui_tx.send(created("stale", 2, 1));
		ui_tx.send(created("b", 1, 2));
		vm_tx.send(VmEvent::Reset { generation: 2 });
		let events = pump.drain(&mut bench);
		assert!(matches!(events[0], UiEvent::Vm(VmEvent::Reset { generation: 2 })));
		assert_eq!(names(&bench), ["b"]);
		assert_eq!(bench.generation(), 2);

		vm_tx.send(VmEvent::Terminated { generation: 2, code: Some(0) });
		pump.drain(&mut bench);
		assert!(bench.is_empty());
	}
}
