//! Cooperative work driven under a time budget.
//!
//! Work that must run on a single thread (the syntax view, for one) is split
//! into small steps. [`drain`] runs steps until the budget is spent and tells
//! the caller whether to schedule another slice.

use std::time::{Duration, Instant};

/// A task that can make progress in small, bounded steps.
pub trait CooperativeTask {
	/// Performs one unit of work. Returns false once there is nothing left to do.
	fn step(&mut self) -> bool;
}

impl<F: FnMut() -> bool> CooperativeTask for F {
	fn step(&mut self) -> bool {
		self()
	}
}

/// Limits for one [`drain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainBudget {
	/// Wall-clock time after which no new step is started.
	pub duration: Duration,
	/// Maximum number of steps.
	pub max_steps: usize,
}

impl DrainBudget {
	/// A budget limited by time only.
	pub const fn time(duration: Duration) -> Self {
		Self {
			duration,
			max_steps: usize::MAX,
		}
	}
}

/// Outcome of one [`drain`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	/// Steps performed, including the final one that reported idle.
	pub steps: u64,
	/// True if the task reported that it has no more work.
	pub idle: bool,
	/// True if the call returned because the budget ran out.
	pub budget_exhausted: bool,
}

/// Runs `task` until it goes idle or `budget` is spent.
///
/// At least one step is always performed, so a task makes progress even under
/// a zero budget.
pub fn drain<T: CooperativeTask + ?Sized>(task: &mut T, budget: DrainBudget) -> DrainReport {
	let deadline = Instant::now() + budget.duration;
	let mut report = DrainReport::default();
	loop {
		report.steps += 1;
		if !task.step() {
			report.idle = true;
			break;
		}
		if report.steps as usize >= budget.max_steps || Instant::now() >= deadline {
			report.budget_exhausted = true;
			break;
		}
	}
	tracing::trace!(steps = report.steps, idle = report.idle, "worker.drain");
	report
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_drain_stops_when_idle() {
		let mut remaining = 3;
		let mut task = || {
			remaining -= 1;
			remaining > 0
		};
		let report = drain(&mut task, DrainBudget::time(Duration::from_secs(5)));
		assert_eq!(report, DrainReport { steps: 3, idle: true, budget_exhausted: false });
	}

	#[test]
	fn test_drain_respects_step_limit() {
		let mut task = || true;
		let report = drain(
			&mut task,
			DrainBudget {
				duration: Duration::from_secs(5),
				max_steps: 4,
			},
		);
		assert_eq!(report.steps, 4);
		assert!(report.budget_exhausted);
		assert!(!report.idle);
	}

	#[test]
	fn test_zero_budget_still_steps_once() {
		let mut calls = 0;
		let mut task = || {
			calls += 1;
			true
		};
		let report = drain(&mut task, DrainBudget::time(Duration::ZERO));
		assert_eq!(report.steps, 1);
		assert!(report.budget_exhausted);
		drop(task);
		assert_eq!(calls, 1);
	}
}
