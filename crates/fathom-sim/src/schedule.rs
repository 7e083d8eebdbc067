//! Periodic policy tasks: registration, priority slots, boundary runs.
//!
//! Rules register tasks when they `start` (quota resets, regime
//! evaluations) and cancel them exactly once when they are turned off.
//! Tasks run at day and year boundaries in [`StepOrder`] slot order;
//! within a slot, registration order decides, so execution is fully
//! deterministic.

use tracing::debug;

use crate::clock::SimClock;
use crate::error::SimError;
use crate::series::YearlySeries;

/// Priority slot a task runs in at a boundary.
///
/// Slots run in declaration order: policy updates (regime switches,
/// re-targets) see the old ledger state before data resets wipe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StepOrder {
    /// Controllers that read indicators and adjust policy.
    PolicyUpdate,
    /// Ledger refills and marker clearing.
    DataReset,
}

/// All slots, in execution order.
const SLOT_ORDER: [StepOrder; 2] = [StepOrder::PolicyUpdate, StepOrder::DataReset];

/// How often a task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCadence {
    /// At every day boundary.
    Daily,
    /// At every year boundary.
    Yearly,
}

/// Opaque registration handle used to cancel a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Read-only view of the model handed to scheduled tasks.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// The world clock at this boundary.
    pub clock: &'a SimClock,
    /// The yearly indicator store.
    pub series: &'a YearlySeries,
}

/// Result of one scheduled task run.
///
/// Task errors are fatal; the boundary run stops and the error
/// propagates to the simulation driver.
pub type TaskResult = Result<(), Box<dyn std::error::Error>>;

type TaskFn = Box<dyn FnMut(&StepContext<'_>) -> TaskResult>;

struct ScheduledTask {
    handle: TaskHandle,
    order: StepOrder,
    cadence: TaskCadence,
    action: TaskFn,
}

/// The registry of periodic policy tasks.
#[derive(Default)]
pub struct Schedule {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl core::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Schedule")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Schedule {
    /// Create an empty schedule.
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    /// Number of registered tasks.
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Register a periodic task; returns the handle needed to cancel it.
    pub fn register(
        &mut self,
        order: StepOrder,
        cadence: TaskCadence,
        action: impl FnMut(&StepContext<'_>) -> TaskResult + 'static,
    ) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.push(ScheduledTask {
            handle,
            order,
            cadence,
            action: Box::new(action),
        });
        debug!(?handle, ?order, ?cadence, "task registered");
        handle
    }

    /// Cancel a task by handle; returns whether it was registered.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.handle != handle);
        before != self.tasks.len()
    }

    /// Run every task of the given cadence, slot by slot.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Task`] on the first task failure; later tasks
    /// do not run.
    pub fn run_boundary(
        &mut self,
        cadence: TaskCadence,
        ctx: &StepContext<'_>,
    ) -> Result<(), SimError> {
        for slot in SLOT_ORDER {
            for task in &mut self.tasks {
                if task.order != slot || task.cadence != cadence {
                    continue;
                }
                (task.action)(ctx).map_err(|source| SimError::Task { source })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn ctx_parts() -> (SimClock, YearlySeries) {
        (SimClock::new(), YearlySeries::new())
    }

    #[test]
    fn slots_run_in_priority_order() {
        let (clock, series) = ctx_parts();
        let mut schedule = Schedule::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        schedule.register(StepOrder::DataReset, TaskCadence::Yearly, move |_| {
            l.borrow_mut().push("reset");
            Ok(())
        });
        let l = Rc::clone(&log);
        schedule.register(StepOrder::PolicyUpdate, TaskCadence::Yearly, move |_| {
            l.borrow_mut().push("policy");
            Ok(())
        });

        let ctx = StepContext {
            clock: &clock,
            series: &series,
        };
        schedule.run_boundary(TaskCadence::Yearly, &ctx).unwrap();
        assert_eq!(*log.borrow(), vec!["policy", "reset"]);
    }

    #[test]
    fn cadences_are_independent() {
        let (clock, series) = ctx_parts();
        let mut schedule = Schedule::new();
        let count = Rc::new(RefCell::new(0u32));
        let c = Rc::clone(&count);
        schedule.register(StepOrder::DataReset, TaskCadence::Daily, move |_| {
            *c.borrow_mut() += 1;
            Ok(())
        });

        let ctx = StepContext {
            clock: &clock,
            series: &series,
        };
        schedule.run_boundary(TaskCadence::Yearly, &ctx).unwrap();
        assert_eq!(*count.borrow(), 0);
        schedule.run_boundary(TaskCadence::Daily, &ctx).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let (clock, series) = ctx_parts();
        let mut schedule = Schedule::new();
        let count = Rc::new(RefCell::new(0u32));
        let c = Rc::clone(&count);
        let handle = schedule.register(StepOrder::DataReset, TaskCadence::Daily, move |_| {
            *c.borrow_mut() += 1;
            Ok(())
        });

        assert!(schedule.cancel(handle));
        assert!(!schedule.cancel(handle));
        let ctx = StepContext {
            clock: &clock,
            series: &series,
        };
        schedule.run_boundary(TaskCadence::Daily, &ctx).unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn task_errors_propagate() {
        let (clock, series) = ctx_parts();
        let mut schedule = Schedule::new();
        schedule.register(StepOrder::PolicyUpdate, TaskCadence::Daily, |_| {
            Err("boom".into())
        });
        let ctx = StepContext {
            clock: &clock,
            series: &series,
        };
        assert!(schedule.run_boundary(TaskCadence::Daily, &ctx).is_err());
    }
}
