//! Simulated-time scaffolding for the Fathom regulation engine.
//!
//! The engine itself is a library of rules; this crate provides the
//! world those rules run against: the day-counting [`SimClock`], the
//! [`Schedule`] of periodic policy tasks, the [`YearlySeries`] indicator
//! store, and the [`Model`] aggregate that owns all of them plus the
//! seeded random source and the geography.
//!
//! Everything runs on a single logical thread of simulated time; there
//! is no async boundary anywhere in the workspace.
//!
//! # Modules
//!
//! - [`clock`] -- [`SimClock`]: absolute day counter with day-of-year
//!   and year derivations.
//! - [`error`] -- [`SimError`].
//! - [`model`] -- [`Model`]: the aggregate rules `start` against.
//! - [`schedule`] -- [`Schedule`], [`StepOrder`], [`TaskHandle`]:
//!   periodic task registration and boundary execution.
//! - [`series`] -- [`YearlySeries`]: named yearly indicator columns.

pub mod clock;
pub mod error;
pub mod model;
pub mod schedule;
pub mod series;

pub use clock::SimClock;
pub use error::SimError;
pub use model::Model;
pub use schedule::{Schedule, StepContext, StepOrder, TaskCadence, TaskHandle, TaskResult};
pub use series::YearlySeries;
