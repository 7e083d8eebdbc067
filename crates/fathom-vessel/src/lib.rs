//! Vessel runtime state and trip accounting for the Fathom regulation
//! engine.
//!
//! A [`Vessel`] is the engine's view of one fishing agent: its tag set,
//! home port, dock state, fine account, and the [`TripRecord`] of the
//! trip currently underway. Route choice, gear, and catch biology live
//! elsewhere; this crate only tracks what regulations query and mutate.
//!
//! # Modules
//!
//! - [`error`] -- Error types for vessel accounting.
//! - [`trip`] -- [`TripRecord`]: per-trip landings, sales, and
//!   opportunity costs.
//! - [`vessel`] -- [`Vessel`]: the agent state regulations read.

pub mod error;
pub mod trip;
pub mod vessel;

pub use error::VesselError;
pub use trip::TripRecord;
pub use vessel::Vessel;
