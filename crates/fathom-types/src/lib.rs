//! Shared type definitions for the Fathom regulation engine.
//!
//! This crate holds the vocabulary every other crate speaks: strongly-typed
//! entity identifiers, the species catalog, and the biomass tolerance
//! constant used by quota invariant checks.

pub mod ids;
pub mod species;

pub use ids::{MpaId, PortId, VesselId};
pub use species::{Species, SpeciesCatalog, SpeciesId};

/// Tolerance below which a quota balance is considered zero.
///
/// Floating-point sale accounting accumulates rounding error; a remaining
/// balance in `[-EPSILON, EPSILON]` is treated as an exhausted (but legal)
/// quota. A balance below `-EPSILON` is an invariant violation: the caller
/// sold more than it was ever permitted to.
pub const EPSILON: f64 = 1e-6;

/// Number of days in a simulated year.
///
/// The simulation uses a fixed 365-day calendar; there are no leap years.
pub const DAYS_PER_YEAR: u32 = 365;

/// Number of simulated hours in a day.
pub const HOURS_PER_DAY: u32 = 24;
