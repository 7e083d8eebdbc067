//! Catch-quota ledgers for the Fathom regulation engine.
//!
//! A quota ledger tracks how much biomass may still legally be sold
//! before the cap binds. Two shapes exist: the scalar [`QuotaPool`]
//! (one balance covering everything) and the per-species
//! [`MultiQuotaLedger`]. Both enforce the hard invariant that the
//! remaining balance never drops below `-EPSILON`: a deeper overdraft is
//! an upstream bug (someone sold more than they were permitted) and is
//! reported as a fatal [`QuotaError::Overdrawn`] rather than clamped.
//!
//! # Ownership
//!
//! A ledger is either **exclusive** (each vessel gets its own copy -- an
//! individual permit) or **pool-shared** (one ledger aliased by every
//! participating vessel -- a true total allowable catch). The
//! [`SharedPool`] and [`SharedLedger`] handles carry an explicit
//! [`Ownership`] tag and implement `copy()` accordingly: exclusive
//! handles deep-copy, pool-shared handles clone the reference.
//!
//! # Modules
//!
//! - [`cadence`] -- [`ResetCadence`]: yearly or every-N-days resets.
//! - [`error`] -- [`QuotaError`], the fatal invariant/configuration errors.
//! - [`handle`] -- [`Ownership`], [`SharedPool`], [`SharedLedger`].
//! - [`ledger`] -- [`MultiQuotaLedger`]: one balance per species.
//! - [`pool`] -- [`QuotaPool`]: a single scalar balance.

pub mod cadence;
pub mod error;
pub mod handle;
pub mod ledger;
pub mod pool;

pub use cadence::ResetCadence;
pub use error::QuotaError;
pub use handle::{Ownership, SharedLedger, SharedPool};
pub use ledger::MultiQuotaLedger;
pub use pool::QuotaPool;
