//! Error types for the `fathom-sim` crate.

use fathom_vessel::VesselError;

/// Errors that can occur while driving simulated time.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A trip settlement failed on the vessel side.
    #[error("trip settlement failed: {source}")]
    Settlement {
        /// The underlying vessel error.
        #[from]
        source: VesselError,
    },

    /// The day counter would overflow `u64`.
    #[error("clock overflow: cannot advance beyond u64::MAX days")]
    ClockOverflow,

    /// A scheduled task failed.
    ///
    /// Scheduled tasks are registered by regulations (quota resets,
    /// regime evaluations); their errors are fatal and terminate the
    /// run, per the engine's propagation policy.
    #[error("scheduled task failed: {source}")]
    Task {
        /// The underlying task error.
        source: Box<dyn std::error::Error>,
    },
}
