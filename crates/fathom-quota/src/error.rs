//! Error types for the `fathom-quota` crate.
//!
//! Everything here is fatal by design: quota invariant violations and
//! malformed allowances signal upstream bugs and must terminate the run
//! rather than corrupt downstream accounting.

use fathom_types::SpeciesId;

/// Errors that can occur during quota ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// A sale drove the remaining balance below the tolerance floor.
    ///
    /// The caller sold more than the most recent `maximum_biomass_sellable`
    /// answer allowed; accounting upstream is broken.
    #[error(
        "quota overdrawn{}: remaining {remaining} after debiting {attempted}",
        .species.map(|s| format!(" for {s}")).unwrap_or_default()
    )]
    Overdrawn {
        /// The species pool, if the ledger is per-species.
        species: Option<SpeciesId>,
        /// The balance the debit would have left.
        remaining: f64,
        /// The biomass debited.
        attempted: f64,
    },

    /// A sale reaction was invoked with negative biomass.
    #[error("negative sale biomass {biomass}")]
    NegativeSale {
        /// The offending biomass.
        biomass: f64,
    },

    /// A species index fell outside the ledger's pools.
    #[error("species {species} out of range for a {pools}-pool ledger")]
    UnknownSpecies {
        /// The out-of-range species.
        species: SpeciesId,
        /// Number of pools in the ledger.
        pools: usize,
    },

    /// An allowance was NaN or negative at construction or re-target.
    #[error("invalid allowance {value}: must be non-negative and not NaN")]
    InvalidAllowance {
        /// The offending allowance.
        value: f64,
    },

    /// A reset cadence of zero days was configured.
    #[error("reset cadence of zero days")]
    ZeroCadence,

    /// A ledger handle was re-entered while already borrowed.
    ///
    /// The engine is single-threaded; hitting this means a rule called
    /// back into a ledger it was already mutating.
    #[error("quota ledger accessed re-entrantly")]
    ReentrantAccess,
}
