//! Error types for the `fathom-vessel` crate.

use fathom_types::{SpeciesId, VesselId};

/// Errors that can occur during vessel and trip accounting.
#[derive(Debug, thiserror::Error)]
pub enum VesselError {
    /// A negative biomass or money amount was supplied.
    #[error("negative amount {amount} for vessel {vessel}")]
    NegativeAmount {
        /// The offending vessel.
        vessel: VesselId,
        /// The offending amount.
        amount: f64,
    },

    /// A species index fell outside the trip's ledger arrays.
    #[error("species {species} out of range for vessel {vessel}")]
    UnknownSpecies {
        /// The offending vessel.
        vessel: VesselId,
        /// The out-of-range species.
        species: SpeciesId,
    },

    /// Trip accounting was attempted while the vessel is docked.
    #[error("vessel {vessel} has no trip underway")]
    NoTripUnderway {
        /// The docked vessel.
        vessel: VesselId,
    },
}
