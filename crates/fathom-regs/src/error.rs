//! Error types for the regulation engine.
//!
//! Two fatal families exist, matching the ledger crate's taxonomy:
//! configuration errors surface at construction or `start` time, and
//! invariant violations surface at mutation time. Both propagate to the
//! simulation driver untouched. Missing price or indicator data is not
//! an error anywhere in this crate; rules absorb those gaps silently.

use fathom_quota::QuotaError;
use fathom_types::MpaId;
use fathom_vessel::VesselError;

/// Errors raised by regulation construction, lifecycle, and events.
#[derive(Debug, thiserror::Error)]
pub enum RegulationError {
    /// A quota ledger rejected an operation (overdraft, re-entrancy,
    /// malformed allowance).
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// A vessel mutation failed (negative fine, no trip underway).
    #[error(transparent)]
    Vessel(#[from] VesselError),

    /// `start` was called twice without an intervening `turn_off`.
    #[error("{kind} started twice for the same vessel")]
    AlreadyStarted {
        /// The offending rule kind.
        kind: &'static str,
    },

    /// A rule that must be started first was queried while dormant.
    #[error("{kind} queried before start")]
    NotStarted {
        /// The offending rule kind.
        kind: &'static str,
    },

    /// A catch or sale event reached a toggled-off rule. The fisher
    /// should never have been allowed to produce the event.
    #[error("catch or sale event while regulation switched off")]
    EventWhileOff,

    /// Enforcement was asked about a protected area it has no record
    /// for. Every protected tile referenced at runtime must be
    /// registered before the run starts.
    #[error("no enforcement record for protected area {mpa}")]
    MissingEnforcement {
        /// The unregistered protected area.
        mpa: MpaId,
    },

    /// Enforcement terms outside their legal ranges.
    #[error(
        "invalid enforcement terms for area {mpa}: hourly detection {hourly_detection} \
         must be a probability and fine {fine} must be non-negative and finite"
    )]
    InvalidEnforcementTerms {
        /// The area the terms were registered for.
        mpa: MpaId,
        /// The rejected detection probability.
        hourly_detection: f64,
        /// The rejected fine.
        fine: f64,
    },

    /// A non-wrapping day window with `start > end`, or a day outside
    /// `1..=365`.
    #[error("invalid day range [{start}, {end}]")]
    InvalidDayRange {
        /// First day of the window.
        start: u32,
        /// Last day of the window.
        end: u32,
    },

    /// Hysteresis thresholds with `low > high`.
    #[error("invalid hysteresis thresholds: low {low} exceeds high {high}")]
    InvalidThresholds {
        /// The switch-to-emergency threshold.
        low: f64,
        /// The switch-back threshold.
        high: f64,
    },

    /// A tag assembly configured with no factories at all.
    #[error("tag assembly has an empty factory map")]
    EmptyFactoryMap,

    /// A quota read or write on a policy with no quota-capable member.
    #[error("no quota-capable rule to delegate to")]
    NoQuotaDelegate,

    /// A quota read or write on a composite with several quota-capable
    /// members and no way to pick one.
    #[error("{count} quota-capable members; delegate is ambiguous")]
    AmbiguousQuotaDelegate {
        /// How many members claimed the quota capability.
        count: usize,
    },

    /// A recipe referenced a species index outside the catalog.
    #[error("recipe references species index {index} but the catalog has {catalog_len} species")]
    UnknownRecipeSpecies {
        /// The out-of-range index.
        index: usize,
        /// Number of species in the catalog.
        catalog_len: usize,
    },

    /// A recipe's per-species allowance list does not match the catalog.
    #[error("recipe lists {actual} allowances but the catalog has {expected} species")]
    AllowanceCountMismatch {
        /// Species in the catalog.
        expected: usize,
        /// Allowances in the recipe.
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_convert_transparently() {
        let err = RegulationError::from(QuotaError::ZeroCadence);
        assert!(matches!(err, RegulationError::Quota(_)));
    }

    #[test]
    fn messages_name_the_offender() {
        let err = RegulationError::AlreadyStarted { kind: "tag assembly" };
        assert!(err.to_string().contains("tag assembly"));
    }
}
