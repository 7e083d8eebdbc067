//! The per-species quota ledger.
//!
//! One balance per species in the catalog, debited independently. The
//! ledger also records, per species, the first simulated day-of-year on
//! which the balance crossed from positive to non-positive; the weak
//! multi-quota rule reads these markers for season-length reporting, and
//! a reset clears them back to "full season".

use fathom_types::{EPSILON, SpeciesId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuotaError;

/// A quota ledger with one balance per species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiQuotaLedger {
    /// Allowance per species, in kg; `+inf` means unmanaged.
    yearly_allowance: Vec<f64>,
    /// Balance per species, in kg.
    remaining: Vec<f64>,
    /// Day-of-year each species first hit a non-positive balance this
    /// cycle, if it did.
    exhausted_on: Vec<Option<u32>>,
}

impl MultiQuotaLedger {
    /// Create a full ledger from per-species allowances.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidAllowance`] if any allowance is NaN
    /// or negative. Infinite allowances mark unmanaged species.
    pub fn new(allowances: Vec<f64>) -> Result<Self, QuotaError> {
        for &value in &allowances {
            if value.is_nan() || value < 0.0 {
                return Err(QuotaError::InvalidAllowance { value });
            }
        }
        let pools = allowances.len();
        Ok(Self {
            remaining: allowances.clone(),
            yearly_allowance: allowances,
            exhausted_on: vec![None; pools],
        })
    }

    /// Number of species pools.
    pub const fn pools(&self) -> usize {
        self.yearly_allowance.len()
    }

    /// The allowance of one species pool.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::UnknownSpecies`] for an out-of-range index.
    pub fn allowance(&self, species: SpeciesId) -> Result<f64, QuotaError> {
        self.yearly_allowance
            .get(species.index())
            .copied()
            .ok_or(QuotaError::UnknownSpecies {
                species,
                pools: self.pools(),
            })
    }

    /// The balance of one species pool.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::UnknownSpecies`] for an out-of-range index.
    pub fn remaining(&self, species: SpeciesId) -> Result<f64, QuotaError> {
        self.remaining
            .get(species.index())
            .copied()
            .ok_or(QuotaError::UnknownSpecies {
                species,
                pools: self.pools(),
            })
    }

    /// Whether at least one pool still holds meaningfully positive quota.
    pub fn any_remaining(&self) -> bool {
        self.remaining.iter().any(|&r| r > EPSILON)
    }

    /// Debit a sale from one species pool.
    ///
    /// `day_of_year` stamps the exhaustion marker if this debit is the
    /// one that empties the pool.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::NegativeSale`] for negative biomass,
    /// [`QuotaError::UnknownSpecies`] for an out-of-range index, and
    /// [`QuotaError::Overdrawn`] if the debit would push the balance
    /// below `-EPSILON` (the balance is left untouched in that case).
    pub fn debit(
        &mut self,
        species: SpeciesId,
        biomass: f64,
        day_of_year: u32,
    ) -> Result<(), QuotaError> {
        if biomass < 0.0 || biomass.is_nan() {
            return Err(QuotaError::NegativeSale { biomass });
        }
        let pools = self.pools();
        let slot = self
            .remaining
            .get_mut(species.index())
            .ok_or(QuotaError::UnknownSpecies { species, pools })?;
        let before = *slot;
        let after = before - biomass;
        if after < -EPSILON {
            return Err(QuotaError::Overdrawn {
                species: Some(species),
                remaining: after,
                attempted: biomass,
            });
        }
        *slot = after;
        if before > 0.0 && after <= 0.0 {
            if let Some(marker) = self.exhausted_on.get_mut(species.index()) {
                marker.get_or_insert(day_of_year);
            }
            debug!(%species, day_of_year, "species pool exhausted");
        }
        Ok(())
    }

    /// Overwrite one pool's balance directly (quota-market plumbing).
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::UnknownSpecies`] for an out-of-range index
    /// and [`QuotaError::InvalidAllowance`] for NaN or a value below
    /// `-EPSILON`.
    pub fn set_remaining(&mut self, species: SpeciesId, value: f64) -> Result<(), QuotaError> {
        if value.is_nan() || value < -EPSILON {
            return Err(QuotaError::InvalidAllowance { value });
        }
        let pools = self.pools();
        let slot = self
            .remaining
            .get_mut(species.index())
            .ok_or(QuotaError::UnknownSpecies { species, pools })?;
        *slot = value;
        Ok(())
    }

    /// Refill every pool to its allowance and clear exhaustion markers.
    pub fn reset(&mut self) {
        debug!(pools = self.pools(), "multi-quota ledger reset");
        self.remaining.clone_from(&self.yearly_allowance);
        for marker in &mut self.exhausted_on {
            *marker = None;
        }
    }

    /// The day-of-year one species' pool first emptied this cycle, if it
    /// did.
    pub fn exhausted_on(&self, species: SpeciesId) -> Option<u32> {
        self.exhausted_on.get(species.index()).copied().flatten()
    }

    /// Season length for one species: the day its pool emptied, or the
    /// full season if it never did.
    pub fn season_length(&self, species: SpeciesId, days_in_year: u32) -> u32 {
        self.exhausted_on(species).unwrap_or(days_in_year)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ledger() -> MultiQuotaLedger {
        MultiQuotaLedger::new(vec![500.0, 1000.0, f64::INFINITY]).unwrap()
    }

    #[test]
    fn new_ledger_is_full() {
        let ledger = ledger();
        assert_eq!(ledger.pools(), 3);
        assert_eq!(ledger.remaining(SpeciesId(0)).unwrap(), 500.0);
        assert!(ledger.any_remaining());
    }

    #[test]
    fn nan_allowance_rejected() {
        assert!(MultiQuotaLedger::new(vec![10.0, f64::NAN]).is_err());
    }

    #[test]
    fn debit_targets_one_pool() {
        let mut ledger = ledger();
        ledger.debit(SpeciesId(1), 250.0, 40).unwrap();
        assert_eq!(ledger.remaining(SpeciesId(0)).unwrap(), 500.0);
        assert_eq!(ledger.remaining(SpeciesId(1)).unwrap(), 750.0);
    }

    #[test]
    fn unknown_species_rejected() {
        let mut ledger = ledger();
        assert!(ledger.debit(SpeciesId(9), 1.0, 1).is_err());
        assert!(ledger.remaining(SpeciesId(9)).is_err());
    }

    #[test]
    fn overdraft_is_fatal() {
        let mut ledger = ledger();
        ledger.debit(SpeciesId(0), 500.0, 10).unwrap();
        let err = ledger.debit(SpeciesId(0), 1.0, 11);
        assert!(matches!(err, Err(QuotaError::Overdrawn { .. })));
        assert_eq!(ledger.remaining(SpeciesId(0)).unwrap(), 0.0);
    }

    #[test]
    fn exhaustion_day_recorded_once() {
        let mut ledger = ledger();
        ledger.debit(SpeciesId(0), 500.0, 73).unwrap();
        assert_eq!(ledger.exhausted_on(SpeciesId(0)), Some(73));
        // Later zero-biomass debits do not move the marker.
        ledger.debit(SpeciesId(0), 0.0, 90).unwrap();
        assert_eq!(ledger.exhausted_on(SpeciesId(0)), Some(73));
    }

    #[test]
    fn season_length_defaults_to_full_year() {
        let ledger = ledger();
        assert_eq!(ledger.season_length(SpeciesId(0), 365), 365);
    }

    #[test]
    fn reset_refills_and_clears_markers() {
        let mut ledger = ledger();
        ledger.debit(SpeciesId(0), 500.0, 73).unwrap();
        ledger.reset();
        assert_eq!(ledger.remaining(SpeciesId(0)).unwrap(), 500.0);
        assert_eq!(ledger.exhausted_on(SpeciesId(0)), None);
        assert_eq!(ledger.season_length(SpeciesId(0), 365), 365);
    }

    #[test]
    fn checkpoint_restores_spent_balances_and_markers() {
        let mut ledger = MultiQuotaLedger::new(vec![500.0, 1000.0]).unwrap();
        ledger.debit(SpeciesId(0), 500.0, 73).unwrap();
        ledger.debit(SpeciesId(1), 40.0, 80).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let restored: MultiQuotaLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.exhausted_on(SpeciesId(0)), Some(73));
        assert_eq!(restored.remaining(SpeciesId(1)).unwrap(), 960.0);
    }

    #[test]
    fn any_remaining_requires_only_one_positive_pool() {
        let mut ledger = MultiQuotaLedger::new(vec![100.0, 100.0]).unwrap();
        ledger.debit(SpeciesId(0), 100.0, 5).unwrap();
        assert!(ledger.any_remaining());
        ledger.debit(SpeciesId(1), 100.0, 6).unwrap();
        assert!(!ledger.any_remaining());
    }
}
