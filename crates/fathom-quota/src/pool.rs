//! The scalar quota pool: one balance covering all species.

use fathom_types::EPSILON;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuotaError;

/// A single-balance quota ledger.
///
/// `remaining` only ever decreases between resets (through [`debit`]) and
/// snaps back to the allowance on [`reset`]. The allowance itself changes
/// only through an explicit [`retarget`].
///
/// [`debit`]: QuotaPool::debit
/// [`reset`]: QuotaPool::reset
/// [`retarget`]: QuotaPool::retarget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaPool {
    /// Biomass the pool refills to on reset, in kg.
    yearly_allowance: f64,
    /// Biomass still sellable, in kg.
    remaining: f64,
}

impl QuotaPool {
    /// Create a full pool with the given allowance.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidAllowance`] if the allowance is NaN
    /// or negative. Infinite allowances are legal: they model an
    /// unmanaged stock.
    pub fn new(allowance: f64) -> Result<Self, QuotaError> {
        validate_allowance(allowance)?;
        Ok(Self {
            yearly_allowance: allowance,
            remaining: allowance,
        })
    }

    /// The allowance the pool refills to.
    pub const fn allowance(&self) -> f64 {
        self.yearly_allowance
    }

    /// Biomass still sellable.
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Whether there is meaningfully positive quota left.
    pub fn has_remaining(&self) -> bool {
        self.remaining > EPSILON
    }

    /// Debit a sale from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::NegativeSale`] for negative biomass and
    /// [`QuotaError::Overdrawn`] if the debit would push the balance
    /// below `-EPSILON`. On overdraft the balance is left untouched so
    /// the error message reflects a consistent ledger.
    pub fn debit(&mut self, biomass: f64) -> Result<(), QuotaError> {
        if biomass < 0.0 || biomass.is_nan() {
            return Err(QuotaError::NegativeSale { biomass });
        }
        let after = self.remaining - biomass;
        if after < -EPSILON {
            return Err(QuotaError::Overdrawn {
                species: None,
                remaining: after,
                attempted: biomass,
            });
        }
        self.remaining = after;
        Ok(())
    }

    /// Refill the pool to its allowance.
    pub fn reset(&mut self) {
        debug!(allowance = self.yearly_allowance, "quota pool reset");
        self.remaining = self.yearly_allowance;
    }

    /// Change the allowance (policy decision); takes effect from the next
    /// reset. The current balance is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidAllowance`] if the new allowance is
    /// NaN or negative.
    pub fn retarget(&mut self, allowance: f64) -> Result<(), QuotaError> {
        validate_allowance(allowance)?;
        self.yearly_allowance = allowance;
        Ok(())
    }

    /// Overwrite the remaining balance directly.
    ///
    /// Used by quota-market plumbing (trades move balance between
    /// vessels) and by the composite quota accessor.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidAllowance`] if the value is NaN or
    /// below `-EPSILON`.
    pub fn set_remaining(&mut self, value: f64) -> Result<(), QuotaError> {
        if value.is_nan() || value < -EPSILON {
            return Err(QuotaError::InvalidAllowance { value });
        }
        self.remaining = value;
        Ok(())
    }
}

fn validate_allowance(value: f64) -> Result<(), QuotaError> {
    if value.is_nan() || value < 0.0 {
        return Err(QuotaError::InvalidAllowance { value });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_full() {
        let pool = QuotaPool::new(1000.0).unwrap();
        assert_eq!(pool.remaining(), 1000.0);
        assert!(pool.has_remaining());
    }

    #[test]
    fn nan_and_negative_allowances_rejected() {
        assert!(QuotaPool::new(f64::NAN).is_err());
        assert!(QuotaPool::new(-1.0).is_err());
    }

    #[test]
    fn infinite_allowance_is_legal() {
        let pool = QuotaPool::new(f64::INFINITY).unwrap();
        assert!(pool.has_remaining());
    }

    #[test]
    fn debit_reduces_remaining() {
        let mut pool = QuotaPool::new(1000.0).unwrap();
        pool.debit(400.0).unwrap();
        pool.debit(400.0).unwrap();
        assert_eq!(pool.remaining(), 200.0);
    }

    #[test]
    fn overdraft_is_fatal_and_leaves_balance_untouched() {
        let mut pool = QuotaPool::new(1000.0).unwrap();
        pool.debit(400.0).unwrap();
        pool.debit(400.0).unwrap();
        let err = pool.debit(400.0);
        assert!(matches!(err, Err(QuotaError::Overdrawn { .. })));
        assert_eq!(pool.remaining(), 200.0);
    }

    #[test]
    fn debit_within_tolerance_is_allowed() {
        let mut pool = QuotaPool::new(100.0).unwrap();
        // A hair over the balance, but inside EPSILON.
        pool.debit(100.0 + fathom_types::EPSILON / 2.0).unwrap();
        assert!(!pool.has_remaining());
    }

    #[test]
    fn negative_sale_rejected() {
        let mut pool = QuotaPool::new(100.0).unwrap();
        assert!(pool.debit(-1.0).is_err());
    }

    #[test]
    fn reset_restores_allowance_exactly() {
        let mut pool = QuotaPool::new(1000.0).unwrap();
        pool.debit(999.0).unwrap();
        pool.reset();
        assert_eq!(pool.remaining(), 1000.0);
    }

    #[test]
    fn retarget_applies_from_next_reset() {
        let mut pool = QuotaPool::new(1000.0).unwrap();
        pool.debit(100.0).unwrap();
        pool.retarget(500.0).unwrap();
        assert_eq!(pool.remaining(), 900.0);
        pool.reset();
        assert_eq!(pool.remaining(), 500.0);
    }
}
