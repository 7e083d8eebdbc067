//! Ownership-tagged, reference-counted ledger handles.
//!
//! Rules never hold a [`QuotaPool`] or [`MultiQuotaLedger`] by value;
//! they hold a handle carrying an explicit [`Ownership`] tag:
//!
//! - [`Ownership::Exclusive`] -- the ledger is a per-vessel permit.
//!   Duplicating the handle for a new vessel deep-copies the ledger.
//! - [`Ownership::PoolShared`] -- the ledger is a fleet-wide pool (a
//!   true total allowable catch). Duplicating clones the reference; all
//!   vessels debit the same balance.
//!
//! Handles are `Rc<RefCell<_>>` internally: the engine runs on a single
//! logical thread of simulated time, so no locking is needed, and the
//! scheduled reset task aliases the same cell as the rule that
//! registered it. Re-entrant access is reported as
//! [`QuotaError::ReentrantAccess`] rather than a panic.

use std::cell::RefCell;
use std::rc::Rc;

use fathom_types::SpeciesId;
use serde::{Deserialize, Serialize};

use crate::error::QuotaError;
use crate::ledger::MultiQuotaLedger;
use crate::pool::QuotaPool;

/// Who owns a ledger's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    /// Per-vessel state; duplicate by deep copy.
    Exclusive,
    /// Fleet-shared state; duplicate by aliasing.
    PoolShared,
}

/// An ownership-tagged handle to a scalar [`QuotaPool`].
#[derive(Debug, Clone)]
pub struct SharedPool {
    ownership: Ownership,
    inner: Rc<RefCell<QuotaPool>>,
}

impl SharedPool {
    /// Wrap a pool as per-vessel state.
    pub fn exclusive(pool: QuotaPool) -> Self {
        Self {
            ownership: Ownership::Exclusive,
            inner: Rc::new(RefCell::new(pool)),
        }
    }

    /// Wrap a pool as fleet-shared state.
    pub fn pool_shared(pool: QuotaPool) -> Self {
        Self {
            ownership: Ownership::PoolShared,
            inner: Rc::new(RefCell::new(pool)),
        }
    }

    /// The handle's ownership tag.
    pub const fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Produce the handle a different vessel should use: a deep copy for
    /// exclusive ledgers, the same reference for pool-shared ones.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::ReentrantAccess`] if the pool is currently
    /// borrowed (only possible from inside a ledger operation).
    pub fn duplicate(&self) -> Result<Self, QuotaError> {
        match self.ownership {
            Ownership::PoolShared => Ok(Self {
                ownership: Ownership::PoolShared,
                inner: Rc::clone(&self.inner),
            }),
            Ownership::Exclusive => self.with(|pool| Self::exclusive(pool.clone())),
        }
    }

    /// Whether two handles alias the same underlying pool.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn with<R>(&self, f: impl FnOnce(&QuotaPool) -> R) -> Result<R, QuotaError> {
        match self.inner.try_borrow() {
            Ok(pool) => Ok(f(&pool)),
            Err(_busy) => Err(QuotaError::ReentrantAccess),
        }
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut QuotaPool) -> R) -> Result<R, QuotaError> {
        match self.inner.try_borrow_mut() {
            Ok(mut pool) => Ok(f(&mut pool)),
            Err(_busy) => Err(QuotaError::ReentrantAccess),
        }
    }

    /// Biomass still sellable.
    pub fn remaining(&self) -> Result<f64, QuotaError> {
        self.with(QuotaPool::remaining)
    }

    /// The allowance the pool refills to.
    pub fn allowance(&self) -> Result<f64, QuotaError> {
        self.with(QuotaPool::allowance)
    }

    /// Whether there is meaningfully positive quota left.
    pub fn has_remaining(&self) -> Result<bool, QuotaError> {
        self.with(QuotaPool::has_remaining)
    }

    /// Debit a sale. See [`QuotaPool::debit`].
    pub fn debit(&self, biomass: f64) -> Result<(), QuotaError> {
        self.with_mut(|pool| pool.debit(biomass))?
    }

    /// Refill to the allowance.
    pub fn reset(&self) -> Result<(), QuotaError> {
        self.with_mut(QuotaPool::reset)
    }

    /// Overwrite the balance. See [`QuotaPool::set_remaining`].
    pub fn set_remaining(&self, value: f64) -> Result<(), QuotaError> {
        self.with_mut(|pool| pool.set_remaining(value))?
    }
}

/// An ownership-tagged handle to a per-species [`MultiQuotaLedger`].
#[derive(Debug, Clone)]
pub struct SharedLedger {
    ownership: Ownership,
    inner: Rc<RefCell<MultiQuotaLedger>>,
}

impl SharedLedger {
    /// Wrap a ledger as per-vessel state.
    pub fn exclusive(ledger: MultiQuotaLedger) -> Self {
        Self {
            ownership: Ownership::Exclusive,
            inner: Rc::new(RefCell::new(ledger)),
        }
    }

    /// Wrap a ledger as fleet-shared state.
    pub fn pool_shared(ledger: MultiQuotaLedger) -> Self {
        Self {
            ownership: Ownership::PoolShared,
            inner: Rc::new(RefCell::new(ledger)),
        }
    }

    /// The handle's ownership tag.
    pub const fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Produce the handle a different vessel should use: a deep copy for
    /// exclusive ledgers, the same reference for pool-shared ones.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::ReentrantAccess`] if the ledger is currently
    /// borrowed.
    pub fn duplicate(&self) -> Result<Self, QuotaError> {
        match self.ownership {
            Ownership::PoolShared => Ok(Self {
                ownership: Ownership::PoolShared,
                inner: Rc::clone(&self.inner),
            }),
            Ownership::Exclusive => self.with(|ledger| Self::exclusive(ledger.clone())),
        }
    }

    /// Whether two handles alias the same underlying ledger.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn with<R>(&self, f: impl FnOnce(&MultiQuotaLedger) -> R) -> Result<R, QuotaError> {
        match self.inner.try_borrow() {
            Ok(ledger) => Ok(f(&ledger)),
            Err(_busy) => Err(QuotaError::ReentrantAccess),
        }
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut MultiQuotaLedger) -> R) -> Result<R, QuotaError> {
        match self.inner.try_borrow_mut() {
            Ok(mut ledger) => Ok(f(&mut ledger)),
            Err(_busy) => Err(QuotaError::ReentrantAccess),
        }
    }

    /// Number of species pools.
    pub fn pools(&self) -> Result<usize, QuotaError> {
        self.with(MultiQuotaLedger::pools)
    }

    /// Balance of one species pool. See [`MultiQuotaLedger::remaining`].
    pub fn remaining(&self, species: SpeciesId) -> Result<f64, QuotaError> {
        self.with(|ledger| ledger.remaining(species))?
    }

    /// Whether at least one pool still holds positive quota.
    pub fn any_remaining(&self) -> Result<bool, QuotaError> {
        self.with(MultiQuotaLedger::any_remaining)
    }

    /// Debit a sale. See [`MultiQuotaLedger::debit`].
    pub fn debit(
        &self,
        species: SpeciesId,
        biomass: f64,
        day_of_year: u32,
    ) -> Result<(), QuotaError> {
        self.with_mut(|ledger| ledger.debit(species, biomass, day_of_year))?
    }

    /// Overwrite one pool's balance. See
    /// [`MultiQuotaLedger::set_remaining`].
    pub fn set_remaining(&self, species: SpeciesId, value: f64) -> Result<(), QuotaError> {
        self.with_mut(|ledger| ledger.set_remaining(species, value))?
    }

    /// Refill every pool and clear exhaustion markers.
    pub fn reset(&self) -> Result<(), QuotaError> {
        self.with_mut(MultiQuotaLedger::reset)
    }

    /// Season length for one species. See
    /// [`MultiQuotaLedger::season_length`].
    pub fn season_length(&self, species: SpeciesId, days_in_year: u32) -> Result<u32, QuotaError> {
        self.with(|ledger| ledger.season_length(species, days_in_year))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_duplicate_is_independent() {
        let original = SharedPool::exclusive(QuotaPool::new(1000.0).unwrap());
        let copy = original.duplicate().unwrap();
        assert!(!original.ptr_eq(&copy));
        copy.debit(600.0).unwrap();
        assert_eq!(original.remaining().unwrap(), 1000.0);
        assert_eq!(copy.remaining().unwrap(), 400.0);
    }

    #[test]
    fn pool_shared_duplicate_aliases() {
        let original = SharedPool::pool_shared(QuotaPool::new(1000.0).unwrap());
        let copy = original.duplicate().unwrap();
        assert!(original.ptr_eq(&copy));
        copy.debit(600.0).unwrap();
        assert_eq!(original.remaining().unwrap(), 400.0);
    }

    #[test]
    fn ledger_handle_preserves_ownership_across_duplicates() {
        let shared = SharedLedger::pool_shared(MultiQuotaLedger::new(vec![10.0]).unwrap());
        let copy = shared.duplicate().unwrap().duplicate().unwrap();
        assert_eq!(copy.ownership(), Ownership::PoolShared);
        assert!(shared.ptr_eq(&copy));
    }

    #[test]
    fn shared_ledger_debits_visible_to_all_holders() {
        let a = SharedLedger::pool_shared(MultiQuotaLedger::new(vec![100.0, 50.0]).unwrap());
        let b = a.duplicate().unwrap();
        a.debit(SpeciesId(0), 30.0, 1).unwrap();
        b.debit(SpeciesId(0), 30.0, 1).unwrap();
        assert_eq!(a.remaining(SpeciesId(0)).unwrap(), 40.0);
        assert_eq!(b.remaining(SpeciesId(1)).unwrap(), 50.0);
    }

    #[test]
    fn exclusive_ledger_duplicate_keeps_markers_separate() {
        let a = SharedLedger::exclusive(MultiQuotaLedger::new(vec![10.0]).unwrap());
        a.debit(SpeciesId(0), 10.0, 42).unwrap();
        let b = a.duplicate().unwrap();
        b.reset().unwrap();
        assert_eq!(a.season_length(SpeciesId(0), 365).unwrap(), 42);
        assert_eq!(b.season_length(SpeciesId(0), 365).unwrap(), 365);
    }
}
