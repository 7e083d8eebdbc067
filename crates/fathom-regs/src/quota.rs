//! Quota rules: ledger handles plus scheduled resets.
//!
//! Each rule wraps an ownership-tagged ledger handle and owns the
//! lifecycle around it: `start` registers the reset task (and the ITQ
//! cost adapter when priced) against the model, `turn_off` cancels
//! both exactly once. The ledger arithmetic itself, including the
//! fatal overdraft invariant, lives in `fathom-quota`.
//!
//! The scheduled reset closure captures an aliasing clone of the
//! handle, never an ownership-aware duplicate: the task must refill
//! the very ledger the rule debits.

use std::cell::RefCell;
use std::rc::Rc;

use fathom_market::{ItqCostAdapter, SharedCostSource};
use fathom_quota::{
    MultiQuotaLedger, Ownership, QuotaPool, ResetCadence, SharedLedger, SharedPool,
};
use fathom_sim::schedule::{StepOrder, TaskCadence, TaskHandle};
use fathom_sim::{Model, SimClock};
use fathom_types::SpeciesId;
use fathom_vessel::Vessel;
use fathom_world::SeaTile;
use tracing::debug;

use crate::error::RegulationError;

/// Resources a quota rule holds while started.
#[derive(Debug)]
struct QuotaRuntime {
    task: TaskHandle,
    cost_source: Option<SharedCostSource>,
}

/// Register the reset task for a ledger-refilling closure.
fn register_reset(
    model: &mut Model,
    cadence: ResetCadence,
    mut reset: impl FnMut() -> Result<(), fathom_quota::QuotaError> + 'static,
) -> TaskHandle {
    match cadence {
        ResetCadence::Yearly => {
            model
                .schedule_mut()
                .register(StepOrder::DataReset, TaskCadence::Yearly, move |_ctx| {
                    reset()?;
                    Ok(())
                })
        }
        ResetCadence::EveryDays(_) => {
            let start_day = model.clock().day();
            model
                .schedule_mut()
                .register(StepOrder::DataReset, TaskCadence::Daily, move |ctx| {
                    if cadence_due(cadence, ctx.clock, start_day) {
                        reset()?;
                    }
                    Ok(())
                })
        }
    }
}

fn cadence_due(cadence: ResetCadence, clock: &SimClock, start_day: u64) -> bool {
    let elapsed = clock.day().saturating_sub(start_day);
    u32::try_from(elapsed).is_ok_and(|days| cadence.due_on_day(days))
}

fn attach_itq(model: &mut Model, vessel: &Vessel) -> SharedCostSource {
    let source: SharedCostSource =
        Rc::new(RefCell::new(ItqCostAdapter::new(model.order_books())));
    model.register_cost_source(vessel.id(), Rc::clone(&source));
    source
}

fn release_runtime(model: &mut Model, vessel: &Vessel, runtime: QuotaRuntime) {
    model.schedule_mut().cancel(runtime.task);
    if let Some(source) = runtime.cost_source {
        model.unregister_cost_source(vessel.id(), &source);
    }
}

// ---------------------------------------------------------------------------
// Single-pool quota
// ---------------------------------------------------------------------------

/// One scalar biomass cap covering every species.
#[derive(Debug)]
pub struct MonoQuota {
    pool: SharedPool,
    cadence: ResetCadence,
    itq_priced: bool,
    runtime: Option<QuotaRuntime>,
}

impl MonoQuota {
    /// Build a fresh single-pool quota.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed allowance or a
    /// zero-day cadence.
    pub fn new(
        allowance: f64,
        cadence: ResetCadence,
        ownership: Ownership,
    ) -> Result<Self, RegulationError> {
        cadence.validate()?;
        let pool = QuotaPool::new(allowance)?;
        let handle = match ownership {
            Ownership::Exclusive => SharedPool::exclusive(pool),
            Ownership::PoolShared => SharedPool::pool_shared(pool),
        };
        Ok(Self::from_pool(handle, cadence))
    }

    /// Wrap an existing handle (fleet-shared pools are built once and
    /// handed to every participating rule this way).
    pub const fn from_pool(pool: SharedPool, cadence: ResetCadence) -> Self {
        Self {
            pool,
            cadence,
            itq_priced: false,
            runtime: None,
        }
    }

    /// Charge foregone quota-sale revenue at trip settlement.
    #[must_use]
    pub fn with_itq_pricing(mut self) -> Self {
        self.itq_priced = true;
        self
    }

    /// The underlying pool handle.
    pub const fn pool(&self) -> &SharedPool {
        &self.pool
    }

    /// Whether meaningfully positive quota remains.
    pub fn has_remaining(&self) -> Result<bool, RegulationError> {
        Ok(self.pool.has_remaining()?)
    }

    /// Biomass still sellable.
    pub fn remaining(&self) -> Result<f64, RegulationError> {
        Ok(self.pool.remaining()?)
    }

    /// Overwrite the balance (quota trading).
    pub fn set_remaining(&mut self, value: f64) -> Result<(), RegulationError> {
        Ok(self.pool.set_remaining(value)?)
    }

    /// Debit a sale against the pool.
    ///
    /// # Errors
    ///
    /// Returns the fatal overdraft error if the sale exceeds what was
    /// permitted; the balance is left untouched in that case.
    pub fn react_to_sale(&mut self, biomass: f64) -> Result<(), RegulationError> {
        Ok(self.pool.debit(biomass)?)
    }

    /// Register the reset task and, when priced, the ITQ adapter.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if self.runtime.is_some() {
            return Err(RegulationError::AlreadyStarted {
                kind: "single-pool quota",
            });
        }
        let pool = self.pool.clone();
        let task = register_reset(model, self.cadence, move || pool.reset());
        let cost_source = self.itq_priced.then(|| attach_itq(model, vessel));
        debug!(vessel = %vessel.id(), cadence = ?self.cadence, "single-pool quota started");
        self.runtime = Some(QuotaRuntime { task, cost_source });
        Ok(())
    }

    /// Cancel the reset task and the ITQ adapter, if started.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) {
        if let Some(runtime) = self.runtime.take() {
            release_runtime(model, vessel, runtime);
        }
    }

    /// The handle a different vessel should use; never started.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            pool: self.pool.duplicate()?,
            cadence: self.cadence,
            itq_priced: self.itq_priced,
            runtime: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-species quota
// ---------------------------------------------------------------------------

/// One biomass cap per species.
///
/// Also backs the weak variant, which differs only in exposing the
/// season-exhaustion markers the ledger records anyway.
#[derive(Debug)]
pub struct MultiQuota {
    ledger: SharedLedger,
    cadence: ResetCadence,
    respect_protected_areas: bool,
    itq_priced: bool,
    runtime: Option<QuotaRuntime>,
}

impl MultiQuota {
    /// Build a fresh per-species quota.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed allowances or a
    /// zero-day cadence.
    pub fn new(
        allowances: Vec<f64>,
        cadence: ResetCadence,
        ownership: Ownership,
    ) -> Result<Self, RegulationError> {
        cadence.validate()?;
        let ledger = MultiQuotaLedger::new(allowances)?;
        let handle = match ownership {
            Ownership::Exclusive => SharedLedger::exclusive(ledger),
            Ownership::PoolShared => SharedLedger::pool_shared(ledger),
        };
        Ok(Self::from_ledger(handle, cadence))
    }

    /// Wrap an existing ledger handle.
    pub const fn from_ledger(ledger: SharedLedger, cadence: ResetCadence) -> Self {
        Self {
            ledger,
            cadence,
            respect_protected_areas: true,
            itq_priced: false,
            runtime: None,
        }
    }

    /// Charge foregone quota-sale revenue at trip settlement.
    #[must_use]
    pub fn with_itq_pricing(mut self) -> Self {
        self.itq_priced = true;
        self
    }

    /// The underlying ledger handle.
    pub const fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Disable or restore the rule's own protected-area check (a larger
    /// composite that already gates space turns it off to avoid
    /// double-gating).
    pub const fn set_respect_protected_areas(&mut self, respect: bool) {
        self.respect_protected_areas = respect;
    }

    /// Location gate: the tile must be unprotected (while respected)
    /// and at least one pool must still hold quota.
    pub fn can_fish_here(&self, tile: &SeaTile) -> Result<bool, RegulationError> {
        if self.respect_protected_areas && tile.is_protected() {
            return Ok(false);
        }
        Ok(self.ledger.any_remaining()?)
    }

    /// At-sea gate: any pool positive suffices.
    pub fn allowed_at_sea(&self) -> Result<bool, RegulationError> {
        Ok(self.ledger.any_remaining()?)
    }

    /// Biomass of one species still sellable.
    pub fn remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        Ok(self.ledger.remaining(species)?)
    }

    /// Overwrite one species' balance (quota trading).
    pub fn set_remaining(&mut self, species: SpeciesId, value: f64) -> Result<(), RegulationError> {
        Ok(self.ledger.set_remaining(species, value)?)
    }

    /// Debit a sale, stamping the exhaustion day if this sale empties
    /// the pool.
    ///
    /// # Errors
    ///
    /// Returns the fatal overdraft error if the sale exceeds what was
    /// permitted.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        biomass: f64,
        day_of_year: u32,
    ) -> Result<(), RegulationError> {
        Ok(self.ledger.debit(species, biomass, day_of_year)?)
    }

    /// Days one species' pool lasted this year; the full year while the
    /// pool still holds quota.
    pub fn season_length(
        &self,
        species: SpeciesId,
        days_in_year: u32,
    ) -> Result<u32, RegulationError> {
        Ok(self.ledger.season_length(species, days_in_year)?)
    }

    /// Register the reset task and, when priced, the ITQ adapter.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if self.runtime.is_some() {
            return Err(RegulationError::AlreadyStarted {
                kind: "per-species quota",
            });
        }
        let ledger = self.ledger.clone();
        let task = register_reset(model, self.cadence, move || ledger.reset());
        let cost_source = self.itq_priced.then(|| attach_itq(model, vessel));
        debug!(vessel = %vessel.id(), cadence = ?self.cadence, "per-species quota started");
        self.runtime = Some(QuotaRuntime { task, cost_source });
        Ok(())
    }

    /// Cancel the reset task and the ITQ adapter, if started.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) {
        if let Some(runtime) = self.runtime.take() {
            release_runtime(model, vessel, runtime);
        }
    }

    /// The handle a different vessel should use; never started.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            ledger: self.ledger.duplicate()?,
            cadence: self.cadence,
            respect_protected_areas: self.respect_protected_areas,
            itq_priced: self.itq_priced,
            runtime: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Species-filtered quota
// ---------------------------------------------------------------------------

/// A single-pool quota that only accounts for one designated species.
///
/// Presence and location are never gated; only the sale-time
/// accounting differs from an open regime.
#[derive(Debug)]
pub struct SpeciesQuota {
    species: SpeciesId,
    pool: SharedPool,
    cadence: ResetCadence,
    runtime: Option<QuotaRuntime>,
}

impl SpeciesQuota {
    /// Build a quota filtered to one species.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed allowance or a
    /// zero-day cadence.
    pub fn new(
        species: SpeciesId,
        allowance: f64,
        cadence: ResetCadence,
        ownership: Ownership,
    ) -> Result<Self, RegulationError> {
        cadence.validate()?;
        let pool = QuotaPool::new(allowance)?;
        let handle = match ownership {
            Ownership::Exclusive => SharedPool::exclusive(pool),
            Ownership::PoolShared => SharedPool::pool_shared(pool),
        };
        Ok(Self {
            species,
            pool: handle,
            cadence,
            runtime: None,
        })
    }

    /// Wrap an existing pool handle without creating a new balance.
    pub const fn from_pool(species: SpeciesId, pool: SharedPool, cadence: ResetCadence) -> Self {
        Self {
            species,
            pool,
            cadence,
            runtime: None,
        }
    }

    /// The species this quota accounts for.
    pub const fn species(&self) -> SpeciesId {
        self.species
    }

    /// Sellable biomass: the pool balance for the designated species,
    /// unlimited for every other.
    pub fn maximum_biomass_sellable(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        if species == self.species {
            Ok(self.pool.remaining()?)
        } else {
            Ok(f64::INFINITY)
        }
    }

    /// Balance for the designated species, unlimited otherwise.
    pub fn remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        self.maximum_biomass_sellable(species)
    }

    /// Overwrite the designated species' balance.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::NoQuotaDelegate`] for any other
    /// species; this rule holds no ledger for them.
    pub fn set_remaining(&mut self, species: SpeciesId, value: f64) -> Result<(), RegulationError> {
        if species == self.species {
            Ok(self.pool.set_remaining(value)?)
        } else {
            Err(RegulationError::NoQuotaDelegate)
        }
    }

    /// Debit sales of the designated species; ignore every other.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        biomass: f64,
    ) -> Result<(), RegulationError> {
        if species == self.species {
            self.pool.debit(biomass)?;
        }
        Ok(())
    }

    /// Register the reset task.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if self.runtime.is_some() {
            return Err(RegulationError::AlreadyStarted {
                kind: "species-filtered quota",
            });
        }
        let pool = self.pool.clone();
        let task = register_reset(model, self.cadence, move || pool.reset());
        debug!(vessel = %vessel.id(), species = %self.species, "species quota started");
        self.runtime = Some(QuotaRuntime {
            task,
            cost_source: None,
        });
        Ok(())
    }

    /// Cancel the reset task, if started.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) {
        if let Some(runtime) = self.runtime.take() {
            release_runtime(model, vessel, runtime);
        }
    }

    /// The handle a different vessel should use; never started.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            species: self.species,
            pool: self.pool.duplicate()?,
            cadence: self.cadence,
            runtime: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fathom_quota::QuotaError;
    use fathom_types::{PortId, SpeciesCatalog};
    use fathom_world::SeaMap;

    use super::*;

    fn model() -> Model {
        Model::new(
            11,
            SpeciesCatalog::from_names(["cod", "haddock"]),
            SeaMap::uniform(4, 4, -100.0).unwrap(),
        )
    }

    #[test]
    fn third_oversized_sale_is_fatal_and_balance_survives() {
        let mut quota =
            MonoQuota::new(1000.0, ResetCadence::Yearly, Ownership::Exclusive).unwrap();
        quota.react_to_sale(400.0).unwrap();
        quota.react_to_sale(400.0).unwrap();
        assert_eq!(quota.remaining().unwrap(), 200.0);
        let third = quota.react_to_sale(400.0);
        assert!(matches!(
            third,
            Err(RegulationError::Quota(QuotaError::Overdrawn { .. }))
        ));
        assert_eq!(quota.remaining().unwrap(), 200.0);
    }

    #[test]
    fn yearly_reset_restores_the_allowance() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut quota =
            MonoQuota::new(1000.0, ResetCadence::Yearly, Ownership::Exclusive).unwrap();
        quota.start(&mut model, &vessel).unwrap();
        quota.react_to_sale(750.0).unwrap();
        for _ in 0..365 {
            model.advance_day().unwrap();
        }
        assert_eq!(quota.remaining().unwrap(), 1000.0);
    }

    #[test]
    fn periodic_reset_fires_every_n_days() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut quota =
            MonoQuota::new(100.0, ResetCadence::EveryDays(30), Ownership::Exclusive).unwrap();
        quota.start(&mut model, &vessel).unwrap();
        quota.react_to_sale(90.0).unwrap();
        for _ in 0..29 {
            model.advance_day().unwrap();
        }
        assert_eq!(quota.remaining().unwrap(), 10.0);
        model.advance_day().unwrap();
        assert_eq!(quota.remaining().unwrap(), 100.0);
    }

    #[test]
    fn double_start_is_a_configuration_error() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut quota =
            MonoQuota::new(1000.0, ResetCadence::Yearly, Ownership::Exclusive).unwrap();
        quota.start(&mut model, &vessel).unwrap();
        assert!(matches!(
            quota.start(&mut model, &vessel),
            Err(RegulationError::AlreadyStarted { .. })
        ));
    }

    #[test]
    fn turn_off_cancels_the_reset_task() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut quota =
            MonoQuota::new(1000.0, ResetCadence::Yearly, Ownership::Exclusive).unwrap();
        quota.start(&mut model, &vessel).unwrap();
        quota.react_to_sale(600.0).unwrap();
        quota.turn_off(&mut model, &vessel);
        for _ in 0..365 {
            model.advance_day().unwrap();
        }
        assert_eq!(quota.remaining().unwrap(), 400.0);
        assert!(model.schedule_mut().is_empty());
    }

    #[test]
    fn itq_pricing_charges_foregone_sales_until_turned_off() {
        let mut model = model();
        model.order_books().record_close(SpeciesId(0), 2.0).unwrap();
        let mut vessel = Vessel::new("tester", PortId::new());
        let mut quota = MonoQuota::new(1000.0, ResetCadence::Yearly, Ownership::Exclusive)
            .unwrap()
            .with_itq_pricing();
        quota.start(&mut model, &vessel).unwrap();

        vessel.depart(2);
        vessel.record_sale(SpeciesId(0), 100.0, 300.0).unwrap();
        let trip = model.settle_trip(&mut vessel).unwrap();
        assert_eq!(trip.opportunity_costs, 200.0);

        quota.turn_off(&mut model, &vessel);
        vessel.depart(2);
        vessel.record_sale(SpeciesId(0), 100.0, 300.0).unwrap();
        let trip = model.settle_trip(&mut vessel).unwrap();
        assert_eq!(trip.opportunity_costs, 0.0);
    }

    #[test]
    fn multi_quota_gates_on_protection_until_disabled() {
        let mut map = SeaMap::uniform(2, 2, -50.0).unwrap();
        map.paint_mpa(fathom_types::MpaId::new(), (0, 0), (0, 0))
            .unwrap();
        let closed = map.tile(0, 0).unwrap().clone();
        let open = map.tile(1, 1).unwrap().clone();

        let mut quota = MultiQuota::new(
            vec![100.0, 50.0],
            ResetCadence::Yearly,
            Ownership::Exclusive,
        )
        .unwrap();
        assert!(!quota.can_fish_here(&closed).unwrap());
        assert!(quota.can_fish_here(&open).unwrap());
        quota.set_respect_protected_areas(false);
        assert!(quota.can_fish_here(&closed).unwrap());
    }

    #[test]
    fn any_pool_positive_keeps_the_fleet_at_sea() {
        let mut quota = MultiQuota::new(
            vec![100.0, 50.0],
            ResetCadence::Yearly,
            Ownership::Exclusive,
        )
        .unwrap();
        quota.react_to_sale(SpeciesId(0), 100.0, 10).unwrap();
        assert!(quota.allowed_at_sea().unwrap());
        quota.react_to_sale(SpeciesId(1), 50.0, 12).unwrap();
        assert!(!quota.allowed_at_sea().unwrap());
        assert_eq!(quota.season_length(SpeciesId(0), 365).unwrap(), 10);
        assert_eq!(quota.season_length(SpeciesId(1), 365).unwrap(), 12);
    }

    #[test]
    fn exclusive_copy_is_independent_but_shared_copy_aliases() {
        let exclusive = MonoQuota::new(100.0, ResetCadence::Yearly, Ownership::Exclusive).unwrap();
        let mut copy = exclusive.make_copy().unwrap();
        copy.react_to_sale(60.0).unwrap();
        assert_eq!(exclusive.remaining().unwrap(), 100.0);

        let shared = MonoQuota::new(100.0, ResetCadence::Yearly, Ownership::PoolShared).unwrap();
        let mut alias = shared.make_copy().unwrap();
        alias.react_to_sale(60.0).unwrap();
        assert_eq!(shared.remaining().unwrap(), 40.0);
    }

    #[test]
    fn species_quota_filters_sales_and_never_gates() {
        let mut quota = SpeciesQuota::new(
            SpeciesId(1),
            100.0,
            ResetCadence::Yearly,
            Ownership::Exclusive,
        )
        .unwrap();
        quota.react_to_sale(SpeciesId(0), 500.0).unwrap();
        assert_eq!(quota.remaining(SpeciesId(1)).unwrap(), 100.0);
        quota.react_to_sale(SpeciesId(1), 40.0).unwrap();
        assert_eq!(quota.remaining(SpeciesId(1)).unwrap(), 60.0);
        assert_eq!(
            quota.maximum_biomass_sellable(SpeciesId(0)).unwrap(),
            f64::INFINITY
        );
    }
}
