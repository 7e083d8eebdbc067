//! The model aggregate that regulations `start` against.
//!
//! Owns the clock, the schedule, the geography, the species catalog,
//! the yearly indicator store, the run-wide order books, the seeded
//! random source, and the per-vessel cost-source registry. One model
//! exists per simulation run; everything in it lives on a single
//! logical thread of simulated time.

use std::collections::BTreeMap;
use std::rc::Rc;

use fathom_market::{SharedCostSource, SharedOrderBooks};
use fathom_types::{DAYS_PER_YEAR, PortId, SpeciesCatalog, VesselId};
use fathom_vessel::{TripRecord, Vessel};
use fathom_world::{Port, SeaMap};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::clock::SimClock;
use crate::error::SimError;
use crate::schedule::{Schedule, StepContext, TaskCadence};
use crate::series::YearlySeries;

/// The simulation world as regulations see it.
#[derive(Debug)]
pub struct Model {
    catalog: SpeciesCatalog,
    map: SeaMap,
    ports: BTreeMap<PortId, Port>,
    clock: SimClock,
    series: YearlySeries,
    schedule: Schedule,
    rng: StdRng,
    books: SharedOrderBooks,
    /// Opportunity-cost estimators, per vessel, in registration order.
    cost_sources: BTreeMap<VesselId, Vec<SharedCostSource>>,
}

impl Model {
    /// Create a model at day 0 with a deterministic random source.
    pub fn new(seed: u64, catalog: SpeciesCatalog, map: SeaMap) -> Self {
        Self {
            catalog,
            map,
            ports: BTreeMap::new(),
            clock: SimClock::new(),
            series: YearlySeries::new(),
            schedule: Schedule::new(),
            rng: StdRng::seed_from_u64(seed),
            books: SharedOrderBooks::new(),
            cost_sources: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The species catalog.
    pub const fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    /// The sea map.
    pub const fn map(&self) -> &SeaMap {
        &self.map
    }

    /// Mutable access to the sea map (zoning changes mid-run).
    pub const fn map_mut(&mut self) -> &mut SeaMap {
        &mut self.map
    }

    /// The world clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The yearly indicator store.
    pub const fn series(&self) -> &YearlySeries {
        &self.series
    }

    /// The schedule of periodic policy tasks.
    pub const fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    /// The run-wide order books handle.
    pub fn order_books(&self) -> SharedOrderBooks {
        self.books.clone()
    }

    /// The deterministic random source.
    pub const fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Register a port.
    pub fn add_port(&mut self, port: Port) {
        self.ports.insert(port.id, port);
    }

    /// Look up a port by id.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Append this year's observation of a named indicator.
    pub fn record_indicator(&mut self, name: impl Into<String>, value: f64) {
        self.series.append(name, value);
    }

    /// Advance the world by one day, then run the daily tasks and, on a
    /// year boundary, the yearly tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ClockOverflow`] on day-counter overflow, or
    /// [`SimError::Task`] on the first scheduled-task failure.
    pub fn advance_day(&mut self) -> Result<(), SimError> {
        self.clock.advance_day()?;
        let ctx = StepContext {
            clock: &self.clock,
            series: &self.series,
        };
        self.schedule.run_boundary(TaskCadence::Daily, &ctx)?;
        if self.clock.is_year_start() {
            debug!(year = self.clock.year(), "year boundary");
            self.schedule.run_boundary(TaskCadence::Yearly, &ctx)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Trip settlement
    // -----------------------------------------------------------------------

    /// Register an opportunity-cost estimator for a vessel.
    pub fn register_cost_source(&mut self, vessel: VesselId, source: SharedCostSource) {
        self.cost_sources.entry(vessel).or_default().push(source);
    }

    /// Remove a previously registered estimator; returns whether it was
    /// found. Handles are matched by identity.
    pub fn unregister_cost_source(&mut self, vessel: VesselId, source: &SharedCostSource) -> bool {
        let Some(sources) = self.cost_sources.get_mut(&vessel) else {
            return false;
        };
        let before = sources.len();
        sources.retain(|candidate| !Rc::ptr_eq(candidate, source));
        let removed = before != sources.len();
        if sources.is_empty() {
            self.cost_sources.remove(&vessel);
        }
        removed
    }

    /// Dock a vessel and settle its trip: every cost source registered
    /// for it prices the trip and the signed results are folded into the
    /// returned ledger's opportunity-cost total.
    ///
    /// A cost source that is already borrowed contributes nothing that
    /// trip, matching the soft-gap treatment of missing price data.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Settlement`] if the vessel has no open trip.
    pub fn settle_trip(&mut self, vessel: &mut Vessel) -> Result<TripRecord, SimError> {
        let mut trip = vessel.dock()?;
        let day_of_year = self.clock.day_of_year();
        if let Some(sources) = self.cost_sources.get(&vessel.id()) {
            for source in sources {
                let cost = match source.try_borrow() {
                    Ok(estimator) => {
                        estimator.trip_cost(vessel, &trip, day_of_year, DAYS_PER_YEAR)
                    }
                    Err(_busy) => {
                        warn!(vessel = %vessel.id(), "cost source busy; skipped this trip");
                        continue;
                    }
                };
                trip.record_opportunity_cost(cost);
            }
        }
        debug!(
            vessel = %vessel.id(),
            earnings = trip.earnings,
            opportunity_costs = trip.opportunity_costs,
            "trip settled"
        );
        Ok(trip)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::cell::RefCell;

    use fathom_market::ItqCostAdapter;
    use fathom_types::SpeciesId;

    use super::*;
    use crate::schedule::StepOrder;

    fn model() -> Model {
        Model::new(
            7,
            SpeciesCatalog::from_names(["cod", "haddock"]),
            SeaMap::uniform(4, 4, -100.0).unwrap(),
        )
    }

    #[test]
    fn yearly_tasks_fire_only_on_year_boundaries() {
        let mut model = model();
        let fired = Rc::new(RefCell::new(0u32));
        let f = Rc::clone(&fired);
        model
            .schedule_mut()
            .register(StepOrder::DataReset, TaskCadence::Yearly, move |ctx| {
                assert!(ctx.clock.is_year_start());
                *f.borrow_mut() += 1;
                Ok(())
            });

        for _ in 0..364 {
            model.advance_day().unwrap();
        }
        assert_eq!(*fired.borrow(), 0);
        model.advance_day().unwrap();
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn settlement_folds_in_registered_costs() {
        let mut model = model();
        model
            .order_books()
            .record_close(SpeciesId(0), 2.0)
            .unwrap();

        let mut vessel = Vessel::new("tester", PortId::new());
        let adapter: SharedCostSource =
            Rc::new(RefCell::new(ItqCostAdapter::new(model.order_books())));
        model.register_cost_source(vessel.id(), Rc::clone(&adapter));

        vessel.depart(2);
        vessel.record_landing(SpeciesId(0), 100.0).unwrap();
        vessel.record_sale(SpeciesId(0), 100.0, 300.0).unwrap();
        let trip = model.settle_trip(&mut vessel).unwrap();
        assert_eq!(trip.opportunity_costs, 200.0);
        assert_eq!(trip.earnings, 300.0);
    }

    #[test]
    fn unregistered_source_no_longer_charges() {
        let mut model = model();
        model
            .order_books()
            .record_close(SpeciesId(0), 2.0)
            .unwrap();

        let mut vessel = Vessel::new("tester", PortId::new());
        let adapter: SharedCostSource =
            Rc::new(RefCell::new(ItqCostAdapter::new(model.order_books())));
        model.register_cost_source(vessel.id(), Rc::clone(&adapter));
        assert!(model.unregister_cost_source(vessel.id(), &adapter));
        assert!(!model.unregister_cost_source(vessel.id(), &adapter));

        vessel.depart(2);
        vessel.record_sale(SpeciesId(0), 100.0, 300.0).unwrap();
        let trip = model.settle_trip(&mut vessel).unwrap();
        assert_eq!(trip.opportunity_costs, 0.0);
    }

    #[test]
    fn settling_without_trip_is_an_error() {
        let mut model = model();
        let mut vessel = Vessel::new("tester", PortId::new());
        assert!(model.settle_trip(&mut vessel).is_err());
    }
}
