//! Opportunity-cost estimators charged at trip settlement.
//!
//! When a vessel docks, every cost source registered for it is asked to
//! price the trip; the signed results are folded into the trip ledger's
//! opportunity-cost total. Missing price or indicator data is a soft
//! gap: the source simply contributes `0` that trip.

use std::cell::RefCell;
use std::rc::Rc;

use fathom_quota::SharedLedger;
use fathom_types::SpeciesId;
use fathom_vessel::{TripRecord, Vessel};
use tracing::warn;

use crate::error::MarketError;
use crate::moving_average::MovingAverage;
use crate::order_book::SharedOrderBooks;

/// Default smoothing window for fleet-average estimators, in daily
/// observations.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Something that can price the opportunity cost of a finished trip.
///
/// Positive costs mean the trip left money on the table; negative costs
/// mean it out-performed the relevant baseline.
pub trait TripCostSource: core::fmt::Debug {
    /// Short label for log messages.
    fn label(&self) -> &'static str;

    /// Price the opportunity cost of `trip` for `vessel`.
    fn trip_cost(
        &self,
        vessel: &Vessel,
        trip: &TripRecord,
        day_of_year: u32,
        days_in_year: u32,
    ) -> f64;
}

/// A registered cost source, shared between the rule that owns it and
/// the settlement pass.
pub type SharedCostSource = Rc<RefCell<dyn TripCostSource>>;

// ---------------------------------------------------------------------------
// ITQ adapter
// ---------------------------------------------------------------------------

/// Foregone quota-sale revenue under an individual transferable quota.
///
/// Every kilogram sold is a kilogram of quota the vessel could have sold
/// on the market instead, so each species with positive sold biomass and
/// a finite closing price contributes `closing price x biomass sold`.
/// Species without a price signal yet contribute nothing.
#[derive(Debug, Clone)]
pub struct ItqCostAdapter {
    /// The run-wide closing-price registry.
    books: SharedOrderBooks,
}

impl ItqCostAdapter {
    /// Create an adapter against the run-wide order books.
    pub const fn new(books: SharedOrderBooks) -> Self {
        Self { books }
    }
}

impl TripCostSource for ItqCostAdapter {
    fn label(&self) -> &'static str {
        "itq-foregone-quota-sales"
    }

    fn trip_cost(
        &self,
        _vessel: &Vessel,
        trip: &TripRecord,
        _day_of_year: u32,
        _days_in_year: u32,
    ) -> f64 {
        let mut total = 0.0;
        for (index, &sold) in trip.sold.iter().enumerate() {
            if sold <= 0.0 {
                continue;
            }
            let price = self.books.closing_price(SpeciesId(index));
            if price.is_finite() {
                total += price * sold;
            }
        }
        total
    }
}

// ---------------------------------------------------------------------------
// Smoothed fleet-average estimator
// ---------------------------------------------------------------------------

/// Opportunity cost of deviating from the fleet's catch rate under a
/// binding shared total allowable catch.
///
/// Maintains fixed-window moving averages of daily fleet landings per
/// species and of daily fleet hours at sea. At settlement, for each
/// species whose shared pool is projected to run out before the year
/// does (`smoothed daily landings x days left >= remaining`), the trip
/// is charged `(fleet hourly rate - own hourly rate) x trip hours x
/// observed price`: positive when the vessel under-fished its share of a
/// cap that others will exhaust anyway, negative when it over-fished.
#[derive(Debug)]
pub struct SmoothedFleetCosts {
    /// The shared cap being raced.
    pool: SharedLedger,
    /// Smoothed daily fleet landings, per species.
    landings: Vec<MovingAverage>,
    /// Smoothed daily fleet hours at sea.
    hours: MovingAverage,
    /// Last observed price per species; NaN until observed.
    last_prices: Vec<f64>,
}

impl SmoothedFleetCosts {
    /// Create an estimator over `species_count` species against the
    /// given shared ledger.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ZeroWindow`] for a zero smoothing window.
    pub fn new(
        pool: SharedLedger,
        species_count: usize,
        window: usize,
    ) -> Result<Self, MarketError> {
        let mut landings = Vec::with_capacity(species_count);
        for _ in 0..species_count {
            landings.push(MovingAverage::new(window)?);
        }
        Ok(Self {
            pool,
            landings,
            hours: MovingAverage::new(window)?,
            last_prices: vec![f64::NAN; species_count],
        })
    }

    /// Feed one day of fleet-wide observations: total landings per
    /// species, total hours at sea, and observed per-species prices
    /// (NaN entries leave the previous price in place).
    pub fn observe_day(&mut self, fleet_landings: &[f64], fleet_hours: f64, prices: &[f64]) {
        for (average, &landed) in self.landings.iter_mut().zip(fleet_landings) {
            average.observe(landed);
        }
        self.hours.observe(fleet_hours);
        for (slot, &price) in self.last_prices.iter_mut().zip(prices) {
            if price.is_finite() {
                *slot = price;
            }
        }
    }

    /// Whether one species' shared pool is projected to bind this year.
    fn is_binding(&self, species: SpeciesId, smoothed_daily: f64, days_left: f64) -> bool {
        let remaining = match self.pool.remaining(species) {
            Ok(remaining) => remaining,
            Err(error) => {
                warn!(%species, %error, "cannot read shared pool; treating cap as slack");
                return false;
            }
        };
        smoothed_daily * days_left >= remaining
    }
}

impl TripCostSource for SmoothedFleetCosts {
    fn label(&self) -> &'static str {
        "smoothed-fleet-average"
    }

    fn trip_cost(
        &self,
        _vessel: &Vessel,
        trip: &TripRecord,
        day_of_year: u32,
        days_in_year: u32,
    ) -> f64 {
        if !self.hours.is_ready() {
            return 0.0;
        }
        let fleet_daily_hours = self.hours.average();
        if fleet_daily_hours.is_nan() || fleet_daily_hours <= 0.0 {
            return 0.0;
        }
        let days_left = f64::from(days_in_year.saturating_sub(day_of_year));
        let mut total = 0.0;
        for (index, average) in self.landings.iter().enumerate() {
            if !average.is_ready() {
                continue;
            }
            let species = SpeciesId(index);
            let smoothed_daily = average.average();
            if !self.is_binding(species, smoothed_daily, days_left) {
                continue;
            }
            let price = self.last_prices.get(index).copied().unwrap_or(f64::NAN);
            if !price.is_finite() {
                continue;
            }
            let fleet_rate = smoothed_daily / fleet_daily_hours;
            let own_rate = trip.hourly_landing_rate(species);
            total += (fleet_rate - own_rate) * trip.hours_at_sea * price;
        }
        total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fathom_quota::MultiQuotaLedger;
    use fathom_types::PortId;

    use super::*;

    fn vessel_with_trip(sold: Vec<f64>, landings: Vec<f64>, hours: f64) -> (Vessel, TripRecord) {
        let vessel = Vessel::new("tester", PortId::new());
        let mut trip = TripRecord::new(sold.len());
        trip.sold = sold;
        trip.landings = landings;
        trip.hours_at_sea = hours;
        (vessel, trip)
    }

    #[test]
    fn itq_cost_is_price_times_sold() {
        let books = SharedOrderBooks::new();
        books.record_close(SpeciesId(0), 2.0).unwrap();
        books.record_close(SpeciesId(1), 5.0).unwrap();
        let adapter = ItqCostAdapter::new(books);
        let (vessel, trip) = vessel_with_trip(vec![100.0, 10.0], vec![100.0, 10.0], 24.0);
        assert_eq!(adapter.trip_cost(&vessel, &trip, 30, 365), 250.0);
    }

    #[test]
    fn itq_cost_skips_unpriced_species() {
        let books = SharedOrderBooks::new();
        books.record_close(SpeciesId(0), 2.0).unwrap();
        let adapter = ItqCostAdapter::new(books);
        // Species 1 has sales but no market close yet.
        let (vessel, trip) = vessel_with_trip(vec![50.0, 400.0], vec![50.0, 400.0], 24.0);
        assert_eq!(adapter.trip_cost(&vessel, &trip, 30, 365), 100.0);
    }

    #[test]
    fn itq_cost_is_zero_without_any_price() {
        let adapter = ItqCostAdapter::new(SharedOrderBooks::new());
        let (vessel, trip) = vessel_with_trip(vec![50.0], vec![50.0], 24.0);
        assert_eq!(adapter.trip_cost(&vessel, &trip, 30, 365), 0.0);
    }

    fn warmed_estimator(pool_remaining: f64) -> SmoothedFleetCosts {
        let pool = SharedLedger::pool_shared(MultiQuotaLedger::new(vec![pool_remaining]).unwrap());
        let mut est = SmoothedFleetCosts::new(pool, 1, 3).unwrap();
        // Fleet lands 240 kg over 24 hours daily: 10 kg/hour.
        for _ in 0..3 {
            est.observe_day(&[240.0], 24.0, &[2.0]);
        }
        est
    }

    #[test]
    fn under_fisher_pays_positive_cost_when_cap_binds() {
        // 240 kg/day x ~335 days left dwarfs the 1000 kg cap: binding.
        let est = warmed_estimator(1000.0);
        // Agent caught 5 kg/hour over a 10-hour trip; fleet rate is 10.
        let (vessel, trip) = vessel_with_trip(vec![50.0], vec![50.0], 10.0);
        let cost = est.trip_cost(&vessel, &trip, 30, 365);
        // (10 - 5) kg/h x 10 h x 2.0 = 100
        assert!((cost - 100.0).abs() < 1e-9);
    }

    #[test]
    fn over_fisher_earns_negative_cost() {
        let est = warmed_estimator(1000.0);
        let (vessel, trip) = vessel_with_trip(vec![200.0], vec![200.0], 10.0);
        let cost = est.trip_cost(&vessel, &trip, 30, 365);
        // (10 - 20) kg/h x 10 h x 2.0 = -200
        assert!((cost + 200.0).abs() < 1e-9);
    }

    #[test]
    fn slack_cap_charges_nothing() {
        // Cap so large the fleet cannot exhaust it this year.
        let est = warmed_estimator(1.0e9);
        let (vessel, trip) = vessel_with_trip(vec![50.0], vec![50.0], 10.0);
        assert_eq!(est.trip_cost(&vessel, &trip, 30, 365), 0.0);
    }

    #[test]
    fn cold_estimator_charges_nothing() {
        let pool = SharedLedger::pool_shared(MultiQuotaLedger::new(vec![10.0]).unwrap());
        let mut est = SmoothedFleetCosts::new(pool, 1, 5).unwrap();
        est.observe_day(&[240.0], 24.0, &[2.0]);
        let (vessel, trip) = vessel_with_trip(vec![50.0], vec![50.0], 10.0);
        assert_eq!(est.trip_cost(&vessel, &trip, 30, 365), 0.0);
    }
}
