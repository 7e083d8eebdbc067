//! Per-trip accounting: landings, sales, earnings, opportunity costs.

use fathom_types::SpeciesId;
use serde::{Deserialize, Serialize};

/// The ledger of one fishing trip.
///
/// Landings and sales are tracked per species (dense array indexed by
/// [`SpeciesId`]). Opportunity costs are a signed total: positive values
/// mean the trip left money on the table (e.g. foregone quota sales),
/// negative values mean the trip out-performed the fleet under a shared
/// cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Hours spent at sea so far this trip.
    pub hours_at_sea: f64,
    /// Biomass caught and retained, in kg, per species.
    pub landings: Vec<f64>,
    /// Biomass sold, in kg, per species.
    pub sold: Vec<f64>,
    /// Revenue from sales.
    pub earnings: f64,
    /// Signed opportunity-cost total recorded at settlement.
    pub opportunity_costs: f64,
}

impl TripRecord {
    /// Create an empty trip ledger sized for `species_count` species.
    pub fn new(species_count: usize) -> Self {
        Self {
            hours_at_sea: 0.0,
            landings: vec![0.0; species_count],
            sold: vec![0.0; species_count],
            earnings: 0.0,
            opportunity_costs: 0.0,
        }
    }

    /// Biomass sold of one species, or `0` for an out-of-range index.
    pub fn sold_of(&self, species: SpeciesId) -> f64 {
        self.sold.get(species.index()).copied().unwrap_or(0.0)
    }

    /// Biomass landed of one species, or `0` for an out-of-range index.
    pub fn landed_of(&self, species: SpeciesId) -> f64 {
        self.landings.get(species.index()).copied().unwrap_or(0.0)
    }

    /// The trip's own catch rate for one species, in kg per hour at sea.
    ///
    /// Returns `0` for a zero-hour trip.
    pub fn hourly_landing_rate(&self, species: SpeciesId) -> f64 {
        if self.hours_at_sea <= 0.0 {
            return 0.0;
        }
        self.landed_of(species) / self.hours_at_sea
    }

    /// Add a signed opportunity cost to the trip total.
    pub fn record_opportunity_cost(&mut self, cost: f64) {
        self.opportunity_costs += cost;
    }
}
