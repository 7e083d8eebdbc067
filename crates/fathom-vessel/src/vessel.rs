//! The vessel: the agent state regulations query and mutate.
//!
//! Regulations read the dock state, port dwell time, and tag set; they
//! mutate the fine account and the forced-return flag (enforcement), and
//! the trip ledger (opportunity costs at settlement).

use std::collections::BTreeSet;

use fathom_types::{PortId, SpeciesId, VesselId};
use tracing::debug;

use crate::error::VesselError;
use crate::trip::TripRecord;

/// Runtime state of one fishing vessel.
#[derive(Debug, Clone)]
pub struct Vessel {
    /// Unique identifier.
    id: VesselId,
    /// Display name, for log and error messages.
    name: String,
    /// Free-form tags driving tag-conditional regulations.
    tags: BTreeSet<String>,
    /// The port this vessel docks at.
    home_port: PortId,
    /// Whether the vessel is currently docked.
    docked: bool,
    /// Hours spent at port since last docking; reset on departure.
    hours_at_port: f64,
    /// Cumulative fines charged by enforcement.
    fines_paid: f64,
    /// Set when enforcement orders the vessel back to port early.
    forced_return: bool,
    /// Ledger of the trip underway, if any.
    trip: Option<TripRecord>,
}

impl Vessel {
    /// Create a docked vessel with no trip underway.
    pub fn new(name: impl Into<String>, home_port: PortId) -> Self {
        Self {
            id: VesselId::new(),
            name: name.into(),
            tags: BTreeSet::new(),
            home_port,
            docked: true,
            hours_at_port: 0.0,
            fines_paid: 0.0,
            forced_return: false,
            trip: None,
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> VesselId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The vessel's home port.
    pub const fn home_port(&self) -> PortId {
        self.home_port
    }

    /// Attach a tag (e.g. a fleet segment like `"trawler"` or `"north"`).
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// The vessel's tag set.
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether any of the given tags is carried by this vessel.
    pub fn has_any_tag<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().any(|t| self.tags.contains(t))
    }

    /// Whether the vessel is currently docked.
    pub const fn is_docked(&self) -> bool {
        self.docked
    }

    /// Hours spent at port since last docking.
    pub const fn hours_at_port(&self) -> f64 {
        self.hours_at_port
    }

    /// Cumulative fines charged by enforcement.
    pub const fn fines_paid(&self) -> f64 {
        self.fines_paid
    }

    /// Whether enforcement has ordered this vessel back to port.
    pub const fn is_forced_back(&self) -> bool {
        self.forced_return
    }

    /// The trip currently underway, if any.
    pub const fn trip(&self) -> Option<&TripRecord> {
        self.trip.as_ref()
    }

    /// Mutable access to the trip currently underway.
    ///
    /// # Errors
    ///
    /// Returns [`VesselError::NoTripUnderway`] while docked with no trip.
    pub fn trip_mut(&mut self) -> Result<&mut TripRecord, VesselError> {
        let id = self.id;
        self.trip
            .as_mut()
            .ok_or(VesselError::NoTripUnderway { vessel: id })
    }

    /// Leave port, opening a fresh trip ledger sized for `species_count`
    /// species. Clears the forced-return flag and the port dwell clock.
    pub fn depart(&mut self, species_count: usize) {
        self.docked = false;
        self.hours_at_port = 0.0;
        self.forced_return = false;
        self.trip = Some(TripRecord::new(species_count));
    }

    /// Dock at the home port, closing and returning the trip ledger.
    ///
    /// # Errors
    ///
    /// Returns [`VesselError::NoTripUnderway`] if there is no open trip.
    pub fn dock(&mut self) -> Result<TripRecord, VesselError> {
        self.docked = true;
        self.hours_at_port = 0.0;
        let id = self.id;
        self.trip
            .take()
            .ok_or(VesselError::NoTripUnderway { vessel: id })
    }

    /// Advance the port dwell clock while docked, or the at-sea clock of
    /// the open trip otherwise.
    pub fn log_hours(&mut self, hours: f64) {
        if self.docked {
            self.hours_at_port += hours;
        } else if let Some(trip) = self.trip.as_mut() {
            trip.hours_at_sea += hours;
        }
    }

    /// Record retained catch into the open trip ledger.
    ///
    /// # Errors
    ///
    /// Returns [`VesselError::NoTripUnderway`] if there is no open trip,
    /// or [`VesselError::UnknownSpecies`] for an out-of-range species.
    pub fn record_landing(&mut self, species: SpeciesId, kg: f64) -> Result<(), VesselError> {
        let id = self.id;
        let trip = self.trip_mut()?;
        let slot = trip
            .landings
            .get_mut(species.index())
            .ok_or(VesselError::UnknownSpecies {
                vessel: id,
                species,
            })?;
        *slot += kg;
        Ok(())
    }

    /// Record a sale into the open trip ledger.
    ///
    /// # Errors
    ///
    /// Returns [`VesselError::NoTripUnderway`] if there is no open trip,
    /// or [`VesselError::UnknownSpecies`] for an out-of-range species.
    pub fn record_sale(
        &mut self,
        species: SpeciesId,
        kg: f64,
        revenue: f64,
    ) -> Result<(), VesselError> {
        let id = self.id;
        let trip = self.trip_mut()?;
        let slot = trip
            .sold
            .get_mut(species.index())
            .ok_or(VesselError::UnknownSpecies {
                vessel: id,
                species,
            })?;
        *slot += kg;
        trip.earnings += revenue;
        Ok(())
    }

    /// Charge an enforcement fine.
    ///
    /// # Errors
    ///
    /// Returns [`VesselError::NegativeAmount`] for a negative fine.
    pub fn charge_fine(&mut self, amount: f64) -> Result<(), VesselError> {
        if amount < 0.0 {
            return Err(VesselError::NegativeAmount {
                vessel: self.id,
                amount,
            });
        }
        self.fines_paid += amount;
        debug!(vessel = %self.id, amount, "fine charged");
        Ok(())
    }

    /// Order the vessel back to port early (enforcement caught it inside
    /// a protected area).
    pub fn force_back_to_port(&mut self) {
        self.forced_return = true;
    }
}
