//! Hysteretic switching between two whole sub-policies.
//!
//! Once a year, after the year's indicator observation exists, the
//! switch reads a named column from the model's yearly series and
//! applies a dual-threshold transition: below `low` it enters the
//! emergency regime, above `high` it returns to business as usual.
//! Readings inside the band leave the regime unchanged, so the policy
//! cannot chatter around a single threshold. A missing or non-finite
//! reading skips the cycle entirely.

use std::cell::Cell;
use std::rc::Rc;

use fathom_sim::Model;
use fathom_sim::schedule::{StepOrder, TaskCadence, TaskHandle};
use fathom_types::SpeciesId;
use fathom_vessel::Vessel;
use fathom_world::SeaTile;
use tracing::info;

use crate::error::RegulationError;
use crate::regulation::Regulation;

/// Which of the two sub-policies is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// The default policy.
    BusinessAsUsual,
    /// The restrictive policy entered when the indicator collapses.
    Emergency,
}

/// A two-policy controller with a hysteresis band.
#[derive(Debug)]
pub struct RegimeSwitch {
    indicator: String,
    low: f64,
    high: f64,
    business: Box<Regulation>,
    emergency: Box<Regulation>,
    state: Rc<Cell<Regime>>,
    task: Option<TaskHandle>,
}

impl RegimeSwitch {
    /// Build a switch starting in business as usual.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::InvalidThresholds`] unless
    /// `low <= high` (NaN thresholds are rejected by the same check).
    pub fn new(
        indicator: impl Into<String>,
        low: f64,
        high: f64,
        business: Regulation,
        emergency: Regulation,
    ) -> Result<Self, RegulationError> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(RegulationError::InvalidThresholds { low, high });
        }
        Ok(Self {
            indicator: indicator.into(),
            low,
            high,
            business: Box::new(business),
            emergency: Box::new(emergency),
            state: Rc::new(Cell::new(Regime::BusinessAsUsual)),
            task: None,
        })
    }

    /// The regime currently in force.
    pub fn current(&self) -> Regime {
        self.state.get()
    }

    /// The indicator column this switch watches.
    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    fn active(&self) -> &Regulation {
        match self.state.get() {
            Regime::BusinessAsUsual => &self.business,
            Regime::Emergency => &self.emergency,
        }
    }

    fn active_mut(&mut self) -> &mut Regulation {
        match self.state.get() {
            Regime::BusinessAsUsual => &mut self.business,
            Regime::Emergency => &mut self.emergency,
        }
    }

    /// Location gate of the regime in force.
    pub fn can_fish_here(
        &self,
        vessel: &Vessel,
        tile: &SeaTile,
        model: &Model,
    ) -> Result<bool, RegulationError> {
        self.active().can_fish_here(vessel, tile, model)
    }

    /// Sale cap of the regime in force.
    pub fn maximum_biomass_sellable(
        &self,
        vessel: &Vessel,
        species: SpeciesId,
        model: &Model,
    ) -> Result<f64, RegulationError> {
        self.active().maximum_biomass_sellable(vessel, species, model)
    }

    /// At-sea gate of the regime in force.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        self.active().allowed_at_sea(vessel, model)
    }

    /// Forward a catch event to the regime in force.
    #[allow(clippy::too_many_arguments)]
    pub fn react_to_catch(
        &mut self,
        tile: &SeaTile,
        vessel: &mut Vessel,
        caught: &[f64],
        retained: &[f64],
        hours_fishing: f64,
        model: &mut Model,
    ) -> Result<(), RegulationError> {
        self.active_mut()
            .react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
    }

    /// Forward a sale event to the regime in force.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        vessel: &mut Vessel,
        biomass: f64,
        revenue: f64,
        model: &mut Model,
    ) -> Result<(), RegulationError> {
        self.active_mut()
            .react_to_sale(species, vessel, biomass, revenue, model)
    }

    /// Start both sub-policies and register the yearly evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::AlreadyStarted`] on a second call.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if self.task.is_some() {
            return Err(RegulationError::AlreadyStarted {
                kind: "regime switch",
            });
        }
        self.business.start(model, vessel)?;
        self.emergency.start(model, vessel)?;

        let state = Rc::clone(&self.state);
        let indicator = self.indicator.clone();
        let (low, high) = (self.low, self.high);
        let task =
            model
                .schedule_mut()
                .register(StepOrder::PolicyUpdate, TaskCadence::Yearly, move |ctx| {
                    let reading = ctx.series.latest(&indicator);
                    if !reading.is_finite() {
                        return Ok(());
                    }
                    match state.get() {
                        Regime::BusinessAsUsual if reading < low => {
                            state.set(Regime::Emergency);
                            info!(%indicator, reading, low, "regime switched to emergency");
                        }
                        Regime::Emergency if reading > high => {
                            state.set(Regime::BusinessAsUsual);
                            info!(%indicator, reading, high, "regime switched back to business as usual");
                        }
                        _ => {}
                    }
                    Ok(())
                });
        self.task = Some(task);
        Ok(())
    }

    /// Cancel the yearly evaluation and turn off both sub-policies.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if let Some(task) = self.task.take() {
            model.schedule_mut().cancel(task);
        }
        self.business.turn_off(model, vessel)?;
        self.emergency.turn_off(model, vessel)
    }

    /// Copy for a different vessel, flattened to the regime currently
    /// in force. The copy no longer switches.
    pub fn make_copy(&self) -> Result<Regulation, RegulationError> {
        self.active().make_copy()
    }

    /// Whether the regime in force is quota-capable.
    pub fn is_quota_capable(&self) -> bool {
        self.active().is_quota_capable()
    }

    /// Quota read through the regime in force.
    pub fn quota_remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        self.active().quota_remaining(species)
    }

    /// Quota write through the regime in force.
    pub fn set_quota_remaining(
        &mut self,
        species: SpeciesId,
        value: f64,
    ) -> Result<(), RegulationError> {
        self.active_mut().set_quota_remaining(species, value)
    }

    /// Forward the protected-area toggle to both sub-policies.
    pub fn set_respect_protected_areas(&mut self, respect: bool) {
        self.business.set_respect_protected_areas(respect);
        self.emergency.set_respect_protected_areas(respect);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fathom_types::{PortId, SpeciesCatalog};
    use fathom_world::SeaMap;

    use super::*;

    fn model() -> Model {
        Model::new(
            9,
            SpeciesCatalog::from_names(["cod"]),
            SeaMap::uniform(2, 2, -60.0).unwrap(),
        )
    }

    fn switch() -> RegimeSwitch {
        RegimeSwitch::new(
            "biomass-index",
            0.2,
            0.5,
            Regulation::Anarchy,
            Regulation::Banned,
        )
        .unwrap()
    }

    fn advance_year(model: &mut Model) {
        for _ in 0..365 {
            model.advance_day().unwrap();
        }
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(matches!(
            RegimeSwitch::new("x", 0.5, 0.2, Regulation::Anarchy, Regulation::Banned),
            Err(RegulationError::InvalidThresholds { .. })
        ));
        assert!(
            RegimeSwitch::new("x", f64::NAN, 0.2, Regulation::Anarchy, Regulation::Banned)
                .is_err()
        );
    }

    #[test]
    fn hysteresis_band_prevents_chatter() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut switch = switch();
        switch.start(&mut model, &vessel).unwrap();

        // Healthy reading: stays in business as usual.
        model.record_indicator("biomass-index", 0.6);
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::BusinessAsUsual);

        // Collapse below the low threshold: emergency.
        model.record_indicator("biomass-index", 0.1);
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::Emergency);

        // Inside the band: no change either way.
        model.record_indicator("biomass-index", 0.3);
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::Emergency);

        // Recovery above the high threshold: back to business.
        model.record_indicator("biomass-index", 0.6);
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::BusinessAsUsual);
    }

    #[test]
    fn missing_indicator_skips_the_cycle() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut switch = switch();
        switch.start(&mut model, &vessel).unwrap();
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::BusinessAsUsual);
    }

    #[test]
    fn gates_follow_the_regime_in_force() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut switch = switch();
        switch.start(&mut model, &vessel).unwrap();
        assert!(switch.allowed_at_sea(&vessel, &model).unwrap());

        model.record_indicator("biomass-index", 0.1);
        advance_year(&mut model);
        assert!(!switch.allowed_at_sea(&vessel, &model).unwrap());
    }

    #[test]
    fn copy_flattens_to_the_current_regime() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut switch = switch();
        switch.start(&mut model, &vessel).unwrap();
        model.record_indicator("biomass-index", 0.1);
        advance_year(&mut model);

        let copy = switch.make_copy().unwrap();
        assert_eq!(copy.kind_name(), "banned");
    }

    #[test]
    fn turn_off_stops_switching() {
        let mut model = model();
        let vessel = Vessel::new("tester", PortId::new());
        let mut switch = switch();
        switch.start(&mut model, &vessel).unwrap();
        switch.turn_off(&mut model, &vessel).unwrap();
        model.record_indicator("biomass-index", 0.1);
        advance_year(&mut model);
        assert_eq!(switch.current(), Regime::BusinessAsUsual);
    }
}
