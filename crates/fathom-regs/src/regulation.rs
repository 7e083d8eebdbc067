//! The closed set of rule kinds and their shared contract.
//!
//! Every rule the engine knows is a variant of [`Regulation`], and
//! every capability is an exhaustive `match`: adding a variant forces
//! every gate, event reaction, and lifecycle hook to say what the new
//! rule does. Behavior lives in the per-kind modules; this file is the
//! dispatch table.

use fathom_sim::Model;
use fathom_types::SpeciesId;
use fathom_vessel::Vessel;
use fathom_world::SeaTile;

use crate::composite::{Bundle, Conjunction, TagAssembly};
use crate::decorators::{ArbitraryPause, OnOff, PortWait, Tagged, Temporal};
use crate::error::RegulationError;
use crate::protected::FinedProtectedAreas;
use crate::quota::{MonoQuota, MultiQuota, SpeciesQuota};
use crate::regime::RegimeSwitch;

/// One rule in a vessel's policy chain.
#[derive(Debug)]
pub enum Regulation {
    /// No restrictions at all.
    Anarchy,
    /// Nothing is ever allowed.
    Banned,
    /// Fishing forbidden on protected tiles; everything else open.
    ProtectedAreas,
    /// Protection enforced by patrols and fines instead of the gate.
    FinedProtectedAreas(FinedProtectedAreas),
    /// One scalar biomass cap covering every species.
    MonoQuota(MonoQuota),
    /// One biomass cap per species.
    MultiQuota(MultiQuota),
    /// Per-species caps that also report season-exhaustion days.
    WeakMultiQuota(MultiQuota),
    /// A single-pool cap accounting for one designated species only.
    SpeciesQuota(SpeciesQuota),
    /// Logical AND over a member list.
    Conjunction(Conjunction),
    /// Tag-driven per-vessel rule materialization.
    TagAssembly(TagAssembly),
    /// The fixed area + season + quota bundle.
    Bundle(Bundle),
    /// Hysteretic switching between two sub-policies.
    RegimeSwitch(RegimeSwitch),
    /// Keeps docked vessels in port during a window of the year.
    Pause(ArbitraryPause),
    /// Applies its inner rule only to vessels carrying a tag.
    Tagged(Tagged),
    /// Applies its inner rule only during a day window.
    Temporal(Temporal),
    /// A kill switch around its inner rule.
    Toggle(OnOff),
    /// Holds docked vessels until a minimum port dwell.
    PortWait(PortWait),
}

impl Regulation {
    /// Stable name of the rule kind, used in assembly inspection and
    /// error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Anarchy => "anarchy",
            Self::Banned => "banned",
            Self::ProtectedAreas => "protected-areas",
            Self::FinedProtectedAreas(_) => "fined-protected-areas",
            Self::MonoQuota(_) => "mono-quota",
            Self::MultiQuota(_) => "multi-quota",
            Self::WeakMultiQuota(_) => "weak-multi-quota",
            Self::SpeciesQuota(_) => "species-quota",
            Self::Conjunction(_) => "conjunction",
            Self::TagAssembly(_) => "tag-assembly",
            Self::Bundle(_) => "bundle",
            Self::RegimeSwitch(_) => "regime-switch",
            Self::Pause(_) => "pause",
            Self::Tagged(_) => "tagged",
            Self::Temporal(_) => "temporal",
            Self::Toggle(_) => "toggle",
            Self::PortWait(_) => "port-wait",
        }
    }

    /// Whether this vessel may fish on this tile right now.
    pub fn can_fish_here(
        &self,
        vessel: &Vessel,
        tile: &SeaTile,
        model: &Model,
    ) -> Result<bool, RegulationError> {
        match self {
            Self::Anarchy => Ok(true),
            Self::Banned => Ok(false),
            Self::ProtectedAreas => Ok(!tile.is_protected()),
            Self::FinedProtectedAreas(rule) => Ok(rule.can_fish_here(tile)),
            Self::MonoQuota(rule) => rule.has_remaining(),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => rule.can_fish_here(tile),
            Self::SpeciesQuota(_) => Ok(true),
            Self::Conjunction(rule) => rule.can_fish_here(vessel, tile, model),
            Self::TagAssembly(rule) => rule.can_fish_here(vessel, tile, model),
            Self::Bundle(rule) => rule.can_fish_here(vessel, tile, model),
            Self::RegimeSwitch(rule) => rule.can_fish_here(vessel, tile, model),
            Self::Pause(rule) => rule.inner().can_fish_here(vessel, tile, model),
            Self::Tagged(rule) => {
                if rule.applies(vessel) {
                    rule.inner().can_fish_here(vessel, tile, model)
                } else {
                    Ok(true)
                }
            }
            Self::Temporal(rule) => {
                if rule.applies(model) {
                    rule.inner().can_fish_here(vessel, tile, model)
                } else {
                    Ok(true)
                }
            }
            Self::Toggle(rule) => {
                if rule.is_active() {
                    rule.inner().can_fish_here(vessel, tile, model)
                } else {
                    Ok(false)
                }
            }
            Self::PortWait(rule) => rule.inner().can_fish_here(vessel, tile, model),
        }
    }

    /// Biomass of one species this vessel may still legally sell.
    ///
    /// `+infinity` means no limit; `0` means the catch must be
    /// discarded.
    pub fn maximum_biomass_sellable(
        &self,
        vessel: &Vessel,
        species: SpeciesId,
        model: &Model,
    ) -> Result<f64, RegulationError> {
        match self {
            Self::Anarchy | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                Ok(f64::INFINITY)
            }
            Self::Banned => Ok(0.0),
            Self::MonoQuota(rule) => rule.remaining(),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => rule.remaining(species),
            Self::SpeciesQuota(rule) => rule.maximum_biomass_sellable(species),
            Self::Conjunction(rule) => rule.maximum_biomass_sellable(vessel, species, model),
            Self::TagAssembly(rule) => rule.maximum_biomass_sellable(vessel, species, model),
            Self::Bundle(rule) => rule.maximum_biomass_sellable(vessel, species, model),
            Self::RegimeSwitch(rule) => rule.maximum_biomass_sellable(vessel, species, model),
            Self::Pause(rule) => rule.inner().maximum_biomass_sellable(vessel, species, model),
            Self::Tagged(rule) => {
                if rule.applies(vessel) {
                    rule.inner().maximum_biomass_sellable(vessel, species, model)
                } else {
                    Ok(f64::INFINITY)
                }
            }
            Self::Temporal(rule) => {
                if rule.applies(model) {
                    rule.inner().maximum_biomass_sellable(vessel, species, model)
                } else {
                    Ok(f64::INFINITY)
                }
            }
            Self::Toggle(rule) => {
                if rule.is_active() {
                    rule.inner().maximum_biomass_sellable(vessel, species, model)
                } else {
                    Ok(0.0)
                }
            }
            Self::PortWait(rule) => rule.inner().maximum_biomass_sellable(vessel, species, model),
        }
    }

    /// Whether this vessel may be (or go) at sea right now.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        match self {
            Self::Anarchy
            | Self::ProtectedAreas
            | Self::FinedProtectedAreas(_)
            | Self::SpeciesQuota(_) => Ok(true),
            Self::Banned => Ok(false),
            Self::MonoQuota(rule) => rule.has_remaining(),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => rule.allowed_at_sea(),
            Self::Conjunction(rule) => rule.allowed_at_sea(vessel, model),
            Self::TagAssembly(rule) => rule.allowed_at_sea(vessel, model),
            Self::Bundle(rule) => rule.allowed_at_sea(vessel, model),
            Self::RegimeSwitch(rule) => rule.allowed_at_sea(vessel, model),
            Self::Pause(rule) => rule.allowed_at_sea(vessel, model),
            Self::Tagged(rule) => {
                if rule.applies(vessel) {
                    rule.inner().allowed_at_sea(vessel, model)
                } else {
                    Ok(true)
                }
            }
            Self::Temporal(rule) => {
                if rule.applies(model) {
                    rule.inner().allowed_at_sea(vessel, model)
                } else {
                    Ok(true)
                }
            }
            Self::Toggle(rule) => {
                if rule.is_active() {
                    rule.inner().allowed_at_sea(vessel, model)
                } else {
                    Ok(false)
                }
            }
            Self::PortWait(rule) => rule.allowed_at_sea(vessel, model),
        }
    }

    /// React to a finished fishing event on a tile.
    ///
    /// `caught` and `retained` are per-species biomass arrays; most
    /// rules ignore them, enforcement rolls its detection lottery.
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
        match self {
            Self::Anarchy
            | Self::Banned
            | Self::ProtectedAreas
            | Self::MonoQuota(_)
            | Self::MultiQuota(_)
            | Self::WeakMultiQuota(_)
            | Self::SpeciesQuota(_) => Ok(()),
            Self::FinedProtectedAreas(rule) => {
                rule.react_to_catch(tile, vessel, hours_fishing, model.rng_mut())
            }
            Self::Conjunction(rule) => {
                for member in rule.members_mut() {
                    member.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)?;
                }
                Ok(())
            }
            Self::TagAssembly(rule) => {
                rule.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
            }
            Self::Bundle(rule) => {
                rule.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
            }
            Self::RegimeSwitch(rule) => {
                rule.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
            }
            Self::Pause(rule) => rule
                .inner_mut()
                .react_to_catch(tile, vessel, caught, retained, hours_fishing, model),
            Self::Tagged(rule) => {
                if rule.applies(vessel) {
                    rule.inner_mut()
                        .react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
                } else {
                    Ok(())
                }
            }
            Self::Temporal(rule) => {
                if rule.applies(model) {
                    rule.inner_mut()
                        .react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
                } else {
                    Ok(())
                }
            }
            Self::Toggle(rule) => {
                rule.guard_event()?;
                rule.inner_mut()
                    .react_to_catch(tile, vessel, caught, retained, hours_fishing, model)
            }
            Self::PortWait(rule) => rule
                .inner_mut()
                .react_to_catch(tile, vessel, caught, retained, hours_fishing, model),
        }
    }

    /// React to a sale of `biomass` kilograms of one species.
    ///
    /// Quota rules debit their ledgers here; an overdraft is fatal.
    /// `biomass` must be non-negative.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        vessel: &mut Vessel,
        biomass: f64,
        revenue: f64,
        model: &mut Model,
    ) -> Result<(), RegulationError> {
        match self {
            Self::Anarchy
            | Self::Banned
            | Self::ProtectedAreas
            | Self::FinedProtectedAreas(_) => Ok(()),
            Self::MonoQuota(rule) => rule.react_to_sale(biomass),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => {
                let day = model.clock().day_of_year();
                rule.react_to_sale(species, biomass, day)
            }
            Self::SpeciesQuota(rule) => rule.react_to_sale(species, biomass),
            Self::Conjunction(rule) => {
                for member in rule.members_mut() {
                    member.react_to_sale(species, vessel, biomass, revenue, model)?;
                }
                Ok(())
            }
            Self::TagAssembly(rule) => {
                rule.react_to_sale(species, vessel, biomass, revenue, model)
            }
            Self::Bundle(rule) => rule.react_to_sale(species, vessel, biomass, revenue, model),
            Self::RegimeSwitch(rule) => {
                rule.react_to_sale(species, vessel, biomass, revenue, model)
            }
            Self::Pause(rule) => rule
                .inner_mut()
                .react_to_sale(species, vessel, biomass, revenue, model),
            Self::Tagged(rule) => {
                if rule.applies(vessel) {
                    rule.inner_mut()
                        .react_to_sale(species, vessel, biomass, revenue, model)
                } else {
                    Ok(())
                }
            }
            Self::Temporal(rule) => {
                if rule.applies(model) {
                    rule.inner_mut()
                        .react_to_sale(species, vessel, biomass, revenue, model)
                } else {
                    Ok(())
                }
            }
            Self::Toggle(rule) => {
                rule.guard_event()?;
                rule.inner_mut()
                    .react_to_sale(species, vessel, biomass, revenue, model)
            }
            Self::PortWait(rule) => rule
                .inner_mut()
                .react_to_sale(species, vessel, biomass, revenue, model),
        }
    }

    /// Bring the rule to life for one vessel: register reset tasks,
    /// cost hooks, and regime evaluations.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        match self {
            Self::Anarchy | Self::Banned | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                Ok(())
            }
            Self::MonoQuota(rule) => rule.start(model, vessel),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => rule.start(model, vessel),
            Self::SpeciesQuota(rule) => rule.start(model, vessel),
            Self::Conjunction(rule) => {
                for member in rule.members_mut() {
                    member.start(model, vessel)?;
                }
                Ok(())
            }
            Self::TagAssembly(rule) => rule.start(model, vessel),
            Self::Bundle(rule) => rule.start(model, vessel),
            Self::RegimeSwitch(rule) => rule.start(model, vessel),
            Self::Pause(rule) => rule.inner_mut().start(model, vessel),
            Self::Tagged(rule) => rule.inner_mut().start(model, vessel),
            Self::Temporal(rule) => rule.inner_mut().start(model, vessel),
            Self::Toggle(rule) => rule.inner_mut().start(model, vessel),
            Self::PortWait(rule) => rule.inner_mut().start(model, vessel),
        }
    }

    /// Release everything `start` registered, exactly once.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        match self {
            Self::Anarchy | Self::Banned | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                Ok(())
            }
            Self::MonoQuota(rule) => {
                rule.turn_off(model, vessel);
                Ok(())
            }
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => {
                rule.turn_off(model, vessel);
                Ok(())
            }
            Self::SpeciesQuota(rule) => {
                rule.turn_off(model, vessel);
                Ok(())
            }
            Self::Conjunction(rule) => {
                for member in rule.members_mut() {
                    member.turn_off(model, vessel)?;
                }
                Ok(())
            }
            Self::TagAssembly(rule) => rule.turn_off(model, vessel),
            Self::Bundle(rule) => rule.turn_off(model, vessel),
            Self::RegimeSwitch(rule) => rule.turn_off(model, vessel),
            Self::Pause(rule) => rule.inner_mut().turn_off(model, vessel),
            Self::Tagged(rule) => rule.inner_mut().turn_off(model, vessel),
            Self::Temporal(rule) => rule.inner_mut().turn_off(model, vessel),
            Self::Toggle(rule) => rule.inner_mut().turn_off(model, vessel),
            Self::PortWait(rule) => rule.inner_mut().turn_off(model, vessel),
        }
    }

    /// The rule a different vessel should use.
    ///
    /// Exclusive ledgers are deep-copied, pool-shared ledgers stay
    /// aliased, enforcement registries are shared by construction, and
    /// a regime switch flattens to whichever regime is in force.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        match self {
            Self::Anarchy => Ok(Self::Anarchy),
            Self::Banned => Ok(Self::Banned),
            Self::ProtectedAreas => Ok(Self::ProtectedAreas),
            Self::FinedProtectedAreas(rule) => Ok(Self::FinedProtectedAreas(rule.clone())),
            Self::MonoQuota(rule) => Ok(Self::MonoQuota(rule.make_copy()?)),
            Self::MultiQuota(rule) => Ok(Self::MultiQuota(rule.make_copy()?)),
            Self::WeakMultiQuota(rule) => Ok(Self::WeakMultiQuota(rule.make_copy()?)),
            Self::SpeciesQuota(rule) => Ok(Self::SpeciesQuota(rule.make_copy()?)),
            Self::Conjunction(rule) => Ok(Self::Conjunction(rule.make_copy()?)),
            Self::TagAssembly(rule) => Ok(Self::TagAssembly(rule.make_copy())),
            Self::Bundle(rule) => Ok(Self::Bundle(rule.make_copy()?)),
            Self::RegimeSwitch(rule) => rule.make_copy(),
            Self::Pause(rule) => Ok(Self::Pause(rule.make_copy()?)),
            Self::Tagged(rule) => Ok(Self::Tagged(rule.make_copy()?)),
            Self::Temporal(rule) => Ok(Self::Temporal(rule.make_copy()?)),
            Self::Toggle(rule) => Ok(Self::Toggle(rule.make_copy()?)),
            Self::PortWait(rule) => Ok(Self::PortWait(rule.make_copy()?)),
        }
    }

    /// Whether this rule (or any rule it wraps) holds a quota ledger.
    pub fn is_quota_capable(&self) -> bool {
        match self {
            Self::Anarchy | Self::Banned | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                false
            }
            Self::MonoQuota(_)
            | Self::MultiQuota(_)
            | Self::WeakMultiQuota(_)
            | Self::SpeciesQuota(_) => true,
            Self::Conjunction(rule) => rule.is_quota_capable(),
            Self::TagAssembly(rule) => rule.is_quota_capable(),
            Self::Bundle(rule) => rule.is_quota_capable(),
            Self::RegimeSwitch(rule) => rule.is_quota_capable(),
            Self::Pause(rule) => rule.inner().is_quota_capable(),
            Self::Tagged(rule) => rule.inner().is_quota_capable(),
            Self::Temporal(rule) => rule.inner().is_quota_capable(),
            Self::Toggle(rule) => rule.inner().is_quota_capable(),
            Self::PortWait(rule) => rule.inner().is_quota_capable(),
        }
    }

    /// Species-indexed quota read. Rules without a ledger answer
    /// "unlimited"; ambiguous composites fail loudly.
    pub fn quota_remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        match self {
            Self::Anarchy | Self::Banned | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                Ok(f64::INFINITY)
            }
            Self::MonoQuota(rule) => rule.remaining(),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => rule.remaining(species),
            Self::SpeciesQuota(rule) => rule.remaining(species),
            Self::Conjunction(rule) => rule.quota_remaining(species),
            Self::TagAssembly(rule) => rule.quota_remaining(species),
            Self::Bundle(rule) => rule.quota_remaining(species),
            Self::RegimeSwitch(rule) => rule.quota_remaining(species),
            Self::Pause(rule) => rule.inner().quota_remaining(species),
            Self::Tagged(rule) => rule.inner().quota_remaining(species),
            Self::Temporal(rule) => rule.inner().quota_remaining(species),
            Self::Toggle(rule) => rule.inner().quota_remaining(species),
            Self::PortWait(rule) => rule.inner().quota_remaining(species),
        }
    }

    /// Species-indexed quota write (quota trading, external
    /// re-targeting).
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::NoQuotaDelegate`] on rules without a
    /// ledger, and the ambiguity error on composites with several.
    pub fn set_quota_remaining(
        &mut self,
        species: SpeciesId,
        value: f64,
    ) -> Result<(), RegulationError> {
        match self {
            Self::Anarchy | Self::Banned | Self::ProtectedAreas | Self::FinedProtectedAreas(_) => {
                Err(RegulationError::NoQuotaDelegate)
            }
            Self::MonoQuota(rule) => rule.set_remaining(value),
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => {
                rule.set_remaining(species, value)
            }
            Self::SpeciesQuota(rule) => rule.set_remaining(species, value),
            Self::Conjunction(rule) => rule.set_quota_remaining(species, value),
            Self::TagAssembly(rule) => rule.set_quota_remaining(species, value),
            Self::Bundle(rule) => rule.set_quota_remaining(species, value),
            Self::RegimeSwitch(rule) => rule.set_quota_remaining(species, value),
            Self::Pause(rule) => rule.inner_mut().set_quota_remaining(species, value),
            Self::Tagged(rule) => rule.inner_mut().set_quota_remaining(species, value),
            Self::Temporal(rule) => rule.inner_mut().set_quota_remaining(species, value),
            Self::Toggle(rule) => rule.inner_mut().set_quota_remaining(species, value),
            Self::PortWait(rule) => rule.inner_mut().set_quota_remaining(species, value),
        }
    }

    /// Disable or restore protected-area checks in every per-species
    /// quota this rule wraps, recursively. Composites that already gate
    /// space call this to avoid double-gating.
    pub fn set_respect_protected_areas(&mut self, respect: bool) {
        match self {
            Self::Anarchy
            | Self::Banned
            | Self::ProtectedAreas
            | Self::FinedProtectedAreas(_)
            | Self::MonoQuota(_)
            | Self::SpeciesQuota(_) => {}
            Self::MultiQuota(rule) | Self::WeakMultiQuota(rule) => {
                rule.set_respect_protected_areas(respect);
            }
            Self::Conjunction(rule) => {
                for member in rule.members_mut() {
                    member.set_respect_protected_areas(respect);
                }
            }
            Self::TagAssembly(rule) => rule.set_respect_protected_areas(respect),
            Self::Bundle(rule) => rule.set_respect_protected_areas(respect),
            Self::RegimeSwitch(rule) => rule.set_respect_protected_areas(respect),
            Self::Pause(rule) => rule.inner_mut().set_respect_protected_areas(respect),
            Self::Tagged(rule) => rule.inner_mut().set_respect_protected_areas(respect),
            Self::Temporal(rule) => rule.inner_mut().set_respect_protected_areas(respect),
            Self::Toggle(rule) => rule.inner_mut().set_respect_protected_areas(respect),
            Self::PortWait(rule) => rule.inner_mut().set_respect_protected_areas(respect),
        }
    }
}
