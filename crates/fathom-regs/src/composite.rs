//! Rules built from collections of other rules.
//!
//! Three shapes: the plain [`Conjunction`] (AND over members, minimum
//! over sellable biomass), the tag-driven [`TagAssembly`] that
//! materializes a different member list per vessel from shared
//! factories, and the fixed three-way [`Bundle`] of area + season +
//! quota.
//!
//! Species-indexed quota reads and writes on a composite delegate to
//! its sole quota-capable member. With no such member a read answers
//! "unlimited" and a write is a configuration error; with more than one
//! the delegate is ambiguous and both fail loudly.

use fathom_sim::Model;
use fathom_types::SpeciesId;
use fathom_vessel::Vessel;
use fathom_world::SeaTile;
use tracing::debug;

use crate::error::RegulationError;
use crate::factory::RegulationFactory;
use crate::regulation::Regulation;

/// The implicit tag every vessel carries for assembly purposes.
pub const TAG_ALL: &str = "all";

// ---------------------------------------------------------------------------
// Member combinators shared by the composites
// ---------------------------------------------------------------------------

fn all_allow_fishing(
    members: &[Regulation],
    vessel: &Vessel,
    tile: &SeaTile,
    model: &Model,
) -> Result<bool, RegulationError> {
    for member in members {
        if !member.can_fish_here(vessel, tile, model)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_allow_sea(
    members: &[Regulation],
    vessel: &Vessel,
    model: &Model,
) -> Result<bool, RegulationError> {
    for member in members {
        if !member.allowed_at_sea(vessel, model)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn min_sellable(
    members: &[Regulation],
    vessel: &Vessel,
    species: SpeciesId,
    model: &Model,
) -> Result<f64, RegulationError> {
    let mut most_restrictive = f64::INFINITY;
    for member in members {
        let allowed = member.maximum_biomass_sellable(vessel, species, model)?;
        most_restrictive = most_restrictive.min(allowed);
    }
    Ok(most_restrictive)
}

/// Index of the sole quota-capable member, if exactly one exists.
fn sole_quota_member(members: &[Regulation]) -> Result<Option<usize>, RegulationError> {
    let capable: Vec<usize> = members
        .iter()
        .enumerate()
        .filter_map(|(index, member)| member.is_quota_capable().then_some(index))
        .collect();
    match capable.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(*index)),
        _ => Err(RegulationError::AmbiguousQuotaDelegate {
            count: capable.len(),
        }),
    }
}

fn delegate_quota_read(
    members: &[Regulation],
    species: SpeciesId,
) -> Result<f64, RegulationError> {
    match sole_quota_member(members)? {
        Some(index) => members
            .get(index)
            .ok_or(RegulationError::NoQuotaDelegate)?
            .quota_remaining(species),
        None => Ok(f64::INFINITY),
    }
}

fn delegate_quota_write(
    members: &mut [Regulation],
    species: SpeciesId,
    value: f64,
) -> Result<(), RegulationError> {
    match sole_quota_member(members)? {
        Some(index) => members
            .get_mut(index)
            .ok_or(RegulationError::NoQuotaDelegate)?
            .set_quota_remaining(species, value),
        None => Err(RegulationError::NoQuotaDelegate),
    }
}

// ---------------------------------------------------------------------------
// Conjunction
// ---------------------------------------------------------------------------

/// The logical AND of a list of member rules.
///
/// Gates conjoin, sellable biomass takes the minimum, and events fan
/// out to every member.
#[derive(Debug, Default)]
pub struct Conjunction {
    members: Vec<Regulation>,
}

impl Conjunction {
    /// Combine a list of member rules. An empty list is the neutral
    /// element: everything allowed, nothing accounted.
    pub const fn new(members: Vec<Regulation>) -> Self {
        Self { members }
    }

    /// The member rules, in evaluation order.
    pub fn members(&self) -> &[Regulation] {
        &self.members
    }

    /// Mutable access to the member rules.
    pub fn members_mut(&mut self) -> &mut [Regulation] {
        &mut self.members
    }

    /// Location gate: every member must allow.
    pub fn can_fish_here(
        &self,
        vessel: &Vessel,
        tile: &SeaTile,
        model: &Model,
    ) -> Result<bool, RegulationError> {
        all_allow_fishing(&self.members, vessel, tile, model)
    }

    /// Sellable biomass: the most restrictive member wins.
    pub fn maximum_biomass_sellable(
        &self,
        vessel: &Vessel,
        species: SpeciesId,
        model: &Model,
    ) -> Result<f64, RegulationError> {
        min_sellable(&self.members, vessel, species, model)
    }

    /// At-sea gate: every member must allow.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        all_allow_sea(&self.members, vessel, model)
    }

    /// Whether any member is quota-capable.
    pub fn is_quota_capable(&self) -> bool {
        self.members.iter().any(Regulation::is_quota_capable)
    }

    /// Quota read through the sole quota-capable member.
    pub fn quota_remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        delegate_quota_read(&self.members, species)
    }

    /// Quota write through the sole quota-capable member.
    pub fn set_quota_remaining(
        &mut self,
        species: SpeciesId,
        value: f64,
    ) -> Result<(), RegulationError> {
        delegate_quota_write(&mut self.members, species, value)
    }

    /// The composite a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        let mut members = Vec::with_capacity(self.members.len());
        for member in &self.members {
            members.push(member.make_copy()?);
        }
        Ok(Self { members })
    }
}

// ---------------------------------------------------------------------------
// Tag-driven assembly
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum AssemblyState {
    Configured,
    Started(Vec<Regulation>),
}

/// Builds a per-vessel rule set from tag-keyed factories.
///
/// On `start`, every factory keyed by one of the vessel's tags, plus
/// the implicit [`TAG_ALL`] key, is materialized exactly once and the
/// resulting member is started. Querying before `start`, or starting
/// twice, is a configuration error.
#[derive(Debug)]
pub struct TagAssembly {
    factories: Vec<(String, Vec<RegulationFactory>)>,
    state: AssemblyState,
}

impl TagAssembly {
    /// Configure an assembly from tag-keyed factory lists. Keys are
    /// evaluated in the order given, so materialization order is fully
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::EmptyFactoryMap`] if no factories are
    /// configured at all.
    pub fn new(
        factories: Vec<(String, Vec<RegulationFactory>)>,
    ) -> Result<Self, RegulationError> {
        if factories.iter().all(|(_, list)| list.is_empty()) {
            return Err(RegulationError::EmptyFactoryMap);
        }
        Ok(Self {
            factories,
            state: AssemblyState::Configured,
        })
    }

    fn members(&self) -> Result<&[Regulation], RegulationError> {
        match &self.state {
            AssemblyState::Started(members) => Ok(members),
            AssemblyState::Configured => Err(RegulationError::NotStarted {
                kind: "tag assembly",
            }),
        }
    }

    fn members_mut(&mut self) -> Result<&mut Vec<Regulation>, RegulationError> {
        match &mut self.state {
            AssemblyState::Started(members) => Ok(members),
            AssemblyState::Configured => Err(RegulationError::NotStarted {
                kind: "tag assembly",
            }),
        }
    }

    /// Whether any materialized member is of the named kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::NotStarted`] before `start`.
    pub fn contains_kind(&self, kind: &str) -> Result<bool, RegulationError> {
        Ok(self
            .members()?
            .iter()
            .any(|member| member.kind_name() == kind))
    }

    /// Number of materialized members.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::NotStarted`] before `start`.
    pub fn member_count(&self) -> Result<usize, RegulationError> {
        Ok(self.members()?.len())
    }

    /// Materialize and start the member set for this vessel.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::AlreadyStarted`] on a second call
    /// without [`TagAssembly::reassign`].
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if matches!(self.state, AssemblyState::Started(_)) {
            return Err(RegulationError::AlreadyStarted {
                kind: "tag assembly",
            });
        }
        let mut members = Vec::new();
        for (tag, recipes) in &self.factories {
            if tag != TAG_ALL && !vessel.tags().contains(tag) {
                continue;
            }
            for recipe in recipes {
                members.push(recipe.build(model)?);
            }
        }
        for member in &mut members {
            member.start(model, vessel)?;
        }
        debug!(vessel = %vessel.id(), members = members.len(), "tag assembly started");
        self.state = AssemblyState::Started(members);
        Ok(())
    }

    /// Drop the current member set and rebuild it from the factories.
    ///
    /// The dropped members are **not** turned off first; any scheduled
    /// tasks or cost hooks they registered stay registered. Safe only
    /// for members whose `start` is idempotent.
    pub fn reassign(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        self.state = AssemblyState::Configured;
        self.start(model, vessel)
    }

    /// Turn off and drop every materialized member.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        if let AssemblyState::Started(mut members) =
            core::mem::replace(&mut self.state, AssemblyState::Configured)
        {
            for member in &mut members {
                member.turn_off(model, vessel)?;
            }
        }
        Ok(())
    }

    /// Location gate over the materialized members.
    pub fn can_fish_here(
        &self,
        vessel: &Vessel,
        tile: &SeaTile,
        model: &Model,
    ) -> Result<bool, RegulationError> {
        all_allow_fishing(self.members()?, vessel, tile, model)
    }

    /// Sellable biomass over the materialized members.
    pub fn maximum_biomass_sellable(
        &self,
        vessel: &Vessel,
        species: SpeciesId,
        model: &Model,
    ) -> Result<f64, RegulationError> {
        min_sellable(self.members()?, vessel, species, model)
    }

    /// At-sea gate over the materialized members.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        all_allow_sea(self.members()?, vessel, model)
    }

    /// Fan a catch event out to every member.
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
        for member in self.members_mut()? {
            member.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)?;
        }
        Ok(())
    }

    /// Fan a sale event out to every member.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        vessel: &mut Vessel,
        biomass: f64,
        revenue: f64,
        model: &mut Model,
    ) -> Result<(), RegulationError> {
        for member in self.members_mut()? {
            member.react_to_sale(species, vessel, biomass, revenue, model)?;
        }
        Ok(())
    }

    /// Whether any materialized member is quota-capable. Answers
    /// `false` before `start`.
    pub fn is_quota_capable(&self) -> bool {
        self.members()
            .is_ok_and(|members| members.iter().any(Regulation::is_quota_capable))
    }

    /// Quota read through the sole quota-capable member.
    pub fn quota_remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        delegate_quota_read(self.members()?, species)
    }

    /// Quota write through the sole quota-capable member.
    pub fn set_quota_remaining(
        &mut self,
        species: SpeciesId,
        value: f64,
    ) -> Result<(), RegulationError> {
        let members = match &mut self.state {
            AssemblyState::Started(members) => members,
            AssemblyState::Configured => {
                return Err(RegulationError::NotStarted {
                    kind: "tag assembly",
                });
            }
        };
        delegate_quota_write(members, species, value)
    }

    /// A fresh, unstarted assembly over the same factories. Factories
    /// carrying a shared-pool cache keep aliasing it, so every vessel
    /// built from the copy joins the same pool.
    pub fn make_copy(&self) -> Self {
        Self {
            factories: self.factories.clone(),
            state: AssemblyState::Configured,
        }
    }

    /// Forward the protected-area toggle to materialized members.
    pub fn set_respect_protected_areas(&mut self, respect: bool) {
        if let AssemblyState::Started(members) = &mut self.state {
            for member in members {
                member.set_respect_protected_areas(respect);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed bundle
// ---------------------------------------------------------------------------

/// The fixed three-way bundle of an area rule, a season rule, and a
/// quota rule.
///
/// Fishing needs all three to allow; sale is capped by season and quota
/// only. The season member's own protected-area check is disabled at
/// construction because the area member already covers space.
#[derive(Debug)]
pub struct Bundle {
    area: Box<Regulation>,
    season: Box<Regulation>,
    quota: Box<Regulation>,
}

impl Bundle {
    /// Bundle an area, a season, and a quota rule.
    pub fn new(area: Regulation, mut season: Regulation, quota: Regulation) -> Self {
        season.set_respect_protected_areas(false);
        Self {
            area: Box::new(area),
            season: Box::new(season),
            quota: Box::new(quota),
        }
    }

    /// The area member.
    pub const fn area(&self) -> &Regulation {
        &self.area
    }

    /// The season member.
    pub const fn season(&self) -> &Regulation {
        &self.season
    }

    /// The quota member.
    pub const fn quota(&self) -> &Regulation {
        &self.quota
    }

    fn members(&self) -> [&Regulation; 3] {
        [&self.area, &self.season, &self.quota]
    }

    fn members_mut(&mut self) -> [&mut Regulation; 3] {
        [&mut self.area, &mut self.season, &mut self.quota]
    }

    /// Location gate: area, season, and quota must all allow.
    pub fn can_fish_here(
        &self,
        vessel: &Vessel,
        tile: &SeaTile,
        model: &Model,
    ) -> Result<bool, RegulationError> {
        for member in self.members() {
            if !member.can_fish_here(vessel, tile, model)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sellable biomass: the minimum of season and quota. Area does not
    /// gate sale.
    pub fn maximum_biomass_sellable(
        &self,
        vessel: &Vessel,
        species: SpeciesId,
        model: &Model,
    ) -> Result<f64, RegulationError> {
        let season = self.season.maximum_biomass_sellable(vessel, species, model)?;
        let quota = self.quota.maximum_biomass_sellable(vessel, species, model)?;
        Ok(season.min(quota))
    }

    /// At-sea gate: area, season, and quota must all allow.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        for member in self.members() {
            if !member.allowed_at_sea(vessel, model)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fan a catch event out to all three members.
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
        for member in self.members_mut() {
            member.react_to_catch(tile, vessel, caught, retained, hours_fishing, model)?;
        }
        Ok(())
    }

    /// Fan a sale event out to all three members.
    pub fn react_to_sale(
        &mut self,
        species: SpeciesId,
        vessel: &mut Vessel,
        biomass: f64,
        revenue: f64,
        model: &mut Model,
    ) -> Result<(), RegulationError> {
        for member in self.members_mut() {
            member.react_to_sale(species, vessel, biomass, revenue, model)?;
        }
        Ok(())
    }

    /// Start all three members.
    pub fn start(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        for member in self.members_mut() {
            member.start(model, vessel)?;
        }
        Ok(())
    }

    /// Turn off all three members.
    pub fn turn_off(&mut self, model: &mut Model, vessel: &Vessel) -> Result<(), RegulationError> {
        for member in self.members_mut() {
            member.turn_off(model, vessel)?;
        }
        Ok(())
    }

    /// Whether the quota member claims the quota capability.
    pub fn is_quota_capable(&self) -> bool {
        self.quota.is_quota_capable()
    }

    /// Quota read through the quota member.
    pub fn quota_remaining(&self, species: SpeciesId) -> Result<f64, RegulationError> {
        self.quota.quota_remaining(species)
    }

    /// Quota write through the quota member.
    pub fn set_quota_remaining(
        &mut self,
        species: SpeciesId,
        value: f64,
    ) -> Result<(), RegulationError> {
        self.quota.set_quota_remaining(species, value)
    }

    /// The bundle a different vessel should use. The season copy keeps
    /// its protected-area check disabled.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            area: Box::new(self.area.make_copy()?),
            season: Box::new(self.season.make_copy()?),
            quota: Box::new(self.quota.make_copy()?),
        })
    }

    /// Forward the protected-area toggle to the area and quota members.
    /// The season member stays disabled by construction.
    pub fn set_respect_protected_areas(&mut self, respect: bool) {
        self.area.set_respect_protected_areas(respect);
        self.quota.set_respect_protected_areas(respect);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fathom_quota::{Ownership, ResetCadence};
    use fathom_types::{PortId, SpeciesCatalog};
    use fathom_world::SeaMap;

    use crate::quota::{MonoQuota, MultiQuota};

    use super::*;

    fn model() -> Model {
        Model::new(
            3,
            SpeciesCatalog::from_names(["cod", "haddock"]),
            SeaMap::uniform(2, 2, -60.0).unwrap(),
        )
    }

    fn vessel() -> Vessel {
        Vessel::new("tester", PortId::new())
    }

    fn mono(allowance: f64) -> Regulation {
        Regulation::MonoQuota(
            MonoQuota::new(allowance, ResetCadence::Yearly, Ownership::Exclusive).unwrap(),
        )
    }

    #[test]
    fn conjunction_takes_the_most_restrictive_member() {
        let m = model();
        let v = vessel();
        let conjunction = Conjunction::new(vec![mono(500.0), mono(200.0), Regulation::Anarchy]);
        let cap = conjunction
            .maximum_biomass_sellable(&v, SpeciesId(0), &m)
            .unwrap();
        assert_eq!(cap, 200.0);
    }

    #[test]
    fn conjunction_is_the_logical_and_of_its_members() {
        let m = model();
        let v = vessel();
        let tile = m.map().tile(0, 0).unwrap().clone();
        let open = Conjunction::new(vec![Regulation::Anarchy, Regulation::Anarchy]);
        assert!(open.can_fish_here(&v, &tile, &m).unwrap());
        let closed = Conjunction::new(vec![Regulation::Anarchy, Regulation::Banned]);
        assert!(!closed.can_fish_here(&v, &tile, &m).unwrap());
        assert!(!closed.allowed_at_sea(&v, &m).unwrap());
    }

    #[test]
    fn empty_conjunction_is_neutral() {
        let m = model();
        let v = vessel();
        let neutral = Conjunction::new(Vec::new());
        assert!(neutral.allowed_at_sea(&v, &m).unwrap());
        assert_eq!(
            neutral
                .maximum_biomass_sellable(&v, SpeciesId(0), &m)
                .unwrap(),
            f64::INFINITY
        );
        assert_eq!(neutral.quota_remaining(SpeciesId(0)).unwrap(), f64::INFINITY);
    }

    #[test]
    fn two_quota_members_make_the_delegate_ambiguous() {
        let mut conjunction = Conjunction::new(vec![mono(500.0), mono(200.0)]);
        assert!(matches!(
            conjunction.quota_remaining(SpeciesId(0)),
            Err(RegulationError::AmbiguousQuotaDelegate { count: 2 })
        ));
        assert!(matches!(
            conjunction.set_quota_remaining(SpeciesId(0), 50.0),
            Err(RegulationError::AmbiguousQuotaDelegate { count: 2 })
        ));
    }

    #[test]
    fn sole_quota_member_handles_reads_and_writes() {
        let mut conjunction = Conjunction::new(vec![Regulation::Anarchy, mono(500.0)]);
        assert_eq!(conjunction.quota_remaining(SpeciesId(0)).unwrap(), 500.0);
        conjunction
            .set_quota_remaining(SpeciesId(0), 120.0)
            .unwrap();
        assert_eq!(conjunction.quota_remaining(SpeciesId(0)).unwrap(), 120.0);
    }

    #[test]
    fn quota_write_without_a_delegate_fails() {
        let mut conjunction = Conjunction::new(vec![Regulation::Anarchy]);
        assert!(matches!(
            conjunction.set_quota_remaining(SpeciesId(0), 50.0),
            Err(RegulationError::NoQuotaDelegate)
        ));
    }

    #[test]
    fn assembly_without_factories_is_rejected() {
        assert!(matches!(
            TagAssembly::new(Vec::new()),
            Err(RegulationError::EmptyFactoryMap)
        ));
        assert!(matches!(
            TagAssembly::new(vec![("all".to_owned(), Vec::new())]),
            Err(RegulationError::EmptyFactoryMap)
        ));
    }

    #[test]
    fn assembly_materializes_matching_tags_once_each() {
        let mut m = model();
        let mut v = vessel();
        v.add_tag("north");
        let mut assembly = TagAssembly::new(vec![
            ("all".to_owned(), vec![RegulationFactory::anarchy()]),
            ("north".to_owned(), vec![RegulationFactory::banned()]),
            ("south".to_owned(), vec![RegulationFactory::banned()]),
        ])
        .unwrap();
        assembly.start(&mut m, &v).unwrap();
        assert_eq!(assembly.member_count().unwrap(), 2);
        assert!(assembly.contains_kind("anarchy").unwrap());
        assert!(assembly.contains_kind("banned").unwrap());
        // The "south" factory did not fire.
        assert!(!assembly.allowed_at_sea(&v, &m).unwrap());
    }

    #[test]
    fn assembly_double_start_is_a_configuration_error() {
        let mut m = model();
        let v = vessel();
        let mut assembly =
            TagAssembly::new(vec![("all".to_owned(), vec![RegulationFactory::anarchy()])])
                .unwrap();
        assembly.start(&mut m, &v).unwrap();
        assert!(matches!(
            assembly.start(&mut m, &v),
            Err(RegulationError::AlreadyStarted { .. })
        ));
        assembly.reassign(&mut m, &v).unwrap();
        assert_eq!(assembly.member_count().unwrap(), 1);
    }

    #[test]
    fn assembly_queries_before_start_fail() {
        let m = model();
        let v = vessel();
        let assembly =
            TagAssembly::new(vec![("all".to_owned(), vec![RegulationFactory::anarchy()])])
                .unwrap();
        assert!(matches!(
            assembly.allowed_at_sea(&v, &m),
            Err(RegulationError::NotStarted { .. })
        ));
    }

    #[test]
    fn bundle_gates_fishing_on_all_three_but_sale_on_two() {
        let mut map = SeaMap::uniform(2, 2, -60.0).unwrap();
        map.paint_mpa(fathom_types::MpaId::new(), (0, 0), (0, 0))
            .unwrap();
        let m = Model::new(3, SpeciesCatalog::from_names(["cod"]), map);
        let v = vessel();

        let season = Regulation::MultiQuota(
            MultiQuota::new(vec![300.0], ResetCadence::Yearly, Ownership::Exclusive).unwrap(),
        );
        let bundle = Bundle::new(Regulation::ProtectedAreas, season, mono(200.0));

        let closed = m.map().tile(0, 0).unwrap().clone();
        let open = m.map().tile(1, 1).unwrap().clone();
        assert!(!bundle.can_fish_here(&v, &closed, &m).unwrap());
        assert!(bundle.can_fish_here(&v, &open, &m).unwrap());
        // Sale cap is min(season 300, quota 200); the area member
        // contributes nothing to sale.
        assert_eq!(
            bundle
                .maximum_biomass_sellable(&v, SpeciesId(0), &m)
                .unwrap(),
            200.0
        );
    }

    #[test]
    fn bundle_disables_the_season_protection_check() {
        let mut map = SeaMap::uniform(2, 2, -60.0).unwrap();
        map.paint_mpa(fathom_types::MpaId::new(), (0, 0), (1, 1))
            .unwrap();
        let m = Model::new(3, SpeciesCatalog::from_names(["cod"]), map);
        let v = vessel();
        let season = Regulation::MultiQuota(
            MultiQuota::new(vec![300.0], ResetCadence::Yearly, Ownership::Exclusive).unwrap(),
        );
        let bundle = Bundle::new(Regulation::Anarchy, season, mono(200.0));
        // Every tile is protected, yet with a permissive area member the
        // bundle still allows fishing: only the area member gates space.
        let tile = m.map().tile(0, 0).unwrap().clone();
        assert!(bundle.can_fish_here(&v, &tile, &m).unwrap());
    }
}
