//! Recipe-driven construction of regulation chains.
//!
//! A [`RegulationFactory`] is a declarative, YAML-loadable description
//! of a rule chain; [`RegulationFactory::build`] turns it into a live
//! [`Regulation`] against a model. Factories are the unit of sharing
//! for fleet-wide state: a pool-shared quota recipe creates its ledger
//! on first build and hands the same handle to every later build, and
//! clones of the factory keep aliasing that cache. Exclusive recipes
//! build a fresh ledger every time.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use fathom_quota::{
    MultiQuotaLedger, Ownership, QuotaError, QuotaPool, ResetCadence, SharedLedger, SharedPool,
};
use fathom_sim::Model;
use fathom_types::{MpaId, SpeciesId};
use serde::Deserialize;

use crate::composite::{Bundle, Conjunction, TagAssembly};
use crate::decorators::{ArbitraryPause, OnOff, PortWait, Tagged, Temporal};
use crate::error::RegulationError;
use crate::protected::{EnforcementRegistry, FinedProtectedAreas};
use crate::quota::{MonoQuota, MultiQuota, SpeciesQuota};
use crate::regime::RegimeSwitch;
use crate::regulation::Regulation;

/// Errors that can occur when loading factory recipes.
#[derive(Debug, thiserror::Error)]
pub enum FactoryConfigError {
    /// Failed to read the recipe file from disk.
    #[error("failed to read recipe file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse recipe YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for FactoryConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// A lazily filled cache shared by every clone of a recipe node.
///
/// Cloning a factory clones the `Rc`, so all copies keep handing out
/// the same cached value once it exists. Public only because it
/// appears as a skipped field of [`RegulationFactory`] variants; it is
/// not part of the recipe surface.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct Locker<T> {
    slot: Rc<RefCell<Option<T>>>,
}

impl<T> Default for Locker<T> {
    fn default() -> Self {
        Self {
            slot: Rc::default(),
        }
    }
}

impl<T: Clone> Locker<T> {
    fn get_or_create(
        &self,
        create: impl FnOnce() -> Result<T, RegulationError>,
    ) -> Result<T, RegulationError> {
        let mut slot = match self.slot.try_borrow_mut() {
            Ok(slot) => slot,
            Err(_busy) => return Err(RegulationError::Quota(QuotaError::ReentrantAccess)),
        };
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        let value = create()?;
        *slot = Some(value.clone());
        Ok(value)
    }
}

/// One tag's factory list inside a tag-assembly recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct TagFactories {
    /// The tag that activates these factories (`"all"` matches every
    /// vessel).
    pub tag: String,
    /// The factories materialized for vessels carrying the tag.
    pub rules: Vec<RegulationFactory>,
}

const fn default_true() -> bool {
    true
}

const fn default_cadence() -> ResetCadence {
    ResetCadence::Yearly
}

const fn default_ownership() -> Ownership {
    Ownership::Exclusive
}

/// A declarative recipe for one rule chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RegulationFactory {
    /// No restrictions at all.
    Anarchy,
    /// Nothing is ever allowed.
    Banned,
    /// The plain protected-area gate.
    ProtectedAreas,
    /// Patrol-enforced protection with uniform terms across every
    /// protected area on the map. The registry is built on first use
    /// and shared by all vessels.
    FinedProtectedAreas {
        /// Probability of detection per hour fished inside an area.
        hourly_detection: f64,
        /// Fine charged on detection.
        fine: f64,
        /// Whether vessels may structurally enter protected tiles.
        #[serde(default)]
        cheating: bool,
        #[serde(skip)]
        #[doc(hidden)]
        registry: Locker<Rc<EnforcementRegistry>>,
    },
    /// One scalar cap covering every species.
    MonoQuota {
        /// Yearly allowance in kilograms.
        allowance: f64,
        /// Reset cadence.
        #[serde(default = "default_cadence")]
        cadence: ResetCadence,
        /// Exclusive permit or fleet-shared pool.
        #[serde(default = "default_ownership")]
        ownership: Ownership,
        /// Charge ITQ opportunity costs at trip settlement.
        #[serde(default)]
        itq_priced: bool,
        #[serde(skip)]
        #[doc(hidden)]
        pool: Locker<SharedPool>,
    },
    /// One cap per species, in catalog order.
    MultiQuota {
        /// Yearly allowances, one per catalog species.
        allowances: Vec<f64>,
        /// Reset cadence.
        #[serde(default = "default_cadence")]
        cadence: ResetCadence,
        /// Exclusive permit or fleet-shared pool.
        #[serde(default = "default_ownership")]
        ownership: Ownership,
        /// Charge ITQ opportunity costs at trip settlement.
        #[serde(default)]
        itq_priced: bool,
        #[serde(skip)]
        #[doc(hidden)]
        ledger: Locker<SharedLedger>,
    },
    /// Per-species caps that also report season-exhaustion days.
    WeakMultiQuota {
        /// Yearly allowances, one per catalog species.
        allowances: Vec<f64>,
        /// Reset cadence.
        #[serde(default = "default_cadence")]
        cadence: ResetCadence,
        /// Exclusive permit or fleet-shared pool.
        #[serde(default = "default_ownership")]
        ownership: Ownership,
        #[serde(skip)]
        #[doc(hidden)]
        ledger: Locker<SharedLedger>,
    },
    /// A cap accounting for one designated species only.
    SpeciesQuota {
        /// Catalog index of the accounted species.
        species: usize,
        /// Yearly allowance in kilograms.
        allowance: f64,
        /// Reset cadence.
        #[serde(default = "default_cadence")]
        cadence: ResetCadence,
        /// Exclusive permit or fleet-shared pool.
        #[serde(default = "default_ownership")]
        ownership: Ownership,
        #[serde(skip)]
        #[doc(hidden)]
        pool: Locker<SharedPool>,
    },
    /// Logical AND over member recipes.
    Conjunction {
        /// The member recipes, in evaluation order.
        members: Vec<RegulationFactory>,
    },
    /// Tag-driven per-vessel materialization.
    TagAssembly {
        /// Tag-keyed factory lists, in evaluation order.
        factories: Vec<TagFactories>,
    },
    /// The fixed area + season + quota bundle.
    Bundle {
        /// The spatial member.
        area: Box<RegulationFactory>,
        /// The seasonal member; its protected-area check is disabled.
        season: Box<RegulationFactory>,
        /// The quota member.
        quota: Box<RegulationFactory>,
    },
    /// Hysteretic switching between two sub-recipes.
    RegimeSwitch {
        /// Name of the yearly indicator column to watch.
        indicator: String,
        /// Below this, switch to emergency.
        low: f64,
        /// Above this, switch back to business as usual.
        high: f64,
        /// The default policy.
        business: Box<RegulationFactory>,
        /// The restrictive policy.
        emergency: Box<RegulationFactory>,
    },
    /// Keep docked vessels in port during `[start, end]`.
    Pause {
        /// First day of the pause window.
        start: u32,
        /// Last day of the pause window.
        end: u32,
        /// The wrapped recipe.
        inner: Box<RegulationFactory>,
    },
    /// Apply the inner recipe only to vessels carrying one of the tags.
    Tagged {
        /// Tags that activate the inner rule.
        tags: Vec<String>,
        /// The wrapped recipe.
        inner: Box<RegulationFactory>,
    },
    /// Apply the inner recipe only during a day window (wraps over the
    /// year boundary when `start > end`).
    Temporal {
        /// First day of the window.
        start: u32,
        /// Last day of the window.
        end: u32,
        /// The wrapped recipe.
        inner: Box<RegulationFactory>,
    },
    /// A kill switch around the inner recipe.
    Toggle {
        /// Initial toggle position.
        #[serde(default = "default_true")]
        active: bool,
        /// The wrapped recipe.
        inner: Box<RegulationFactory>,
    },
    /// Hold docked vessels until a minimum port dwell.
    PortWait {
        /// Hours a vessel must dwell before departing, at every port.
        hours: f64,
        /// The wrapped recipe.
        inner: Box<RegulationFactory>,
    },
}

impl RegulationFactory {
    /// The allow-all recipe.
    pub const fn anarchy() -> Self {
        Self::Anarchy
    }

    /// The deny-all recipe.
    pub const fn banned() -> Self {
        Self::Banned
    }

    /// Parse a recipe from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryConfigError::Yaml`] on malformed YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, FactoryConfigError> {
        Ok(serde_yml::from_str(text)?)
    }

    /// Load a recipe from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryConfigError::Io`] if the file cannot be read,
    /// [`FactoryConfigError::Yaml`] if it does not parse.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, FactoryConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Build a live rule chain against the model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed parameters or
    /// recipes inconsistent with the model's species catalog.
    pub fn build(&self, model: &mut Model) -> Result<Regulation, RegulationError> {
        match self {
            Self::Anarchy => Ok(Regulation::Anarchy),
            Self::Banned => Ok(Regulation::Banned),
            Self::ProtectedAreas => Ok(Regulation::ProtectedAreas),
            Self::FinedProtectedAreas {
                hourly_detection,
                fine,
                cheating,
                registry,
            } => {
                let registry = registry.get_or_create(|| {
                    build_registry(model, *hourly_detection, *fine).map(Rc::new)
                })?;
                Ok(Regulation::FinedProtectedAreas(FinedProtectedAreas::new(
                    registry, *cheating,
                )))
            }
            Self::MonoQuota {
                allowance,
                cadence,
                ownership,
                itq_priced,
                pool,
            } => {
                cadence.validate()?;
                let handle = match ownership {
                    Ownership::Exclusive => {
                        SharedPool::exclusive(QuotaPool::new(*allowance)?)
                    }
                    Ownership::PoolShared => pool.get_or_create(|| {
                        Ok(SharedPool::pool_shared(QuotaPool::new(*allowance)?))
                    })?,
                };
                let rule = MonoQuota::from_pool(handle, *cadence);
                Ok(Regulation::MonoQuota(if *itq_priced {
                    rule.with_itq_pricing()
                } else {
                    rule
                }))
            }
            Self::MultiQuota {
                allowances,
                cadence,
                ownership,
                itq_priced,
                ledger,
            } => {
                let handle =
                    build_ledger_handle(model, allowances, *cadence, *ownership, ledger)?;
                let rule = MultiQuota::from_ledger(handle, *cadence);
                Ok(Regulation::MultiQuota(if *itq_priced {
                    rule.with_itq_pricing()
                } else {
                    rule
                }))
            }
            Self::WeakMultiQuota {
                allowances,
                cadence,
                ownership,
                ledger,
            } => {
                let handle =
                    build_ledger_handle(model, allowances, *cadence, *ownership, ledger)?;
                Ok(Regulation::WeakMultiQuota(MultiQuota::from_ledger(
                    handle, *cadence,
                )))
            }
            Self::SpeciesQuota {
                species,
                allowance,
                cadence,
                ownership,
                pool,
            } => {
                let catalog_len = model.catalog().len();
                if *species >= catalog_len {
                    return Err(RegulationError::UnknownRecipeSpecies {
                        index: *species,
                        catalog_len,
                    });
                }
                cadence.validate()?;
                let handle = match ownership {
                    Ownership::Exclusive => {
                        SharedPool::exclusive(QuotaPool::new(*allowance)?)
                    }
                    Ownership::PoolShared => pool.get_or_create(|| {
                        Ok(SharedPool::pool_shared(QuotaPool::new(*allowance)?))
                    })?,
                };
                Ok(Regulation::SpeciesQuota(SpeciesQuota::from_pool(
                    SpeciesId(*species),
                    handle,
                    *cadence,
                )))
            }
            Self::Conjunction { members } => {
                let mut built = Vec::with_capacity(members.len());
                for member in members {
                    built.push(member.build(model)?);
                }
                Ok(Regulation::Conjunction(Conjunction::new(built)))
            }
            Self::TagAssembly { factories } => {
                let pairs = factories
                    .iter()
                    .map(|entry| (entry.tag.clone(), entry.rules.clone()))
                    .collect();
                Ok(Regulation::TagAssembly(TagAssembly::new(pairs)?))
            }
            Self::Bundle {
                area,
                season,
                quota,
            } => Ok(Regulation::Bundle(Bundle::new(
                area.build(model)?,
                season.build(model)?,
                quota.build(model)?,
            ))),
            Self::RegimeSwitch {
                indicator,
                low,
                high,
                business,
                emergency,
            } => Ok(Regulation::RegimeSwitch(RegimeSwitch::new(
                indicator.clone(),
                *low,
                *high,
                business.build(model)?,
                emergency.build(model)?,
            )?)),
            Self::Pause { start, end, inner } => Ok(Regulation::Pause(ArbitraryPause::new(
                *start,
                *end,
                inner.build(model)?,
            )?)),
            Self::Tagged { tags, inner } => Ok(Regulation::Tagged(Tagged::new(
                tags.iter().cloned(),
                inner.build(model)?,
            ))),
            Self::Temporal { start, end, inner } => Ok(Regulation::Temporal(Temporal::new(
                *start,
                *end,
                inner.build(model)?,
            )?)),
            Self::Toggle { active, inner } => {
                let mut toggle = OnOff::new(inner.build(model)?);
                toggle.set_active(*active);
                Ok(Regulation::Toggle(toggle))
            }
            Self::PortWait { hours, inner } => Ok(Regulation::PortWait(PortWait::new(
                *hours,
                inner.build(model)?,
            ))),
        }
    }
}

fn build_registry(
    model: &Model,
    hourly_detection: f64,
    fine: f64,
) -> Result<EnforcementRegistry, RegulationError> {
    let mut registry = EnforcementRegistry::new();
    let areas: std::collections::BTreeSet<MpaId> =
        model.map().tiles().filter_map(|tile| tile.mpa).collect();
    for mpa in areas {
        registry.register(mpa, hourly_detection, fine)?;
    }
    Ok(registry)
}

fn build_ledger_handle(
    model: &Model,
    allowances: &[f64],
    cadence: ResetCadence,
    ownership: Ownership,
    locker: &Locker<SharedLedger>,
) -> Result<SharedLedger, RegulationError> {
    let expected = model.catalog().len();
    if allowances.len() != expected {
        return Err(RegulationError::AllowanceCountMismatch {
            expected,
            actual: allowances.len(),
        });
    }
    cadence.validate()?;
    match ownership {
        Ownership::Exclusive => Ok(SharedLedger::exclusive(MultiQuotaLedger::new(
            allowances.to_vec(),
        )?)),
        Ownership::PoolShared => locker.get_or_create(|| {
            Ok(SharedLedger::pool_shared(MultiQuotaLedger::new(
                allowances.to_vec(),
            )?))
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use fathom_types::SpeciesCatalog;
    use fathom_world::SeaMap;

    use super::*;

    fn model() -> Model {
        Model::new(
            21,
            SpeciesCatalog::from_names(["cod", "haddock"]),
            SeaMap::uniform(3, 3, -70.0).unwrap(),
        )
    }

    #[test]
    fn yaml_round_trips_a_decorated_quota_chain() {
        let yaml = r"
kind: temporal
start: 100
end: 200
inner:
  kind: mono-quota
  allowance: 1000.0
  cadence:
    every-days: 30
  ownership: PoolShared
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        let rule = factory.build(&mut model).unwrap();
        assert_eq!(rule.kind_name(), "temporal");
        assert_eq!(rule.quota_remaining(SpeciesId(0)).unwrap(), 1000.0);
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let result = RegulationFactory::from_yaml_str("kind: no-such-rule");
        assert!(matches!(result, Err(FactoryConfigError::Yaml { .. })));
    }

    #[test]
    fn pool_shared_recipes_hand_every_build_the_same_ledger() {
        let yaml = r"
kind: multi-quota
allowances: [1000.0, 500.0]
cadence: yearly
ownership: PoolShared
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        let mut first = factory.build(&mut model).unwrap();
        let second = factory.build(&mut model).unwrap();
        first.set_quota_remaining(SpeciesId(0), 250.0).unwrap();
        assert_eq!(second.quota_remaining(SpeciesId(0)).unwrap(), 250.0);

        // Clones of the factory alias the same cache.
        let third = factory.clone().build(&mut model).unwrap();
        assert_eq!(third.quota_remaining(SpeciesId(0)).unwrap(), 250.0);
    }

    #[test]
    fn exclusive_recipes_build_independent_ledgers() {
        let yaml = r"
kind: mono-quota
allowance: 100.0
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        let mut first = factory.build(&mut model).unwrap();
        let second = factory.build(&mut model).unwrap();
        first.set_quota_remaining(SpeciesId(0), 10.0).unwrap();
        assert_eq!(second.quota_remaining(SpeciesId(0)).unwrap(), 100.0);
    }

    #[test]
    fn allowance_count_must_match_the_catalog() {
        let yaml = r"
kind: multi-quota
allowances: [1000.0]
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        assert!(matches!(
            factory.build(&mut model),
            Err(RegulationError::AllowanceCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn species_index_must_be_in_the_catalog() {
        let yaml = r"
kind: species-quota
species: 7
allowance: 100.0
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        assert!(matches!(
            factory.build(&mut model),
            Err(RegulationError::UnknownRecipeSpecies { index: 7, .. })
        ));
    }

    #[test]
    fn fined_recipe_registers_every_painted_area_once() {
        let mut model = model();
        model
            .map_mut()
            .paint_mpa(MpaId::new(), (0, 0), (1, 1))
            .unwrap();
        let yaml = r"
kind: fined-protected-areas
hourly_detection: 0.2
fine: 500.0
cheating: true
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let first = factory.build(&mut model).unwrap();
        let second = factory.build(&mut model).unwrap();
        let (Regulation::FinedProtectedAreas(a), Regulation::FinedProtectedAreas(b)) =
            (&first, &second)
        else {
            panic!("expected fined rules");
        };
        assert_eq!(a.registry().len(), 1);
        assert!(Rc::ptr_eq(a.registry(), b.registry()));
    }

    #[test]
    fn regime_recipe_builds_a_switch() {
        let yaml = r"
kind: regime-switch
indicator: biomass-index
low: 0.2
high: 0.5
business:
  kind: anarchy
emergency:
  kind: banned
";
        let factory = RegulationFactory::from_yaml_str(yaml).unwrap();
        let mut model = model();
        let rule = factory.build(&mut model).unwrap();
        assert_eq!(rule.kind_name(), "regime-switch");
    }
}
