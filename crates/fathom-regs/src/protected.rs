//! Spatial closures and their enforcement.
//!
//! The plain protected-area gate lives directly on the rule enum (it is
//! stateless); this module holds the fined variant and its supporting
//! registry. Enforcement terms are registered once per protected area
//! before the run starts and are read-only thereafter, so every copy of
//! a fined rule shares one registry by construction.

use std::collections::BTreeMap;
use std::rc::Rc;

use fathom_types::MpaId;
use fathom_vessel::Vessel;
use fathom_world::SeaTile;
use rand::Rng;
use tracing::info;

use crate::error::RegulationError;

/// Detection probability and fine for one protected area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnforcementTerms {
    /// Probability of detection per hour fished inside the area.
    pub hourly_detection: f64,
    /// Fine charged on detection.
    pub fine: f64,
}

/// Enforcement terms per protected area.
///
/// Built before the simulation starts, then frozen behind an `Rc`. A
/// protected tile encountered at runtime without a record here is a
/// fatal configuration error, not a soft gap.
#[derive(Debug, Clone, Default)]
pub struct EnforcementRegistry {
    terms: BTreeMap<MpaId, EnforcementTerms>,
}

impl EnforcementRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    /// Register terms for one protected area.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::InvalidEnforcementTerms`] unless the
    /// detection probability is in `[0, 1]` and the fine is a finite
    /// non-negative amount.
    pub fn register(
        &mut self,
        mpa: MpaId,
        hourly_detection: f64,
        fine: f64,
    ) -> Result<(), RegulationError> {
        let probability_ok = (0.0..=1.0).contains(&hourly_detection);
        let fine_ok = fine.is_finite() && fine >= 0.0;
        if !probability_ok || !fine_ok {
            return Err(RegulationError::InvalidEnforcementTerms {
                mpa,
                hourly_detection,
                fine,
            });
        }
        self.terms.insert(
            mpa,
            EnforcementTerms {
                hourly_detection,
                fine,
            },
        );
        Ok(())
    }

    /// Terms for one area, if registered.
    pub fn terms(&self, mpa: MpaId) -> Option<EnforcementTerms> {
        self.terms.get(&mpa).copied()
    }

    /// Number of registered areas.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no areas are registered.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A protected-area rule enforced by patrols rather than by the gate.
///
/// When the cheating flag is set, `can_fish_here` stops gating on
/// protection entirely; the deterrent is the catch-time Bernoulli trial,
/// one per started hour fished inside a protected tile. A detected
/// vessel is fined and ordered back to port.
#[derive(Debug, Clone)]
pub struct FinedProtectedAreas {
    registry: Rc<EnforcementRegistry>,
    cheating: bool,
}

impl FinedProtectedAreas {
    /// Create a fined gate over a frozen registry.
    pub const fn new(registry: Rc<EnforcementRegistry>, cheating: bool) -> Self {
        Self { registry, cheating }
    }

    /// Whether vessels are structurally allowed onto protected tiles.
    pub const fn cheating(&self) -> bool {
        self.cheating
    }

    /// The shared enforcement registry.
    pub const fn registry(&self) -> &Rc<EnforcementRegistry> {
        &self.registry
    }

    /// Location gate: protection only binds when cheating is disabled.
    pub fn can_fish_here(&self, tile: &SeaTile) -> bool {
        self.cheating || !tile.is_protected()
    }

    /// Run the enforcement lottery for hours fished on a tile.
    ///
    /// One Bernoulli trial per started hour; the first detection fines
    /// the vessel, orders it back to port, and ends the lottery.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::MissingEnforcement`] if the tile is
    /// protected but its area was never registered.
    pub fn react_to_catch(
        &self,
        tile: &SeaTile,
        vessel: &mut Vessel,
        hours_fishing: f64,
        rng: &mut impl Rng,
    ) -> Result<(), RegulationError> {
        let Some(mpa) = tile.mpa else {
            return Ok(());
        };
        let terms = self
            .registry
            .terms(mpa)
            .ok_or(RegulationError::MissingEnforcement { mpa })?;
        let mut hours_left = hours_fishing;
        while hours_left > 0.0 {
            if rng.random_bool(terms.hourly_detection) {
                vessel.charge_fine(terms.fine)?;
                vessel.force_back_to_port();
                info!(
                    vessel = %vessel.id(),
                    %mpa,
                    fine = terms.fine,
                    "vessel caught fishing in protected area"
                );
                break;
            }
            hours_left -= 1.0;
        }
        Ok(())
    }
}
