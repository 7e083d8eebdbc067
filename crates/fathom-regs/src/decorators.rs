//! Single-delegate wrappers that add one condition to a rule.
//!
//! Every decorator forwards the full contract to its wrapped rule
//! except for the one behavior it adds. The conditional pair (tag and
//! day-window) bypasses the wrapped rule entirely while not applying:
//! all three gates answer permissively and events are swallowed.

use std::collections::{BTreeMap, BTreeSet};

use fathom_sim::Model;
use fathom_types::PortId;
use fathom_vessel::Vessel;

use crate::error::RegulationError;
use crate::regulation::Regulation;

/// Last simulated day of the fixed-length year.
const LAST_DAY: u32 = fathom_types::DAYS_PER_YEAR;

fn validate_day(day: u32) -> Result<(), RegulationError> {
    if (1..=LAST_DAY).contains(&day) {
        Ok(())
    } else {
        Err(RegulationError::InvalidDayRange {
            start: day,
            end: day,
        })
    }
}

/// Whether `day` falls in `[start, end]`, wrapping over the year
/// boundary when `start > end`.
const fn window_contains(start: u32, end: u32, day: u32) -> bool {
    if start <= end {
        start <= day && day <= end
    } else {
        day >= start || day <= end
    }
}

// ---------------------------------------------------------------------------
// Arbitrary pause
// ---------------------------------------------------------------------------

/// Keeps docked vessels in port during a fixed window of the year.
///
/// Pause windows do not wrap; `start > end` is rejected at
/// construction.
#[derive(Debug)]
pub struct ArbitraryPause {
    start: u32,
    end: u32,
    inner: Box<Regulation>,
}

impl ArbitraryPause {
    /// Wrap a rule with a pause window over days `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::InvalidDayRange`] for days outside
    /// `1..=365` or a window with `start > end`.
    pub fn new(start: u32, end: u32, inner: Regulation) -> Result<Self, RegulationError> {
        validate_day(start)?;
        validate_day(end)?;
        if start > end {
            return Err(RegulationError::InvalidDayRange { start, end });
        }
        Ok(Self {
            start,
            end,
            inner: Box::new(inner),
        })
    }

    /// The wrapped rule.
    pub const fn inner(&self) -> &Regulation {
        &self.inner
    }

    /// Mutable access to the wrapped rule.
    pub const fn inner_mut(&mut self) -> &mut Regulation {
        &mut self.inner
    }

    /// At-sea gate: docked vessels stay in port during the window.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        let day = model.clock().day_of_year();
        if vessel.is_docked() && window_contains(self.start, self.end, day) {
            return Ok(false);
        }
        self.inner.allowed_at_sea(vessel, model)
    }

    /// The wrapper a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            start: self.start,
            end: self.end,
            inner: Box::new(self.inner.make_copy()?),
        })
    }
}

// ---------------------------------------------------------------------------
// Conditional decorators
// ---------------------------------------------------------------------------

/// Applies the wrapped rule only to vessels carrying one of a fixed set
/// of tags.
#[derive(Debug)]
pub struct Tagged {
    tags: BTreeSet<String>,
    inner: Box<Regulation>,
}

impl Tagged {
    /// Wrap a rule behind a tag filter.
    pub fn new(tags: impl IntoIterator<Item = String>, inner: Regulation) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            inner: Box::new(inner),
        }
    }

    /// The wrapped rule.
    pub const fn inner(&self) -> &Regulation {
        &self.inner
    }

    /// Mutable access to the wrapped rule.
    pub const fn inner_mut(&mut self) -> &mut Regulation {
        &mut self.inner
    }

    /// Whether the wrapped rule applies to this vessel.
    pub fn applies(&self, vessel: &Vessel) -> bool {
        vessel.has_any_tag(&self.tags)
    }

    /// The wrapper a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            tags: self.tags.clone(),
            inner: Box::new(self.inner.make_copy()?),
        })
    }
}

/// Applies the wrapped rule only during a window of the year.
///
/// Windows with `start > end` wrap over the year boundary: `start=350,
/// end=10` covers days 350 to 365 and 1 to 10.
#[derive(Debug)]
pub struct Temporal {
    start: u32,
    end: u32,
    inner: Box<Regulation>,
}

impl Temporal {
    /// Wrap a rule behind a day window.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::InvalidDayRange`] for days outside
    /// `1..=365`. `start > end` is legal and means wraparound.
    pub fn new(start: u32, end: u32, inner: Regulation) -> Result<Self, RegulationError> {
        validate_day(start)?;
        validate_day(end)?;
        Ok(Self {
            start,
            end,
            inner: Box::new(inner),
        })
    }

    /// The wrapped rule.
    pub const fn inner(&self) -> &Regulation {
        &self.inner
    }

    /// Mutable access to the wrapped rule.
    pub const fn inner_mut(&mut self) -> &mut Regulation {
        &mut self.inner
    }

    /// Whether the wrapped rule applies today.
    pub fn applies(&self, model: &Model) -> bool {
        window_contains(self.start, self.end, model.clock().day_of_year())
    }

    /// The wrapper a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            start: self.start,
            end: self.end,
            inner: Box::new(self.inner.make_copy()?),
        })
    }
}

// ---------------------------------------------------------------------------
// On/off toggle
// ---------------------------------------------------------------------------

/// A kill switch around a rule.
///
/// While off, all three gates deny. A catch or sale event arriving
/// while off is an invariant violation: the fisher should never have
/// been allowed out to produce it.
#[derive(Debug)]
pub struct OnOff {
    active: bool,
    inner: Box<Regulation>,
}

impl OnOff {
    /// Wrap a rule behind a toggle, initially on.
    pub fn new(inner: Regulation) -> Self {
        Self {
            active: true,
            inner: Box::new(inner),
        }
    }

    /// Whether the toggle is on.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the toggle.
    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The wrapped rule.
    pub const fn inner(&self) -> &Regulation {
        &self.inner
    }

    /// Mutable access to the wrapped rule.
    pub const fn inner_mut(&mut self) -> &mut Regulation {
        &mut self.inner
    }

    /// Guard an incoming event.
    ///
    /// # Errors
    ///
    /// Returns [`RegulationError::EventWhileOff`] while the toggle is
    /// off.
    pub const fn guard_event(&self) -> Result<(), RegulationError> {
        if self.active {
            Ok(())
        } else {
            Err(RegulationError::EventWhileOff)
        }
    }

    /// The wrapper a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            active: self.active,
            inner: Box::new(self.inner.make_copy()?),
        })
    }
}

// ---------------------------------------------------------------------------
// Port wait
// ---------------------------------------------------------------------------

/// Keeps a docked vessel in port until it has dwelt a minimum number of
/// hours.
///
/// The wait is configured per port, with a default for ports not
/// listed.
#[derive(Debug)]
pub struct PortWait {
    default_hours: f64,
    per_port: BTreeMap<PortId, f64>,
    inner: Box<Regulation>,
}

impl PortWait {
    /// Wrap a rule with a uniform dwell requirement.
    pub fn new(default_hours: f64, inner: Regulation) -> Self {
        Self {
            default_hours,
            per_port: BTreeMap::new(),
            inner: Box::new(inner),
        }
    }

    /// Override the dwell requirement for one port.
    #[must_use]
    pub fn with_port_hours(mut self, port: PortId, hours: f64) -> Self {
        self.per_port.insert(port, hours);
        self
    }

    /// The wrapped rule.
    pub const fn inner(&self) -> &Regulation {
        &self.inner
    }

    /// Mutable access to the wrapped rule.
    pub const fn inner_mut(&mut self) -> &mut Regulation {
        &mut self.inner
    }

    /// Hours a vessel must dwell at the given port before departing.
    pub fn required_hours(&self, port: PortId) -> f64 {
        self.per_port.get(&port).copied().unwrap_or(self.default_hours)
    }

    /// At-sea gate: docked vessels wait out their dwell hours first.
    pub fn allowed_at_sea(&self, vessel: &Vessel, model: &Model) -> Result<bool, RegulationError> {
        if vessel.is_docked() && vessel.hours_at_port() < self.required_hours(vessel.home_port()) {
            return Ok(false);
        }
        self.inner.allowed_at_sea(vessel, model)
    }

    /// The wrapper a different vessel should use.
    pub fn make_copy(&self) -> Result<Self, RegulationError> {
        Ok(Self {
            default_hours: self.default_hours,
            per_port: self.per_port.clone(),
            inner: Box::new(self.inner.make_copy()?),
        })
    }
}
