//! The world clock: an absolute day counter with calendar derivations.
//!
//! The absolute day number is the single source of truth; day-of-year
//! and year index are always derived from it, never stored separately.
//! The calendar is a fixed 365-day year.

use fathom_types::DAYS_PER_YEAR;

use crate::error::SimError;

#[allow(clippy::cast_lossless)]
const YEAR_DAYS: u64 = DAYS_PER_YEAR as u64;

/// The simulation's day counter.
///
/// Day 0 is the first day of year 0; `day_of_year` is 1-based
/// (`1..=365`) to match the day ranges regulations are configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimClock {
    /// Absolute simulated day, 0-based.
    day: u64,
}

impl SimClock {
    /// Create a clock at day 0 (first day of year 0).
    pub const fn new() -> Self {
        Self { day: 0 }
    }

    /// Absolute simulated day, 0-based.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// Day within the current year, 1-based (`1..=365`).
    #[allow(clippy::cast_possible_truncation)]
    pub const fn day_of_year(&self) -> u32 {
        (self.day % YEAR_DAYS) as u32 + 1
    }

    /// Year index, 0-based.
    pub const fn year(&self) -> u64 {
        self.day / YEAR_DAYS
    }

    /// Whether today is the first day of a year.
    pub const fn is_year_start(&self) -> bool {
        self.day % YEAR_DAYS == 0
    }

    /// Advance by one day.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ClockOverflow`] if the day counter would
    /// overflow (never in practice).
    pub fn advance_day(&mut self) -> Result<(), SimError> {
        self.day = self.day.checked_add(1).ok_or(SimError::ClockOverflow)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_day_one_of_year_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.day(), 0);
        assert_eq!(clock.day_of_year(), 1);
        assert_eq!(clock.year(), 0);
        assert!(clock.is_year_start());
    }

    #[test]
    fn day_of_year_wraps_at_year_boundary() {
        let mut clock = SimClock::new();
        for _ in 0..364 {
            clock.advance_day().unwrap();
        }
        assert_eq!(clock.day_of_year(), 365);
        assert_eq!(clock.year(), 0);
        clock.advance_day().unwrap();
        assert_eq!(clock.day_of_year(), 1);
        assert_eq!(clock.year(), 1);
        assert!(clock.is_year_start());
    }
}
