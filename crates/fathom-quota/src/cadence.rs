//! Reset cadence for quota ledgers.
//!
//! Every ledger instance resets on exactly one cadence: at the turn of
//! the calendar year, or every N simulated days. The choice is fixed at
//! construction; the scheduling itself is done by the rule that owns the
//! ledger when it registers its reset task.
//!
//! In recipes the cadence is spelled as the string `yearly` or as a
//! one-key mapping `every-days: N`. Both forms survive serde's content
//! buffering, so the cadence can sit inside internally tagged recipe
//! enums.

use core::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QuotaError;

/// When a quota ledger refills to its yearly allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCadence {
    /// Refill at the start of every calendar year.
    Yearly,
    /// Refill every N simulated days, counted from `start()`.
    EveryDays(
        /// The period in days; must be at least 1.
        u32,
    ),
}

impl ResetCadence {
    /// Validate the cadence at rule construction time.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::ZeroCadence`] for an every-zero-days period.
    pub const fn validate(self) -> Result<(), QuotaError> {
        match self {
            Self::Yearly => Ok(()),
            Self::EveryDays(days) => {
                if days == 0 {
                    Err(QuotaError::ZeroCadence)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Whether a daily tick `days_since_start` days after `start()` is a
    /// reset boundary for this cadence.
    ///
    /// Yearly cadences are driven by the year-boundary schedule slot
    /// instead and never fire here.
    pub const fn due_on_day(self, days_since_start: u32) -> bool {
        match self {
            Self::Yearly => false,
            Self::EveryDays(days) => {
                days > 0 && days_since_start > 0 && days_since_start % days == 0
            }
        }
    }
}

impl Serialize for ResetCadence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Self::Yearly => serializer.serialize_str("yearly"),
            Self::EveryDays(days) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("every-days", &days)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ResetCadence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CadenceVisitor;

        impl<'de> Visitor<'de> for CadenceVisitor {
            type Value = ResetCadence;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("\"yearly\" or a map with a single `every-days` key")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value == "yearly" {
                    Ok(ResetCadence::Yearly)
                } else {
                    Err(E::unknown_variant(value, &["yearly"]))
                }
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let Some((key, days)) = map.next_entry::<String, u32>()? else {
                    return Err(de::Error::missing_field("every-days"));
                };
                if key != "every-days" {
                    return Err(de::Error::unknown_field(&key, &["every-days"]));
                }
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom("expected a single `every-days` key"));
                }
                Ok(ResetCadence::EveryDays(days))
            }
        }

        deserializer.deserialize_any(CadenceVisitor)
    }
}
