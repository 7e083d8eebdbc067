//! Per-species closing-price store.
//!
//! The matching engine that produces closing prices is external; the
//! regulation engine only reads the latest close. A species with no
//! completed trading day yet reports NaN, and every consumer treats NaN
//! as "no signal, skip this cycle".

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use fathom_types::SpeciesId;
use tracing::debug;

use crate::error::MarketError;

/// Closing prices for every species with an active quota market.
#[derive(Debug, Clone, Default)]
pub struct OrderBookRegistry {
    /// Latest closing price per species; absent means never traded.
    closes: BTreeMap<SpeciesId, f64>,
}

impl OrderBookRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            closes: BTreeMap::new(),
        }
    }

    /// The latest closing price for a species, or NaN if that market has
    /// not produced one yet.
    pub fn closing_price(&self, species: SpeciesId) -> f64 {
        self.closes.get(&species).copied().unwrap_or(f64::NAN)
    }

    /// Record a day's closing price.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidPrice`] for NaN or negative prices.
    pub fn record_close(&mut self, species: SpeciesId, price: f64) -> Result<(), MarketError> {
        if price.is_nan() || price < 0.0 {
            return Err(MarketError::InvalidPrice { species, price });
        }
        debug!(%species, price, "closing price recorded");
        self.closes.insert(species, price);
        Ok(())
    }
}

/// A reference-counted handle to the run-wide [`OrderBookRegistry`].
///
/// One registry exists per simulation run; every ITQ adapter holds this
/// handle, mirroring how pool-shared quota ledgers are aliased.
#[derive(Debug, Clone, Default)]
pub struct SharedOrderBooks {
    inner: Rc<RefCell<OrderBookRegistry>>,
}

impl SharedOrderBooks {
    /// Create a handle to a fresh empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest closing price for a species, or NaN when there is no
    /// observation (including while the registry is busy: a missing
    /// price is always a soft gap).
    pub fn closing_price(&self, species: SpeciesId) -> f64 {
        match self.inner.try_borrow() {
            Ok(registry) => registry.closing_price(species),
            Err(_busy) => f64::NAN,
        }
    }

    /// Record a day's closing price.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidPrice`] for NaN or negative prices,
    /// [`MarketError::ReentrantAccess`] if the registry is borrowed.
    pub fn record_close(&self, species: SpeciesId, price: f64) -> Result<(), MarketError> {
        match self.inner.try_borrow_mut() {
            Ok(mut registry) => registry.record_close(species, price),
            Err(_busy) => Err(MarketError::ReentrantAccess),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_market_reports_nan() {
        let books = SharedOrderBooks::new();
        assert!(books.closing_price(SpeciesId(0)).is_nan());
    }

    #[test]
    fn latest_close_wins() {
        let books = SharedOrderBooks::new();
        books.record_close(SpeciesId(0), 12.0).unwrap();
        books.record_close(SpeciesId(0), 14.5).unwrap();
        assert_eq!(books.closing_price(SpeciesId(0)), 14.5);
    }

    #[test]
    fn invalid_prices_rejected() {
        let books = SharedOrderBooks::new();
        assert!(books.record_close(SpeciesId(0), f64::NAN).is_err());
        assert!(books.record_close(SpeciesId(0), -1.0).is_err());
    }

    #[test]
    fn handles_alias_one_registry() {
        let a = SharedOrderBooks::new();
        let b = a.clone();
        a.record_close(SpeciesId(1), 9.0).unwrap();
        assert_eq!(b.closing_price(SpeciesId(1)), 9.0);
    }
}
