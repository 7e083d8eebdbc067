//! Quota-market price signals and opportunity-cost estimation.
//!
//! The double-auction quota market itself is an external collaborator;
//! this crate models only the surface the regulation engine consumes --
//! per-species **closing prices** (NaN until the first trading day
//! produces one) -- and the two estimators that turn those signals into
//! **opportunity costs** charged against a vessel's trip ledger:
//!
//! - [`ItqCostAdapter`]: foregone quota-sale revenue, `closing price x
//!   biomass sold` per species.
//! - [`SmoothedFleetCosts`]: under a binding shared total allowable
//!   catch, the value of the gap between the fleet's smoothed hourly
//!   catch rate and the vessel's own rate.
//!
//! # Modules
//!
//! - [`cost`] -- [`TripCostSource`] and the two adapters.
//! - [`error`] -- Error types for market bookkeeping.
//! - [`moving_average`] -- Fixed-window arithmetic mean.
//! - [`order_book`] -- Closing-price store per species.

pub mod cost;
pub mod error;
pub mod moving_average;
pub mod order_book;

pub use cost::{ItqCostAdapter, SharedCostSource, SmoothedFleetCosts, TripCostSource};
pub use error::MarketError;
pub use moving_average::MovingAverage;
pub use order_book::{OrderBookRegistry, SharedOrderBooks};
