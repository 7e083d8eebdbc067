//! Error types for the `fathom-market` crate.

use fathom_types::SpeciesId;

/// Errors that can occur during market bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// A closing price was negative or NaN.
    ///
    /// NaN is the *absence* sentinel and is never recorded explicitly;
    /// a book without observations reports NaN on its own.
    #[error("invalid closing price {price} for {species}")]
    InvalidPrice {
        /// The species whose book was updated.
        species: SpeciesId,
        /// The offending price.
        price: f64,
    },

    /// A moving-average window of zero was configured.
    #[error("moving average window must be at least 1")]
    ZeroWindow,

    /// The order-book registry was accessed re-entrantly.
    #[error("order-book registry accessed re-entrantly")]
    ReentrantAccess,
}
