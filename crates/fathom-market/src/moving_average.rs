//! Fixed-window arithmetic mean over a stream of daily observations.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// A simple moving average over the last `window` observations.
///
/// Reports NaN until the first observation arrives and is considered
/// *ready* only once the window is full; estimators that want a stable
/// baseline check [`is_ready`] before acting.
///
/// [`is_ready`]: MovingAverage::is_ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    /// Window size in observations.
    window: usize,
    /// The retained observations, oldest first.
    values: VecDeque<f64>,
}

impl MovingAverage {
    /// Create an empty moving average with the given window.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ZeroWindow`] for a zero-size window.
    pub fn new(window: usize) -> Result<Self, MarketError> {
        if window == 0 {
            return Err(MarketError::ZeroWindow);
        }
        Ok(Self {
            window,
            values: VecDeque::with_capacity(window),
        })
    }

    /// Push one observation, evicting the oldest if the window is full.
    pub fn observe(&mut self, value: f64) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// The mean of the retained observations, or NaN if there are none.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.values.len() as f64;
        self.values.iter().sum::<f64>() / count
    }

    /// Whether the window is full.
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.window
    }
}
