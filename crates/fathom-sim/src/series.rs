//! Named yearly indicator columns.
//!
//! Controllers (the regime switch) read biological or economic
//! indicators that some external assessment process appends once per
//! year. A column with no observations yet reports NaN; consumers treat
//! NaN as "no data, skip this cycle".

use std::collections::BTreeMap;

/// Store of named yearly indicator time series.
#[derive(Debug, Clone, Default)]
pub struct YearlySeries {
    /// One column of yearly observations per indicator name.
    columns: BTreeMap<String, Vec<f64>>,
}

impl YearlySeries {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Append this year's observation to a named column, creating the
    /// column on first use.
    pub fn append(&mut self, name: impl Into<String>, value: f64) {
        self.columns.entry(name.into()).or_default().push(value);
    }

    /// The most recent observation of a column, or NaN if the column is
    /// missing or empty.
    pub fn latest(&self, name: &str) -> f64 {
        self.columns
            .get(name)
            .and_then(|column| column.last())
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Number of observations in a column (0 if missing).
    pub fn len_of(&self, name: &str) -> usize {
        self.columns.get(name).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_reports_nan() {
        let series = YearlySeries::new();
        assert!(series.latest("biomass-index").is_nan());
        assert_eq!(series.len_of("biomass-index"), 0);
    }

    #[test]
    fn latest_tracks_appends() {
        let mut series = YearlySeries::new();
        series.append("biomass-index", 0.6);
        series.append("biomass-index", 0.1);
        assert_eq!(series.latest("biomass-index"), 0.1);
        assert_eq!(series.len_of("biomass-index"), 2);
    }
}
