//! One cell of the sea grid.

use fathom_types::MpaId;
use serde::{Deserialize, Serialize};

/// A single grid cell the regulation engine can be asked about.
///
/// Altitude follows the usual bathymetry convention: negative values are
/// below sea level (fishable water), non-negative values are land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeaTile {
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Altitude in metres; negative means sea.
    pub altitude: f64,
    /// Marine protected area this tile belongs to, if any.
    pub mpa: Option<MpaId>,
}

impl SeaTile {
    /// Create a sea tile at the given coordinates and depth, outside any
    /// protected area.
    pub const fn new(x: u32, y: u32, altitude: f64) -> Self {
        Self {
            x,
            y,
            altitude,
            mpa: None,
        }
    }

    /// Return whether this tile is inside a marine protected area.
    pub const fn is_protected(&self) -> bool {
        self.mpa.is_some()
    }

    /// Return whether this tile is land (altitude at or above sea level).
    pub fn is_land(&self) -> bool {
        self.altitude >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tile_is_unprotected_water() {
        let tile = SeaTile::new(3, 4, -120.0);
        assert!(!tile.is_protected());
        assert!(!tile.is_land());
    }

    #[test]
    fn tile_with_mpa_is_protected() {
        let mut tile = SeaTile::new(0, 0, -50.0);
        tile.mpa = Some(MpaId::new());
        assert!(tile.is_protected());
    }

    #[test]
    fn zero_altitude_is_land() {
        let tile = SeaTile::new(0, 0, 0.0);
        assert!(tile.is_land());
    }
}
