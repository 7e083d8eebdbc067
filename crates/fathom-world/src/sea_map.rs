//! The sea grid: a rectangular field of [`SeaTile`] values.
//!
//! The map is built once at scenario setup. The regulation engine only
//! reads it (protection membership, altitude); the single mutation it
//! supports is painting a rectangular marine protected area, which happens
//! before the simulation starts.

use fathom_types::MpaId;

use crate::error::WorldError;
use crate::tile::SeaTile;

/// Rectangular grid of sea tiles.
#[derive(Debug, Clone)]
pub struct SeaMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Tiles in row-major order.
    tiles: Vec<SeaTile>,
}

impl SeaMap {
    /// Create a map of uniform depth with no protected areas.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] if either dimension is zero.
    pub fn uniform(width: u32, height: u32, altitude: f64) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid { width, height });
        }
        let mut tiles = Vec::with_capacity((width as usize).saturating_mul(height as usize));
        for y in 0..height {
            for x in 0..width {
                tiles.push(SeaTile::new(x, y, altitude));
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Grid width in tiles.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = (y as usize).checked_mul(self.width as usize)?;
        row.checked_add(x as usize)
    }

    /// Look up the tile at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the coordinate is outside
    /// the grid.
    pub fn tile(&self, x: u32, y: u32) -> Result<&SeaTile, WorldError> {
        self.offset(x, y)
            .and_then(|i| self.tiles.get(i))
            .ok_or(WorldError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
    }

    /// Paint a rectangular marine protected area over `[x0, x1] x [y0, y1]`
    /// (inclusive), assigning every covered tile to `mpa`.
    ///
    /// Called during scenario setup, before any vessel starts fishing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if either corner is outside the
    /// grid.
    pub fn paint_mpa(
        &mut self,
        mpa: MpaId,
        (x0, y0): (u32, u32),
        (x1, y1): (u32, u32),
    ) -> Result<(), WorldError> {
        // Validate both corners up front so a partial paint never happens.
        self.tile(x0, y0)?;
        self.tile(x1, y1)?;
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                if let Some(tile) = self.offset(x, y).and_then(|i| self.tiles.get_mut(i)) {
                    tile.mpa = Some(mpa);
                }
            }
        }
        Ok(())
    }

    /// Iterate over all tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &SeaTile> {
        self.tiles.iter()
    }

    /// Count the tiles currently inside any protected area.
    pub fn protected_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_protected()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open_sea(width: u32, height: u32) -> SeaMap {
        SeaMap::uniform(width, height, -100.0).unwrap()
    }

    #[test]
    fn uniform_map_has_expected_shape() {
        let map = open_sea(4, 3);
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.tiles().count(), 12);
        assert_eq!(map.protected_tile_count(), 0);
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(SeaMap::uniform(0, 5, -10.0).is_err());
        assert!(SeaMap::uniform(5, 0, -10.0).is_err());
    }

    #[test]
    fn out_of_bounds_lookup_fails() {
        let map = open_sea(2, 2);
        assert!(map.tile(2, 0).is_err());
        assert!(map.tile(0, 2).is_err());
        assert!(map.tile(1, 1).is_ok());
    }

    #[test]
    fn paint_mpa_marks_inclusive_rectangle() {
        let mut map = open_sea(5, 5);
        let mpa = MpaId::new();
        assert!(map.paint_mpa(mpa, (1, 1), (3, 2)).is_ok());
        assert_eq!(map.protected_tile_count(), 6);
        assert!(map.tile(1, 1).is_ok_and(SeaTile::is_protected));
        assert!(map.tile(3, 2).is_ok_and(SeaTile::is_protected));
        assert!(!map.tile(0, 0).is_ok_and(SeaTile::is_protected));
        assert!(!map.tile(4, 4).is_ok_and(SeaTile::is_protected));
    }

    #[test]
    fn paint_mpa_with_swapped_corners() {
        let mut map = open_sea(4, 4);
        let mpa = MpaId::new();
        assert!(map.paint_mpa(mpa, (3, 3), (1, 1)).is_ok());
        assert_eq!(map.protected_tile_count(), 9);
    }

    #[test]
    fn paint_mpa_out_of_bounds_is_rejected_whole() {
        let mut map = open_sea(3, 3);
        let mpa = MpaId::new();
        assert!(map.paint_mpa(mpa, (0, 0), (5, 5)).is_err());
        // Nothing was painted.
        assert_eq!(map.protected_tile_count(), 0);
    }
}
