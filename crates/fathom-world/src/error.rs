//! Error types for the `fathom-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

/// Errors that can occur during sea-grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A tile coordinate fell outside the grid.
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// A grid was requested with a zero dimension.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}
