//! Sea grid, protected areas, and ports for the Fathom regulation engine.
//!
//! This crate models the minimal geography the regulation engine queries:
//! a rectangular grid of [`SeaTile`] values carrying altitude and marine
//! protected area (MPA) membership, and [`Port`] descriptors for the
//! port-side rules.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid operations.
//! - [`port`] -- Port descriptors.
//! - [`tile`] -- [`SeaTile`]: one grid cell with altitude and protection.
//! - [`sea_map`] -- [`SeaMap`]: the grid, with coordinate lookup and
//!   protected-area painting.

pub mod error;
pub mod port;
pub mod sea_map;
pub mod tile;

pub use error::WorldError;
pub use port::Port;
pub use sea_map::SeaMap;
pub use tile::SeaTile;
