//! Port descriptors.
//!
//! Ports are where vessels dock between trips. The regulation engine only
//! needs their identity and grid position; berth capacity, markets, and
//! the rest of port life are out of scope here.

use fathom_types::PortId;
use serde::{Deserialize, Serialize};

/// A port on the coastline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Unique identifier.
    pub id: PortId,
    /// Human-readable name.
    pub name: String,
    /// Grid position of the port tile.
    pub position: (u32, u32),
}

impl Port {
    /// Create a port with a fresh identifier.
    pub fn new(name: impl Into<String>, position: (u32, u32)) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            position,
        }
    }
}
