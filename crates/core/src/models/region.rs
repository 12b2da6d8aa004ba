//! Producing regions (Indian states) shown on the map.

use serde::{Deserialize, Serialize};

/// Map position of a state, in the viewer's normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Descriptive information about a producing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    pub name: String,
    pub agricultural_products: Vec<String>,
    pub description: String,
    pub coordinates: Coordinates,
}
