//! Terrain tiles.

use hollowreach_types::{Coordinate, TerrainType};
use serde::{Deserialize, Serialize};

/// One cell of a map's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Where the tile is.
    pub coordinate: Coordinate,
    /// What it is made of.
    pub terrain: TerrainType,
}

impl Tile {
    /// Create a tile.
    pub const fn new(coordinate: Coordinate, terrain: TerrainType) -> Self {
        Self {
            coordinate,
            terrain,
        }
    }
}
