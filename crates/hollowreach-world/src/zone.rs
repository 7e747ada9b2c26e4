//! Gateways between spots and named location zones within a spot.

use hollowreach_types::{Area, Coordinate, SpotId, ZoneKind};
use serde::{Deserialize, Serialize};

/// A region of a map that transfers whoever steps into it to another spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    /// Display name.
    pub name: String,
    /// Trigger region on this map.
    pub area: Area,
    /// Destination spot.
    pub target_spot: SpotId,
    /// Entry cell on the destination spot.
    pub target_coordinate: Coordinate,
}

/// A named area of a map with a zone kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationZone {
    /// Display name.
    pub name: String,
    /// Covered region.
    pub area: Area,
    /// What kind of place it is.
    pub kind: ZoneKind,
}
