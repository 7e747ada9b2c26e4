//! Physical maps, world objects and environment for the Hollowreach
//! simulation.
//!
//! This crate models a spot's physical state: a grid of terrain tiles, the
//! objects placed on it with their behavior components, gateways to other
//! spots, named location zones and the ambient weather.
//!
//! # Modules
//!
//! - [`behavior`] -- The autonomous behavior state machine carried by
//!   monster objects.
//! - [`environment`] -- Climate-weighted deterministic weather.
//! - [`error`] -- Error types for map and object operations.
//! - [`harvestable`] -- Resource nodes with lazy quantity recovery.
//! - [`map`] -- The [`PhysicalMap`] aggregate: placement, removal, lookup
//!   and movement.
//! - [`object`] -- [`WorldObject`] and its behavior component variants.
//! - [`starting_world`] -- Default two-spot starting world.
//! - [`tile`] -- Terrain tiles.
//! - [`zone`] -- Gateways and location zones.

pub mod behavior;
pub mod environment;
pub mod error;
pub mod harvestable;
pub mod map;
pub mod object;
pub mod starting_world;
pub mod tile;
pub mod zone;

// Re-export primary types at crate root.
pub use behavior::{AutonomousComponent, Transition};
pub use environment::WeatherSystem;
pub use error::WorldError;
pub use harvestable::HarvestableComponent;
pub use map::{MoveOutcome, PhysicalMap};
pub use object::{
    ActorComponent, Behavior, ChestComponent, DoorComponent, MovementCapability, WorldObject,
};
pub use starting_world::{StartingWorld, create_starting_world};
pub use tile::Tile;
pub use zone::{Gateway, LocationZone};
