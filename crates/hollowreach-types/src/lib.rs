//! Shared type definitions for the Hollowreach world simulation.
//!
//! This crate is the single source of truth for the value types used
//! across the Hollowreach workspace. It carries no behavior beyond the
//! geometry and arithmetic those values need.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for entities and reference data
//! - [`spatial`] -- Coordinates, directions, vectors, shapes and areas
//! - [`enums`] -- Terrain, behavior states, weather, factions and friends
//! - [`stats`] -- Combat stats and timed buffs
//! - [`actions`] -- Command and result types for movement and skill use

pub mod actions;
pub mod enums;
pub mod ids;
pub mod spatial;
pub mod stats;

// Re-export all public types at crate root for convenience.
pub use actions::{
    MonsterAction, MoveCommand, MoveResult, MoveTarget, ResourceCost, UseSkillCommand,
    UseSkillResult,
};
pub use enums::{
    BehaviorState, Climate, Element, ObjectType, Race, ResourceKind, Side, SkillTier,
    TerrainType, ToolCategory, TraversalTag, Weather, ZoneKind,
};
pub use ids::{
    EventId, HitBoxId, ItemId, LootTableId, MonsterId, MonsterTemplateId, NotificationId,
    ObjectId, PlayerId, SkillId, SpotId,
};
pub use spatial::{Area, Coordinate, Direction, Shape, Vector};
pub use stats::{Buff, CombatStats, StatKind};
