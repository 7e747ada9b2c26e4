//! Error types for the `hollowreach-agents` crate.
//!
//! All operations that can fail return typed errors rather than panicking.

use hollowreach_combat::CombatError;
use hollowreach_types::{
    LootTableId, MonsterId, MonsterTemplateId, ObjectId, PlayerId, ResourceKind,
};
use hollowreach_world::WorldError;

/// Errors that can occur in monster, status, loot and aggro operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No monster aggregate with this id.
    #[error("monster not found: {0}")]
    MonsterNotFound(MonsterId),

    /// A monster with this id already exists.
    #[error("duplicate monster id: {0}")]
    DuplicateMonster(MonsterId),

    /// No monster aggregate is linked to the map object.
    #[error("no monster for object {0}")]
    NoMonsterForObject(ObjectId),

    /// No status aggregate for the player.
    #[error("player status not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The monster template is not in the catalog.
    #[error("unknown monster template: {0}")]
    UnknownTemplate(MonsterTemplateId),

    /// The loot table is not in the catalog.
    #[error("unknown loot table: {0}")]
    UnknownLootTable(LootTableId),

    /// Two loot tables share an id.
    #[error("duplicate loot table: {0}")]
    DuplicateLootTable(LootTableId),

    /// A loot table cannot be rolled.
    #[error("invalid loot table {table}: {reason}")]
    InvalidLootTable {
        /// The table.
        table: LootTableId,
        /// What is wrong with it.
        reason: String,
    },

    /// Not enough of a resource.
    #[error("insufficient {kind:?}: need {required}, have {available}")]
    InsufficientResource {
        /// Which resource.
        kind: ResourceKind,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// The player is downed and cannot act.
    #[error("player {0} is downed")]
    PlayerDowned(PlayerId),

    /// A combat operation failed.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// A map operation failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },
}
