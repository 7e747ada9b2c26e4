//! Monsters, player status, loot, aggro and autonomous decisions for the
//! Hollowreach simulation.
//!
//! This crate holds the aggregates that live alongside the map (monsters
//! and player status), the aggro store the behavior layer reads, and the
//! decision logic that turns a monster's view of the world into one action
//! per tick. Nothing here performs I/O.
//!
//! # Modules
//!
//! - [`aggro`] -- Per-spot, per-attacker threat tallies with read-time decay.
//! - [`decision`] -- Target choice, state-machine driving and action choice.
//! - [`error`] -- Error types ([`AgentError`]).
//! - [`loot`] -- Items, loot tables and weighted rolls.
//! - [`monster`] -- Monster templates and the [`Monster`] aggregate.
//! - [`status`] -- Player status, progression and the status/inventory
//!   service interfaces.
//! - [`vision`] -- Range and field-of-view tests.

pub mod aggro;
pub mod decision;
pub mod error;
pub mod loot;
pub mod monster;
pub mod status;
pub mod vision;

// Re-export primary types at crate root for convenience.
pub use aggro::{AggroStore, MemoryPolicy, ThreatEntry};
pub use decision::{Decision, DecisionContext, FirstInRange, SkillSelectionPolicy, decide};
pub use error::AgentError;
pub use loot::{ItemCatalog, ItemSpec, LootEntry, LootTable, LootTables};
pub use monster::{Monster, MonsterCatalog, MonsterStore, MonsterTemplate, SpawnedMonster};
pub use status::{InventoryService, PlayerStatus, RewardReceipt, StatusRepository, StatusService};
pub use vision::{can_see, effective_vision_range};
