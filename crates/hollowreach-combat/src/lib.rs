//! Hitboxes, collision, skills and loadouts for the Hollowreach
//! simulation.
//!
//! A used skill becomes one or more [`HitBox`]es: time-windowed, optionally
//! moving attack volumes carrying a frozen snapshot of the attacker's
//! stats. Each tick the collision service matches active hitboxes against
//! the actors on their map and reports first contacts.
//!
//! # Modules
//!
//! - [`collision`] -- Advancing hitboxes and detecting first contacts.
//! - [`damage`] -- The damage formula.
//! - [`error`] -- Error types for combat operations.
//! - [`hitbox`] -- The [`HitBox`] aggregate and its store.
//! - [`loadout`] -- Skill decks, loadouts, cooldowns and resource costs.
//! - [`skill`] -- Skill specifications and the skill catalog.
//! - [`translate`] -- Auto-aim and skill-to-hitbox translation.

pub mod collision;
pub mod damage;
pub mod error;
pub mod hitbox;
pub mod loadout;
pub mod skill;
pub mod translate;

pub use collision::{Collision, advance_and_collide, detect_collisions};
pub use damage::compute_damage;
pub use error::CombatError;
pub use hitbox::{HitBox, HitBoxStore};
pub use loadout::{EquippedSkill, ResourcePool, SkillActivation, SkillDeck, SkillLoadout};
pub use skill::{HitSegment, SkillCatalog, SkillSpec};
pub use translate::{CasterView, auto_aim, translate_skill};
