//! Error types for the `hollowreach-combat` crate.

use hollowreach_types::{HitBoxId, ResourceKind, SkillId, SkillTier};
use hollowreach_world::WorldError;

/// Errors that can occur during combat operations.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// The skill is not in the catalog.
    #[error("unknown skill: {0}")]
    UnknownSkill(SkillId),

    /// Two catalog entries share an id.
    #[error("duplicate skill id: {0}")]
    DuplicateSkill(SkillId),

    /// A skill specification is malformed.
    #[error("invalid skill {skill}: {reason}")]
    InvalidSkill {
        /// The offending skill.
        skill: SkillId,
        /// What is wrong with it.
        reason: String,
    },

    /// The slot index is past the end of the deck.
    #[error("slot {slot} out of range for {tier:?} deck with {slots} slots")]
    SlotOutOfRange {
        /// Deck tier.
        tier: SkillTier,
        /// Requested slot.
        slot: usize,
        /// Number of slots in the deck.
        slots: usize,
    },

    /// Nothing is equipped in the slot.
    #[error("{tier:?} slot {slot} is empty")]
    EmptySlot {
        /// Deck tier.
        tier: SkillTier,
        /// Requested slot.
        slot: usize,
    },

    /// The skill already occupies a slot in the loadout.
    #[error("skill {skill} already equipped in {tier:?} slot {slot}")]
    AlreadyEquipped {
        /// The skill.
        skill: SkillId,
        /// Deck holding it.
        tier: SkillTier,
        /// Slot holding it.
        slot: usize,
    },

    /// Equipping would push the deck's total cost over capacity.
    #[error("{tier:?} deck capacity exceeded: needs {required}, capacity {capacity}")]
    CapacityExceeded {
        /// Deck tier.
        tier: SkillTier,
        /// Total cost after the equip.
        required: u32,
        /// Deck capacity.
        capacity: u32,
    },

    /// Awakened-only skills may only go in the awakened deck.
    #[error("skill {0} can only be equipped in the awakened deck")]
    AwakenedOnly(SkillId),

    /// The skill is still cooling down.
    #[error("skill {skill} on cooldown until tick {ready_at}")]
    OnCooldown {
        /// The skill.
        skill: SkillId,
        /// First tick it can be used again.
        ready_at: u64,
    },

    /// The actor cannot pay the skill's cost.
    #[error("insufficient {kind:?}: need {required}, have {available}")]
    InsufficientResource {
        /// Which resource is short.
        kind: ResourceKind,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// A hitbox with this id is already stored.
    #[error("duplicate hitbox id: {0}")]
    DuplicateHitBox(HitBoxId),

    /// A map lookup failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in combat calculation")]
    ArithmeticOverflow,
}
