//! Command and result types exchanged with the movement and skill
//! command services, plus the actions the behavior layer can decide on.

use serde::{Deserialize, Serialize};

use crate::enums::SkillTier;
use crate::ids::{HitBoxId, ObjectId, SkillId, SpotId};
use crate::spatial::{Coordinate, Direction};

/// Where a move command wants to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// One step in a direction.
    Direction(Direction),
    /// An explicit adjacent coordinate.
    Coordinate(Coordinate),
}

/// A request to move an actor one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// The spot the actor is on.
    pub spot: SpotId,
    /// The moving object.
    pub actor: ObjectId,
    /// Destination.
    pub target: MoveTarget,
}

/// The outcome of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// The moved object.
    pub actor: ObjectId,
    /// Coordinate before the move.
    pub from: Coordinate,
    /// Coordinate after the move. On a gateway this is the entry cell on
    /// the destination spot.
    pub to: Coordinate,
    /// Spot the actor ends up on.
    pub spot: SpotId,
    /// Tick until which the actor is busy.
    pub busy_until: u64,
    /// Stamina consumed by the step.
    pub stamina_spent: u32,
}

/// A request to fire a skill from a loadout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseSkillCommand {
    /// The spot the actor is on.
    pub spot: SpotId,
    /// The acting object.
    pub actor: ObjectId,
    /// Deck to fire from.
    pub tier: SkillTier,
    /// Slot index within the deck.
    pub slot: usize,
    /// Intended target. Facing only changes through `auto_aim`.
    pub target: Option<ObjectId>,
    /// Turn towards the nearest valid target in range before firing.
    pub auto_aim: bool,
}

/// HP, MP and stamina amounts, used both for costs and for what was
/// actually consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceCost {
    /// Hit points.
    #[serde(default)]
    pub hp: u32,
    /// Mana points.
    #[serde(default)]
    pub mp: u32,
    /// Stamina.
    #[serde(default)]
    pub stamina: u32,
}

impl ResourceCost {
    /// No cost at all.
    pub const FREE: Self = Self {
        hp: 0,
        mp: 0,
        stamina: 0,
    };

    /// Whether every component is zero.
    pub const fn is_free(&self) -> bool {
        self.hp == 0 && self.mp == 0 && self.stamina == 0
    }
}

/// The outcome of a successful skill use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseSkillResult {
    /// The acting object.
    pub actor: ObjectId,
    /// Skill fired.
    pub skill: SkillId,
    /// Resources consumed.
    pub consumed: ResourceCost,
    /// Facing after auto-aim.
    pub facing: Direction,
    /// Hitboxes spawned, in timeline order.
    pub hitboxes: Vec<HitBoxId>,
    /// Tick until which the actor is cast-locked.
    pub busy_until: u64,
}

/// One action chosen by the behavior layer for an autonomous object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterAction {
    /// Do nothing this tick.
    Wait,
    /// Step to an adjacent coordinate.
    Move {
        /// Destination cell.
        to: Coordinate,
    },
    /// Fire the skill in a normal-deck slot at a target.
    UseSkill {
        /// Slot index.
        slot: usize,
        /// Target object.
        target: ObjectId,
    },
}
