//! Domain events emitted by the simulation core.

use hollowreach_types::{
    BehaviorState, Coordinate, HitBoxId, ItemId, MonsterAction, MonsterId, ObjectId, PlayerId,
    SkillId, SpotId, Weather,
};
use serde::{Deserialize, Serialize};

/// Something that happened in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// An active hitbox touched a target for the first time.
    HitRecorded {
        /// Spot the hit happened on.
        spot: SpotId,
        /// The hitbox.
        hitbox: HitBoxId,
        /// Object that was touched.
        target: ObjectId,
    },
    /// Damage was applied to an actor.
    DamageApplied {
        /// Spot the damage happened on.
        spot: SpotId,
        /// Hitbox that caused it.
        hitbox: HitBoxId,
        /// Object that owned the hitbox.
        attacker: ObjectId,
        /// Object that took the damage.
        target: ObjectId,
        /// Damage dealt.
        amount: u32,
        /// HP left on the target's authoritative aggregate.
        remaining_hp: u32,
    },
    /// An object stepped from one cell to another on the same spot.
    ObjectMoved {
        /// Spot of the move.
        spot: SpotId,
        /// Object that moved.
        object: ObjectId,
        /// Previous cell.
        from: Coordinate,
        /// New cell.
        to: Coordinate,
    },
    /// A skill was fired and translated into hitboxes.
    SkillUsed {
        /// Spot of the cast.
        spot: SpotId,
        /// Caster.
        actor: ObjectId,
        /// Skill fired.
        skill: SkillId,
        /// Hitboxes created.
        hitboxes: Vec<HitBoxId>,
    },
    /// The behavior layer chose an action for an autonomous object.
    BehaviorDecided {
        /// Spot of the object.
        spot: SpotId,
        /// The autonomous object.
        object: ObjectId,
        /// Behavior state after the decision.
        state: BehaviorState,
        /// Action chosen.
        action: MonsterAction,
    },
    /// An autonomous object's behavior state changed.
    BehaviorStateChanged {
        /// Spot of the object.
        spot: SpotId,
        /// The autonomous object.
        object: ObjectId,
        /// Previous state.
        from: BehaviorState,
        /// New state.
        to: BehaviorState,
    },
    /// A monster's HP reached zero.
    MonsterDied {
        /// Spot it died on.
        spot: SpotId,
        /// The monster aggregate.
        monster: MonsterId,
        /// The map object that represented it.
        object: ObjectId,
        /// Player credited with the kill, if any.
        killer_player: Option<PlayerId>,
        /// Object that dealt the killing blow, if any.
        killer_object: Option<ObjectId>,
    },
    /// A monster was created or respawned and needs a map presence.
    MonsterSpawned {
        /// Spot to place it on.
        spot: SpotId,
        /// The monster aggregate.
        monster: MonsterId,
        /// Map object id to use.
        object: ObjectId,
        /// Placement cell.
        coordinate: Coordinate,
    },
    /// Experience, gold and loot were granted to a player.
    RewardGranted {
        /// Recipient.
        player: PlayerId,
        /// Experience granted.
        exp: u64,
        /// Gold granted.
        gold: u64,
        /// Items added to the inventory.
        items: Vec<ItemId>,
        /// New level when the grant caused a level up.
        leveled_up_to: Option<u32>,
    },
    /// A player's HP reached zero.
    PlayerDowned {
        /// Spot it happened on.
        spot: SpotId,
        /// The player.
        player: PlayerId,
        /// The player's map object.
        object: ObjectId,
    },
    /// An object passed through a gateway to another spot.
    GatewayTraversed {
        /// Object that moved.
        object: ObjectId,
        /// Spot left.
        from_spot: SpotId,
        /// Spot entered.
        to_spot: SpotId,
        /// Entry cell on the destination spot.
        to: Coordinate,
    },
    /// A spot's weather changed.
    WeatherChanged {
        /// The spot.
        spot: SpotId,
        /// Previous weather.
        from: Weather,
        /// New weather.
        to: Weather,
    },
    /// A harvest finished and yielded items.
    HarvestCompleted {
        /// Spot of the resource.
        spot: SpotId,
        /// Harvesting actor.
        harvester: ObjectId,
        /// Resource node.
        resource: ObjectId,
        /// Items yielded.
        items: Vec<ItemId>,
    },
    /// A door was opened or closed.
    DoorToggled {
        /// Spot of the door.
        spot: SpotId,
        /// The door.
        door: ObjectId,
        /// Whether it is now open.
        open: bool,
    },
    /// A chest was opened and emptied into an inventory.
    ChestOpened {
        /// Spot of the chest.
        spot: SpotId,
        /// Actor that opened it.
        actor: ObjectId,
        /// The chest.
        chest: ObjectId,
        /// Items taken.
        items: Vec<ItemId>,
    },
}

/// Fieldless discriminant of [`DomainEvent`], used to register handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// [`DomainEvent::HitRecorded`].
    HitRecorded,
    /// [`DomainEvent::DamageApplied`].
    DamageApplied,
    /// [`DomainEvent::ObjectMoved`].
    ObjectMoved,
    /// [`DomainEvent::SkillUsed`].
    SkillUsed,
    /// [`DomainEvent::BehaviorDecided`].
    BehaviorDecided,
    /// [`DomainEvent::BehaviorStateChanged`].
    BehaviorStateChanged,
    /// [`DomainEvent::MonsterDied`].
    MonsterDied,
    /// [`DomainEvent::MonsterSpawned`].
    MonsterSpawned,
    /// [`DomainEvent::RewardGranted`].
    RewardGranted,
    /// [`DomainEvent::PlayerDowned`].
    PlayerDowned,
    /// [`DomainEvent::GatewayTraversed`].
    GatewayTraversed,
    /// [`DomainEvent::WeatherChanged`].
    WeatherChanged,
    /// [`DomainEvent::HarvestCompleted`].
    HarvestCompleted,
    /// [`DomainEvent::DoorToggled`].
    DoorToggled,
    /// [`DomainEvent::ChestOpened`].
    ChestOpened,
}

impl DomainEvent {
    /// The discriminant of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::HitRecorded { .. } => EventKind::HitRecorded,
            Self::DamageApplied { .. } => EventKind::DamageApplied,
            Self::ObjectMoved { .. } => EventKind::ObjectMoved,
            Self::SkillUsed { .. } => EventKind::SkillUsed,
            Self::BehaviorDecided { .. } => EventKind::BehaviorDecided,
            Self::BehaviorStateChanged { .. } => EventKind::BehaviorStateChanged,
            Self::MonsterDied { .. } => EventKind::MonsterDied,
            Self::MonsterSpawned { .. } => EventKind::MonsterSpawned,
            Self::RewardGranted { .. } => EventKind::RewardGranted,
            Self::PlayerDowned { .. } => EventKind::PlayerDowned,
            Self::GatewayTraversed { .. } => EventKind::GatewayTraversed,
            Self::WeatherChanged { .. } => EventKind::WeatherChanged,
            Self::HarvestCompleted { .. } => EventKind::HarvestCompleted,
            Self::DoorToggled { .. } => EventKind::DoorToggled,
            Self::ChestOpened { .. } => EventKind::ChestOpened,
        }
    }

    /// The spot an event belongs to, when it belongs to exactly one.
    pub const fn spot(&self) -> Option<SpotId> {
        match self {
            Self::HitRecorded { spot, .. }
            | Self::DamageApplied { spot, .. }
            | Self::ObjectMoved { spot, .. }
            | Self::SkillUsed { spot, .. }
            | Self::BehaviorDecided { spot, .. }
            | Self::BehaviorStateChanged { spot, .. }
            | Self::MonsterDied { spot, .. }
            | Self::MonsterSpawned { spot, .. }
            | Self::PlayerDowned { spot, .. }
            | Self::WeatherChanged { spot, .. }
            | Self::HarvestCompleted { spot, .. }
            | Self::DoorToggled { spot, .. }
            | Self::ChestOpened { spot, .. } => Some(*spot),
            Self::RewardGranted { .. } | Self::GatewayTraversed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let event = DomainEvent::WeatherChanged {
            spot: SpotId::new(),
            from: Weather::Clear,
            to: Weather::Fog,
        };
        assert_eq!(event.kind(), EventKind::WeatherChanged);
        assert!(event.spot().is_some());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = DomainEvent::DoorToggled {
            spot: SpotId::new(),
            door: ObjectId::new(),
            open: true,
        };
        let json = serde_json::to_value(&event).ok();
        let tag = json
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(tag, Some("door_toggled"));
    }
}
