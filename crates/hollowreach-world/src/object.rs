//! World objects and their behavior components.
//!
//! Every [`WorldObject`] carries exactly one [`Behavior`] variant. Code
//! that needs a capability (acting, opening, harvesting) matches on the
//! variant instead of walking an inheritance chain. Autonomous objects
//! embed an [`ActorComponent`], so [`Behavior::actor`] answers for both.

use std::collections::BTreeSet;

use hollowreach_types::{
    Coordinate, Direction, ItemId, MonsterId, ObjectId, ObjectType, PlayerId, Race, Side,
    TerrainType, TraversalTag, Weather,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::behavior::AutonomousComponent;
use crate::error::WorldError;
use crate::harvestable::HarvestableComponent;

// ---------------------------------------------------------------------------
// Movement capability
// ---------------------------------------------------------------------------

/// How an actor moves: a speed modifier and the terrain it may enter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCapability {
    /// Multiplier on movement speed. `2` halves the busy time of a step.
    pub speed_modifier: Decimal,
    /// Terrain capability tags.
    pub tags: BTreeSet<TraversalTag>,
}

impl Default for MovementCapability {
    fn default() -> Self {
        Self::walking()
    }
}

impl MovementCapability {
    /// Normal-speed walker.
    pub fn walking() -> Self {
        Self {
            speed_modifier: Decimal::ONE,
            tags: BTreeSet::from([TraversalTag::Walk]),
        }
    }

    /// Builder: add a traversal tag.
    #[must_use]
    pub fn with_tag(mut self, tag: TraversalTag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Builder: set the speed modifier.
    #[must_use]
    pub fn with_speed(mut self, speed_modifier: Decimal) -> Self {
        self.speed_modifier = speed_modifier;
        self
    }

    /// Whether this capability allows entering `terrain`.
    pub fn can_enter(&self, terrain: TerrainType) -> bool {
        if terrain.is_solid() {
            return false;
        }
        self.tags.contains(&TraversalTag::Fly) || self.tags.contains(&terrain.required_tag())
    }

    /// Busy ticks for one step onto `terrain` in `weather`:
    /// `ceil((terrain cost + weather penalty) / speed)`, at least one.
    pub fn step_ticks(&self, terrain: TerrainType, weather: Weather) -> Result<u64, WorldError> {
        if self.speed_modifier <= Decimal::ZERO {
            return Err(WorldError::InvalidSpeedModifier(self.speed_modifier));
        }
        let base = terrain
            .movement_cost_ticks()
            .checked_add(weather.extra_movement_ticks())
            .ok_or(WorldError::ArithmeticOverflow)?;
        let ticks = Decimal::from(base)
            .checked_div(self.speed_modifier)
            .ok_or(WorldError::ArithmeticOverflow)?
            .ceil()
            .to_u64()
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(ticks.max(1))
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Capabilities shared by everything that can act: players, NPCs and
/// monsters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorComponent {
    /// Current facing.
    pub direction: Direction,
    /// Movement capability.
    pub movement: MovementCapability,
    /// Owning player, for player characters.
    pub player: Option<PlayerId>,
    /// Authoritative monster aggregate, for monsters.
    pub monster: Option<MonsterId>,
    /// Whether the actor is a non-player character.
    pub is_npc: bool,
    /// Field of view in degrees, centred on the facing.
    pub fov_degrees: u32,
    /// Race or faction.
    pub race: Race,
    /// Combat side.
    pub side: Side,
}

impl ActorComponent {
    /// A player character facing north.
    pub fn player(player: PlayerId, race: Race) -> Self {
        Self {
            direction: Direction::North,
            movement: MovementCapability::walking(),
            player: Some(player),
            monster: None,
            is_npc: false,
            fov_degrees: 360,
            race,
            side: Side::Player,
        }
    }

    /// A monster actor facing south.
    pub fn monster(monster: MonsterId, race: Race, fov_degrees: u32) -> Self {
        Self {
            direction: Direction::South,
            movement: MovementCapability::walking(),
            player: None,
            monster: Some(monster),
            is_npc: true,
            fov_degrees,
            race,
            side: Side::Monster,
        }
    }
}

/// A door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorComponent {
    /// Whether the door is open. Closed doors block movement.
    pub open: bool,
    /// Whether the door is locked.
    pub locked: bool,
    /// Item that unlocks it.
    pub key: Option<ItemId>,
}

impl DoorComponent {
    /// Open or close the door. Locked doors refuse.
    pub fn toggle(&mut self, id: ObjectId) -> Result<bool, WorldError> {
        if self.locked {
            return Err(WorldError::DoorLocked(id));
        }
        self.open = !self.open;
        Ok(self.open)
    }

    /// Unlock the door with `key`.
    pub fn unlock(&mut self, id: ObjectId, key: &ItemId) -> Result<(), WorldError> {
        match &self.key {
            Some(expected) if expected == key => {
                self.locked = false;
                Ok(())
            }
            _ => Err(WorldError::WrongKey(id)),
        }
    }
}

/// A chest that can be emptied once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestComponent {
    /// Whether it has been opened.
    pub opened: bool,
    /// Items inside.
    pub contents: Vec<ItemId>,
}

impl ChestComponent {
    /// Open the chest and take everything inside.
    pub fn take_contents(&mut self, id: ObjectId) -> Result<Vec<ItemId>, WorldError> {
        if self.opened {
            return Err(WorldError::ChestAlreadyOpened(id));
        }
        self.opened = true;
        Ok(std::mem::take(&mut self.contents))
    }
}

/// The single behavior role of a world object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Behavior {
    /// A player or scripted actor.
    Actor(ActorComponent),
    /// An actor driven by the behavior state machine.
    Autonomous(AutonomousComponent),
    /// A door.
    Door(DoorComponent),
    /// A chest.
    Chest(ChestComponent),
    /// A harvestable resource node.
    Harvestable(HarvestableComponent),
}

impl Behavior {
    /// Actor capabilities, for actors and autonomous actors.
    pub const fn actor(&self) -> Option<&ActorComponent> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::Autonomous(auto) => Some(&auto.actor),
            Self::Door(_) | Self::Chest(_) | Self::Harvestable(_) => None,
        }
    }

    /// Mutable actor capabilities.
    pub const fn actor_mut(&mut self) -> Option<&mut ActorComponent> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::Autonomous(auto) => Some(&mut auto.actor),
            Self::Door(_) | Self::Chest(_) | Self::Harvestable(_) => None,
        }
    }

    /// The autonomous component, if any.
    pub const fn autonomous(&self) -> Option<&AutonomousComponent> {
        match self {
            Self::Autonomous(auto) => Some(auto),
            _ => None,
        }
    }

    /// Mutable autonomous component.
    pub const fn autonomous_mut(&mut self) -> Option<&mut AutonomousComponent> {
        match self {
            Self::Autonomous(auto) => Some(auto),
            _ => None,
        }
    }

    /// Whether another object may share this object's cell.
    pub const fn blocks_movement(&self) -> bool {
        match self {
            Self::Actor(_) | Self::Autonomous(_) | Self::Chest(_) | Self::Harvestable(_) => true,
            Self::Door(door) => !door.open,
        }
    }
}

// ---------------------------------------------------------------------------
// WorldObject
// ---------------------------------------------------------------------------

/// Something placed on a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Unique id within the map.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Category tag.
    pub object_type: ObjectType,
    /// Current cell. Only the owning map writes this.
    pub coordinate: Coordinate,
    /// Behavior role.
    pub behavior: Behavior,
    /// First tick at which the object may start a new action.
    pub busy_until: u64,
}

impl WorldObject {
    /// Create an object with a fresh id.
    pub fn new(
        name: impl Into<String>,
        object_type: ObjectType,
        coordinate: Coordinate,
        behavior: Behavior,
    ) -> Self {
        Self::with_id(ObjectId::new(), name, object_type, coordinate, behavior)
    }

    /// Create an object with a known id.
    pub fn with_id(
        id: ObjectId,
        name: impl Into<String>,
        object_type: ObjectType,
        coordinate: Coordinate,
        behavior: Behavior,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            object_type,
            coordinate,
            behavior,
            busy_until: 0,
        }
    }

    /// Whether the object is still busy at `tick`.
    pub const fn is_busy(&self, tick: u64) -> bool {
        tick < self.busy_until
    }

    /// Actor capabilities, if the object can act.
    pub const fn actor(&self) -> Option<&ActorComponent> {
        self.behavior.actor()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn walkers_cannot_swim_or_enter_walls() {
        let walker = MovementCapability::walking();
        assert!(walker.can_enter(TerrainType::Grass));
        assert!(!walker.can_enter(TerrainType::DeepWater));
        assert!(!walker.can_enter(TerrainType::Wall));

        let swimmer = MovementCapability::walking().with_tag(TraversalTag::Swim);
        assert!(swimmer.can_enter(TerrainType::DeepWater));

        let flyer = MovementCapability::walking().with_tag(TraversalTag::Fly);
        assert!(flyer.can_enter(TerrainType::Mountain));
        assert!(!flyer.can_enter(TerrainType::Wall));
    }

    #[test]
    fn step_ticks_scale_with_speed_and_round_up() {
        let normal = MovementCapability::walking();
        assert_eq!(normal.step_ticks(TerrainType::Forest, Weather::Clear).unwrap(), 2);
        assert_eq!(normal.step_ticks(TerrainType::Forest, Weather::Rain).unwrap(), 3);

        let fast = MovementCapability::walking().with_speed(dec!(2));
        assert_eq!(fast.step_ticks(TerrainType::Forest, Weather::Rain).unwrap(), 2);
        assert_eq!(fast.step_ticks(TerrainType::Road, Weather::Clear).unwrap(), 1);
    }

    #[test]
    fn zero_speed_is_rejected() {
        let stuck = MovementCapability::walking().with_speed(Decimal::ZERO);
        assert!(matches!(
            stuck.step_ticks(TerrainType::Grass, Weather::Clear),
            Err(WorldError::InvalidSpeedModifier(_))
        ));
    }

    #[test]
    fn locked_doors_need_the_right_key() {
        let id = ObjectId::new();
        let mut door = DoorComponent {
            open: false,
            locked: true,
            key: Some(ItemId::new("iron_key")),
        };
        assert!(matches!(door.toggle(id), Err(WorldError::DoorLocked(_))));
        assert!(door.unlock(id, &ItemId::new("bone_key")).is_err());
        assert!(door.unlock(id, &ItemId::new("iron_key")).is_ok());
        assert_eq!(door.toggle(id).ok(), Some(true));
        assert!(!Behavior::Door(door).blocks_movement());
    }

    #[test]
    fn chests_open_once() {
        let id = ObjectId::new();
        let mut chest = ChestComponent {
            opened: false,
            contents: vec![ItemId::new("potion")],
        };
        assert_eq!(chest.take_contents(id).unwrap().len(), 1);
        assert!(matches!(
            chest.take_contents(id),
            Err(WorldError::ChestAlreadyOpened(_))
        ));
    }
}
