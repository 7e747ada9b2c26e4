//! Enumeration types for the Hollowreach simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Movement capability tags. An actor may only enter terrain whose
/// required tag it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraversalTag {
    /// Ordinary ground movement.
    Walk,
    /// Entering deep water.
    Swim,
    /// Scaling mountain tiles.
    Climb,
    /// Flying over any non-solid terrain.
    Fly,
}

/// The terrain of a single tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    /// Open grassland.
    #[default]
    Grass,
    /// Paved road.
    Road,
    /// Dense woodland.
    Forest,
    /// Loose sand.
    Sand,
    /// Boggy ground.
    Swamp,
    /// Wadeable water.
    ShallowWater,
    /// Water that must be swum.
    DeepWater,
    /// Steep rock that must be climbed.
    Mountain,
    /// Solid wall. Never traversable.
    Wall,
}

impl TerrainType {
    /// Base number of ticks an actor is busy after stepping onto this tile.
    pub const fn movement_cost_ticks(self) -> u32 {
        match self {
            Self::Road | Self::Grass => 1,
            Self::Forest | Self::Sand => 2,
            Self::Swamp | Self::ShallowWater | Self::DeepWater => 3,
            Self::Mountain => 4,
            Self::Wall => 0,
        }
    }

    /// Stamina consumed when a player steps onto this tile.
    pub const fn stamina_cost(self) -> u32 {
        match self {
            Self::Road => 0,
            Self::Grass | Self::Sand | Self::Forest => 1,
            Self::Swamp | Self::ShallowWater => 2,
            Self::DeepWater | Self::Mountain => 4,
            Self::Wall => 0,
        }
    }

    /// The capability tag required to enter this tile, if any beyond
    /// walking.
    pub const fn required_tag(self) -> TraversalTag {
        match self {
            Self::DeepWater => TraversalTag::Swim,
            Self::Mountain => TraversalTag::Climb,
            _ => TraversalTag::Walk,
        }
    }

    /// Whether this terrain is a solid obstacle.
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Wall)
    }
}

// ---------------------------------------------------------------------------
// Objects and behavior
// ---------------------------------------------------------------------------

/// Broad category of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// A player character.
    Player,
    /// A hostile or neutral monster.
    Monster,
    /// A non-player character that is not a monster.
    Npc,
    /// A door.
    Door,
    /// A chest.
    Chest,
    /// A harvestable resource node.
    Resource,
}

/// State of the autonomous behavior machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Standing still.
    #[default]
    Idle,
    /// Walking the patrol route.
    Patrol,
    /// Pursuing a visible target.
    Chase,
    /// Looking for a target that was lost.
    Search,
    /// Running away from a threat.
    Flee,
    /// Walking back to the home position.
    Return,
}

/// Which side of a fight an actor is on. Hitboxes never hit their own side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player characters.
    Player,
    /// Monsters.
    Monster,
    /// Bystanders that can be hit by anyone.
    Neutral,
}

impl Side {
    /// Whether an actor on `self` may damage an actor on `other`.
    pub const fn is_hostile_to(self, other: Self) -> bool {
        !matches!(
            (self, other),
            (Self::Player, Self::Player) | (Self::Monster, Self::Monster)
        )
    }
}

/// Race or faction of an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Race {
    /// Humans.
    #[default]
    Human,
    /// Elves.
    Elf,
    /// Dwarves.
    Dwarf,
    /// Animals and beasts.
    Beast,
    /// Undead.
    Undead,
    /// Slimes.
    Slime,
    /// Goblins.
    Goblin,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Elemental affinity of a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    /// No element.
    #[default]
    Neutral,
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Earth.
    Earth,
    /// Wind.
    Wind,
    /// Light.
    Light,
    /// Dark.
    Dark,
}

/// Skill deck tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillTier {
    /// The everyday deck.
    #[default]
    Normal,
    /// The awakened deck, the only place awakened-only skills may go.
    Awakened,
}

/// A consumable actor resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Hit points.
    Hp,
    /// Mana points.
    Mp,
    /// Stamina.
    Stamina,
}

/// Category of tool needed to harvest a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToolCategory {
    /// Wood cutting.
    Axe,
    /// Mining.
    Pickaxe,
    /// Herb gathering.
    Sickle,
    /// Fishing.
    Rod,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Current weather on a spot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// No effects.
    #[default]
    Clear,
    /// Rain. Slows movement a little.
    Rain,
    /// Storm. Slows movement a lot.
    Storm,
    /// Fog. Halves vision range.
    Fog,
    /// Snow. Slows movement a lot.
    Snow,
}

impl Weather {
    /// Extra busy ticks added to every step taken in this weather.
    pub const fn extra_movement_ticks(self) -> u32 {
        match self {
            Self::Clear | Self::Fog => 0,
            Self::Rain => 1,
            Self::Storm | Self::Snow => 2,
        }
    }

    /// Divisor applied to vision range.
    pub const fn vision_divisor(self) -> u32 {
        match self {
            Self::Fog => 2,
            _ => 1,
        }
    }
}

/// Climate of a spot, controlling which weather it rolls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Climate {
    /// Mild, mostly clear with rain.
    #[default]
    Temperate,
    /// Dry, rarely rains.
    Arid,
    /// Cold, snows often.
    Tundra,
    /// Wet and foggy.
    Marsh,
}

/// Kind of a named location zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Open land. Combat allowed.
    #[default]
    Wilderness,
    /// Settlement. Combat allowed.
    Town,
    /// Safe area. Nobody standing inside takes damage and monsters do not
    /// enter.
    Sanctuary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_are_solid_and_free() {
        assert!(TerrainType::Wall.is_solid());
        assert_eq!(TerrainType::Wall.movement_cost_ticks(), 0);
        assert!(!TerrainType::Grass.is_solid());
    }

    #[test]
    fn deep_water_requires_swimming() {
        assert_eq!(TerrainType::DeepWater.required_tag(), TraversalTag::Swim);
        assert_eq!(TerrainType::Road.required_tag(), TraversalTag::Walk);
    }

    #[test]
    fn sides_never_hit_themselves() {
        assert!(!Side::Player.is_hostile_to(Side::Player));
        assert!(!Side::Monster.is_hostile_to(Side::Monster));
        assert!(Side::Player.is_hostile_to(Side::Monster));
        assert!(Side::Neutral.is_hostile_to(Side::Neutral));
    }
}
