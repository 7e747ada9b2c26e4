//! Monster templates and the authoritative [`Monster`] aggregate.
//!
//! A [`MonsterTemplate`] is catalog data. Spawning one produces three
//! linked records: the [`Monster`] aggregate (authoritative HP and
//! resources), the map-side [`WorldObject`] carrying an autonomous
//! behavior component, and the monster's [`SkillLoadout`].

use std::collections::BTreeMap;

use hollowreach_combat::{ResourcePool, SkillCatalog, SkillDeck, SkillLoadout};
use hollowreach_types::{
    Buff, CombatStats, Coordinate, LootTableId, MonsterId, MonsterTemplateId, ObjectId, ObjectType,
    PlayerId, Race, ResourceKind, SkillId, SkillTier, SpotId, Vector,
};
use hollowreach_world::{
    ActorComponent, AutonomousComponent, Behavior, MovementCapability, WorldObject,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

const fn default_fov() -> u32 {
    120
}

const fn default_max_failures() -> u32 {
    3
}

const fn default_search_ticks() -> u32 {
    5
}

const fn default_deck_slots() -> usize {
    4
}

const fn default_deck_capacity() -> u32 {
    10
}

const fn default_speed() -> Decimal {
    Decimal::ONE
}

/// Catalog entry describing a kind of monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    /// Template id.
    pub id: MonsterTemplateId,
    /// Display name.
    pub name: String,
    /// Race.
    #[serde(default)]
    pub race: Race,
    /// Base stats. `max_hp` is the spawn HP.
    pub stats: CombatStats,
    /// Vision radius in cells.
    pub vision_range: u32,
    /// Field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_degrees: u32,
    /// HP percentage at or below which the monster flees.
    #[serde(default)]
    pub flee_threshold: u32,
    /// Failed moves before giving up and returning home.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Ticks spent searching after losing sight of a target.
    #[serde(default = "default_search_ticks")]
    pub search_ticks: u32,
    /// Patrol waypoints relative to the spawn point.
    #[serde(default)]
    pub patrol_offsets: Vec<Vector>,
    /// Skills equipped at spawn, in slot order.
    #[serde(default)]
    pub skills: Vec<SkillId>,
    /// Slots per deck.
    #[serde(default = "default_deck_slots")]
    pub deck_slots: usize,
    /// Capacity per deck.
    #[serde(default = "default_deck_capacity")]
    pub deck_capacity: u32,
    /// Experience granted to the killer.
    #[serde(default)]
    pub exp_reward: u64,
    /// Gold granted to the killer.
    #[serde(default)]
    pub gold_reward: u64,
    /// Loot rolled for the killer.
    #[serde(default)]
    pub loot_table: Option<LootTableId>,
    /// Ticks after death before respawning. `None` never respawns.
    #[serde(default)]
    pub respawn_delay_ticks: Option<u64>,
    /// Movement speed modifier.
    #[serde(default = "default_speed")]
    pub speed: Decimal,
}

/// Everything a spawn creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedMonster {
    /// Authoritative aggregate.
    pub monster: Monster,
    /// Map object to place.
    pub object: WorldObject,
    /// Equipped skills.
    pub loadout: SkillLoadout,
}

impl MonsterTemplate {
    /// Build a monster of this template at `home` on `spot`.
    ///
    /// Patrol offsets that overflow the coordinate space are skipped.
    /// Awakened-only skills go in the awakened deck, the rest in the
    /// normal deck, in listed order.
    pub fn spawn(
        &self,
        spot: SpotId,
        home: Coordinate,
        skills: &SkillCatalog,
    ) -> Result<SpawnedMonster, AgentError> {
        let monster_id = MonsterId::new();
        let object_id = ObjectId::new();

        let mut loadout = SkillLoadout::new(
            object_id,
            SkillDeck::new(SkillTier::Normal, self.deck_slots, self.deck_capacity),
            SkillDeck::new(SkillTier::Awakened, self.deck_slots, self.deck_capacity),
        );
        let (mut normal_slot, mut awakened_slot) = (0_usize, 0_usize);
        for skill in &self.skills {
            let spec = skills.get(skill)?;
            let (tier, slot) = if spec.awakened_only {
                (SkillTier::Awakened, &mut awakened_slot)
            } else {
                (SkillTier::Normal, &mut normal_slot)
            };
            loadout.equip_skill(tier, *slot, spec)?;
            *slot = slot.saturating_add(1);
        }

        let mut actor = ActorComponent::monster(monster_id, self.race, self.fov_degrees);
        actor.movement = MovementCapability::walking().with_speed(self.speed);
        let patrol_route = self
            .patrol_offsets
            .iter()
            .filter_map(|offset| home.translate(*offset))
            .collect();
        let component = AutonomousComponent::new(
            actor,
            home,
            self.vision_range,
            patrol_route,
            self.flee_threshold,
            self.max_failures,
        );
        let object = WorldObject::with_id(
            object_id,
            self.name.clone(),
            ObjectType::Monster,
            home,
            Behavior::Autonomous(component),
        );

        let monster = Monster {
            id: monster_id,
            template: self.id.clone(),
            object: object_id,
            spot,
            home,
            hp: self.stats.max_hp,
            mp: self.stats.max_mp,
            stamina: self.stats.max_stamina,
            base_stats: self.stats,
            buffs: Vec::new(),
            last_attacker: None,
            last_attacker_player: None,
        };

        Ok(SpawnedMonster {
            monster,
            object,
            loadout,
        })
    }
}

/// All monster templates, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterCatalog {
    templates: BTreeMap<MonsterTemplateId, MonsterTemplate>,
}

impl MonsterCatalog {
    /// Index templates by id. Later duplicates replace earlier ones.
    pub fn from_templates(templates: Vec<MonsterTemplate>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Look up a template.
    pub fn get(&self, id: &MonsterTemplateId) -> Result<&MonsterTemplate, AgentError> {
        self.templates
            .get(id)
            .ok_or_else(|| AgentError::UnknownTemplate(id.clone()))
    }

    /// All templates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &MonsterTemplate> {
        self.templates.values()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// The authoritative record of a live monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Monster id.
    pub id: MonsterId,
    /// Template it was spawned from.
    pub template: MonsterTemplateId,
    /// Its object on the map.
    pub object: ObjectId,
    /// Spot it lives on.
    pub spot: SpotId,
    /// Spawn coordinate.
    pub home: Coordinate,
    /// Current hit points.
    pub hp: u32,
    /// Current mana points.
    pub mp: u32,
    /// Current stamina.
    pub stamina: u32,
    /// Stats before buffs.
    pub base_stats: CombatStats,
    /// Timed modifiers.
    pub buffs: Vec<Buff>,
    /// Object that last damaged it.
    pub last_attacker: Option<ObjectId>,
    /// Player behind the last damaging object, if any.
    pub last_attacker_player: Option<PlayerId>,
}

impl Monster {
    /// Stats at `tick` with active buffs applied.
    pub fn effective_stats(&self, tick: u64) -> CombatStats {
        self.base_stats.with_buffs(&self.buffs, tick)
    }

    /// Add a buff, dropping any that expired before `tick`.
    pub fn add_buff(&mut self, buff: Buff, tick: u64) {
        self.buffs.retain(|b| b.is_active(tick));
        self.buffs.push(buff);
    }

    /// Subtract `amount` HP, saturating at zero. Returns the remaining HP.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    /// Whether HP has reached zero.
    pub const fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// HP as a percentage of the max HP in effect at `tick`, rounded down
    /// but never zero while alive.
    pub fn hp_percentage(&self, tick: u64) -> u32 {
        if self.hp == 0 {
            return 0;
        }
        let max = u64::from(self.effective_stats(tick).max_hp.max(1));
        let pct = u64::from(self.hp)
            .saturating_mul(100)
            .checked_div(max)
            .unwrap_or(0)
            .clamp(1, 100);
        u32::try_from(pct).unwrap_or(100)
    }
}

impl ResourcePool for Monster {
    fn available(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Hp => self.hp,
            ResourceKind::Mp => self.mp,
            ResourceKind::Stamina => self.stamina,
        }
    }

    fn set_available(&mut self, kind: ResourceKind, amount: u32) {
        match kind {
            ResourceKind::Hp => self.hp = amount,
            ResourceKind::Mp => self.mp = amount,
            ResourceKind::Stamina => self.stamina = amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owned store of live monsters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStore {
    monsters: BTreeMap<MonsterId, Monster>,
}

impl MonsterStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self {
            monsters: BTreeMap::new(),
        }
    }

    /// Add a monster. Duplicate ids are rejected.
    pub fn insert(&mut self, monster: Monster) -> Result<(), AgentError> {
        if self.monsters.contains_key(&monster.id) {
            return Err(AgentError::DuplicateMonster(monster.id));
        }
        self.monsters.insert(monster.id, monster);
        Ok(())
    }

    /// Look up a monster.
    pub fn get(&self, id: MonsterId) -> Result<&Monster, AgentError> {
        self.monsters.get(&id).ok_or(AgentError::MonsterNotFound(id))
    }

    /// Look up a monster mutably.
    pub fn get_mut(&mut self, id: MonsterId) -> Result<&mut Monster, AgentError> {
        self.monsters
            .get_mut(&id)
            .ok_or(AgentError::MonsterNotFound(id))
    }

    /// Remove a monster.
    pub fn remove(&mut self, id: MonsterId) -> Result<Monster, AgentError> {
        self.monsters
            .remove(&id)
            .ok_or(AgentError::MonsterNotFound(id))
    }

    /// The monster whose map object is `object`.
    pub fn by_object(&self, object: ObjectId) -> Option<&Monster> {
        self.monsters.values().find(|m| m.object == object)
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: MonsterId) -> bool {
        self.monsters.contains_key(&id)
    }

    /// All monsters in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// Number of live monsters.
    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    /// Whether there are no monsters.
    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }
}
