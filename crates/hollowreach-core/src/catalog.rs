//! Reference data: skills, monster templates, loot tables, items and the
//! template new player characters are built from.
//!
//! The catalog is one YAML document. A default catalog ships embedded in
//! the binary; a file on disk can replace it. Cross references (skills a
//! monster uses, loot tables it drops, items a table yields) are checked
//! at load time so a running world never meets a dangling id.

use std::collections::BTreeSet;
use std::path::Path;

use hollowreach_agents::{
    ItemCatalog, ItemSpec, LootTable, LootTables, MonsterCatalog, MonsterTemplate,
};
use hollowreach_combat::{SkillCatalog, SkillDeck, SkillLoadout, SkillSpec};
use hollowreach_types::{CombatStats, ItemId, ObjectId, SkillId, SkillTier};
use serde::Deserialize;

use crate::config::ConfigError;
use crate::error::CoreError;

const DEFAULT_CATALOG: &str = include_str!("../data/default-catalog.yaml");

/// Stats and starting kit for new player characters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerTemplate {
    /// Level 1 stats.
    pub stats: CombatStats,
    /// Slots in the normal deck.
    #[serde(default = "default_deck_slots")]
    pub deck_slots: usize,
    /// Capacity of the normal deck.
    #[serde(default = "default_deck_capacity")]
    pub deck_capacity: u32,
    /// Slots in the awakened deck.
    #[serde(default = "default_awakened_slots")]
    pub awakened_slots: usize,
    /// Capacity of the awakened deck.
    #[serde(default = "default_awakened_capacity")]
    pub awakened_capacity: u32,
    /// Skills equipped in order into the normal deck.
    #[serde(default)]
    pub skills: Vec<SkillId>,
    /// Items in the starting inventory.
    #[serde(default)]
    pub items: Vec<ItemId>,
}

impl Default for PlayerTemplate {
    fn default() -> Self {
        Self {
            stats: CombatStats {
                attack: 20,
                defense: 6,
                max_hp: 100,
                max_mp: 50,
                max_stamina: 60,
            },
            deck_slots: default_deck_slots(),
            deck_capacity: default_deck_capacity(),
            awakened_slots: default_awakened_slots(),
            awakened_capacity: default_awakened_capacity(),
            skills: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl PlayerTemplate {
    /// A loadout for `owner` with the starting skills equipped.
    pub fn loadout(&self, owner: ObjectId, skills: &SkillCatalog) -> Result<SkillLoadout, CoreError> {
        let mut loadout = SkillLoadout::new(
            owner,
            SkillDeck::new(SkillTier::Normal, self.deck_slots, self.deck_capacity),
            SkillDeck::new(SkillTier::Awakened, self.awakened_slots, self.awakened_capacity),
        );
        for (slot, skill) in self.skills.iter().enumerate() {
            loadout.equip_skill(SkillTier::Normal, slot, skills.get(skill)?)?;
        }
        Ok(loadout)
    }
}

const fn default_deck_slots() -> usize {
    4
}

const fn default_deck_capacity() -> u32 {
    6
}

const fn default_awakened_slots() -> usize {
    1
}

const fn default_awakened_capacity() -> u32 {
    4
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    skills: Vec<SkillSpec>,
    #[serde(default)]
    monsters: Vec<MonsterTemplate>,
    #[serde(default)]
    loot_tables: Vec<LootTable>,
    #[serde(default)]
    items: Vec<ItemSpec>,
    #[serde(default)]
    player: PlayerTemplate,
}

/// All reference data the simulation reads.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Skills.
    pub skills: SkillCatalog,
    /// Monster templates.
    pub monsters: MonsterCatalog,
    /// Loot tables.
    pub loot: LootTables,
    /// Items.
    pub items: ItemCatalog,
    /// New player template.
    pub player: PlayerTemplate,
}

impl Catalog {
    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::parse(DEFAULT_CATALOG)
    }

    /// Load a catalog from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::parse(&contents)
    }

    /// Parse and cross-check a catalog document.
    pub fn parse(yaml: &str) -> Result<Self, CoreError> {
        let file: CatalogFile = serde_yml::from_str(yaml).map_err(ConfigError::from)?;
        check_references(&file)?;
        Ok(Self {
            skills: SkillCatalog::from_specs(file.skills)?,
            monsters: MonsterCatalog::from_templates(file.monsters),
            loot: LootTables::from_tables(file.loot_tables)?,
            items: ItemCatalog::from_specs(file.items),
            player: file.player,
        })
    }
}

fn check_references(file: &CatalogFile) -> Result<(), CoreError> {
    let skills: BTreeSet<&SkillId> = file.skills.iter().map(|s| &s.id).collect();
    let tables: BTreeSet<_> = file.loot_tables.iter().map(|t| &t.id).collect();
    let items: BTreeSet<&ItemId> = file.items.iter().map(|i| &i.id).collect();
    let invalid = |reason: String| Err(CoreError::InvalidCatalog { reason });

    for monster in &file.monsters {
        if let Some(skill) = monster.skills.iter().find(|s| !skills.contains(s)) {
            return invalid(format!("monster {} uses unknown skill {skill}", monster.id));
        }
        if let Some(table) = monster.loot_table.as_ref().filter(|t| !tables.contains(t)) {
            return invalid(format!("monster {} drops unknown table {table}", monster.id));
        }
    }
    for table in &file.loot_tables {
        if let Some(entry) = table.entries.iter().find(|e| !items.contains(&e.item)) {
            return invalid(format!("table {} yields unknown item {}", table.id, entry.item));
        }
    }
    if let Some(skill) = file.player.skills.iter().find(|s| !skills.contains(s)) {
        return invalid(format!("player template uses unknown skill {skill}"));
    }
    if let Some(item) = file.player.items.iter().find(|i| !items.contains(i)) {
        return invalid(format!("player template carries unknown item {item}"));
    }
    Ok(())
}
