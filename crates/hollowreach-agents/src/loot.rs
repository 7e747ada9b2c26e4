//! Items, loot tables and weighted loot rolls.
//!
//! A [`LootTable`] is rolled `rolls` times; each roll picks one entry with
//! probability proportional to its weight and yields between `min` and
//! `max` copies of its item. Tables and items are reference data loaded
//! from the catalog.

use std::collections::BTreeMap;

use hollowreach_types::{ItemId, LootTableId, ToolCategory};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Reference data for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Harvesting tool category this item counts as.
    #[serde(default)]
    pub tool: Option<ToolCategory>,
}

/// All known items, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, ItemSpec>,
}

impl ItemCatalog {
    /// Build a catalog. Later duplicates replace earlier ones.
    pub fn from_specs(specs: Vec<ItemSpec>) -> Self {
        Self {
            items: specs.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Look up an item.
    pub fn get(&self, id: &ItemId) -> Option<&ItemSpec> {
        self.items.get(id)
    }

    /// The tool category of an item, if it is a tool.
    pub fn tool_category(&self, id: &ItemId) -> Option<ToolCategory> {
        self.items.get(id).and_then(|s| s.tool)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loot tables
// ---------------------------------------------------------------------------

fn default_count() -> u32 {
    1
}

/// One weighted outcome in a loot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Item dropped.
    pub item: ItemId,
    /// Relative weight.
    pub weight: u32,
    /// Fewest copies dropped.
    #[serde(default = "default_count")]
    pub min: u32,
    /// Most copies dropped.
    #[serde(default = "default_count")]
    pub max: u32,
}

/// A weighted drop table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootTable {
    /// Table id.
    pub id: LootTableId,
    /// Independent picks per roll.
    #[serde(default = "default_count")]
    pub rolls: u32,
    /// Outcomes.
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    /// Check the table can be rolled.
    pub fn validate(&self) -> Result<(), AgentError> {
        let invalid = |reason: &str| AgentError::InvalidLootTable {
            table: self.id.clone(),
            reason: reason.to_owned(),
        };
        if self.entries.iter().any(|e| e.min > e.max) {
            return Err(invalid("entry with min greater than max"));
        }
        let total = self
            .entries
            .iter()
            .try_fold(0_u32, |acc, e| acc.checked_add(e.weight))
            .ok_or_else(|| invalid("total weight overflows"))?;
        if total == 0 && self.rolls > 0 {
            return Err(invalid("no weighted entries"));
        }
        Ok(())
    }

    /// Roll the table. Returns the dropped items, one id per copy.
    pub fn roll(&self, rng: &mut dyn RngCore) -> Vec<ItemId> {
        let total: u32 = self
            .entries
            .iter()
            .fold(0_u32, |acc, e| acc.saturating_add(e.weight));
        let mut drops = Vec::new();
        if total == 0 {
            return drops;
        }
        for _ in 0..self.rolls {
            let mut pick = rng.random_range(0..total);
            for entry in &self.entries {
                if pick < entry.weight {
                    let count = if entry.min >= entry.max {
                        entry.min
                    } else {
                        rng.random_range(entry.min..=entry.max)
                    };
                    for _ in 0..count {
                        drops.push(entry.item.clone());
                    }
                    break;
                }
                pick = pick.saturating_sub(entry.weight);
            }
        }
        drops
    }
}

/// All loot tables, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootTables {
    tables: BTreeMap<LootTableId, LootTable>,
}

impl LootTables {
    /// Validate and index tables. Duplicate ids are rejected.
    pub fn from_tables(tables: Vec<LootTable>) -> Result<Self, AgentError> {
        let mut indexed = BTreeMap::new();
        for table in tables {
            table.validate()?;
            let id = table.id.clone();
            if indexed.insert(id.clone(), table).is_some() {
                return Err(AgentError::DuplicateLootTable(id));
            }
        }
        Ok(Self { tables: indexed })
    }

    /// Look up a table. Unknown ids are an error.
    pub fn get(&self, id: &LootTableId) -> Result<&LootTable, AgentError> {
        self.tables
            .get(id)
            .ok_or_else(|| AgentError::UnknownLootTable(id.clone()))
    }

    /// Roll a table by id.
    pub fn roll(&self, id: &LootTableId, rng: &mut dyn RngCore) -> Result<Vec<ItemId>, AgentError> {
        Ok(self.get(id)?.roll(rng))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether there are no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn slime_table() -> LootTable {
        LootTable {
            id: LootTableId::from("slime"),
            rolls: 2,
            entries: vec![
                LootEntry {
                    item: ItemId::from("gel"),
                    weight: 3,
                    min: 1,
                    max: 2,
                },
                LootEntry {
                    item: ItemId::from("copper_coin"),
                    weight: 1,
                    min: 1,
                    max: 1,
                },
            ],
        }
    }

    #[test]
    fn rolls_only_produce_listed_items_within_bounds() {
        let table = slime_table();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drops = table.roll(&mut rng);
            assert!((2..=4).contains(&drops.len()));
            assert!(
                drops
                    .iter()
                    .all(|i| i.as_str() == "gel" || i.as_str() == "copper_coin")
            );
        }
    }

    #[test]
    fn zero_weight_entries_never_drop() {
        let mut table = slime_table();
        if let Some(coin) = table.entries.get_mut(1) {
            coin.weight = 0;
        }
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(table.roll(&mut rng).iter().all(|i| i.as_str() == "gel"));
        }
    }

    #[test]
    fn unknown_and_duplicate_tables_are_rejected() {
        let tables = LootTables::from_tables(vec![slime_table()]).unwrap();
        assert!(matches!(
            tables.get(&LootTableId::from("dragon")),
            Err(AgentError::UnknownLootTable(_))
        ));
        assert!(matches!(
            LootTables::from_tables(vec![slime_table(), slime_table()]),
            Err(AgentError::DuplicateLootTable(_))
        ));
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let mut table = slime_table();
        if let Some(gel) = table.entries.get_mut(0) {
            gel.min = 3;
        }
        assert!(matches!(
            table.validate(),
            Err(AgentError::InvalidLootTable { .. })
        ));
    }

    #[test]
    fn tools_are_looked_up_by_item() {
        let catalog = ItemCatalog::from_specs(vec![ItemSpec {
            id: ItemId::from("iron_axe"),
            name: String::from("Iron Axe"),
            tool: Some(ToolCategory::Axe),
        }]);
        assert_eq!(
            catalog.tool_category(&ItemId::from("iron_axe")),
            Some(ToolCategory::Axe)
        );
        assert_eq!(catalog.tool_category(&ItemId::from("gel")), None);
    }
}
