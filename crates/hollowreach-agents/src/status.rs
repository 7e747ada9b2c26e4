//! Player status: resources, progression, buffs and inventory.
//!
//! [`PlayerStatus`] is the authoritative aggregate for a player's HP, MP,
//! stamina, level, experience, gold and items. The rest of the core talks
//! to it only through the narrow [`StatusService`] and [`InventoryService`]
//! interfaces, implemented here by [`StatusRepository`].
//!
//! Experience required to advance from level N to N+1 is `N * 100`. Each
//! level raises the maximum resources and base attack/defense.

use std::collections::BTreeMap;

use hollowreach_combat::ResourcePool;
use hollowreach_types::{
    Buff, CombatStats, ItemId, LootTableId, PlayerId, ResourceKind, ToolCategory,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::loot::{ItemCatalog, LootTables};

/// Experience per level step: level N needs `N * EXP_PER_LEVEL`.
const EXP_PER_LEVEL: u64 = 100;

/// Max HP gained per level.
const HP_PER_LEVEL: u32 = 10;

/// Max MP gained per level.
const MP_PER_LEVEL: u32 = 5;

/// Max stamina gained per level.
const STAMINA_PER_LEVEL: u32 = 5;

/// Attack gained per level.
const ATTACK_PER_LEVEL: u32 = 2;

/// Defense gained per level.
const DEFENSE_PER_LEVEL: u32 = 1;

// ---------------------------------------------------------------------------
// PlayerStatus
// ---------------------------------------------------------------------------

/// The authoritative status aggregate for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Owning player.
    pub player: PlayerId,
    /// Display name.
    pub name: String,
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience towards the next level.
    pub exp: u64,
    /// Gold held.
    pub gold: u64,
    /// Current hit points.
    pub hp: u32,
    /// Current mana points.
    pub mp: u32,
    /// Current stamina.
    pub stamina: u32,
    /// Stats before buffs.
    pub base_stats: CombatStats,
    /// Timed modifiers. Expired entries are ignored and pruned lazily.
    pub buffs: Vec<Buff>,
    /// Item counts.
    pub inventory: BTreeMap<ItemId, u32>,
    /// Whether HP reached zero.
    pub downed: bool,
}

impl PlayerStatus {
    /// A level-1 player at full resources.
    pub fn new(player: PlayerId, name: impl Into<String>, base_stats: CombatStats) -> Self {
        Self {
            player,
            name: name.into(),
            level: 1,
            exp: 0,
            gold: 0,
            hp: base_stats.max_hp,
            mp: base_stats.max_mp,
            stamina: base_stats.max_stamina,
            base_stats,
            buffs: Vec::new(),
            inventory: BTreeMap::new(),
            downed: false,
        }
    }

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
    /// Reaching zero marks the player downed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.downed = true;
        }
        self.hp
    }

    /// Add experience, levelling up as many times as it covers. Returns
    /// the new level if it changed.
    pub fn add_exp(&mut self, amount: u64) -> Result<Option<u32>, AgentError> {
        if amount == 0 {
            return Ok(None);
        }
        self.exp = self
            .exp
            .checked_add(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("exp overflow for {}", self.player),
            })?;

        let original = self.level;
        loop {
            let threshold = u64::from(self.level)
                .checked_mul(EXP_PER_LEVEL)
                .ok_or_else(|| AgentError::ArithmeticOverflow {
                    context: format!("level threshold overflow for {}", self.player),
                })?;
            if self.exp < threshold {
                break;
            }
            self.exp = self.exp.saturating_sub(threshold);
            self.level = self
                .level
                .checked_add(1)
                .ok_or_else(|| AgentError::ArithmeticOverflow {
                    context: format!("level overflow for {}", self.player),
                })?;
            self.grow();
        }
        Ok((self.level > original).then_some(self.level))
    }

    fn grow(&mut self) {
        let stats = &mut self.base_stats;
        stats.max_hp = stats.max_hp.saturating_add(HP_PER_LEVEL);
        stats.max_mp = stats.max_mp.saturating_add(MP_PER_LEVEL);
        stats.max_stamina = stats.max_stamina.saturating_add(STAMINA_PER_LEVEL);
        stats.attack = stats.attack.saturating_add(ATTACK_PER_LEVEL);
        stats.defense = stats.defense.saturating_add(DEFENSE_PER_LEVEL);
        if !self.downed {
            self.hp = self.hp.saturating_add(HP_PER_LEVEL).min(stats.max_hp);
        }
        self.mp = self.mp.saturating_add(MP_PER_LEVEL).min(stats.max_mp);
        self.stamina = self
            .stamina
            .saturating_add(STAMINA_PER_LEVEL)
            .min(stats.max_stamina);
    }

    /// Add gold.
    pub fn add_gold(&mut self, amount: u64) -> Result<u64, AgentError> {
        self.gold = self
            .gold
            .checked_add(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("gold overflow for {}", self.player),
            })?;
        Ok(self.gold)
    }

    /// Add one copy of each item.
    pub fn add_items(&mut self, items: &[ItemId]) -> Result<(), AgentError> {
        for item in items {
            let count = self.inventory.entry(item.clone()).or_insert(0);
            *count = count
                .checked_add(1)
                .ok_or_else(|| AgentError::ArithmeticOverflow {
                    context: format!("inventory count overflow for {item}"),
                })?;
        }
        Ok(())
    }

    /// Whether the player holds at least one `item`.
    pub fn has_item(&self, item: &ItemId) -> bool {
        self.inventory.get(item).is_some_and(|count| *count > 0)
    }

    /// Whether any held item counts as a `category` tool.
    pub fn has_tool(&self, category: ToolCategory, catalog: &ItemCatalog) -> bool {
        self.inventory
            .iter()
            .any(|(item, count)| *count > 0 && catalog.tool_category(item) == Some(category))
    }
}

impl ResourcePool for PlayerStatus {
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
// Service interfaces
// ---------------------------------------------------------------------------

/// What a reward grant produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReceipt {
    /// Player rewarded.
    pub player: PlayerId,
    /// Experience granted.
    pub exp: u64,
    /// Gold granted.
    pub gold: u64,
    /// Items rolled into the inventory.
    pub items: Vec<ItemId>,
    /// New level, if the player levelled up.
    pub leveled_up_to: Option<u32>,
}

/// Status lookups and mutations the combat core depends on.
pub trait StatusService {
    /// Buffed stats of `player` at `tick`.
    fn get_effective_stats(&self, player: PlayerId, tick: u64) -> Result<CombatStats, AgentError>;

    /// Spend `amount` of `kind`. Returns what is left.
    fn consume_resource(
        &mut self,
        player: PlayerId,
        kind: ResourceKind,
        amount: u32,
    ) -> Result<u32, AgentError>;

    /// Grant experience and gold and roll `loot_table` into the inventory.
    /// A missing player or unknown table fails before anything changes.
    fn grant_reward(
        &mut self,
        player: PlayerId,
        exp: u64,
        gold: u64,
        loot_table: Option<&LootTableId>,
        tables: &LootTables,
        rng: &mut dyn RngCore,
    ) -> Result<RewardReceipt, AgentError>;
}

/// Inventory mutations and checks.
pub trait InventoryService {
    /// Add one copy of each item to `player`'s inventory.
    fn add_items(&mut self, player: PlayerId, items: &[ItemId]) -> Result<(), AgentError>;

    /// Whether `player` holds `item`.
    fn has_item(&self, player: PlayerId, item: &ItemId) -> Result<bool, AgentError>;

    /// Whether `player` holds a tool of `category`.
    fn has_tool(
        &self,
        player: PlayerId,
        category: ToolCategory,
        catalog: &ItemCatalog,
    ) -> Result<bool, AgentError>;
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Owned store of player statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRepository {
    statuses: BTreeMap<PlayerId, PlayerStatus>,
}

impl StatusRepository {
    /// An empty repository.
    pub const fn new() -> Self {
        Self {
            statuses: BTreeMap::new(),
        }
    }

    /// Insert or replace a status.
    pub fn insert(&mut self, status: PlayerStatus) {
        self.statuses.insert(status.player, status);
    }

    /// Look up a status.
    pub fn get(&self, player: PlayerId) -> Result<&PlayerStatus, AgentError> {
        self.statuses
            .get(&player)
            .ok_or(AgentError::PlayerNotFound(player))
    }

    /// Look up a status mutably.
    pub fn get_mut(&mut self, player: PlayerId) -> Result<&mut PlayerStatus, AgentError> {
        self.statuses
            .get_mut(&player)
            .ok_or(AgentError::PlayerNotFound(player))
    }

    /// Whether `player` has a status.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.statuses.contains_key(&player)
    }

    /// All statuses in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerStatus> {
        self.statuses.values()
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether there are no players.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl StatusService for StatusRepository {
    fn get_effective_stats(&self, player: PlayerId, tick: u64) -> Result<CombatStats, AgentError> {
        Ok(self.get(player)?.effective_stats(tick))
    }

    fn consume_resource(
        &mut self,
        player: PlayerId,
        kind: ResourceKind,
        amount: u32,
    ) -> Result<u32, AgentError> {
        let status = self.get_mut(player)?;
        if status.downed {
            return Err(AgentError::PlayerDowned(player));
        }
        let available = status.available(kind);
        let affordable = match kind {
            ResourceKind::Hp => available > amount,
            ResourceKind::Mp | ResourceKind::Stamina => available >= amount,
        };
        if !affordable {
            return Err(AgentError::InsufficientResource {
                kind,
                required: amount,
                available,
            });
        }
        let left = available.saturating_sub(amount);
        status.set_available(kind, left);
        Ok(left)
    }

    fn grant_reward(
        &mut self,
        player: PlayerId,
        exp: u64,
        gold: u64,
        loot_table: Option<&LootTableId>,
        tables: &LootTables,
        rng: &mut dyn RngCore,
    ) -> Result<RewardReceipt, AgentError> {
        if !self.contains(player) {
            return Err(AgentError::PlayerNotFound(player));
        }
        let items = match loot_table {
            Some(id) => tables.roll(id, rng)?,
            None => Vec::new(),
        };

        let status = self.get_mut(player)?;
        let mut updated = status.clone();
        let leveled_up_to = updated.add_exp(exp)?;
        updated.add_gold(gold)?;
        updated.add_items(&items)?;
        *status = updated;

        Ok(RewardReceipt {
            player,
            exp,
            gold,
            items,
            leveled_up_to,
        })
    }
}

impl InventoryService for StatusRepository {
    fn add_items(&mut self, player: PlayerId, items: &[ItemId]) -> Result<(), AgentError> {
        self.get_mut(player)?.add_items(items)
    }

    fn has_item(&self, player: PlayerId, item: &ItemId) -> Result<bool, AgentError> {
        Ok(self.get(player)?.has_item(item))
    }

    fn has_tool(
        &self,
        player: PlayerId,
        category: ToolCategory,
        catalog: &ItemCatalog,
    ) -> Result<bool, AgentError> {
        Ok(self.get(player)?.has_tool(category, catalog))
    }
}
