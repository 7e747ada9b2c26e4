//! Skill decks, loadouts, cooldowns and resource costs.
//!
//! A loadout has one [`SkillDeck`] per [`SkillTier`]. Each deck is a fixed
//! array of optional slots whose equipped costs never sum past the deck's
//! capacity. A skill id occupies at most one slot across the whole
//! loadout, and awakened-only skills only go in the awakened deck.

use std::collections::BTreeMap;

use hollowreach_types::{ObjectId, ResourceCost, ResourceKind, SkillId, SkillTier};
use serde::{Deserialize, Serialize};

use crate::error::CombatError;
use crate::skill::{SkillCatalog, SkillSpec};

// ---------------------------------------------------------------------------
// Resource pool
// ---------------------------------------------------------------------------

/// Something that holds HP, MP and stamina and can pay skill costs.
pub trait ResourcePool {
    /// Current amount of `kind`.
    fn available(&self, kind: ResourceKind) -> u32;

    /// Overwrite the current amount of `kind`.
    fn set_available(&mut self, kind: ResourceKind, amount: u32);

    /// Check every component of `cost` and only then deduct all of them.
    /// HP can never be paid down to zero.
    fn try_consume(&mut self, cost: &ResourceCost) -> Result<ResourceCost, CombatError> {
        let demands = [
            (ResourceKind::Hp, cost.hp),
            (ResourceKind::Mp, cost.mp),
            (ResourceKind::Stamina, cost.stamina),
        ];
        for (kind, required) in demands {
            if required == 0 {
                continue;
            }
            let available = self.available(kind);
            let affordable = match kind {
                ResourceKind::Hp => available > required,
                ResourceKind::Mp | ResourceKind::Stamina => available >= required,
            };
            if !affordable {
                return Err(CombatError::InsufficientResource {
                    kind,
                    required,
                    available,
                });
            }
        }
        for (kind, required) in demands {
            let left = self.available(kind).saturating_sub(required);
            self.set_available(kind, left);
        }
        Ok(*cost)
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// A skill sitting in a deck slot, with the cost it was equipped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedSkill {
    /// The skill.
    pub skill: SkillId,
    /// Capacity it takes.
    pub deck_cost: u32,
}

/// A fixed-size, capacity-constrained set of skill slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDeck {
    tier: SkillTier,
    capacity: u32,
    slots: Vec<Option<EquippedSkill>>,
}

impl SkillDeck {
    /// An empty deck.
    pub fn new(tier: SkillTier, slot_count: usize, capacity: u32) -> Self {
        Self {
            tier,
            capacity,
            slots: vec![None; slot_count],
        }
    }

    /// The deck's tier.
    pub const fn tier(&self) -> SkillTier {
        self.tier
    }

    /// Capacity budget.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Sum of the equipped skills' costs.
    pub fn total_cost(&self) -> u32 {
        self.slots
            .iter()
            .flatten()
            .fold(0_u32, |acc, s| acc.saturating_add(s.deck_cost))
    }

    /// The skill in `slot`.
    pub fn slot(&self, slot: usize) -> Option<&EquippedSkill> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// All slots in order.
    pub fn slots(&self) -> &[Option<EquippedSkill>] {
        &self.slots
    }

    /// The slot holding `skill`, if any.
    pub fn position_of(&self, skill: &SkillId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|e| &e.skill == skill))
    }

    fn check_slot(&self, slot: usize) -> Result<(), CombatError> {
        if slot >= self.slots.len() {
            return Err(CombatError::SlotOutOfRange {
                tier: self.tier,
                slot,
                slots: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Put `spec` in `slot`, replacing whatever was there. Returns the
    /// replaced skill. The caller checks loadout-wide uniqueness.
    fn equip(&mut self, slot: usize, spec: &SkillSpec) -> Result<Option<SkillId>, CombatError> {
        self.check_slot(slot)?;
        if spec.awakened_only && self.tier != SkillTier::Awakened {
            return Err(CombatError::AwakenedOnly(spec.id.clone()));
        }
        let replaced_cost = self.slot(slot).map_or(0, |s| s.deck_cost);
        let required = self
            .total_cost()
            .saturating_sub(replaced_cost)
            .checked_add(spec.deck_cost)
            .ok_or(CombatError::ArithmeticOverflow)?;
        if required > self.capacity {
            return Err(CombatError::CapacityExceeded {
                tier: self.tier,
                required,
                capacity: self.capacity,
            });
        }
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(CombatError::SlotOutOfRange {
                tier: self.tier,
                slot,
                slots: 0,
            })?;
        let replaced = entry.replace(EquippedSkill {
            skill: spec.id.clone(),
            deck_cost: spec.deck_cost,
        });
        Ok(replaced.map(|e| e.skill))
    }

    fn unequip(&mut self, slot: usize) -> Result<Option<SkillId>, CombatError> {
        self.check_slot(slot)?;
        Ok(self
            .slots
            .get_mut(slot)
            .and_then(Option::take)
            .map(|e| e.skill))
    }
}

// ---------------------------------------------------------------------------
// Loadout
// ---------------------------------------------------------------------------

/// What a successful [`SkillLoadout::use_skill`] consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillActivation {
    /// The skill fired.
    pub skill: SkillId,
    /// Resources paid.
    pub consumed: ResourceCost,
}

/// An actor's equipped skills and cooldown timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLoadout {
    /// Owning object.
    pub owner: ObjectId,
    normal: SkillDeck,
    awakened: SkillDeck,
    last_used: BTreeMap<SkillId, u64>,
}

impl SkillLoadout {
    /// An empty loadout.
    pub fn new(owner: ObjectId, normal: SkillDeck, awakened: SkillDeck) -> Self {
        Self {
            owner,
            normal,
            awakened,
            last_used: BTreeMap::new(),
        }
    }

    /// The deck for `tier`.
    pub const fn deck(&self, tier: SkillTier) -> &SkillDeck {
        match tier {
            SkillTier::Normal => &self.normal,
            SkillTier::Awakened => &self.awakened,
        }
    }

    const fn deck_mut(&mut self, tier: SkillTier) -> &mut SkillDeck {
        match tier {
            SkillTier::Normal => &mut self.normal,
            SkillTier::Awakened => &mut self.awakened,
        }
    }

    /// Where `skill` is equipped, if anywhere.
    pub fn find(&self, skill: &SkillId) -> Option<(SkillTier, usize)> {
        [SkillTier::Normal, SkillTier::Awakened]
            .into_iter()
            .find_map(|tier| self.deck(tier).position_of(skill).map(|slot| (tier, slot)))
    }

    /// Equip `spec` into `slot` of the `tier` deck.
    ///
    /// Fails if the slot does not exist, the skill is already equipped in
    /// any slot, an awakened-only skill targets the normal deck, or the
    /// deck's capacity would be exceeded. Returns the replaced skill.
    pub fn equip_skill(
        &mut self,
        tier: SkillTier,
        slot: usize,
        spec: &SkillSpec,
    ) -> Result<Option<SkillId>, CombatError> {
        if let Some((held_tier, held_slot)) = self.find(&spec.id) {
            return Err(CombatError::AlreadyEquipped {
                skill: spec.id.clone(),
                tier: held_tier,
                slot: held_slot,
            });
        }
        self.deck_mut(tier).equip(slot, spec)
    }

    /// Empty `slot` of the `tier` deck. Returns the removed skill.
    pub fn unequip_skill(
        &mut self,
        tier: SkillTier,
        slot: usize,
    ) -> Result<Option<SkillId>, CombatError> {
        self.deck_mut(tier).unequip(slot)
    }

    /// Tick the skill was last used.
    pub fn last_used(&self, skill: &SkillId) -> Option<u64> {
        self.last_used.get(skill).copied()
    }

    /// First tick at which `spec` is off cooldown.
    pub fn ready_at(&self, spec: &SkillSpec) -> u64 {
        self.last_used(&spec.id)
            .map_or(0, |last| last.saturating_add(spec.cooldown_ticks))
    }

    /// Whether `spec` is off cooldown at `tick`.
    pub fn is_ready(&self, spec: &SkillSpec, tick: u64) -> bool {
        tick >= self.ready_at(spec)
    }

    /// Fire the skill in `slot` of the `tier` deck at `tick`.
    ///
    /// Fails if the slot is empty, the skill is on cooldown, or `pool`
    /// cannot pay the full cost. Resources are checked and consumed
    /// together; on any failure nothing is consumed and the cooldown is
    /// untouched.
    pub fn use_skill(
        &mut self,
        tier: SkillTier,
        slot: usize,
        tick: u64,
        catalog: &SkillCatalog,
        pool: &mut dyn ResourcePool,
    ) -> Result<SkillActivation, CombatError> {
        let deck = self.deck(tier);
        deck.check_slot(slot)?;
        let skill = deck
            .slot(slot)
            .map(|e| e.skill.clone())
            .ok_or(CombatError::EmptySlot { tier, slot })?;
        let spec = catalog.get(&skill)?;
        let ready_at = self.ready_at(spec);
        if tick < ready_at {
            return Err(CombatError::OnCooldown { skill, ready_at });
        }
        let consumed = pool.try_consume(&spec.cost)?;
        self.last_used.insert(skill.clone(), tick);
        Ok(SkillActivation { skill, consumed })
    }
}
