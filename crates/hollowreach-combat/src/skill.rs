//! Skill specifications and the skill catalog.
//!
//! A [`SkillSpec`] is immutable reference data loaded from the catalog
//! file. Its hit pattern is an ordered timeline of [`HitSegment`]s, each of
//! which becomes one hitbox when the skill is used. Offsets, velocities and
//! shapes in a segment are actor-relative (`+y` forward).

use std::collections::BTreeMap;

use hollowreach_types::{Element, ResourceCost, Shape, SkillId, Vector};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// One entry of a skill's hit timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitSegment {
    /// Ticks after use at which the hitbox activates.
    #[serde(default)]
    pub start_offset_ticks: u64,
    /// Ticks the hitbox stays active.
    pub duration_ticks: u64,
    /// Actor-relative footprint.
    pub shape: Shape,
    /// Actor-relative per-tick velocity.
    #[serde(default)]
    pub velocity: Vector,
    /// Actor-relative spawn offset from the caster.
    #[serde(default)]
    pub spawn_offset: Vector,
    /// Multiplier stacked on the skill's own power.
    #[serde(default = "default_power")]
    pub power_multiplier: Decimal,
}

/// Immutable description of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Catalog key.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Elemental affinity.
    #[serde(default)]
    pub element: Element,
    /// Deck capacity the skill uses when equipped.
    pub deck_cost: u32,
    /// Ticks the caster is locked after using it.
    #[serde(default)]
    pub cast_lock_ticks: u64,
    /// Ticks before it can be used again.
    #[serde(default)]
    pub cooldown_ticks: u64,
    /// Base power multiplier.
    #[serde(default = "default_power")]
    pub power_multiplier: Decimal,
    /// Hit timeline.
    pub hit_pattern: Vec<HitSegment>,
    /// HP, MP and stamina cost.
    #[serde(default)]
    pub cost: ResourceCost,
    /// Range used by auto-aim and the behavior layer.
    #[serde(default = "default_targeting_range")]
    pub targeting_range: u32,
    /// Whether it may only be equipped in the awakened deck.
    #[serde(default)]
    pub awakened_only: bool,
}

const fn default_power() -> Decimal {
    Decimal::ONE
}

const fn default_targeting_range() -> u32 {
    1
}

impl SkillSpec {
    /// Reject specs that could never produce a hit.
    pub fn validate(&self) -> Result<(), CombatError> {
        if self.hit_pattern.is_empty() {
            return Err(CombatError::InvalidSkill {
                skill: self.id.clone(),
                reason: String::from("hit pattern is empty"),
            });
        }
        if self.hit_pattern.iter().any(|s| s.duration_ticks == 0) {
            return Err(CombatError::InvalidSkill {
                skill: self.id.clone(),
                reason: String::from("segment with zero duration"),
            });
        }
        if self.power_multiplier < Decimal::ZERO
            || self
                .hit_pattern
                .iter()
                .any(|s| s.power_multiplier < Decimal::ZERO)
        {
            return Err(CombatError::InvalidSkill {
                skill: self.id.clone(),
                reason: String::from("negative power multiplier"),
            });
        }
        Ok(())
    }
}

/// All known skills, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCatalog {
    skills: BTreeMap<SkillId, SkillSpec>,
}

impl SkillCatalog {
    /// Build a catalog, validating every spec and rejecting duplicate ids.
    pub fn from_specs(specs: Vec<SkillSpec>) -> Result<Self, CombatError> {
        let mut skills = BTreeMap::new();
        for spec in specs {
            spec.validate()?;
            if skills.contains_key(&spec.id) {
                return Err(CombatError::DuplicateSkill(spec.id));
            }
            skills.insert(spec.id.clone(), spec);
        }
        Ok(Self { skills })
    }

    /// Look up a skill.
    pub fn get(&self, id: &SkillId) -> Result<&SkillSpec, CombatError> {
        self.skills
            .get(id)
            .ok_or_else(|| CombatError::UnknownSkill(id.clone()))
    }

    /// All skills in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillSpec> {
        self.skills.values()
    }

    /// Number of skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
