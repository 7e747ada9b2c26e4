//! Combat stats and timed buffs.

use serde::{Deserialize, Serialize};

/// A stat a buff can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Offensive power.
    Attack,
    /// Damage mitigation.
    Defense,
    /// Maximum hit points.
    MaxHp,
    /// Maximum mana points.
    MaxMp,
    /// Maximum stamina.
    MaxStamina,
}

/// The stats consulted by damage resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatStats {
    /// Offensive power.
    pub attack: u32,
    /// Damage mitigation. Half of it is subtracted from incoming attack.
    pub defense: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Maximum mana points.
    pub max_mp: u32,
    /// Maximum stamina.
    pub max_stamina: u32,
}

impl CombatStats {
    /// Create a stat block with only attack and defense set.
    pub const fn offense_defense(attack: u32, defense: u32) -> Self {
        Self {
            attack,
            defense,
            max_hp: 0,
            max_mp: 0,
            max_stamina: 0,
        }
    }

    /// Apply every buff still active at `tick` and return the result.
    /// Expired buffs are ignored.
    pub fn with_buffs(&self, buffs: &[Buff], tick: u64) -> Self {
        let mut effective = *self;
        for buff in buffs.iter().filter(|b| b.is_active(tick)) {
            let slot = match buff.stat {
                StatKind::Attack => &mut effective.attack,
                StatKind::Defense => &mut effective.defense,
                StatKind::MaxHp => &mut effective.max_hp,
                StatKind::MaxMp => &mut effective.max_mp,
                StatKind::MaxStamina => &mut effective.max_stamina,
            };
            *slot = slot.saturating_add_signed(buff.amount);
        }
        effective
    }
}

/// A temporary stat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buff {
    /// The stat modified.
    pub stat: StatKind,
    /// Signed amount added to the stat.
    pub amount: i32,
    /// First tick at which the buff no longer applies.
    pub expires_at_tick: u64,
}

impl Buff {
    /// Whether the buff applies at `tick`.
    pub const fn is_active(&self, tick: u64) -> bool {
        tick < self.expires_at_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_buffs_are_filtered_by_tick() {
        let base = CombatStats::offense_defense(10, 10);
        let buffs = [
            Buff {
                stat: StatKind::Attack,
                amount: 5,
                expires_at_tick: 20,
            },
            Buff {
                stat: StatKind::Defense,
                amount: -4,
                expires_at_tick: 10,
            },
        ];
        let early = base.with_buffs(&buffs, 5);
        assert_eq!(early.attack, 15);
        assert_eq!(early.defense, 6);

        let late = base.with_buffs(&buffs, 10);
        assert_eq!(late.attack, 15);
        assert_eq!(late.defense, 10);
    }

    #[test]
    fn debuffs_saturate_at_zero() {
        let base = CombatStats::offense_defense(3, 0);
        let buffs = [Buff {
            stat: StatKind::Attack,
            amount: -100,
            expires_at_tick: u64::MAX,
        }];
        assert_eq!(base.with_buffs(&buffs, 0).attack, 0);
    }
}
