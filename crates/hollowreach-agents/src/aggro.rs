//! Per-spot, per-attacker threat tallies.
//!
//! The store is keyed `spot -> attacker -> target`. Here the attacker is
//! the AI-driven object holding the grudge and the target is whoever hurt
//! it. Threat is added per hit; nothing decays in the background. Reads
//! take a [`MemoryPolicy`] and hide entries whose `last_seen_tick` is too
//! old. Physical deletion happens only in [`AggroStore::cleanup`].

use std::collections::BTreeMap;

use hollowreach_types::{ObjectId, SpotId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgentError;

/// How long threat is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPolicy {
    /// Entries last touched more than this many ticks ago are forgotten.
    pub forget_after_ticks: u64,
}

impl MemoryPolicy {
    /// A policy forgetting after `forget_after_ticks`.
    pub const fn new(forget_after_ticks: u64) -> Self {
        Self { forget_after_ticks }
    }

    /// Whether an entry last seen at `last_seen_tick` is still remembered
    /// at `current_tick`.
    pub const fn remembers(&self, last_seen_tick: u64, current_tick: u64) -> bool {
        current_tick.saturating_sub(last_seen_tick) <= self.forget_after_ticks
    }
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Accumulated threat against one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEntry {
    /// Summed threat.
    pub threat: u64,
    /// Last tick threat was added.
    pub last_seen_tick: u64,
}

type TargetTable = BTreeMap<ObjectId, ThreatEntry>;

/// Threat tallies for every spot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggroStore {
    spots: BTreeMap<SpotId, BTreeMap<ObjectId, TargetTable>>,
}

impl AggroStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self {
            spots: BTreeMap::new(),
        }
    }

    /// Add `amount` threat from `attacker` towards `target` at `tick`.
    /// Returns the new tally.
    pub fn add_aggro(
        &mut self,
        spot: SpotId,
        attacker: ObjectId,
        target: ObjectId,
        amount: u64,
        tick: u64,
    ) -> Result<u64, AgentError> {
        let entry = self
            .spots
            .entry(spot)
            .or_default()
            .entry(attacker)
            .or_default()
            .entry(target)
            .or_insert(ThreatEntry {
                threat: 0,
                last_seen_tick: tick,
            });
        entry.threat =
            entry
                .threat
                .checked_add(amount)
                .ok_or_else(|| AgentError::ArithmeticOverflow {
                    context: format!("threat of {attacker} towards {target}"),
                })?;
        entry.last_seen_tick = entry.last_seen_tick.max(tick);
        Ok(entry.threat)
    }

    /// Remembered threat held by `attacker`, keyed by target.
    pub fn get_threat_by_attacker(
        &self,
        spot: SpotId,
        attacker: ObjectId,
        current_tick: u64,
        policy: &MemoryPolicy,
    ) -> BTreeMap<ObjectId, ThreatEntry> {
        self.spots
            .get(&spot)
            .and_then(|attackers| attackers.get(&attacker))
            .map(|targets| {
                targets
                    .iter()
                    .filter(|(_, e)| policy.remembers(e.last_seen_tick, current_tick))
                    .map(|(id, e)| (*id, *e))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The remembered target with the most threat. Ties go to the earliest
    /// `last_seen_tick`, then the lowest id.
    pub fn top_target(
        &self,
        spot: SpotId,
        attacker: ObjectId,
        current_tick: u64,
        policy: &MemoryPolicy,
    ) -> Option<ObjectId> {
        self.ranked_targets(spot, attacker, current_tick, policy)
            .into_iter()
            .next()
    }

    /// Remembered targets ordered by threat, best first, with the same
    /// tie-break as [`Self::top_target`].
    pub fn ranked_targets(
        &self,
        spot: SpotId,
        attacker: ObjectId,
        current_tick: u64,
        policy: &MemoryPolicy,
    ) -> Vec<ObjectId> {
        let mut entries: Vec<(ObjectId, ThreatEntry)> = self
            .get_threat_by_attacker(spot, attacker, current_tick, policy)
            .into_iter()
            .collect();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            b.threat
                .cmp(&a.threat)
                .then(a.last_seen_tick.cmp(&b.last_seen_tick))
                .then(a_id.cmp(b_id))
        });
        entries.into_iter().map(|(id, _)| id).collect()
    }

    /// Delete forgotten entries and empty tables. Returns how many entries
    /// were removed.
    pub fn cleanup(&mut self, current_tick: u64, policy: &MemoryPolicy) -> usize {
        let mut removed = 0_usize;
        for attackers in self.spots.values_mut() {
            for targets in attackers.values_mut() {
                let before = targets.len();
                targets.retain(|_, e| policy.remembers(e.last_seen_tick, current_tick));
                removed = removed.saturating_add(before.saturating_sub(targets.len()));
            }
            attackers.retain(|_, targets| !targets.is_empty());
        }
        self.spots.retain(|_, attackers| !attackers.is_empty());
        if removed > 0 {
            debug!(tick = current_tick, removed, "forgotten threat entries dropped");
        }
        removed
    }

    /// Drop everything `attacker` holds on `spot`.
    pub fn clear_attacker(&mut self, spot: SpotId, attacker: ObjectId) {
        if let Some(attackers) = self.spots.get_mut(&spot) {
            attackers.remove(&attacker);
            if attackers.is_empty() {
                self.spots.remove(&spot);
            }
        }
    }

    /// Drop every grudge against `target` on `spot`.
    pub fn forget_target(&mut self, spot: SpotId, target: ObjectId) {
        if let Some(attackers) = self.spots.get_mut(&spot) {
            for targets in attackers.values_mut() {
                targets.remove(&target);
            }
            attackers.retain(|_, targets| !targets.is_empty());
            if attackers.is_empty() {
                self.spots.remove(&spot);
            }
        }
    }

    /// Total number of stored entries, forgotten or not.
    pub fn entry_count(&self) -> usize {
        self.spots
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn threat_accumulates_per_hit() {
        let mut store = AggroStore::new();
        let (spot, wolf, hero) = (SpotId::new(), ObjectId::new(), ObjectId::new());
        store.add_aggro(spot, wolf, hero, 10, 1).unwrap();
        let total = store.add_aggro(spot, wolf, hero, 15, 3).unwrap();
        assert_eq!(total, 25);
        let threat = store.get_threat_by_attacker(spot, wolf, 3, &MemoryPolicy::new(10));
        assert_eq!(
            threat.get(&hero),
            Some(&ThreatEntry {
                threat: 25,
                last_seen_tick: 3
            })
        );
    }

    #[test]
    fn old_entries_are_hidden_but_not_deleted() {
        let mut store = AggroStore::new();
        let (spot, wolf, hero) = (SpotId::new(), ObjectId::new(), ObjectId::new());
        let policy = MemoryPolicy::new(5);
        store.add_aggro(spot, wolf, hero, 10, 10).unwrap();

        assert!(store.get_threat_by_attacker(spot, wolf, 15, &policy).contains_key(&hero));
        assert!(store.get_threat_by_attacker(spot, wolf, 16, &policy).is_empty());
        assert_eq!(store.entry_count(), 1);

        assert_eq!(store.cleanup(16, &policy), 1);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn ties_go_to_the_earliest_seen_target() {
        let mut store = AggroStore::new();
        let (spot, wolf) = (SpotId::new(), ObjectId::new());
        let (late, early) = (ObjectId::new(), ObjectId::new());
        store.add_aggro(spot, wolf, late, 20, 8).unwrap();
        store.add_aggro(spot, wolf, early, 20, 4).unwrap();
        let policy = MemoryPolicy::new(50);
        assert_eq!(store.top_target(spot, wolf, 10, &policy), Some(early));

        store.add_aggro(spot, wolf, late, 1, 9).unwrap();
        assert_eq!(store.top_target(spot, wolf, 10, &policy), Some(late));
    }

    #[test]
    fn spots_and_attackers_are_isolated() {
        let mut store = AggroStore::new();
        let (meadow, hollow) = (SpotId::new(), SpotId::new());
        let (wolf, bat, hero) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        store.add_aggro(meadow, wolf, hero, 5, 0).unwrap();
        let policy = MemoryPolicy::default();
        assert!(store.get_threat_by_attacker(hollow, wolf, 0, &policy).is_empty());
        assert!(store.get_threat_by_attacker(meadow, bat, 0, &policy).is_empty());

        store.forget_target(meadow, hero);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn presence_matches_the_memory_window() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut store = AggroStore::new();
            let (spot, wolf, hero) = (SpotId::new(), ObjectId::new(), ObjectId::new());
            let policy = MemoryPolicy::new(rng.random_range(0..20));
            let mut expected = 0_u64;
            let mut last_seen = 0_u64;
            for tick in 0..rng.random_range(1..10_u64) {
                let amount = rng.random_range(1..50);
                store.add_aggro(spot, wolf, hero, amount, tick).unwrap();
                expected += amount;
                last_seen = tick;
            }
            let now = last_seen + rng.random_range(0..40);
            let threat = store.get_threat_by_attacker(spot, wolf, now, &policy);
            if now - last_seen > policy.forget_after_ticks {
                assert!(threat.is_empty(), "seed {seed}");
            } else {
                assert_eq!(threat.get(&hero).map(|e| e.threat), Some(expected), "seed {seed}");
            }
        }
    }
}
