//! The owned stores every aggregate lives in.
//!
//! [`Repositories`] is handed to services explicitly; there is no global
//! state. A unit of work clones it, mutates the clone and swaps it back on
//! commit, so the committed value is always a consistent snapshot.

use std::collections::BTreeMap;

use hollowreach_agents::{AggroStore, MonsterStore, StatusRepository};
use hollowreach_combat::{HitBoxStore, SkillLoadout};
use hollowreach_types::{Coordinate, MonsterTemplateId, ObjectId, SpotId};
use hollowreach_world::{PhysicalMap, WorldObject};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A dead monster waiting to come back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRespawn {
    /// Template to spawn.
    pub template: MonsterTemplateId,
    /// Spot to spawn on.
    pub spot: SpotId,
    /// Home cell.
    pub home: Coordinate,
    /// First tick it may respawn.
    pub due_tick: u64,
}

/// Every aggregate store the simulation owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repositories {
    /// Physical maps by spot.
    pub maps: BTreeMap<SpotId, PhysicalMap>,
    /// Active hitboxes.
    pub hitboxes: HitBoxStore,
    /// Skill loadouts by owning object.
    pub loadouts: BTreeMap<ObjectId, SkillLoadout>,
    /// Threat tables.
    pub aggro: AggroStore,
    /// Live monsters.
    pub monsters: MonsterStore,
    /// Player status aggregates.
    pub statuses: StatusRepository,
    /// Scheduled respawns.
    pub respawns: Vec<PendingRespawn>,
    /// Objects created by a spawn, waiting for the placement handler.
    pub pending_placements: BTreeMap<ObjectId, WorldObject>,
}

impl Repositories {
    /// Empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a map, replacing any map on the same spot.
    pub fn insert_map(&mut self, map: PhysicalMap) {
        self.maps.insert(map.spot(), map);
    }

    /// The map for `spot`.
    pub fn map(&self, spot: SpotId) -> Result<&PhysicalMap, CoreError> {
        self.maps.get(&spot).ok_or(CoreError::SpotNotLoaded(spot))
    }

    /// The map for `spot`, mutably.
    pub fn map_mut(&mut self, spot: SpotId) -> Result<&mut PhysicalMap, CoreError> {
        self.maps.get_mut(&spot).ok_or(CoreError::SpotNotLoaded(spot))
    }

    /// Loaded spots in id order.
    pub fn spot_ids(&self) -> Vec<SpotId> {
        self.maps.keys().copied().collect()
    }

    /// The spot an object is currently on.
    pub fn locate(&self, object: ObjectId) -> Option<SpotId> {
        self.maps
            .values()
            .find(|m| m.contains_object(object))
            .map(PhysicalMap::spot)
    }

    /// The loadout owned by `object`.
    pub fn loadout(&self, object: ObjectId) -> Result<&SkillLoadout, CoreError> {
        self.loadouts.get(&object).ok_or(CoreError::NoLoadout(object))
    }

    /// The loadout owned by `object`, mutably.
    pub fn loadout_mut(&mut self, object: ObjectId) -> Result<&mut SkillLoadout, CoreError> {
        self.loadouts
            .get_mut(&object)
            .ok_or(CoreError::NoLoadout(object))
    }

    /// Remove and return every respawn due at `tick`, in schedule order.
    pub fn take_due_respawns(&mut self, tick: u64) -> Vec<PendingRespawn> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.respawns)
            .into_iter()
            .partition(|r| r.due_tick <= tick);
        self.respawns = waiting;
        due
    }
}

#[cfg(test)]
mod tests {
    use hollowreach_types::Climate;

    use super::*;

    fn respawn(due_tick: u64) -> PendingRespawn {
        PendingRespawn {
            template: MonsterTemplateId::new("wolf"),
            spot: SpotId::new(),
            home: Coordinate::new(1, 1, 0),
            due_tick,
        }
    }

    #[test]
    fn due_respawns_are_taken_in_order() {
        let mut repos = Repositories::new();
        repos.respawns = vec![respawn(5), respawn(9), respawn(3)];
        let due = repos.take_due_respawns(5);
        assert_eq!(due.iter().map(|r| r.due_tick).collect::<Vec<_>>(), vec![5, 3]);
        assert_eq!(repos.respawns.len(), 1);
        assert!(repos.take_due_respawns(8).is_empty());
    }

    #[test]
    fn missing_spots_and_loadouts_are_typed_errors() {
        let mut repos = Repositories::new();
        let spot = SpotId::new();
        assert!(matches!(repos.map(spot), Err(CoreError::SpotNotLoaded(_))));
        repos.insert_map(PhysicalMap::new(spot, "test", Climate::Temperate, 1));
        assert!(repos.map(spot).is_ok());
        assert!(matches!(
            repos.loadout(ObjectId::new()),
            Err(CoreError::NoLoadout(_))
        ));
    }
}
