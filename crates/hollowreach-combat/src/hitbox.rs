//! The hitbox aggregate.
//!
//! A hitbox is collision-active for exactly the ticks
//! `[start_tick, start_tick + duration)`. Its attacker stats snapshot is
//! taken once, at creation, and never changes afterwards: damage always
//! resolves against the stats the attacker had when the skill fired.

use std::collections::{BTreeMap, BTreeSet};

use hollowreach_types::{
    CombatStats, Coordinate, Element, HitBoxId, ObjectId, PlayerId, Shape, Side, SkillId, SpotId,
    Vector,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// A time-windowed attack volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitBox {
    /// Unique id.
    pub id: HitBoxId,
    /// Spot the hitbox lives on.
    pub spot: SpotId,
    /// Object that created it. Never hit by its own hitbox.
    pub owner: ObjectId,
    /// Player behind the owner, for kill credit.
    pub owner_player: Option<PlayerId>,
    /// Side of the owner. Same-side actors are not hit.
    pub side: Side,
    /// Skill that produced it.
    pub skill: Option<SkillId>,
    /// Element of the attack.
    pub element: Element,
    /// World-space footprint around the current coordinate.
    pub shape: Shape,
    /// Coordinate at `start_tick`.
    pub origin: Coordinate,
    coordinate: Coordinate,
    /// Displacement per tick.
    pub velocity: Vector,
    /// First active tick.
    pub start_tick: u64,
    /// Number of active ticks.
    pub duration: u64,
    /// Multiplier applied to the base damage.
    pub power_multiplier: Decimal,
    attacker_stats: Option<CombatStats>,
    hits: BTreeSet<ObjectId>,
}

impl HitBox {
    /// Create a stationary hitbox with power 1 and no snapshot.
    pub fn new(
        spot: SpotId,
        owner: ObjectId,
        side: Side,
        shape: Shape,
        origin: Coordinate,
        start_tick: u64,
        duration: u64,
    ) -> Self {
        Self {
            id: HitBoxId::new(),
            spot,
            owner,
            owner_player: None,
            side,
            skill: None,
            element: Element::Neutral,
            shape,
            origin,
            coordinate: origin,
            velocity: Vector::ZERO,
            start_tick,
            duration,
            power_multiplier: Decimal::ONE,
            attacker_stats: None,
            hits: BTreeSet::new(),
        }
    }

    /// Builder: per-tick velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: power multiplier.
    #[must_use]
    pub fn with_power(mut self, power_multiplier: Decimal) -> Self {
        self.power_multiplier = power_multiplier;
        self
    }

    /// Builder: freeze the attacker's stats.
    #[must_use]
    pub fn with_attacker_stats(mut self, stats: CombatStats) -> Self {
        self.attacker_stats = Some(stats);
        self
    }

    /// Builder: the player credited for kills.
    #[must_use]
    pub fn with_owner_player(mut self, player: Option<PlayerId>) -> Self {
        self.owner_player = player;
        self
    }

    /// Builder: originating skill and element.
    #[must_use]
    pub fn with_skill(mut self, skill: SkillId, element: Element) -> Self {
        self.skill = Some(skill);
        self.element = element;
        self
    }

    /// The frozen attacker stats.
    pub const fn attacker_stats(&self) -> Option<&CombatStats> {
        self.attacker_stats.as_ref()
    }

    /// Current coordinate.
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// First tick at which the hitbox is no longer active.
    pub const fn end_tick(&self) -> u64 {
        self.start_tick.saturating_add(self.duration)
    }

    /// Whether collisions are evaluated at `tick`.
    pub const fn is_active(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.end_tick()
    }

    /// Whether the active window has fully elapsed.
    pub const fn is_expired(&self, tick: u64) -> bool {
        tick >= self.end_tick()
    }

    /// Move to the position for `tick`: `origin + velocity * elapsed`.
    /// Before `start_tick` the hitbox sits at its origin.
    pub fn advance_to(&mut self, tick: u64) -> Result<Coordinate, CombatError> {
        let elapsed = tick.saturating_sub(self.start_tick);
        if self.velocity.is_zero() || elapsed == 0 {
            self.coordinate = self.origin;
            return Ok(self.coordinate);
        }
        let travelled = self
            .velocity
            .scaled(elapsed)
            .ok_or(CombatError::ArithmeticOverflow)?;
        self.coordinate = self
            .origin
            .translate(travelled)
            .ok_or(CombatError::ArithmeticOverflow)?;
        Ok(self.coordinate)
    }

    /// Whether `point` is inside the hitbox at its current coordinate.
    pub fn covers(&self, point: Coordinate) -> bool {
        self.shape.contains(self.coordinate, point)
    }

    /// Whether `target` was already hit.
    pub fn has_hit(&self, target: ObjectId) -> bool {
        self.hits.contains(&target)
    }

    /// Record a hit. Returns `false` if the target was already hit.
    pub fn register_hit(&mut self, target: ObjectId) -> bool {
        self.hits.insert(target)
    }
}

/// All hitboxes, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitBoxStore {
    hitboxes: BTreeMap<HitBoxId, HitBox>,
}

impl HitBoxStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            hitboxes: BTreeMap::new(),
        }
    }

    /// Store a hitbox.
    pub fn insert(&mut self, hitbox: HitBox) -> Result<HitBoxId, CombatError> {
        let id = hitbox.id;
        if self.hitboxes.contains_key(&id) {
            return Err(CombatError::DuplicateHitBox(id));
        }
        self.hitboxes.insert(id, hitbox);
        Ok(id)
    }

    /// Look up a hitbox.
    pub fn get(&self, id: HitBoxId) -> Option<&HitBox> {
        self.hitboxes.get(&id)
    }

    /// Look up a hitbox mutably.
    pub fn get_mut(&mut self, id: HitBoxId) -> Option<&mut HitBox> {
        self.hitboxes.get_mut(&id)
    }

    /// Remove a hitbox.
    pub fn remove(&mut self, id: HitBoxId) -> Option<HitBox> {
        self.hitboxes.remove(&id)
    }

    /// Ids of every hitbox on `spot`, in id order.
    pub fn ids_for_spot(&self, spot: SpotId) -> Vec<HitBoxId> {
        self.hitboxes
            .values()
            .filter(|h| h.spot == spot)
            .map(|h| h.id)
            .collect()
    }

    /// Drop every hitbox whose window has elapsed at `tick`.
    pub fn purge_expired(&mut self, tick: u64) -> Vec<HitBoxId> {
        let expired: Vec<HitBoxId> = self
            .hitboxes
            .values()
            .filter(|h| h.is_expired(tick))
            .map(|h| h.id)
            .collect();
        for id in &expired {
            self.hitboxes.remove(id);
        }
        expired
    }

    /// Drop every hitbox owned by `owner`.
    pub fn remove_owned_by(&mut self, owner: ObjectId) -> usize {
        let before = self.hitboxes.len();
        self.hitboxes.retain(|_, h| h.owner != owner);
        before.saturating_sub(self.hitboxes.len())
    }

    /// Number of stored hitboxes.
    pub fn len(&self) -> usize {
        self.hitboxes.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.hitboxes.is_empty()
    }
}
