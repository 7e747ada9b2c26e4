//! Collision service: advance hitboxes and report first contacts.

use hollowreach_types::{HitBoxId, ObjectId};
use hollowreach_world::PhysicalMap;
use tracing::trace;

use crate::error::CombatError;
use crate::hitbox::{HitBox, HitBoxStore};

/// A hitbox touched a target for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Collision {
    /// The hitbox.
    pub hitbox: HitBoxId,
    /// The object touched.
    pub target: ObjectId,
}

/// Match one hitbox against the actors on `map` at `tick`.
///
/// Skips the owner, targets already hit and actors on the owner's side.
/// Every reported target is registered so it is never reported again by
/// the same hitbox. Inactive hitboxes report nothing.
pub fn detect_collisions(hitbox: &mut HitBox, map: &PhysicalMap, tick: u64) -> Vec<Collision> {
    if !hitbox.is_active(tick) || hitbox.spot != map.spot() {
        return Vec::new();
    }
    let candidates: Vec<ObjectId> = map
        .actors_in_shape(hitbox.shape, hitbox.coordinate())
        .into_iter()
        .filter(|o| o.id != hitbox.owner && !hitbox.has_hit(o.id))
        .filter(|o| o.actor().is_some_and(|a| hitbox.side.is_hostile_to(a.side)))
        .map(|o| o.id)
        .collect();

    let mut collisions = Vec::with_capacity(candidates.len());
    for target in candidates {
        if hitbox.register_hit(target) {
            trace!(hitbox = %hitbox.id, %target, tick, "hit recorded");
            collisions.push(Collision {
                hitbox: hitbox.id,
                target,
            });
        }
    }
    collisions
}

/// Advance every hitbox on `map`'s spot to `tick` and collect first
/// contacts, in hitbox id order.
pub fn advance_and_collide(
    store: &mut HitBoxStore,
    map: &PhysicalMap,
    tick: u64,
) -> Result<Vec<Collision>, CombatError> {
    let mut collisions = Vec::new();
    for id in store.ids_for_spot(map.spot()) {
        let Some(hitbox) = store.get_mut(id) else {
            continue;
        };
        if hitbox.is_expired(tick) {
            continue;
        }
        hitbox.advance_to(tick)?;
        collisions.extend(detect_collisions(hitbox, map, tick));
    }
    Ok(collisions)
}
