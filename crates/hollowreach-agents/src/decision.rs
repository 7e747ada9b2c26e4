//! Per-tick decisions for autonomous objects.
//!
//! [`decide`] reads a consistent view of the map, the aggro store and the
//! player statuses, picks a target, drives the object's behavior state
//! machine and chooses one [`MonsterAction`]. It never mutates shared
//! state: the updated component and the transitions it went through are
//! returned in a [`Decision`] for the caller to apply inside its unit of
//! work.
//!
//! Target choice: the highest-threat remembered attacker within vision
//! range wins; otherwise the nearest hostile inside the field of view.
//! Downed players and anything standing in a sanctuary are ignored.

use hollowreach_combat::{SkillCatalog, SkillLoadout};
use hollowreach_types::{
    BehaviorState, Coordinate, Direction, MonsterAction, ObjectId, SkillTier, SpotId,
};
use hollowreach_world::{AutonomousComponent, PhysicalMap, Transition, WorldError, WorldObject};

use crate::aggro::{AggroStore, MemoryPolicy};
use crate::error::AgentError;
use crate::status::StatusRepository;
use crate::vision::{can_see, effective_vision_range};

// ---------------------------------------------------------------------------
// Skill selection
// ---------------------------------------------------------------------------

/// Chooses which equipped skill an autonomous object fires at a target.
pub trait SkillSelectionPolicy {
    /// The `(tier, slot)` to use against a target `distance` cells away at
    /// `tick`, or `None` to keep moving.
    fn select(
        &self,
        loadout: &SkillLoadout,
        catalog: &SkillCatalog,
        tick: u64,
        distance: u32,
    ) -> Option<(SkillTier, usize)>;
}

/// Fires the first ready normal-deck skill whose range covers the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInRange;

impl SkillSelectionPolicy for FirstInRange {
    fn select(
        &self,
        loadout: &SkillLoadout,
        catalog: &SkillCatalog,
        tick: u64,
        distance: u32,
    ) -> Option<(SkillTier, usize)> {
        let deck = loadout.deck(SkillTier::Normal);
        deck.slots().iter().enumerate().find_map(|(slot, equipped)| {
            let spec = catalog.get(&equipped.as_ref()?.skill).ok()?;
            (spec.targeting_range >= distance && loadout.is_ready(spec, tick))
                .then_some((SkillTier::Normal, slot))
        })
    }
}

// ---------------------------------------------------------------------------
// Context and result
// ---------------------------------------------------------------------------

/// The read-only view a decision is made from.
pub struct DecisionContext<'a> {
    /// Spot being simulated.
    pub spot: SpotId,
    /// The spot's map.
    pub map: &'a PhysicalMap,
    /// Threat tallies.
    pub aggro: &'a AggroStore,
    /// How long threat is remembered.
    pub memory: MemoryPolicy,
    /// Player statuses, for skipping downed players.
    pub statuses: &'a StatusRepository,
    /// Skill reference data.
    pub skills: &'a SkillCatalog,
    /// Skill choice strategy.
    pub policy: &'a dyn SkillSelectionPolicy,
    /// Ticks to search after losing sight of a target.
    pub search_ticks: u32,
    /// Current tick.
    pub tick: u64,
}

/// What an autonomous object decided this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The deciding object.
    pub object: ObjectId,
    /// The chosen action.
    pub action: MonsterAction,
    /// State changes made while deciding, in order.
    pub transitions: Vec<Transition>,
    /// State after deciding.
    pub state: BehaviorState,
    /// The updated component, to be written back to the map.
    pub component: AutonomousComponent,
}

// ---------------------------------------------------------------------------
// Decide
// ---------------------------------------------------------------------------

/// Decide one action for the autonomous object `id`.
///
/// `loadout` is the object's skills, if it has any. `search_ticks` in the
/// context is used when a chased target disappears.
pub fn decide(
    id: ObjectId,
    loadout: Option<&SkillLoadout>,
    ctx: &DecisionContext<'_>,
) -> Result<Decision, AgentError> {
    let object = ctx.map.get_object(id)?;
    let mut auto = object
        .behavior
        .autonomous()
        .cloned()
        .ok_or(WorldError::NotAnActor(id))?;
    let position = object.coordinate;
    let mut transitions = Vec::new();

    match choose_target(object, &auto, ctx) {
        Some((target, at)) => transitions.extend(auto.spot_target(target, at)),
        None => {
            if matches!(auto.state(), BehaviorState::Chase | BehaviorState::Flee) {
                transitions.extend(auto.lose_sight(ctx.search_ticks));
            } else if auto.state() == BehaviorState::Search {
                transitions.extend(auto.tick_search());
            }
        }
    }

    let action = match auto.state() {
        BehaviorState::Idle => MonsterAction::Wait,
        BehaviorState::Patrol => match auto.next_waypoint(position) {
            Some(goal) => walk(object, goal, &mut auto, &mut transitions, ctx, false),
            None => MonsterAction::Wait,
        },
        BehaviorState::Chase => chase(object, loadout, &mut auto, &mut transitions, ctx),
        BehaviorState::Search => match auto.last_known_position() {
            Some(goal) if goal != position => {
                walk(object, goal, &mut auto, &mut transitions, ctx, false)
            }
            _ => MonsterAction::Wait,
        },
        BehaviorState::Flee => {
            let threat = auto
                .target()
                .and_then(|t| ctx.map.get_object(t).ok())
                .map(|o| o.coordinate)
                .or_else(|| auto.last_known_position());
            match threat {
                Some(from) => walk(object, from, &mut auto, &mut transitions, ctx, true),
                None => MonsterAction::Wait,
            }
        }
        BehaviorState::Return => {
            if position == auto.home {
                transitions.extend(auto.arrive_home());
                MonsterAction::Wait
            } else {
                let home = auto.home;
                walk(object, home, &mut auto, &mut transitions, ctx, false)
            }
        }
    };

    Ok(Decision {
        object: id,
        action,
        transitions,
        state: auto.state(),
        component: auto,
    })
}

/// Whether `candidate` is something `observer` may target.
fn is_valid_target(observer: &WorldObject, candidate: &WorldObject, ctx: &DecisionContext<'_>) -> bool {
    let (Some(me), Some(them)) = (observer.actor(), candidate.actor()) else {
        return false;
    };
    if candidate.id == observer.id || !me.side.is_hostile_to(them.side) {
        return false;
    }
    if ctx.map.is_sanctuary(candidate.coordinate) {
        return false;
    }
    let downed = them
        .player
        .and_then(|p| ctx.statuses.get(p).ok())
        .is_some_and(|s| s.downed);
    !downed
}

fn choose_target(
    object: &WorldObject,
    auto: &AutonomousComponent,
    ctx: &DecisionContext<'_>,
) -> Option<(ObjectId, Coordinate)> {
    let position = object.coordinate;
    let range = effective_vision_range(auto.vision_range, ctx.map.weather());
    let range_sq = u64::from(range).saturating_mul(u64::from(range));

    let remembered = ctx
        .aggro
        .ranked_targets(ctx.spot, object.id, ctx.tick, &ctx.memory)
        .into_iter()
        .filter_map(|t| ctx.map.get_object(t).ok())
        .find(|c| {
            c.coordinate.z == position.z
                && position.planar_distance_squared(c.coordinate) <= range_sq
                && is_valid_target(object, c, ctx)
        });
    if let Some(found) = remembered {
        return Some((found.id, found.coordinate));
    }

    ctx.map
        .objects()
        .filter(|c| {
            is_valid_target(object, c, ctx)
                && can_see(
                    position,
                    auto.actor.direction,
                    auto.actor.fov_degrees,
                    range,
                    c.coordinate,
                )
        })
        .min_by_key(|c| (position.manhattan_distance(c.coordinate), c.id))
        .map(|c| (c.id, c.coordinate))
}

fn chase(
    object: &WorldObject,
    loadout: Option<&SkillLoadout>,
    auto: &mut AutonomousComponent,
    transitions: &mut Vec<Transition>,
    ctx: &DecisionContext<'_>,
) -> MonsterAction {
    let Some(target) = auto.target() else {
        return MonsterAction::Wait;
    };
    let Some(goal) = ctx
        .map
        .get_object(target)
        .ok()
        .map(|o| o.coordinate)
        .or_else(|| auto.last_known_position())
    else {
        return MonsterAction::Wait;
    };
    let distance = object.coordinate.manhattan_distance(goal);
    if let Some(loadout) = loadout {
        if let Some((_, slot)) = ctx.policy.select(loadout, ctx.skills, ctx.tick, distance) {
            return MonsterAction::UseSkill { slot, target };
        }
    }
    if distance <= 1 {
        // Adjacent and waiting on a cooldown.
        return MonsterAction::Wait;
    }
    walk(object, goal, auto, transitions, ctx, false)
}

/// Step towards `goal`, or away from it when `away` is set. Counts a
/// failure on the component when no step is possible.
fn walk(
    object: &WorldObject,
    goal: Coordinate,
    auto: &mut AutonomousComponent,
    transitions: &mut Vec<Transition>,
    ctx: &DecisionContext<'_>,
    away: bool,
) -> MonsterAction {
    match pick_step(object.coordinate, goal, auto, ctx.map, away) {
        Some(to) => MonsterAction::Move { to },
        None => {
            if let Some(t) = auto.on_move_failed() {
                transitions.push(t);
            }
            MonsterAction::Wait
        }
    }
}

/// The neighbouring cell that gets strictly closer to (or farther from)
/// `goal` by Manhattan distance, preferring the straighter line on ties.
/// Cells the object cannot enter, occupied cells and sanctuary cells are
/// skipped.
fn pick_step(
    from: Coordinate,
    goal: Coordinate,
    auto: &AutonomousComponent,
    map: &PhysicalMap,
    away: bool,
) -> Option<Coordinate> {
    let current = from.manhattan_distance(goal);
    let candidates = Direction::ALL.iter().filter_map(|d| {
        let next = from.step(*d)?;
        let tile = map.tile(next)?;
        let enterable = auto.actor.movement.can_enter(tile.terrain)
            && map.blocking_object_at(next).is_none()
            && !map.is_sanctuary(next);
        let key = (
            next.manhattan_distance(goal),
            next.planar_distance_squared(goal),
        );
        enterable.then_some((next, key))
    });
    let best = if away {
        candidates
            .filter(|(_, (d, _))| *d > current)
            .max_by_key(|(_, key)| *key)
    } else {
        candidates
            .filter(|(_, (d, _))| *d < current)
            .min_by_key(|(_, key)| *key)
    };
    best.map(|(next, _)| next)
}
