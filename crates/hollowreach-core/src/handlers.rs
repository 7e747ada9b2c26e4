//! Combat and lifecycle event handlers.
//!
//! | Event               | Handler          | Criticality  |
//! |---------------------|------------------|--------------|
//! | `HitRecorded`       | `apply_damage`   | critical     |
//! | `DamageApplied`     | `record_aggro`   | critical     |
//! | `MonsterDied`       | `death_reward`   | critical     |
//! | `MonsterDied`       | `notify`         | best effort  |
//! | `MonsterDied`       | `remove_monster` | critical     |
//! | `MonsterSpawned`    | `place_monster`  | critical     |
//! | `RewardGranted`     | `notify`         | best effort  |
//! | `PlayerDowned`      | `forget_target`  | critical     |
//! | `PlayerDowned`      | `notify`         | best effort  |
//! | `GatewayTraversed`  | `forget_target`  | critical     |
//!
//! Anything that vanished between emission and handling (an expired
//! hitbox, a removed target, an already dead monster) is logged and
//! skipped. A reward that cannot be granted because the killer's status or
//! the monster's loot table is missing is a data-integrity failure and
//! aborts the unit of work.

use hollowreach_agents::StatusService;
use hollowreach_combat::compute_damage;
use hollowreach_events::{DomainEvent, EventEnvelope, EventKind};
use hollowreach_types::{CombatStats, HitBoxId, MonsterId, ObjectId, PlayerId, SpotId};
use hollowreach_world::WorldError;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{Criticality, Dispatcher, HandlerContext};
use crate::error::CoreError;
use crate::notification::{Notification, NotificationKind};
use crate::repository::PendingRespawn;
use crate::unit_of_work::UnitOfWork;

/// A dispatcher with every handler in this module registered.
pub fn default_dispatcher(max_events: usize) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(max_events);
    register_handlers(&mut dispatcher);
    dispatcher
}

/// Register every handler in this module, in run order.
pub fn register_handlers(dispatcher: &mut Dispatcher) {
    use Criticality::{BestEffort, Critical};

    dispatcher.register(EventKind::HitRecorded, "apply_damage", Critical, apply_damage);
    dispatcher.register(EventKind::DamageApplied, "record_aggro", Critical, record_aggro);
    dispatcher.register(EventKind::MonsterDied, "death_reward", Critical, death_reward);
    dispatcher.register(EventKind::MonsterDied, "notify", BestEffort, notify);
    dispatcher.register(EventKind::MonsterDied, "remove_monster", Critical, remove_monster);
    dispatcher.register(EventKind::MonsterSpawned, "place_monster", Critical, place_monster);
    dispatcher.register(EventKind::RewardGranted, "notify", BestEffort, notify);
    dispatcher.register(EventKind::PlayerDowned, "forget_target", Critical, forget_target);
    dispatcher.register(EventKind::PlayerDowned, "notify", BestEffort, notify);
    dispatcher.register(EventKind::GatewayTraversed, "forget_target", Critical, forget_target);
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

/// Everything the damage handler read from the hitbox.
#[derive(Debug, Clone, Copy)]
struct Strike {
    spot: SpotId,
    hitbox: HitBoxId,
    attacker: ObjectId,
    attacker_player: Option<PlayerId>,
    attacker_stats: CombatStats,
    power: Decimal,
    target: ObjectId,
    tick: u64,
}

/// Resolve a hit into damage on the target's authoritative aggregate.
///
/// Attacker stats always come from the hitbox snapshot. Defender stats are
/// the target's effective stats at the event tick.
pub fn apply_damage(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    _ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let DomainEvent::HitRecorded {
        spot,
        hitbox,
        target,
    } = envelope.event
    else {
        return Ok(());
    };
    let repos = uow.repos();
    let Some(hb) = repos.hitboxes.get(hitbox) else {
        debug!(%hitbox, %target, "hitbox gone before damage resolved");
        return Ok(());
    };
    let Some(attacker_stats) = hb.attacker_stats().copied() else {
        debug!(%hitbox, "hitbox carries no attacker snapshot");
        return Ok(());
    };
    let strike = Strike {
        spot,
        hitbox,
        attacker: hb.owner,
        attacker_player: hb.owner_player,
        attacker_stats,
        power: hb.power_multiplier,
        target,
        tick: envelope.tick,
    };
    let Ok(map) = repos.map(spot) else {
        debug!(%spot, "map unloaded before damage resolved");
        return Ok(());
    };
    let Ok(object) = map.get_object(target) else {
        debug!(%target, "target gone before damage resolved");
        return Ok(());
    };
    if map.is_sanctuary(object.coordinate) {
        debug!(%target, at = %object.coordinate, "target is in a sanctuary");
        return Ok(());
    }
    let Some(actor) = object.actor() else {
        return Ok(());
    };
    match (actor.monster, actor.player) {
        (Some(monster), _) => damage_monster(uow, &strike, monster),
        (None, Some(player)) => damage_player(uow, &strike, player),
        (None, None) => Ok(()),
    }
}

fn damage_monster(uow: &mut UnitOfWork, strike: &Strike, id: MonsterId) -> Result<(), CoreError> {
    let repos = uow.repos_mut();
    let Ok(monster) = repos.monsters.get_mut(id) else {
        debug!(monster = %id, "monster gone before damage resolved");
        return Ok(());
    };
    if monster.is_dead() {
        debug!(monster = %id, "monster already dead");
        return Ok(());
    }
    let defense = monster.effective_stats(strike.tick);
    let amount = compute_damage(&strike.attacker_stats, &defense, strike.power);
    let remaining_hp = monster.apply_damage(amount);
    monster.last_attacker = Some(strike.attacker);
    monster.last_attacker_player = strike.attacker_player;
    let hp_percentage = monster.hp_percentage(strike.tick);
    let dead = monster.is_dead();

    let object = repos.map_mut(strike.spot)?.get_object_mut(strike.target)?;
    let transition = object
        .behavior
        .autonomous_mut()
        .and_then(|auto| auto.sync_hp(hp_percentage));

    debug!(
        tick = strike.tick,
        hitbox = %strike.hitbox,
        monster = %id,
        amount,
        remaining_hp,
        "monster damaged"
    );
    if let Some(t) = transition {
        uow.emit(DomainEvent::BehaviorStateChanged {
            spot: strike.spot,
            object: strike.target,
            from: t.from,
            to: t.to,
        });
    }
    uow.emit(DomainEvent::DamageApplied {
        spot: strike.spot,
        hitbox: strike.hitbox,
        attacker: strike.attacker,
        target: strike.target,
        amount,
        remaining_hp,
    });
    if dead {
        info!(tick = strike.tick, monster = %id, killer = ?strike.attacker_player, "monster died");
        uow.emit(DomainEvent::MonsterDied {
            spot: strike.spot,
            monster: id,
            object: strike.target,
            killer_player: strike.attacker_player,
            killer_object: Some(strike.attacker),
        });
    }
    Ok(())
}

fn damage_player(uow: &mut UnitOfWork, strike: &Strike, player: PlayerId) -> Result<(), CoreError> {
    let Ok(status) = uow.repos_mut().statuses.get_mut(player) else {
        warn!(%player, "player object without a status aggregate");
        return Ok(());
    };
    if status.downed {
        debug!(%player, "player already downed");
        return Ok(());
    }
    let defense = status.effective_stats(strike.tick);
    let amount = compute_damage(&strike.attacker_stats, &defense, strike.power);
    let remaining_hp = status.apply_damage(amount);
    let downed = status.downed;

    debug!(tick = strike.tick, %player, amount, remaining_hp, "player damaged");
    uow.emit(DomainEvent::DamageApplied {
        spot: strike.spot,
        hitbox: strike.hitbox,
        attacker: strike.attacker,
        target: strike.target,
        amount,
        remaining_hp,
    });
    if downed {
        info!(tick = strike.tick, %player, "player downed");
        uow.emit(DomainEvent::PlayerDowned {
            spot: strike.spot,
            player,
            object: strike.target,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggro
// ---------------------------------------------------------------------------

/// Add threat against the attacker to an autonomous target's table.
///
/// No-op unless the attacker is an actor and the target is autonomous.
/// Zero-damage hits still register one point of threat.
pub fn record_aggro(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    _ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let DomainEvent::DamageApplied {
        spot,
        attacker,
        target,
        amount,
        ..
    } = envelope.event
    else {
        return Ok(());
    };
    let Ok(map) = uow.repos().map(spot) else {
        return Ok(());
    };
    let target_is_autonomous = map
        .get_object(target)
        .is_ok_and(|o| o.behavior.autonomous().is_some());
    let attacker_is_actor = map.get_object(attacker).is_ok_and(|o| o.actor().is_some());
    if !target_is_autonomous || !attacker_is_actor {
        return Ok(());
    }
    let threat = uow.repos_mut().aggro.add_aggro(
        spot,
        target,
        attacker,
        u64::from(amount.max(1)),
        envelope.tick,
    )?;
    debug!(%target, %attacker, threat, "aggro recorded");
    Ok(())
}

// ---------------------------------------------------------------------------
// Death and spawn lifecycle
// ---------------------------------------------------------------------------

/// Grant the killer the monster's exp, gold and loot.
///
/// Without a killing player nothing happens. A missing killer status or an
/// unknown loot table or template is a data-integrity failure.
pub fn death_reward(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let DomainEvent::MonsterDied {
        monster,
        killer_player,
        ..
    } = envelope.event
    else {
        return Ok(());
    };
    let Some(player) = killer_player else {
        debug!(%monster, "monster died without a killing player");
        return Ok(());
    };
    let Ok(dead) = uow.repos().monsters.get(monster) else {
        debug!(%monster, "monster already removed");
        return Ok(());
    };
    let template = ctx.catalog.monsters.get(&dead.template).map_err(|e| {
        error!(%monster, error = %e, "monster template missing");
        CoreError::data_integrity("death reward", e)
    })?;
    let receipt = uow
        .repos_mut()
        .statuses
        .grant_reward(
            player,
            template.exp_reward,
            template.gold_reward,
            template.loot_table.as_ref(),
            &ctx.catalog.loot,
            &mut *ctx.rng,
        )
        .map_err(|e| {
            error!(%player, %monster, error = %e, "reward could not be granted");
            CoreError::data_integrity("death reward", e)
        })?;

    info!(
        %player,
        exp = receipt.exp,
        gold = receipt.gold,
        items = receipt.items.len(),
        "reward granted"
    );
    uow.emit(DomainEvent::RewardGranted {
        player,
        exp: receipt.exp,
        gold: receipt.gold,
        items: receipt.items,
        leveled_up_to: receipt.leveled_up_to,
    });
    Ok(())
}

/// Take a dead monster off its map, drop its loadout, hitboxes and threat
/// table, and schedule its respawn.
pub fn remove_monster(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let DomainEvent::MonsterDied {
        spot,
        monster,
        object,
        ..
    } = envelope.event
    else {
        return Ok(());
    };
    let repos = uow.repos_mut();
    if let Ok(map) = repos.map_mut(spot) {
        if map.contains_object(object) {
            map.remove_object(object)?;
        }
    }
    repos.loadouts.remove(&object);
    let hitboxes = repos.hitboxes.remove_owned_by(object);
    repos.aggro.clear_attacker(spot, object);

    let Ok(removed) = repos.monsters.remove(monster) else {
        debug!(%monster, "monster aggregate already removed");
        return Ok(());
    };
    let delay = ctx
        .catalog
        .monsters
        .get(&removed.template)
        .ok()
        .and_then(|t| t.respawn_delay_ticks);
    if let Some(delay) = delay {
        let due_tick = envelope
            .tick
            .checked_add(delay)
            .ok_or_else(|| CoreError::ArithmeticOverflow {
                context: format!("respawn tick of {monster}"),
            })?;
        repos.respawns.push(PendingRespawn {
            template: removed.template,
            spot: removed.spot,
            home: removed.home,
            due_tick,
        });
        debug!(%monster, due_tick, "respawn scheduled");
    }
    debug!(%monster, %object, hitboxes, "monster removed");
    Ok(())
}

/// Put a freshly spawned monster's object on its map.
///
/// When the home cell is occupied the spawn is undone and retried on the
/// next tick.
pub fn place_monster(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    _ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let DomainEvent::MonsterSpawned {
        spot,
        monster,
        object,
        coordinate,
    } = envelope.event
    else {
        return Ok(());
    };
    let repos = uow.repos_mut();
    let Some(placed) = repos.pending_placements.remove(&object) else {
        warn!(%object, "spawned object has no pending placement");
        return Ok(());
    };
    let placement = repos.map_mut(spot)?.add_object(placed);
    match placement {
        Ok(()) => {
            debug!(%monster, %object, at = %coordinate, "monster placed");
            Ok(())
        }
        Err(WorldError::InvalidPlacement { reason, .. }) => {
            let removed = repos.monsters.remove(monster)?;
            repos.loadouts.remove(&object);
            let due_tick = envelope.tick.saturating_add(1);
            repos.respawns.push(PendingRespawn {
                template: removed.template,
                spot,
                home: coordinate,
                due_tick,
            });
            debug!(%monster, at = %coordinate, %reason, due_tick, "spawn blocked, retrying");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Drop a downed or departed player from every threat table on the spot
/// it left.
pub fn forget_target(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    _ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let (spot, object) = match envelope.event {
        DomainEvent::PlayerDowned { spot, object, .. } => (spot, object),
        DomainEvent::GatewayTraversed {
            object, from_spot, ..
        } => (from_spot, object),
        _ => return Ok(()),
    };
    uow.repos_mut().aggro.forget_target(spot, object);
    Ok(())
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Stage player notifications for kills, level ups, loot and downs.
pub fn notify(
    envelope: &EventEnvelope,
    uow: &mut UnitOfWork,
    _ctx: &mut HandlerContext<'_>,
) -> Result<(), CoreError> {
    let tick = envelope.tick;
    match &envelope.event {
        DomainEvent::MonsterDied {
            monster,
            killer_player: Some(player),
            ..
        } => {
            let template = uow.repos().monsters.get(*monster)?.template.clone();
            uow.notify(Notification::new(
                *player,
                tick,
                NotificationKind::MonsterKilled { template },
            ));
        }
        DomainEvent::RewardGranted {
            player,
            items,
            leveled_up_to,
            ..
        } => {
            if let Some(level) = leveled_up_to {
                uow.notify(Notification::new(
                    *player,
                    tick,
                    NotificationKind::LevelUp { level: *level },
                ));
            }
            if !items.is_empty() {
                uow.notify(Notification::new(
                    *player,
                    tick,
                    NotificationKind::LootReceived {
                        items: items.clone(),
                    },
                ));
            }
        }
        DomainEvent::PlayerDowned { player, .. } => {
            uow.notify(Notification::new(*player, tick, NotificationKind::Downed));
        }
        _ => {}
    }
    Ok(())
}
