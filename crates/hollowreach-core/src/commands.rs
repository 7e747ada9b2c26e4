//! Player-facing commands.
//!
//! Every command runs in its own unit of work at the last completed tick:
//! the command mutates the working copy, the events it emitted are drained
//! through the dispatcher, and the result is committed only if both
//! succeeded. A rejected command leaves no trace.

use hollowreach_agents::{AgentError, InventoryService, PlayerStatus, SpawnedMonster, StatusService};
use hollowreach_combat::{CasterView, auto_aim, detect_collisions, translate_skill};
use hollowreach_events::DomainEvent;
use hollowreach_types::{
    Coordinate, ItemId, MonsterId, MonsterTemplateId, MoveCommand, MoveResult,
    MoveTarget, ObjectId, ObjectType, PlayerId, Race, ResourceKind, SkillId, SkillTier, SpotId,
    UseSkillCommand, UseSkillResult,
};
use hollowreach_world::{ActorComponent, Behavior, Gateway, WorldError, WorldObject};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::dispatcher::HandlerContext;
use crate::error::CoreError;
use crate::notification::deliver_all;
use crate::repository::Repositories;
use crate::simulation::WorldSimulation;
use crate::unit_of_work::UnitOfWork;

/// What an interaction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// A door was opened or closed.
    DoorToggled {
        /// Whether the door is now open.
        open: bool,
    },
    /// A chest was emptied into the actor's inventory.
    ChestOpened {
        /// Items taken.
        items: Vec<ItemId>,
    },
}

impl WorldSimulation {
    /// Run `op` in a unit of work, drain what it emitted and commit.
    fn execute<T>(
        &mut self,
        command: &'static str,
        op: impl FnOnce(&mut UnitOfWork, &Catalog) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut uow = UnitOfWork::begin(&self.repos, self.clock.tick());
        let result = op(&mut uow, &self.catalog).and_then(|value| {
            let mut ctx = HandlerContext {
                catalog: &self.catalog,
                rng: &mut self.rng,
                memory: self.settings.memory,
            };
            self.dispatcher.drain(&mut uow, &mut ctx).map(|_| value)
        });
        match result {
            Ok(value) => {
                let outbox = uow.commit(&mut self.repos);
                deliver_all(self.sink.as_mut(), &outbox);
                Ok(value)
            }
            Err(e) => {
                debug!(command, error = %e, "command rejected");
                uow.rollback();
                Err(e)
            }
        }
    }

    /// Step an actor one cell. Players pay the terrain's stamina cost.
    /// Stepping onto a gateway carries the actor to the linked spot.
    ///
    /// # Errors
    ///
    /// Busy actors, downed players, blocked or non-adjacent cells, missing
    /// stamina and unloaded gateway destinations are all rejected.
    pub fn move_actor(&mut self, command: MoveCommand) -> Result<MoveResult, CoreError> {
        self.execute("move", |uow, _| move_in(uow, &command))
    }

    /// Fire the skill in a deck slot.
    ///
    /// # Errors
    ///
    /// Rejected while busy, on cooldown, short of resources, downed, or for
    /// an empty slot.
    pub fn use_skill(&mut self, command: UseSkillCommand) -> Result<UseSkillResult, CoreError> {
        self.execute("use_skill", |uow, catalog| fire_skill(uow, catalog, &command))
    }

    /// Equip `skill` into a deck slot, returning what it replaced.
    ///
    /// # Errors
    ///
    /// Fails for unknown skills, bad slots, exceeded capacity, awakened-only
    /// skills in the normal deck and skills already equipped elsewhere.
    pub fn equip_skill(
        &mut self,
        actor: ObjectId,
        tier: SkillTier,
        slot: usize,
        skill: &SkillId,
    ) -> Result<Option<SkillId>, CoreError> {
        self.execute("equip_skill", |uow, catalog| {
            let spec = catalog.skills.get(skill)?;
            Ok(uow
                .repos_mut()
                .loadout_mut(actor)?
                .equip_skill(tier, slot, spec)?)
        })
    }

    /// Clear a deck slot, returning the skill it held.
    ///
    /// # Errors
    ///
    /// Fails for an actor without a loadout or a slot out of range.
    pub fn unequip_skill(
        &mut self,
        actor: ObjectId,
        tier: SkillTier,
        slot: usize,
    ) -> Result<Option<SkillId>, CoreError> {
        self.execute("unequip_skill", |uow, _| {
            Ok(uow.repos_mut().loadout_mut(actor)?.unequip_skill(tier, slot)?)
        })
    }

    /// Create a player with the starting template and place it.
    ///
    /// # Errors
    ///
    /// Fails when the spot is not loaded or the cell cannot hold the
    /// player.
    pub fn register_player(
        &mut self,
        name: &str,
        spot: SpotId,
        coordinate: Coordinate,
    ) -> Result<(PlayerId, ObjectId), CoreError> {
        self.execute("register_player", |uow, catalog| {
            let player = PlayerId::new();
            let mut status = PlayerStatus::new(player, name, catalog.player.stats);
            status.add_items(&catalog.player.items)?;
            let object = WorldObject::new(
                name,
                ObjectType::Player,
                coordinate,
                Behavior::Actor(ActorComponent::player(player, Race::Human)),
            );
            let object_id = object.id;
            let loadout = catalog.player.loadout(object_id, &catalog.skills)?;

            let repos = uow.repos_mut();
            repos.map_mut(spot)?.add_object(object)?;
            repos.statuses.insert(status);
            repos.loadouts.insert(object_id, loadout);
            info!(%player, object = %object_id, name, at = %coordinate, "player registered");
            Ok((player, object_id))
        })
    }

    /// Spawn a monster from `template` at `home`.
    ///
    /// # Errors
    ///
    /// Fails for unknown templates, unloaded spots and occupied cells.
    pub fn spawn_monster(
        &mut self,
        template: &MonsterTemplateId,
        spot: SpotId,
        home: Coordinate,
    ) -> Result<(MonsterId, ObjectId), CoreError> {
        self.execute("spawn_monster", |uow, catalog| {
            if !uow.repos().map(spot)?.is_cell_free(home) {
                return Err(WorldError::InvalidPlacement {
                    coordinate: home,
                    reason: String::from("cell is not free"),
                }
                .into());
            }
            stage_spawn(uow, catalog, template, spot, home)
        })
    }

    /// Use a door or open a chest next to the actor. A locked door is
    /// unlocked first when `key` fits and the actor carries it.
    ///
    /// # Errors
    ///
    /// Fails when the actor is not a player, the target is out of reach,
    /// the door stays locked or the chest was already opened.
    pub fn interact(
        &mut self,
        spot: SpotId,
        actor: ObjectId,
        target: ObjectId,
        key: Option<ItemId>,
    ) -> Result<InteractionOutcome, CoreError> {
        self.execute("interact", |uow, _| {
            let player = reach(uow.repos(), spot, actor, target)?;
            if let Some(key) = &key {
                if !uow.repos().statuses.has_item(player, key)? {
                    return Err(CoreError::ItemNotHeld {
                        actor,
                        item: key.clone(),
                    });
                }
            }

            let map = uow.repos_mut().map_mut(spot)?;
            let outcome = match &mut map.get_object_mut(target)?.behavior {
                Behavior::Door(door) => {
                    if door.locked {
                        if let Some(key) = &key {
                            door.unlock(target, key)?;
                        }
                    }
                    let open = door.toggle(target)?;
                    InteractionOutcome::DoorToggled { open }
                }
                Behavior::Chest(chest) => InteractionOutcome::ChestOpened {
                    items: chest.take_contents(target)?,
                },
                _ => {
                    return Err(WorldError::UnsupportedInteraction {
                        object: target,
                        interaction: "interact",
                    }
                    .into());
                }
            };

            match &outcome {
                InteractionOutcome::DoorToggled { open } => {
                    uow.emit(DomainEvent::DoorToggled {
                        spot,
                        door: target,
                        open: *open,
                    });
                }
                InteractionOutcome::ChestOpened { items } => {
                    uow.repos_mut().statuses.add_items(player, items)?;
                    uow.emit(DomainEvent::ChestOpened {
                        spot,
                        actor,
                        chest: target,
                        items: items.clone(),
                    });
                }
            }
            Ok(outcome)
        })
    }

    /// Start harvesting a resource node next to the actor. The actor is
    /// busy until the returned tick, when the tick driver pays out.
    ///
    /// # Errors
    ///
    /// Fails when the actor is busy or not a player, the node is out of
    /// reach, depleted or already being harvested, or the required tool is
    /// missing.
    pub fn start_harvest(
        &mut self,
        spot: SpotId,
        actor: ObjectId,
        resource: ObjectId,
    ) -> Result<u64, CoreError> {
        self.execute("start_harvest", |uow, catalog| {
            let tick = uow.tick();
            let player = reach(uow.repos(), spot, actor, resource)?;
            let map = uow.repos().map(spot)?;
            let harvester = map.get_object(actor)?;
            if harvester.is_busy(tick) {
                return Err(WorldError::ActorBusy {
                    object: actor,
                    busy_until: harvester.busy_until,
                }
                .into());
            }
            let Behavior::Harvestable(node) = &map.get_object(resource)?.behavior else {
                return Err(WorldError::UnsupportedInteraction {
                    object: resource,
                    interaction: "harvest",
                }
                .into());
            };
            if let Some(tool) = node.required_tool {
                if !uow.repos().statuses.has_tool(player, tool, &catalog.items)? {
                    return Err(CoreError::MissingTool { actor, tool });
                }
            }

            let map = uow.repos_mut().map_mut(spot)?;
            let Behavior::Harvestable(node) = &mut map.get_object_mut(resource)?.behavior else {
                return Err(WorldError::UnsupportedInteraction {
                    object: resource,
                    interaction: "harvest",
                }
                .into());
            };
            let ready_at = node.start_harvest(resource, actor, tick)?;
            map.set_busy_until(actor, ready_at)?;
            debug!(%actor, %resource, ready_at, "harvest started");
            Ok(ready_at)
        })
    }
}

/// The player behind `actor`, provided `target` is on its cell or next to
/// it.
fn reach(
    repos: &Repositories,
    spot: SpotId,
    actor: ObjectId,
    target: ObjectId,
) -> Result<PlayerId, CoreError> {
    let map = repos.map(spot)?;
    let acting = map.get_object(actor)?;
    let player = acting
        .actor()
        .and_then(|a| a.player)
        .ok_or(CoreError::NotAPlayer(actor))?;
    let at = map.get_object(target)?.coordinate;
    if acting.coordinate != at && !acting.coordinate.is_adjacent(at) {
        return Err(CoreError::NotAdjacent { actor, target });
    }
    Ok(player)
}

fn move_in(uow: &mut UnitOfWork, command: &MoveCommand) -> Result<MoveResult, CoreError> {
    let tick = uow.tick();
    let map = uow.repos().map(command.spot)?;
    let object = map.get_object(command.actor)?;
    let actor = object
        .actor()
        .ok_or(WorldError::NotAnActor(command.actor))?;
    let capability = actor.movement.clone();
    let player = actor.player;
    let to = match command.target {
        MoveTarget::Coordinate(to) => to,
        MoveTarget::Direction(direction) => {
            object
                .coordinate
                .step(direction)
                .ok_or_else(|| WorldError::InvalidMovement {
                    object: command.actor,
                    to: object.coordinate,
                    reason: String::from("step leaves the coordinate space"),
                })?
        }
    };
    if let Some(player) = player {
        if uow.repos().statuses.get(player)?.downed {
            return Err(AgentError::PlayerDowned(player).into());
        }
    }

    let outcome = uow
        .repos_mut()
        .map_mut(command.spot)?
        .move_object(command.actor, to, tick, &capability)?;
    let stamina_spent = match player {
        Some(player) => {
            uow.repos_mut()
                .statuses
                .consume_resource(player, ResourceKind::Stamina, outcome.stamina_cost)?;
            outcome.stamina_cost
        }
        None => 0,
    };
    uow.emit(DomainEvent::ObjectMoved {
        spot: command.spot,
        object: command.actor,
        from: outcome.from,
        to: outcome.to,
    });

    let (spot, to) = match (&outcome.gateway, player) {
        (Some(gateway), Some(_)) => {
            traverse(uow, command.actor, command.spot, gateway)?;
            (gateway.target_spot, gateway.target_coordinate)
        }
        _ => (command.spot, outcome.to),
    };

    Ok(MoveResult {
        actor: command.actor,
        from: outcome.from,
        to,
        spot,
        busy_until: outcome.busy_until,
        stamina_spent,
    })
}

/// Carry `object` through `gateway` onto the linked spot's entry cell.
fn traverse(
    uow: &mut UnitOfWork,
    object: ObjectId,
    from_spot: SpotId,
    gateway: &Gateway,
) -> Result<(), CoreError> {
    let to_spot = gateway.target_spot;
    let to = gateway.target_coordinate;
    uow.repos().map(to_spot)?;

    let repos = uow.repos_mut();
    let mut moved = repos.map_mut(from_spot)?.remove_object(object)?;
    moved.coordinate = to;
    repos.map_mut(to_spot)?.add_object(moved)?;
    info!(%object, gateway = %gateway.name, %from_spot, %to_spot, at = %to, "gateway traversed");
    uow.emit(DomainEvent::GatewayTraversed {
        object,
        from_spot,
        to_spot,
        to,
    });
    Ok(())
}

/// Fire the skill in `command`'s slot for a player or a monster.
///
/// Resources and the cooldown are settled on copies first, so a rejected
/// use changes nothing. Hitboxes starting this tick are checked for
/// contacts straight away.
pub(crate) fn fire_skill(
    uow: &mut UnitOfWork,
    catalog: &Catalog,
    command: &UseSkillCommand,
) -> Result<UseSkillResult, CoreError> {
    let tick = uow.tick();
    let spot = command.spot;
    let actor_id = command.actor;

    let map = uow.repos().map(spot)?;
    let object = map.get_object(actor_id)?;
    if object.is_busy(tick) {
        return Err(WorldError::ActorBusy {
            object: actor_id,
            busy_until: object.busy_until,
        }
        .into());
    }
    let actor = object.actor().ok_or(WorldError::NotAnActor(actor_id))?;
    let (position, facing, side) = (object.coordinate, actor.direction, actor.side);
    let (player, monster) = (actor.player, actor.monster);

    let mut loadout = uow.repos().loadout(actor_id)?.clone();
    let (activation, stats) = match (player, monster) {
        (Some(player), _) => {
            let mut status = uow.repos().statuses.get(player)?.clone();
            if status.downed {
                return Err(AgentError::PlayerDowned(player).into());
            }
            let activation =
                loadout.use_skill(command.tier, command.slot, tick, &catalog.skills, &mut status)?;
            let stats = status.effective_stats(tick);
            *uow.repos_mut().statuses.get_mut(player)? = status;
            (activation, stats)
        }
        (None, Some(monster)) => {
            let mut aggregate = uow.repos().monsters.get(monster)?.clone();
            let activation = loadout.use_skill(
                command.tier,
                command.slot,
                tick,
                &catalog.skills,
                &mut aggregate,
            )?;
            let stats = aggregate.effective_stats(tick);
            let hp_percentage = aggregate.hp_percentage(tick);
            *uow.repos_mut().monsters.get_mut(monster)? = aggregate;
            let transition = uow
                .repos_mut()
                .map_mut(spot)?
                .get_object_mut(actor_id)?
                .behavior
                .autonomous_mut()
                .and_then(|auto| auto.sync_hp(hp_percentage));
            if let Some(t) = transition {
                uow.emit(DomainEvent::BehaviorStateChanged {
                    spot,
                    object: actor_id,
                    from: t.from,
                    to: t.to,
                });
            }
            (activation, stats)
        }
        (None, None) => {
            return Err(WorldError::UnsupportedInteraction {
                object: actor_id,
                interaction: "use_skill",
            }
            .into());
        }
    };

    let spec = catalog.skills.get(&activation.skill)?;
    let map = uow.repos().map(spot)?;
    let mut caster = CasterView {
        object: actor_id,
        player,
        side,
        position,
        facing,
        stats,
    };
    if command.auto_aim {
        caster.facing = auto_aim(&caster, map, spec.targeting_range).unwrap_or(facing);
    }

    let created = translate_skill(spec, &caster, spot, tick)?;
    let busy_until = tick
        .checked_add(spec.cast_lock_ticks)
        .ok_or_else(|| CoreError::ArithmeticOverflow {
            context: format!("cast lock of {actor_id}"),
        })?;

    *uow.repos_mut().loadout_mut(actor_id)? = loadout;
    let Repositories {
        maps, hitboxes, ..
    } = uow.repos_mut();
    let map = maps.get_mut(&spot).ok_or(CoreError::SpotNotLoaded(spot))?;
    map.face(actor_id, caster.facing)?;
    map.set_busy_until(actor_id, busy_until)?;

    let mut ids = Vec::with_capacity(created.len());
    let mut contacts = Vec::new();
    for mut hitbox in created {
        contacts.extend(detect_collisions(&mut hitbox, map, tick));
        ids.push(hitboxes.insert(hitbox)?);
    }

    debug!(actor = %actor_id, skill = %activation.skill, hitboxes = ids.len(), "skill used");
    uow.emit(DomainEvent::SkillUsed {
        spot,
        actor: actor_id,
        skill: activation.skill.clone(),
        hitboxes: ids.clone(),
    });
    for contact in contacts {
        uow.emit(DomainEvent::HitRecorded {
            spot,
            hitbox: contact.hitbox,
            target: contact.target,
        });
    }

    Ok(UseSkillResult {
        actor: actor_id,
        skill: activation.skill,
        consumed: activation.consumed,
        facing: caster.facing,
        hitboxes: ids,
        busy_until,
    })
}

/// Create a monster's aggregate and loadout and queue its map object for
/// placement by the spawn handler.
pub(crate) fn stage_spawn(
    uow: &mut UnitOfWork,
    catalog: &Catalog,
    template: &MonsterTemplateId,
    spot: SpotId,
    home: Coordinate,
) -> Result<(MonsterId, ObjectId), CoreError> {
    uow.repos().map(spot)?;
    let SpawnedMonster {
        monster,
        object,
        loadout,
    } = catalog.monsters.get(template)?.spawn(spot, home, &catalog.skills)?;
    let (monster_id, object_id) = (monster.id, object.id);

    let repos = uow.repos_mut();
    repos.monsters.insert(monster)?;
    repos.loadouts.insert(object_id, loadout);
    repos.pending_placements.insert(object_id, object);
    uow.emit(DomainEvent::MonsterSpawned {
        spot,
        monster: monster_id,
        object: object_id,
        coordinate: home,
    });
    Ok((monster_id, object_id))
}
