//! The world simulation tick driver.
//!
//! [`WorldSimulation::run_tick`] runs one tick inside a single unit of
//! work:
//!
//! 1. Expired hitboxes are purged.
//! 2. Weather advances on every spot.
//! 3. Active hitboxes move and collide. Each first contact becomes a
//!    `HitRecorded` event.
//! 4. Harvests that are due pay out.
//! 5. Events are drained (damage, aggro, deaths, rewards).
//! 6. Every idle autonomous object decides and acts.
//! 7. Events are drained again.
//! 8. Due respawns are staged.
//! 9. Stale threat is dropped on its cleanup interval.
//! 10. A final drain.
//!
//! A critical failure anywhere rolls the whole tick back and leaves the
//! clock where it was. Notifications are delivered only after commit.

use std::fmt;

use hollowreach_agents::{
    Decision, DecisionContext, FirstInRange, InventoryService, MemoryPolicy,
    SkillSelectionPolicy, decide,
};
use hollowreach_combat::advance_and_collide;
use hollowreach_events::{DomainEvent, EventEnvelope};
use hollowreach_types::{
    Coordinate, Direction, MonsterAction, ObjectId, SkillTier, SpotId, UseSkillCommand,
};
use hollowreach_world::{AutonomousComponent, Behavior, PhysicalMap, WorldError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::catalog::Catalog;
use crate::clock::WorldClock;
use crate::commands::{fire_skill, stage_spawn};
use crate::config::HollowreachConfig;
use crate::dispatcher::{Dispatcher, HandlerContext};
use crate::error::CoreError;
use crate::handlers::default_dispatcher;
use crate::notification::{LogSink, NotificationSink, deliver_all};
use crate::repository::Repositories;
use crate::unit_of_work::UnitOfWork;

/// Search duration for autonomous objects without a monster template.
const DEFAULT_SEARCH_TICKS: u32 = 5;

// ---------------------------------------------------------------------------
// Settings and summary
// ---------------------------------------------------------------------------

/// Tuning the tick driver reads every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// How long threat is remembered.
    pub memory: MemoryPolicy,
    /// Ticks between aggro cleanups. Zero disables cleanup.
    pub aggro_cleanup_interval: u64,
    /// Ticks between weather rolls. Zero freezes the weather.
    pub weather_interval: u64,
    /// Whether autonomous skill use aims at the nearest target.
    pub default_auto_aim: bool,
    /// Events a single drain may process.
    pub max_events: usize,
}

impl SimulationSettings {
    /// Settings taken from the loaded configuration.
    pub const fn from_config(config: &HollowreachConfig) -> Self {
        Self {
            memory: MemoryPolicy::new(config.combat.aggro_forget_after_ticks),
            aggro_cleanup_interval: config.combat.aggro_cleanup_interval_ticks,
            weather_interval: config.environment.weather_change_interval_ticks,
            default_auto_aim: config.combat.default_auto_aim,
            max_events: config.combat.max_events_per_tick,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from_config(&HollowreachConfig::default())
    }
}

/// What happened during one tick, counted from the dispatched events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// The tick that ran.
    pub tick: u64,
    /// Hitbox contacts.
    pub hits: u32,
    /// Damage applications.
    pub damage_events: u32,
    /// Monsters killed.
    pub deaths: u32,
    /// Players downed.
    pub players_downed: u32,
    /// Behavior decisions made.
    pub decisions: u32,
    /// Steps taken.
    pub moves: u32,
    /// Skills fired.
    pub skills_used: u32,
    /// Monsters spawned or respawned.
    pub respawns: u32,
    /// Weather changes.
    pub weather_changes: u32,
    /// Harvests completed.
    pub harvests: u32,
    /// Events dispatched in total.
    pub events_processed: u32,
    /// Notifications delivered after commit.
    pub notifications: u32,
}

impl TickSummary {
    fn record(&mut self, envelopes: &[EventEnvelope]) {
        for envelope in envelopes {
            self.events_processed = self.events_processed.saturating_add(1);
            let counter = match envelope.event {
                DomainEvent::HitRecorded { .. } => Some(&mut self.hits),
                DomainEvent::DamageApplied { .. } => Some(&mut self.damage_events),
                DomainEvent::MonsterDied { .. } => Some(&mut self.deaths),
                DomainEvent::PlayerDowned { .. } => Some(&mut self.players_downed),
                DomainEvent::BehaviorDecided { .. } => Some(&mut self.decisions),
                DomainEvent::ObjectMoved { .. } => Some(&mut self.moves),
                DomainEvent::SkillUsed { .. } => Some(&mut self.skills_used),
                DomainEvent::MonsterSpawned { .. } => Some(&mut self.respawns),
                DomainEvent::WeatherChanged { .. } => Some(&mut self.weather_changes),
                DomainEvent::HarvestCompleted { .. } => Some(&mut self.harvests),
                _ => None,
            };
            if let Some(counter) = counter {
                *counter = counter.saturating_add(1);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WorldSimulation
// ---------------------------------------------------------------------------

/// The authoritative world: committed repositories, the clock, reference
/// data and the event dispatcher.
pub struct WorldSimulation {
    pub(crate) clock: WorldClock,
    pub(crate) repos: Repositories,
    pub(crate) catalog: Catalog,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) settings: SimulationSettings,
    pub(crate) seed: u64,
    pub(crate) rng: StdRng,
    pub(crate) sink: Box<dyn NotificationSink + Send>,
    pub(crate) policy: Box<dyn SkillSelectionPolicy + Send>,
}

impl fmt::Debug for WorldSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldSimulation")
            .field("tick", &self.clock.tick())
            .field("spots", &self.repos.maps.len())
            .field("monsters", &self.repos.monsters.len())
            .field("players", &self.repos.statuses.len())
            .field("dispatcher", &self.dispatcher)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl WorldSimulation {
    /// An empty world at tick 0. Loot and weather randomness is seeded from
    /// `seed`.
    pub fn new(catalog: Catalog, settings: SimulationSettings, seed: u64) -> Self {
        Self::restore(catalog, settings, seed, 0, Repositories::new())
    }

    /// An empty world configured from `config`.
    pub fn from_config(config: &HollowreachConfig, catalog: Catalog) -> Self {
        Self::new(
            catalog,
            SimulationSettings::from_config(config),
            config.world.seed,
        )
    }

    /// Resume a world from committed repositories at `tick`.
    pub fn restore(
        catalog: Catalog,
        settings: SimulationSettings,
        seed: u64,
        tick: u64,
        repos: Repositories,
    ) -> Self {
        Self {
            clock: WorldClock::from_tick(tick),
            repos,
            catalog,
            dispatcher: default_dispatcher(settings.max_events),
            settings,
            seed,
            rng: StdRng::seed_from_u64(seed.wrapping_add(tick)),
            sink: Box::new(LogSink),
            policy: Box::new(FirstInRange),
        }
    }

    /// Builder: deliver notifications to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: impl NotificationSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Builder: choose autonomous skills with `policy`.
    #[must_use]
    pub fn with_policy(mut self, policy: impl SkillSelectionPolicy + Send + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Load a spot's map.
    pub fn add_map(&mut self, map: PhysicalMap) {
        info!(spot = %map.spot(), name = map.name(), "spot loaded");
        self.repos.insert_map(map);
    }

    /// The last completed tick. Commands run at this tick.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The seed randomness was derived from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Committed state.
    pub const fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Committed state, mutably. Bypasses the unit of work; meant for world
    /// setup and administrative fixes between ticks.
    pub const fn repositories_mut(&mut self) -> &mut Repositories {
        &mut self.repos
    }

    /// Reference data.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Tick tuning.
    pub const fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// The event dispatcher.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TickFailed`] when any phase or critical handler
    /// fails. Nothing the tick did is kept and the clock does not move.
    pub fn run_tick(&mut self) -> Result<TickSummary, CoreError> {
        let tick = self.clock.peek_next()?;
        let mut uow = UnitOfWork::begin(&self.repos, tick);
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        let outcome = {
            let mut ctx = HandlerContext {
                catalog: &self.catalog,
                rng: &mut self.rng,
                memory: self.settings.memory,
            };
            let phases = Phases {
                dispatcher: &self.dispatcher,
                settings: &self.settings,
                policy: self.policy.as_ref(),
            };
            phases.run(&mut uow, &mut ctx, &mut summary)
        };

        if let Err(e) = outcome {
            error!(tick, error = %e, "tick failed, rolling back");
            uow.rollback();
            return Err(CoreError::TickFailed {
                tick,
                source: Box::new(e),
            });
        }

        let outbox = uow.commit(&mut self.repos);
        self.clock.advance()?;
        let delivered = deliver_all(self.sink.as_mut(), &outbox);
        summary.notifications = u32::try_from(delivered).unwrap_or(u32::MAX);

        info!(
            tick,
            hits = summary.hits,
            deaths = summary.deaths,
            decisions = summary.decisions,
            events = summary.events_processed,
            "tick complete"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tick phases
// ---------------------------------------------------------------------------

struct Phases<'a> {
    dispatcher: &'a Dispatcher,
    settings: &'a SimulationSettings,
    policy: &'a dyn SkillSelectionPolicy,
}

impl Phases<'_> {
    fn run(
        &self,
        uow: &mut UnitOfWork,
        ctx: &mut HandlerContext<'_>,
        summary: &mut TickSummary,
    ) -> Result<(), CoreError> {
        let tick = uow.tick();
        let purged = uow.repos_mut().hitboxes.purge_expired(tick);
        if !purged.is_empty() {
            trace!(tick, purged = purged.len(), "expired hitboxes purged");
        }

        self.advance_weather(uow);
        collide(uow)?;
        complete_harvests(uow, ctx)?;
        self.drain(uow, ctx, summary)?;

        self.run_behaviors(uow, ctx)?;
        self.drain(uow, ctx, summary)?;

        stage_respawns(uow, ctx.catalog)?;
        self.cleanup_aggro(uow);
        self.drain(uow, ctx, summary)
    }

    fn drain(
        &self,
        uow: &mut UnitOfWork,
        ctx: &mut HandlerContext<'_>,
        summary: &mut TickSummary,
    ) -> Result<(), CoreError> {
        let processed = self.dispatcher.drain(uow, ctx)?;
        summary.record(&processed);
        Ok(())
    }

    fn advance_weather(&self, uow: &mut UnitOfWork) {
        let tick = uow.tick();
        for spot in uow.repos().spot_ids() {
            let change = uow
                .repos_mut()
                .maps
                .get_mut(&spot)
                .and_then(|map| map.advance_weather(tick, self.settings.weather_interval));
            if let Some((from, to)) = change {
                debug!(%spot, ?from, ?to, "weather changed");
                uow.emit(DomainEvent::WeatherChanged { spot, from, to });
            }
        }
    }

    fn run_behaviors(
        &self,
        uow: &mut UnitOfWork,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<(), CoreError> {
        for spot in uow.repos().spot_ids() {
            let decisions = self.decide_spot(uow.repos(), spot, uow.tick(), ctx)?;
            for decision in decisions {
                self.apply_decision(uow, spot, decision, ctx.catalog)?;
            }
        }
        Ok(())
    }

    /// Decide for every idle autonomous object on `spot` against the same
    /// view of the world.
    fn decide_spot(
        &self,
        repos: &Repositories,
        spot: SpotId,
        tick: u64,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<Decision>, CoreError> {
        let map = repos.map(spot)?;
        let mut decisions = Vec::new();
        for id in map.autonomous_ids() {
            if map.get_object(id)?.is_busy(tick) {
                continue;
            }
            let search_ticks = repos
                .monsters
                .by_object(id)
                .and_then(|m| ctx.catalog.monsters.get(&m.template).ok())
                .map_or(DEFAULT_SEARCH_TICKS, |t| t.search_ticks);
            let decision_ctx = DecisionContext {
                spot,
                map,
                aggro: &repos.aggro,
                memory: ctx.memory,
                statuses: &repos.statuses,
                skills: &ctx.catalog.skills,
                policy: self.policy,
                search_ticks,
                tick,
            };
            decisions.push(decide(id, repos.loadouts.get(&id), &decision_ctx)?);
        }
        Ok(decisions)
    }

    fn apply_decision(
        &self,
        uow: &mut UnitOfWork,
        spot: SpotId,
        decision: Decision,
        catalog: &Catalog,
    ) -> Result<(), CoreError> {
        let Decision {
            object,
            action,
            transitions,
            state,
            component,
        } = decision;

        let placed = uow.repos_mut().map_mut(spot)?.get_object_mut(object)?;
        if let Some(auto) = placed.behavior.autonomous_mut() {
            *auto = component;
        }
        for transition in transitions {
            uow.emit(DomainEvent::BehaviorStateChanged {
                spot,
                object,
                from: transition.from,
                to: transition.to,
            });
        }
        uow.emit(DomainEvent::BehaviorDecided {
            spot,
            object,
            state,
            action,
        });

        match action {
            MonsterAction::Wait => Ok(()),
            MonsterAction::Move { to } => step_autonomous(uow, spot, object, to),
            MonsterAction::UseSkill { slot, target } => {
                face_target(uow, spot, object, target)?;
                let command = UseSkillCommand {
                    spot,
                    actor: object,
                    tier: SkillTier::Normal,
                    slot,
                    target: Some(target),
                    auto_aim: self.settings.default_auto_aim,
                };
                match fire_skill(uow, catalog, &command) {
                    Ok(_) => Ok(()),
                    Err(e) if e.is_precondition() || e.is_transient() => {
                        debug!(%object, error = %e, "autonomous skill skipped");
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn cleanup_aggro(&self, uow: &mut UnitOfWork) {
        let interval = self.settings.aggro_cleanup_interval;
        let tick = uow.tick();
        if interval == 0 || tick.checked_rem(interval) != Some(0) {
            return;
        }
        let removed = uow.repos_mut().aggro.cleanup(tick, &self.settings.memory);
        if removed > 0 {
            debug!(tick, removed, "stale aggro dropped");
        }
    }
}

/// Advance every active hitbox and queue a hit for each first contact.
fn collide(uow: &mut UnitOfWork) -> Result<(), CoreError> {
    let tick = uow.tick();
    for spot in uow.repos().spot_ids() {
        let Repositories {
            maps, hitboxes, ..
        } = uow.repos_mut();
        let Some(map) = maps.get(&spot) else {
            continue;
        };
        let collisions = advance_and_collide(hitboxes, map, tick)?;
        for collision in collisions {
            uow.emit(DomainEvent::HitRecorded {
                spot,
                hitbox: collision.hitbox,
                target: collision.target,
            });
        }
    }
    Ok(())
}

/// Pay out every harvest whose duration has elapsed.
fn complete_harvests(uow: &mut UnitOfWork, ctx: &mut HandlerContext<'_>) -> Result<(), CoreError> {
    let tick = uow.tick();
    for spot in uow.repos().spot_ids() {
        let due: Vec<ObjectId> = uow
            .repos()
            .map(spot)?
            .objects()
            .filter(|o| match &o.behavior {
                Behavior::Harvestable(node) => node.ready_at().is_some_and(|at| at <= tick),
                _ => false,
            })
            .map(|o| o.id)
            .collect();

        for resource in due {
            let map = uow.repos_mut().map_mut(spot)?;
            let Behavior::Harvestable(node) = &mut map.get_object_mut(resource)?.behavior else {
                continue;
            };
            let table = node.loot_table.clone();
            let harvester = match node.complete_harvest(resource, tick) {
                Ok(harvester) => harvester,
                Err(WorldError::ResourceDepleted(_)) => {
                    debug!(%resource, "resource depleted before harvest finished");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let player = map
                .get_object(harvester)
                .ok()
                .and_then(|o| o.actor())
                .and_then(|a| a.player);
            let Some(player) = player else {
                debug!(%resource, %harvester, "harvester left, yield dropped");
                continue;
            };

            let items = ctx.catalog.loot.roll(&table, &mut *ctx.rng)?;
            uow.repos_mut()
                .statuses
                .add_items(player, &items)
                .map_err(|e| CoreError::data_integrity("harvest payout", e))?;
            debug!(%resource, %harvester, items = items.len(), "harvest completed");
            uow.emit(DomainEvent::HarvestCompleted {
                spot,
                harvester,
                resource,
                items,
            });
        }
    }
    Ok(())
}

/// Turn an autonomous object toward the target it chose. A target that left
/// the map leaves the facing as it is.
fn face_target(
    uow: &mut UnitOfWork,
    spot: SpotId,
    object: ObjectId,
    target: ObjectId,
) -> Result<(), CoreError> {
    let map = uow.repos_mut().map_mut(spot)?;
    let Ok(at) = map.get_object(target).map(|t| t.coordinate) else {
        return Ok(());
    };
    let from = map.get_object(object)?.coordinate;
    if let Some(direction) = Direction::toward(from, at) {
        map.face(object, direction)?;
    }
    Ok(())
}

/// Step an autonomous object, feeding the outcome back into its state
/// machine.
fn step_autonomous(
    uow: &mut UnitOfWork,
    spot: SpotId,
    object: ObjectId,
    to: Coordinate,
) -> Result<(), CoreError> {
    let tick = uow.tick();
    let map = uow.repos_mut().map_mut(spot)?;
    let capability = map
        .get_object(object)?
        .actor()
        .map(|a| a.movement.clone())
        .ok_or(WorldError::NotAnActor(object))?;

    match map.move_object(object, to, tick, &capability) {
        Ok(outcome) => {
            if let Some(auto) = map.get_object_mut(object)?.behavior.autonomous_mut() {
                auto.on_move_succeeded();
            }
            uow.emit(DomainEvent::ObjectMoved {
                spot,
                object,
                from: outcome.from,
                to: outcome.to,
            });
            Ok(())
        }
        Err(e @ (WorldError::InvalidMovement { .. } | WorldError::ActorBusy { .. })) => {
            debug!(%object, error = %e, "autonomous step failed");
            let transition = map
                .get_object_mut(object)?
                .behavior
                .autonomous_mut()
                .and_then(AutonomousComponent::on_move_failed);
            if let Some(transition) = transition {
                uow.emit(DomainEvent::BehaviorStateChanged {
                    spot,
                    object,
                    from: transition.from,
                    to: transition.to,
                });
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Re-create every monster whose respawn delay has run out.
fn stage_respawns(uow: &mut UnitOfWork, catalog: &Catalog) -> Result<(), CoreError> {
    let tick = uow.tick();
    let due = uow.repos_mut().take_due_respawns(tick);
    for respawn in due {
        match stage_spawn(uow, catalog, &respawn.template, respawn.spot, respawn.home) {
            Ok((monster, _)) => {
                debug!(%monster, template = %respawn.template, "monster respawning");
            }
            Err(e) if e.is_transient() => {
                warn!(template = %respawn.template, error = %e, "respawn dropped");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hollowreach_types::{Climate, TerrainType, Weather};

    use super::*;

    fn meadow() -> PhysicalMap {
        let mut map = PhysicalMap::new(SpotId::new(), "meadow", Climate::Temperate, 7);
        map.fill(6, 6, 0, TerrainType::Grass);
        map
    }

    fn simulation(settings: SimulationSettings) -> WorldSimulation {
        let mut sim = WorldSimulation::new(Catalog::builtin().unwrap(), settings, 7);
        sim.add_map(meadow());
        sim
    }

    #[test]
    fn ticks_advance_the_clock_after_commit() {
        let mut sim = simulation(SimulationSettings::default());
        assert_eq!(sim.tick(), 0);
        let summary = sim.run_tick().unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(sim.tick(), 1);
        sim.run_tick().unwrap();
        assert_eq!(sim.tick(), 2);
    }

    #[test]
    fn weather_summary_matches_the_spot_weather() {
        let settings = SimulationSettings {
            weather_interval: 1,
            ..SimulationSettings::default()
        };
        let mut sim = simulation(settings);
        let spot = sim.repositories().spot_ids().into_iter().next().unwrap();
        let mut changes: u32 = 0;
        for _ in 0..50 {
            let before = sim.repositories().map(spot).unwrap().weather();
            let summary = sim.run_tick().unwrap();
            let after = sim.repositories().map(spot).unwrap().weather();
            assert_eq!(summary.weather_changes == 1, before != after);
            changes = changes.saturating_add(summary.weather_changes);
        }
        assert!(changes <= 50);
    }

    #[test]
    fn frozen_weather_never_changes() {
        let settings = SimulationSettings {
            weather_interval: 0,
            ..SimulationSettings::default()
        };
        let mut sim = simulation(settings);
        for _ in 0..20 {
            assert_eq!(sim.run_tick().unwrap().weather_changes, 0);
        }
    }

    #[test]
    fn summary_counts_processed_events() {
        let mut summary = TickSummary::default();
        let spot = SpotId::new();
        let envelope = |event| EventEnvelope::new(1, event);
        summary.record(&[
            envelope(DomainEvent::WeatherChanged {
                spot,
                from: Weather::Clear,
                to: Weather::Rain,
            }),
            envelope(DomainEvent::HitRecorded {
                spot,
                hitbox: hollowreach_types::HitBoxId::new(),
                target: ObjectId::new(),
            }),
        ]);
        assert_eq!(summary.weather_changes, 1);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.events_processed, 2);
    }
}
