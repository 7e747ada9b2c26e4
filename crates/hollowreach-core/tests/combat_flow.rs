//! End-to-end combat through the tick driver: hitboxes, damage, deaths,
//! rewards, cooldowns, rollback and respawn.
//!
//! Every test drives a real [`WorldSimulation`] with the built-in catalog.
//! Setup that has no command (a hand-made hitbox, a tweaked stat block)
//! goes straight into the committed repositories between ticks.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use hollowreach_agents::MemoryPolicy;
use hollowreach_combat::{CombatError, HitBox};
use hollowreach_core::catalog::Catalog;
use hollowreach_core::error::CoreError;
use hollowreach_core::notification::{ChannelSink, NotificationKind};
use hollowreach_core::simulation::{SimulationSettings, WorldSimulation};
use hollowreach_types::{
    Climate, CombatStats, Coordinate, Direction, MonsterId, MonsterTemplateId, ObjectId, PlayerId,
    Shape, Side, SkillTier, SpotId, TerrainType, UseSkillCommand,
};
use hollowreach_world::PhysicalMap;

const WOLF_HOME: Coordinate = Coordinate::new(1, 1, 0);

fn settings() -> SimulationSettings {
    SimulationSettings {
        weather_interval: 0,
        ..SimulationSettings::default()
    }
}

fn world() -> (WorldSimulation, SpotId) {
    world_with(Catalog::builtin().unwrap(), settings())
}

fn world_with(catalog: Catalog, settings: SimulationSettings) -> (WorldSimulation, SpotId) {
    let mut sim = WorldSimulation::new(catalog, settings, 42);
    let spot = SpotId::new();
    let mut map = PhysicalMap::new(spot, "training yard", Climate::Temperate, 42);
    map.fill(8, 8, 0, TerrainType::Grass);
    sim.add_map(map);
    (sim, spot)
}

fn spawn_wolf(sim: &mut WorldSimulation, spot: SpotId, home: Coordinate) -> (MonsterId, ObjectId) {
    sim.spawn_monster(&MonsterTemplateId::new("wolf"), spot, home)
        .unwrap()
}

/// A one-tick point hitbox on `at`, active on the next tick, carrying a
/// frozen attack stat.
fn strike(
    sim: &mut WorldSimulation,
    spot: SpotId,
    at: Coordinate,
    attack: u32,
    owner_player: Option<PlayerId>,
) {
    let start = sim.tick() + 1;
    let hitbox = HitBox::new(spot, ObjectId::new(), Side::Player, Shape::Point, at, start, 1)
        .with_attacker_stats(CombatStats::offense_defense(attack, 0))
        .with_owner_player(owner_player);
    sim.repositories_mut().hitboxes.insert(hitbox).unwrap();
}

fn run_until(sim: &mut WorldSimulation, tick: u64) {
    while sim.tick() < tick {
        sim.run_tick().unwrap();
    }
}

#[test]
fn snapshot_attack_against_halved_defense() {
    let (mut sim, spot) = world();
    let (monster, _) = spawn_wolf(&mut sim, spot, WOLF_HOME);
    {
        let wolf = sim.repositories_mut().monsters.get_mut(monster).unwrap();
        wolf.hp = 100;
        wolf.base_stats.max_hp = 100;
        wolf.base_stats.defense = 10;
    }
    strike(&mut sim, spot, WOLF_HOME, 50, None);

    let summary = sim.run_tick().unwrap();

    assert_eq!(summary.hits, 1);
    assert_eq!(summary.damage_events, 1);
    assert_eq!(summary.deaths, 0);
    assert_eq!(sim.repositories().monsters.get(monster).unwrap().hp, 55);
}

#[test]
fn damage_uses_stats_frozen_at_cast_time() {
    let (mut sim, spot) = world();
    let (player, hero) = sim
        .register_player("Ada", spot, Coordinate::new(2, 2, 0))
        .unwrap();
    let (monster, wolf) = spawn_wolf(&mut sim, spot, Coordinate::new(2, 3, 0));

    // Firebolt sits in slot 1 and activates one tick after the cast.
    let used = sim
        .use_skill(UseSkillCommand {
            spot,
            actor: hero,
            tier: SkillTier::Normal,
            slot: 1,
            target: Some(wolf),
            auto_aim: false,
        })
        .unwrap();
    assert_eq!(used.hitboxes.len(), 1);
    assert_eq!(sim.repositories().statuses.get(player).unwrap().mp, 40);

    sim.repositories_mut()
        .statuses
        .get_mut(player)
        .unwrap()
        .base_stats
        .attack = 500;
    let summary = sim.run_tick().unwrap();

    // (20 - 4 / 2) * 1.5 = 27
    assert_eq!(summary.deaths, 0);
    assert_eq!(sim.repositories().monsters.get(monster).unwrap().hp, 33);
}

fn firebolt(
    spot: SpotId,
    hero: ObjectId,
    target: Option<ObjectId>,
    auto_aim: bool,
) -> UseSkillCommand {
    UseSkillCommand {
        spot,
        actor: hero,
        tier: SkillTier::Normal,
        slot: 1,
        target,
        auto_aim,
    }
}

fn facing(sim: &WorldSimulation, spot: SpotId, object: ObjectId) -> Direction {
    let map = sim.repositories().map(spot).unwrap();
    map.get_object(object).unwrap().actor().unwrap().direction
}

#[test]
fn explicit_target_does_not_turn_the_caster_without_auto_aim() {
    let (mut sim, spot) = world();
    let (_, hero) = sim
        .register_player("Ada", spot, Coordinate::new(2, 2, 0))
        .unwrap();
    let (_, wolf) = spawn_wolf(&mut sim, spot, Coordinate::new(6, 2, 0));

    let used = sim.use_skill(firebolt(spot, hero, Some(wolf), false)).unwrap();

    assert_eq!(used.facing, Direction::North);
    assert_eq!(facing(&sim, spot, hero), Direction::North);
}

#[test]
fn auto_aim_keeps_facing_when_nothing_is_in_range() {
    let (mut sim, spot) = world();
    let (_, hero) = sim
        .register_player("Ada", spot, Coordinate::new(0, 0, 0))
        .unwrap();
    // Seven cells away, one past firebolt's targeting range.
    let (_, wolf) = spawn_wolf(&mut sim, spot, Coordinate::new(7, 0, 0));

    let used = sim.use_skill(firebolt(spot, hero, Some(wolf), true)).unwrap();

    assert_eq!(used.facing, Direction::North);
    assert_eq!(facing(&sim, spot, hero), Direction::North);
}

#[test]
fn auto_aim_turns_toward_the_nearest_target_over_the_requested_one() {
    let (mut sim, spot) = world();
    let (_, hero) = sim
        .register_player("Ada", spot, Coordinate::new(2, 2, 0))
        .unwrap();
    spawn_wolf(&mut sim, spot, Coordinate::new(5, 2, 0));
    let (_, far) = spawn_wolf(&mut sim, spot, Coordinate::new(2, 7, 0));

    let used = sim.use_skill(firebolt(spot, hero, Some(far), true)).unwrap();

    assert_eq!(used.facing, Direction::East);
    assert_eq!(facing(&sim, spot, hero), Direction::East);
}

#[test]
fn chasing_monster_turns_toward_its_target_before_biting() {
    let settings = SimulationSettings {
        default_auto_aim: false,
        ..settings()
    };
    let (mut sim, spot) = world_with(Catalog::builtin().unwrap(), settings);
    let (player, hero) = sim
        .register_player("Ada", spot, Coordinate::new(2, 2, 0))
        .unwrap();
    let (_, wolf) = spawn_wolf(&mut sim, spot, Coordinate::new(3, 2, 0));
    sim.repositories_mut()
        .aggro
        .add_aggro(spot, wolf, hero, 10, 0)
        .unwrap();

    sim.run_tick().unwrap();

    assert_eq!(facing(&sim, spot, wolf), Direction::West);
    // 14 - 6 / 2 = 11
    assert_eq!(sim.repositories().statuses.get(player).unwrap().hp, 89);
}

#[test]
fn hp_cost_skill_resyncs_the_monster_hp_mirror() {
    let yaml = include_str!("../data/default-catalog.yaml")
        .replace(
            "skills:\n  - id: slash",
            "skills:\n  - id: blood_howl\n    name: Blood Howl\n    deck_cost: 1\n    \
             cast_lock_ticks: 1\n    cooldown_ticks: 5\n    cost: { hp: 20 }\n    \
             hit_pattern:\n      - duration_ticks: 1\n        shape: { kind: point }\n        \
             spawn_offset: { dx: 0, dy: 1, dz: 0 }\n  - id: slash",
        )
        .replace("    skills: [bite]\n", "    skills: [bite, blood_howl]\n");
    let (mut sim, spot) = world_with(Catalog::parse(&yaml).unwrap(), settings());
    let (monster, wolf) = spawn_wolf(&mut sim, spot, WOLF_HOME);

    let used = sim
        .use_skill(UseSkillCommand {
            spot,
            actor: wolf,
            tier: SkillTier::Normal,
            slot: 1,
            target: None,
            auto_aim: false,
        })
        .unwrap();

    assert_eq!(used.consumed.hp, 20);
    let repos = sim.repositories();
    assert_eq!(repos.monsters.get(monster).unwrap().hp, 40);
    let object = repos.map(spot).unwrap().get_object(wolf).unwrap();
    assert_eq!(object.behavior.autonomous().unwrap().hp_percentage(), 66);
}

#[test]
fn damaged_monster_holds_a_grudge_against_the_caster() {
    let (mut sim, spot) = world();
    let (_, hero) = sim
        .register_player("Ada", spot, Coordinate::new(2, 2, 0))
        .unwrap();
    let (_, wolf) = spawn_wolf(&mut sim, spot, Coordinate::new(2, 3, 0));
    sim.use_skill(UseSkillCommand {
        spot,
        actor: hero,
        tier: SkillTier::Normal,
        slot: 1,
        target: Some(wolf),
        auto_aim: true,
    })
    .unwrap();

    sim.run_tick().unwrap();

    let memory = sim.settings().memory;
    let top = sim
        .repositories()
        .aggro
        .top_target(spot, wolf, sim.tick(), &memory);
    assert_eq!(top, Some(hero));
}

#[test]
fn second_use_inside_the_cooldown_window_is_rejected() {
    let (mut sim, spot) = world();
    let (player, hero) = sim
        .register_player("Ada", spot, Coordinate::new(3, 3, 0))
        .unwrap();
    let firebolt = |sim: &mut WorldSimulation| {
        sim.use_skill(UseSkillCommand {
            spot,
            actor: hero,
            tier: SkillTier::Normal,
            slot: 1,
            target: None,
            auto_aim: false,
        })
    };

    run_until(&mut sim, 10);
    assert!(firebolt(&mut sim).is_ok());

    run_until(&mut sim, 12);
    let rejected = firebolt(&mut sim).unwrap_err();
    assert!(rejected.is_precondition());
    assert!(matches!(
        rejected,
        CoreError::Combat(CombatError::OnCooldown { ready_at: 15, .. })
    ));
    assert_eq!(sim.repositories().statuses.get(player).unwrap().mp, 40);

    run_until(&mut sim, 15);
    assert!(firebolt(&mut sim).is_ok());
    assert_eq!(sim.repositories().statuses.get(player).unwrap().mp, 30);
}

#[test]
fn death_without_a_killing_player_grants_nothing() {
    let (mut sim, spot) = world();
    let (player, _) = sim
        .register_player("Ada", spot, Coordinate::new(6, 6, 0))
        .unwrap();
    let (monster, wolf) = spawn_wolf(&mut sim, spot, WOLF_HOME);
    strike(&mut sim, spot, WOLF_HOME, 500, None);

    let summary = sim.run_tick().unwrap();

    assert_eq!(summary.deaths, 1);
    assert_eq!(summary.notifications, 0);
    let repos = sim.repositories();
    assert!(!repos.monsters.contains(monster));
    assert!(!repos.map(spot).unwrap().contains_object(wolf));
    assert!(!repos.loadouts.contains_key(&wolf));
    let status = repos.statuses.get(player).unwrap();
    assert_eq!((status.exp, status.gold), (0, 0));
}

#[test]
fn killing_player_is_rewarded_and_notified() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let (sim, spot) = world();
    let mut sim = sim.with_sink(ChannelSink::new(tx));
    let (player, hero) = sim
        .register_player("Ada", spot, Coordinate::new(6, 6, 0))
        .unwrap();
    spawn_wolf(&mut sim, spot, WOLF_HOME);
    let start = sim.tick() + 1;
    let hitbox = HitBox::new(spot, hero, Side::Player, Shape::Point, WOLF_HOME, start, 1)
        .with_attacker_stats(CombatStats::offense_defense(500, 0))
        .with_owner_player(Some(player));
    sim.repositories_mut().hitboxes.insert(hitbox).unwrap();

    let summary = sim.run_tick().unwrap();

    let status = sim.repositories().statuses.get(player).unwrap();
    assert_eq!((status.exp, status.gold), (40, 3));
    let mut delivered = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        delivered.push(notification);
    }
    assert_eq!(u32::try_from(delivered.len()).unwrap(), summary.notifications);
    assert!(delivered.iter().all(|n| n.player == player && n.tick == 1));
    assert!(delivered.iter().any(|n| n.kind
        == NotificationKind::MonsterKilled {
            template: MonsterTemplateId::new("wolf"),
        }));
}

#[test]
fn missing_killer_status_rolls_the_tick_back() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let (sim, spot) = world();
    let mut sim = sim.with_sink(ChannelSink::new(tx));
    let (monster, wolf) = spawn_wolf(&mut sim, spot, WOLF_HOME);
    strike(&mut sim, spot, WOLF_HOME, 500, Some(PlayerId::new()));
    let before = sim.repositories().clone();

    let error = sim.run_tick().unwrap_err();

    assert!(matches!(error, CoreError::TickFailed { tick: 1, .. }));
    assert!(error.is_data_integrity());
    assert_eq!(sim.tick(), 0);
    assert_eq!(sim.repositories(), &before);
    assert_eq!(sim.repositories().monsters.get(monster).unwrap().hp, 60);
    assert!(sim.repositories().map(spot).unwrap().contains_object(wolf));
    assert!(rx.try_recv().is_err());
}

#[test]
fn dead_monster_returns_home_after_its_respawn_delay() {
    let (mut sim, spot) = world();
    spawn_wolf(&mut sim, spot, WOLF_HOME);
    strike(&mut sim, spot, WOLF_HOME, 500, None);
    assert_eq!(sim.run_tick().unwrap().deaths, 1);
    assert_eq!(sim.repositories().respawns.len(), 1);
    assert_eq!(sim.repositories().respawns[0].due_tick, 31);

    run_until(&mut sim, 30);
    assert!(sim.repositories().monsters.is_empty());

    let summary = sim.run_tick().unwrap();
    assert_eq!(summary.respawns, 1);
    let repos = sim.repositories();
    let wolf = repos.monsters.iter().next().unwrap();
    assert_eq!(wolf.home, WOLF_HOME);
    assert_eq!(wolf.hp, 60);
    let object = repos.map(spot).unwrap().find_monster(wolf.id).unwrap();
    assert_eq!(object.coordinate, WOLF_HOME);
    assert!(repos.respawns.is_empty());
}

#[test]
fn spawning_on_an_occupied_cell_is_rejected() {
    let (mut sim, spot) = world();
    sim.register_player("Ada", spot, WOLF_HOME).unwrap();
    assert!(matches!(
        sim.spawn_monster(&MonsterTemplateId::new("wolf"), spot, WOLF_HOME),
        Err(CoreError::World(_))
    ));
    assert!(sim.repositories().monsters.is_empty());
}

#[test]
fn forgotten_threat_is_cleaned_up() {
    let settings = SimulationSettings {
        memory: MemoryPolicy::new(3),
        aggro_cleanup_interval: 1,
        ..settings()
    };
    let mut sim = WorldSimulation::new(Catalog::builtin().unwrap(), settings, 5);
    let spot = SpotId::new();
    let mut map = PhysicalMap::new(spot, "clearing", Climate::Temperate, 5);
    map.fill(4, 4, 0, TerrainType::Grass);
    sim.add_map(map);
    sim.repositories_mut()
        .aggro
        .add_aggro(spot, ObjectId::new(), ObjectId::new(), 10, 0)
        .unwrap();

    run_until(&mut sim, 2);
    assert_eq!(sim.repositories().aggro.entry_count(), 1);
    run_until(&mut sim, 5);
    assert_eq!(sim.repositories().aggro.entry_count(), 0);
}
