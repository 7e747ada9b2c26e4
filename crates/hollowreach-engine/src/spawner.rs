//! World bootstrap: loads the configured spots and seeds the initial
//! population.
//!
//! Players are created at the entry point with unique names drawn from a
//! built-in pool. Monster templates are cycled over the monster sites of
//! the starting world, plus one site at the center of every extra spot.
//! Placement is seeded from the world seed so a given config always boots
//! the same world.

use hollowreach_core::catalog::Catalog;
use hollowreach_core::config::{HollowreachConfig, SpotConfig};
use hollowreach_core::simulation::WorldSimulation;
use hollowreach_types::{Coordinate, MonsterTemplateId, PlayerId, SpotId, Vector};
use hollowreach_world::PhysicalMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::EngineError;

/// How far from a requested cell the spawner looks for a free one.
const PLACEMENT_RADIUS: i32 = 3;

/// Built-in pool of player names, drawn without replacement.
const NAME_POOL: &[&str] = &[
    "Aldric", "Brannoc", "Cressa", "Dagny", "Edrin", "Fenna", "Garrow", "Hild",
    "Isolde", "Jorund", "Kestra", "Lioren", "Maelis", "Norrick", "Orla", "Perrin",
    "Quenby", "Rowan", "Sunniva", "Torvald", "Ulla", "Vesper", "Wendel", "Yorath",
];

/// The initial population placed by [`build_world`].
#[derive(Debug, Default)]
pub struct SpawnReport {
    /// Player names and ids, in creation order.
    pub players: Vec<(String, PlayerId)>,
    /// Monsters placed.
    pub monsters: usize,
    /// Monster sites skipped because no free cell was near them.
    pub skipped_sites: usize,
}

/// Build the configured world and seed its population.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] when no spot is configured, a spot has
/// no area, a monster template is unknown, more players are requested than
/// there are names, or the entry point has no free cell. Map construction
/// and command failures propagate as their own variants.
pub fn build_world(
    config: &HollowreachConfig,
    catalog: Catalog,
) -> Result<(WorldSimulation, SpawnReport), EngineError> {
    let templates = resolve_templates(config, &catalog)?;
    let mut sim = WorldSimulation::from_config(config, catalog);
    let mut entry: Option<(SpotId, Coordinate)> = None;
    let mut sites: Vec<(SpotId, Coordinate)> = Vec::new();

    if config.world.use_starting_world {
        let world = hollowreach_world::create_starting_world(config.world.seed)?;
        entry = Some(world.player_entry);
        sites.extend(world.monster_sites);
        sim.add_map(world.meadow);
        sim.add_map(world.hollow);
    }

    let mut spot_seed = config.world.seed.wrapping_add(2);
    for spot in &config.world.extra_spots {
        let (map, center) = build_extra_spot(spot, spot_seed)?;
        let id = map.spot();
        entry.get_or_insert((id, Coordinate::new(1, 1, 0)));
        sites.push((id, center));
        sim.add_map(map);
        spot_seed = spot_seed.wrapping_add(1);
    }

    let Some((entry_spot, entry_cell)) = entry else {
        return Err(EngineError::Spawner {
            message: String::from("no spots configured"),
        });
    };

    let mut rng = StdRng::seed_from_u64(config.world.seed);
    let count = usize::try_from(config.spawner.player_count).unwrap_or(usize::MAX);
    let names = pick_unique_names(&mut rng, count)?;

    let mut report = SpawnReport::default();
    for name in names {
        let map = sim.repositories().map(entry_spot)?;
        let Some(cell) = free_cell_near(map, entry_cell, false) else {
            return Err(EngineError::Spawner {
                message: format!("no free cell near the entry point for {name}"),
            });
        };
        let (player, _) = sim.register_player(&name, entry_spot, cell)?;
        report.players.push((name, player));
    }

    for (template, (spot, home)) in templates.iter().cycle().zip(sites) {
        let map = sim.repositories().map(spot)?;
        let Some(cell) = free_cell_near(map, home, true) else {
            warn!(spot = %spot, template = %template, "monster site is blocked, skipping");
            report.skipped_sites = report.skipped_sites.saturating_add(1);
            continue;
        };
        sim.spawn_monster(template, spot, cell)?;
        report.monsters = report.monsters.saturating_add(1);
    }

    info!(
        players = report.players.len(),
        monsters = report.monsters,
        skipped_sites = report.skipped_sites,
        "initial population spawned"
    );
    Ok((sim, report))
}

fn resolve_templates(
    config: &HollowreachConfig,
    catalog: &Catalog,
) -> Result<Vec<MonsterTemplateId>, EngineError> {
    config
        .spawner
        .monster_templates
        .iter()
        .map(|key| {
            let id = MonsterTemplateId::new(key.as_str());
            catalog
                .monsters
                .get(&id)
                .map(|_| id.clone())
                .map_err(|e| EngineError::Spawner {
                    message: format!("monster template {key}: {e}"),
                })
        })
        .collect()
}

fn build_extra_spot(spot: &SpotConfig, seed: u64) -> Result<(PhysicalMap, Coordinate), EngineError> {
    if spot.width <= 0 || spot.height <= 0 {
        return Err(EngineError::Spawner {
            message: format!(
                "spot {} has no area ({}x{})",
                spot.name, spot.width, spot.height
            ),
        });
    }
    let mut map = PhysicalMap::new(SpotId::new(), spot.name.as_str(), spot.climate, seed);
    map.fill(spot.width, spot.height, 0, spot.terrain);
    let center = Coordinate::new(
        spot.width.checked_div(2).unwrap_or(0),
        spot.height.checked_div(2).unwrap_or(0),
        0,
    );
    Ok((map, center))
}

/// The free cell closest to `origin` in rings of growing radius. Monster
/// placements also skip sanctuary cells.
fn free_cell_near(map: &PhysicalMap, origin: Coordinate, monster: bool) -> Option<Coordinate> {
    (0..=PLACEMENT_RADIUS).find_map(|radius| {
        (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| Vector::new(dx, dy, 0)))
            .filter_map(|offset| origin.translate(offset))
            .find(|&cell| map.is_cell_free(cell) && !(monster && map.is_sanctuary(cell)))
    })
}

/// Pick `count` distinct names from [`NAME_POOL`] with a partial
/// Fisher-Yates shuffle.
fn pick_unique_names(rng: &mut impl Rng, count: usize) -> Result<Vec<String>, EngineError> {
    if count > NAME_POOL.len() {
        return Err(EngineError::Spawner {
            message: format!(
                "requested {count} players but the name pool only has {}",
                NAME_POOL.len()
            ),
        });
    }
    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    for i in 0..count {
        let j = rng.random_range(i..pool.len());
        pool.swap(i, j);
    }
    pool.truncate(count);
    Ok(pool.into_iter().map(String::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use hollowreach_types::{Climate, TerrainType};

    use super::*;

    fn build(config: &HollowreachConfig) -> Result<(WorldSimulation, SpawnReport), EngineError> {
        build_world(config, Catalog::builtin().unwrap())
    }

    #[test]
    fn default_config_boots_the_starting_world() {
        let (sim, report) = build(&HollowreachConfig::default()).unwrap();
        assert_eq!(report.players.len(), 2);
        assert_eq!(report.monsters, 3);
        assert_eq!(report.skipped_sites, 0);

        let repos = sim.repositories();
        assert_eq!(repos.statuses.len(), 2);
        assert_eq!(repos.monsters.len(), 3);
        let names: BTreeSet<_> = report.players.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn same_seed_picks_the_same_names() {
        let config = HollowreachConfig::default();
        let (_, first) = build(&config).unwrap();
        let (_, second) = build(&config).unwrap();
        let names = |r: &SpawnReport| r.players.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn extra_spot_gets_a_monster_at_its_center() {
        let mut config = HollowreachConfig::default();
        config.world.use_starting_world = false;
        config.world.extra_spots.push(SpotConfig {
            name: String::from("Sparring Ring"),
            width: 8,
            height: 8,
            terrain: TerrainType::Sand,
            climate: Climate::Arid,
        });
        config.spawner.player_count = 1;

        let (sim, report) = build(&config).unwrap();
        assert_eq!(report.monsters, 1);
        let monster = sim.repositories().monsters.iter().next().unwrap();
        assert_eq!(monster.home, Coordinate::new(4, 4, 0));
        assert_eq!(monster.template, MonsterTemplateId::new("wolf"));
    }

    #[test]
    fn no_spots_is_an_error() {
        let mut config = HollowreachConfig::default();
        config.world.use_starting_world = false;
        assert!(matches!(build(&config), Err(EngineError::Spawner { .. })));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let mut config = HollowreachConfig::default();
        config.spawner.monster_templates = vec![String::from("dragon")];
        assert!(matches!(build(&config), Err(EngineError::Spawner { .. })));
    }

    #[test]
    fn crowded_entry_spreads_players_out() {
        let mut config = HollowreachConfig::default();
        config.spawner.player_count = 6;
        let (sim, _) = build(&config).unwrap();
        let repos = sim.repositories();
        let cells: BTreeSet<_> = repos
            .statuses
            .iter()
            .filter_map(|s| {
                repos
                    .maps
                    .values()
                    .find_map(|map| map.find_player(s.player))
                    .map(|object| object.coordinate)
            })
            .collect();
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn names_are_drawn_without_replacement() {
        let mut rng = StdRng::seed_from_u64(9);
        let names = pick_unique_names(&mut rng, NAME_POOL.len()).unwrap();
        let unique: BTreeSet<_> = names.iter().collect();
        assert_eq!(unique.len(), NAME_POOL.len());
        assert!(pick_unique_names(&mut rng, NAME_POOL.len() + 1).is_err());
    }
}
