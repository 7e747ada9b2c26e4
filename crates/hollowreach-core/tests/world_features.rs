//! Player commands against the world: movement, gateways, doors, chests,
//! harvesting, sanctuaries and skill equipping.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::panic
)]

use hollowreach_agents::InventoryService;
use hollowreach_combat::{CombatError, HitBox};
use hollowreach_core::catalog::Catalog;
use hollowreach_core::commands::InteractionOutcome;
use hollowreach_core::error::CoreError;
use hollowreach_core::simulation::{SimulationSettings, WorldSimulation};
use hollowreach_types::{
    Area, Climate, CombatStats, Coordinate, Direction, ItemId, LootTableId, MoveCommand,
    MoveResult, MoveTarget, ObjectId, ObjectType, PlayerId, Shape, Side, SkillId, SkillTier,
    SpotId, TerrainType, ToolCategory, ZoneKind,
};
use hollowreach_world::{
    Behavior, ChestComponent, DoorComponent, Gateway, HarvestableComponent, LocationZone,
    PhysicalMap, WorldError, WorldObject,
};

const START: Coordinate = Coordinate::new(2, 2, 0);

fn spot_map(name: &str) -> PhysicalMap {
    let mut map = PhysicalMap::new(SpotId::new(), name, Climate::Temperate, 9);
    map.fill(6, 6, 0, TerrainType::Grass);
    map
}

fn world_with(map: PhysicalMap) -> (WorldSimulation, SpotId, PlayerId, ObjectId) {
    let settings = SimulationSettings {
        weather_interval: 0,
        ..SimulationSettings::default()
    };
    let mut sim = WorldSimulation::new(Catalog::builtin().unwrap(), settings, 9);
    let spot = map.spot();
    sim.add_map(map);
    let (player, object) = sim.register_player("Ada", spot, START).unwrap();
    (sim, spot, player, object)
}

fn place(sim: &mut WorldSimulation, spot: SpotId, object: WorldObject) -> ObjectId {
    let id = object.id;
    sim.repositories_mut()
        .map_mut(spot)
        .unwrap()
        .add_object(object)
        .unwrap();
    id
}

fn step(
    sim: &mut WorldSimulation,
    spot: SpotId,
    actor: ObjectId,
    direction: Direction,
) -> Result<MoveResult, CoreError> {
    sim.move_actor(MoveCommand {
        spot,
        actor,
        target: MoveTarget::Direction(direction),
    })
}

// ---------------------------------------------------------------------------
// Movement and gateways
// ---------------------------------------------------------------------------

#[test]
fn a_step_costs_stamina_and_time() {
    let (mut sim, spot, player, hero) = world_with(spot_map("field"));
    let moved = step(&mut sim, spot, hero, Direction::East).unwrap();
    assert_eq!(moved.to, Coordinate::new(3, 2, 0));
    assert_eq!(moved.stamina_spent, 1);
    assert_eq!(sim.repositories().statuses.get(player).unwrap().stamina, 59);

    let busy = step(&mut sim, spot, hero, Direction::East).unwrap_err();
    assert!(busy.is_precondition());
}

#[test]
fn downed_players_cannot_move() {
    let (mut sim, spot, player, hero) = world_with(spot_map("field"));
    sim.repositories_mut()
        .statuses
        .get_mut(player)
        .unwrap()
        .apply_damage(1_000);
    assert!(matches!(
        step(&mut sim, spot, hero, Direction::North),
        Err(CoreError::Agent(_))
    ));
}

#[test]
fn gateway_carries_the_player_to_the_linked_spot() {
    let cellar = spot_map("cellar");
    let cellar_spot = cellar.spot();
    let mut village = spot_map("village");
    village.add_gateway(Gateway {
        name: String::from("cellar stairs"),
        area: Area::new(Coordinate::new(3, 2, 0), Shape::Point),
        target_spot: cellar_spot,
        target_coordinate: Coordinate::new(1, 1, 0),
    });
    let (mut sim, village_spot, _, hero) = world_with(village);
    sim.add_map(cellar);

    let moved = step(&mut sim, village_spot, hero, Direction::East).unwrap();

    assert_eq!(moved.spot, cellar_spot);
    assert_eq!(moved.to, Coordinate::new(1, 1, 0));
    let repos = sim.repositories();
    assert_eq!(repos.locate(hero), Some(cellar_spot));
    assert!(!repos.map(village_spot).unwrap().contains_object(hero));
}

#[test]
fn gateway_to_an_unloaded_spot_leaves_the_player_in_place() {
    let mut village = spot_map("village");
    village.add_gateway(Gateway {
        name: String::from("collapsed tunnel"),
        area: Area::new(Coordinate::new(3, 2, 0), Shape::Point),
        target_spot: SpotId::new(),
        target_coordinate: Coordinate::new(0, 0, 0),
    });
    let (mut sim, spot, player, hero) = world_with(village);

    let error = step(&mut sim, spot, hero, Direction::East).unwrap_err();

    assert!(matches!(error, CoreError::SpotNotLoaded(_)));
    let repos = sim.repositories();
    assert_eq!(repos.map(spot).unwrap().get_object(hero).unwrap().coordinate, START);
    assert_eq!(repos.statuses.get(player).unwrap().stamina, 60);
}

// ---------------------------------------------------------------------------
// Doors and chests
// ---------------------------------------------------------------------------

#[test]
fn locked_door_opens_with_a_carried_key() {
    let (mut sim, spot, player, hero) = world_with(spot_map("yard"));
    let key = ItemId::new("yard_key");
    let door = place(
        &mut sim,
        spot,
        WorldObject::new(
            "yard gate",
            ObjectType::Door,
            Coordinate::new(3, 2, 0),
            Behavior::Door(DoorComponent {
                open: false,
                locked: true,
                key: Some(key.clone()),
            }),
        ),
    );

    assert!(step(&mut sim, spot, hero, Direction::East).is_err());
    assert!(matches!(
        sim.interact(spot, hero, door, None),
        Err(CoreError::World(WorldError::DoorLocked(_)))
    ));
    assert!(matches!(
        sim.interact(spot, hero, door, Some(key.clone())),
        Err(CoreError::ItemNotHeld { .. })
    ));

    sim.repositories_mut()
        .statuses
        .add_items(player, &[key.clone()])
        .unwrap();
    let outcome = sim.interact(spot, hero, door, Some(key)).unwrap();

    assert_eq!(outcome, InteractionOutcome::DoorToggled { open: true });
    let moved = step(&mut sim, spot, hero, Direction::East).unwrap();
    assert_eq!(moved.to, Coordinate::new(3, 2, 0));
}

#[test]
fn chest_is_emptied_once_into_the_inventory() {
    let (mut sim, spot, player, hero) = world_with(spot_map("vault"));
    let loot = vec![ItemId::new("health_potion"), ItemId::new("oak_log")];
    let chest = place(
        &mut sim,
        spot,
        WorldObject::new(
            "old chest",
            ObjectType::Chest,
            Coordinate::new(2, 3, 0),
            Behavior::Chest(ChestComponent {
                opened: false,
                contents: loot.clone(),
            }),
        ),
    );
    let distant = place(
        &mut sim,
        spot,
        WorldObject::new(
            "far chest",
            ObjectType::Chest,
            Coordinate::new(5, 5, 0),
            Behavior::Chest(ChestComponent {
                opened: false,
                contents: Vec::new(),
            }),
        ),
    );

    assert!(matches!(
        sim.interact(spot, hero, distant, None),
        Err(CoreError::NotAdjacent { .. })
    ));
    let outcome = sim.interact(spot, hero, chest, None).unwrap();
    assert_eq!(outcome, InteractionOutcome::ChestOpened { items: loot });
    let statuses = &sim.repositories().statuses;
    assert!(statuses.has_item(player, &ItemId::new("health_potion")).unwrap());
    assert!(statuses.has_item(player, &ItemId::new("oak_log")).unwrap());

    assert!(matches!(
        sim.interact(spot, hero, chest, None),
        Err(CoreError::World(WorldError::ChestAlreadyOpened(_)))
    ));
}

// ---------------------------------------------------------------------------
// Harvesting
// ---------------------------------------------------------------------------

#[test]
fn harvest_needs_the_right_tool_and_pays_out_when_due() {
    let (mut sim, spot, player, hero) = world_with(spot_map("grove"));
    let tree = place(
        &mut sim,
        spot,
        WorldObject::new(
            "oak",
            ObjectType::Resource,
            Coordinate::new(1, 2, 0),
            Behavior::Harvestable(HarvestableComponent::new(
                LootTableId::new("oak_tree"),
                3,
                0,
                Some(ToolCategory::Axe),
                3,
            )),
        ),
    );

    assert!(matches!(
        sim.start_harvest(spot, hero, tree),
        Err(CoreError::MissingTool {
            tool: ToolCategory::Axe,
            ..
        })
    ));
    sim.repositories_mut()
        .statuses
        .add_items(player, &[ItemId::new("iron_axe")])
        .unwrap();

    assert_eq!(sim.start_harvest(spot, hero, tree).unwrap(), 3);
    assert!(step(&mut sim, spot, hero, Direction::East).unwrap_err().is_precondition());
    assert!(matches!(
        sim.start_harvest(spot, hero, tree),
        Err(CoreError::World(WorldError::ActorBusy { .. }))
    ));

    assert_eq!(sim.run_tick().unwrap().harvests, 0);
    assert_eq!(sim.run_tick().unwrap().harvests, 0);
    assert_eq!(sim.run_tick().unwrap().harvests, 1);

    let repos = sim.repositories();
    assert!(repos.statuses.has_item(player, &ItemId::new("oak_log")).unwrap());
    let Behavior::Harvestable(node) = &repos.map(spot).unwrap().get_object(tree).unwrap().behavior
    else {
        panic!("tree lost its harvestable role");
    };
    assert_eq!(node.current_quantity(sim.tick()), 2);
    assert!(node.harvester.is_none());
}

// ---------------------------------------------------------------------------
// Sanctuaries
// ---------------------------------------------------------------------------

#[test]
fn sanctuary_protects_only_those_inside() {
    let mut map = spot_map("shrine");
    map.add_zone(LocationZone {
        name: String::from("shrine"),
        area: Area::new(START, Shape::Square { radius: 1 }),
        kind: ZoneKind::Sanctuary,
    });
    let (mut sim, spot, inside, _) = world_with(map);
    let outside_at = Coordinate::new(5, 5, 0);
    let (outside, _) = sim.register_player("Bo", spot, outside_at).unwrap();

    for at in [START, outside_at] {
        let hitbox = HitBox::new(spot, ObjectId::new(), Side::Monster, Shape::Point, at, 1, 1)
            .with_attacker_stats(CombatStats::offense_defense(500, 0));
        sim.repositories_mut().hitboxes.insert(hitbox).unwrap();
    }
    let summary = sim.run_tick().unwrap();

    assert_eq!(summary.hits, 2);
    assert_eq!(summary.damage_events, 1);
    assert_eq!(summary.players_downed, 1);
    let statuses = &sim.repositories().statuses;
    assert_eq!(statuses.get(inside).unwrap().hp, 100);
    assert!(statuses.get(outside).unwrap().downed);
}

// ---------------------------------------------------------------------------
// Skill decks
// ---------------------------------------------------------------------------

#[test]
fn deck_changes_respect_the_equip_rules() {
    let (mut sim, _, _, hero) = world_with(spot_map("study"));
    let slash = SkillId::new("slash");

    assert!(matches!(
        sim.equip_skill(hero, SkillTier::Normal, 2, &SkillId::new("firebolt")),
        Err(CoreError::Combat(CombatError::AlreadyEquipped { .. }))
    ));
    assert!(matches!(
        sim.equip_skill(hero, SkillTier::Normal, 2, &SkillId::new("meteor")),
        Err(CoreError::Combat(CombatError::AwakenedOnly(_)))
    ));
    assert_eq!(
        sim.unequip_skill(hero, SkillTier::Normal, 0).unwrap(),
        Some(slash.clone())
    );
    assert_eq!(
        sim.equip_skill(hero, SkillTier::Normal, 0, &SkillId::new("cleave"))
            .unwrap(),
        None
    );
    assert_eq!(
        sim.equip_skill(hero, SkillTier::Awakened, 0, &SkillId::new("meteor"))
            .unwrap(),
        None
    );

    let loadout = sim.repositories().loadout(hero).unwrap();
    assert_eq!(loadout.deck(SkillTier::Normal).total_cost(), 4);
    assert!(loadout.find(&slash).is_none());
}
