//! Default two-spot starting world.
//!
//! - **Greenmeadow** (temperate, 16x12): grass with an east-west road, a
//!   copse of oaks, a pond, a walled yard with a door and a chest, and a
//!   sanctuary shrine around the player entry point.
//! - **Mirehollow** (marsh, 10x8): swampy ground with a herb patch.
//!
//! A gateway at the east end of the road leads to Mirehollow and one at
//! Mirehollow's west edge leads back.

use hollowreach_types::{
    Area, Climate, Coordinate, ItemId, LootTableId, ObjectType, Shape, SpotId, TerrainType,
    ToolCategory, ZoneKind,
};

use crate::error::WorldError;
use crate::harvestable::HarvestableComponent;
use crate::map::PhysicalMap;
use crate::object::{Behavior, ChestComponent, DoorComponent, WorldObject};
use crate::tile::Tile;
use crate::zone::{Gateway, LocationZone};

/// The starting maps plus the cells other systems need to know about.
#[derive(Debug, Clone)]
pub struct StartingWorld {
    /// Greenmeadow.
    pub meadow: PhysicalMap,
    /// Mirehollow.
    pub hollow: PhysicalMap,
    /// Where new players appear.
    pub player_entry: (SpotId, Coordinate),
    /// Where monsters are seeded.
    pub monster_sites: Vec<(SpotId, Coordinate)>,
}

/// Build the starting world. `seed` drives each spot's weather.
pub fn create_starting_world(seed: u64) -> Result<StartingWorld, WorldError> {
    let meadow_id = SpotId::new();
    let hollow_id = SpotId::new();

    let meadow = build_meadow(meadow_id, hollow_id, seed)?;
    let hollow = build_hollow(hollow_id, meadow_id, seed.wrapping_add(1))?;

    Ok(StartingWorld {
        meadow,
        hollow,
        player_entry: (meadow_id, Coordinate::new(2, 2, 0)),
        monster_sites: vec![
            (meadow_id, Coordinate::new(12, 3, 0)),
            (meadow_id, Coordinate::new(9, 10, 0)),
            (hollow_id, Coordinate::new(6, 5, 0)),
        ],
    })
}

fn build_meadow(id: SpotId, hollow: SpotId, seed: u64) -> Result<PhysicalMap, WorldError> {
    let mut map = PhysicalMap::new(id, "Greenmeadow", Climate::Temperate, seed);
    map.fill(16, 12, 0, TerrainType::Grass);

    for x in 0..16 {
        map.set_tile(Tile::new(Coordinate::new(x, 5, 0), TerrainType::Road));
    }
    for x in 2..5 {
        for y in 8..11 {
            map.set_tile(Tile::new(Coordinate::new(x, y, 0), TerrainType::Forest));
        }
    }
    for x in 11..13 {
        for y in 8..10 {
            map.set_tile(Tile::new(Coordinate::new(x, y, 0), TerrainType::DeepWater));
        }
    }
    // Walled yard: x = 6..=9, y = 0..=3, door on the north wall.
    for x in 6..10 {
        map.set_tile(Tile::new(Coordinate::new(x, 3, 0), TerrainType::Wall));
    }
    for y in 0..3 {
        map.set_tile(Tile::new(Coordinate::new(6, y, 0), TerrainType::Wall));
        map.set_tile(Tile::new(Coordinate::new(9, y, 0), TerrainType::Wall));
    }
    map.set_tile(Tile::new(Coordinate::new(7, 3, 0), TerrainType::Road));

    map.add_object(WorldObject::new(
        "yard gate",
        ObjectType::Door,
        Coordinate::new(7, 3, 0),
        Behavior::Door(DoorComponent {
            open: false,
            locked: true,
            key: Some(ItemId::new("yard_key")),
        }),
    ))?;
    map.add_object(WorldObject::new(
        "supply chest",
        ObjectType::Chest,
        Coordinate::new(8, 1, 0),
        Behavior::Chest(ChestComponent {
            opened: false,
            contents: vec![ItemId::new("health_potion"), ItemId::new("iron_axe")],
        }),
    ))?;
    map.add_object(WorldObject::new(
        "old oak",
        ObjectType::Resource,
        Coordinate::new(3, 9, 0),
        Behavior::Harvestable(HarvestableComponent::new(
            LootTableId::new("oak_tree"),
            3,
            50,
            Some(ToolCategory::Axe),
            4,
        )),
    ))?;

    map.add_zone(LocationZone {
        name: String::from("Wayshrine"),
        area: Area::new(Coordinate::new(2, 2, 0), Shape::Square { radius: 1 }),
        kind: ZoneKind::Sanctuary,
    });
    map.add_zone(LocationZone {
        name: String::from("Meadow"),
        area: Area::new(Coordinate::new(8, 6, 0), Shape::Square { radius: 8 }),
        kind: ZoneKind::Wilderness,
    });
    map.add_gateway(Gateway {
        name: String::from("Mire path"),
        area: Area::new(Coordinate::new(15, 5, 0), Shape::Point),
        target_spot: hollow,
        target_coordinate: Coordinate::new(1, 1, 0),
    });
    Ok(map)
}

fn build_hollow(id: SpotId, meadow: SpotId, seed: u64) -> Result<PhysicalMap, WorldError> {
    let mut map = PhysicalMap::new(id, "Mirehollow", Climate::Marsh, seed);
    map.fill(10, 8, 0, TerrainType::Swamp);
    for x in 0..4 {
        map.set_tile(Tile::new(Coordinate::new(x, 1, 0), TerrainType::Sand));
    }
    map.set_tile(Tile::new(Coordinate::new(8, 6, 0), TerrainType::ShallowWater));

    map.add_object(WorldObject::new(
        "bogroot patch",
        ObjectType::Resource,
        Coordinate::new(7, 2, 0),
        Behavior::Harvestable(HarvestableComponent::new(
            LootTableId::new("bog_herbs"),
            5,
            20,
            Some(ToolCategory::Sickle),
            2,
        )),
    ))?;
    map.add_gateway(Gateway {
        name: String::from("Meadow path"),
        area: Area::new(Coordinate::new(0, 1, 0), Shape::Point),
        target_spot: meadow,
        target_coordinate: Coordinate::new(14, 5, 0),
    });
    Ok(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gateways_link_both_spots() {
        let world = create_starting_world(42).unwrap();
        let out = world.meadow.get_all_gateways().first().unwrap();
        let back = world.hollow.get_all_gateways().first().unwrap();
        assert_eq!(out.target_spot, world.hollow.spot());
        assert_eq!(back.target_spot, world.meadow.spot());
        assert!(world.hollow.is_cell_free(out.target_coordinate));
        assert!(world.meadow.is_cell_free(back.target_coordinate));
    }

    #[test]
    fn entry_is_a_free_sanctuary_cell() {
        let world = create_starting_world(42).unwrap();
        let (spot, entry) = world.player_entry;
        assert_eq!(spot, world.meadow.spot());
        assert!(world.meadow.is_sanctuary(entry));
        assert!(world.meadow.is_cell_free(entry));
    }

    #[test]
    fn monster_sites_are_free() {
        let world = create_starting_world(42).unwrap();
        for (spot, site) in &world.monster_sites {
            let map = if *spot == world.meadow.spot() {
                &world.meadow
            } else {
                &world.hollow
            };
            assert!(map.is_cell_free(*site));
            assert!(!map.is_sanctuary(*site));
        }
    }
}
