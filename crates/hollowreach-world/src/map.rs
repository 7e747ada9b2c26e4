//! The physical map aggregate.
//!
//! A [`PhysicalMap`] owns one spot's tiles, every object placed on it,
//! gateways to other spots, location zones and the weather. It is the only
//! writer of object coordinates. Movement throttles each object through a
//! `busy_until` tick, so an object never has two steps in flight.

use std::collections::BTreeMap;

use hollowreach_types::{
    Climate, Coordinate, Direction, MonsterId, ObjectId, PlayerId, Shape, SpotId, TerrainType,
    Weather, ZoneKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::WeatherSystem;
use crate::error::WorldError;
use crate::object::{MovementCapability, WorldObject};
use crate::tile::Tile;
use crate::zone::{Gateway, LocationZone};

/// What a successful [`PhysicalMap::move_object`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The moved object.
    pub object: ObjectId,
    /// Previous cell.
    pub from: Coordinate,
    /// New cell.
    pub to: Coordinate,
    /// Tick until which the object is busy.
    pub busy_until: u64,
    /// Stamina the step costs.
    pub stamina_cost: u32,
    /// Gateway under the new cell, if any.
    pub gateway: Option<Gateway>,
}

/// One spot's physical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalMap {
    spot: SpotId,
    name: String,
    climate: Climate,
    #[serde(with = "tile_list")]
    tiles: BTreeMap<Coordinate, Tile>,
    objects: BTreeMap<ObjectId, WorldObject>,
    gateways: Vec<Gateway>,
    zones: Vec<LocationZone>,
    weather: WeatherSystem,
}

impl PhysicalMap {
    /// Create an empty map.
    pub fn new(spot: SpotId, name: impl Into<String>, climate: Climate, seed: u64) -> Self {
        Self {
            spot,
            name: name.into(),
            climate,
            tiles: BTreeMap::new(),
            objects: BTreeMap::new(),
            gateways: Vec::new(),
            zones: Vec::new(),
            weather: WeatherSystem::new(seed),
        }
    }

    /// The spot id.
    pub const fn spot(&self) -> SpotId {
        self.spot
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Climate.
    pub const fn climate(&self) -> Climate {
        self.climate
    }

    // -----------------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------------

    /// Place or replace a tile.
    pub fn set_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.coordinate, tile);
    }

    /// Fill the rectangle `[0, width) x [0, height)` on layer `z`.
    pub fn fill(&mut self, width: i32, height: i32, z: i32, terrain: TerrainType) {
        for x in 0..width {
            for y in 0..height {
                self.set_tile(Tile::new(Coordinate::new(x, y, z), terrain));
            }
        }
    }

    /// The tile at `coordinate`.
    pub fn tile(&self, coordinate: Coordinate) -> Option<&Tile> {
        self.tiles.get(&coordinate)
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Place an object.
    ///
    /// Fails on a duplicate id, a missing or solid tile, or, for blocking
    /// objects, a cell already held by another blocking object.
    pub fn add_object(&mut self, object: WorldObject) -> Result<(), WorldError> {
        if self.objects.contains_key(&object.id) {
            return Err(WorldError::DuplicateObject(object.id));
        }
        let tile = self
            .tiles
            .get(&object.coordinate)
            .ok_or(WorldError::TileNotFound(object.coordinate))?;
        if tile.terrain.is_solid() {
            return Err(WorldError::InvalidPlacement {
                coordinate: object.coordinate,
                reason: format!("{:?} is solid", tile.terrain),
            });
        }
        if object.behavior.blocks_movement() && self.blocking_object_at(object.coordinate).is_some()
        {
            return Err(WorldError::InvalidPlacement {
                coordinate: object.coordinate,
                reason: String::from("cell occupied"),
            });
        }
        debug!(spot = %self.spot, object = %object.id, at = %object.coordinate, "object placed");
        self.objects.insert(object.id, object);
        Ok(())
    }

    /// Remove and return an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<WorldObject, WorldError> {
        let removed = self
            .objects
            .remove(&id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        debug!(spot = %self.spot, object = %id, "object removed");
        Ok(removed)
    }

    /// Look up an object.
    pub fn get_object(&self, id: ObjectId) -> Result<&WorldObject, WorldError> {
        self.objects.get(&id).ok_or(WorldError::ObjectNotFound(id))
    }

    /// Look up an object mutably. Coordinates must only be changed through
    /// [`Self::move_object`].
    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut WorldObject, WorldError> {
        self.objects
            .get_mut(&id)
            .ok_or(WorldError::ObjectNotFound(id))
    }

    /// Whether an object is on this map.
    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// All objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Ids of every autonomous object, in id order.
    pub fn autonomous_ids(&self) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|o| o.behavior.autonomous().is_some())
            .map(|o| o.id)
            .collect()
    }

    /// Objects standing at `coordinate`.
    pub fn objects_at(&self, coordinate: Coordinate) -> impl Iterator<Item = &WorldObject> {
        self.objects
            .values()
            .filter(move |o| o.coordinate == coordinate)
    }

    /// The blocking object at `coordinate`, if any.
    pub fn blocking_object_at(&self, coordinate: Coordinate) -> Option<&WorldObject> {
        self.objects_at(coordinate)
            .find(|o| o.behavior.blocks_movement())
    }

    /// Whether a blocking object could be placed at `coordinate`.
    pub fn is_cell_free(&self, coordinate: Coordinate) -> bool {
        self.tiles
            .get(&coordinate)
            .is_some_and(|t| !t.terrain.is_solid())
            && self.blocking_object_at(coordinate).is_none()
    }

    /// Actor objects whose cell lies inside `shape` anchored at `origin`.
    pub fn actors_in_shape(&self, shape: Shape, origin: Coordinate) -> Vec<&WorldObject> {
        self.objects
            .values()
            .filter(|o| o.actor().is_some() && shape.contains(origin, o.coordinate))
            .collect()
    }

    /// The map object representing a monster aggregate.
    pub fn find_monster(&self, monster: MonsterId) -> Option<&WorldObject> {
        self.objects
            .values()
            .find(|o| o.actor().and_then(|a| a.monster) == Some(monster))
    }

    /// The map object representing a player.
    pub fn find_player(&self, player: PlayerId) -> Option<&WorldObject> {
        self.objects
            .values()
            .find(|o| o.actor().and_then(|a| a.player) == Some(player))
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Step an object onto an adjacent cell at `tick` using `capability`.
    ///
    /// Fails with [`WorldError::ActorBusy`] while the previous action is
    /// still running, [`WorldError::TileNotFound`] off the grid and
    /// [`WorldError::InvalidMovement`] for non-adjacent, untraversable or
    /// occupied cells. On success the object faces the direction of travel
    /// and is busy for the terrain cost scaled by the speed modifier.
    pub fn move_object(
        &mut self,
        id: ObjectId,
        to: Coordinate,
        tick: u64,
        capability: &MovementCapability,
    ) -> Result<MoveOutcome, WorldError> {
        let object = self.get_object(id)?;
        if object.is_busy(tick) {
            return Err(WorldError::ActorBusy {
                object: id,
                busy_until: object.busy_until,
            });
        }
        let from = object.coordinate;
        if !from.is_adjacent(to) {
            return Err(WorldError::InvalidMovement {
                object: id,
                to,
                reason: String::from("destination is not adjacent"),
            });
        }
        let terrain = self
            .tiles
            .get(&to)
            .ok_or(WorldError::TileNotFound(to))?
            .terrain;
        if !capability.can_enter(terrain) {
            return Err(WorldError::InvalidMovement {
                object: id,
                to,
                reason: format!("cannot traverse {terrain:?}"),
            });
        }
        if let Some(blocker) = self.objects_at(to).find(|o| o.id != id && o.behavior.blocks_movement())
        {
            return Err(WorldError::InvalidMovement {
                object: id,
                to,
                reason: format!("cell occupied by {}", blocker.id),
            });
        }

        let step = capability.step_ticks(terrain, self.weather.current())?;
        let busy_until = tick
            .checked_add(step)
            .ok_or(WorldError::ArithmeticOverflow)?;
        let gateway = self.gateway_at(to).cloned();

        let object = self.get_object_mut(id)?;
        object.coordinate = to;
        object.busy_until = busy_until;
        if let Some(facing) = Direction::toward(from, to) {
            if let Some(actor) = object.behavior.actor_mut() {
                actor.direction = facing;
            }
        }

        debug!(spot = %self.spot, object = %id, %from, %to, busy_until, "object moved");
        Ok(MoveOutcome {
            object: id,
            from,
            to,
            busy_until,
            stamina_cost: terrain.stamina_cost(),
            gateway,
        })
    }

    /// Mark an object busy until `busy_until` (never shortens).
    pub fn set_busy_until(&mut self, id: ObjectId, busy_until: u64) -> Result<(), WorldError> {
        let object = self.get_object_mut(id)?;
        object.busy_until = object.busy_until.max(busy_until);
        Ok(())
    }

    /// Turn an actor to face `direction`.
    pub fn face(&mut self, id: ObjectId, direction: Direction) -> Result<(), WorldError> {
        let object = self.get_object_mut(id)?;
        let actor = object
            .behavior
            .actor_mut()
            .ok_or(WorldError::NotAnActor(id))?;
        actor.direction = direction;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Gateways and zones
    // -----------------------------------------------------------------------

    /// Add a gateway.
    pub fn add_gateway(&mut self, gateway: Gateway) {
        self.gateways.push(gateway);
    }

    /// All gateways.
    pub fn get_all_gateways(&self) -> &[Gateway] {
        &self.gateways
    }

    /// The gateway covering `coordinate`, if any.
    pub fn gateway_at(&self, coordinate: Coordinate) -> Option<&Gateway> {
        self.gateways.iter().find(|g| g.area.contains(coordinate))
    }

    /// Add a location zone.
    pub fn add_zone(&mut self, zone: LocationZone) {
        self.zones.push(zone);
    }

    /// Every zone covering `coordinate`.
    pub fn get_location_areas_at(&self, coordinate: Coordinate) -> Vec<&LocationZone> {
        self.zones
            .iter()
            .filter(|z| z.area.contains(coordinate))
            .collect()
    }

    /// Whether `coordinate` lies in a sanctuary zone.
    pub fn is_sanctuary(&self, coordinate: Coordinate) -> bool {
        self.zones
            .iter()
            .any(|z| z.kind == ZoneKind::Sanctuary && z.area.contains(coordinate))
    }

    // -----------------------------------------------------------------------
    // Weather
    // -----------------------------------------------------------------------

    /// Current weather.
    pub const fn weather(&self) -> Weather {
        self.weather.current()
    }

    /// Force the weather.
    pub const fn set_weather(&mut self, weather: Weather) {
        self.weather.set_current(weather);
    }

    /// Re-roll the weather when `tick` lands on `interval`. Returns
    /// `(previous, new)` if it changed.
    pub fn advance_weather(&mut self, tick: u64, interval: u64) -> Option<(Weather, Weather)> {
        if interval == 0 || tick.checked_rem(interval) != Some(0) {
            return None;
        }
        let climate = self.climate;
        self.weather.generate(tick, climate)
    }
}

/// Serializes the tile map as a plain list; coordinates cannot be JSON
/// object keys.
mod tile_list {
    use std::collections::BTreeMap;

    use hollowreach_types::Coordinate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::tile::Tile;

    pub fn serialize<S: Serializer>(
        tiles: &BTreeMap<Coordinate, Tile>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(tiles.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Coordinate, Tile>, D::Error> {
        let list = Vec::<Tile>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|t| (t.coordinate, t)).collect())
    }
}
