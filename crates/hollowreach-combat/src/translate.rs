//! Auto-aim and skill-to-hitbox translation.

use hollowreach_types::{
    CombatStats, Coordinate, Direction, ObjectId, PlayerId, Side, SpotId,
};
use hollowreach_world::{PhysicalMap, WorldObject};

use crate::error::CombatError;
use crate::hitbox::HitBox;
use crate::skill::SkillSpec;

/// Everything translation needs to know about the caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasterView {
    /// Caster object.
    pub object: ObjectId,
    /// Player behind the caster.
    pub player: Option<PlayerId>,
    /// Caster's side.
    pub side: Side,
    /// Caster's cell.
    pub position: Coordinate,
    /// Caster's facing.
    pub facing: Direction,
    /// Caster's effective stats at cast time.
    pub stats: CombatStats,
}

/// Pick the facing towards the nearest hostile actor within `range`
/// (Manhattan distance on the caster's layer), ties broken by id.
///
/// Returns `None` when nothing is in range, leaving the caster's facing
/// unchanged.
pub fn auto_aim(caster: &CasterView, map: &PhysicalMap, range: u32) -> Option<Direction> {
    let valid = |object: &WorldObject| -> Option<(u32, ObjectId, Coordinate)> {
        let actor = object.actor()?;
        if object.id == caster.object || !caster.side.is_hostile_to(actor.side) {
            return None;
        }
        if object.coordinate.z != caster.position.z {
            return None;
        }
        let distance = caster.position.manhattan_distance(object.coordinate);
        (distance <= range && distance > 0).then_some((distance, object.id, object.coordinate))
    };

    let (_, _, target) = map
        .objects()
        .filter_map(valid)
        .min_by_key(|&(distance, id, _)| (distance, id))?;
    Direction::toward(caster.position, target)
}

/// Turn a used skill into hitboxes, one per hit-pattern segment.
///
/// Segment `i` activates at `use_tick + start_offset_ticks`, spawns at the
/// caster's position plus the spawn offset rotated by `facing`, moves with
/// the rotated velocity, and carries `skill power * segment power` and a
/// snapshot of the caster's stats.
pub fn translate_skill(
    spec: &SkillSpec,
    caster: &CasterView,
    spot: SpotId,
    use_tick: u64,
) -> Result<Vec<HitBox>, CombatError> {
    spec.hit_pattern
        .iter()
        .map(|segment| {
            let start = use_tick
                .checked_add(segment.start_offset_ticks)
                .ok_or(CombatError::ArithmeticOverflow)?;
            let origin = caster
                .position
                .translate(segment.spawn_offset.rotated(caster.facing))
                .ok_or(CombatError::ArithmeticOverflow)?;
            let power = spec
                .power_multiplier
                .checked_mul(segment.power_multiplier)
                .ok_or(CombatError::ArithmeticOverflow)?;
            Ok(HitBox::new(
                spot,
                caster.object,
                caster.side,
                segment.shape.rotated(caster.facing),
                origin,
                start,
                segment.duration_ticks,
            )
            .with_velocity(segment.velocity.rotated(caster.facing))
            .with_power(power)
            .with_attacker_stats(caster.stats)
            .with_owner_player(caster.player)
            .with_skill(spec.id.clone(), spec.element))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hollowreach_types::{
        Climate, Element, MonsterId, ObjectType, ResourceCost, Race, Shape, SkillId, TerrainType,
        Vector,
    };
    use hollowreach_world::{ActorComponent, Behavior};
    use rust_decimal::Decimal;

    use super::*;
    use crate::skill::HitSegment;

    fn bolt() -> SkillSpec {
        SkillSpec {
            id: SkillId::new("bolt"),
            name: String::from("Bolt"),
            element: Element::Wind,
            deck_cost: 1,
            cast_lock_ticks: 1,
            cooldown_ticks: 3,
            power_multiplier: Decimal::new(15, 1),
            hit_pattern: vec![
                HitSegment {
                    start_offset_ticks: 0,
                    duration_ticks: 1,
                    shape: Shape::Line {
                        direction: Direction::North,
                        length: 2,
                    },
                    velocity: Vector::ZERO,
                    spawn_offset: Vector::new(0, 1, 0),
                    power_multiplier: Decimal::ONE,
                },
                HitSegment {
                    start_offset_ticks: 2,
                    duration_ticks: 4,
                    shape: Shape::Point,
                    velocity: Vector::new(0, 1, 0),
                    spawn_offset: Vector::new(1, 1, 0),
                    power_multiplier: Decimal::TWO,
                },
            ],
            cost: ResourceCost::FREE,
            targeting_range: 4,
            awakened_only: false,
        }
    }

    fn caster(facing: Direction) -> CasterView {
        CasterView {
            object: ObjectId::new(),
            player: None,
            side: Side::Player,
            position: Coordinate::new(5, 5, 0),
            facing,
            stats: CombatStats::offense_defense(40, 5),
        }
    }

    #[test]
    fn segments_become_rotated_hitboxes() {
        let spot = SpotId::new();
        let hitboxes = translate_skill(&bolt(), &caster(Direction::East), spot, 10).unwrap();
        assert_eq!(hitboxes.len(), 2);

        let first = hitboxes.first().unwrap();
        assert_eq!(first.start_tick, 10);
        assert_eq!(first.origin, Coordinate::new(6, 5, 0));
        assert_eq!(
            first.shape,
            Shape::Line {
                direction: Direction::East,
                length: 2
            }
        );
        assert_eq!(first.power_multiplier, Decimal::new(15, 1));

        let second = hitboxes.get(1).unwrap();
        assert_eq!(second.start_tick, 12);
        // Forward one, right one, facing east: (+1, -1).
        assert_eq!(second.origin, Coordinate::new(6, 4, 0));
        assert_eq!(second.velocity, Vector::new(1, 0, 0));
        assert_eq!(second.power_multiplier, Decimal::new(3, 0));
        assert_eq!(second.attacker_stats().map(|s| s.attack), Some(40));
        assert_eq!(second.skill, Some(SkillId::new("bolt")));
    }

    fn map_with_monsters(at: &[Coordinate]) -> (PhysicalMap, Vec<ObjectId>) {
        let mut map = PhysicalMap::new(SpotId::new(), "aim", Climate::Temperate, 0);
        map.fill(12, 12, 0, TerrainType::Grass);
        let mut ids = Vec::new();
        for &coordinate in at {
            let monster = WorldObject::new(
                "slime",
                ObjectType::Monster,
                coordinate,
                Behavior::Actor(ActorComponent::monster(MonsterId::new(), Race::Slime, 90)),
            );
            ids.push(monster.id);
            map.add_object(monster).unwrap();
        }
        (map, ids)
    }

    #[test]
    fn auto_aim_faces_nearest_in_range() {
        let (map, _) = map_with_monsters(&[Coordinate::new(5, 8, 0), Coordinate::new(3, 5, 0)]);
        let facing = auto_aim(&caster(Direction::East), &map, 4);
        assert_eq!(facing, Some(Direction::West));
    }

    #[test]
    fn auto_aim_breaks_distance_ties_by_id() {
        let (map, ids) = map_with_monsters(&[Coordinate::new(5, 7, 0), Coordinate::new(3, 5, 0)]);
        let north = *ids.first().unwrap();
        let west = *ids.get(1).unwrap();
        let expected = if north < west { Direction::North } else { Direction::West };
        assert_eq!(auto_aim(&caster(Direction::East), &map, 4), Some(expected));
    }

    #[test]
    fn auto_aim_ignores_objects_outside_range() {
        let (map, _) = map_with_monsters(&[Coordinate::new(5, 10, 0), Coordinate::new(9, 5, 0)]);
        assert_eq!(auto_aim(&caster(Direction::South), &map, 4), Some(Direction::East));
    }

    #[test]
    fn auto_aim_without_targets_keeps_facing() {
        let (map, _) = map_with_monsters(&[Coordinate::new(11, 11, 0)]);
        assert_eq!(auto_aim(&caster(Direction::East), &map, 4), None);
    }
}
