//! Range and field-of-view tests for autonomous actors.

use hollowreach_types::{Coordinate, Direction, Weather};

/// Slack for cone edges that land exactly on the boundary.
const ANGLE_EPSILON: f64 = 1e-9;

/// Vision range after weather. Fog divides it, never below one cell.
pub fn effective_vision_range(range: u32, weather: Weather) -> u32 {
    if range == 0 {
        return 0;
    }
    range
        .checked_div(weather.vision_divisor())
        .unwrap_or(range)
        .max(1)
}

/// Whether an observer at `observer` facing `facing` with a field of view
/// of `fov_degrees` and a vision radius of `range` cells sees `target`.
///
/// Vision is circular on the observer's layer. A target on the observer's
/// own cell is always visible. A field of view of 360 degrees or more sees
/// in every direction.
pub fn can_see(
    observer: Coordinate,
    facing: Direction,
    fov_degrees: u32,
    range: u32,
    target: Coordinate,
) -> bool {
    if observer.z != target.z {
        return false;
    }
    let range = u64::from(range);
    if observer.planar_distance_squared(target) > range.saturating_mul(range) {
        return false;
    }
    if observer == target || fov_degrees >= 360 {
        return true;
    }
    let dx = f64::from(target.x) - f64::from(observer.x);
    let dy = f64::from(target.y) - f64::from(observer.y);
    let bearing = dy.atan2(dx).to_degrees();
    let offset = (bearing - facing.heading_degrees() + 180.0).rem_euclid(360.0) - 180.0;
    offset.abs() <= f64::from(fov_degrees) / 2.0 + ANGLE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Coordinate = Coordinate::new(5, 5, 0);

    #[test]
    fn targets_behind_a_narrow_cone_are_hidden() {
        let ahead = Coordinate::new(5, 8, 0);
        let behind = Coordinate::new(5, 2, 0);
        assert!(can_see(ORIGIN, Direction::North, 90, 5, ahead));
        assert!(!can_see(ORIGIN, Direction::North, 90, 5, behind));
        assert!(can_see(ORIGIN, Direction::South, 90, 5, behind));
    }

    #[test]
    fn cone_edges_are_inclusive() {
        let diagonal = Coordinate::new(7, 7, 0);
        assert!(can_see(ORIGIN, Direction::North, 90, 5, diagonal));
        assert!(!can_see(ORIGIN, Direction::North, 60, 5, diagonal));
    }

    #[test]
    fn range_and_layer_limit_sight() {
        assert!(!can_see(ORIGIN, Direction::East, 360, 3, Coordinate::new(9, 5, 0)));
        assert!(can_see(ORIGIN, Direction::East, 360, 4, Coordinate::new(9, 5, 0)));
        assert!(!can_see(ORIGIN, Direction::East, 360, 9, Coordinate::new(6, 5, 1)));
    }

    #[test]
    fn fog_halves_vision() {
        assert_eq!(effective_vision_range(6, Weather::Fog), 3);
        assert_eq!(effective_vision_range(6, Weather::Rain), 6);
        assert_eq!(effective_vision_range(1, Weather::Fog), 1);
    }
}
