//! Spatial primitives: integer coordinates, facings, vectors and shapes.
//!
//! The world is a 3D integer grid. Shapes are always evaluated on the
//! z-plane of their origin. Local offsets (skill spawn offsets, projectile
//! velocities) are expressed in an actor-relative frame where `+y` is
//! forward and `+x` is to the actor's right; [`Vector::rotated`] maps them
//! into world space for a given [`Direction`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// An integer position on the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// East-west axis (east is positive).
    pub x: i32,
    /// North-south axis (north is positive).
    pub y: i32,
    /// Vertical layer.
    pub z: i32,
}

impl Coordinate {
    /// Create a coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by a vector. Returns `None` on overflow.
    pub const fn translate(self, vector: Vector) -> Option<Self> {
        let Some(x) = self.x.checked_add(vector.dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add(vector.dy) else {
            return None;
        };
        let Some(z) = self.z.checked_add(vector.dz) else {
            return None;
        };
        Some(Self { x, y, z })
    }

    /// The neighbouring cell one step in `direction`.
    pub const fn step(self, direction: Direction) -> Option<Self> {
        self.translate(direction.unit_vector())
    }

    /// The vector from `self` to `other`, if representable.
    pub const fn delta_to(self, other: Self) -> Option<Vector> {
        let Some(dx) = other.x.checked_sub(self.x) else {
            return None;
        };
        let Some(dy) = other.y.checked_sub(self.y) else {
            return None;
        };
        let Some(dz) = other.z.checked_sub(self.z) else {
            return None;
        };
        Some(Vector { dx, dy, dz })
    }

    /// Manhattan distance across all three axes.
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z))
    }

    /// Chebyshev (king-move) distance on the horizontal plane, or
    /// `u32::MAX` when the coordinates are on different layers.
    pub const fn planar_distance(self, other: Self) -> u32 {
        if self.z != other.z {
            return u32::MAX;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Squared Euclidean distance on the horizontal plane.
    pub fn planar_distance_squared(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Whether `other` is one orthogonal step away on the same layer.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.z == other.z && self.manhattan_distance(other) == 1
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Vector
// ---------------------------------------------------------------------------

/// A displacement on the grid, used for offsets and per-tick velocities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    /// East-west component.
    pub dx: i32,
    /// North-south component.
    pub dy: i32,
    /// Vertical component.
    pub dz: i32,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Self = Self { dx: 0, dy: 0, dz: 0 };

    /// Create a vector.
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Whether every component is zero.
    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0 && self.dz == 0
    }

    /// Multiply every component by `factor`. Returns `None` on overflow.
    pub fn scaled(self, factor: u64) -> Option<Self> {
        let factor = i32::try_from(factor).ok()?;
        Some(Self {
            dx: self.dx.checked_mul(factor)?,
            dy: self.dy.checked_mul(factor)?,
            dz: self.dz.checked_mul(factor)?,
        })
    }

    /// Map an actor-relative vector (`+y` forward, `+x` right) into world
    /// space for an actor facing `facing`.
    pub const fn rotated(self, facing: Direction) -> Self {
        let (dx, dy) = match facing {
            Direction::North => (self.dx, self.dy),
            Direction::East => (self.dy, self.dx.saturating_neg()),
            Direction::South => (self.dx.saturating_neg(), self.dy.saturating_neg()),
            Direction::West => (self.dy.saturating_neg(), self.dx),
        };
        Self {
            dx,
            dy,
            dz: self.dz,
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the four cardinal facings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards `+y`.
    #[default]
    North,
    /// Towards `+x`.
    East,
    /// Towards `-y`.
    South,
    /// Towards `-x`.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The unit step for this direction.
    pub const fn unit_vector(self) -> Vector {
        match self {
            Self::North => Vector::new(0, 1, 0),
            Self::East => Vector::new(1, 0, 0),
            Self::South => Vector::new(0, -1, 0),
            Self::West => Vector::new(-1, 0, 0),
        }
    }

    /// The direction pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Rotate an actor-relative direction into world space for `facing`.
    pub const fn rotated(self, facing: Self) -> Self {
        let turns = self.clockwise_index().wrapping_add(facing.clockwise_index()) & 3;
        match turns {
            0 => Self::North,
            1 => Self::East,
            2 => Self::South,
            _ => Self::West,
        }
    }

    const fn clockwise_index(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// The dominant cardinal direction of a planar delta. Horizontal wins
    /// ties. Returns `None` for a zero delta.
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.unsigned_abs() >= dy.unsigned_abs() {
            if dx > 0 { Some(Self::East) } else { Some(Self::West) }
        } else if dy > 0 {
            Some(Self::North)
        } else {
            Some(Self::South)
        }
    }

    /// The facing from `from` towards `to`, if they differ on the plane.
    pub const fn toward(from: Coordinate, to: Coordinate) -> Option<Self> {
        match from.delta_to(to) {
            Some(delta) => Self::from_delta(delta.dx, delta.dy),
            None => None,
        }
    }

    /// Heading in degrees, counter-clockwise from east.
    pub const fn heading_degrees(self) -> f64 {
        match self {
            Self::East => 0.0,
            Self::North => 90.0,
            Self::West => 180.0,
            Self::South => 270.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A planar footprint anchored at an origin cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Only the origin cell.
    Point,
    /// `length` cells starting at the origin and extending in `direction`.
    /// A length of zero covers the origin cell only.
    Line {
        /// Direction the line extends in.
        direction: Direction,
        /// Number of cells covered.
        length: u32,
    },
    /// All cells within Chebyshev distance `radius`.
    Square {
        /// Half-width of the square.
        radius: u32,
    },
    /// All cells within Euclidean distance `radius`.
    Circle {
        /// Radius in cells.
        radius: u32,
    },
}

impl Shape {
    /// Whether `point` lies inside this shape anchored at `origin`.
    pub fn contains(self, origin: Coordinate, point: Coordinate) -> bool {
        if origin.z != point.z {
            return false;
        }
        match self {
            Self::Point => origin == point,
            Self::Line { direction, length } => {
                let Some(delta) = origin.delta_to(point) else {
                    return false;
                };
                let unit = direction.unit_vector();
                // Component along the line must be in [0, len) and the
                // perpendicular component zero.
                let (along, across) = if unit.dx == 0 {
                    (delta.dy.saturating_mul(unit.dy), delta.dx)
                } else {
                    (delta.dx.saturating_mul(unit.dx), delta.dy)
                };
                let cells = length.max(1);
                across == 0 && along >= 0 && along.unsigned_abs() < cells
            }
            Self::Square { radius } => origin.planar_distance(point) <= radius,
            Self::Circle { radius } => {
                let r = u64::from(radius);
                origin.planar_distance_squared(point) <= r.saturating_mul(r)
            }
        }
    }

    /// Rotate an actor-relative shape into world space for `facing`.
    pub const fn rotated(self, facing: Direction) -> Self {
        match self {
            Self::Line { direction, length } => Self::Line {
                direction: direction.rotated(facing),
                length,
            },
            other => other,
        }
    }
}

/// A shape anchored at a concrete coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    /// Anchor cell.
    pub origin: Coordinate,
    /// Footprint around the anchor.
    pub shape: Shape,
}

impl Area {
    /// Create an area.
    pub const fn new(origin: Coordinate, shape: Shape) -> Self {
        Self { origin, shape }
    }

    /// Whether `point` lies inside the area.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.shape.contains(self.origin, point)
    }
}
