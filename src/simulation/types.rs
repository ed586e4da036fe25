//! Core types for the driving simulation
//!
//! These are standalone types that don't depend on Bevy.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

/// A wrapper type for traffic light IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub SimId);

/// A wrapper type for collider IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub SimId);

/// A 3D position in the simulation (Y is up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ZERO: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        (*other - *self).length()
    }

    /// Distance ignoring elevation
    pub fn planar_distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(&self) -> Position {
        let len = self.length();
        if len > f32::EPSILON {
            *self * (1.0 / len)
        } else {
            Position::ZERO
        }
    }

    pub fn with_y(&self, y: f32) -> Position {
        Position { y, ..*self }
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        *self + (*other - *self) * t
    }

    /// Step toward `target` by at most `max_delta` without overshooting
    pub fn move_towards(&self, target: &Position, max_delta: f32) -> Position {
        let offset = *target - *self;
        let dist = offset.length();
        if dist <= max_delta || dist <= f32::EPSILON {
            *target
        } else {
            *self + offset * (max_delta / dist)
        }
    }

    /// Calculate the angle from this position to another (Y-axis rotation)
    pub fn angle_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        let direction_len = (dx * dx + dz * dz).sqrt();
        if direction_len > 0.0 {
            (dx / direction_len).atan2(dz / direction_len)
        } else {
            0.0
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Position {
    type Output = Position;

    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<[f32; 3]> for Position {
    fn from(v: [f32; 3]) -> Self {
        Position::new(v[0], v[1], v[2])
    }
}

impl From<Position> for [f32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Forward vector for a yaw angle (radians, 0 faces +Z)
pub fn forward_from_yaw(yaw: f32) -> Position {
    Position::new(yaw.sin(), 0.0, yaw.cos())
}

/// Right-hand vector for a yaw angle (radians, 0 faces +Z so right is +X)
pub fn right_from_yaw(yaw: f32) -> Position {
    Position::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Signed shortest rotation from one yaw to another, in (-PI, PI]
pub fn shortest_yaw_delta(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut delta = (to - from) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }
    delta
}

/// Step a scalar toward `target` by at most `max_delta`
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(target - current)
    }
}

/// Position and yaw of a vehicle, written by the follower each tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleTransform {
    pub position: Position,
    /// Rotation about the Y axis in radians
    pub yaw: f32,
}

/// Stopping radius applied to STOP waypoints so vehicles brake early
pub const STOP_BRAKING_RADIUS: f32 = 5.0;

/// Below this speed a vehicle does not turn
pub const MIN_TURNING_SPEED: f32 = 0.1;

/// Height at which authored waypoints are placed
pub const DEFAULT_WAYPOINT_HEIGHT: f32 = 0.5;

/// Height of the red-light detection ray
pub const DETECTION_RAY_HEIGHT: f32 = 0.5;
