//! Minimal physics scene: tagged boxes with raycast and overlap queries
//!
//! Stands in for the engine's physics world so the simulation can run
//! headless. Anything implementing [`RaycastQuery`] can replace it.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{ColliderId, Position, SimId};

/// Result of a raycast
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub collider: ColliderId,
    pub tag: String,
    pub distance: f32,
    pub point: Position,
}

/// Engine query used by the red-light detector
pub trait RaycastQuery {
    /// Nearest hit along `direction` within `max_distance`, if any
    fn raycast(&self, origin: Position, direction: Position, max_distance: f32)
        -> Option<RayHit>;
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Position,
    pub max: Position,
}

impl Aabb {
    pub fn from_center_size(center: Position, size: Position) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Position {
        self.min.lerp(&self.max, 0.5)
    }

    pub fn size(&self) -> Position {
        self.max - self.min
    }

    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Entry distance of a ray (unit `direction`) into the box, slab method
    pub fn ray_distance(&self, origin: &Position, direction: &Position) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        let axes = [
            (origin.x, direction.x, self.min.x, self.max.x),
            (origin.y, direction.y, self.min.y, self.max.y),
            (origin.z, direction.z, self.min.z, self.max.z),
        ];
        for (o, d, lo, hi) in axes {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let (t0, t1) = {
                    let a = (lo - o) * inv;
                    let b = (hi - o) * inv;
                    if a <= b {
                        (a, b)
                    } else {
                        (b, a)
                    }
                };
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            }
        }
        Some(t_min)
    }
}

/// A tagged box in the physics scene
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub id: ColliderId,
    pub tag: String,
    pub bounds: Aabb,
}

/// All colliders in the scene
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    colliders: BTreeMap<ColliderId, Collider>,
    next_id: usize,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, bounds: Aabb) -> ColliderId {
        let id = ColliderId(SimId(self.next_id));
        self.next_id += 1;
        self.colliders.insert(
            id,
            Collider {
                id,
                tag: tag.into(),
                bounds,
            },
        );
        id
    }

    /// Move a collider so its box is centred on `center`
    pub fn set_center(&mut self, id: ColliderId, center: Position) -> bool {
        match self.colliders.get_mut(&id) {
            Some(collider) => {
                let size = collider.bounds.size();
                collider.bounds = Aabb::from_center_size(center, size);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        self.colliders.remove(&id)
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.values()
    }

    /// Colliders whose box intersects `bounds`
    pub fn overlapping<'a>(&'a self, bounds: &'a Aabb) -> impl Iterator<Item = &'a Collider> + 'a {
        self.colliders
            .values()
            .filter(move |c| c.bounds.intersects(bounds))
    }
}

impl RaycastQuery for ColliderSet {
    fn raycast(
        &self,
        origin: Position,
        direction: Position,
        max_distance: f32,
    ) -> Option<RayHit> {
        let direction = direction.normalized();
        if direction == Position::ZERO {
            return None;
        }

        self.colliders
            .values()
            .filter_map(|c| {
                c.bounds
                    .ray_distance(&origin, &direction)
                    .filter(|d| *d <= max_distance)
                    .map(|d| (d, c))
            })
            .min_by_key(|(d, _)| OrderedFloat(*d))
            .map(|(distance, c)| RayHit {
                collider: c.id,
                tag: c.tag.clone(),
                distance,
                point: origin + direction * distance,
            })
    }
}
