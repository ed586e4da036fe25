//! Waypoints: the passive nodes a vehicle path is made of

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{Position, STOP_BRAKING_RADIUS};

/// Longest a vehicle may be told to wait at a STOP waypoint
pub const MAX_WAIT_SECS: f32 = 10.0;

/// Behaviour of a waypoint when a vehicle reaches it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaypointKind {
    /// Pass straight through
    #[default]
    Default,
    /// Brake early and optionally wait before continuing
    Stop,
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaypointKind::Default => f.write_str("DEFAULT"),
            WaypointKind::Stop => f.write_str("STOP"),
        }
    }
}

/// A fixed point along a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub kind: WaypointKind,
    #[serde(default, deserialize_with = "deserialize_wait")]
    wait_secs: f32,
}

fn clamp_wait(secs: f32) -> f32 {
    if secs.is_finite() {
        secs.clamp(0.0, MAX_WAIT_SECS)
    } else {
        0.0
    }
}

fn deserialize_wait<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    f32::deserialize(deserializer).map(clamp_wait)
}

impl Waypoint {
    pub fn new(position: Position, kind: WaypointKind) -> Self {
        Self {
            name: String::new(),
            position,
            kind,
            wait_secs: 0.0,
        }
    }

    /// A pass-through waypoint
    pub fn pass(position: Position) -> Self {
        Self::new(position, WaypointKind::Default)
    }

    /// A STOP waypoint that holds the vehicle for `wait_secs`
    pub fn stop(position: Position, wait_secs: f32) -> Self {
        Self::new(position, WaypointKind::Stop).with_wait(wait_secs)
    }

    /// Set the wait time, clamped to `[0, MAX_WAIT_SECS]`
    pub fn with_wait(mut self, wait_secs: f32) -> Self {
        self.wait_secs = clamp_wait(wait_secs);
        self
    }

    pub fn set_wait(&mut self, wait_secs: f32) {
        self.wait_secs = clamp_wait(wait_secs);
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn wait_secs(&self) -> f32 {
        self.wait_secs
    }

    /// Planar distance under which the waypoint counts as reached
    pub fn stopping_radius(&self, default_radius: f32) -> f32 {
        match self.kind {
            WaypointKind::Default => default_radius,
            WaypointKind::Stop => STOP_BRAKING_RADIUS,
        }
    }
}
