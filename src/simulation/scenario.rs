//! Scenario descriptions: everything needed to build a [`SimWorld`](super::SimWorld)
//!
//! Scenarios are plain data so they can be loaded from JSON files or built
//! in code. Every section except `name` may be omitted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::follower::FollowerConfig;
use super::game_state::ProgressionConfig;
use super::goals::{GoalData, Goals};
use super::traffic_light::{
    DetectorConfig, LightState, LightTimings, TrafficLightConfig, ViolationSignal,
    ViolationTrigger,
};
use super::types::Position;
use super::waypoint::Waypoint;

fn default_tag() -> String {
    "Player".to_string()
}

fn default_vehicle_size() -> Position {
    Position::new(2.0, 1.5, 4.0)
}

/// A vehicle and the path it follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDef {
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Collider extents (width, height, length)
    #[serde(default = "default_vehicle_size")]
    pub size: Position,
    #[serde(default)]
    pub follower: FollowerConfig,
    pub waypoints: Vec<Waypoint>,
}

/// A traffic light placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficLightDef {
    pub position: Position,
    /// Yaw in degrees; the detector ray points along the light's -right
    #[serde(default)]
    pub facing_deg: f32,
    #[serde(default)]
    pub config: TrafficLightConfig,
}

/// What a goal zone publishes when a tagged collider enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "event")]
pub enum ZoneSignal {
    /// `GOAL_REACHED`: the level is complete
    #[default]
    LevelComplete,
    /// `GOAL_COMPLETED` with this goal index
    Goal { goal_index: usize },
}

/// Trigger volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub center: Position,
    pub size: Position,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub signal: ZoneSignal,
}

/// Static collider that can block detection rays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDef {
    pub center: Position,
    pub size: Position,
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub vehicles: Vec<VehicleDef>,
    #[serde(default)]
    pub traffic_lights: Vec<TrafficLightDef>,
    #[serde(default)]
    pub goal_zones: Vec<ZoneDef>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default)]
    pub progression: ProgressionConfig,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scenario")
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid scenario file {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scenario")
    }

    /// A straight road with a stop line, one traffic light and one goal
    ///
    /// The car starts at z = -40, brakes for the stop line at z = -12,
    /// waits, crosses the light's detection ray at z = -8 and drives on
    /// to the finish zone at z = 40.
    pub fn demo() -> Self {
        Self {
            name: "Stop line and traffic light".to_string(),
            vehicles: vec![VehicleDef {
                tag: default_tag(),
                size: default_vehicle_size(),
                follower: FollowerConfig {
                    loop_path: false,
                    ..FollowerConfig::default()
                },
                waypoints: vec![
                    Waypoint::pass(Position::new(0.0, 0.0, -40.0)),
                    Waypoint::stop(Position::new(0.0, 0.0, -12.0), 3.0),
                    Waypoint::pass(Position::new(0.0, 0.0, 10.0)),
                    Waypoint::pass(Position::new(0.0, 0.0, 40.0)),
                ],
            }],
            traffic_lights: vec![TrafficLightDef {
                position: Position::new(4.0, 0.0, -8.0),
                facing_deg: 0.0,
                config: TrafficLightConfig {
                    timings: LightTimings::default(),
                    initial_state: LightState::Green,
                    detector: DetectorConfig {
                        ray_length: 10.0,
                        tag: default_tag(),
                        trigger: ViolationTrigger::Edge,
                        signal: ViolationSignal::RuleViolation,
                    },
                },
            }],
            goal_zones: vec![
                ZoneDef {
                    center: Position::new(0.0, 0.5, 5.0),
                    size: Position::new(8.0, 2.0, 2.0),
                    tag: default_tag(),
                    signal: ZoneSignal::Goal { goal_index: 0 },
                },
                ZoneDef {
                    center: Position::new(0.0, 0.5, 38.0),
                    size: Position::new(8.0, 2.0, 4.0),
                    tag: default_tag(),
                    signal: ZoneSignal::LevelComplete,
                },
            ],
            obstacles: vec![ObstacleDef {
                center: Position::new(-8.0, 1.0, -8.0),
                size: Position::new(1.0, 2.0, 1.0),
                tag: "Wall".to_string(),
            }],
            goals: Goals {
                title: "Crossing the junction".to_string(),
                goals: vec![GoalData::new("Cross the intersection", 25)],
            },
            progression: ProgressionConfig::default(),
        }
    }
}
