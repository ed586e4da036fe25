//! Standalone driving simulation module
//!
//! This module contains all the core simulation logic (waypoint following,
//! traffic lights, the event bus and the progression layer) that can run
//! independently of the Bevy game engine. It can be tested via console
//! without needing to boot up the full game.

mod event_bus;
mod follower;
mod game_state;
mod goals;
mod path;
mod physics;
mod rules;
mod scenario;
mod traffic_light;
mod types;
mod waypoint;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use event_bus::{
    BusEvent, Delivery, DispatchError, EventBus, EventKind, ExperienceGained, GoalCompleted,
    SubscriptionId, MAX_DISPATCH_DEPTH,
};
#[allow(unused_imports)]
pub use follower::{CarPathFollower, FollowerConfig, FollowerState, FollowerUpdate};
#[allow(unused_imports)]
pub use game_state::{ExperienceGain, GameSession, PlayerProgress, ProgressionConfig};
#[allow(unused_imports)]
pub use goals::{GoalData, GoalError, GoalTracker, GoalZone, Goals};
#[allow(unused_imports)]
pub use path::{Path, PathManager};
#[allow(unused_imports)]
pub use physics::{Aabb, Collider, ColliderSet, RayHit, RaycastQuery};
#[allow(unused_imports)]
pub use rules::{MessageType, RuleId, ScenarioRule, ScenarioRules};
#[allow(unused_imports)]
pub use scenario::{ObstacleDef, Scenario, TrafficLightDef, VehicleDef, ZoneDef, ZoneSignal};
#[allow(unused_imports)]
pub use traffic_light::{
    DetectionContext, DetectorConfig, IndicatorPanel, LampColor, LightState, LightTick,
    LightTimings, TrafficLight, TrafficLightConfig, ViolationSignal, ViolationTrigger,
    LAMP_GREEN, LAMP_INACTIVE, LAMP_ORANGE, LAMP_RED,
};
#[allow(unused_imports)]
pub use types::{
    forward_from_yaw, move_towards, right_from_yaw, shortest_yaw_delta, ColliderId, LightId,
    Position, SimId, VehicleId, VehicleTransform, DEFAULT_WAYPOINT_HEIGHT, DETECTION_RAY_HEIGHT,
    MIN_TURNING_SPEED, STOP_BRAKING_RADIUS,
};
#[allow(unused_imports)]
pub use waypoint::{Waypoint, WaypointKind, MAX_WAIT_SECS};
pub use world::{
    GameNotice, SimGoalZone, SimVehicle, SimWorld, TickReport, MAP_MAX_COLS, MAP_MAX_ROWS,
};
