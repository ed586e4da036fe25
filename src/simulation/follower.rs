//! Waypoint following for a single vehicle
//!
//! Standalone implementation that doesn't depend on Bevy. The follower owns
//! its copy of the path and the vehicle transform; the engine reads the
//! transform back after every tick.

use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use super::path::Path;
use super::types::{
    move_towards, shortest_yaw_delta, Position, VehicleTransform, MIN_TURNING_SPEED,
};
use super::waypoint::{Waypoint, WaypointKind};

/// Movement tuning for a path follower
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Wrap to the first waypoint after the last one
    pub loop_path: bool,
    /// Start seeking immediately when created with a non-empty path
    pub auto_start: bool,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub rotation_speed: f32,
    /// Reach radius for DEFAULT waypoints
    pub stopping_distance: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            loop_path: true,
            auto_start: true,
            max_speed: 5.0,
            acceleration: 2.0,
            deceleration: 4.0,
            rotation_speed: 5.0,
            stopping_distance: 0.1,
        }
    }
}

impl FollowerConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
            ("rotation_speed", self.rotation_speed),
            ("stopping_distance", self.stopping_distance),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number, got {}", name, value);
            }
        }
        Ok(())
    }
}

/// Where the follower is in its traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerState {
    /// Not travelling; residual speed bleeds off
    Idle,
    /// Driving toward the waypoint at this index
    Seeking(usize),
    /// Parked at a STOP waypoint
    Waiting { index: usize, remaining: f32 },
    /// Reached the end of a non-looping path
    Finished,
}

/// What a follower did during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerUpdate {
    /// No speed and nothing to do
    Stationary,
    /// Moved (seeking or coasting to a halt)
    Moving,
    /// Reached the waypoint at this index
    Reached(usize),
    /// Holding at a STOP waypoint
    Waiting,
    /// Just completed the path
    Finished,
}

/// A vehicle following an ordered list of waypoints
#[derive(Debug, Clone)]
pub struct CarPathFollower {
    config: FollowerConfig,
    path: Path,
    state: FollowerState,
    current_index: usize,
    current_speed: f32,
    target_position: Position,
    transform: VehicleTransform,
}

impl CarPathFollower {
    /// Create a follower placed on the first waypoint of `path`
    pub fn new(config: FollowerConfig, path: Path) -> Result<Self> {
        config.validate()?;

        let start = path
            .get(0)
            .map(|w| w.position)
            .unwrap_or(Position::ZERO);
        let state = if config.auto_start && !path.is_empty() {
            FollowerState::Seeking(0)
        } else {
            FollowerState::Idle
        };

        Ok(Self {
            config,
            path,
            state,
            current_index: 0,
            current_speed: 0.0,
            target_position: start,
            transform: VehicleTransform {
                position: start,
                yaw: 0.0,
            },
        })
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> FollowerState {
        self.state
    }

    pub fn current_waypoint_index(&self) -> usize {
        self.current_index
    }

    /// True while seeking a waypoint
    pub fn is_moving(&self) -> bool {
        matches!(self.state, FollowerState::Seeking(_))
    }

    pub fn speed(&self) -> f32 {
        self.current_speed
    }

    pub fn target_position(&self) -> Position {
        self.target_position
    }

    pub fn transform(&self) -> VehicleTransform {
        self.transform
    }

    pub fn position(&self) -> Position {
        self.transform.position
    }

    pub fn yaw(&self) -> f32 {
        self.transform.yaw
    }

    /// Teleport the vehicle; the state machine is left untouched
    pub fn set_transform(&mut self, transform: VehicleTransform) {
        self.transform = transform;
    }

    /// Advance the vehicle by one tick
    pub fn tick(&mut self, delta_secs: f32) -> FollowerUpdate {
        match self.state {
            FollowerState::Seeking(index) => self.seek(index, delta_secs),
            FollowerState::Waiting { index, remaining } => {
                let remaining = remaining - delta_secs;
                if remaining <= 0.0 {
                    debug!("Finished waiting at waypoint {}", index);
                    self.advance()
                } else {
                    self.state = FollowerState::Waiting { index, remaining };
                    FollowerUpdate::Waiting
                }
            }
            FollowerState::Idle | FollowerState::Finished => {
                if self.current_speed > 0.0 {
                    self.decelerate(delta_secs);
                    FollowerUpdate::Moving
                } else {
                    FollowerUpdate::Stationary
                }
            }
        }
    }

    fn seek(&mut self, index: usize, delta_secs: f32) -> FollowerUpdate {
        // Policy on clear keeps the index valid, but a stale index must not panic
        let Some(waypoint) = self.path.get(index).cloned() else {
            self.state = FollowerState::Idle;
            self.current_index = 0;
            return FollowerUpdate::Stationary;
        };

        // Only X/Z drive targeting; the vehicle keeps its own elevation
        self.target_position = waypoint.position.with_y(self.transform.position.y);

        self.accelerate(delta_secs);
        self.turn(delta_secs);

        let distance = self
            .transform
            .position
            .planar_distance(&self.target_position);
        if distance < waypoint.stopping_radius(self.config.stopping_distance) {
            self.on_reached(index, &waypoint)
        } else {
            FollowerUpdate::Moving
        }
    }

    fn on_reached(&mut self, index: usize, waypoint: &Waypoint) -> FollowerUpdate {
        debug!("Reached waypoint {} ({})", index, waypoint.kind);
        match waypoint.kind {
            WaypointKind::Stop if waypoint.wait_secs() > 0.0 => {
                self.state = FollowerState::Waiting {
                    index,
                    remaining: waypoint.wait_secs(),
                };
                FollowerUpdate::Reached(index)
            }
            _ => match self.advance() {
                FollowerUpdate::Finished => FollowerUpdate::Finished,
                _ => FollowerUpdate::Reached(index),
            },
        }
    }

    /// Move on to the next waypoint, wrapping or finishing at the end
    pub fn advance(&mut self) -> FollowerUpdate {
        if self.path.is_empty() {
            self.state = FollowerState::Idle;
            self.current_index = 0;
            return FollowerUpdate::Stationary;
        }

        let next = self.current_index + 1;
        if next < self.path.len() {
            self.current_index = next;
        } else if self.config.loop_path {
            self.current_index = 0;
        } else {
            debug!("Path complete after waypoint {}", self.current_index);
            self.state = FollowerState::Finished;
            return FollowerUpdate::Finished;
        }

        self.state = FollowerState::Seeking(self.current_index);
        FollowerUpdate::Moving
    }

    fn accelerate(&mut self, delta_secs: f32) {
        self.current_speed = move_towards(
            self.current_speed,
            self.config.max_speed,
            self.config.acceleration * delta_secs,
        );
        self.move_to_target(delta_secs);
    }

    fn decelerate(&mut self, delta_secs: f32) {
        self.current_speed = move_towards(
            self.current_speed,
            0.0,
            self.config.deceleration * delta_secs,
        );
        self.move_to_target(delta_secs);
    }

    fn move_to_target(&mut self, delta_secs: f32) {
        self.transform.position = self
            .transform
            .position
            .move_towards(&self.target_position, self.current_speed * delta_secs);
    }

    fn turn(&mut self, delta_secs: f32) {
        let direction = self.target_position - self.transform.position;
        if direction.planar_distance(&Position::ZERO) <= f32::EPSILON
            || self.current_speed <= MIN_TURNING_SPEED
        {
            return;
        }

        let target_yaw = Position::ZERO.angle_to(&direction);
        let speed_factor = if self.config.max_speed > 0.0 {
            (self.current_speed / self.config.max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t = (speed_factor * self.config.rotation_speed * delta_secs).clamp(0.0, 1.0);
        self.transform.yaw += shortest_yaw_delta(self.transform.yaw, target_yaw) * t;
    }

    /// Append a waypoint to the live path
    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.path.push(waypoint);
    }

    /// Drop every waypoint. A follower that was travelling goes `Idle` and
    /// coasts to a halt; call [`start`](Self::start) after new waypoints arrive.
    pub fn clear_waypoints(&mut self) {
        self.path.clear();
        self.current_index = 0;
        if !matches!(self.state, FollowerState::Finished) {
            self.state = FollowerState::Idle;
        }
    }

    /// Back to the first waypoint, stopped and idle
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.current_speed = 0.0;
        self.state = FollowerState::Idle;
    }

    /// Begin seeking the current waypoint. Returns false on an empty path.
    pub fn start(&mut self) -> bool {
        if self.current_index >= self.path.len() {
            return false;
        }
        self.state = FollowerState::Seeking(self.current_index);
        true
    }

    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.config.max_speed = if max_speed.is_finite() {
            max_speed.max(0.0)
        } else {
            0.0
        };
    }
}
