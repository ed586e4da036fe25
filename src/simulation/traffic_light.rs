//! Traffic light cycling and red-light violation detection
//!
//! Standalone implementation that doesn't depend on Bevy.

use anyhow::{bail, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::event_bus::{DispatchError, EventBus, EventKind, GoalCompleted};
use super::game_state::GameSession;
use super::physics::{RayHit, RaycastQuery};
use super::types::{right_from_yaw, ColliderId, LightId, Position, DETECTION_RAY_HEIGHT};

/// Colour of a traffic light lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightState {
    #[default]
    Green,
    Orange,
    Red,
}

impl LightState {
    pub const ALL: [LightState; 3] = [LightState::Green, LightState::Orange, LightState::Red];

    /// Next state in the GREEN → ORANGE → RED → GREEN cycle
    pub fn next(self) -> LightState {
        match self {
            LightState::Green => LightState::Orange,
            LightState::Orange => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Green => f.write_str("GREEN"),
            LightState::Orange => f.write_str("ORANGE"),
            LightState::Red => f.write_str("RED"),
        }
    }
}

/// Seconds spent in each state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTimings {
    pub green_secs: f32,
    pub orange_secs: f32,
    pub red_secs: f32,
}

impl Default for LightTimings {
    fn default() -> Self {
        Self {
            green_secs: 5.0,
            orange_secs: 2.0,
            red_secs: 5.0,
        }
    }
}

impl LightTimings {
    pub fn duration(&self, state: LightState) -> f32 {
        match state {
            LightState::Green => self.green_secs,
            LightState::Orange => self.orange_secs,
            LightState::Red => self.red_secs,
        }
    }
}

/// When a lingering vehicle in front of a red light is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationTrigger {
    /// Once per RED phase per collider
    #[default]
    Edge,
    /// Every tick the collider is detected
    Level,
}

/// Event published when a violation is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "event")]
pub enum ViolationSignal {
    /// `GOAL_COMPLETED` with this goal index
    GoalCompleted { goal_index: usize },
    /// `RED_LIGHT_VIOLATION`
    RuleViolation,
}

impl Default for ViolationSignal {
    fn default() -> Self {
        ViolationSignal::GoalCompleted { goal_index: 0 }
    }
}

/// Red-light detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub ray_length: f32,
    /// Tag of the colliders that count as violators
    pub tag: String,
    pub trigger: ViolationTrigger,
    pub signal: ViolationSignal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ray_length: 10.0,
            tag: "Player".to_string(),
            trigger: ViolationTrigger::default(),
            signal: ViolationSignal::default(),
        }
    }
}

/// RGBA colour of a lamp (components may exceed 1.0 for glow)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampColor(pub [f32; 4]);

pub const LAMP_INACTIVE: LampColor = LampColor([0.25, 0.25, 0.25, 1.0]);
pub const LAMP_GREEN: LampColor = LampColor([0.0, 2.0, 0.0, 1.0]);
pub const LAMP_ORANGE: LampColor = LampColor([3.0, 1.5, 0.0, 1.0]);
pub const LAMP_RED: LampColor = LampColor([3.0, 0.0, 0.0, 1.0]);

/// The three lamps of a light. A single active slot means exactly one
/// lamp is lit whenever anyone looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPanel {
    active: LightState,
}

impl IndicatorPanel {
    pub fn new(active: LightState) -> Self {
        Self { active }
    }

    pub fn active(&self) -> LightState {
        self.active
    }

    pub fn is_lit(&self, lamp: LightState) -> bool {
        self.active == lamp
    }

    /// Colour to draw `lamp` with
    pub fn color(&self, lamp: LightState) -> LampColor {
        if !self.is_lit(lamp) {
            return LAMP_INACTIVE;
        }
        match lamp {
            LightState::Green => LAMP_GREEN,
            LightState::Orange => LAMP_ORANGE,
            LightState::Red => LAMP_RED,
        }
    }

    fn set_active(&mut self, lamp: LightState) {
        self.active = lamp;
    }
}

/// Full configuration of one traffic light
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLightConfig {
    pub timings: LightTimings,
    pub initial_state: LightState,
    pub detector: DetectorConfig,
}

impl TrafficLightConfig {
    pub fn validate(&self) -> Result<()> {
        for state in LightState::ALL {
            let secs = self.timings.duration(state);
            if !secs.is_finite() || secs <= 0.0 {
                bail!("{} duration must be positive, got {}", state, secs);
            }
        }
        if self.detector.tag.is_empty() {
            bail!("detection tag is not assigned");
        }
        if !self.detector.ray_length.is_finite() || self.detector.ray_length <= 0.0 {
            bail!(
                "detection ray length must be positive, got {}",
                self.detector.ray_length
            );
        }
        Ok(())
    }
}

/// What the outside world needs to hand a light each tick
pub struct DetectionContext<'a> {
    pub session: &'a GameSession,
    pub raycaster: &'a dyn RaycastQuery,
    pub bus: &'a EventBus,
}

/// What a light did during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightTick {
    /// New state if the light changed this tick
    pub changed_to: Option<LightState>,
    /// Violation reported this tick
    pub violation: Option<RayHit>,
}

/// A traffic light at a fixed position
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    pub position: Position,
    /// Rotation about Y in radians; the detector looks along -right
    pub facing: f32,
    config: TrafficLightConfig,
    state: LightState,
    state_timer: f32,
    panel: IndicatorPanel,
    /// Colliders already reported during the current RED phase
    reported: HashSet<ColliderId>,
}

impl TrafficLight {
    pub fn new(
        id: LightId,
        position: Position,
        facing: f32,
        config: TrafficLightConfig,
    ) -> Result<Self> {
        config.validate()?;
        let state = config.initial_state;
        let state_timer = config.timings.duration(state);
        Ok(Self {
            id,
            position,
            facing,
            config,
            state,
            state_timer,
            panel: IndicatorPanel::new(state),
            reported: HashSet::new(),
        })
    }

    /// Start part-way through a phase: `state` with `remaining` seconds left
    pub fn with_phase(mut self, state: LightState, remaining: f32) -> Self {
        self.enter_state(state);
        let full = self.config.timings.duration(state);
        self.state_timer = if remaining.is_finite() {
            remaining.clamp(0.0, full)
        } else {
            full
        };
        self
    }

    pub fn config(&self) -> &TrafficLightConfig {
        &self.config
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    /// Seconds left in the current state
    pub fn remaining(&self) -> f32 {
        self.state_timer.max(0.0)
    }

    pub fn panel(&self) -> &IndicatorPanel {
        &self.panel
    }

    pub fn ray_origin(&self) -> Position {
        self.position.with_y(DETECTION_RAY_HEIGHT)
    }

    pub fn ray_direction(&self) -> Position {
        right_from_yaw(self.facing) * -1.0
    }

    fn enter_state(&mut self, state: LightState) {
        self.state = state;
        self.panel.set_active(state);
        if state == LightState::Red {
            self.reported.clear();
        }
    }

    /// Advance the cycle and run the violation check
    pub fn tick(
        &mut self,
        delta_secs: f32,
        ctx: &DetectionContext<'_>,
    ) -> Result<LightTick, DispatchError> {
        let mut report = LightTick::default();

        self.state_timer -= delta_secs;
        if self.state_timer <= 0.0 {
            let next = self.state.next();
            self.enter_state(next);
            self.state_timer = self.config.timings.duration(next);
            debug!("Light {:?} -> {}", self.id.0, next);
            report.changed_to = Some(next);
        }

        report.violation = self.detect_violation(ctx)?;
        Ok(report)
    }

    fn detect_violation(
        &mut self,
        ctx: &DetectionContext<'_>,
    ) -> Result<Option<RayHit>, DispatchError> {
        if ctx.session.is_paused() || self.state != LightState::Red {
            return Ok(None);
        }

        let detector = &self.config.detector;
        let Some(hit) = ctx.raycaster.raycast(
            self.ray_origin(),
            self.ray_direction(),
            detector.ray_length,
        ) else {
            return Ok(None);
        };

        if hit.tag != detector.tag {
            return Ok(None);
        }
        if detector.trigger == ViolationTrigger::Edge && !self.reported.insert(hit.collider) {
            return Ok(None);
        }

        info!(
            "Red light violation at light {:?} by collider {:?}",
            self.id.0, hit.collider.0
        );
        match detector.signal {
            ViolationSignal::GoalCompleted { goal_index } => {
                ctx.bus.publish_event::<GoalCompleted>(goal_index)?;
            }
            ViolationSignal::RuleViolation => {
                ctx.bus.publish(EventKind::RedLightViolation)?;
            }
        }
        Ok(Some(hit))
    }
}
