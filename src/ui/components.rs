//! UI components and resources for linking Bevy entities to simulation state

use bevy::prelude::*;
use std::collections::HashMap;

use crate::simulation::{LightId, LightState, SimWorld, VehicleId};

/// Non-send resource wrapper for the simulation world. The world shares its
/// state with bus listeners through `Rc`, so it must stay on the main thread.
pub struct SimWorldResource(pub SimWorld);

/// Marker component for ground plane
#[derive(Component)]
pub struct Ground;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Marker for entities synced from simulation
#[derive(Component)]
pub struct SimSynced;

/// Links a Bevy entity to a simulation vehicle
#[derive(Component)]
pub struct VehicleLink(pub VehicleId);

/// Links a Bevy entity to a simulation traffic light
#[derive(Component)]
pub struct LightLink(pub LightId);

/// One lamp of a traffic light
#[derive(Component)]
pub struct LampLink {
    pub light: LightId,
    pub lamp: LightState,
}

/// Marker for waypoint gizmos
#[derive(Component)]
pub struct WaypointMarker;

/// Resource to track Bevy entities mapped to simulation entities
#[derive(Resource, Default)]
pub struct EntityMappings {
    pub vehicles: HashMap<VehicleId, Entity>,
    pub lights: HashMap<LightId, Entity>,
}

/// Marker for HUD text elements
#[derive(Component)]
pub enum HudText {
    /// Level and experience
    Progress,
    /// Goal checklist
    Goals,
    /// Running / paused / level complete
    Status,
    /// Latest notice raised by the simulation
    Notice,
}

/// Most recent notice and how long it stays on screen
#[derive(Resource, Default)]
pub struct NoticeDisplay {
    pub text: String,
    pub color: Color,
    /// Seconds left; `None` keeps it until dismissed
    pub remaining: Option<f32>,
}
