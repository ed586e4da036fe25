//! UI module that visualizes the simulation state using Bevy
//!
//! This module is purely for visualization - all simulation logic is in the `simulation` module.
//! The UI reads state from `SimWorld` and renders it using Bevy's 3D graphics.

mod components;
mod hud;
mod input;
pub mod spawner;
mod sync;
mod world;

use bevy::prelude::*;

pub use components::{EntityMappings, NoticeDisplay, SimWorldResource};

use hud::setup_hud;
use input::handle_input;
use spawner::spawn_initial_visuals;
use sync::{sync_lamps, sync_vehicles, tick_simulation, update_hud_text};
use world::setup_world;

/// Plugin to register all UI systems
///
/// The world is built by the caller and inserted as a non-send
/// [`SimWorldResource`] before this plugin is added.
pub struct RoadRulesUIPlugin;

impl Plugin for RoadRulesUIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EntityMappings>()
            .init_resource::<NoticeDisplay>()
            .add_systems(
                Startup,
                (setup_world, spawn_initial_visuals.after(setup_world), setup_hud),
            )
            .add_systems(FixedUpdate, tick_simulation)
            .add_systems(
                Update,
                (sync_vehicles, sync_lamps, update_hud_text, handle_input),
            );
    }
}
