//! Systems for syncing Bevy entities with simulation state

use bevy::prelude::*;
use std::collections::HashSet;

use super::components::{
    EntityMappings, HudText, LampLink, NoticeDisplay, SimWorldResource, VehicleLink,
};
use super::spawner::{lamp_color, spawn_vehicle_visual, to_vec3};
use crate::simulation::{GameNotice, MessageType, VehicleId};

/// System to run simulation tick
pub fn tick_simulation(
    time: Res<Time>,
    mut sim_world: NonSendMut<SimWorldResource>,
    mut notice: ResMut<NoticeDisplay>,
) {
    let world = &mut sim_world.0;
    if let Err(e) = world.tick(time.delta_secs()) {
        error!("Simulation tick failed: {}", e);
    }

    for raised in world.drain_notices() {
        show_notice(&mut notice, &raised);
    }
}

fn show_notice(display: &mut NoticeDisplay, notice: &GameNotice) {
    match notice {
        GameNotice::Rule(rule) => {
            display.text = format!("{}\n{}", rule.title, rule.description);
            display.color = match rule.message_type {
                MessageType::Success => Color::srgb(0.3, 1.0, 0.3),
                MessageType::Info => Color::WHITE,
                MessageType::Warning => Color::srgb(1.0, 0.8, 0.2),
                MessageType::Error => Color::srgb(1.0, 0.3, 0.3),
            };
            display.remaining = (rule.display_duration > 0.0).then_some(rule.display_duration);
        }
        GameNotice::GoalCompleted { text, .. } => {
            display.text = format!("Goal completed: {}", text);
            display.color = Color::srgb(0.3, 1.0, 0.3);
            display.remaining = Some(3.0);
        }
        GameNotice::Experience(gain) => {
            display.text = format!("+{} XP", gain.experience_gained);
            display.color = Color::srgb(1.0, 1.0, 0.5);
            display.remaining = Some(2.0);
        }
        GameNotice::LevelComplete => {
            display.text = "Level complete! Press R to play again".to_string();
            display.color = Color::srgb(0.3, 1.0, 0.3);
            display.remaining = None;
        }
    }
}

/// System to sync vehicle visuals from simulation state
pub fn sync_vehicles(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: NonSend<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
    mut vehicle_query: Query<(Entity, &VehicleLink, &mut Transform)>,
) {
    let world = &sim_world.0;
    let mut existing: HashSet<VehicleId> = HashSet::new();

    for (entity, link, mut transform) in vehicle_query.iter_mut() {
        if let Some(vehicle) = world.vehicles.get(&link.0) {
            existing.insert(link.0);
            let pose = vehicle.follower.transform();
            transform.translation = to_vec3(pose.position) + Vec3::Y * 0.5;
            transform.rotation = Quat::from_rotation_y(pose.yaw);
        } else {
            // Vehicle no longer exists in simulation, despawn
            commands.entity(entity).despawn();
            mappings.vehicles.remove(&link.0);
        }
    }

    for (id, vehicle) in &world.vehicles {
        if !existing.contains(id) {
            spawn_vehicle_visual(
                &mut commands,
                &mut meshes,
                &mut materials,
                vehicle,
                &mut mappings,
            );
        }
    }
}

/// System to colour traffic light lamps from their indicator panels
pub fn sync_lamps(
    sim_world: NonSend<SimWorldResource>,
    lamp_query: Query<(&LampLink, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (link, material_handle) in lamp_query.iter() {
        let Some(light) = sim_world.0.lights.get(&link.light) else {
            continue;
        };
        if let Some(material) = materials.get_mut(&material_handle.0) {
            let color = lamp_color(light.panel().color(link.lamp));
            material.base_color = color;
            material.emissive = color.to_linear();
        }
    }
}

/// System to refresh the HUD text
pub fn update_hud_text(
    time: Res<Time>,
    sim_world: NonSend<SimWorldResource>,
    mut notice: ResMut<NoticeDisplay>,
    mut text_query: Query<(&HudText, &mut Text, &mut TextColor)>,
) {
    let world = &sim_world.0;
    let notice = &mut *notice;

    if let Some(remaining) = notice.remaining.as_mut() {
        *remaining -= time.delta_secs();
        if *remaining <= 0.0 {
            notice.text.clear();
            notice.remaining = None;
        }
    }

    for (kind, mut text, mut color) in text_query.iter_mut() {
        match kind {
            HudText::Progress => {
                **text = world.progress().summary();
            }
            HudText::Goals => {
                let goals = world.goals();
                let mut lines = vec![goals.title().to_string()];
                lines.extend(goals.checklist());
                **text = lines.join("\n");
            }
            HudText::Status => {
                **text = if world.is_level_complete() {
                    "Level complete".to_string()
                } else if world.is_paused() {
                    "Paused (P to resume)".to_string()
                } else {
                    format!("Time: {:.1}s", world.time)
                };
            }
            HudText::Notice => {
                **text = notice.text.clone();
                color.0 = notice.color;
            }
        }
    }
}
