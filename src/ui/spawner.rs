//! Systems for spawning visual entities from simulation state

use bevy::prelude::*;

use super::components::{
    EntityMappings, LampLink, LightLink, SimSynced, SimWorldResource, VehicleLink, WaypointMarker,
};
use crate::simulation::{
    LampColor, LightState, Position, SimVehicle, SimWorld, TrafficLight, WaypointKind,
};

const POLE_HEIGHT: f32 = 3.0;
const LAMP_SIZE: f32 = 0.35;

/// Bevy colour for a lamp, keeping values above 1.0 for bloom
pub fn lamp_color(color: LampColor) -> Color {
    let [r, g, b, a] = color.0;
    Color::linear_rgba(r, g, b, a)
}

/// System to create initial visual entities from simulation state
pub fn spawn_initial_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: NonSend<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
) {
    let world = &sim_world.0;

    spawn_waypoints(&mut commands, &mut meshes, &mut materials, world);
    spawn_scenery(&mut commands, &mut meshes, &mut materials, world);

    for light in world.lights.values() {
        spawn_light_visual(&mut commands, &mut meshes, &mut materials, light, &mut mappings);
    }
    for vehicle in world.vehicles.values() {
        spawn_vehicle_visual(&mut commands, &mut meshes, &mut materials, vehicle, &mut mappings);
    }
}

fn spawn_waypoints(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &SimWorld,
) {
    let pass_material = materials.add(Color::srgb(0.2, 0.6, 1.0));
    let stop_material = materials.add(Color::srgb(1.0, 0.2, 0.2));
    let mesh = meshes.add(Sphere::new(0.3));

    for vehicle in world.vehicles.values() {
        for waypoint in vehicle.follower.path().iter() {
            let material = match waypoint.kind {
                WaypointKind::Default => pass_material.clone(),
                WaypointKind::Stop => stop_material.clone(),
            };
            commands.spawn((
                SimSynced,
                WaypointMarker,
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material),
                Transform::from_translation(to_vec3(waypoint.position)),
            ));
        }
    }
}

/// Goal zones and static obstacles
fn spawn_scenery(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &SimWorld,
) {
    let zone_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 0.9, 0.2, 0.25),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    for goal_zone in &world.goal_zones {
        let bounds = &goal_zone.zone.bounds;
        let size = bounds.size();
        commands.spawn((
            SimSynced,
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(zone_material.clone()),
            Transform::from_translation(to_vec3(bounds.center())),
        ));
    }

    let obstacle_material = materials.add(Color::srgb(0.5, 0.5, 0.5));
    for obstacle in &world.scenario().obstacles {
        commands.spawn((
            SimSynced,
            Mesh3d(meshes.add(Cuboid::new(obstacle.size.x, obstacle.size.y, obstacle.size.z))),
            MeshMaterial3d(obstacle_material.clone()),
            Transform::from_translation(to_vec3(obstacle.center)),
        ));
    }
}

/// Spawn a pole with three lamps stacked red, orange, green from the top
pub fn spawn_light_visual(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    light: &TrafficLight,
    mappings: &mut ResMut<EntityMappings>,
) {
    let lamp_mesh = meshes.add(Sphere::new(LAMP_SIZE / 2.0));
    let lamps = [
        (LightState::Red, POLE_HEIGHT),
        (LightState::Orange, POLE_HEIGHT - LAMP_SIZE * 1.2),
        (LightState::Green, POLE_HEIGHT - LAMP_SIZE * 2.4),
    ];

    let entity = commands
        .spawn((
            SimSynced,
            LightLink(light.id),
            Mesh3d(meshes.add(Cylinder::new(0.1, POLE_HEIGHT))),
            MeshMaterial3d(materials.add(Color::srgb(0.15, 0.15, 0.15))),
            Transform::from_translation(to_vec3(light.position) + Vec3::Y * POLE_HEIGHT / 2.0)
                .with_rotation(Quat::from_rotation_y(light.facing)),
        ))
        .with_children(|parent| {
            for (lamp, height) in lamps {
                let color = lamp_color(light.panel().color(lamp));
                parent.spawn((
                    LampLink {
                        light: light.id,
                        lamp,
                    },
                    Mesh3d(lamp_mesh.clone()),
                    // Each lamp owns its material so colours change independently
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: color,
                        emissive: color.to_linear(),
                        ..default()
                    })),
                    Transform::from_xyz(0.0, height - POLE_HEIGHT / 2.0, 0.15),
                ));
            }
        })
        .id();
    mappings.lights.insert(light.id, entity);
}

/// Spawn a single vehicle body
pub fn spawn_vehicle_visual(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    vehicle: &SimVehicle,
    mappings: &mut ResMut<EntityMappings>,
) {
    let transform = vehicle.follower.transform();
    let entity = commands
        .spawn((
            SimSynced,
            VehicleLink(vehicle.id),
            Mesh3d(meshes.add(Cuboid::new(1.8, 1.0, 3.6))),
            MeshMaterial3d(materials.add(Color::srgb(0.8, 0.2, 0.2))),
            Transform::from_translation(to_vec3(transform.position) + Vec3::Y * 0.5)
                .with_rotation(Quat::from_rotation_y(transform.yaw)),
        ))
        .id();
    mappings.vehicles.insert(vehicle.id, entity);
}

pub fn to_vec3(p: Position) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}
