//! World setup systems for camera, lighting, and ground

use bevy::prelude::*;

use super::components::{Ground, MainCamera, SimWorldResource};
use super::spawner::to_vec3;

/// Ground beyond the outermost scenario feature, in world units
const GROUND_MARGIN: f32 = 20.0;

/// Ground and camera framing for a scenario, derived from its bounds
struct SceneFrame {
    center: Vec3,
    ground_size: Vec2,
    camera_distance: f32,
}

impl SceneFrame {
    fn from_world(sim_world: &SimWorldResource) -> Self {
        let Some(bounds) = sim_world.0.scene_bounds() else {
            return Self {
                center: Vec3::ZERO,
                ground_size: Vec2::splat(GROUND_MARGIN * 2.0),
                camera_distance: GROUND_MARGIN,
            };
        };

        let center = to_vec3(bounds.center()).with_y(0.0);
        let size = to_vec3(bounds.size());
        let extent = size.x.max(size.z);
        Self {
            center,
            ground_size: Vec2::new(size.x, size.z) + Vec2::splat(GROUND_MARGIN * 2.0),
            camera_distance: extent.max(GROUND_MARGIN),
        }
    }
}

/// System to set up the camera, lighting and a ground plane covering the scenario
pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: NonSend<SimWorldResource>,
) {
    let frame = SceneFrame::from_world(&sim_world);

    // Behind and above the scene's -Z end, looking at its centre
    let eye = frame.center
        + Vec3::new(
            frame.camera_distance * 0.3,
            frame.camera_distance * 0.55,
            -frame.camera_distance * 0.75,
        );
    commands.spawn((
        MainCamera,
        Camera3d::default(),
        Transform::from_translation(eye).looking_at(frame.center, Vec3::Y),
    ));

    // Sun over the scene centre
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(frame.center + Vec3::new(4.0, 8.0, 4.0))
            .looking_at(frame.center, Vec3::Y),
    ));

    commands.spawn((
        Ground,
        Mesh3d(meshes.add(
            Plane3d::default()
                .mesh()
                .size(frame.ground_size.x, frame.ground_size.y),
        )),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
        Transform::from_translation(frame.center),
    ));
}
