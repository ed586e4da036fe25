//! Input handling systems

use bevy::prelude::*;

use super::components::{NoticeDisplay, SimWorldResource};

/// Handle basic keyboard input
pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut exit: MessageWriter<AppExit>,
    mut sim_world: NonSendMut<SimWorldResource>,
    mut notice: ResMut<NoticeDisplay>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }

    let world = &mut sim_world.0;

    // P toggles pause; it also dismisses a rule popup that paused the game
    if keyboard.just_pressed(KeyCode::KeyP) && !world.is_level_complete() {
        if world.is_paused() {
            world.resume();
            if notice.remaining.is_none() {
                notice.text.clear();
            }
        } else {
            world.pause();
        }
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        match world.restart() {
            Ok(()) => {
                notice.text.clear();
                notice.remaining = None;
            }
            Err(e) => error!("Failed to restart scenario: {:#}", e),
        }
    }
}
