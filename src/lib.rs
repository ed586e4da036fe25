//! Road Rules Library
//!
//! A driving-lesson simulation (waypoint following, traffic lights and
//! red-light detection) that can run independently or with a Bevy UI.

pub mod simulation;

#[cfg(feature = "ui")]
pub mod ui;
