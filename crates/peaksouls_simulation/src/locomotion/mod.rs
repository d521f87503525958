//! Locomotion domain - force-based контроллер персонажа
//!
//! Содержит:
//! - LocomotionConfig (+ SoulsConfig, SekiroConfig, пресеты)
//! - LocomotionController (config + камера-базис)
//! - LocomotionState (intent, окна, комбо, toggles)
//! - actions (Souls / Sekiro edge-triggered действия)
//! - systems (Update: actions, FixedUpdate: forces/constraints)

use bevy::prelude::*;

pub mod actions;
pub mod config;
pub mod controller;
pub mod state;
pub mod systems;

// Re-export основных типов
pub use actions::{apply_sekiro_actions, apply_souls_actions, ActionEdges};
pub use config::{ControllerVariant, LocomotionConfig, SekiroConfig, SoulsConfig};
pub use controller::{
    camera_right, clamp_planar_speed, facing_rotation, facing_step, move_direction,
    movement_force, probe_ground, target_planar_velocity, LocomotionController,
};
pub use state::LocomotionState;

use crate::components::{apply_hit_events, tick_control_locks, HitReceived};
use crate::physics::PhysicsStep;
use crate::SimulationSet;

/// Locomotion Plugin
///
/// Порядок Update (`SimulationSet::Actions`):
/// 1. apply_hit_events - урон + control lock из `HitReceived`
/// 2. update_ground_state - ground probe, landing
/// 3. tick_control_locks - hit reaction lock
/// 4. tick_locomotion_windows - roll/attack окна
/// 5. process_locomotion_input - intent + действия
/// 6. update_locomotion_animation - Speed/MotionSpeed/FreeFall
///
/// FixedUpdate: apply_locomotion_forces (Forces) → integrate → clamp (Constraints)
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<LocomotionController>()
            .register_type::<LocomotionState>()
            .add_event::<HitReceived>()
            .add_systems(
                Update,
                (
                    apply_hit_events,
                    systems::update_ground_state,
                    tick_control_locks,
                    systems::tick_locomotion_windows,
                    systems::process_locomotion_input,
                    systems::update_locomotion_animation,
                )
                    .chain()
                    .in_set(SimulationSet::Actions),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::apply_locomotion_forces.in_set(PhysicsStep::Forces),
                    systems::clamp_locomotion_speed.in_set(PhysicsStep::Constraints),
                ),
            );
    }
}
