//! Physics simulation module (headless)
//!
//! Force-based rigid body без полноценного солвера:
//! - `PhysicsBody` накапливает силы/импульсы, интегрирует velocity → position
//! - ground contact через ray cast по `CollisionWorld`
//! - velocity зеркалится в rapier `Velocity` (если компонент есть)
//!
//! Порядок в FixedUpdate: Forces → Integrate → Constraints.

use bevy::prelude::*;

pub mod body;

// Re-export основных типов
pub use body::{
    integrate_bodies, resolve_ground_contacts, sync_velocity_to_rapier, PhysicsBody, GRAVITY,
};

use crate::SimulationSet;

/// Под-фазы физического шага
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicsStep {
    /// Контроллеры пишут силы/скорости
    Forces,
    /// Интеграция + контакты
    Integrate,
    /// Ограничения после интеграции (speed clamp, rotation)
    Constraints,
}

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (PhysicsStep::Forces, PhysicsStep::Integrate, PhysicsStep::Constraints)
                .chain()
                .in_set(SimulationSet::Physics),
        )
        .add_systems(
            FixedUpdate,
            (
                (integrate_bodies, resolve_ground_contacts)
                    .chain()
                    .in_set(PhysicsStep::Integrate),
                sync_velocity_to_rapier.after(PhysicsStep::Constraints),
            ),
        );
    }
}
