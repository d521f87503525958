//! Camera module - third-person rig + lock-on
//!
//! ECS ответственность:
//! - `CameraRig` компонент на camera entity (follow = player entity)
//! - lock-on toggle по edge `InputAction::LockOn` с player input
//! - fail-safe release (цель пропала / ушла дальше `lock_break_distance`)
//! - поза камеры → Transform (SmoothDamp + look_at)
//!
//! Все системы в PostUpdate (`SimulationSet::Camera`), после physics step.

use bevy::prelude::*;

pub mod rig;
pub mod smoothing;

// Re-export основных типов
pub use rig::{
    orbit_direction, resolve_occlusion, CameraRig, CameraRigConfig, LockToggle, Occlusion,
    RigMode, RigPose,
};
pub use smoothing::smooth_damp;

use crate::input::{InputAction, PlayerInput};
use crate::logger;
use crate::spatial::{require_world, CollisionWorld};
use crate::targeting::TargetingConfig;
use crate::SimulationSet;

/// Event: lock-on включился / выключился
///
/// `target = None` - камера вернулась в Free.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LockOnChanged {
    pub rig: Entity,
    pub target: Option<Entity>,
}

/// Система: lock-on toggle по нажатию
pub fn toggle_lock_on(
    mut rigs: Query<(Entity, &mut CameraRig)>,
    mut follows: Query<(&Transform, &mut PlayerInput)>,
    world: Option<Res<CollisionWorld>>,
    mut events: EventWriter<LockOnChanged>,
) {
    for (rig_entity, mut rig) in rigs.iter_mut() {
        let Ok((follow, mut input)) = follows.get_mut(rig.follow) else {
            continue;
        };
        if !input.consume(InputAction::LockOn) {
            continue;
        }

        let world = match require_world(world.as_deref()) {
            Ok(world) => world,
            Err(err) => {
                logger::log_error(&format!("toggle_lock_on: {}", err));
                return;
            }
        };

        match rig.toggle_lock_on(world, follow.translation) {
            LockToggle::Acquired(candidate) => {
                logger::log(&format!(
                    "Lock-on: {:?} → {:?} (distance {:.1})",
                    rig_entity, candidate.entity, candidate.distance
                ));
                events.write(LockOnChanged {
                    rig: rig_entity,
                    target: Some(candidate.entity),
                });
            }
            LockToggle::Released(target) => {
                logger::log(&format!("Lock-on released: {:?} (was {:?})", rig_entity, target));
                events.write(LockOnChanged {
                    rig: rig_entity,
                    target: None,
                });
            }
            LockToggle::NoTarget => {
                logger::log(&format!("Lock-on: {:?} no visible target", rig_entity));
            }
        }
    }
}

/// Система: срывает lock-on если цель despawned или ушла слишком далеко
pub fn release_lost_targets(
    mut rigs: Query<(Entity, &mut CameraRig)>,
    transforms: Query<&Transform>,
    mut events: EventWriter<LockOnChanged>,
) {
    for (rig_entity, mut rig) in rigs.iter_mut() {
        let Some(target) = rig.mode.target() else {
            continue;
        };
        let Ok(follow) = transforms.get(rig.follow) else {
            continue;
        };

        let target_position = transforms.get(target).ok().map(|t| t.translation);
        if !rig.should_release(follow.translation, target_position) {
            continue;
        }

        rig.release();
        logger::log_warning(&format!(
            "Lock-on lost: {:?} target {:?} (missing: {})",
            rig_entity,
            target,
            target_position.is_none()
        ));
        events.write(LockOnChanged {
            rig: rig_entity,
            target: None,
        });
    }
}

/// Система: look input → поза → SmoothDamp → Transform
///
/// Первый кадр после спавна камера ставится в позу без сглаживания.
pub fn update_camera_rigs(
    mut rigs: Query<(&mut CameraRig, &mut Transform)>,
    follows: Query<(&Transform, Option<&PlayerInput>), Without<CameraRig>>,
    world: Option<Res<CollisionWorld>>,
    time: Res<Time>,
    mut reported: Local<bool>,
) {
    let world = match require_world(world.as_deref()) {
        Ok(world) => world,
        Err(err) => {
            if !*reported {
                *reported = true;
                logger::log_error(&format!("update_camera_rigs: {}", err));
            }
            return;
        }
    };
    let delta = time.delta_secs();

    for (mut rig, mut transform) in rigs.iter_mut() {
        let Ok((follow, input)) = follows.get(rig.follow) else {
            continue;
        };
        let anchor = follow.translation;

        let snap = !rig.initialized;
        if snap {
            rig.initialize(follow);
        }

        // В Locked режиме камера управляется целью
        if !rig.mode.is_locked() {
            if let Some(input) = input {
                rig.apply_look_input(input.look, delta);
            }
        }

        let target_position = rig
            .mode
            .target()
            .and_then(|target| follows.get(target).ok())
            .map(|(target, _)| target.translation);

        let pose = match target_position {
            Some(target) => rig.locked_pose(world, anchor, target),
            None => rig.free_pose(world, anchor),
        };

        transform.translation = if snap {
            pose.position
        } else {
            rig.smooth_toward(transform.translation, &pose, delta)
        };
        rig.look_at = pose.look_at;
        transform.look_at(pose.look_at, Vec3::Y);
    }
}

/// Spawn camera rig, следующего за `follow`
pub fn spawn_camera_rig(
    world: &mut World,
    follow: Entity,
    config: CameraRigConfig,
    targeting: TargetingConfig,
) -> Entity {
    world
        .spawn((
            Name::new("CameraRig"),
            CameraRig::new(follow, config, targeting),
            Transform::default(),
        ))
        .id()
}

/// Camera Plugin
///
/// Порядок (PostUpdate, `SimulationSet::Camera`):
/// 1. toggle_lock_on - edge LockOn → Free/Locked
/// 2. release_lost_targets - fail-safe release
/// 3. update_camera_rigs - поза + сглаживание
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LockOnChanged>()
            .register_type::<CameraRig>()
            .add_systems(
                PostUpdate,
                (toggle_lock_on, release_lost_targets, update_camera_rigs)
                    .chain()
                    .in_set(SimulationSet::Camera),
            );
    }
}
