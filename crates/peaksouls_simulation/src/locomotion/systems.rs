//! Locomotion ECS системы
//!
//! Update (`SimulationSet::Actions`): ground probe → окна → input/actions →
//! параметры анимации.
//! FixedUpdate: силы (`PhysicsStep::Forces`) и speed clamp
//! (`PhysicsStep::Constraints`).

use bevy::prelude::*;

use super::actions::{apply_sekiro_actions, apply_souls_actions, ActionEdges};
use super::config::ControllerVariant;
use super::controller::{
    clamp_planar_speed, facing_step, movement_force, probe_ground, target_planar_velocity,
    LocomotionController,
};
use super::state::LocomotionState;
use crate::animation::{AnimationParam, AnimatorParameters};
use crate::components::{ControlLock, Health, Player};
use crate::input::PlayerInput;
use crate::logger;
use crate::physics::PhysicsBody;
use crate::spatial::{require_world, CollisionWorld};

/// FreeFall включается только при заметном падении
const FREE_FALL_VELOCITY: f32 = -0.1;

/// Множитель `Speed` для Sekiro blend tree
const SEKIRO_SPEED_SCALE: f32 = 15.0;

/// Система: ground probe + landing
pub fn update_ground_state(
    world: Option<Res<CollisionWorld>>,
    mut query: Query<(
        &Transform,
        &LocomotionController,
        &mut LocomotionState,
        &mut AnimatorParameters,
    )>,
    mut reported: Local<bool>,
) {
    let world = match require_world(world.as_deref()) {
        Ok(world) => world,
        Err(err) => {
            if !*reported {
                *reported = true;
                logger::log_error(&format!("update_ground_state: {}", err));
            }
            return;
        }
    };

    for (transform, controller, mut state, mut params) in query.iter_mut() {
        let was_grounded = state.grounded;
        state.grounded = probe_ground(world, transform.translation, &controller.config);

        if state.grounded
            && !was_grounded
            && controller.config.variant == ControllerVariant::Sekiro
        {
            params.set(AnimationParam::FreeFall(false));
            params.set(AnimationParam::JumpCleared);
        }

        params.set(AnimationParam::Grounded(state.grounded));
    }
}

/// Система: roll/attack окна
pub fn tick_locomotion_windows(
    mut query: Query<(&mut LocomotionState, &mut AnimatorParameters)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (mut state, mut params) in query.iter_mut() {
        for param in state.tick_windows(delta) {
            params.set(param);
        }
    }
}

/// Система: input → intent + действия
///
/// Под `ControlLock` (hit reaction) input не обрабатывается: intent
/// сбрасывается, edges выкидываются.
#[allow(clippy::type_complexity)]
pub fn process_locomotion_input(
    mut players: Query<
        (
            Entity,
            &Transform,
            &LocomotionController,
            &mut LocomotionState,
            &mut PlayerInput,
            &mut PhysicsBody,
            &mut AnimatorParameters,
            Option<&mut Health>,
            Has<ControlLock>,
        ),
        With<Player>,
    >,
    cameras: Query<&Transform, Without<LocomotionController>>,
) {
    for (entity, transform, controller, mut state, mut input, mut body, mut params, health, locked) in
        players.iter_mut()
    {
        let config = &controller.config;

        if locked {
            state.clear_intent();
            state.move_input = Vec2::ZERO;
            state.moving = false;
            ActionEdges::consume(&mut input);
            continue;
        }

        let camera_forward = controller
            .camera
            .and_then(|camera| cameras.get(camera).ok())
            .map_or(Vec3::Z, |camera| camera.forward().as_vec3());

        let target = target_planar_velocity(input.move_axis, camera_forward, input.sprint, config);
        state.move_input = input.move_axis;
        state.sprinting = input.sprint;
        state.move_direction = target.try_normalize();
        state.moving = state.move_direction.is_some();
        state.target_speed = target.length();

        let edges = ActionEdges::consume(&mut input);

        match config.variant {
            ControllerVariant::Souls => {
                params.set(AnimationParam::Moving(state.moving));
                if state.moving {
                    params.set(AnimationParam::Speed(body.velocity.length() * 2.0));
                }

                let result = apply_souls_actions(
                    edges,
                    &mut state,
                    config,
                    &mut body,
                    health.map(|health| health.into_inner()),
                    &mut params,
                );
                if let Err(err) = result {
                    logger::log_error(&format!("{:?}: {}", entity, err));
                }
            }
            ControllerVariant::Sekiro => {
                let facing = transform.rotation * Vec3::Z;
                apply_sekiro_actions(
                    edges,
                    &mut state,
                    config,
                    &mut body,
                    camera_forward,
                    facing,
                    &mut params,
                );
            }
        }
    }
}

/// Система: непрерывные параметры анимации (Sekiro)
pub fn update_locomotion_animation(
    mut query: Query<(
        &LocomotionController,
        &LocomotionState,
        &PhysicsBody,
        &mut AnimatorParameters,
    )>,
) {
    for (controller, state, body, mut params) in query.iter_mut() {
        if controller.config.variant != ControllerVariant::Sekiro {
            continue;
        }

        let max_speed = controller.config.speed_for(state.sprinting);
        let factor = if max_speed > 0.0 {
            (body.planar_velocity().length() / max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };

        params.set(AnimationParam::Speed(factor * SEKIRO_SPEED_SCALE));
        params.set(AnimationParam::MotionSpeed(state.move_input.length()));

        if !state.grounded && body.velocity.y < FREE_FALL_VELOCITY {
            params.set(AnimationParam::FreeFall(true));
        }
    }
}

/// Fixed система: drag + силы движения + поворот
///
/// Sekiro roll - скорость задаётся напрямую, attack окно глушит движение.
pub fn apply_locomotion_forces(
    mut query: Query<(
        &LocomotionController,
        &LocomotionState,
        &mut PhysicsBody,
        &mut Transform,
    )>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (controller, state, mut body, mut transform) in query.iter_mut() {
        let config = &controller.config;
        body.linear_damping = config.drag_for(state.grounded);

        if config.variant == ControllerVariant::Sekiro {
            if state.rolling {
                let mut velocity = state.roll_direction * config.sekiro.roll_speed;
                velocity.y = body.velocity.y;
                body.velocity = velocity;
                continue;
            }
            if state.attacking {
                continue;
            }
        }

        let Some(direction) = state.move_direction else {
            continue;
        };

        let target = direction * state.target_speed;
        let force = movement_force(target, body.velocity, config.force_multiplier);
        body.add_force(force);
        transform.rotation = facing_step(transform.rotation, direction, config.rotation_speed, delta);
    }
}

/// Fixed система: горизонтальная скорость не выше целевой
pub fn clamp_locomotion_speed(mut query: Query<(&LocomotionController, &LocomotionState, &mut PhysicsBody)>) {
    for (controller, state, mut body) in query.iter_mut() {
        let windowed = controller.config.variant == ControllerVariant::Sekiro
            && (state.rolling || state.attacking);
        if windowed || state.move_direction.is_none() {
            continue;
        }

        body.velocity = clamp_planar_speed(body.velocity, state.target_speed);
    }
}
