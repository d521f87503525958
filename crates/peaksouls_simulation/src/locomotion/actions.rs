//! Дискретные действия (edge-triggered) для обоих вариантов контроллера
//!
//! Каждое действие съедает ровно один edge из `PlayerInput`. Действия,
//! которых у варианта нет, тоже съедаются (edge не копится).

use bevy::prelude::*;

use super::config::LocomotionConfig;
use super::controller::move_direction;
use super::state::LocomotionState;
use crate::animation::{AnimationParam, AnimatorParameters};
use crate::components::Health;
use crate::error::{Result, SimulationError};
use crate::input::{InputAction, PlayerInput};
use crate::physics::PhysicsBody;

/// Edges, съеденные за кадр
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionEdges {
    pub jump: bool,
    pub roll: bool,
    pub attack: bool,
    pub block: bool,
    pub sheathe: bool,
    pub heal: bool,
}

impl ActionEdges {
    /// Съесть locomotion edges (LockOn остаётся камере)
    pub fn consume(input: &mut PlayerInput) -> Self {
        Self {
            jump: input.consume(InputAction::Jump),
            roll: input.consume(InputAction::Roll),
            attack: input.consume(InputAction::Attack),
            block: input.consume(InputAction::Block),
            sheathe: input.consume(InputAction::Sheathe),
            heal: input.consume(InputAction::Heal),
        }
    }
}

/// Souls: roll / jump / block / sheathe / attack / heal
///
/// Heal без `Health` на entity - ошибка коллаборатора, фляга не тратится.
pub fn apply_souls_actions(
    edges: ActionEdges,
    state: &mut LocomotionState,
    config: &LocomotionConfig,
    body: &mut PhysicsBody,
    health: Option<&mut Health>,
    params: &mut AnimatorParameters,
) -> Result<()> {
    if edges.roll {
        params.set(AnimationParam::Roll);
    }

    if edges.jump && state.grounded {
        body.add_impulse(Vec3::Y * config.jump_force);
        params.set(AnimationParam::Jump);
    }

    if edges.block {
        state.blocking = !state.blocking;
        params.set(AnimationParam::Blocking(state.blocking));
    }

    if edges.sheathe {
        state.armed = !state.armed;
        params.set(AnimationParam::Armed(state.armed));
    }

    if edges.attack && state.armed {
        params.set(AnimationParam::Attack);
    }

    if edges.heal && state.vials_left > 0 {
        let health = health.ok_or(SimulationError::MissingCollaborator { what: "Health" })?;
        state.vials_left -= 1;
        health.heal(config.souls.heal_amount);
        params.set(AnimationParam::Heal);
    }

    Ok(())
}

/// Sekiro: jump / roll / attack с окнами
///
/// `facing` - текущий forward тела (направление roll без input).
pub fn apply_sekiro_actions(
    edges: ActionEdges,
    state: &mut LocomotionState,
    config: &LocomotionConfig,
    body: &mut PhysicsBody,
    camera_forward: Vec3,
    facing: Vec3,
    params: &mut AnimatorParameters,
) {
    if edges.jump && state.grounded && !state.rolling && !state.attacking {
        body.add_impulse(Vec3::Y * config.jump_force);
        state.grounded = false;
        params.set(AnimationParam::Jump);
        params.set(AnimationParam::FreeFall(true));
    }

    if edges.roll && !state.rolling && !state.attacking && state.grounded {
        let direction = move_direction(state.move_input, camera_forward)
            .or_else(|| Vec3::new(facing.x, 0.0, facing.z).try_normalize())
            .unwrap_or(Vec3::Z);
        state.start_roll(direction, &config.sekiro);
        params.set(AnimationParam::Roll);
        params.set(AnimationParam::IsRolling(true));
    }

    if edges.attack && !state.rolling && state.grounded {
        let combo = state.start_attack(&config.sekiro);
        params.set(AnimationParam::Attack);
        params.set(AnimationParam::ComboCount(combo));
    }
}
