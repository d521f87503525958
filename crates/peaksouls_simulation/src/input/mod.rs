//! Player input - polled состояние осей + edge-triggered действия
//!
//! Архитектура:
//! - `PlayerInput` компонент на player entity (для headless тестов - mock
//!   input напрямую через компонент)
//! - `DeviceInputPlugin` заполняет его из клавиатуры/мыши/геймпада
//! - Edge флаги защёлкиваются до тех пор, пока их не съест потребитель
//!   (`consume`), один edge = одно действие

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use crate::components::Player;
use crate::SimulationSet;

/// Масштаб сырого mouse delta (пиксели) в axis units
pub const MOUSE_AXIS_SCALE: f32 = 0.1;

/// Look input: pointer (мышь) и правый стик
///
/// Конвенция: x вправо, y вниз (как screen delta).
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct LookInput {
    /// Mouse delta за кадр в axis units
    pub pointer: Vec2,
    /// Правый стик, -1..1 (без deadzone - её применяет камера)
    pub stick: Vec2,
}

/// Дискретные действия (edge-triggered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum InputAction {
    Jump,
    Roll,
    Attack,
    Block,
    Sheathe,
    Heal,
    LockOn,
}

#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PlayerInput {
    /// Движение: x - strafe, y - вперёд
    pub move_axis: Vec2,
    pub look: LookInput,
    /// Модификатор (держим)
    pub sprint: bool,
    jump: bool,
    roll: bool,
    attack: bool,
    block: bool,
    sheathe: bool,
    heal: bool,
    lock_on: bool,
}

impl PlayerInput {
    fn edge_mut(&mut self, action: InputAction) -> &mut bool {
        match action {
            InputAction::Jump => &mut self.jump,
            InputAction::Roll => &mut self.roll,
            InputAction::Attack => &mut self.attack,
            InputAction::Block => &mut self.block,
            InputAction::Sheathe => &mut self.sheathe,
            InputAction::Heal => &mut self.heal,
            InputAction::LockOn => &mut self.lock_on,
        }
    }

    /// Зарегистрировать нажатие (edge)
    pub fn press(&mut self, action: InputAction) {
        *self.edge_mut(action) = true;
    }

    /// Съесть edge. true - действие было нажато с прошлого consume.
    pub fn consume(&mut self, action: InputAction) -> bool {
        std::mem::take(self.edge_mut(action))
    }

    pub fn is_pressed(&self, action: InputAction) -> bool {
        match action {
            InputAction::Jump => self.jump,
            InputAction::Roll => self.roll,
            InputAction::Attack => self.attack,
            InputAction::Block => self.block,
            InputAction::Sheathe => self.sheathe,
            InputAction::Heal => self.heal,
            InputAction::LockOn => self.lock_on,
        }
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

/// Маппинг устройств → `PlayerInput`
///
/// Bindings:
/// - WASD / левый стик - движение, LeftShift - sprint
/// - Space / South - jump, E / East - roll, LMB - attack, RMB - block
/// - Y - sheathe, R - heal, Tab / правый стик (клик) - lock-on
pub fn map_device_input(
    keys: &ButtonInput<KeyCode>,
    mouse_buttons: &ButtonInput<MouseButton>,
    mouse_delta: Vec2,
    gamepad: Option<&Gamepad>,
    input: &mut PlayerInput,
) {
    let keyboard_move = Vec2::new(
        axis(keys.pressed(KeyCode::KeyA), keys.pressed(KeyCode::KeyD)),
        axis(keys.pressed(KeyCode::KeyS), keys.pressed(KeyCode::KeyW)),
    );
    let stick_move = gamepad.map_or(Vec2::ZERO, |pad| pad.left_stick());
    input.move_axis = if keyboard_move != Vec2::ZERO {
        keyboard_move.clamp_length_max(1.0)
    } else {
        stick_move
    };

    input.look = LookInput {
        pointer: mouse_delta * MOUSE_AXIS_SCALE,
        // Стик вверх = y вниз в screen конвенции
        stick: gamepad.map_or(Vec2::ZERO, |pad| {
            let stick = pad.right_stick();
            Vec2::new(stick.x, -stick.y)
        }),
    };

    input.sprint = keys.pressed(KeyCode::ShiftLeft)
        || gamepad.is_some_and(|pad| pad.pressed(GamepadButton::LeftThumb));

    let pad_pressed = |button: GamepadButton| gamepad.is_some_and(|pad| pad.just_pressed(button));

    let bindings = [
        (InputAction::Jump, keys.just_pressed(KeyCode::Space) || pad_pressed(GamepadButton::South)),
        (InputAction::Roll, keys.just_pressed(KeyCode::KeyE) || pad_pressed(GamepadButton::East)),
        (
            InputAction::Attack,
            mouse_buttons.just_pressed(MouseButton::Left) || pad_pressed(GamepadButton::RightTrigger),
        ),
        (
            InputAction::Block,
            mouse_buttons.just_pressed(MouseButton::Right) || pad_pressed(GamepadButton::LeftTrigger),
        ),
        (InputAction::Sheathe, keys.just_pressed(KeyCode::KeyY) || pad_pressed(GamepadButton::North)),
        (InputAction::Heal, keys.just_pressed(KeyCode::KeyR) || pad_pressed(GamepadButton::West)),
        (
            InputAction::LockOn,
            keys.just_pressed(KeyCode::Tab) || pad_pressed(GamepadButton::RightThumb),
        ),
    ];

    for (action, pressed) in bindings {
        if pressed {
            input.press(action);
        }
    }
}

/// Система: устройства → `PlayerInput` игрока
///
/// Без `InputPlugin` (headless) ресурсов нет - система ничего не делает.
pub fn read_device_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mouse_buttons: Option<Res<ButtonInput<MouseButton>>>,
    mouse_motion: Option<Res<AccumulatedMouseMotion>>,
    gamepads: Query<&Gamepad>,
    mut players: Query<&mut PlayerInput, With<Player>>,
) {
    let (Some(keys), Some(mouse_buttons)) = (keys, mouse_buttons) else {
        return;
    };

    let mouse_delta = mouse_motion.map_or(Vec2::ZERO, |motion| motion.delta);
    let gamepad = gamepads.iter().next();

    for mut input in players.iter_mut() {
        map_device_input(&keys, &mouse_buttons, mouse_delta, gamepad, &mut input);
    }
}

/// Plugin: device input (добавлять вместе с `InputPlugin`/`DefaultPlugins`)
pub struct DeviceInputPlugin;

impl Plugin for DeviceInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, read_device_input.in_set(SimulationSet::Input));
    }
}
