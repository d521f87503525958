//! LocomotionState - runtime состояние контроллера
//!
//! Timed окна (roll/attack) и комбо живут здесь, ECS системы только
//! тикают их и отдают получившиеся параметры анимации.

use bevy::prelude::*;

use super::config::{LocomotionConfig, SekiroConfig};
use crate::animation::AnimationParam;

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct LocomotionState {
    pub move_input: Vec2,
    pub sprinting: bool,
    pub grounded: bool,
    /// Направление движения (flattened, normalized); `None` - нет intent
    pub move_direction: Option<Vec3>,
    /// Целевая горизонтальная скорость текущего intent
    pub target_speed: f32,
    pub moving: bool,

    // Sekiro
    pub rolling: bool,
    pub attacking: bool,
    pub roll_remaining: f32,
    pub attack_remaining: f32,
    /// 0 - вне комбо, иначе 1..=max_combo
    pub combo: u32,
    pub roll_direction: Vec3,

    // Souls
    pub armed: bool,
    pub blocking: bool,
    pub vials_left: u32,
}

impl LocomotionState {
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            move_input: Vec2::ZERO,
            sprinting: false,
            grounded: false,
            move_direction: None,
            target_speed: 0.0,
            moving: false,
            rolling: false,
            attacking: false,
            roll_remaining: 0.0,
            attack_remaining: 0.0,
            combo: 0,
            roll_direction: Vec3::Z,
            armed: true,
            blocking: false,
            vials_left: config.souls.vials,
        }
    }

    /// Roll окно (direction уже flattened)
    pub fn start_roll(&mut self, direction: Vec3, config: &SekiroConfig) {
        self.rolling = true;
        self.roll_remaining = config.roll_duration;
        self.roll_direction = direction;
    }

    /// Attack окно. Повторный удар пока окно открыто продолжает комбо
    /// (1 → 2 → … → max → 1). Возвращает номер удара.
    pub fn start_attack(&mut self, config: &SekiroConfig) -> u32 {
        let max_combo = config.max_combo.max(1);
        self.combo = if self.attacking {
            self.combo % max_combo + 1
        } else {
            1
        };
        self.attacking = true;
        self.attack_remaining = config.attack_duration;
        self.combo
    }

    /// Тик окон. Возвращает параметры анимации для истёкших окон.
    pub fn tick_windows(&mut self, delta: f32) -> Vec<AnimationParam> {
        let mut expired = Vec::new();

        if self.rolling {
            self.roll_remaining -= delta;
            if self.roll_remaining <= 0.0 {
                self.rolling = false;
                self.roll_remaining = 0.0;
                expired.push(AnimationParam::IsRolling(false));
            }
        }

        if self.attacking {
            self.attack_remaining -= delta;
            if self.attack_remaining <= 0.0 {
                self.attacking = false;
                self.attack_remaining = 0.0;
                self.combo = 0;
                expired.push(AnimationParam::ComboCount(0));
            }
        }

        expired
    }

    /// Сбросить intent движения (нет input / control lock)
    pub fn clear_intent(&mut self) {
        self.move_direction = None;
        self.target_speed = 0.0;
    }
}
