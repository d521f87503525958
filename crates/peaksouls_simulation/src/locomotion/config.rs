//! Locomotion конфигурация и пресеты вариантов

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::spatial::{LayerMask, LAYER_GROUND};

/// Вариант контроллера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum ControllerVariant {
    /// Общий контроллер: toggles (block/sheathe), фляги, trigger-атака
    Souls,
    /// Боевой контроллер: roll/attack окна, комбо
    #[default]
    Sekiro,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SoulsConfig {
    /// Фляги на старте
    pub vials: u32,
    pub heal_amount: u32,
}

impl Default for SoulsConfig {
    fn default() -> Self {
        Self {
            vials: 5,
            heal_amount: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SekiroConfig {
    pub roll_speed: f32,
    /// Длительность roll окна (секунды)
    pub roll_duration: f32,
    /// Длительность attack окна (секунды)
    pub attack_duration: f32,
    pub max_combo: u32,
}

impl Default for SekiroConfig {
    fn default() -> Self {
        Self {
            roll_speed: 10.0,
            roll_duration: 0.5,
            attack_duration: 1.0,
            max_combo: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct LocomotionConfig {
    pub variant: ControllerVariant,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    /// Скорость поворота к направлению движения (slerp factor/сек)
    pub rotation_speed: f32,
    /// Импульс прыжка (вверх)
    pub jump_force: f32,
    /// Linear damping на земле / в воздухе
    pub ground_drag: f32,
    pub air_drag: f32,
    /// force = (target − planar velocity) * force_multiplier
    pub force_multiplier: f32,
    /// Запас ground probe ниже ног
    pub ground_probe_distance: f32,
    /// Расстояние от центра тела до ног
    pub body_half_height: f32,
    pub ground_layers: LayerMask,
    pub souls: SoulsConfig,
    pub sekiro: SekiroConfig,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self::sekiro()
    }
}

impl LocomotionConfig {
    /// Пресет боевого контроллера
    pub fn sekiro() -> Self {
        Self {
            variant: ControllerVariant::Sekiro,
            walk_speed: 5.0,
            sprint_speed: 8.0,
            rotation_speed: 10.0,
            jump_force: 5.0,
            ground_drag: 6.0,
            air_drag: 1.0,
            force_multiplier: 10.0,
            ground_probe_distance: 0.2,
            body_half_height: 0.9,
            ground_layers: LAYER_GROUND,
            souls: SoulsConfig::default(),
            sekiro: SekiroConfig::default(),
        }
    }

    /// Пресет общего контроллера (медленнее, поворот мягче)
    pub fn souls() -> Self {
        Self {
            variant: ControllerVariant::Souls,
            walk_speed: 3.0,
            sprint_speed: 5.0,
            rotation_speed: 4.0,
            ground_probe_distance: 0.3,
            ..Self::sekiro()
        }
    }

    pub fn speed_for(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint_speed
        } else {
            self.walk_speed
        }
    }

    pub fn drag_for(&self, grounded: bool) -> f32 {
        if grounded {
            self.ground_drag
        } else {
            self.air_drag
        }
    }
}
