//! Camera rig - third-person камера с lock-on
//!
//! # Режимы
//! - **Free**: yaw/pitch от мыши/стика, сферический offset вокруг pivot
//!   (anchor + height), смотрим на pivot
//! - **Locked**: камера за спиной игрока на линии игрок→цель, смотрим в
//!   середину между ними
//!
//! # Углы
//! Градусы. `pitch > 0` - камера выше pivot и смотрит вниз.
//! Yaw 0 - камера смотрит вдоль +Z.
//!
//! Вся логика здесь чистая (без ECS), системы в `camera/mod.rs` только
//! достают данные и пишут результат в Transform.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::smoothing::smooth_damp;
use crate::input::LookInput;
use crate::spatial::{LayerMask, SpatialHit, SpatialQuery, MASK_CAMERA_OCCLUDERS};
use crate::targeting::{select_target, TargetCandidate, TargetingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct CameraRigConfig {
    /// Дистанция от pivot (метры)
    pub distance: f32,
    /// Ближе этого камера не подходит даже при occlusion
    pub min_distance: f32,
    /// Верхняя граница для `distance` (валидация конфига)
    pub max_distance: f32,
    /// Высота pivot над anchor
    pub height: f32,
    /// Скорость сглаживания (smooth time = 1 / smooth_speed)
    pub smooth_speed: f32,
    /// Градусы/сек на единицу input
    pub yaw_speed: f32,
    pub pitch_speed: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub initial_pitch: f32,
    pub stick_sensitivity: f32,
    pub invert_y: bool,
    pub deadzone: f32,
    /// Слои, в которые упирается камера
    pub collision_layers: LayerMask,
    /// Минимальная высота камеры над anchor (проба не цепляет пол)
    pub min_height: f32,
    /// Высота старта occlusion пробы над anchor
    pub probe_height: f32,
    pub probe_radius: f32,
    /// Отступ от точки hit'а вдоль пробы
    pub probe_back_off: f32,
    /// Дальше этого lock-on срывается
    pub lock_break_distance: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            min_distance: 2.0,
            max_distance: 7.0,
            height: 2.0,
            smooth_speed: 10.0,
            yaw_speed: 120.0,
            pitch_speed: 120.0,
            pitch_min: -40.0,
            pitch_max: 85.0,
            initial_pitch: 20.0,
            stick_sensitivity: 3.0,
            invert_y: false,
            deadzone: 0.1,
            collision_layers: MASK_CAMERA_OCCLUDERS,
            min_height: 0.5,
            probe_height: 1.5,
            probe_radius: 0.2,
            probe_back_off: 0.1,
            lock_break_distance: 40.0,
        }
    }
}

impl CameraRigConfig {
    pub fn smooth_time(&self) -> f32 {
        if self.smooth_speed > 0.0 {
            1.0 / self.smooth_speed
        } else {
            0.0
        }
    }
}

/// Режим камеры
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum RigMode {
    #[default]
    Free,
    /// Weak reference на цель - entity проверяется каждый кадр
    Locked { target: Entity },
}

impl RigMode {
    pub fn target(&self) -> Option<Entity> {
        match self {
            RigMode::Free => None,
            RigMode::Locked { target } => Some(*target),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, RigMode::Locked { .. })
    }
}

/// Желаемая поза камеры за кадр
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Результат occlusion пробы
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occlusion {
    pub position: Vec3,
    pub probe_origin: Vec3,
    /// Дистанция от anchor до (поднятой) желаемой позиции, она же длина cast'а
    pub desired_distance: f32,
    pub hit: Option<SpatialHit>,
}

/// Результат нажатия lock-on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockToggle {
    Acquired(TargetCandidate),
    Released(Entity),
    /// Кандидатов нет - остались в Free
    NoTarget,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CameraRig {
    /// Entity за которым следует камера (anchor)
    pub follow: Entity,
    pub config: CameraRigConfig,
    pub targeting: TargetingConfig,
    pub yaw: f32,
    pub pitch: f32,
    /// Фактическая дистанция после occlusion
    pub current_distance: f32,
    /// Состояние SmoothDamp
    pub smooth_velocity: Vec3,
    pub mode: RigMode,
    /// Точка, на которую смотрит камера (последний кадр)
    pub look_at: Vec3,
    pub initialized: bool,
}

impl CameraRig {
    pub fn new(follow: Entity, config: CameraRigConfig, targeting: TargetingConfig) -> Self {
        Self {
            follow,
            config,
            targeting,
            yaw: 0.0,
            pitch: config.initial_pitch,
            current_distance: config.distance,
            smooth_velocity: Vec3::ZERO,
            mode: RigMode::Free,
            look_at: Vec3::ZERO,
            initialized: false,
        }
    }

    /// Камера за спиной anchor'а, начальный pitch
    pub fn initialize(&mut self, follow: &Transform) {
        let facing = follow.rotation * Vec3::Z;
        if let Some(yaw) = planar_yaw(facing) {
            self.yaw = yaw;
        }
        self.pitch = clamp_pitch(self.config.initial_pitch, &self.config);
        self.current_distance = self.config.distance;
        self.smooth_velocity = Vec3::ZERO;
        self.initialized = true;
    }

    /// Mouse/stick → yaw/pitch
    ///
    /// Мышь приоритетнее стика (кто двигался - тот и рулит). Deadzone
    /// применяется только к стику.
    pub fn apply_look_input(&mut self, look: LookInput, delta: f32) {
        let config = self.config;
        let stick = Vec2::new(
            apply_deadzone(look.stick.x, config.deadzone),
            apply_deadzone(look.stick.y, config.deadzone),
        );

        let x = if look.pointer.x != 0.0 {
            look.pointer.x
        } else {
            stick.x * config.stick_sensitivity
        };
        let mut y = if look.pointer.y != 0.0 {
            look.pointer.y
        } else {
            stick.y * config.stick_sensitivity
        };
        if config.invert_y {
            y = -y;
        }

        self.yaw = wrap_degrees(self.yaw + x * config.yaw_speed * delta);
        self.pitch = clamp_pitch(self.pitch + y * config.pitch_speed * delta, &config);
    }

    /// Free режим: сферический offset + occlusion + min distance
    pub fn free_pose(&mut self, query: &impl SpatialQuery, anchor: Vec3) -> RigPose {
        let config = self.config;
        let pivot = anchor + Vec3::Y * config.height;
        let direction = orbit_direction(self.yaw, self.pitch);
        let desired = pivot - direction * config.distance;

        let mut position = resolve_occlusion(query, anchor, desired, &config).position;
        let mut distance = pivot.distance(position);

        // Слишком близко - выталкиваем на минимальную дистанцию по той же оси
        if distance < config.min_distance {
            position = pivot - direction * config.min_distance;
            distance = config.min_distance;
        }

        self.current_distance = distance;
        RigPose {
            position,
            look_at: pivot,
        }
    }

    /// Locked режим: за спиной игрока на линии игрок→цель
    pub fn locked_pose(&mut self, query: &impl SpatialQuery, anchor: Vec3, target: Vec3) -> RigPose {
        let config = self.config;
        let direction = (target - anchor)
            .try_normalize()
            .unwrap_or_else(|| orbit_direction(self.yaw, 0.0));

        let mut desired = anchor - direction * config.distance;
        desired.y = anchor.y + config.height;

        let position = resolve_occlusion(query, anchor, desired, &config).position;

        // Yaw следует за lock'ом - после release камера не дёргается назад
        if let Some(yaw) = planar_yaw(direction) {
            self.yaw = yaw;
        }

        self.current_distance = anchor.distance(position);
        RigPose {
            position,
            look_at: anchor.lerp(target, 0.5),
        }
    }

    /// Lock-on toggle (edge)
    pub fn toggle_lock_on(&mut self, query: &impl SpatialQuery, anchor: Vec3) -> LockToggle {
        if let RigMode::Locked { target } = self.mode {
            self.mode = RigMode::Free;
            return LockToggle::Released(target);
        }

        match select_target(query, anchor, &self.targeting) {
            Some(candidate) => {
                self.mode = RigMode::Locked {
                    target: candidate.entity,
                };
                LockToggle::Acquired(candidate)
            }
            None => LockToggle::NoTarget,
        }
    }

    /// Нужно ли сорвать lock (цель пропала или ушла слишком далеко)
    pub fn should_release(&self, anchor: Vec3, target: Option<Vec3>) -> bool {
        if !self.mode.is_locked() {
            return false;
        }
        match target {
            None => true,
            Some(position) => anchor.distance(position) > self.config.lock_break_distance,
        }
    }

    pub fn release(&mut self) -> Option<Entity> {
        let target = self.mode.target();
        self.mode = RigMode::Free;
        target
    }

    /// SmoothDamp текущей позиции к позе
    pub fn smooth_toward(&mut self, current: Vec3, pose: &RigPose, delta: f32) -> Vec3 {
        let smooth_time = self.config.smooth_time();
        smooth_damp(current, pose.position, &mut self.smooth_velocity, smooth_time, delta)
    }
}

/// Направление взгляда камеры (от камеры к pivot)
pub fn orbit_direction(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(
        yaw.sin() * pitch.cos(),
        -pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
}

/// Occlusion: поднимаем желаемую позицию над полом, пускаем sphere cast
/// от точки над anchor, при hit'е ставим камеру чуть раньше точки контакта
pub fn resolve_occlusion(
    query: &impl SpatialQuery,
    anchor: Vec3,
    desired: Vec3,
    config: &CameraRigConfig,
) -> Occlusion {
    let mut desired = desired;
    desired.y = desired.y.max(anchor.y + config.min_height);

    let probe_origin = anchor + Vec3::Y * config.probe_height;
    // Длина cast'а - от anchor, не от поднятой точки старта
    let desired_distance = anchor.distance(desired);

    let Some(direction) = (desired - probe_origin).try_normalize() else {
        return Occlusion {
            position: desired,
            probe_origin,
            desired_distance,
            hit: None,
        };
    };

    let hit = query.cast_sphere(
        probe_origin,
        config.probe_radius,
        direction,
        desired_distance,
        config.collision_layers,
    );

    let position = match hit {
        Some(hit) => probe_origin + direction * (hit.distance - config.probe_back_off).max(0.0),
        None => desired,
    };

    Occlusion {
        position,
        probe_origin,
        desired_distance,
        hit,
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

fn clamp_pitch(pitch: f32, config: &CameraRigConfig) -> f32 {
    // max/min вместо clamp - не паникуем на битом конфиге
    pitch.max(config.pitch_min).min(config.pitch_max)
}

fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Yaw (градусы) горизонтальной проекции направления
fn planar_yaw(direction: Vec3) -> Option<f32> {
    let planar = Vec3::new(direction.x, 0.0, direction.z);
    if planar.length_squared() < 1e-6 {
        return None;
    }
    Some(direction.x.atan2(direction.z).to_degrees())
}
