//! Locomotion controller - input → целевая скорость → сила
//!
//! Чистые функции без ECS:
//! - `move_direction` - 2D input в плоскости камеры
//! - `target_planar_velocity` - желаемая горизонтальная скорость
//! - `movement_force` - P-регулятор скорости
//! - `facing_step` / `clamp_planar_speed` - поворот и ограничение после шага
//! - `probe_ground` - ray cast под ногами

use bevy::prelude::*;

use super::config::LocomotionConfig;
use crate::spatial::SpatialQuery;

/// Controller на entity игрока
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct LocomotionController {
    pub config: LocomotionConfig,
    /// Камера, задающая базис движения (`None` - мировые оси)
    pub camera: Option<Entity>,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            camera: None,
        }
    }

    pub fn with_camera(mut self, camera: Entity) -> Self {
        self.camera = Some(camera);
        self
    }
}

/// Правый вектор камеры в плоскости XZ
pub fn camera_right(forward: Vec3) -> Vec3 {
    forward.cross(Vec3::Y)
}

/// Направление движения: forward * y + right * x, flattened, normalized
pub fn move_direction(input: Vec2, camera_forward: Vec3) -> Option<Vec3> {
    if input == Vec2::ZERO {
        return None;
    }

    let mut direction = camera_forward * input.y + camera_right(camera_forward) * input.x;
    direction.y = 0.0;
    direction.try_normalize()
}

/// Целевая горизонтальная скорость для input
pub fn target_planar_velocity(
    input: Vec2,
    camera_forward: Vec3,
    sprinting: bool,
    config: &LocomotionConfig,
) -> Vec3 {
    move_direction(input, camera_forward)
        .map_or(Vec3::ZERO, |direction| direction * config.speed_for(sprinting))
}

/// Сила: разница целевой и текущей горизонтальной скорости (вертикаль не трогаем)
pub fn movement_force(target: Vec3, velocity: Vec3, multiplier: f32) -> Vec3 {
    let mut diff = target - velocity;
    diff.y = 0.0;
    diff * multiplier
}

/// Поворот к направлению движения (yaw 0 = +Z)
pub fn facing_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_y(direction.x.atan2(direction.z))
}

/// Один шаг поворота: slerp с фактором `rate * dt` (не больше 1)
pub fn facing_step(current: Quat, direction: Vec3, rate: f32, delta: f32) -> Quat {
    let t = (rate * delta).clamp(0.0, 1.0);
    current.slerp(facing_rotation(direction), t)
}

/// Ограничение горизонтальной скорости, вертикаль сохраняется
pub fn clamp_planar_speed(velocity: Vec3, max_speed: f32) -> Vec3 {
    let planar = Vec3::new(velocity.x, 0.0, velocity.z);
    if planar.length() <= max_speed {
        return velocity;
    }

    let limited = planar.normalize_or_zero() * max_speed;
    Vec3::new(limited.x, velocity.y, limited.z)
}

/// Ground probe: ray вниз из центра тела
pub fn probe_ground(query: &impl SpatialQuery, center: Vec3, config: &LocomotionConfig) -> bool {
    query
        .cast_ray(
            center,
            Vec3::NEG_Y,
            config.body_half_height + config.ground_probe_distance,
            config.ground_layers,
        )
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier3d::prelude::Collider;
    use crate::spatial::{CollisionWorld, LAYER_ENVIRONMENT, LAYER_GROUND};
    use approx::assert_relative_eq;

    #[test]
    fn test_sprint_forward_target_velocity() {
        let config = LocomotionConfig::default();
        let velocity = target_planar_velocity(Vec2::new(0.0, 1.0), Vec3::Z, true, &config);
        assert!((velocity - Vec3::new(0.0, 0.0, 8.0)).length() < 1e-5);
    }

    #[test]
    fn test_zero_input_no_intent() {
        let config = LocomotionConfig::default();
        assert!(move_direction(Vec2::ZERO, Vec3::Z).is_none());
        assert_eq!(
            target_planar_velocity(Vec2::ZERO, Vec3::Z, true, &config),
            Vec3::ZERO
        );
    }

    #[test]
    fn test_direction_flattened_from_pitched_camera() {
        // Камера смотрит вниз под 45°
        let forward = Vec3::new(0.0, -1.0, 1.0).normalize();
        let direction = move_direction(Vec2::new(0.0, 1.0), forward).unwrap();
        assert_relative_eq!(direction.y, 0.0);
        assert_relative_eq!(direction.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_strafe_uses_camera_right() {
        let direction = move_direction(Vec2::new(1.0, 0.0), Vec3::Z).unwrap();
        assert!((direction - camera_right(Vec3::Z)).length() < 1e-5);
        assert_relative_eq!(direction.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_movement_force_ignores_vertical() {
        let force = movement_force(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, -3.0, 2.0), 10.0);
        assert_eq!(force, Vec3::new(-10.0, 0.0, 30.0));
    }

    #[test]
    fn test_clamp_planar_speed() {
        let clamped = clamp_planar_speed(Vec3::new(6.0, -2.0, 8.0), 5.0);
        assert_relative_eq!(Vec3::new(clamped.x, 0.0, clamped.z).length(), 5.0, epsilon = 1e-5);
        assert_relative_eq!(clamped.y, -2.0);

        let slow = Vec3::new(1.0, 4.0, 1.0);
        assert_eq!(clamp_planar_speed(slow, 5.0), slow);
    }

    #[test]
    fn test_facing_step_converges() {
        let mut rotation = Quat::IDENTITY;
        for _ in 0..200 {
            rotation = facing_step(rotation, Vec3::X, 10.0, 1.0 / 64.0);
        }
        let facing = rotation * Vec3::Z;
        assert!((facing - Vec3::X).length() < 1e-3);

        // Большой dt - не перелетаем
        let snapped = facing_step(Quat::IDENTITY, Vec3::X, 10.0, 1.0);
        assert!((snapped * Vec3::Z - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_probe_ground_respects_layers() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            Entity::from_raw(1),
            Collider::halfspace(Vec3::Y).unwrap(),
            Vec3::ZERO,
            Quat::IDENTITY,
            LAYER_GROUND,
        );
        let config = LocomotionConfig::default();

        assert!(probe_ground(&world, Vec3::new(0.0, 0.9, 0.0), &config));
        assert!(!probe_ground(&world, Vec3::new(0.0, 2.0, 0.0), &config));

        let mut wrong_layer = config;
        wrong_layer.ground_layers = LAYER_ENVIRONMENT;
        assert!(!probe_ground(&world, Vec3::new(0.0, 0.9, 0.0), &wrong_layer));
    }
}
