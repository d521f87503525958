//! PhysicsBody - force-based тело для персонажей
//!
//! Модель rigidbody:
//! - `add_force` - непрерывная сила (Newton), действует один шаг
//! - `add_impulse` - мгновенное изменение импульса
//! - linear damping: v *= 1 / (1 + damping * dt)

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::logger;
use crate::spatial::{CollisionWorld, LayerMask, SpatialQuery, LAYER_GROUND};

/// Гравитация (m/s²)
pub const GRAVITY: f32 = -9.81;

/// Запас ray cast'а под ногами для contact resolution
const CONTACT_SKIN: f32 = 0.05;

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
    /// Масса (kg)
    pub mass: f32,
    /// Linear damping (drag)
    pub linear_damping: f32,
    /// Множитель гравитации (0 - тело не падает)
    pub gravity_scale: f32,
    /// Расстояние от центра тела до ног
    pub support_height: f32,
    /// Слои, на которые тело может опираться
    pub ground_layers: LayerMask,
    /// Стоит ли тело на поверхности после последнего шага
    pub on_ground: bool,
    force: Vec3,
    impulse: Vec3,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            mass: 1.0,
            linear_damping: 0.0,
            gravity_scale: 1.0,
            support_height: 0.9, // capsule 0.5 + 0.4
            ground_layers: LAYER_GROUND,
            on_ground: false,
            force: Vec3::ZERO,
            impulse: Vec3::ZERO,
        }
    }
}

impl PhysicsBody {
    /// Тело с опорой на `ground_layers` на высоте `support_height` под центром
    pub fn new(support_height: f32, ground_layers: LayerMask, linear_damping: f32) -> Self {
        Self {
            support_height,
            ground_layers,
            linear_damping,
            ..default()
        }
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.impulse += impulse;
    }

    /// Горизонтальная составляющая скорости (Y = 0)
    pub fn planar_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z)
    }

    /// Заменить горизонтальную скорость, вертикаль сохраняется
    pub fn set_planar_velocity(&mut self, planar: Vec3) {
        self.velocity.x = planar.x;
        self.velocity.z = planar.z;
    }

    /// Один шаг интеграции. Возвращает смещение за шаг.
    pub fn integrate(&mut self, delta: f32) -> Vec3 {
        let inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
        let gravity = Vec3::Y * GRAVITY * self.gravity_scale;

        self.velocity += (self.force * inv_mass + gravity) * delta + self.impulse * inv_mass;
        self.velocity *= 1.0 / (1.0 + self.linear_damping * delta);

        self.force = Vec3::ZERO;
        self.impulse = Vec3::ZERO;

        self.velocity * delta
    }
}

/// Система: интеграция velocity → Transform
pub fn integrate_bodies(mut query: Query<(&mut PhysicsBody, &mut Transform)>, time: Res<Time>) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (mut body, mut transform) in query.iter_mut() {
        transform.translation += body.integrate(delta);
    }
}

/// Система: тела не проваливаются сквозь ground layers
///
/// Ray cast из центра вниз на `support_height + skin`. Если ноги ниже
/// поверхности - выталкиваем вверх и гасим падение.
pub fn resolve_ground_contacts(
    world: Option<Res<CollisionWorld>>,
    mut query: Query<(&mut PhysicsBody, &mut Transform)>,
    mut reported: Local<bool>,
) {
    let Some(world) = world else {
        if !*reported {
            *reported = true;
            logger::log_error("resolve_ground_contacts: CollisionWorld не зарегистрирован");
        }
        return;
    };

    for (mut body, mut transform) in query.iter_mut() {
        let probe = body.support_height + CONTACT_SKIN;
        let hit = world.cast_ray(transform.translation, Vec3::NEG_Y, probe, body.ground_layers);

        body.on_ground = false;
        let Some(hit) = hit else {
            continue;
        };

        if hit.distance <= body.support_height {
            transform.translation.y += body.support_height - hit.distance;
            if body.velocity.y < 0.0 {
                body.velocity.y = 0.0;
            }
        }
        body.on_ground = body.velocity.y <= 0.0;
    }
}

/// Система: PhysicsBody.velocity → rapier `Velocity`
pub fn sync_velocity_to_rapier(mut query: Query<(&PhysicsBody, &mut Velocity)>) {
    for (body, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = body.velocity;
    }
}
