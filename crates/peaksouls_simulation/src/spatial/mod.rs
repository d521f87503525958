//! Spatial queries - ray/sphere casts и overlap против collision world
//!
//! Архитектура:
//! - `SpatialQuery` trait - шов между логикой (камера, таргетинг, ground
//!   probe) и физическим миром
//! - `CollisionWorld` - headless реализация на rapier `QueryPipeline`,
//!   синхронизируется из `Collider` + `CollisionGroups` каждый кадр
//!
//! Семантика casts: коллайдер, внутри которого
//! стартует cast, игнорируется; побеждает ближайший hit.

use bevy::prelude::*;

pub mod layers;
pub mod world;

pub use layers::*;
pub use world::{sync_collision_world, CollisionWorld, WorldCollider};

use crate::error::{Result, SimulationError};

/// Битовая маска collision layers (совпадает с `Group::bits()` rapier)
pub type LayerMask = u32;

/// Результат ray/sphere cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    pub entity: Entity,
    /// Дистанция вдоль направления cast'а (для sphere cast - путь центра сферы)
    pub distance: f32,
    /// Точка контакта на поверхности коллайдера
    pub point: Vec3,
    pub normal: Vec3,
}

/// Результат overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub entity: Entity,
    pub position: Vec3,
}

/// Провайдер spatial queries (физический мир хоста)
pub trait SpatialQuery {
    /// Ray cast. `direction` нормализуется; нулевое направление → `None`.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SpatialHit>;

    /// Sphere cast (swept sphere) радиуса `radius`.
    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SpatialHit>;

    /// Все коллайдеры из `mask`, пересекающие сферу.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap>;
}

/// Достаёт world из `Option<Res<CollisionWorld>>` с явной ошибкой
pub fn require_world(world: Option<&CollisionWorld>) -> Result<&CollisionWorld> {
    world.ok_or(SimulationError::SpatialWorldUnavailable)
}

/// Plugin: регистрирует `CollisionWorld` и его синхронизацию
pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        use crate::SimulationSet;

        app.init_resource::<CollisionWorld>()
            .add_systems(Update, sync_collision_world.in_set(SimulationSet::Sync))
            // Камера работает после physics step - ресинк перед ней
            .add_systems(
                PostUpdate,
                sync_collision_world.before(SimulationSet::Camera),
            );
    }
}
