//! CollisionWorld - headless реализация `SpatialQuery` поверх rapier
//!
//! Источник геометрии:
//! - rapier `Collider` + `CollisionGroups` + `Transform` (пересобирается каждый кадр)
//! - статические коллайдеры, добавленные напрямую через `insert_static`
//!   (не трогаются при ресинке)
//!
//! Запросы идут через rapier `QueryPipeline` (BVH broad-phase без симуляции).
//! Порядок вставки детерминирован (сортировка по Entity).

use std::fmt;

use bevy::prelude::*;
use bevy_rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use bevy_rapier3d::parry::query::{DefaultQueryDispatcher, ShapeCastOptions};
use bevy_rapier3d::prelude::{Collider, CollisionGroups};
use bevy_rapier3d::rapier::prelude::{
    Ball, BroadPhase, BroadPhaseBvh, ColliderBuilder, ColliderHandle, ColliderSet, Group,
    IntegrationParameters, InteractionGroups, Isometry, Point, PointQuery, QueryFilter,
    QueryPipeline, Ray, RigidBodySet, Vector,
};

use super::{LayerMask, Overlap, SpatialHit, SpatialQuery, MASK_ALL};
use crate::logger;

/// Касание на старте cast'а считается "внутри"
const START_TOLERANCE: f32 = 1e-4;

/// Один коллайдер в мире
#[derive(Clone)]
pub struct WorldCollider {
    pub entity: Entity,
    pub collider: Collider,
    pub translation: Vec3,
    pub rotation: Quat,
    /// Layer bits (memberships)
    pub layers: LayerMask,
}

impl WorldCollider {
    fn build(&self) -> bevy_rapier3d::rapier::prelude::Collider {
        ColliderBuilder::new(self.collider.raw.clone())
            .position(isometry(self.translation, self.rotation))
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(self.layers),
                Group::ALL,
            ))
            .user_data(self.entity.to_bits() as u128)
            .build()
    }
}

#[derive(Resource, Default, Clone)]
pub struct CollisionWorld {
    statics: Vec<WorldCollider>,
    synced: Vec<WorldCollider>,
    colliders: ColliderSet,
    bodies: RigidBodySet,
    broad_phase: BroadPhaseBvh,
}

impl fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("statics", &self.statics.len())
            .field("synced", &self.synced.len())
            .finish()
    }
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Статический коллайдер (переживает ресинк)
    pub fn insert_static(
        &mut self,
        entity: Entity,
        collider: Collider,
        translation: Vec3,
        rotation: Quat,
        layers: LayerMask,
    ) {
        self.statics.retain(|existing| existing.entity != entity);
        self.statics.push(WorldCollider {
            entity,
            collider,
            translation,
            rotation,
            layers,
        });
        self.statics.sort_by_key(|collider| collider.entity);
        self.rebuild();
    }

    pub fn remove(&mut self, entity: Entity) {
        self.statics.retain(|collider| collider.entity != entity);
        self.synced.retain(|collider| collider.entity != entity);
        self.rebuild();
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.synced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldCollider> {
        self.statics.iter().chain(self.synced.iter())
    }

    pub fn get(&self, entity: Entity) -> Option<&WorldCollider> {
        self.iter().find(|collider| collider.entity == entity)
    }

    /// Заменяет все synced коллайдеры новым набором
    pub fn replace_synced(&mut self, synced: impl IntoIterator<Item = WorldCollider>) {
        self.synced = synced.into_iter().collect();
        self.synced.sort_by_key(|collider| collider.entity);
        self.rebuild();
    }

    /// Пересборка rapier collider set и BVH
    fn rebuild(&mut self) {
        let mut colliders = ColliderSet::new();
        let handles: Vec<ColliderHandle> = self
            .statics
            .iter()
            .chain(self.synced.iter())
            .map(|collider| colliders.insert(collider.build()))
            .collect();

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &self.bodies,
            &handles,
            &[],
            &mut events,
        );

        self.colliders = colliders;
        self.broad_phase = broad_phase;
    }

    fn with_pipeline<T>(
        &self,
        mask: LayerMask,
        skip_containing: Option<(Vec3, f32)>,
        query: impl FnOnce(QueryPipeline<'_>) -> T,
    ) -> T {
        let groups = InteractionGroups::new(Group::ALL, Group::from_bits_truncate(mask));

        // Коллайдер, внутри которого стартует cast (с учётом радиуса), не участвует
        let starts_outside = |_: ColliderHandle, co: &bevy_rapier3d::rapier::prelude::Collider| {
            let Some((origin, radius)) = skip_containing else {
                return true;
            };
            co.shape().distance_to_point(co.position(), &point(origin), true)
                > radius + START_TOLERANCE
        };

        let filter = QueryFilter::new().groups(groups).predicate(&starts_outside);
        let pipeline = self.broad_phase.as_query_pipeline(
            &DefaultQueryDispatcher,
            &self.bodies,
            &self.colliders,
            filter,
        );
        query(pipeline)
    }

    fn entity_of(&self, handle: ColliderHandle) -> Option<Entity> {
        self.colliders
            .get(handle)
            .map(|co| Entity::from_bits(co.user_data as u64))
    }
}

impl SpatialQuery for CollisionWorld {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SpatialHit> {
        let direction = direction.try_normalize()?;
        let ray = Ray::new(point(origin), vector(direction));

        let (handle, intersection) = self.with_pipeline(mask, Some((origin, 0.0)), |pipeline| {
            pipeline.cast_ray_and_get_normal(&ray, max_distance, true)
        })?;

        Some(SpatialHit {
            entity: self.entity_of(handle)?,
            distance: intersection.time_of_impact,
            point: origin + direction * intersection.time_of_impact,
            normal: to_vec3(intersection.normal),
        })
    }

    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SpatialHit> {
        let direction = direction.try_normalize()?;
        let radius = radius.max(0.0);
        let ball = Ball::new(radius);
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let (handle, hit) = self.with_pipeline(mask, Some((origin, radius)), |pipeline| {
            pipeline.cast_shape(
                &Isometry::translation(origin.x, origin.y, origin.z),
                &vector(direction),
                &ball,
                options,
            )
        })?;

        Some(SpatialHit {
            entity: self.entity_of(handle)?,
            distance: hit.time_of_impact,
            // witness1/normal1 - на коллайдере мира, world space
            point: Vec3::new(hit.witness1.x, hit.witness1.y, hit.witness1.z),
            normal: to_vec3(hit.normal1.into_inner()),
        })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap> {
        let ball = Ball::new(radius.max(0.0));
        let mut found: Vec<Overlap> = self.with_pipeline(mask, None, |pipeline| {
            pipeline
                .intersect_shape(Isometry::translation(center.x, center.y, center.z), &ball)
                .map(|(_, co)| Overlap {
                    entity: Entity::from_bits(co.user_data as u64),
                    position: to_vec3(*co.translation()),
                })
                .collect()
        });

        // Детерминированный порядок вне зависимости от обхода BVH
        found.sort_by_key(|overlap| overlap.entity);
        found
    }
}

fn point(value: Vec3) -> Point<f32> {
    Point::new(value.x, value.y, value.z)
}

fn vector(value: Vec3) -> Vector<f32> {
    Vector::new(value.x, value.y, value.z)
}

fn to_vec3(value: Vector<f32>) -> Vec3 {
    Vec3::new(value.x, value.y, value.z)
}

fn isometry(translation: Vec3, rotation: Quat) -> Isometry<f32> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        rotation,
    )
}

/// Trimesh/heightfield и прочие composite shapes в headless мире не участвуют
pub fn is_supported(collider: &Collider) -> bool {
    collider.as_ball().is_some()
        || collider.as_cuboid().is_some()
        || collider.as_capsule().is_some()
        || collider.as_halfspace().is_some()
}

/// Система: пересобирает synced часть `CollisionWorld` из ECS коллайдеров
pub fn sync_collision_world(
    mut world: ResMut<CollisionWorld>,
    colliders: Query<(Entity, &Transform, &Collider, Option<&CollisionGroups>)>,
    mut unsupported: Local<Vec<Entity>>,
) {
    let mut synced = Vec::new();

    for (entity, transform, collider, groups) in colliders.iter() {
        if !is_supported(collider) {
            if !unsupported.contains(&entity) {
                unsupported.push(entity);
                logger::log_warning(&format!(
                    "sync_collision_world: unsupported collider shape on {:?}, skipped",
                    entity
                ));
            }
            continue;
        }

        synced.push(WorldCollider {
            entity,
            collider: collider.clone(),
            translation: transform.translation,
            rotation: transform.rotation,
            layers: groups.map_or(MASK_ALL, |groups| groups.memberships.bits()),
        });
    }

    world.replace_synced(synced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{LAYER_ENEMIES, LAYER_ENVIRONMENT, LAYER_GROUND};
    use approx::assert_relative_eq;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::ball(0.5),
            Vec3::new(0.0, 0.0, 10.0),
            Quat::IDENTITY,
            LAYER_ENVIRONMENT,
        );
        world.insert_static(
            entity(2),
            Collider::ball(0.5),
            Vec3::new(0.0, 0.0, 5.0),
            Quat::IDENTITY,
            LAYER_ENVIRONMENT,
        );

        let hit = world.cast_ray(Vec3::ZERO, Vec3::Z, 100.0, MASK_ALL).unwrap();
        assert_eq!(hit.entity, entity(2));
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-4);
        assert_relative_eq!(hit.point.z, 4.5, epsilon = 1e-4);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_mask_filters_layers() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::ball(0.5),
            Vec3::new(0.0, 0.0, 5.0),
            Quat::IDENTITY,
            LAYER_ENEMIES,
        );

        assert!(world.cast_ray(Vec3::ZERO, Vec3::Z, 100.0, LAYER_GROUND).is_none());
        assert!(world.cast_ray(Vec3::ZERO, Vec3::Z, 100.0, LAYER_ENEMIES).is_some());
    }

    #[test]
    fn test_max_distance_bounds_cast() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::ball(0.5),
            Vec3::new(0.0, 0.0, 5.0),
            Quat::IDENTITY,
            MASK_ALL,
        );

        assert!(world.cast_ray(Vec3::ZERO, Vec3::Z, 4.0, MASK_ALL).is_none());
        assert!(world.cast_ray(Vec3::ZERO, Vec3::ZERO, 100.0, MASK_ALL).is_none());
    }

    #[test]
    fn test_cast_ignores_collider_around_origin() {
        let mut world = CollisionWorld::new();
        // Собственная капсула игрока вокруг origin
        world.insert_static(
            entity(1),
            Collider::capsule_y(0.5, 0.4),
            Vec3::ZERO,
            Quat::IDENTITY,
            MASK_ALL,
        );
        world.insert_static(
            entity(2),
            Collider::ball(0.5),
            Vec3::new(0.0, 0.0, 6.0),
            Quat::IDENTITY,
            MASK_ALL,
        );

        let ray = world.cast_ray(Vec3::ZERO, Vec3::Z, 100.0, MASK_ALL).unwrap();
        assert_eq!(ray.entity, entity(2));

        let sphere = world
            .cast_sphere(Vec3::ZERO, 0.3, Vec3::Z, 100.0, MASK_ALL)
            .unwrap();
        assert_eq!(sphere.entity, entity(2));
        assert_relative_eq!(sphere.distance, 5.2, epsilon = 1e-3);
    }

    #[test]
    fn test_sphere_cast_contact_point_on_surface() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::halfspace(Vec3::NEG_Z).unwrap(),
            Vec3::new(0.0, 0.0, 6.0),
            Quat::IDENTITY,
            LAYER_ENVIRONMENT,
        );

        let hit = world
            .cast_sphere(Vec3::ZERO, 0.5, Vec3::Z, 10.0, LAYER_ENVIRONMENT)
            .unwrap();
        assert_relative_eq!(hit.distance, 5.5, epsilon = 1e-3);
        assert_relative_eq!(hit.point.z, 6.0, epsilon = 1e-3);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-3);
    }

    #[test]
    fn test_sphere_cast_misses_box_corner() {
        // Сфера проходит мимо угла куба: скруглённая Минковски-сумма, а не раздутый бокс
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::cuboid(0.5, 0.5, 0.5),
            Vec3::new(0.9, -0.9, 5.0),
            Quat::IDENTITY,
            LAYER_ENVIRONMENT,
        );

        assert!(world
            .cast_sphere(Vec3::ZERO, 0.5, Vec3::Z, 10.0, LAYER_ENVIRONMENT)
            .is_none());
    }

    #[test]
    fn test_overlap_sphere() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::ball(0.5),
            Vec3::new(10.0, 0.0, 0.0),
            Quat::IDENTITY,
            LAYER_ENEMIES,
        );
        world.insert_static(
            entity(2),
            Collider::ball(0.5),
            Vec3::new(40.0, 0.0, 0.0),
            Quat::IDENTITY,
            LAYER_ENEMIES,
        );

        let found = world.overlap_sphere(Vec3::ZERO, 30.0, LAYER_ENEMIES);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity, entity(1));
        assert_eq!(found[0].position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_replace_synced_keeps_static() {
        let mut world = CollisionWorld::new();
        world.insert_static(
            entity(1),
            Collider::halfspace(Vec3::Y).unwrap(),
            Vec3::ZERO,
            Quat::IDENTITY,
            LAYER_GROUND,
        );

        let dynamic = WorldCollider {
            entity: entity(2),
            collider: Collider::ball(1.0),
            translation: Vec3::new(0.0, 3.0, 0.0),
            rotation: Quat::IDENTITY,
            layers: LAYER_ENEMIES,
        };
        world.replace_synced([dynamic]);
        assert_eq!(world.len(), 2);
        assert!(world
            .cast_ray(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 20.0, LAYER_ENEMIES)
            .is_some());

        world.replace_synced([]);
        assert_eq!(world.len(), 1);
        assert!(world.get(entity(1)).is_some());
        assert!(world
            .cast_ray(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 20.0, LAYER_ENEMIES)
            .is_none());
    }

    #[test]
    fn test_rotated_cuboid_uses_transform() {
        let mut world = CollisionWorld::new();
        // Тонкая плита, повёрнутая на 90° вокруг Y: толщина теперь по X
        world.insert_static(
            entity(1),
            Collider::cuboid(0.1, 1.0, 2.0),
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            LAYER_ENVIRONMENT,
        );

        let hit = world
            .cast_ray(Vec3::ZERO, Vec3::Z, 10.0, LAYER_ENVIRONMENT)
            .unwrap();
        assert_relative_eq!(hit.distance, 4.9, epsilon = 1e-3);
    }

    #[test]
    fn test_supported_collider_shapes() {
        assert!(is_supported(&Collider::ball(0.5)));
        assert!(is_supported(&Collider::cuboid(1.0, 2.0, 3.0)));
        assert!(is_supported(&Collider::capsule_y(0.5, 0.4)));
        assert!(!is_supported(&Collider::cylinder(0.5, 0.4)));
    }
}
