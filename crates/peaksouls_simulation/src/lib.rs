//! Peak Souls Simulation Core
//!
//! ECS-ядро third-person action прототипа на Bevy 0.16 (headless)
//!
//! Подсистемы:
//! - spatial: ray/sphere casts по collision world (rapier colliders как authoring формат)
//! - targeting: выбор lock-on цели (ближайшая видимая)
//! - camera: third-person rig, Free/Locked режимы, occlusion, SmoothDamp
//! - locomotion: force-based контроллер (Souls / Sekiro варианты)
//! - animation: typed параметры → события + sinks
//!
//! Порядок кадра:
//! Update: Sync → Input → Actions
//! FixedUpdate (64Hz): Physics (Forces → Integrate → Constraints)
//! PostUpdate: Camera → Presentation

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::{Collider, CollisionGroups, Group, Velocity};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod animation;
pub mod camera;
pub mod components;
pub mod config;
pub mod error;
pub mod input;
pub mod locomotion;
pub mod logger;
pub mod physics;
pub mod spatial;
pub mod targeting;

// Re-export основных типов
pub use animation::{AnimationParam, AnimationSignal, AnimationSink, AnimationSinks, AnimatorParameters};
pub use camera::{spawn_camera_rig, CameraPlugin, CameraRig, CameraRigConfig, LockOnChanged, RigMode};
pub use components::*;
pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use input::{DeviceInputPlugin, InputAction, LookInput, PlayerInput};
pub use locomotion::{
    ControllerVariant, LocomotionConfig, LocomotionController, LocomotionPlugin, LocomotionState,
    target_planar_velocity,
};
pub use logger::init_logger;
pub use physics::{PhysicsBody, PhysicsPlugin, PhysicsStep};
pub use spatial::{CollisionWorld, SpatialPlugin, SpatialQuery};
pub use targeting::{select_target, TargetCandidate, TargetingConfig};

/// Частота FixedUpdate (physics step)
pub const FIXED_HZ: f64 = 64.0;

/// Фазы кадра
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Ресинк collision world из ECS коллайдеров
    Sync,
    /// Устройства → PlayerInput
    Input,
    /// Ground probe, действия, intent
    Actions,
    /// FixedUpdate: силы, интеграция, ограничения
    Physics,
    /// Lock-on + поза камеры
    Camera,
    /// Flush анимационных сигналов
    Presentation,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Device input не входит - добавляется отдельно (`DeviceInputPlugin`),
/// чтобы headless тесты писали `PlayerInput` напрямую.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed из create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 64Hz
            .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .init_resource::<SimulationConfig>()
            .init_resource::<AnimationSinks>()
            .add_event::<AnimationSignal>()
            .configure_sets(
                Update,
                (SimulationSet::Sync, SimulationSet::Input, SimulationSet::Actions).chain(),
            )
            .configure_sets(
                PostUpdate,
                (SimulationSet::Camera, SimulationSet::Presentation).chain(),
            )
            // Подсистемы
            .add_plugins((SpatialPlugin, PhysicsPlugin, LocomotionPlugin, CameraPlugin))
            .add_systems(
                PostUpdate,
                animation::flush_animation_signals.in_set(SimulationSet::Presentation),
            );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время ручное: каждый `app.update()` = ровно один physics step.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / FIXED_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

/// Пол: box 100×100, верхняя грань на `top`
pub fn spawn_ground(world: &mut World, top: f32) -> Entity {
    world
        .spawn((
            Name::new("Ground"),
            Transform::from_xyz(0.0, top - 0.5, 0.0),
            Collider::cuboid(50.0, 0.5, 50.0),
            CollisionGroups::new(Group::GROUP_2, Group::ALL),
        ))
        .id()
}

/// Стена / препятствие (environment layer)
pub fn spawn_wall(world: &mut World, center: Vec3, half_extents: Vec3) -> Entity {
    world
        .spawn((
            Name::new("Wall"),
            Transform::from_translation(center),
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            CollisionGroups::new(Group::GROUP_3, Group::ALL),
        ))
        .id()
}

/// Враг - капсула на enemies layer (кандидат lock-on)
pub fn spawn_enemy(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((
            Name::new("Enemy"),
            Enemy,
            Health::default(),
            Transform::from_translation(position),
            Collider::capsule_y(0.5, 0.4),
            CollisionGroups::new(Group::GROUP_4, Group::ALL),
        ))
        .id()
}

/// Игрок + камера, следующая за ним. Возвращает `(player, camera)`.
///
/// `position` - центр тела.
pub fn spawn_player(world: &mut World, position: Vec3, config: &SimulationConfig) -> (Entity, Entity) {
    let locomotion = config.locomotion;
    let body = PhysicsBody::new(
        locomotion.body_half_height,
        locomotion.ground_layers,
        locomotion.ground_drag,
    );

    let player = world
        .spawn((
            Name::new("Player"),
            Player,
            PlayerInput::default(),
            Health::default(),
            body,
            LocomotionState::new(&locomotion),
            AnimatorParameters::default(),
            Transform::from_translation(position),
            Collider::capsule_y(0.5, 0.4),
            CollisionGroups::new(Group::GROUP_1, Group::ALL),
            Velocity::zero(),
        ))
        .id();

    let camera = spawn_camera_rig(world, player, config.camera, config.targeting);
    world
        .entity_mut(player)
        .insert(LocomotionController::new(locomotion).with_camera(camera));

    (player, camera)
}
