//! Locomotion integration тесты (headless App)
//!
//! Полный цикл: input → actions (Update) → forces/integrate (FixedUpdate)
//! → параметры анимации (PostUpdate flush).

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use peaksouls_simulation::{
    create_headless_app, spawn_ground, spawn_player, target_planar_velocity, AnimationParam,
    AnimationSignal, AnimationSink, AnimationSinks, AnimatorParameters, ControlLock, Health,
    HitReceived, InputAction, LocomotionConfig, LocomotionController, LocomotionState,
    PhysicsBody, PlayerInput, SimulationConfig, SimulationPlugin,
};

const GROUND_TOP: f32 = -0.9;

fn setup(locomotion: LocomotionConfig) -> (App, Entity) {
    let config = SimulationConfig {
        locomotion,
        ..default()
    };
    let mut app = create_headless_app(11);
    app.insert_resource(config).add_plugins(SimulationPlugin);

    let world = app.world_mut();
    spawn_ground(world, GROUND_TOP);
    let (player, _camera) = spawn_player(world, Vec3::ZERO, &config);

    // Первый кадр: dt = 0, камера встаёт за спину
    app.update();
    (app, player)
}

fn input(app: &mut App, player: Entity) -> Mut<'_, PlayerInput> {
    app.world_mut().get_mut::<PlayerInput>(player).expect("player input")
}

fn state(app: &App, player: Entity) -> LocomotionState {
    *app.world().get::<LocomotionState>(player).expect("locomotion state")
}

fn body(app: &App, player: Entity) -> PhysicsBody {
    *app.world().get::<PhysicsBody>(player).expect("physics body")
}

fn run(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn planar_speed(app: &App, player: Entity) -> f32 {
    body(app, player).planar_velocity().length()
}

#[test]
fn test_forward_input_moves_along_camera_forward() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    input(&mut app, player).move_axis = Vec2::new(0.0, 1.0);
    run(&mut app, 128);

    let velocity = body(&app, player).velocity;
    let transform = *app.world().get::<Transform>(player).unwrap();

    // Камера за спиной смотрит вдоль +Z
    assert!(velocity.z > 2.0, "velocity = {:?}", velocity);
    assert!(velocity.x.abs() < 1e-3);
    assert!(transform.translation.z > 2.0);
    // Поворот к направлению движения
    assert!((transform.rotation * Vec3::Z - Vec3::Z).length() < 1e-3);
    assert!(state(&app, player).moving);
}

#[test]
fn test_sprint_faster_than_walk_and_clamped() {
    let config = LocomotionConfig::sekiro();

    let (mut walk, walker) = setup(config);
    input(&mut walk, walker).move_axis = Vec2::new(0.0, 1.0);
    run(&mut walk, 128);

    let (mut sprint, sprinter) = setup(config);
    {
        let mut sprint_input = input(&mut sprint, sprinter);
        sprint_input.move_axis = Vec2::new(0.0, 1.0);
        sprint_input.sprint = true;
    }
    run(&mut sprint, 128);

    let walk_speed = planar_speed(&walk, walker);
    let sprint_speed = planar_speed(&sprint, sprinter);
    assert!(sprint_speed > walk_speed);
    assert!(walk_speed <= config.walk_speed + 1e-3);
    assert!(sprint_speed <= config.sprint_speed + 1e-3);
    assert_eq!(state(&sprint, sprinter).target_speed, config.sprint_speed);
}

#[test]
fn test_player_body_built_from_locomotion_config() {
    let config = LocomotionConfig::souls();
    let (app, player) = setup(config);

    let body = body(&app, player);
    assert_eq!(body.support_height, config.body_half_height);
    assert_eq!(body.ground_layers, config.ground_layers);
}

#[test]
fn test_intent_matches_target_planar_velocity() {
    let config = LocomotionConfig::sekiro();
    let (mut app, player) = setup(config);

    let camera = app
        .world()
        .get::<LocomotionController>(player)
        .and_then(|controller| controller.camera)
        .expect("player camera");
    let camera_forward = app.world().get::<Transform>(camera).unwrap().forward().as_vec3();

    let axis = Vec2::new(1.0, 0.5);
    {
        let mut player_input = input(&mut app, player);
        player_input.move_axis = axis;
        player_input.sprint = true;
    }
    app.update();

    let state = state(&app, player);
    let expected = target_planar_velocity(axis, camera_forward, true, &config);
    let intent = state.move_direction.expect("moving") * state.target_speed;
    assert!((intent - expected).length() < 1e-4, "{:?} vs {:?}", intent, expected);
    assert!((state.target_speed - config.sprint_speed).abs() < 1e-4);
}

#[test]
fn test_release_input_clears_intent() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    input(&mut app, player).move_axis = Vec2::new(1.0, 0.0);
    run(&mut app, 32);
    assert!(planar_speed(&app, player) > 0.5);

    input(&mut app, player).move_axis = Vec2::ZERO;
    run(&mut app, 128);

    let state = state(&app, player);
    assert!(!state.moving);
    assert!(state.move_direction.is_none());
    // Ground drag гасит скорость
    assert!(planar_speed(&app, player) < 0.05);
}

#[test]
fn test_sekiro_combo_progression_and_reset() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    let mut combos = Vec::new();
    for _ in 0..4 {
        input(&mut app, player).press(InputAction::Attack);
        app.update();
        combos.push(state(&app, player).combo);
    }
    assert_eq!(combos, vec![1, 2, 3, 1]);
    assert!(state(&app, player).attacking);

    // attack_duration = 1s, кадр = 1/64s
    run(&mut app, 70);

    let state = state(&app, player);
    assert!(!state.attacking);
    assert_eq!(state.combo, 0);
    let params = app.world().get::<AnimatorParameters>(player).unwrap();
    assert_eq!(params.int("ComboCount"), Some(0));
}

#[test]
fn test_sekiro_attack_suppresses_movement() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    {
        let mut player_input = input(&mut app, player);
        player_input.move_axis = Vec2::new(0.0, 1.0);
        player_input.press(InputAction::Attack);
    }
    run(&mut app, 16);

    assert!(state(&app, player).attacking);
    assert!(planar_speed(&app, player) < 1e-3);
}

#[test]
fn test_sekiro_roll_sets_velocity_directly() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    input(&mut app, player).press(InputAction::Roll);
    run(&mut app, 3);

    let rolling = state(&app, player);
    assert!(rolling.rolling);
    assert!(!rolling.attacking);
    // Без input - roll по facing (+Z)
    let velocity = body(&app, player).velocity;
    assert!(velocity.z > 8.0, "velocity = {:?}", velocity);

    // roll_duration = 0.5s
    run(&mut app, 40);
    assert!(!state(&app, player).rolling);
    let params = app.world().get::<AnimatorParameters>(player).unwrap();
    assert_eq!(params.bool("IsRolling"), Some(false));
}

#[test]
fn test_sekiro_jump_leaves_ground() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    input(&mut app, player).press(InputAction::Jump);

    // Air drag 1 - полёт ~0.8s
    let mut max_height = 0.0_f32;
    for _ in 0..90 {
        app.update();
        let y = app.world().get::<Transform>(player).unwrap().translation.y;
        max_height = max_height.max(y);
    }

    assert!(max_height > 0.3, "max height = {}", max_height);
    // Приземлились обратно
    let y = app.world().get::<Transform>(player).unwrap().translation.y;
    assert!(y.abs() < 0.05);
    assert!(state(&app, player).grounded);
}

#[test]
fn test_control_lock_blocks_input() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    app.world_mut()
        .entity_mut(player)
        .insert(ControlLock::new(0.25));
    {
        let mut player_input = input(&mut app, player);
        player_input.move_axis = Vec2::new(0.0, 1.0);
        player_input.press(InputAction::Jump);
    }
    run(&mut app, 8);

    let locked_state = state(&app, player);
    assert!(locked_state.move_direction.is_none());
    assert!(planar_speed(&app, player) < 1e-3);
    // Jump edge выброшен, не сработал
    assert!(!input(&mut app, player).is_pressed(InputAction::Jump));
    assert!(app.world().get::<Transform>(player).unwrap().translation.y.abs() < 0.05);

    // Lock истёк - движение возвращается
    run(&mut app, 40);
    assert!(app.world().get::<ControlLock>(player).is_none());
    assert!(planar_speed(&app, player) > 1.0);
}

#[test]
fn test_hit_event_damages_and_staggers() {
    let (mut app, player) = setup(LocomotionConfig::sekiro());

    app.world_mut().send_event(HitReceived {
        target: player,
        damage: 30,
        stagger: 0.25,
    });
    input(&mut app, player).move_axis = Vec2::new(0.0, 1.0);
    app.update();

    assert_eq!(app.world().get::<Health>(player).unwrap().current, 70);
    assert!(app.world().get::<ControlLock>(player).is_some());
    assert!(state(&app, player).move_direction.is_none());

    run(&mut app, 40);
    assert!(app.world().get::<ControlLock>(player).is_none());
    assert!(planar_speed(&app, player) > 1.0);
}

#[test]
fn test_grounded_param_follows_probe() {
    let (app, player) = setup(LocomotionConfig::sekiro());

    assert!(state(&app, player).grounded);
    let params = app.world().get::<AnimatorParameters>(player).unwrap();
    assert_eq!(params.bool("Grounded"), Some(true));
}

#[test]
fn test_souls_heal_consumes_vial_and_signals() {
    let (mut app, player) = setup(LocomotionConfig::souls());
    app.world_mut()
        .get_mut::<Health>(player)
        .unwrap()
        .take_damage(50);

    input(&mut app, player).press(InputAction::Heal);
    app.update();

    assert_eq!(app.world().get::<Health>(player).unwrap().current, 80);
    assert_eq!(state(&app, player).vials_left, 4);

    let signals: Vec<AnimationSignal> = app
        .world()
        .resource::<Events<AnimationSignal>>()
        .iter_current_update_events()
        .copied()
        .collect();
    assert!(signals.contains(&AnimationSignal {
        entity: player,
        param: AnimationParam::Heal
    }));
}

#[test]
fn test_souls_toggles_and_unarmed_attack() {
    let (mut app, player) = setup(LocomotionConfig::souls());

    input(&mut app, player).press(InputAction::Sheathe);
    app.update();
    input(&mut app, player).press(InputAction::Block);
    app.update();

    let state = state(&app, player);
    assert!(!state.armed);
    assert!(state.blocking);

    // Безоружный - Attack trigger не уходит
    input(&mut app, player).press(InputAction::Attack);
    app.update();
    let attacked = app
        .world()
        .resource::<Events<AnimationSignal>>()
        .iter_current_update_events()
        .any(|signal| signal.param == AnimationParam::Attack);
    assert!(!attacked);
}

/// Sink, собирающий все параметры
struct RecordingSink(Arc<Mutex<Vec<(Entity, AnimationParam)>>>);

impl AnimationSink for RecordingSink {
    fn on_param(&self, entity: Entity, param: AnimationParam) {
        self.0.lock().unwrap().push((entity, param));
    }
}

#[test]
fn test_animation_sinks_receive_parameters() {
    let (mut app, player) = setup(LocomotionConfig::souls());
    let recorded = Arc::new(Mutex::new(Vec::new()));
    app.world_mut()
        .resource_mut::<AnimationSinks>()
        .register(Box::new(RecordingSink(recorded.clone())));

    {
        let mut player_input = input(&mut app, player);
        player_input.move_axis = Vec2::new(0.0, 1.0);
        player_input.press(InputAction::Roll);
    }
    app.update();

    let recorded = recorded.lock().unwrap();
    assert!(recorded.contains(&(player, AnimationParam::Roll)));
    assert!(recorded.contains(&(player, AnimationParam::Moving(true))));
}
