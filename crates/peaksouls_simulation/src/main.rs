//! Headless симуляция Peak Souls
//!
//! Поднимает сцену (пол, стена, игрок с камерой, враги по seed), гоняет
//! скриптованный input и логирует состояние.
//!
//! Использование: `peaksouls_simulation [config.json]`

use bevy::prelude::*;
use rand::Rng;

use peaksouls_simulation::logger;
use peaksouls_simulation::{
    create_headless_app, spawn_enemy, spawn_ground, spawn_player, spawn_wall, CameraRig,
    DeterministicRng, InputAction, LocomotionState, PlayerInput, SimulationConfig,
    SimulationPlugin,
};

const SEED: u64 = 42;
const ENEMY_COUNT: usize = 6;
const TICK_COUNT: usize = 640;

fn main() {
    let mut app = create_headless_app(SEED);

    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => {
                logger::log_info(&format!("Config loaded: {}", path));
                config
            }
            Err(err) => {
                logger::log_error(&format!("Config {}: {}, using defaults", path, err));
                SimulationConfig::default()
            }
        },
        None => SimulationConfig::default(),
    };

    logger::log_info(&format!(
        "Starting Peak Souls headless simulation (seed: {}, controller: {:?})",
        SEED, config.locomotion.variant
    ));

    app.insert_resource(config).add_plugins(SimulationPlugin);

    let world = app.world_mut();
    spawn_ground(world, 0.0);
    spawn_wall(world, Vec3::new(0.0, 1.5, -6.0), Vec3::new(4.0, 1.5, 0.25));
    let (player, camera) = spawn_player(world, Vec3::new(0.0, 0.9, 0.0), &config);

    // Враги по кругу, радиус и угол из seed
    let positions: Vec<Vec3> = {
        let mut rng = world.resource_mut::<DeterministicRng>();
        (0..ENEMY_COUNT)
            .map(|_| {
                let angle = rng.rng.gen_range(0.0..std::f32::consts::TAU);
                let radius = rng.rng.gen_range(6.0..25.0);
                Vec3::new(angle.sin() * radius, 0.9, angle.cos() * radius)
            })
            .collect()
    };
    for position in positions {
        spawn_enemy(world, position);
    }

    for tick in 0..TICK_COUNT {
        script_input(&mut app, player, tick);
        app.update();

        if tick % 64 == 0 {
            log_state(&app, player, camera, tick);
        }
    }

    logger::log_info("Simulation complete!");
}

/// Скрипт: бежим вперёд, lock-on, атака, roll, прыжок
fn script_input(app: &mut App, player: Entity, tick: usize) {
    let Some(mut input) = app.world_mut().get_mut::<PlayerInput>(player) else {
        return;
    };

    input.move_axis = if tick < 320 { Vec2::new(0.0, 1.0) } else { Vec2::new(1.0, 0.0) };
    input.sprint = (128..256).contains(&tick);
    input.look.pointer = if tick < 64 { Vec2::new(0.5, 0.0) } else { Vec2::ZERO };

    match tick {
        100 => input.press(InputAction::LockOn),
        200 | 210 | 220 => input.press(InputAction::Attack),
        300 => input.press(InputAction::Roll),
        400 => input.press(InputAction::Jump),
        500 => input.press(InputAction::LockOn),
        _ => {}
    }
}

fn log_state(app: &App, player: Entity, camera: Entity, tick: usize) {
    let world = app.world();
    let (Some(transform), Some(state)) = (
        world.get::<Transform>(player),
        world.get::<LocomotionState>(player),
    ) else {
        return;
    };
    let Some(rig) = world.get::<CameraRig>(camera) else {
        return;
    };

    logger::log_info(&format!(
        "Tick {}: player {:.2?} grounded={} rolling={} combo={} | camera {:?} yaw={:.1} pitch={:.1} dist={:.2}",
        tick,
        transform.translation,
        state.grounded,
        state.rolling,
        state.combo,
        rig.mode,
        rig.yaw,
        rig.pitch,
        rig.current_distance
    ));
}
