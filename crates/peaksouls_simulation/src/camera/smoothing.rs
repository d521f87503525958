//! Critically damped smoothing (SmoothDamp)
//!
//! Независим от частоты кадров: шаг 2×dt/2 ≈ шаг dt. Не перелетает цель.

use bevy::prelude::*;

/// Минимальное smooth time (деление на ноль при smooth_speed → ∞)
const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Один шаг сглаживания `current → target`
///
/// `velocity` - состояние пружины, хранится между кадрами.
pub fn smooth_damp(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    delta: f32,
) -> Vec3 {
    if delta <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    // Аппроксимация exp(-x)
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * delta;
    *velocity = (*velocity - temp * omega) * decay;

    let output = target + (change + temp) * decay;

    // Перелёт через цель - фиксируемся на ней
    if (target - current).dot(output - target) > 0.0 {
        *velocity = Vec3::ZERO;
        return target;
    }

    output
}
