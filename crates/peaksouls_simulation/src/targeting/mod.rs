//! Target selection для lock-on
//!
//! Алгоритм:
//! 1. overlap sphere радиуса `search_radius` на слоях кандидатов
//! 2. для каждого - sphere cast с уровня глаз в сторону кандидата,
//!    кандидат принимается только если первый hit - он сам (LOS)
//! 3. из принятых - ближайший к origin
//!
//! Порядок перебора = порядок overlap query; на равных дистанциях
//! выигрывает первый (implementation-defined, не контракт).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::spatial::{LayerMask, SpatialQuery, LAYER_ENEMIES, MASK_LINE_OF_SIGHT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct TargetingConfig {
    /// Радиус поиска и дальность LOS cast'а (метры)
    pub search_radius: f32,
    /// Радиус LOS пробы
    pub probe_radius: f32,
    /// Высота старта LOS пробы над origin (origin - центр тела, поэтому 0)
    pub eye_height: f32,
    /// Слои кандидатов
    pub candidate_layers: LayerMask,
    /// Слои, блокирующие видимость (кандидаты должны входить сюда же)
    pub sight_layers: LayerMask,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            search_radius: 30.0,
            probe_radius: 0.5,
            eye_height: 0.0,
            candidate_layers: LAYER_ENEMIES,
            sight_layers: MASK_LINE_OF_SIGHT,
        }
    }
}

/// Выбранная цель
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub position: Vec3,
    pub distance: f32,
}

/// Есть ли прямая видимость от `origin` до кандидата
pub fn has_line_of_sight(
    query: &impl SpatialQuery,
    origin: Vec3,
    candidate: Entity,
    candidate_position: Vec3,
    config: &TargetingConfig,
) -> bool {
    let direction = (candidate_position - origin).normalize_or_zero();
    if direction == Vec3::ZERO {
        return false;
    }

    query
        .cast_sphere(
            origin + Vec3::Y * config.eye_height,
            config.probe_radius,
            direction,
            config.search_radius,
            config.sight_layers,
        )
        .is_some_and(|hit| hit.entity == candidate)
}

/// Ближайшая видимая цель в радиусе поиска
pub fn select_target(
    query: &impl SpatialQuery,
    origin: Vec3,
    config: &TargetingConfig,
) -> Option<TargetCandidate> {
    let mut best: Option<TargetCandidate> = None;

    for overlap in query.overlap_sphere(origin, config.search_radius, config.candidate_layers) {
        if !has_line_of_sight(query, origin, overlap.entity, overlap.position, config) {
            continue;
        }

        let distance = origin.distance(overlap.position);
        if best.map_or(true, |current| distance < current.distance) {
            best = Some(TargetCandidate {
                entity: overlap.entity,
                position: overlap.position,
                distance,
            });
        }
    }

    best
}
