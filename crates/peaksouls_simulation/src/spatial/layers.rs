//! Collision layers - централизованные константы для всего проекта
//!
//! ## Архитектура:
//! - **Layer (memberships):** на каком слое находится коллайдер
//! - **Mask:** какие слои видит query
//!
//! Значения совпадают с `bevy_rapier3d::prelude::Group::GROUP_N`, поэтому
//! `CollisionGroups::memberships.bits()` напрямую даёт layer bits.
//!
//! ## Слои:
//! - Layer 1 (0b1 = 1): Player
//! - Layer 2 (0b10 = 2): Ground (пол, террейн - ground probe)
//! - Layer 3 (0b100 = 4): Environment (стены, препятствия)
//! - Layer 4 (0b1000 = 8): Enemies (lock-on кандидаты)

use super::LayerMask;

/// Layer 1: Player body
pub const LAYER_PLAYER: LayerMask = 0b1;

/// Layer 2: Ground (walkable surfaces)
pub const LAYER_GROUND: LayerMask = 0b10;

/// Layer 3: Environment (walls, obstacles)
pub const LAYER_ENVIRONMENT: LayerMask = 0b100;

/// Layer 4: Enemies
pub const LAYER_ENEMIES: LayerMask = 0b1000;

/// Mask: всё подряд
pub const MASK_ALL: LayerMask = u32::MAX;

/// Mask: во что упирается камера (без акторов - камера проходит сквозь них)
pub const MASK_CAMERA_OCCLUDERS: LayerMask = LAYER_GROUND | LAYER_ENVIRONMENT;

/// Mask: line-of-sight проверка для lock-on (любой коллайдер блокирует)
pub const MASK_LINE_OF_SIGHT: LayerMask = MASK_ALL;
