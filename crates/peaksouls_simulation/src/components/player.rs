//! Player control marker component
//!
//! Отмечает entity которым управляет игрок через input.

use bevy::prelude::Component;

/// Marker component для player-controlled entity
///
/// - Input/locomotion системы используют `With<Player>` filter
/// - Camera rig следует за entity из своего `follow` поля, не за маркером
///
/// # Single-player
/// В single-player режиме обычно только один entity имеет этот компонент.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;
