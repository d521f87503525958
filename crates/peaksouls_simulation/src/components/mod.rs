//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье, маркер врага, control lock (hit reaction)
//! - player: player control marker (Player)

pub mod actor;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use player::*;
