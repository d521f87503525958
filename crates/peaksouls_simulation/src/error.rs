//! Ошибки симуляции
//!
//! Запросы "ничего не нашли" - это не ошибки (`None`), сюда попадают только
//! отсутствующие коллабораторы и битая конфигурация.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// `CollisionWorld` не зарегистрирован - spatial queries невозможны
    #[error("spatial query world is not available")]
    SpatialWorldUnavailable,

    /// Обязательный коллаборатор отсутствует (камера, тело, anchor)
    #[error("required collaborator is missing: {what}")]
    MissingCollaborator { what: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
