//! SimulationConfig - камера, таргетинг и локомоция одним JSON'ом
//!
//! Все секции `#[serde(default)]`: частичный файл дополняется дефолтами.
//! Компоненты получают копии при спавне, ресурс хранит исходник.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::camera::CameraRigConfig;
use crate::error::{Result, SimulationError};
use crate::locomotion::LocomotionConfig;
use crate::targeting::TargetingConfig;

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub camera: CameraRigConfig,
    pub targeting: TargetingConfig,
    pub locomotion: LocomotionConfig,
}

impl SimulationConfig {
    /// Парсинг + валидация
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.min_distance <= camera.distance && camera.distance <= camera.max_distance) {
            return Err(invalid(format!(
                "camera distance {} outside [{}, {}]",
                camera.distance, camera.min_distance, camera.max_distance
            )));
        }
        if camera.pitch_min > camera.pitch_max {
            return Err(invalid(format!(
                "camera pitch_min {} > pitch_max {}",
                camera.pitch_min, camera.pitch_max
            )));
        }
        if camera.smooth_speed < 0.0 || camera.probe_radius < 0.0 {
            return Err(invalid("camera smooth_speed/probe_radius must be non-negative".into()));
        }

        let targeting = &self.targeting;
        if targeting.search_radius <= 0.0 || targeting.probe_radius < 0.0 {
            return Err(invalid(format!(
                "targeting radii invalid (search {}, probe {})",
                targeting.search_radius, targeting.probe_radius
            )));
        }

        let locomotion = &self.locomotion;
        if locomotion.walk_speed < 0.0 || locomotion.sprint_speed < 0.0 {
            return Err(invalid("locomotion speeds must be non-negative".into()));
        }
        let sekiro = &locomotion.sekiro;
        if sekiro.roll_duration <= 0.0 || sekiro.attack_duration <= 0.0 {
            return Err(invalid(format!(
                "sekiro windows must be positive (roll {}, attack {})",
                sekiro.roll_duration, sekiro.attack_duration
            )));
        }
        if sekiro.max_combo < 1 {
            return Err(invalid("sekiro max_combo must be >= 1".into()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfig(message)
}
