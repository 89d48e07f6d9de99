//! Flee behavior tunables.
//!
//! Конфиг неизменяем на время жизни агента (задаётся при спавне).
//! Может грузиться из JSON (`FleeConfig::from_json`), отсутствующие поля
//! берутся из `Default`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;


/// Параметры flee/wander/caught поведения
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct FleeConfig {
    /// Дистанция до угрозы, с которой начинаем убегать (метры)
    pub flee_distance: f32,
    /// Дистанция до угрозы, на которой агент пойман (метры)
    pub caught_distance: f32,
    /// Скорость в Wandering (м/с)
    pub walk_speed: f32,
    /// Скорость в Fleeing (м/с)
    pub run_speed: f32,
    /// Радиус поиска случайной точки для wander
    pub walk_radius: f32,
    /// Порог remaining distance, после которого wander target считается достигнутым
    pub random_walk_arrival_threshold: f32,
    /// Дальность последней (самой дальней) flee попытки
    pub max_flee_step_distance: f32,
    /// Количество попыток найти flee точку (>= 2)
    pub flee_attempts: usize,
    /// Полный разброс угла flee направления (градусы)
    pub flee_angle_variation: f32,
    /// Насколько выше позиции стартует ground probe
    pub ground_probe_lift: f32,
    /// Максимальная длина ground probe вниз
    pub ground_probe_distance: f32,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            flee_distance: 10.0,
            caught_distance: 1.5,
            walk_speed: 2.0,
            run_speed: 4.0,
            walk_radius: 5.0,
            random_walk_arrival_threshold: 0.5,
            max_flee_step_distance: 20.0,
            flee_attempts: 5,
            flee_angle_variation: 60.0, // ±30° от направления "прочь"
            ground_probe_lift: 0.5,
            ground_probe_distance: 5.0,
        }
    }
}

impl FleeConfig {
    /// Парсит JSON и валидирует результат
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("flee_distance", self.flee_distance),
            ("caught_distance", self.caught_distance),
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("walk_radius", self.walk_radius),
            ("random_walk_arrival_threshold", self.random_walk_arrival_threshold),
            ("max_flee_step_distance", self.max_flee_step_distance),
            ("flee_angle_variation", self.flee_angle_variation),
            ("ground_probe_lift", self.ground_probe_lift),
            ("ground_probe_distance", self.ground_probe_distance),
        ];
        // NaN молча проходит сравнения ниже, отсекаем заранее
        if let Some((name, value)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::invalid(format!("{} must be finite (got {})", name, value)));
        }

        if self.flee_attempts < 2 {
            return Err(ConfigError::invalid(format!(
                "flee_attempts must be >= 2 (got {})",
                self.flee_attempts
            )));
        }

        if !(self.caught_distance > 0.0 && self.caught_distance < self.flee_distance) {
            return Err(ConfigError::invalid(format!(
                "expected 0 < caught_distance ({}) < flee_distance ({})",
                self.caught_distance, self.flee_distance
            )));
        }

        if self.max_flee_step_distance < self.flee_distance {
            return Err(ConfigError::invalid(format!(
                "max_flee_step_distance ({}) must be >= flee_distance ({})",
                self.max_flee_step_distance, self.flee_distance
            )));
        }

        let positive = [
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("walk_radius", self.walk_radius),
            ("random_walk_arrival_threshold", self.random_walk_arrival_threshold),
            ("ground_probe_distance", self.ground_probe_distance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(format!("{} must be positive (got {})", name, value)));
            }
        }

        if !(0.0..=360.0).contains(&self.flee_angle_variation) {
            return Err(ConfigError::invalid(format!(
                "flee_angle_variation must be within [0, 360] degrees (got {})",
                self.flee_angle_variation
            )));
        }

        if self.ground_probe_lift < 0.0 {
            return Err(ConfigError::invalid("ground_probe_lift must not be negative"));
        }

        Ok(())
    }

    /// Дальность поиска для попытки `attempt` (линейно flee_distance → max_flee_step_distance)
    pub fn search_distance(&self, attempt: usize) -> f32 {
        let last = self.flee_attempts.saturating_sub(1).max(1) as f32;
        let t = attempt as f32 / last;
        self.flee_distance + (self.max_flee_step_distance - self.flee_distance) * t
    }
}
