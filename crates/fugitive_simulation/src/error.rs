//! Ошибки симуляции (non-fatal).
//!
//! Ни одна ошибка не пробрасывается за границу тика: планировщики возвращают
//! `Result`, системы потребляют его (idle + warning) и продолжают работу.

use bevy::prelude::*;
use thiserror::Error;

/// Ошибки поведения агента (planning / missing references / ground probe)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    /// Threat reference не разрезолвлен (None или entity despawned)
    #[error("agent {agent:?} has no resolvable threat; behavior disabled")]
    MissingThreat { agent: Entity },

    /// NavMeshService resource не вставлен в World
    #[error("navmesh service is not registered; agents stay idle")]
    MissingNavMesh,

    /// Ни одна из `attempts` попыток не дала reachable точку
    #[error("no valid flee destination after {attempts} attempts")]
    NoFleeDestination { attempts: usize },

    /// Случайная точка не попала на walkable surface в радиусе
    #[error("no walkable wander destination in range")]
    NoWanderDestination,

    /// Raycast вниз ничего не нашёл (позиция не корректируется)
    #[error("ground probe found no surface below the agent")]
    GroundProbeMiss,
}

/// Ошибки конфигурации (парсинг + валидация FleeConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse flee config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid flee config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }
}
