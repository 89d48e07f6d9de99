//! Flee behavior components (state, threat reference, animation signal).

use bevy::prelude::*;

use crate::config::FleeConfig;
use crate::motion::NavAgent;

/// Состояние поведения агента
///
/// Wandering → Fleeing ↔ Wandering, любое → Caught (terminal).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum BehaviorState {
    /// Случайные прогулки по NavMesh (начальное состояние)
    #[default]
    Wandering,

    /// Угроза ближе flee_distance — убегаем
    Fleeing,

    /// Пойман: AI отключен навсегда
    Caught,
}

impl BehaviorState {
    pub fn is_caught(&self) -> bool {
        matches!(self, Self::Caught)
    }
}

/// Какой план сейчас исполняет motion driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum DestinationKind {
    #[default]
    None,
    Wander,
    Flee,
}

/// Flee agent: ссылка на угрозу + внутреннее состояние планирования
///
/// Threat резолвится один раз владельцем (level setup) при спавне,
/// каждый тик не перезапрашивается.
/// Автоматически добавляет BehaviorState, NavAgent, AnimationSignal, FleeConfig через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(BehaviorState, NavAgent, AnimationSignal, FleeConfig, Transform)]
pub struct FleeAgent {
    /// От кого убегаем (None = не разрезолвлен → агент стоит)
    pub threat: Option<Entity>,
    pub(crate) destination_kind: DestinationKind,
    pub(crate) missing_threat_reported: bool,
}

impl FleeAgent {
    pub fn new(threat: Option<Entity>) -> Self {
        Self {
            threat,
            ..Default::default()
        }
    }

    pub fn destination_kind(&self) -> DestinationKind {
        self.destination_kind
    }
}

/// Сигналы для animation collaborator
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AnimationSignal {
    /// |velocity| / speed (потребитель обычно clamp'ит в [0, 1])
    pub speed: f32,
    /// После поимки анимация управляет движением (root motion)
    pub root_motion: bool,
    /// One-shot "Caught" trigger (выставляется ровно один раз)
    pub caught_triggered: bool,
}
