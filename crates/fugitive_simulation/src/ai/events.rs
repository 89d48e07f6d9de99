//! AI Events — входящие команды и исходящие сигналы flee поведения
//!
//! Входящие: CaptureRequest (scripted событие / триггер уровня)
//! Исходящие: AgentCaught (animation/audio), FleePlanningFailed (diagnostics)

use bevy::prelude::*;

/// Принудительная поимка агента независимо от дистанции (внешний `onCaught`)
#[derive(Event, Debug, Clone)]
pub struct CaptureRequest {
    pub agent: Entity,
}

/// Агент пойман. Отправляется ровно один раз за жизнь агента.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AgentCaught {
    pub agent: Entity,
    /// Позиция после ground-snap
    pub position: Vec3,
    /// true если ground probe нашёл поверхность
    pub grounded: bool,
}

/// Все flee попытки провалились — агент стоит этот тик
#[derive(Event, Debug, Clone, PartialEq)]
pub struct FleePlanningFailed {
    pub agent: Entity,
    pub attempts: usize,
}
