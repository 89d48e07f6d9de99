//! AI decision-making module
//!
//! Flee behavior для NPC: Wandering → Fleeing → Caught.
//! Planners (flee / wander) — чистые функции поверх NavMeshQuery + seeded RNG,
//! FSM — Bevy система в FixedUpdate.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod planning;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use events::*;
pub use planning::{plan_flee_destination, plan_wander_destination, CandidateValidity, DestinationCandidate, FleePlan};
pub use systems::{capture_agent, flee_behavior_system, handle_capture_requests};

use crate::motion::advance_nav_agents;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. handle_capture_requests — внешний onCaught (до distance логики)
/// 2. flee_behavior_system — FSM + planners → NavAgent intent
/// 3. advance_nav_agents (MotionPlugin) — движение по intent
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CaptureRequest>()
            .add_event::<AgentCaught>()
            .add_event::<FleePlanningFailed>()
            .register_type::<BehaviorState>()
            .register_type::<FleeAgent>()
            .register_type::<AnimationSignal>()
            .add_systems(
                FixedUpdate,
                (handle_capture_requests, flee_behavior_system)
                    .chain() // Последовательное выполнение для детерминизма
                    .before(advance_nav_agents),
            );
    }
}
