//! Behavior State Machine — Wandering / Fleeing / Caught.
//!
//! Один проход на fixed тик:
//! 1. Caught или нет угрозы → ничего не решаем (без угрозы агент стоит)
//! 2. distance < caught_distance → Capture Handler
//! 3. distance < flee_distance → Fleeing (run_speed, flee planner)
//! 4. иначе → Wandering (walk_speed, wander planner когда прибыли)
//! 5. AnimationSignal.speed = |velocity| / speed

use bevy::prelude::*;

use super::capture::capture_agent;
use crate::ai::planning::{plan_flee_destination, plan_wander_destination};
use crate::ai::{AgentCaught, AnimationSignal, BehaviorState, DestinationKind, FleeAgent, FleePlanningFailed};
use crate::config::FleeConfig;
use crate::error::BehaviorError;
use crate::logger;
use crate::motion::NavAgent;
use crate::navigation::{GroundService, NavMeshQuery, NavMeshService};
use crate::DeterministicRng;

/// Минимальная скорость для нормализации animation signal (без деления на 0)
const MIN_SIGNAL_SPEED: f32 = 1e-4;

/// Запас над stopping_distance: пока remaining больше — flee путь ещё идёт
const FLEE_REPLAN_MARGIN: f32 = 0.1;

/// Система: flee behavior FSM
#[allow(clippy::too_many_arguments)]
pub fn flee_behavior_system(
    mut agents: Query<(
        Entity,
        &mut Transform,
        &mut FleeAgent,
        &FleeConfig,
        &mut BehaviorState,
        &mut NavAgent,
        &mut AnimationSignal,
    )>,
    threats: Query<&Transform, Without<FleeAgent>>,
    navmesh: Option<Res<NavMeshService>>,
    ground: Option<Res<GroundService>>,
    mut rng: ResMut<DeterministicRng>,
    mut caught_events: EventWriter<AgentCaught>,
    mut failed_events: EventWriter<FleePlanningFailed>,
    mut missing_navmesh_reported: Local<bool>,
) {
    let navmesh = navmesh.as_ref().map(|service| service.query());
    let ground = ground.as_ref().map(|service| service.probe());

    if navmesh.is_none() && !*missing_navmesh_reported {
        logger::log_error(&BehaviorError::MissingNavMesh.to_string());
        *missing_navmesh_reported = true;
    }

    for (entity, mut transform, mut flee, config, mut state, mut nav, mut signal) in agents.iter_mut() {
        if state.is_caught() {
            continue;
        }

        let threat_position = flee
            .threat
            .and_then(|threat| threats.get(threat).ok())
            .map(|threat_transform| threat_transform.translation);

        let Some(threat_position) = threat_position else {
            if !flee.missing_threat_reported {
                logger::log_error(&BehaviorError::MissingThreat { agent: entity }.to_string());
                flee.missing_threat_reported = true;
            }
            if nav.is_enabled() {
                nav.stop();
                nav.reset_path();
            }
            flee.destination_kind = DestinationKind::None;
            signal.speed = 0.0;
            continue;
        };

        let distance = transform.translation.distance(threat_position);

        if distance < config.caught_distance {
            if let Some(caught) =
                capture_agent(entity, &mut state, &mut nav, &mut transform, &mut signal, config, ground)
            {
                caught_events.write(caught);
            }
            flee.destination_kind = DestinationKind::None;
            continue;
        }

        if distance < config.flee_distance {
            set_state(entity, &mut state, BehaviorState::Fleeing);
            nav.speed = config.run_speed;

            let result = update_flee(
                transform.translation,
                threat_position,
                config,
                &mut flee,
                &mut nav,
                navmesh,
                &mut rng,
            );

            if let Err(err) = result {
                logger::log_warning(&format!("{:?}: {} (agent may stop)", entity, err));
                if let BehaviorError::NoFleeDestination { attempts } = err {
                    failed_events.write(FleePlanningFailed { agent: entity, attempts });
                }
            }
        } else {
            set_state(entity, &mut state, BehaviorState::Wandering);
            nav.speed = config.walk_speed;

            if let Err(err) = update_wander(transform.translation, config, &mut flee, &mut nav, navmesh, &mut rng) {
                logger::log(&format!("{:?}: {}, idling", entity, err));
            }
        }

        signal.speed = nav.velocity().length() / nav.speed.max(MIN_SIGNAL_SPEED);
    }
}

fn set_state(entity: Entity, state: &mut BehaviorState, next: BehaviorState) {
    if *state != next {
        logger::log(&format!("AI: {:?} {:?} → {:?}", entity, state, next));
        *state = next;
    }
}

/// Flee ветка: перепланирует только когда flee путь не в полёте
fn update_flee(
    position: Vec3,
    threat_position: Vec3,
    config: &FleeConfig,
    flee: &mut FleeAgent,
    nav: &mut NavAgent,
    navmesh: Option<&dyn NavMeshQuery>,
    rng: &mut DeterministicRng,
) -> Result<(), BehaviorError> {
    let flee_in_flight = flee.destination_kind == DestinationKind::Flee
        && (nav.path_pending()
            || (nav.has_path() && nav.remaining_distance() > nav.stopping_distance + FLEE_REPLAN_MARGIN));
    if flee_in_flight {
        return Ok(());
    }

    let planned = navmesh.ok_or(BehaviorError::MissingNavMesh).and_then(|navmesh| {
        let velocity = nav.velocity();
        let heading = Vec3::new(velocity.x, 0.0, velocity.z);
        plan_flee_destination(
            position,
            threat_position,
            heading,
            config,
            nav.height * 2.0,
            navmesh,
            &mut rng.rng,
        )
    });

    match planned {
        Ok(plan) => {
            nav.set_destination(plan.destination);
            flee.destination_kind = DestinationKind::Flee;
            Ok(())
        }
        Err(err) => {
            nav.reset_path();
            flee.destination_kind = DestinationKind::None;
            Err(err)
        }
    }
}

/// Wander ветка: новая точка когда прибыли или текущий путь не wander
fn update_wander(
    position: Vec3,
    config: &FleeConfig,
    flee: &mut FleeAgent,
    nav: &mut NavAgent,
    navmesh: Option<&dyn NavMeshQuery>,
    rng: &mut DeterministicRng,
) -> Result<(), BehaviorError> {
    let needs_target = flee.destination_kind != DestinationKind::Wander || nav.arrived();
    if !needs_target {
        return Ok(());
    }

    let planned = navmesh
        .ok_or(BehaviorError::MissingNavMesh)
        .and_then(|navmesh| plan_wander_destination(position, config.walk_radius, navmesh, &mut rng.rng));

    match planned {
        Ok(destination) => {
            nav.set_destination(destination);
            flee.destination_kind = DestinationKind::Wander;
            Ok(())
        }
        Err(err) => {
            nav.reset_path();
            flee.destination_kind = DestinationKind::None;
            Err(err)
        }
    }
}
