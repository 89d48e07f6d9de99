//! Capture Handler — one-shot terminal transition в Caught.

use bevy::prelude::*;

use crate::ai::{AgentCaught, AnimationSignal, BehaviorState, CaptureRequest, FleeAgent, DestinationKind};
use crate::config::FleeConfig;
use crate::error::BehaviorError;
use crate::logger;
use crate::motion::NavAgent;
use crate::navigation::{GroundProbe, GroundService};

/// Ловит агента: Caught + выключенный motion driver + ground-snap + animation trigger.
///
/// Идемпотентно: повторный вызов для пойманного агента ничего не меняет и
/// возвращает None. Иначе возвращает `AgentCaught`, который вызывающая
/// система пишет в EventWriter.
#[allow(clippy::too_many_arguments)]
pub fn capture_agent(
    entity: Entity,
    state: &mut BehaviorState,
    nav: &mut NavAgent,
    transform: &mut Transform,
    signal: &mut AnimationSignal,
    config: &FleeConfig,
    ground: Option<&dyn GroundProbe>,
) -> Option<AgentCaught> {
    if state.is_caught() {
        return None;
    }

    *state = BehaviorState::Caught;

    // Выключение сбрасывает путь и velocity (pending destination тоже)
    nav.set_enabled(false);

    let grounded = match snap_to_ground(transform, config, ground) {
        Ok(()) => true,
        Err(err) => {
            logger::log(&format!("Capture {:?}: {}", entity, err));
            false
        }
    };

    signal.speed = 0.0;
    signal.root_motion = true;
    signal.caught_triggered = true;

    logger::log_info(&format!(
        "🎯 {:?} caught at {:?} (grounded: {})",
        entity, transform.translation, grounded
    ));

    Some(AgentCaught {
        agent: entity,
        position: transform.translation,
        grounded,
    })
}

/// Raycast вниз из точки чуть выше агента; меняется только Y
fn snap_to_ground(
    transform: &mut Transform,
    config: &FleeConfig,
    ground: Option<&dyn GroundProbe>,
) -> Result<(), BehaviorError> {
    let origin = transform.translation + Vec3::Y * config.ground_probe_lift;
    let hit = ground
        .and_then(|probe| probe.cast_down(origin, config.ground_probe_distance))
        .ok_or(BehaviorError::GroundProbeMiss)?;

    transform.translation.y = hit.y;
    Ok(())
}

/// Система: внешние CaptureRequest (scripted onCaught)
///
/// Выполняется до distance логики, поэтому пойманный здесь агент в этом же
/// тике уже не планирует маршрут.
pub fn handle_capture_requests(
    mut requests: EventReader<CaptureRequest>,
    mut agents: Query<(
        &mut Transform,
        &mut FleeAgent,
        &FleeConfig,
        &mut BehaviorState,
        &mut NavAgent,
        &mut AnimationSignal,
    )>,
    ground: Option<Res<GroundService>>,
    mut caught_events: EventWriter<AgentCaught>,
) {
    let ground = ground.as_ref().map(|service| service.probe());

    for request in requests.read() {
        let Ok((mut transform, mut flee, config, mut state, mut nav, mut signal)) =
            agents.get_mut(request.agent)
        else {
            logger::log_warning(&format!(
                "CaptureRequest for {:?} ignored: not a flee agent",
                request.agent
            ));
            continue;
        };

        if let Some(caught) = capture_agent(
            request.agent,
            &mut state,
            &mut nav,
            &mut transform,
            &mut signal,
            config,
            ground,
        ) {
            flee.destination_kind = DestinationKind::None;
            caught_events.write(caught);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Плоская земля на заданной высоте, бесконечная по XZ
    struct FlatGround(f32);

    impl GroundProbe for FlatGround {
        fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
            let drop = origin.y - self.0;
            (0.0..=max_distance).contains(&drop).then_some(Vec3::new(origin.x, self.0, origin.z))
        }
    }

    fn fresh_agent() -> (BehaviorState, NavAgent, Transform, AnimationSignal) {
        let mut nav = NavAgent::default();
        nav.set_destination(Vec3::new(10.0, 0.0, 0.0));
        (
            BehaviorState::Fleeing,
            nav,
            Transform::from_xyz(1.0, 0.8, 2.0),
            AnimationSignal { speed: 0.7, ..Default::default() },
        )
    }

    #[test]
    fn test_capture_snaps_and_disables() {
        let (mut state, mut nav, mut transform, mut signal) = fresh_agent();
        let entity = Entity::from_raw(7);
        let ground = FlatGround(0.0);

        let caught = capture_agent(
            entity,
            &mut state,
            &mut nav,
            &mut transform,
            &mut signal,
            &FleeConfig::default(),
            Some(&ground),
        )
        .expect("first capture");

        assert_eq!(state, BehaviorState::Caught);
        assert!(!nav.is_enabled());
        assert!(nav.destination().is_none());
        assert!(!nav.path_pending());
        assert_eq!(transform.translation, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(signal.speed, 0.0);
        assert!(signal.root_motion);
        assert!(signal.caught_triggered);
        assert_eq!(caught, AgentCaught { agent: entity, position: Vec3::new(1.0, 0.0, 2.0), grounded: true });
    }

    #[test]
    fn test_capture_is_idempotent() {
        let (mut state, mut nav, mut transform, mut signal) = fresh_agent();
        let entity = Entity::from_raw(3);
        let config = FleeConfig::default();
        let ground = FlatGround(0.0);

        let first = capture_agent(entity, &mut state, &mut nav, &mut transform, &mut signal, &config, Some(&ground));
        let after_first = (state, transform, signal.clone());

        let second = capture_agent(entity, &mut state, &mut nav, &mut transform, &mut signal, &config, Some(&ground));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!((state, transform, signal), after_first);
    }

    #[test]
    fn test_ground_probe_miss_keeps_height() {
        let (mut state, mut nav, mut transform, mut signal) = fresh_agent();
        // Земля на 20м ниже — за пределами probe (0.5 + 5м)
        let ground = FlatGround(-20.0);

        let caught = capture_agent(
            Entity::from_raw(1),
            &mut state,
            &mut nav,
            &mut transform,
            &mut signal,
            &FleeConfig::default(),
            Some(&ground),
        )
        .expect("capture still happens");

        assert!(!caught.grounded);
        assert_eq!(transform.translation.y, 0.8);
        assert!(state.is_caught());
    }

    #[test]
    fn test_capture_without_ground_service() {
        let (mut state, mut nav, mut transform, mut signal) = fresh_agent();

        let caught = capture_agent(
            Entity::from_raw(2),
            &mut state,
            &mut nav,
            &mut transform,
            &mut signal,
            &FleeConfig::default(),
            None,
        )
        .expect("capture");

        assert!(!caught.grounded);
        assert_eq!(transform.translation, Vec3::new(1.0, 0.8, 2.0));
    }
}
