//! Motion driver — headless замена движкового navigation agent.
//!
//! Архитектура:
//! - AI система пишет intent (`set_destination` / `reset_path` / `set_enabled`)
//! - `advance_nav_agents` резолвит pending path через NavMeshService и
//!   двигает Transform к destination со скоростью `speed`
//! - `arrived` вычисляется ОДИН раз за тик здесь, AI его только читает

use bevy::prelude::*;

use crate::logger;
use crate::navigation::NavMeshService;

/// Motion Plugin — движение nav agents в FixedUpdate
pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<NavAgent>()
            .add_systems(FixedUpdate, advance_nav_agents);
    }
}

/// Navigation agent (state + intent API)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Текущая скорость движения (м/с), выставляется AI (walk/run)
    pub speed: f32,
    /// Дистанция до destination, на которой агент останавливается
    pub stopping_distance: f32,
    /// Высота агента (используется для радиуса NavMesh sampling)
    pub height: f32,
    /// remaining distance ниже порога = arrived
    pub arrival_threshold: f32,

    enabled: bool,
    stopped: bool,
    destination: Option<Vec3>,
    path_pending: bool,
    remaining_distance: f32,
    velocity: Vec3,
    arrived: bool,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            speed: 2.0,
            stopping_distance: 0.0,
            height: 2.0,
            arrival_threshold: 0.5,
            enabled: true,
            stopped: false,
            destination: None,
            path_pending: false,
            remaining_distance: 0.0,
            velocity: Vec3::ZERO,
            arrived: true,
        }
    }
}

impl NavAgent {
    pub fn new(speed: f32, arrival_threshold: f32) -> Self {
        Self {
            speed,
            arrival_threshold,
            ..Default::default()
        }
    }

    /// Запрашивает путь к `point`. Путь резолвится в следующем `advance_nav_agents`.
    ///
    /// Returns false если агент выключен (destination не принимается).
    pub fn set_destination(&mut self, point: Vec3) -> bool {
        if !self.enabled {
            return false;
        }

        self.destination = Some(point);
        self.path_pending = true;
        self.stopped = false;
        self.arrived = false;
        true
    }

    /// Сбрасывает destination и текущий путь, агент стоит на месте
    pub fn reset_path(&mut self) {
        self.destination = None;
        self.path_pending = false;
        self.remaining_distance = 0.0;
        self.velocity = Vec3::ZERO;
        self.arrived = true;
    }

    /// Выключение = остановка + сброс пути (как у движкового agent)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stopped = true;
            self.reset_path();
        }
    }

    /// Остановить движение, сохранив destination
    pub fn stop(&mut self) {
        self.stopped = true;
        self.velocity = Vec3::ZERO;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn has_path(&self) -> bool {
        self.destination.is_some() && !self.path_pending
    }

    pub fn path_pending(&self) -> bool {
        self.path_pending
    }

    pub fn remaining_distance(&self) -> f32 {
        self.remaining_distance
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Нет pending пути и (нет destination или remaining < arrival_threshold)
    pub fn arrived(&self) -> bool {
        self.arrived
    }

    /// Один шаг движения к destination (без учёта NavMesh)
    fn step(&mut self, transform: &mut Transform, destination: Vec3, delta: f32) {
        let to_destination = destination - transform.translation;
        let distance = to_destination.length();

        if distance <= self.stopping_distance || delta <= 0.0 {
            self.velocity = Vec3::ZERO;
            self.remaining_distance = distance;
        } else {
            let step = self.speed * delta;
            if step >= distance {
                transform.translation = destination;
                self.velocity = to_destination / delta;
                self.remaining_distance = 0.0;
            } else {
                let direction = to_destination / distance;
                transform.translation += direction * step;
                self.velocity = direction * self.speed;
                self.remaining_distance = distance - step;
            }
        }

        self.arrived = self.remaining_distance < self.arrival_threshold;
    }
}

/// Система: продвинуть всех nav agents на один fixed тик
///
/// Pending path резолвится через `NavMeshQuery::has_path`: недостижимый
/// destination отбрасывается (агент встаёт, AI перепланирует).
pub fn advance_nav_agents(
    mut agents: Query<(Entity, &mut Transform, &mut NavAgent)>,
    navmesh: Option<Res<NavMeshService>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut agent) in agents.iter_mut() {
        if !agent.enabled || agent.stopped {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let Some(destination) = agent.destination else {
            agent.reset_path();
            continue;
        };

        if agent.path_pending {
            let reachable = navmesh
                .as_ref()
                .map(|service| service.query().has_path(transform.translation, destination))
                .unwrap_or(false);

            if !reachable {
                logger::log(&format!(
                    "NavAgent {:?}: no complete path {:?} → {:?}, path discarded",
                    entity, transform.translation, destination
                ));
                agent.reset_path();
                continue;
            }

            agent.path_pending = false;
        }

        agent.step(&mut transform, destination, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_agent_default_is_idle_and_arrived() {
        let agent = NavAgent::default();
        assert!(agent.is_enabled());
        assert!(!agent.has_path());
        assert!(!agent.path_pending());
        assert!(agent.arrived());
    }

    #[test]
    fn test_set_destination_marks_pending() {
        let mut agent = NavAgent::default();
        assert!(agent.set_destination(Vec3::new(3.0, 0.0, 0.0)));

        assert!(agent.path_pending());
        assert!(!agent.has_path());
        assert!(!agent.arrived());
        assert_eq!(agent.destination(), Some(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_disabled_agent_rejects_destination() {
        let mut agent = NavAgent::default();
        agent.set_destination(Vec3::X);
        agent.set_enabled(false);

        assert!(agent.destination().is_none());
        assert!(agent.is_stopped());
        assert!(!agent.set_destination(Vec3::Z));
        assert!(agent.destination().is_none());
    }

    #[test]
    fn test_step_moves_at_speed() {
        let mut agent = NavAgent::new(2.0, 0.5);
        let mut transform = Transform::default();
        agent.set_destination(Vec3::new(4.0, 0.0, 0.0));
        agent.path_pending = false;

        agent.step(&mut transform, Vec3::new(4.0, 0.0, 0.0), 0.5);

        assert_eq!(transform.translation, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(agent.velocity(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(agent.remaining_distance(), 3.0);
        assert!(!agent.arrived());
    }

    #[test]
    fn test_step_snaps_to_destination_and_arrives() {
        let mut agent = NavAgent::new(2.0, 0.5);
        let mut transform = Transform::from_xyz(3.5, 0.0, 0.0);
        agent.set_destination(Vec3::new(4.0, 0.0, 0.0));
        agent.path_pending = false;

        agent.step(&mut transform, Vec3::new(4.0, 0.0, 0.0), 0.5);

        assert_eq!(transform.translation, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(agent.remaining_distance(), 0.0);
        assert!(agent.arrived());
    }
}
