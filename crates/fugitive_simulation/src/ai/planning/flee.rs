//! Flee Destination Planner
//!
//! Алгоритм:
//! 1. direction_away = normalize(agent − threat) (fallback heading если совпадают)
//! 2. Для каждой попытки i: случайный yaw в ±variation/2, дистанция
//!    lerp(flee_distance → max_flee_step_distance), sample NavMesh рядом
//!    с предложенной точкой, проверка полного пути
//! 3. Первая reachable точка побеждает, остальные попытки не делаются

use bevy::prelude::*;
use rand::Rng;

use crate::config::FleeConfig;
use crate::error::BehaviorError;
use crate::logger;
use crate::navigation::NavMeshQuery;

/// Результат проверки одной flee попытки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateValidity {
    /// На NavMesh и путь complete
    Reachable,
    /// На NavMesh, но пути нет
    Unreachable,
    /// NavMesh sampling ничего не нашёл в радиусе
    OffMesh,
}

/// Одна попытка: куда целились, что нашёл NavMesh и валидность
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationCandidate {
    pub attempt: usize,
    pub proposed: Vec3,
    pub sampled: Option<Vec3>,
    pub validity: CandidateValidity,
}

/// Успешный план: destination + trace всех сделанных попыток
#[derive(Debug, Clone, PartialEq)]
pub struct FleePlan {
    pub destination: Vec3,
    pub candidates: Vec<DestinationCandidate>,
}

impl FleePlan {
    pub fn attempts_used(&self) -> usize {
        self.candidates.len()
    }
}

/// Ищет reachable flee точку прочь от угрозы.
///
/// `sample_radius` — радиус NavMesh sampling вокруг каждой предложенной
/// точки (обычно 2 × высота агента). Направление "прочь" берётся в
/// плоскости XZ; `fallback_heading` используется, если агент и угроза
/// совпадают по XZ (в т.ч. угроза строго над или под агентом).
pub fn plan_flee_destination(
    agent_position: Vec3,
    threat_position: Vec3,
    fallback_heading: Vec3,
    config: &FleeConfig,
    sample_radius: f32,
    navmesh: &dyn NavMeshQuery,
    rng: &mut impl Rng,
) -> Result<FleePlan, BehaviorError> {
    let away = agent_position - threat_position;
    let fallback = Vec3::new(fallback_heading.x, 0.0, fallback_heading.z).normalize_or(Vec3::NEG_Z);
    let direction_away = Vec3::new(away.x, 0.0, away.z).normalize_or(fallback);

    let half_variation = config.flee_angle_variation * 0.5;
    let mut candidates = Vec::with_capacity(config.flee_attempts);

    for attempt in 0..config.flee_attempts {
        let angle = rng.gen_range(-half_variation..=half_variation);
        let deviated = Quat::from_rotation_y(angle.to_radians()) * direction_away;
        let proposed = agent_position + deviated * config.search_distance(attempt);

        let sampled = navmesh.sample_position(proposed, sample_radius);
        let validity = match sampled {
            None => CandidateValidity::OffMesh,
            Some(point) if navmesh.has_path(agent_position, point) => CandidateValidity::Reachable,
            Some(_) => CandidateValidity::Unreachable,
        };

        logger::log(&format!(
            "flee attempt {}/{}: yaw {:+.1}° proposed {:?} → {:?} ({:?})",
            attempt + 1,
            config.flee_attempts,
            angle,
            proposed,
            sampled,
            validity
        ));

        candidates.push(DestinationCandidate {
            attempt,
            proposed,
            sampled,
            validity,
        });

        if let (CandidateValidity::Reachable, Some(destination)) = (validity, sampled) {
            return Ok(FleePlan {
                destination,
                candidates,
            });
        }
    }

    Err(BehaviorError::NoFleeDestination {
        attempts: candidates.len(),
    })
}
