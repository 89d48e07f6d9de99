//! Wander Destination Planner — случайная reachable точка в радиусе.

use bevy::prelude::*;
use rand::Rng;

use crate::error::BehaviorError;
use crate::navigation::NavMeshQuery;

/// Равномерная точка внутри единичного шара (rejection sampling)
pub fn random_point_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}

/// Случайная walkable точка не дальше `walk_radius` от `origin`.
///
/// NavMesh sampling ищет в радиусе `walk_radius` вокруг случайной точки,
/// поэтому попадание может оказаться дальше от origin — такие отбрасываем.
/// Повторных попыток в этом же тике нет.
pub fn plan_wander_destination(
    origin: Vec3,
    walk_radius: f32,
    navmesh: &dyn NavMeshQuery,
    rng: &mut impl Rng,
) -> Result<Vec3, BehaviorError> {
    let sample = origin + random_point_in_unit_sphere(rng) * walk_radius;

    let hit = navmesh
        .sample_position(sample, walk_radius)
        .ok_or(BehaviorError::NoWanderDestination)?;

    if hit.distance(origin) > walk_radius {
        return Err(BehaviorError::NoWanderDestination);
    }

    Ok(hit)
}
