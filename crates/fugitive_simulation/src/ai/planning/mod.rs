//! Destination planners (pure functions, без ECS).
//!
//! Получают NavMesh и RNG явно — тесты подсовывают scripted NavMesh и
//! seeded ChaCha8Rng, результат детерминирован.

pub mod flee;
pub mod wander;

#[cfg(test)]
mod flee_tests;

pub use flee::{plan_flee_destination, CandidateValidity, DestinationCandidate, FleePlan};
pub use wander::{plan_wander_destination, random_point_in_unit_sphere};
