//! Tests for the flee destination planner.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::flee::{plan_flee_destination, CandidateValidity};
use crate::config::FleeConfig;
use crate::error::BehaviorError;
use crate::navigation::NavMeshQuery;

/// Scripted NavMesh: sampling проходит только для точек дальше `min_reach`
/// от `origin`, путь есть только если `reachable`. Считает вызовы.
struct ScriptedNavMesh {
    origin: Vec3,
    min_reach: f32,
    on_mesh: bool,
    reachable: bool,
    samples: AtomicUsize,
    path_checks: AtomicUsize,
}

impl ScriptedNavMesh {
    fn open() -> Self {
        Self {
            origin: Vec3::ZERO,
            min_reach: 0.0,
            on_mesh: true,
            reachable: true,
            samples: AtomicUsize::new(0),
            path_checks: AtomicUsize::new(0),
        }
    }

    fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }

    fn path_checks(&self) -> usize {
        self.path_checks.load(Ordering::SeqCst)
    }
}

impl NavMeshQuery for ScriptedNavMesh {
    fn sample_position(&self, point: Vec3, _radius: f32) -> Option<Vec3> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        (self.on_mesh && point.distance(self.origin) >= self.min_reach).then_some(point)
    }

    fn has_path(&self, _from: Vec3, _to: Vec3) -> bool {
        self.path_checks.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[test]
fn test_first_attempt_moves_away_from_threat() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig::default();
    let agent = Vec3::ZERO;
    let threat = Vec3::new(8.0, 0.0, 0.0);

    let plan = plan_flee_destination(agent, threat, Vec3::ZERO, &config, 4.0, &navmesh, &mut rng(1))
        .expect("open field always succeeds");

    assert_eq!(plan.attempts_used(), 1);
    assert_eq!(plan.candidates[0].validity, CandidateValidity::Reachable);
    assert!(plan.destination.distance(threat) > agent.distance(threat));
    assert_eq!(navmesh.samples(), 1);
    assert_eq!(navmesh.path_checks(), 1);
}

#[test]
fn test_all_off_mesh_fails_after_exact_attempts() {
    let navmesh = ScriptedNavMesh {
        on_mesh: false,
        ..ScriptedNavMesh::open()
    };
    let config = FleeConfig::default();

    let result = plan_flee_destination(
        Vec3::ZERO,
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
        &config,
        4.0,
        &navmesh,
        &mut rng(2),
    );

    assert_eq!(result, Err(BehaviorError::NoFleeDestination { attempts: 5 }));
    assert_eq!(navmesh.samples(), 5);
    assert_eq!(navmesh.path_checks(), 0);
}

#[test]
fn test_unreachable_points_exhaust_attempts() {
    let navmesh = ScriptedNavMesh {
        reachable: false,
        ..ScriptedNavMesh::open()
    };
    let config = FleeConfig {
        flee_attempts: 3,
        ..Default::default()
    };

    let result = plan_flee_destination(
        Vec3::ZERO,
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
        &config,
        4.0,
        &navmesh,
        &mut rng(3),
    );

    assert_eq!(result, Err(BehaviorError::NoFleeDestination { attempts: 3 }));
    assert_eq!(navmesh.samples(), 3);
    assert_eq!(navmesh.path_checks(), 3);
}

#[test]
fn test_search_distance_grows_until_valid() {
    // Ближе 14м NavMesh "не находит" точку: 10 и 12.5 проваливаются, 15 проходит
    let navmesh = ScriptedNavMesh {
        min_reach: 14.0,
        ..ScriptedNavMesh::open()
    };
    let config = FleeConfig::default();

    let plan = plan_flee_destination(
        Vec3::ZERO,
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
        &config,
        4.0,
        &navmesh,
        &mut rng(4),
    )
    .expect("third attempt reaches 15m");

    assert_eq!(plan.attempts_used(), 3);
    assert_eq!(plan.candidates[0].validity, CandidateValidity::OffMesh);
    assert_eq!(plan.candidates[1].validity, CandidateValidity::OffMesh);
    assert_eq!(plan.candidates[2].validity, CandidateValidity::Reachable);
    assert!((plan.destination.length() - 15.0).abs() < 1e-3);
    // Первая удачная попытка останавливает цикл
    assert_eq!(navmesh.samples(), 3);
}

#[test]
fn test_zero_variation_flees_straight_away() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig {
        flee_angle_variation: 0.0,
        ..Default::default()
    };

    let plan = plan_flee_destination(
        Vec3::ZERO,
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
        &config,
        4.0,
        &navmesh,
        &mut rng(5),
    )
    .expect("open field");

    assert!(plan.destination.abs_diff_eq(Vec3::new(-10.0, 0.0, 0.0), 1e-4));
}

#[test]
fn test_coincident_positions_use_fallback_heading() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig {
        flee_angle_variation: 0.0,
        ..Default::default()
    };
    let here = Vec3::new(1.0, 0.0, 1.0);

    let plan = plan_flee_destination(here, here, Vec3::X, &config, 4.0, &navmesh, &mut rng(6))
        .expect("open field");
    assert!(plan.destination.abs_diff_eq(here + Vec3::X * 10.0, 1e-4));
    assert!(plan.destination.is_finite());

    // Без heading — forward (-Z)
    let plan = plan_flee_destination(here, here, Vec3::ZERO, &config, 4.0, &navmesh, &mut rng(6))
        .expect("open field");
    assert!(plan.destination.abs_diff_eq(here + Vec3::NEG_Z * 10.0, 1e-4));
}

#[test]
fn test_threat_overhead_flees_horizontally() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig {
        flee_angle_variation: 0.0,
        ..Default::default()
    };
    let here = Vec3::new(1.0, 0.0, 1.0);

    // Угроза строго сверху: вертикальное "прочь" заменяется fallback heading
    let plan = plan_flee_destination(here, here + Vec3::Y * 3.0, Vec3::X, &config, 4.0, &navmesh, &mut rng(8))
        .expect("open field");
    assert!(plan.destination.abs_diff_eq(here + Vec3::X * 10.0, 1e-4));

    // Угроза сверху-сбоку: высота не сокращает горизонтальный шаг
    let plan = plan_flee_destination(
        here,
        Vec3::new(1.0, 5.0, 3.0),
        Vec3::X,
        &config,
        4.0,
        &navmesh,
        &mut rng(8),
    )
    .expect("open field");
    assert!(plan.destination.abs_diff_eq(here + Vec3::NEG_Z * 10.0, 1e-4));
    assert_eq!(plan.destination.y, here.y);
}

#[test]
fn test_deviation_stays_within_half_variation() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig::default(); // 60° → ±30°
    let away = Vec3::NEG_X;

    for seed in 0..64 {
        let plan = plan_flee_destination(
            Vec3::ZERO,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::ZERO,
            &config,
            4.0,
            &navmesh,
            &mut rng(seed),
        )
        .expect("open field");

        let angle = plan.destination.normalize().angle_between(away).to_degrees();
        assert!(angle <= 30.0 + 1e-3, "seed {} deviated {}°", seed, angle);
        // Поворот только вокруг вертикали
        assert!(plan.destination.y.abs() < 1e-4);
    }
}

#[test]
fn test_same_seed_same_plan() {
    let navmesh = ScriptedNavMesh::open();
    let config = FleeConfig::default();
    let threat = Vec3::new(3.0, 0.0, -2.0);

    let first = plan_flee_destination(Vec3::ZERO, threat, Vec3::ZERO, &config, 4.0, &navmesh, &mut rng(99));
    let second = plan_flee_destination(Vec3::ZERO, threat, Vec3::ZERO, &config, 4.0, &navmesh, &mut rng(99));

    assert_eq!(first, second);
}
