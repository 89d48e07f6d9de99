//! Navigation domain — NavMesh queries и ground probe.
//!
//! # Architecture
//!
//! NavMesh — внешний capability (в движке это NavigationServer / NavMesh
//! singleton с per-level lifecycle). Здесь он спрятан за traits и
//! инжектится в World как resource, поэтому:
//! - тесты подменяют его scripted fakes
//! - несколько агентов делят одну read-only структуру (`Arc<dyn ..>`)
//!
//! # Submodules
//!
//! - `grid`: `GridNavMesh` — reference реализация на сетке клеток (headless)

use std::sync::Arc;

use bevy::prelude::*;

pub mod grid;

pub use grid::GridNavMesh;

/// Запросы к walkable surface (read-only, безопасно из нескольких потоков)
pub trait NavMeshQuery: Send + Sync {
    /// Ближайшая walkable точка в радиусе `radius` от `point`, либо None
    fn sample_position(&self, point: Vec3, radius: f32) -> Option<Vec3>;

    /// Есть ли полный (complete) путь от `from` до `to`
    fn has_path(&self, from: Vec3, to: Vec3) -> bool;
}

/// Raycast вниз для ground-snap
pub trait GroundProbe: Send + Sync {
    /// Точка попадания луча, пущенного из `origin` строго вниз на `max_distance`
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Resource: NavMesh текущего уровня
#[derive(Resource, Clone)]
pub struct NavMeshService(pub Arc<dyn NavMeshQuery>);

impl NavMeshService {
    pub fn new(navmesh: impl NavMeshQuery + 'static) -> Self {
        Self(Arc::new(navmesh))
    }

    pub fn query(&self) -> &dyn NavMeshQuery {
        self.0.as_ref()
    }
}

/// Resource: ground probe (physics raycast в движке)
#[derive(Resource, Clone)]
pub struct GroundService(pub Arc<dyn GroundProbe>);

impl GroundService {
    pub fn new(probe: impl GroundProbe + 'static) -> Self {
        Self(Arc::new(probe))
    }

    pub fn probe(&self) -> &dyn GroundProbe {
        self.0.as_ref()
    }
}
