//! GridNavMesh — walkable surface как сетка клеток на плоскости XZ.
//!
//! Каждая клетка либо walkable на высоте `h`, либо заблокирована.
//! Соседние клетки связаны (4-connected), если перепад высот <= `max_climb`.
//! Используется headless симуляцией и тестами вместо движкового NavMesh.

use std::collections::VecDeque;

use bevy::prelude::*;

use super::{GroundProbe, NavMeshQuery};

/// Перепад высот между соседними клетками, который агент может преодолеть
const DEFAULT_MAX_CLIMB: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct GridNavMesh {
    /// Мировые координаты (x, z) угла клетки (0, 0)
    origin: Vec2,
    cell_size: f32,
    width: usize,
    depth: usize,
    max_climb: f32,
    /// Высота walkable поверхности, None = blocked
    cells: Vec<Option<f32>>,
}

impl GridNavMesh {
    /// Плоская полностью walkable сетка на высоте 0
    pub fn flat(width: usize, depth: usize, cell_size: f32, origin: Vec2) -> Self {
        Self {
            origin,
            cell_size,
            width,
            depth,
            max_climb: DEFAULT_MAX_CLIMB,
            cells: vec![Some(0.0); width * depth],
        }
    }

    /// Сетка с центром в мировом (0, 0): удобно для тестов
    pub fn centered(width: usize, depth: usize, cell_size: f32) -> Self {
        let origin = Vec2::new(
            -(width as f32) * cell_size * 0.5,
            -(depth as f32) * cell_size * 0.5,
        );
        Self::flat(width, depth, cell_size, origin)
    }

    pub fn with_max_climb(mut self, max_climb: f32) -> Self {
        self.max_climb = max_climb;
        self
    }

    /// Блокирует прямоугольник клеток [x0..=x1] × [z0..=z1]
    pub fn with_blocked_rect(mut self, x0: usize, z0: usize, x1: usize, z1: usize) -> Self {
        self.fill_rect(x0, z0, x1, z1, None);
        self
    }

    /// Поднимает прямоугольник клеток на высоту `height`
    pub fn with_height_rect(mut self, x0: usize, z0: usize, x1: usize, z1: usize, height: f32) -> Self {
        self.fill_rect(x0, z0, x1, z1, Some(height));
        self
    }

    pub fn set_cell(&mut self, x: usize, z: usize, surface: Option<f32>) {
        if x < self.width && z < self.depth {
            self.cells[z * self.width + x] = surface;
        }
    }

    fn fill_rect(&mut self, x0: usize, z0: usize, x1: usize, z1: usize, surface: Option<f32>) {
        for z in z0..=z1.min(self.depth.saturating_sub(1)) {
            for x in x0..=x1.min(self.width.saturating_sub(1)) {
                self.set_cell(x, z, surface);
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Клетка, содержащая мировую точку (по XZ)
    pub fn cell_of(&self, point: Vec3) -> Option<(usize, usize)> {
        if !point.is_finite() {
            return None;
        }

        let fx = ((point.x - self.origin.x) / self.cell_size).floor();
        let fz = ((point.z - self.origin.y) / self.cell_size).floor();

        if fx < 0.0 || fz < 0.0 || fx >= self.width as f32 || fz >= self.depth as f32 {
            return None;
        }

        Some((fx as usize, fz as usize))
    }

    pub fn surface(&self, x: usize, z: usize) -> Option<f32> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        self.cells[z * self.width + x]
    }

    /// Центр walkable клетки на её высоте
    pub fn cell_center(&self, x: usize, z: usize) -> Option<Vec3> {
        let height = self.surface(x, z)?;
        Some(Vec3::new(
            self.origin.x + (x as f32 + 0.5) * self.cell_size,
            height,
            self.origin.y + (z as f32 + 0.5) * self.cell_size,
        ))
    }

    /// Диапазон индексов клеток, покрывающих [min, max] по одной оси
    fn index_range(&self, min: f32, max: f32, axis_origin: f32, count: usize) -> Option<(usize, usize)> {
        let lo = ((min - axis_origin) / self.cell_size).floor().max(0.0);
        let hi = ((max - axis_origin) / self.cell_size).floor();

        if count == 0 || hi < 0.0 || lo >= count as f32 {
            return None;
        }

        Some((lo as usize, (hi as usize).min(count - 1)))
    }

    fn neighbors(&self, x: usize, z: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let offsets: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        offsets.into_iter().filter_map(move |(dx, dz)| {
            let nx = x.checked_add_signed(dx)?;
            let nz = z.checked_add_signed(dz)?;
            let here = self.surface(x, z)?;
            let there = self.surface(nx, nz)?;
            ((there - here).abs() <= self.max_climb).then_some((nx, nz))
        })
    }
}

impl NavMeshQuery for GridNavMesh {
    fn sample_position(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if !point.is_finite() || !(radius >= 0.0) {
            return None;
        }

        let (x0, x1) = self.index_range(point.x - radius, point.x + radius, self.origin.x, self.width)?;
        let (z0, z1) = self.index_range(point.z - radius, point.z + radius, self.origin.y, self.depth)?;

        let mut best: Option<(Vec3, f32)> = None;
        for z in z0..=z1 {
            for x in x0..=x1 {
                let Some(center) = self.cell_center(x, z) else {
                    continue;
                };

                let distance = center.distance(point);
                if distance > radius {
                    continue;
                }

                if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                    best = Some((center, distance));
                }
            }
        }

        best.map(|(center, _)| center)
    }

    fn has_path(&self, from: Vec3, to: Vec3) -> bool {
        let (Some(start), Some(goal)) = (self.cell_of(from), self.cell_of(to)) else {
            return false;
        };

        if self.surface(start.0, start.1).is_none() || self.surface(goal.0, goal.1).is_none() {
            return false;
        }

        // BFS по walkable клеткам
        let mut visited = vec![false; self.width * self.depth];
        let mut queue = VecDeque::new();
        visited[start.1 * self.width + start.0] = true;
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                return true;
            }

            for (nx, nz) in self.neighbors(cell.0, cell.1) {
                let index = nz * self.width + nx;
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back((nx, nz));
                }
            }
        }

        false
    }
}

impl GroundProbe for GridNavMesh {
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
        let (x, z) = self.cell_of(origin)?;
        let height = self.surface(x, z)?;

        let drop = origin.y - height;
        if drop < 0.0 || drop > max_distance {
            return None;
        }

        Some(Vec3::new(origin.x, height, origin.z))
    }
}
