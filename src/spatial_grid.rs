/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for efficient neighbor lookups.
 * It divides a fixed bounded volume into a uniform 3D grid of cells, so that
 * each boid only looks at boids in nearby cells instead of the whole flock.
 *
 * Once per tick the grid is rebuilt from scratch:
 * - every cell is cleared and refilled from the registered boids
 * - a snapshot of each boid's position and velocity is taken
 * - a neighbor list is precomputed for every boid
 *
 * Steering reads only the snapshot and the precomputed lists, so no boid
 * can observe another boid's partially updated state within a tick.
 */

use glam::{IVec3, UVec3, Vec3};
use tracing::{trace, warn};

use crate::boid::{Boid, BoidId};
use crate::error::ConfigError;
use crate::{BASE_GRID_BOUNDS, BASE_GRID_SUBDIVISIONS, MAX_GRID_CELLS};

/// Start-of-tick state of a boid as seen by its neighbors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoidSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
}

pub struct SpatialGrid {
    grid_bounds: Vec3,
    grid_subdivisions: UVec3,
    cell_dimensions: Vec3,
    neighbor_search_distance: u32,
    // One entry per cell, indexed by the linearized cell key; never resized
    cells: Vec<Vec<BoidId>>,
    // Registered boids, in insertion order
    boids: Vec<BoidId>,
    // Indexed by boid id
    registered: Vec<bool>,
    snapshots: Vec<BoidSnapshot>,
    neighbors: Vec<Option<Vec<BoidId>>>,
}

impl SpatialGrid {
    pub fn new(
        grid_bounds: Vec3,
        grid_subdivisions: UVec3,
        neighbor_search_distance: u32,
    ) -> Result<Self, ConfigError> {
        if grid_subdivisions.cmpeq(UVec3::ZERO).any() {
            return Err(ConfigError::ZeroSubdivisions(grid_subdivisions));
        }
        if !grid_bounds.is_finite() || grid_bounds.cmple(Vec3::ZERO).any() {
            return Err(ConfigError::InvalidBounds(grid_bounds));
        }
        if neighbor_search_distance == 0 {
            return Err(ConfigError::ZeroSearchDistance);
        }

        let cell_count = grid_cell_count(grid_subdivisions)?;
        let cell_dimensions = grid_bounds / grid_subdivisions.as_vec3();

        // Every cell exists up front; membership is the only thing that changes
        let mut cells = Vec::with_capacity(cell_count);
        cells.resize_with(cell_count, Vec::new);

        Ok(Self {
            grid_bounds,
            grid_subdivisions,
            cell_dimensions,
            neighbor_search_distance,
            cells,
            boids: Vec::new(),
            registered: Vec::new(),
            snapshots: Vec::new(),
            neighbors: Vec::new(),
        })
    }

    // Base bounds and subdivisions multiplied uniformly by `scale`
    pub fn scaled(scale: u32, neighbor_search_distance: u32) -> Result<Self, ConfigError> {
        let subdivisions = scaled_subdivisions(scale)?;
        Self::new(
            BASE_GRID_BOUNDS * scale as f32,
            subdivisions,
            neighbor_search_distance,
        )
    }

    /// Registers a boid. It gets a cell on the next [`SpatialGrid::rebuild`].
    pub fn insert(&mut self, boid: &Boid) {
        let id = boid.id();
        let slot = id.index();

        if slot >= self.registered.len() {
            self.registered.resize(slot + 1, false);
            self.neighbors.resize_with(slot + 1, || None);
        }
        if self.registered[slot] {
            warn!(?id, "boid is already registered with the spatial grid");
            return;
        }

        self.registered[slot] = true;
        self.boids.push(id);
        trace!(?id, total = self.boids.len(), "registered boid");
    }

    /// Rebuilds cell membership, the neighbor snapshot and every neighbor list.
    ///
    /// `boids` must be indexable by every registered id. Each boid's
    /// `grid_index` is refreshed as a side effect.
    pub fn rebuild(&mut self, boids: &mut [Boid]) {
        // Clear all cells so membership reflects this tick only
        for cell in &mut self.cells {
            cell.clear();
        }

        self.snapshots.clear();
        self.snapshots.resize(self.registered.len(), BoidSnapshot::default());

        let boid_count = boids.len();
        for &id in &self.boids {
            let Some(boid) = boids.get_mut(id.index()) else {
                panic!(
                    "boid {id:?} is registered with the spatial grid but missing from a slice of {boid_count} boids"
                );
            };
            debug_assert_eq!(boid.id(), id, "boid slice is not ordered by id");

            let key = self.cell_index_of(boid.position);
            boid.grid_index = key;

            let cell = self.linear_index(key);
            self.cells[cell].push(id);
            self.snapshots[id.index()] = BoidSnapshot {
                position: boid.position,
                velocity: boid.velocity,
            };
        }

        self.precompute_neighbors(boids);
        trace!(boids = self.boids.len(), "spatial grid rebuilt");
    }

    // Overwrite the neighbor list of every registered boid, reusing allocations
    fn precompute_neighbors(&mut self, boids: &[Boid]) {
        for i in 0..self.boids.len() {
            let id = self.boids[i];
            let key = boids[id.index()].grid_index;

            let mut list = self.neighbors[id.index()].take().unwrap_or_default();
            list.clear();
            self.gather_nearby(key, self.neighbor_search_distance, false, &mut list);
            list.retain(|&other| other != id);

            self.neighbors[id.index()] = Some(list);
        }
    }

    /// Neighbors precomputed by the last rebuild; empty if the boid has not
    /// been indexed yet.
    pub fn neighbors(&self, id: BoidId) -> &[BoidId] {
        self.neighbors
            .get(id.index())
            .and_then(|list| list.as_deref())
            .unwrap_or(&[])
    }

    /// Start-of-tick state of every neighbor of `id`.
    pub fn neighbor_snapshots(
        &self,
        id: BoidId,
    ) -> impl ExactSizeIterator<Item = &BoidSnapshot> + Clone + '_ {
        self.neighbors(id)
            .iter()
            .map(move |other| &self.snapshots[other.index()])
    }

    /// Boids in cells whose key lies in `[key - range, key + range - 1]` on
    /// every axis. Cells outside the grid are skipped.
    pub fn nearby(&self, key: UVec3, range: u32, exclude_center: bool) -> Vec<BoidId> {
        self.assert_cell(key);
        let mut result = Vec::new();
        self.gather_nearby(key, range, exclude_center, &mut result);
        result
    }

    fn gather_nearby(&self, key: UVec3, range: u32, exclude_center: bool, out: &mut Vec<BoidId>) {
        // A range past the widest axis already covers the whole grid
        let range = range.min(self.grid_subdivisions.max_element());
        let center = key.as_ivec3();
        let reach = IVec3::splat(range as i32);

        // Clamp the search window to the grid instead of testing every key
        let min = (center - reach).max(IVec3::ZERO);
        let max = (center + reach).min(self.grid_subdivisions.as_ivec3());

        for x in min.x..max.x {
            for y in min.y..max.y {
                for z in min.z..max.z {
                    let index = IVec3::new(x, y, z);
                    if exclude_center && index == center {
                        continue;
                    }
                    let cell = &self.cells[self.linear_index(index.as_uvec3())];
                    out.extend_from_slice(cell);
                }
            }
        }
    }

    /// Cell key containing `position`, clamped into the grid on every axis.
    #[inline]
    pub fn cell_index_of(&self, position: Vec3) -> UVec3 {
        let max_index = (self.grid_subdivisions - UVec3::ONE).as_vec3();
        (position / self.cell_dimensions)
            .floor()
            .clamp(Vec3::ZERO, max_index)
            .as_uvec3()
    }

    // Minimum corner of the cell containing `position`
    pub fn cell_position(&self, position: Vec3) -> Vec3 {
        self.cell_index_of(position).as_vec3() * self.cell_dimensions
    }

    /// Members of one cell. Panics if `key` is outside the grid.
    pub fn cell(&self, key: UVec3) -> &[BoidId] {
        &self.cells[self.linear_index(key)]
    }

    pub fn contains_cell(&self, index: IVec3) -> bool {
        index.cmpge(IVec3::ZERO).all() && index.cmplt(self.grid_subdivisions.as_ivec3()).all()
    }

    // Non-empty cells with their keys, for host-side debug drawing
    pub fn occupied_cells(&self) -> impl Iterator<Item = (UVec3, &[BoidId])> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(linear, cell)| (self.cell_key(linear), cell.as_slice()))
    }

    pub fn is_in_bounds(&self, position: Vec3, buffer: f32) -> bool {
        let buffer = Vec3::splat(buffer);
        position.cmpge(buffer).all() && position.cmple(self.grid_bounds - buffer).all()
    }

    pub fn grid_center(&self) -> Vec3 {
        self.grid_bounds / 2.0
    }

    pub fn grid_bounds(&self) -> Vec3 {
        self.grid_bounds
    }

    pub fn grid_subdivisions(&self) -> UVec3 {
        self.grid_subdivisions
    }

    pub fn cell_dimensions(&self) -> Vec3 {
        self.cell_dimensions
    }

    pub fn neighbor_search_distance(&self) -> u32 {
        self.neighbor_search_distance
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn boid_count(&self) -> usize {
        self.boids.len()
    }

    pub fn boids(&self) -> &[BoidId] {
        &self.boids
    }

    #[inline]
    fn assert_cell(&self, key: UVec3) {
        assert!(
            key.cmplt(self.grid_subdivisions).all(),
            "cell {key} outside grid subdivisions {}",
            self.grid_subdivisions
        );
    }

    #[inline]
    fn linear_index(&self, key: UVec3) -> usize {
        self.assert_cell(key);
        let s = self.grid_subdivisions;
        (key.x as usize * s.y as usize + key.y as usize) * s.z as usize + key.z as usize
    }

    fn cell_key(&self, linear: usize) -> UVec3 {
        let s = self.grid_subdivisions;
        let z = linear % s.z as usize;
        let rest = linear / s.z as usize;
        let y = rest % s.y as usize;
        let x = rest / s.y as usize;
        UVec3::new(x as u32, y as u32, z as u32)
    }
}

// Base subdivisions multiplied by `scale`, refusing zero and overflow
pub(crate) fn scaled_subdivisions(scale: u32) -> Result<UVec3, ConfigError> {
    if scale == 0 {
        return Err(ConfigError::ZeroScale);
    }
    let axis = |base: u32| base.checked_mul(scale).ok_or(ConfigError::ScaleTooLarge(scale));
    Ok(UVec3::new(
        axis(BASE_GRID_SUBDIVISIONS.x)?,
        axis(BASE_GRID_SUBDIVISIONS.y)?,
        axis(BASE_GRID_SUBDIVISIONS.z)?,
    ))
}

// Total cells for `subdivisions`, bounded by MAX_GRID_CELLS
pub(crate) fn grid_cell_count(subdivisions: UVec3) -> Result<usize, ConfigError> {
    (subdivisions.x as usize)
        .checked_mul(subdivisions.y as usize)
        .and_then(|count| count.checked_mul(subdivisions.z as usize))
        .filter(|&count| count <= MAX_GRID_CELLS)
        .ok_or(ConfigError::TooManyCells(subdivisions))
}
