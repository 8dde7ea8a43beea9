/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that summarizes the state of the
 * flock after a tick. The host logs it or feeds it to its own overlays.
 *
 * Includes metrics for:
 * - Boid count and occupied grid cells
 * - Busiest cell and mean neighbor count
 * - Mean speed and boids outside the buffered bounds
 * - Physics steps run in the last frame
 */

use crate::boid::Boid;
use crate::spatial_grid::SpatialGrid;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugInfo {
    pub tick: u64,
    pub boid_count: usize,
    pub occupied_cells: usize,
    pub max_cell_occupancy: usize,
    pub mean_neighbors: f32,
    pub mean_speed: f32,
    pub outside_edge_buffer: usize,
    pub physics_updates_per_frame: usize,
}

impl DebugInfo {
    // Gather statistics from the grid's last rebuild and the current boid state
    pub fn collect(grid: &SpatialGrid, boids: &[Boid]) -> Self {
        let mut occupied_cells = 0;
        let mut max_cell_occupancy = 0;
        for (_, cell) in grid.occupied_cells() {
            occupied_cells += 1;
            max_cell_occupancy = max_cell_occupancy.max(cell.len());
        }

        let boid_count = boids.len();
        let (mean_neighbors, mean_speed) = if boid_count > 0 {
            let neighbors: usize = boids.iter().map(|b| grid.neighbors(b.id()).len()).sum();
            let speed: f32 = boids.iter().map(|b| b.velocity.length()).sum();
            (neighbors as f32 / boid_count as f32, speed / boid_count as f32)
        } else {
            (0.0, 0.0)
        };

        let outside_edge_buffer = boids
            .iter()
            .filter(|b| !grid.is_in_bounds(b.position, b.params.edge_buffer))
            .count();

        Self {
            tick: 0,
            boid_count,
            occupied_cells,
            max_cell_occupancy,
            mean_neighbors,
            mean_speed,
            outside_edge_buffer,
            physics_updates_per_frame: 0,
        }
    }
}
