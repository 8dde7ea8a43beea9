/*
 * Physics Module
 *
 * This module drives one simulation tick:
 * 1. Rebuild the spatial grid (cells, snapshot, neighbor lists)
 * 2. Update every boid from its precomputed neighbor list
 *
 * The rebuild always completes before any boid moves. Boid updates only read
 * the grid's snapshot and only write their own state, so they can run in
 * parallel chunks and still produce the same result as a sequential pass.
 */

use rayon::prelude::*;
use tracing::trace;

use crate::boid::Boid;
use crate::spatial_grid::SpatialGrid;

// Advance the whole flock by one tick
pub fn step(grid: &mut SpatialGrid, boids: &mut [Boid], delta_time: f32, parallel: bool) {
    grid.rebuild(boids);

    // Rebuild is done; from here the grid is read-only for the rest of the tick
    let grid = &*grid;

    if parallel {
        // Process boids in chunks to reduce the number of parallel tasks
        let chunk_size = parallel_chunk_size(boids.len());
        trace!(chunk_size, "parallel boid update");

        boids.par_chunks_mut(chunk_size).for_each(|chunk| {
            for boid in chunk {
                boid.update(grid, delta_time);
            }
        });
    } else {
        for boid in boids.iter_mut() {
            boid.update(grid, delta_time);
        }
    }
}

// One chunk per worker thread, never empty
pub fn parallel_chunk_size(boid_count: usize) -> usize {
    std::cmp::max(boid_count / rayon::current_num_threads(), 1)
}
