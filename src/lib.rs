/*
 * 3D Boid Flocking Core - Module Definitions
 *
 * This file defines the module structure for the flocking core.
 * The spatial grid turns the neighbor search into a bounded local lookup,
 * and the boid module turns each neighbor set into a velocity update.
 * Everything else (spawning, rendering, frame callbacks) belongs to the host.
 */

use glam::{UVec3, Vec3};

// Re-export key components for easier access
pub use app::Model;
pub use boid::{Boid, BoidId};
pub use debug::DebugInfo;
pub use error::ConfigError;
pub use params::{AlignmentAveraging, BoidParams, GridParams, SimulationParams};
pub use spatial_grid::{BoidSnapshot, SpatialGrid};

// Define modules
pub mod app;
pub mod boid;
pub mod debug;
pub mod error;
pub mod params;
pub mod physics;
pub mod spatial_grid;

// Grid extent before the scale factor is applied
pub const BASE_GRID_BOUNDS: Vec3 = Vec3::new(100.0, 100.0, 100.0);

// Cell counts per axis before the scale factor is applied
pub const BASE_GRID_SUBDIVISIONS: UVec3 = UVec3::new(20, 20, 20);

// Largest cell count a grid may allocate
pub const MAX_GRID_CELLS: usize = 1 << 24;

// Spawned boids land within this offset of the grid center on each axis
pub const SPAWN_OFFSET: f32 = 25.0;
