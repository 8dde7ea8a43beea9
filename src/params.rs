/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * host-supplied knobs for the flocking core: grid sizing, per-boid steering
 * tunables and population size. Every field has a default, and a partial
 * JSON document only overrides the fields it names.
 */

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, ConfigError};
use crate::spatial_grid::{grid_cell_count, scaled_subdivisions};

// How the alignment rule averages neighbor velocities
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentAveraging {
    /// Sum of neighbor velocities divided once by the neighbor count.
    #[default]
    Mean,
    /// Running sum divided by the neighbor count after every neighbor, so
    /// earlier neighbors decay geometrically.
    Compounding,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridParams {
    /// Uniform multiplier applied to the base bounds and base subdivisions.
    pub scale: u32,
    /// Number of cells searched in each direction when gathering neighbors.
    pub neighbor_search_distance: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            scale: 2,
            neighbor_search_distance: 2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoidParams {
    pub mass: f32,
    pub max_speed: f32,
    /// Upper bound on the length of the combined steering vector.
    pub max_force: f32,
    pub alignment_weight: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    /// Compared against the *squared* distance to a neighbor.
    pub separation_radius: f32,
    /// Speed added toward the grid center while outside the buffered bounds.
    pub boundary_repulsion: f32,
    /// Inward margin of the bounds that triggers boundary correction.
    pub edge_buffer: f32,
    pub alignment_averaging: AlignmentAveraging,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            max_speed: 25.0,
            max_force: 15.0,
            alignment_weight: 12.0,
            separation_weight: 300.0,
            cohesion_weight: 0.5,
            separation_radius: 10.0,
            boundary_repulsion: 50.0,
            edge_buffer: 15.0,
            alignment_averaging: AlignmentAveraging::Mean,
        }
    }
}

impl BoidParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("mass", self.mass)?;
        ensure_non_negative("max_speed", self.max_speed)?;
        ensure_non_negative("max_force", self.max_force)?;
        ensure_non_negative("alignment_weight", self.alignment_weight)?;
        ensure_non_negative("separation_weight", self.separation_weight)?;
        ensure_non_negative("cohesion_weight", self.cohesion_weight)?;
        ensure_non_negative("separation_radius", self.separation_radius)?;
        ensure_non_negative("boundary_repulsion", self.boundary_repulsion)?;
        ensure_non_negative("edge_buffer", self.edge_buffer)?;
        Ok(())
    }
}

// Parameters for the whole simulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationParams {
    /// Seed for the spawn generator; equal seeds give equal runs.
    pub seed: u64,
    pub num_boids: usize,
    /// Rate of the fixed physics step used by `Model::advance`.
    pub fixed_physics_fps: f32,
    pub enable_parallel: bool,
    pub grid: GridParams,
    pub boid: BoidParams,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            num_boids: 100,
            fixed_physics_fps: 60.0,
            enable_parallel: true,
            grid: GridParams::default(),
            boid: BoidParams::default(),
        }
    }
}

impl SimulationParams {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    // Check every knob before any grid or boid is built from it
    pub fn validate(&self) -> Result<(), ConfigError> {
        grid_cell_count(scaled_subdivisions(self.grid.scale)?)?;
        if self.grid.neighbor_search_distance == 0 {
            return Err(ConfigError::ZeroSearchDistance);
        }
        if u32::try_from(self.num_boids).is_err() {
            return Err(ConfigError::TooManyBoids(self.num_boids));
        }
        self.physics_step_size()?;
        self.boid.validate()
    }

    /// Duration of one fixed physics step. Refuses rates whose step rounds
    /// to zero or does not fit a `Duration`.
    pub fn physics_step_size(&self) -> Result<Duration, ConfigError> {
        ensure_positive("fixed_physics_fps", self.fixed_physics_fps)?;
        match Duration::try_from_secs_f32(1.0 / self.fixed_physics_fps) {
            Ok(step) if !step.is_zero() => Ok(step),
            _ => Err(ConfigError::InvalidStepRate(self.fixed_physics_fps)),
        }
    }
}
