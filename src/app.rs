/*
 * Application Module
 *
 * This module defines the host-side model for the flocking core.
 * It owns the boids, the spatial grid and the seeded spawn generator, and
 * exposes the per-frame entry points a host loop calls:
 * - tick: one physics step with an explicit delta time
 * - advance: fixed-timestep stepping driven by elapsed frame time
 */

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::{debug, info};

use crate::boid::{Boid, BoidId};
use crate::debug::DebugInfo;
use crate::error::ConfigError;
use crate::params::SimulationParams;
use crate::physics;
use crate::spatial_grid::SpatialGrid;

pub struct Model {
    pub boids: Vec<Boid>,
    pub params: SimulationParams,
    pub spatial_grid: SpatialGrid,
    pub debug_info: DebugInfo,
    rng: ChaCha12Rng,
    // Fixed timestep physics variables
    physics_accumulator: Duration,
    physics_step_size: Duration,
    tick: u64,
}

impl Model {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let spatial_grid =
            SpatialGrid::scaled(params.grid.scale, params.grid.neighbor_search_distance)?;
        let physics_step_size = params.physics_step_size()?;

        let mut model = Self {
            boids: Vec::with_capacity(params.num_boids),
            rng: ChaCha12Rng::seed_from_u64(params.seed),
            spatial_grid,
            debug_info: DebugInfo::default(),
            physics_accumulator: Duration::ZERO,
            physics_step_size,
            tick: 0,
            params,
        };

        for _ in 0..model.params.num_boids {
            model.spawn_boid()?;
        }

        info!(
            boids = model.boids.len(),
            cells = model.spatial_grid.cell_count(),
            bounds = %model.spatial_grid.grid_bounds(),
            seed = model.params.seed,
            "flock initialized"
        );
        Ok(model)
    }

    /// Creates a boid with the next free id and registers it with the grid.
    /// Fails once the `u32` id space is used up.
    pub fn spawn_boid(&mut self) -> Result<BoidId, ConfigError> {
        let raw = u32::try_from(self.boids.len())
            .map_err(|_| ConfigError::TooManyBoids(self.boids.len() + 1))?;
        let id = BoidId::new(raw);

        let boid = Boid::spawn(id, &self.spatial_grid, &self.params.boid, &mut self.rng);
        self.spatial_grid.insert(&boid);
        self.boids.push(boid);
        Ok(id)
    }

    // Run one physics step
    pub fn tick(&mut self, delta_time: f32) {
        physics::step(
            &mut self.spatial_grid,
            &mut self.boids,
            delta_time,
            self.params.enable_parallel,
        );
        self.tick += 1;

        let physics_updates_per_frame = self.debug_info.physics_updates_per_frame;
        self.debug_info = DebugInfo {
            tick: self.tick,
            physics_updates_per_frame,
            ..DebugInfo::collect(&self.spatial_grid, &self.boids)
        };
        debug!(
            tick = self.tick,
            occupied_cells = self.debug_info.occupied_cells,
            mean_neighbors = self.debug_info.mean_neighbors,
            mean_speed = self.debug_info.mean_speed,
            "tick complete"
        );
    }

    /// Accumulates `frame_time` and runs as many whole fixed steps as fit.
    /// Returns the number of steps run; the remainder carries over.
    pub fn advance(&mut self, frame_time: Duration) -> usize {
        self.physics_accumulator += frame_time;

        let step_seconds = self.physics_step_size.as_secs_f32();
        let mut physics_updates_this_frame = 0;
        while self.physics_accumulator >= self.physics_step_size {
            self.tick(step_seconds);
            self.physics_accumulator -= self.physics_step_size;
            physics_updates_this_frame += 1;
        }

        self.debug_info.physics_updates_per_frame = physics_updates_this_frame;
        physics_updates_this_frame
    }

    // Re-randomize every boid; ids and grid registration stay as they are
    pub fn reset_boids(&mut self) {
        for boid in &mut self.boids {
            boid.respawn(&self.spatial_grid, &mut self.rng);
        }
        self.physics_accumulator = Duration::ZERO;
        info!(boids = self.boids.len(), "boids reset");
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn physics_step_size(&self) -> Duration {
        self.physics_step_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_boids: usize, seed: u64) -> SimulationParams {
        SimulationParams {
            num_boids,
            seed,
            enable_parallel: false,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn new_spawns_and_registers_the_population() {
        let model = Model::new(params(25, 1)).unwrap();
        assert_eq!(model.boids.len(), 25);
        assert_eq!(model.spatial_grid.boid_count(), 25);
        for (i, boid) in model.boids.iter().enumerate() {
            assert_eq!(boid.id(), BoidId::new(i as u32));
        }
    }

    #[test]
    fn invalid_params_are_refused() {
        let mut bad = params(5, 1);
        bad.fixed_physics_fps = 0.0;
        assert!(matches!(
            Model::new(bad),
            Err(ConfigError::NonPositive { name: "fixed_physics_fps", .. })
        ));
    }

    #[test]
    fn physics_rates_without_a_usable_step_are_refused() {
        for fps in [1e10, 1e-30] {
            let mut bad = params(5, 1);
            bad.fixed_physics_fps = fps;
            assert!(matches!(Model::new(bad), Err(ConfigError::InvalidStepRate(_))));
        }
    }

    #[test]
    fn fast_physics_rate_still_advances() {
        let mut fast = params(2, 1);
        fast.fixed_physics_fps = 1e6;
        let mut model = Model::new(fast).unwrap();

        assert!(!model.physics_step_size().is_zero());
        let steps = model.advance(Duration::from_millis(1));
        assert!((1000..=1001).contains(&steps), "ran {steps} steps");
    }

    #[test]
    fn equal_seeds_give_equal_runs() {
        let mut a = Model::new(params(40, 42)).unwrap();
        let mut b = Model::new(params(40, 42)).unwrap();
        for _ in 0..30 {
            a.tick(1.0 / 60.0);
            b.tick(1.0 / 60.0);
        }
        for (x, y) in a.boids.iter().zip(&b.boids) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.velocity, y.velocity);
        }
    }

    #[test]
    fn different_seeds_give_different_spawns() {
        let a = Model::new(params(5, 1)).unwrap();
        let b = Model::new(params(5, 2)).unwrap();
        assert_ne!(a.boids[0].position, b.boids[0].position);
    }

    #[test]
    fn advance_runs_whole_fixed_steps_and_carries_the_rest() {
        let mut model = Model::new(params(3, 1)).unwrap();
        let step = model.physics_step_size();

        assert_eq!(model.advance(step / 2), 0);
        assert_eq!(model.tick_count(), 0);

        assert_eq!(model.advance(step * 2), 2);
        assert_eq!(model.tick_count(), 2);
        assert_eq!(model.debug_info.physics_updates_per_frame, 2);
        assert_eq!(model.debug_info.tick, 2);
    }

    #[test]
    fn spawned_boids_join_the_next_rebuild() {
        let mut model = Model::new(params(2, 1)).unwrap();
        model.tick(0.0);
        let id = model.spawn_boid().unwrap();
        assert!(model.spatial_grid.neighbors(id).is_empty());

        model.tick(0.0);
        assert_eq!(model.debug_info.boid_count, 3);
        let members: usize = model.spatial_grid.occupied_cells().map(|(_, c)| c.len()).sum();
        assert_eq!(members, 3);
    }

    #[test]
    fn reset_keeps_ids_and_redraws_state() {
        let mut model = Model::new(params(4, 7)).unwrap();
        let before: Vec<_> = model.boids.iter().map(|b| b.position).collect();
        model.reset_boids();

        assert_eq!(model.boids.len(), 4);
        assert_eq!(model.boids[2].id(), BoidId::new(2));
        assert!(model.boids.iter().zip(&before).any(|(b, p)| b.position != *p));
    }
}
