/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three main rules:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * On top of the rules, a boid outside the buffered grid bounds is pushed back
 * toward the grid center, and its position is hard-clamped into the grid.
 * Neighbor state always comes from the spatial grid's start-of-tick snapshot.
 */

use glam::{UVec3, Vec3};
use rand::Rng;

use crate::params::{AlignmentAveraging, BoidParams};
use crate::spatial_grid::{BoidSnapshot, SpatialGrid};
use crate::SPAWN_OFFSET;

/// Stable arena index of a boid, assigned at creation and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoidId(u32);

impl BoidId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Boid {
    id: BoidId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit facing direction; follows velocity while the boid is moving.
    pub heading: Vec3,
    /// Cell key from the last grid rebuild.
    pub grid_index: UVec3,
    pub params: BoidParams,
}

impl Boid {
    pub fn new(id: BoidId, position: Vec3, velocity: Vec3, params: BoidParams) -> Self {
        Self {
            id,
            position,
            velocity,
            heading: velocity.normalize_or_zero(),
            grid_index: UVec3::ZERO,
            params,
        }
    }

    // Random state near the grid center, velocity uniform per axis within max speed
    pub fn spawn<R: Rng + ?Sized>(
        id: BoidId,
        grid: &SpatialGrid,
        params: &BoidParams,
        rng: &mut R,
    ) -> Self {
        let (position, velocity) = random_state(grid, params.max_speed, rng);
        Self::new(id, position, velocity, params.clone())
    }

    // Draw a fresh spawn state, keeping id and parameters
    pub fn respawn<R: Rng + ?Sized>(&mut self, grid: &SpatialGrid, rng: &mut R) {
        let (position, velocity) = random_state(grid, self.params.max_speed, rng);
        self.position = position;
        self.velocity = velocity;
        self.heading = velocity.normalize_or_zero();
    }

    pub fn id(&self) -> BoidId {
        self.id
    }

    /// Advances this boid by one tick. The grid must have been rebuilt for
    /// the current tick.
    pub fn update(&mut self, grid: &SpatialGrid, delta_time: f32) {
        // Correct steering if the boid is outside the buffered bounds
        if !grid.is_in_bounds(self.position, self.params.edge_buffer) {
            let toward_center = (grid.grid_center() - self.position).normalize_or_zero();
            self.velocity += toward_center * self.params.boundary_repulsion;
        }

        let steering = self.steering(grid.neighbor_snapshots(self.id));
        self.apply_steering(steering);

        self.position += self.velocity * delta_time;

        // Face along the direction of travel
        if self.position != Vec3::ZERO && self.velocity != Vec3::ZERO {
            self.heading = self.velocity.normalize_or_zero();
        }

        // Clamp inside grid bounds
        self.position = self.position.clamp(Vec3::ZERO, grid.grid_bounds());
    }

    // Acceleration from the steering force, then limit speed
    pub fn apply_steering(&mut self, steering: Vec3) {
        let acceleration = steering / self.params.mass;
        self.velocity = (self.velocity + acceleration).clamp_length_max(self.params.max_speed);
    }

    /// Weighted sum of the three rules over one neighbor set, limited to
    /// `max_force`.
    pub fn steering<'a, I>(&self, neighbors: I) -> Vec3
    where
        I: ExactSizeIterator<Item = &'a BoidSnapshot> + Clone,
    {
        let steering = self.cohesion(neighbors.clone()) * self.params.cohesion_weight
            + self.separation(neighbors.clone()) * self.params.separation_weight
            + self.alignment(neighbors) * self.params.alignment_weight;
        steering.clamp_length_max(self.params.max_force)
    }

    /// Sum of offsets away from neighbors whose squared distance is below
    /// `separation_radius`, divided by the total neighbor count.
    pub fn separation<'a>(&self, neighbors: impl ExactSizeIterator<Item = &'a BoidSnapshot>) -> Vec3 {
        let count = neighbors.len();
        if count == 0 {
            return Vec3::ZERO;
        }

        let mut separation = Vec3::ZERO;
        for other in neighbors {
            if other.position.distance_squared(self.position) < self.params.separation_radius {
                separation += self.position - other.position;
            }
        }
        separation / count as f32
    }

    /// Neighbor velocity average; exactly-zero velocities are skipped.
    pub fn alignment<'a>(&self, neighbors: impl ExactSizeIterator<Item = &'a BoidSnapshot>) -> Vec3 {
        let count = neighbors.len();
        if count == 0 {
            return Vec3::ZERO;
        }
        let count = count as f32;

        let mut alignment = Vec3::ZERO;
        match self.params.alignment_averaging {
            AlignmentAveraging::Mean => {
                for other in neighbors {
                    if other.velocity != Vec3::ZERO {
                        alignment += other.velocity;
                    }
                }
                alignment / count
            }
            AlignmentAveraging::Compounding => {
                for other in neighbors {
                    if other.velocity != Vec3::ZERO {
                        alignment += other.velocity;
                    }
                    alignment /= count;
                }
                alignment
            }
        }
    }

    // Offset from this boid to the neighbors' average position
    pub fn cohesion<'a>(&self, neighbors: impl ExactSizeIterator<Item = &'a BoidSnapshot>) -> Vec3 {
        let count = neighbors.len();
        if count == 0 {
            return Vec3::ZERO;
        }

        let sum: Vec3 = neighbors.map(|other| other.position).sum();
        sum / count as f32 - self.position
    }
}

fn random_state<R: Rng + ?Sized>(grid: &SpatialGrid, max_speed: f32, rng: &mut R) -> (Vec3, Vec3) {
    let offset = Vec3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()) * SPAWN_OFFSET;
    let position = grid.grid_center() + offset;

    let velocity = Vec3::new(
        rng.gen_range(-max_speed..=max_speed),
        rng.gen_range(-max_speed..=max_speed),
        rng.gen_range(-max_speed..=max_speed),
    );
    (position, velocity)
}
