/*
 * Error Module
 *
 * Configuration errors for the flocking core. A bad grid or parameter set
 * is refused at construction time; nothing downstream has to cope with
 * degenerate cell geometry.
 */

use glam::{UVec3, Vec3};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A grid axis has no cells.
    #[error("grid subdivisions must be positive on every axis, got {0}")]
    ZeroSubdivisions(UVec3),
    /// A grid axis has zero, negative or non-finite extent.
    #[error("grid bounds must be positive and finite on every axis, got {0}")]
    InvalidBounds(Vec3),
    #[error("grid scale must be at least 1")]
    ZeroScale,
    #[error("neighbor search distance must be at least one cell")]
    ZeroSearchDistance,
    /// Scaling the base subdivisions by this factor overflows.
    #[error("grid scale {0} is too large")]
    ScaleTooLarge(u32),
    #[error("grid subdivisions {0} exceed the limit of {max} cells", max = crate::MAX_GRID_CELLS)]
    TooManyCells(UVec3),
    /// The rate gives a zero or unrepresentable fixed step duration.
    #[error("fixed_physics_fps {0} does not give a usable step duration")]
    InvalidStepRate(f32),
    #[error("{0} boids do not fit the boid id space")]
    TooManyBoids(usize),
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("failed to parse simulation parameters: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation parameters: {0}")]
    Io(#[from] std::io::Error),
}

// Require a finite, strictly positive value
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

// Require a finite value that is zero or greater
pub(crate) fn ensure_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_and_nan() {
        assert!(ensure_positive("mass", 1.0).is_ok());
        assert!(matches!(
            ensure_positive("mass", 0.0),
            Err(ConfigError::NonPositive { name: "mass", .. })
        ));
        assert!(ensure_positive("mass", f32::NAN).is_err());
    }

    #[test]
    fn non_negative_check_accepts_zero() {
        assert!(ensure_non_negative("edge_buffer", 0.0).is_ok());
        assert!(ensure_non_negative("edge_buffer", -0.5).is_err());
        assert!(ensure_non_negative("edge_buffer", f32::INFINITY).is_err());
    }

    #[test]
    fn cell_limit_is_part_of_the_message() {
        let err = ConfigError::TooManyCells(UVec3::splat(1000));
        assert!(err.to_string().contains(&crate::MAX_GRID_CELLS.to_string()));
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ConfigError::NonPositive { name: "max_speed", value: -2.0 };
        assert_eq!(err.to_string(), "max_speed must be positive and finite, got -2");
    }
}
