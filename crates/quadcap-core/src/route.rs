//! Route generation from planar headings.
//!
//! A route is a list of points, each paired with the direction the camera
//! should face. Directions become a yaw angle measured against a base
//! vector; roll and pitch stay level.

use nalgebra::{Vector2, Vector3};
use thiserror::Error;

use crate::models::Waypoint;

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("direction {index} has zero length")]
    DegenerateDirection { index: usize },
    #[error("base vector has zero length")]
    DegenerateBase,
    #[error("{points} points but {directions} directions")]
    LengthMismatch { points: usize, directions: usize },
}

/// Signed angle in radians that rotates `base` onto `direction`.
///
/// The magnitude comes from the dot product, the sign from comparing the y
/// components: directions below the base turn negative. For the default
/// base `(1, 0)` this is the usual yaw, so `(0, 1)` gives `π/2` and `(0, -1)`
/// gives `-π/2`.
pub fn yaw_from_direction(direction: Vector2<f64>, base: Vector2<f64>) -> Result<f64, RouteError> {
    let base_norm = base.norm();
    if base_norm == 0.0 {
        return Err(RouteError::DegenerateBase);
    }
    let dir_norm = direction.norm();
    if dir_norm == 0.0 {
        return Err(RouteError::DegenerateDirection { index: 0 });
    }

    // Rounding can push the cosine a hair outside [-1, 1].
    let cos_theta = (direction.dot(&base) / dir_norm / base_norm).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();

    if direction.y < base.y {
        Ok(-theta)
    } else {
        Ok(theta)
    }
}

/// Pair each point with its direction and turn the pair into a waypoint.
///
/// Positions are shifted by `offset`; only the first two components of each
/// direction are used.
pub fn build_route(
    points: &[Vector3<f64>],
    directions: &[Vector2<f64>],
    offset: Vector3<f64>,
    base: Vector2<f64>,
) -> Result<Vec<Waypoint>, RouteError> {
    if points.len() != directions.len() {
        return Err(RouteError::LengthMismatch {
            points: points.len(),
            directions: directions.len(),
        });
    }

    points
        .iter()
        .zip(directions)
        .enumerate()
        .map(|(index, (point, direction))| {
            let yaw = yaw_from_direction(*direction, base).map_err(|e| match e {
                RouteError::DegenerateDirection { .. } => RouteError::DegenerateDirection { index },
                other => other,
            })?;
            Ok(Waypoint::from_pose(point + offset, Vector3::new(0.0, 0.0, yaw)))
        })
        .collect()
}
