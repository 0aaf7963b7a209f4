//! Route plans: the YAML input of `convert_route`.
//!
//! ```yaml
//! offset: [0.0, 0.0, 1.2]
//! base: [1.0, 0.0]
//! points:
//!   - [0.0, 0.0, 0.0]
//!   - [1.0, 0.0, 0.0]
//! directions:
//!   - [1.0, 0.0]
//!   - [0.0, 1.0, 0.0]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use nalgebra::{Vector2, Vector3};
use quadcap_core::{build_route, Waypoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Added to every point
    #[serde(default)]
    pub offset: [f64; 3],
    /// Direction that maps to zero yaw
    #[serde(default = "default_base")]
    pub base: [f64; 2],
    pub points: Vec<[f64; 3]>,
    /// Viewing direction per point; extra components are ignored
    pub directions: Vec<Vec<f64>>,
}

fn default_base() -> [f64; 2] {
    [1.0, 0.0]
}

impl RoutePlan {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read route plan {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Invalid route plan")
    }

    /// Convert the plan into waypoints.
    pub fn waypoints(&self) -> Result<Vec<Waypoint>> {
        let points: Vec<Vector3<f64>> = self.points.iter().map(|p| Vector3::from(*p)).collect();

        let mut directions = Vec::with_capacity(self.directions.len());
        for (idx, d) in self.directions.iter().enumerate() {
            if d.len() < 2 {
                bail!("Direction {idx} needs at least two components, got {}", d.len());
            }
            directions.push(Vector2::new(d[0], d[1]));
        }

        let route = build_route(
            &points,
            &directions,
            Vector3::from(self.offset),
            Vector2::from(self.base),
        )?;
        Ok(route)
    }
}
