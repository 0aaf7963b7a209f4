//! Core data models for waypoint capture.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A target pose for the quadcopter, one row of a route file.
///
/// Angles are Euler angles in radians, world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(rename = "ALFA")]
    pub alfa: f64,
    #[serde(rename = "BETA")]
    pub beta: f64,
    #[serde(rename = "GAMA")]
    pub gama: f64,
}

impl Waypoint {
    pub fn from_pose(position: Vector3<f64>, orientation: Vector3<f64>) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            alfa: orientation.x,
            beta: orientation.y,
            gama: orientation.z,
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn orientation(&self) -> Vector3<f64> {
        Vector3::new(self.alfa, self.beta, self.gama)
    }
}

/// Opaque handle to an object in the simulator scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub i64);

impl ObjectHandle {
    /// Reference frame handle for world coordinates (`sim.handle_world`).
    pub const WORLD: ObjectHandle = ObjectHandle(-1);
}

/// Raw frame read from a vision sensor.
///
/// Rows arrive bottom-up, three bytes (RGB) per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl SensorImage {
    /// Number of bytes a well-formed frame of this resolution holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}
