//! In-memory simulator for tests.
//!
//! The base follows the target with a first-order lag: every step closes
//! `gain` of the remaining gap.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::models::{ObjectHandle, SensorImage};
use crate::sim_api::{SimError, SimulatorApi};

pub const TARGET: ObjectHandle = ObjectHandle(1);
pub const BASE: ObjectHandle = ObjectHandle(2);
pub const SENSOR: ObjectHandle = ObjectHandle(3);

#[derive(Debug)]
pub struct FakeSimulator {
    pub gain: f64,
    /// Report base orientation wrapped into [-π, π)
    pub wrap_angles: bool,
    pub target_pos: Vector3<f64>,
    pub target_ori: Vector3<f64>,
    pub base_pos: Vector3<f64>,
    pub base_ori: Vector3<f64>,
    pub steps: u64,
    pub running: bool,
    pub stepping: bool,
    pub stop_calls: u32,
    pub lookups: Vec<String>,
    /// Every position commanded to the target
    pub commanded: Vec<Vector3<f64>>,
    /// Fail the nth step (1-based)
    pub fail_at_step: Option<u64>,
    pub image: SensorImage,
    names: HashMap<String, ObjectHandle>,
}

impl FakeSimulator {
    pub fn new() -> Self {
        let names = [
            ("/target", TARGET),
            ("/Quadcopter/base", BASE),
            ("/Quadcopter/Vision_sensor", SENSOR),
        ]
        .into_iter()
        .map(|(name, handle)| (name.to_string(), handle))
        .collect();

        Self {
            gain: 0.5,
            wrap_angles: false,
            target_pos: Vector3::zeros(),
            target_ori: Vector3::zeros(),
            base_pos: Vector3::zeros(),
            base_ori: Vector3::zeros(),
            steps: 0,
            running: false,
            stepping: false,
            stop_calls: 0,
            lookups: Vec::new(),
            commanded: Vec::new(),
            fail_at_step: None,
            // 2x2 frame, bottom row red, top row blue
            image: SensorImage {
                width: 2,
                height: 2,
                rgb: vec![255, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 255],
            },
            names,
        }
    }

    /// Place both target and base at a pose.
    pub fn with_pose(mut self, position: Vector3<f64>, orientation: Vector3<f64>) -> Self {
        self.target_pos = position;
        self.base_pos = position;
        self.target_ori = orientation;
        self.base_ori = orientation;
        self
    }
}

impl Default for FakeSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

impl SimulatorApi for FakeSimulator {
    fn start_simulation(&mut self) -> Result<(), SimError> {
        self.running = true;
        Ok(())
    }

    fn stop_simulation(&mut self) -> Result<(), SimError> {
        self.running = false;
        self.stop_calls += 1;
        Ok(())
    }

    fn set_stepping(&mut self, enabled: bool) -> Result<(), SimError> {
        self.stepping = enabled;
        Ok(())
    }

    fn step(&mut self) -> Result<(), SimError> {
        self.steps += 1;
        if self.fail_at_step == Some(self.steps) {
            return Err(SimError::Transport("connection reset".to_string()));
        }
        self.base_pos += (self.target_pos - self.base_pos) * self.gain;
        self.base_ori += (self.target_ori - self.base_ori) * self.gain;
        Ok(())
    }

    fn object_handle(&mut self, name: &str) -> Result<ObjectHandle, SimError> {
        self.lookups.push(name.to_string());
        self.names.get(name).copied().ok_or_else(|| SimError::Remote {
            func: "sim.getObject".to_string(),
            message: format!("object does not exist: {name}"),
        })
    }

    fn object_position(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError> {
        match handle {
            TARGET => Ok(self.target_pos),
            BASE => Ok(self.base_pos),
            _ => Ok(Vector3::zeros()),
        }
    }

    fn object_orientation(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError> {
        let ori = match handle {
            TARGET => self.target_ori,
            BASE => self.base_ori,
            _ => Vector3::zeros(),
        };
        if self.wrap_angles {
            Ok(ori.map(wrap))
        } else {
            Ok(ori)
        }
    }

    fn set_object_position(&mut self, handle: ObjectHandle, position: &Vector3<f64>) -> Result<(), SimError> {
        if handle == TARGET {
            self.target_pos = *position;
            self.commanded.push(*position);
        }
        Ok(())
    }

    fn set_object_orientation(&mut self, handle: ObjectHandle, orientation: &Vector3<f64>) -> Result<(), SimError> {
        if handle == TARGET {
            self.target_ori = *orientation;
        }
        Ok(())
    }

    fn vision_sensor_image(&mut self, _handle: ObjectHandle) -> Result<SensorImage, SimError> {
        Ok(self.image.clone())
    }
}
