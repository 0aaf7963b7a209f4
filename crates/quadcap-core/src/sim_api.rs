//! Interface to the remote simulator.
//!
//! Everything the capture loop needs from the simulator goes through
//! [`SimulatorApi`]. Poses are always read and written in the world frame.

use std::collections::HashMap;

use nalgebra::Vector3;
use thiserror::Error;

use crate::models::{ObjectHandle, SensorImage};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("{func} failed: {message}")]
    Remote { func: String, message: String },
    #[error("unexpected reply to {func}: {detail}")]
    UnexpectedReply { func: String, detail: String },
    #[error("pose did not settle within {steps} simulation steps")]
    NotConverged { steps: u64 },
}

/// Remote object space of a stepped simulation.
pub trait SimulatorApi {
    fn start_simulation(&mut self) -> Result<(), SimError>;

    fn stop_simulation(&mut self) -> Result<(), SimError>;

    /// In stepping mode the simulation only advances on [`SimulatorApi::step`].
    fn set_stepping(&mut self, enabled: bool) -> Result<(), SimError>;

    /// Advance the simulation by one step.
    fn step(&mut self) -> Result<(), SimError>;

    /// Look up an object by its scene path, e.g. `/Quadcopter/base`.
    fn object_handle(&mut self, name: &str) -> Result<ObjectHandle, SimError>;

    fn object_position(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError>;

    fn object_orientation(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError>;

    fn set_object_position(&mut self, handle: ObjectHandle, position: &Vector3<f64>) -> Result<(), SimError>;

    fn set_object_orientation(&mut self, handle: ObjectHandle, orientation: &Vector3<f64>) -> Result<(), SimError>;

    fn vision_sensor_image(&mut self, handle: ObjectHandle) -> Result<SensorImage, SimError>;
}

/// Resolve each distinct name to a handle, asking the simulator once per name.
pub fn resolve_handles<S, I>(sim: &mut S, names: I) -> Result<HashMap<String, ObjectHandle>, SimError>
where
    S: SimulatorApi + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut handles = HashMap::new();
    for name in names {
        let name = name.as_ref();
        if !handles.contains_key(name) {
            let handle = sim.object_handle(name)?;
            handles.insert(name.to_string(), handle);
        }
    }
    Ok(handles)
}
