//! Fly a route in the simulator and capture one frame per waypoint.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use quadcap_core::{
    fly_to, read_route, resolve_handles, CaptureSettings, QuadcopterRig, SimulatorApi,
};
use tracing::{info, warn};

use crate::frames::{frame_format, frame_path, save_frame};

/// Outcome of a finished capture run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Number of frames written
    pub images: usize,
    pub output_dir: PathBuf,
}

/// One capture run over the route named in the settings.
pub struct CaptureSession {
    settings: CaptureSettings,
}

impl CaptureSession {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Run the capture and stop the simulation afterwards, also on failure.
    pub fn run<S: SimulatorApi + ?Sized>(&self, sim: &mut S) -> Result<CaptureReport> {
        match self.capture(sim) {
            Ok(report) => {
                sim.stop_simulation().context("Failed to stop simulation")?;
                Ok(report)
            }
            Err(err) => {
                if let Err(stop_err) = sim.stop_simulation() {
                    warn!("Failed to stop simulation after error: {}", stop_err);
                }
                Err(err)
            }
        }
    }

    fn capture<S: SimulatorApi + ?Sized>(&self, sim: &mut S) -> Result<CaptureReport> {
        let s = &self.settings;

        // Nothing moves until the output format and sensor are known.
        frame_format(&s.extension)?;
        let sensor_name = s
            .vision_sensor_name()
            .context("No vision sensor configured under `vision sensor names`")?;

        let handles = resolve_handles(
            sim,
            [s.quadcopter_name.as_str(), sensor_name, s.quadcopter_base.as_str()],
        )
        .context("Failed to look up scene objects")?;
        let rig = QuadcopterRig {
            target: handles[s.quadcopter_name.as_str()],
            base: handles[s.quadcopter_base.as_str()],
        };
        let sensor = handles[sensor_name];

        let route = read_route(&s.positions_file, s.min_altitude).with_context(|| {
            format!(
                "Position csv file {} could not be loaded. Adjust the settings file.",
                s.positions_file.display()
            )
        })?;

        fs::create_dir_all(&s.path)
            .with_context(|| format!("Failed to create output directory {}", s.path.display()))?;

        let total = route.len();
        info!(waypoints = total, output = %s.path.display(), "Starting capture");

        for (idx, waypoint) in route.iter().enumerate() {
            fly_to(sim, rig, &s.control, &waypoint.position(), &waypoint.orientation())
                .with_context(|| format!("Failed to reach waypoint {idx}"))?;

            let frame = sim
                .vision_sensor_image(sensor)
                .with_context(|| format!("Failed to read vision sensor at waypoint {idx}"))?;
            let path = frame_path(&s.path, &s.image_prefix, idx, &s.extension);
            save_frame(&frame, &path)?;

            info!("[{}/{}] capture photo", idx + 1, total);
        }

        Ok(CaptureReport {
            images: total,
            output_dir: s.path.clone(),
        })
    }
}
