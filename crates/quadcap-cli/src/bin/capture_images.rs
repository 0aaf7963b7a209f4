//! CLI tool to capture images along a route in the simulator.
//!
//! Starts the simulation in stepping mode, flies the quadcopter to every
//! waypoint of the route file and saves a vision sensor frame at each one.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quadcap_cli::{init_tracing, CaptureSession};
use quadcap_core::{CaptureSettings, SettingsError};
use quadcap_sim::init_simulation;

/// Fly a route in the simulator and save one camera frame per waypoint
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output folder, overrides `path` from the settings
    #[arg(requires = "file")]
    folder: Option<PathBuf>,

    /// Route file, overrides `positions file name` from the settings
    file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let mut settings = match CaptureSettings::from_yaml_file(&args.config) {
        Ok(settings) => settings,
        Err(e @ SettingsError::NotFound(_)) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load settings"),
    };

    if let (Some(folder), Some(file)) = (args.folder, args.file) {
        settings.apply_overrides(folder, file);
    }

    let mut sim = init_simulation(&settings.host, settings.port)
        .context("Failed to start the simulation")?;

    let session = CaptureSession::new(settings);
    match session.run(&mut sim) {
        Ok(report) => {
            println!(
                "Adjust the sequence to the maximum of {} images ({})",
                report.images,
                report.output_dir.display()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}
