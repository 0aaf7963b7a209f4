//! CLI tool to turn a YAML route plan into a CSV route file.
//!
//! Each planned point is paired with a viewing direction, which becomes the
//! waypoint's yaw.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quadcap_cli::{init_tracing, RoutePlan};
use quadcap_core::write_route;

/// Convert a route plan (points + directions) into a route file
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML route plan
    #[arg(long)]
    plan: PathBuf,

    /// CSV route file to write
    #[arg(long, default_value = "route.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let plan = RoutePlan::from_yaml_file(&args.plan)?;
    let route = plan.waypoints()?;

    write_route(&args.output, &route)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Wrote {} waypoints to {}", route.len(), args.output.display());
    Ok(())
}
