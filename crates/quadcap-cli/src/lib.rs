//! Quadcap CLI - command line tools for simulated quadcopter capture.
//!
//! This crate provides the binaries:
//! - convert_route: turn a YAML route plan into a CSV route file
//! - capture_images: fly a route in the simulator and save a frame per waypoint

pub mod capture;
pub mod frames;
pub mod route_plan;

pub use capture::{CaptureReport, CaptureSession};
pub use frames::{frame_format, frame_path, save_frame};
pub use route_plan::RoutePlan;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or empty.
pub const DEFAULT_LOG_FILTER: &str = "quadcap_cli=info,quadcap_core=info";

/// Log filter from a `RUST_LOG` value, falling back to [`DEFAULT_LOG_FILTER`].
///
/// A given value is used as is, so it can raise or lower any crate.
pub fn log_filter(rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::try_new(DEFAULT_LOG_FILTER)?),
    }
}

/// Install the tracing subscriber used by the binaries.
pub fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(log_filter(rust_log.as_deref())?)
        .init();
    Ok(())
}
