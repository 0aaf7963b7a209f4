//! Quadcopter waypoint capture: route model, route files, settings and the
//! convergence loop that drives a simulated quadcopter through a remote
//! simulator.

pub mod control;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod models;
pub mod route;
pub mod route_file;
pub mod settings;
pub mod sim_api;

pub use control::{fly_to, orientation_within, settle, ControlConfig, QuadcopterRig};
pub use models::{ObjectHandle, SensorImage, Waypoint};
pub use route::{build_route, yaw_from_direction, RouteError};
pub use route_file::{read_route, read_route_from, write_route, write_route_to, RouteFileError, ROUTE_HEADER};
pub use settings::{load_mapping, CaptureSettings, SettingsError};
pub use sim_api::{resolve_handles, SimError, SimulatorApi};
