//! CSV route files.
//!
//! One waypoint per row under a fixed header:
//!
//! ```text
//! X,Y,Z,ALFA,BETA,GAMA
//! 0.5,1.0,1.2,0,0,1.5707963267948966
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Waypoint;

/// Column names of a route file, in order.
pub const ROUTE_HEADER: [&str; 6] = ["X", "Y", "Z", "ALFA", "BETA", "GAMA"];

#[derive(Debug, Error)]
pub enum RouteFileError {
    #[error("route file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unexpected route header {found:?}, expected X,Y,Z,ALFA,BETA,GAMA")]
    Header { found: Vec<String> },
    #[error("route row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `route` to `path`, replacing any existing file.
pub fn write_route(path: impl AsRef<Path>, route: &[Waypoint]) -> Result<(), RouteFileError> {
    let file = File::create(path.as_ref())?;
    write_route_to(file, route)?;
    debug!(path = %path.as_ref().display(), rows = route.len(), "Route written");
    Ok(())
}

/// Write the header and one row per waypoint.
///
/// The header is written even for an empty route.
pub fn write_route_to<W: Write>(writer: W, route: &[Waypoint]) -> Result<(), RouteFileError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(ROUTE_HEADER)?;
    for waypoint in route {
        csv_writer.serialize(waypoint)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read a route file, raising any Z below `min_altitude` to `min_altitude`.
pub fn read_route(path: impl AsRef<Path>, min_altitude: f64) -> Result<Vec<Waypoint>, RouteFileError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RouteFileError::NotFound(path.to_path_buf()));
    }
    read_route_from(File::open(path)?, min_altitude)
}

/// Parse route rows from any reader. Row numbers in errors are 1-based and
/// do not count the header.
pub fn read_route_from<R: Read>(reader: R, min_altitude: f64) -> Result<Vec<Waypoint>, RouteFileError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?;
    if headers.iter().ne(ROUTE_HEADER.iter().copied()) {
        return Err(RouteFileError::Header {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut route = Vec::new();
    for (idx, record) in csv_reader.deserialize::<Waypoint>().enumerate() {
        let mut waypoint = record.map_err(|source| RouteFileError::Row { row: idx + 1, source })?;
        if waypoint.z < min_altitude {
            warn!(row = idx + 1, z = waypoint.z, min_altitude, "Raising waypoint to minimum altitude");
            waypoint.z = min_altitude;
        }
        route.push(waypoint);
    }

    Ok(route)
}
