//! # Route definition files
//!
//! A route definition is a headerless CSV file named `<route_id>.csv` inside the route file
//! directory. Each record is one destination waypoint as `longitude_deg, latitude_deg,
//! elevation_m`, in visiting order: the first record is the start, the last is the end, and any
//! records between are via points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::geodesy::GeodeticPoint;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while reading a route definition file.
#[derive(Debug, Error)]
pub enum RouteFileError {
    #[error("Cannot open route file {0:?}: {1}")]
    FileOpen(PathBuf, csv::Error),

    /// A single malformed record fails the whole file, there are no partial routes.
    #[error("Route file contains a malformed record: {0}")]
    MalformedRecord(csv::Error),

    #[error("Route file contains {0} point(s), at least a start and an end are required")]
    TooFewPoints(usize),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load the destination waypoints of the named route, in file order.
pub fn load_route_destinations(
    route_dir: &Path,
    route_id: &str,
) -> Result<Vec<GeodeticPoint>, RouteFileError> {
    let path = route_dir.join(format!("{}.csv", route_id));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| RouteFileError::FileOpen(path.clone(), e))?;

    let mut destinations = Vec::new();
    for record in reader.deserialize() {
        let (lon_deg, lat_deg, elev_m): (f64, f64, f64) =
            record.map_err(RouteFileError::MalformedRecord)?;
        destinations.push(GeodeticPoint::from_degrees(lon_deg, lat_deg, elev_m));
    }

    // A route needs at least a start and an end
    if destinations.len() < 2 {
        return Err(RouteFileError::TooFewPoints(destinations.len()));
    }

    Ok(destinations)
}

/// List the identifiers of all route definitions in the given directory.
///
/// A missing directory simply lists as empty. Identifiers are the `.csv` file stems, sorted for a
/// stable catalog order.
pub fn available_routes(route_dir: &Path) -> Result<Vec<String>, std::io::Error> {
    if !route_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(route_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|ext| ext == "csv").unwrap_or(false) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
