//! # Geodesy module
//!
//! This module converts destination waypoints from world geodetic coordinates into the vehicle's
//! local map frame. The pipeline is geodetic (lat/lon/elevation on the WGS-84 ellipsoid) to ECEF
//! (earth-centred earth-fixed cartesian) to map frame (local planar 2D). Waypoints are treated as
//! pure points, no orientation is carried through the pipeline.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Isometry3, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// WGS-84 semi-major axis in meters
pub const WGS84_SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared
pub const WGS84_ECCENTRICITY_SQ: f64 = 6.694_379_990_14e-3;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// A 3D cartesian point in the earth-centred earth-fixed frame.
pub type EcefVector = Vector3<f64>;

/// A 2D cartesian point in the vehicle's local map frame.
pub type MapFramePoint = Point2<f64>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A geodetic waypoint on the WGS-84 ellipsoid. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Latitude in radians
    pub lat_rad: f64,

    /// Longitude in radians, in the range [0, 2*pi)
    pub lon_rad: f64,

    /// Elevation above the ellipsoid in meters
    pub elev_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GeodeticPoint {
    /// Build a waypoint from the raw degree values of a route definition record.
    ///
    /// Negative angles are shifted by a full turn into [0, 360) before radian conversion. Route
    /// files store westerly longitudes as negative values. Note that the shift is applied to
    /// latitude as well, which matches the behaviour of the route file convention even though
    /// latitudes should lie within +/-90 degrees.
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, elev_m: f64) -> Self {
        Self {
            lat_rad: wrap_negative_degrees(lat_deg).to_radians(),
            lon_rad: wrap_negative_degrees(lon_deg).to_radians(),
            elev_m,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a geodetic waypoint into the ECEF frame.
///
/// Closed-form WGS-84 conversion. The waypoint is a pure point, no orientation is applied.
pub fn geodetic_to_ecef(geodetic: &GeodeticPoint) -> EcefVector {
    let (sin_lat, cos_lat) = geodetic.lat_rad.sin_cos();
    let (sin_lon, cos_lon) = geodetic.lon_rad.sin_cos();

    // Prime vertical radius of curvature at this latitude
    let n = WGS84_SEMI_MAJOR_AXIS_M / (1.0 - WGS84_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + geodetic.elev_m) * cos_lat * cos_lon,
        (n + geodetic.elev_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_ECCENTRICITY_SQ) + geodetic.elev_m) * sin_lat,
    )
}

/// Project an ECEF point into the local map frame.
///
/// Computes `inverse(map_in_earth) * point_in_earth` and discards the z component, returning the
/// planar (x, y) projection required by the road-network geometry.
pub fn ecef_to_map_frame(ecef: &EcefVector, map_in_earth: &Isometry3<f64>) -> MapFramePoint {
    let point_in_map = map_in_earth.inverse_transform_point(&Point3::from(*ecef));
    MapFramePoint::new(point_in_map.x, point_in_map.y)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Shift a negative angle in degrees by a full turn into [0, 360).
fn wrap_negative_degrees(deg: f64) -> f64 {
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Translation3;

    #[test]
    fn test_negative_angles_wrap_by_a_full_turn() {
        let point = GeodeticPoint::from_degrees(-10.0, 5.0, 0.0);
        assert!((point.lon_rad - 350.0_f64.to_radians()).abs() < 1e-12);
        assert!((point.lat_rad - 5.0_f64.to_radians()).abs() < 1e-12);

        let point = GeodeticPoint::from_degrees(10.0, -5.0, 0.0);
        assert!((point.lon_rad - 10.0_f64.to_radians()).abs() < 1e-12);
        // Latitude gets the same wrap as longitude
        assert!((point.lat_rad - 355.0_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_ecef_at_reference_points() {
        // Equator / prime meridian sits on the +x axis at one semi-major axis
        let origin = geodetic_to_ecef(&GeodeticPoint::from_degrees(0.0, 0.0, 0.0));
        assert!((origin.x - WGS84_SEMI_MAJOR_AXIS_M).abs() < 1e-6);
        assert!(origin.y.abs() < 1e-6);
        assert!(origin.z.abs() < 1e-6);

        // Elevation extends along the radial direction
        let raised = geodetic_to_ecef(&GeodeticPoint::from_degrees(0.0, 0.0, 100.0));
        assert!((raised.x - origin.x - 100.0).abs() < 1e-6);

        // 90 degrees east sits on the +y axis
        let east = geodetic_to_ecef(&GeodeticPoint::from_degrees(90.0, 0.0, 0.0));
        assert!(east.x.abs() < 1e-6);
        assert!((east.y - WGS84_SEMI_MAJOR_AXIS_M).abs() < 1e-6);
    }

    #[test]
    fn test_map_frame_projection_drops_z() {
        let map_in_earth = Isometry3::from_parts(
            Translation3::new(100.0, -50.0, 25.0),
            nalgebra::UnitQuaternion::identity(),
        );

        let point = ecef_to_map_frame(&Vector3::new(103.0, -46.0, 30.0), &map_in_earth);
        assert!((point.x - 3.0).abs() < 1e-9);
        assert!((point.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_preserves_count_and_order() {
        let map_in_earth = Isometry3::identity();
        let geodetics = vec![
            GeodeticPoint::from_degrees(0.0, 0.0, 0.0),
            GeodeticPoint::from_degrees(0.0005, 0.0, 0.0),
            GeodeticPoint::from_degrees(0.0010, 0.0, 0.0),
        ];

        let map_points: Vec<MapFramePoint> = geodetics
            .iter()
            .map(geodetic_to_ecef)
            .map(|p| ecef_to_map_frame(&p, &map_in_earth))
            .collect();

        assert_eq!(map_points.len(), geodetics.len());
        // Increasing longitude moves east, i.e. along +y of the ECEF frame
        assert!(map_points[0].y < map_points[1].y);
        assert!(map_points[1].y < map_points[2].y);
    }
}
