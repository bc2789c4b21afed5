//! Coordinate transformations between heliographic, HEEQ, and local frames
//!
//! The extrapolation works in a "local" planar frame centered on the
//! magnetogram's pointing center: z along the outward radial direction,
//! x toward solar west (increasing longitude), y toward solar north.
//! HEEQ (Heliocentric Earth Equatorial) is the shared Cartesian world frame:
//! Z along the solar rotation axis, X toward the intersection of the solar
//! equator and the central meridian.

use nalgebra::{Matrix3, Vector3};

/// Solar radius in centimeters
pub const SOLAR_RADIUS_CM: f64 = 6.957e10;

/// Heliographic (Stonyhurst) spherical coordinate.
///
/// Longitude and latitude are stored in radians; the radial distance from
/// Sun center in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heliographic {
    /// Longitude in radians, zero at the central meridian, positive west
    pub lon: f64,
    /// Latitude in radians, zero at the equator, positive north
    pub lat: f64,
    /// Distance from Sun center in centimeters
    pub radius: f64,
}

impl Heliographic {
    /// Create a coordinate from longitude/latitude in degrees and radius in cm
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, radius_cm: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
            radius: radius_cm,
        }
    }

    /// Create a coordinate on the solar surface from degrees
    pub fn on_surface(lon_deg: f64, lat_deg: f64) -> Self {
        Self::from_degrees(lon_deg, lat_deg, SOLAR_RADIUS_CM)
    }

    /// Longitude in degrees
    pub fn lon_degrees(&self) -> f64 {
        self.lon.to_degrees()
    }

    /// Latitude in degrees
    pub fn lat_degrees(&self) -> f64 {
        self.lat.to_degrees()
    }
}

/// Convert a heliographic coordinate to HEEQ Cartesian (centimeters)
pub fn heliographic_to_heeq(coord: &Heliographic) -> Vector3<f64> {
    let cos_lat = coord.lat.cos();
    Vector3::new(
        coord.radius * cos_lat * coord.lon.cos(),
        coord.radius * cos_lat * coord.lon.sin(),
        coord.radius * coord.lat.sin(),
    )
}

/// Orthonormal basis of the local frame at `center`, as columns in HEEQ.
///
/// Column 0 is local x (solar west), column 1 local y (solar north),
/// column 2 local z (outward radial). Built the same way a camera frame is
/// assembled from a pointing direction: radial axis first, the tangent-plane
/// axes completing the right-handed system.
pub fn local_frame(center: &Heliographic) -> Matrix3<f64> {
    let cos_lon = center.lon.cos();
    let sin_lon = center.lon.sin();
    let cos_lat = center.lat.cos();
    let sin_lat = center.lat.sin();

    // Radial direction at the center (local z)
    let radial = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
    // Direction of increasing longitude (local x)
    let west = Vector3::new(-sin_lon, cos_lon, 0.0);
    // Direction of increasing latitude (local y)
    let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);

    Matrix3::from_columns(&[west, north, radial])
}

/// Transform an HEEQ point into the local frame at `center`.
///
/// The local origin sits on the radial line through `center` at its radius,
/// so a point at `center` itself maps to (0, 0, 0).
pub fn heeq_to_local(point: &Vector3<f64>, center: &Heliographic) -> Vector3<f64> {
    let frame = local_frame(center);
    let rotated = frame.transpose() * point;
    Vector3::new(rotated.x, rotated.y, rotated.z - center.radius)
}

/// Transform a local-frame point back into HEEQ. Exact inverse of
/// [`heeq_to_local`].
pub fn local_to_heeq(point: &Vector3<f64>, center: &Heliographic) -> Vector3<f64> {
    let frame = local_frame(center);
    frame * Vector3::new(point.x, point.y, point.z + center.radius)
}
