//! Line-of-sight magnetogram input type
//!
//! A magnetogram is a 2D map of the line-of-sight magnetic field strength
//! together with the observer geometry needed to place it in space: the
//! pointing center, the observer position, and the world coordinates of the
//! field-of-view corners. It is the immutable input to the extrapolation
//! and is validated once at construction.

use ndarray::Array2;
use thiserror::Error;

use crate::coords::{heeq_to_local, heliographic_to_heeq, Heliographic};
use crate::units::{FieldUnit, UnitError};
use nalgebra::Vector3;

/// Error types for magnetogram construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MagnetogramError {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("magnetogram must be at least 2x2 pixels, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },
    #[error("field-of-view corners are out of order: bottom-left ({bl_lon:.3}, {bl_lat:.3}) deg must lie south-east of top-right ({tr_lon:.3}, {tr_lat:.3}) deg")]
    CornersOutOfOrder {
        bl_lon: f64,
        bl_lat: f64,
        tr_lon: f64,
        tr_lat: f64,
    },
    #[error("magnetogram contains a non-finite value at pixel ({x}, {y})")]
    NonFiniteValue { x: usize, y: usize },
}

/// A line-of-sight magnetogram with observer geometry.
///
/// Pixel data is indexed `[y, x]` (row-major image convention). Pixel world
/// coordinates derive from linear interpolation of the corner coordinates in
/// longitude/latitude, on the sphere of the pointing-center radius.
#[derive(Debug, Clone)]
pub struct Magnetogram {
    data: Array2<f64>,
    unit: FieldUnit,
    center: Heliographic,
    observer: Heliographic,
    bottom_left: Heliographic,
    top_right: Heliographic,
}

impl Magnetogram {
    /// Create a validated magnetogram.
    ///
    /// # Arguments
    /// * `data` - LOS field strengths, shape `(ny, nx)`, indexed `[y, x]`
    /// * `unit` - field unit string from the map metadata (e.g. "G")
    /// * `center` - pointing center of the map
    /// * `observer` - observer position (e.g. spacecraft location)
    /// * `bottom_left` - world coordinate of the bottom-left FOV corner
    /// * `top_right` - world coordinate of the top-right FOV corner
    ///
    /// # Errors
    /// Fails fast on an unusable unit string, a grid smaller than 2x2,
    /// out-of-order corners, or non-finite pixel values.
    pub fn new(
        data: Array2<f64>,
        unit: &str,
        center: Heliographic,
        observer: Heliographic,
        bottom_left: Heliographic,
        top_right: Heliographic,
    ) -> Result<Self, MagnetogramError> {
        let unit = FieldUnit::parse(unit)?;

        let (rows, cols) = data.dim();
        if rows < 2 || cols < 2 {
            return Err(MagnetogramError::TooSmall { rows, cols });
        }

        if bottom_left.lon >= top_right.lon || bottom_left.lat >= top_right.lat {
            return Err(MagnetogramError::CornersOutOfOrder {
                bl_lon: bottom_left.lon_degrees(),
                bl_lat: bottom_left.lat_degrees(),
                tr_lon: top_right.lon_degrees(),
                tr_lat: top_right.lat_degrees(),
            });
        }

        for ((y, x), value) in data.indexed_iter() {
            if !value.is_finite() {
                return Err(MagnetogramError::NonFiniteValue { x, y });
            }
        }

        Ok(Self {
            data,
            unit,
            center,
            observer,
            bottom_left,
            top_right,
        })
    }

    /// Pixel data, indexed `[y, x]`, in the magnetogram's native unit
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Field unit of the pixel values
    pub fn unit(&self) -> FieldUnit {
        self.unit
    }

    /// Pointing center of the map
    pub fn center(&self) -> &Heliographic {
        &self.center
    }

    /// Observer position
    pub fn observer(&self) -> &Heliographic {
        &self.observer
    }

    /// Bottom-left field-of-view corner
    pub fn bottom_left(&self) -> &Heliographic {
        &self.bottom_left
    }

    /// Top-right field-of-view corner
    pub fn top_right(&self) -> &Heliographic {
        &self.top_right
    }

    /// Map shape as `(ny, nx)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// World coordinate of the center of pixel `(ix, iy)`.
    ///
    /// Longitude and latitude interpolate linearly between the corner
    /// coordinates; the radius is the pointing-center radius (the map is
    /// taken to lie on that sphere).
    pub fn pixel_to_heliographic(&self, ix: usize, iy: usize) -> Heliographic {
        let (ny, nx) = self.shape();
        let fx = ix as f64 / (nx - 1) as f64;
        let fy = iy as f64 / (ny - 1) as f64;
        Heliographic {
            lon: self.bottom_left.lon + fx * (self.top_right.lon - self.bottom_left.lon),
            lat: self.bottom_left.lat + fy * (self.top_right.lat - self.bottom_left.lat),
            radius: self.center.radius,
        }
    }

    /// Local-frame position of the center of pixel `(ix, iy)`, in cm
    pub fn pixel_to_local(&self, ix: usize, iy: usize) -> Vector3<f64> {
        let world = heliographic_to_heeq(&self.pixel_to_heliographic(ix, iy));
        heeq_to_local(&world, &self.center)
    }
}
