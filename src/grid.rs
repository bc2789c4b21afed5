//! Extrapolation domain: the 3D regular grid above the magnetogram
//!
//! The domain is computed once from the magnetogram's field-of-view corners
//! (transformed into the local frame) plus a caller-supplied height and
//! vertical resolution, and is invariant for the lifetime of one
//! extrapolation run. The boundary field, scalar potential, and vector field
//! all share its shape.

use crate::coords::{heeq_to_local, heliographic_to_heeq};
use crate::magnetogram::Magnetogram;
use crate::units::{Length, LengthExt};

/// One axis of the regular grid: `cells` nodes starting at `start`,
/// spaced `delta = width / cells` apart (all lengths in cm).
///
/// Nodes sample the left edge of each cell, so the last node sits at
/// `start + width - delta`, one spacing short of the range end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    /// Physical coordinate of node 0, in cm
    pub start: f64,
    /// Physical extent of the axis, in cm
    pub width: f64,
    /// Number of grid nodes
    pub cells: usize,
}

impl GridAxis {
    /// Node spacing in cm
    pub fn delta(&self) -> f64 {
        self.width / self.cells as f64
    }

    /// Physical coordinate of node `i`, in cm
    pub fn node(&self, i: usize) -> f64 {
        self.start + i as f64 * self.delta()
    }
}

/// The 3D extrapolation domain.
///
/// Arrays defined over the domain are indexed `[y, x, z]` (2D boundary
/// arrays `[y, x]`), matching the row-major image convention of the
/// magnetogram data.
///
/// All three axes use the same cell-edge node convention (see [`GridAxis`]):
/// the boundary resampling and the quadrature evaluate at identical
/// positions, and no node sits on the far range end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    /// Local-frame x axis (solar west)
    pub x: GridAxis,
    /// Local-frame y axis (solar north)
    pub y: GridAxis,
    /// Local-frame z axis (outward radial), starting at the boundary plane
    pub z: GridAxis,
}

impl Domain {
    /// Derive the domain from a magnetogram.
    ///
    /// The x/y ranges come from the FOV corners transformed into the local
    /// frame; the x/y resolution matches the magnetogram pixel grid. The z
    /// axis spans `[0, width_z]` with `shape_z` nodes.
    pub fn new(magnetogram: &Magnetogram, width_z: Length, shape_z: usize) -> Self {
        let center = magnetogram.center();
        let bl = heeq_to_local(&heliographic_to_heeq(magnetogram.bottom_left()), center);
        let tr = heeq_to_local(&heliographic_to_heeq(magnetogram.top_right()), center);
        let (ny, nx) = magnetogram.shape();

        Self {
            x: GridAxis {
                start: bl.x,
                width: tr.x - bl.x,
                cells: nx,
            },
            y: GridAxis {
                start: bl.y,
                width: tr.y - bl.y,
                cells: ny,
            },
            z: GridAxis {
                start: 0.0,
                width: width_z.as_centimeters(),
                cells: shape_z,
            },
        }
    }

    /// Build a domain directly from physical ranges (cm) and a grid shape.
    ///
    /// Useful for tests and benchmarks that do not start from a magnetogram.
    pub fn from_ranges(
        range_x: (f64, f64),
        range_y: (f64, f64),
        range_z: (f64, f64),
        shape: (usize, usize, usize),
    ) -> Self {
        let (nx, ny, nz) = shape;
        Self {
            x: GridAxis {
                start: range_x.0,
                width: range_x.1 - range_x.0,
                cells: nx,
            },
            y: GridAxis {
                start: range_y.0,
                width: range_y.1 - range_y.0,
                cells: ny,
            },
            z: GridAxis {
                start: range_z.0,
                width: range_z.1 - range_z.0,
                cells: nz,
            },
        }
    }

    /// Shape of arrays defined over the domain: `(ny, nx, nz)`
    pub fn array_shape(&self) -> (usize, usize, usize) {
        (self.y.cells, self.x.cells, self.z.cells)
    }

    /// Shape of 2D boundary arrays: `(ny, nx)`
    pub fn boundary_shape(&self) -> (usize, usize) {
        (self.y.cells, self.x.cells)
    }
}
