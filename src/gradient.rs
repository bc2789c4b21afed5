//! Vector field from the scalar potential: B = -grad(phi)
//!
//! The gradient uses a 4th-order-accurate central difference (5-point
//! stencil) on the interior; the two outermost cells on every face copy the
//! nearest interior cell with a valid stencil value. The copied shell is
//! qualitatively extended, not differentiated: callers should not use field
//! values within 2 grid cells of any domain face for quantitative work.

use ndarray::{Array3, Axis};

use crate::grid::Domain;
use crate::units::FieldUnit;

/// The three components of the extrapolated magnetic field.
///
/// Arrays are indexed `[y, x, z]` (image row-major convention carried up
/// from the magnetogram), while components are physical: `x` varies along
/// array axis 1, `y` along axis 0, `z` along axis 2. Follow the field names,
/// not the array axis order.
#[derive(Debug, Clone)]
pub struct VectorField {
    /// x component (solar west), shape `(ny, nx, nz)`
    pub x: Array3<f64>,
    /// y component (solar north), shape `(ny, nx, nz)`
    pub y: Array3<f64>,
    /// z component (outward radial), shape `(ny, nx, nz)`
    pub z: Array3<f64>,
    /// Physical unit of all three components
    pub unit: FieldUnit,
}

impl VectorField {
    /// Re-express all three components in `unit`.
    ///
    /// The pipeline computes in the magnetogram's native unit; downstream
    /// consumers that need a fixed unit (conventionally gauss) convert here.
    pub fn into_unit(mut self, unit: FieldUnit) -> Self {
        let factor = self.unit.gauss_factor() / unit.gauss_factor();
        if factor != 1.0 {
            for component in [&mut self.x, &mut self.y, &mut self.z] {
                component.mapv_inplace(|v| v * factor);
            }
        }
        self.unit = unit;
        self
    }
}

/// Differentiate the scalar potential into the vector magnetic field.
///
/// # Arguments
/// * `phi` - scalar potential of shape `(ny, nx, nz)`, units of field x cm
/// * `domain` - grid spacing source
/// * `unit` - field unit to tag the output with (the magnetogram's unit)
///
/// # Panics
/// Panics if `phi` does not match the domain shape.
pub fn compute_field(phi: &Array3<f64>, domain: &Domain, unit: FieldUnit) -> VectorField {
    assert_eq!(
        phi.dim(),
        domain.array_shape(),
        "potential shape must match the domain grid"
    );

    let (ny, nx, nz) = phi.dim();
    let mut bx = Array3::<f64>::zeros((ny, nx, nz));
    let mut by = Array3::<f64>::zeros((ny, nx, nz));
    let mut bz = Array3::<f64>::zeros((ny, nx, nz));

    let (dx, dy, dz) = (domain.x.delta(), domain.y.delta(), domain.z.delta());

    // Interior: B_i = -(-phi(+2) + 8 phi(+1) - 8 phi(-1) + phi(-2)) / (12 d)
    for i in 2..ny.saturating_sub(2) {
        for j in 2..nx.saturating_sub(2) {
            for k in 2..nz.saturating_sub(2) {
                bx[[i, j, k]] = (phi[[i, j + 2, k]] - 8.0 * phi[[i, j + 1, k]]
                    + 8.0 * phi[[i, j - 1, k]]
                    - phi[[i, j - 2, k]])
                    / (12.0 * dx);
                by[[i, j, k]] = (phi[[i + 2, j, k]] - 8.0 * phi[[i + 1, j, k]]
                    + 8.0 * phi[[i - 1, j, k]]
                    - phi[[i - 2, j, k]])
                    / (12.0 * dy);
                bz[[i, j, k]] = (phi[[i, j, k + 2]] - 8.0 * phi[[i, j, k + 1]]
                    + 8.0 * phi[[i, j, k - 1]]
                    - phi[[i, j, k - 2]])
                    / (12.0 * dz);
            }
        }
    }

    for component in [&mut bx, &mut by, &mut bz] {
        extend_boundary(component);
    }

    VectorField {
        x: bx,
        y: by,
        z: bz,
        unit,
    }
}

/// Copy the nearest valid interior cell into the two outermost cells on
/// every face, along every axis. Idempotent: re-applying it to an already
/// extended array changes nothing.
pub fn extend_boundary(field: &mut Array3<f64>) {
    for axis in 0..3 {
        let n = field.len_of(Axis(axis));
        if n < 5 {
            continue;
        }
        let low = field.index_axis(Axis(axis), 2).to_owned();
        for idx in [0, 1] {
            field.index_axis_mut(Axis(axis), idx).assign(&low);
        }
        let high = field.index_axis(Axis(axis), n - 3).to_owned();
        for idx in [n - 2, n - 1] {
            field.index_axis_mut(Axis(axis), idx).assign(&high);
        }
    }
}
