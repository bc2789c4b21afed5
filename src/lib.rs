//! Potential-field extrapolation of coronal magnetic fields
//!
//! This crate reconstructs a 3D vector magnetic field above a 2D
//! line-of-sight magnetogram using the oblique Schmidt potential-field
//! method: the magnetogram is resampled onto a regular grid in a local
//! planar frame, a Green's-function quadrature produces the scalar
//! potential on a 3D grid, and a high-order finite difference turns the
//! potential into the field. Field-line tracing through the result is
//! provided as a downstream convenience.

pub mod boundary;
pub mod coords;
pub mod extrapolator;
pub mod fieldline;
pub mod gradient;
pub mod grid;
pub mod magnetogram;
pub mod potential;
pub mod units;

// Re-exports for easier access
pub use coords::{heeq_to_local, heliographic_to_heeq, local_to_heeq, Heliographic};
pub use extrapolator::{ExtrapolationError, ObliqueSchmidt, ObliqueSchmidtConfig};
pub use fieldline::{FieldLine, TraceOptions};
pub use gradient::VectorField;
pub use grid::Domain;
pub use magnetogram::{Magnetogram, MagnetogramError};
pub use potential::PotentialOptions;
pub use units::{FieldUnit, Length, LengthExt};
