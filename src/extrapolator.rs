//! Oblique Schmidt potential-field extrapolator
//!
//! The facade orchestrating the full pipeline: boundary projection, the
//! Green's-function quadrature, and the finite-difference gradient, with
//! field-line tracing as a downstream convenience. Construction fixes the
//! extrapolation domain and validates the observer geometry; `extrapolate`
//! recomputes everything from the magnetogram on each call (idempotent but
//! not cheap: there is deliberately no partial-result caching).

use nalgebra::Vector3;
use ndarray::{Array2, Array3};
use thiserror::Error;
use tracing::info;

use crate::boundary::project_boundary;
use crate::coords::{heeq_to_local, heliographic_to_heeq, local_to_heeq};
use crate::fieldline::{self, FieldLine, TraceOptions};
use crate::gradient::{compute_field, VectorField};
use crate::grid::Domain;
use crate::magnetogram::Magnetogram;
use crate::potential::{compute_potential, PotentialOptions};
use crate::units::{Length, LengthExt};

/// Error types for extrapolator construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtrapolationError {
    /// The observer sits in the plane of the magnetogram center, so the
    /// line-of-sight vector cannot be normalized
    #[error("degenerate line-of-sight geometry: observer is {magnitude_cm:.3e} cm from the pointing center")]
    DegenerateLineOfSight { magnitude_cm: f64 },
    #[error("extrapolation height must be positive, got {cm:.3e} cm")]
    NonPositiveHeight { cm: f64 },
    #[error("vertical grid must have at least one cell")]
    ZeroHeightCells,
}

/// Configuration for the oblique Schmidt extrapolation
#[derive(Debug, Clone, Copy)]
pub struct ObliqueSchmidtConfig {
    /// Physical height of the extrapolation volume above the boundary
    pub width_z: Length,
    /// Number of grid cells along the vertical axis
    pub shape_z: usize,
    /// Quadrature options (parallel by default)
    pub potential: PotentialOptions,
}

impl ObliqueSchmidtConfig {
    /// Configuration with default quadrature options
    pub fn new(width_z: Length, shape_z: usize) -> Self {
        Self {
            width_z,
            shape_z,
            potential: PotentialOptions::default(),
        }
    }
}

/// Potential field extrapolation using the oblique Schmidt method
/// (Sakurai 1981, Solar Physics 76, 301).
#[derive(Debug, Clone)]
pub struct ObliqueSchmidt {
    magnetogram: Magnetogram,
    domain: Domain,
    l_hat: Vector3<f64>,
    options: PotentialOptions,
}

impl ObliqueSchmidt {
    /// Build an extrapolator for a magnetogram.
    ///
    /// Computes the domain from the magnetogram's field-of-view corners and
    /// the configured height, and validates the observer geometry.
    ///
    /// # Errors
    /// Fails on a non-positive height, a zero vertical cell count, or a
    /// degenerate (zero-length) line-of-sight vector.
    pub fn new(
        magnetogram: Magnetogram,
        config: ObliqueSchmidtConfig,
    ) -> Result<Self, ExtrapolationError> {
        let width_cm = config.width_z.as_centimeters();
        if width_cm <= 0.0 {
            return Err(ExtrapolationError::NonPositiveHeight { cm: width_cm });
        }
        if config.shape_z == 0 {
            return Err(ExtrapolationError::ZeroHeightCells);
        }

        let domain = Domain::new(&magnetogram, config.width_z, config.shape_z);

        let observer = heliographic_to_heeq(magnetogram.observer());
        let los = heeq_to_local(&observer, magnetogram.center());
        let magnitude = los.norm();
        if magnitude < 1.0e-6 {
            return Err(ExtrapolationError::DegenerateLineOfSight {
                magnitude_cm: magnitude,
            });
        }

        Ok(Self {
            magnetogram,
            domain,
            l_hat: los / magnitude,
            options: config.potential,
        })
    }

    /// The extrapolation domain fixed at construction
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The input magnetogram
    pub fn magnetogram(&self) -> &Magnetogram {
        &self.magnetogram
    }

    /// Normalized line-of-sight vector in the local frame
    pub fn line_of_sight(&self) -> &Vector3<f64> {
        &self.l_hat
    }

    /// Project the magnetogram onto the domain's regular boundary grid
    pub fn project_boundary(&self) -> Array2<f64> {
        project_boundary(&self.magnetogram, &self.domain)
    }

    /// Compute the scalar potential on the full 3D grid.
    ///
    /// Units: magnetogram field unit times centimeters.
    pub fn compute_potential(&self) -> Array3<f64> {
        info!("projecting boundary onto the regular grid");
        let boundary = self.project_boundary();
        info!(
            shape = ?self.domain.array_shape(),
            "integrating Green's function over the boundary"
        );
        compute_potential(&boundary, &self.domain, &self.l_hat, &self.options)
    }

    /// Differentiate a scalar potential into the vector magnetic field
    pub fn compute_field(&self, phi: &Array3<f64>) -> VectorField {
        compute_field(phi, &self.domain, self.magnetogram.unit())
    }

    /// Run the full extrapolation: boundary projection, potential
    /// quadrature, and gradient, in one call.
    pub fn extrapolate(&self) -> VectorField {
        let phi = self.compute_potential();
        info!("differentiating potential into the vector field");
        self.compute_field(&phi)
    }

    /// Trace field lines through an extrapolated field and reproject them
    /// into the HEEQ frame.
    ///
    /// # Arguments
    /// * `field` - vector field from [`extrapolate`](Self::extrapolate)
    /// * `n_lines` - requested number of field lines
    /// * `options` - tracing options
    ///
    /// # Returns
    /// Field lines whose positions are HEEQ Cartesian coordinates in cm.
    pub fn trace_fieldlines(
        &self,
        field: &VectorField,
        n_lines: usize,
        options: &TraceOptions,
    ) -> Vec<FieldLine> {
        let lines = fieldline::trace(field, &self.domain, n_lines, options);
        info!(count = lines.len(), "transforming field lines to HEEQ");
        lines
            .into_iter()
            .map(|line| FieldLine {
                positions: line
                    .positions
                    .iter()
                    .map(|p| local_to_heeq(p, self.magnetogram.center()))
                    .collect(),
                strength: line.strength,
            })
            .collect()
    }
}
