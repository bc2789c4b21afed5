//! Scalar potential from the oblique Schmidt Green's-function quadrature
//!
//! This is the computational core: the potential at every node of the 3D
//! grid is a double sum of the Green's function over every boundary cell,
//! O(Nx·Ny·Nz·Nx·Ny) work in total. Each output cell is independent, so the
//! outer loop parallelizes across cells with rayon; no synchronization is
//! needed because every cell is written exactly once.
//!
//! The kernel is the oblique Schmidt potential-field kernel (Sakurai 1981):
//! it reduces to the ordinary Schmidt kernel when the line of sight is
//! normal to the boundary plane. Boundary sources sit at a small virtual
//! depth z0 = -dz/sqrt(2*pi) below the physical boundary, which keeps every
//! boundary-to-node distance strictly positive and the kernel finite for
//! all nodes at z >= 0.

use nalgebra::Vector3;
use ndarray::{Array2, Array3, Zip};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::grid::Domain;

/// Options for controlling the potential quadrature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PotentialOptions {
    /// Whether to parallelize across output grid cells with rayon
    pub parallel: bool,
    /// Worker thread count for the parallel quadrature. `None` runs on the
    /// global rayon pool; `Some(n)` builds a dedicated pool, which keeps a
    /// long quadrature from monopolizing the process-wide pool.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for PotentialOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Evaluate the oblique Schmidt Green's function.
///
/// # Arguments
/// * `x`, `y`, `z` - query point in the local frame, cm
/// * `x_prime`, `y_prime` - boundary point in the local plane, cm
/// * `z_depth` - virtual source depth (negative), cm
/// * `l_hat` - line-of-sight unit vector in the local frame
pub fn greens_function(
    x: f64,
    y: f64,
    z: f64,
    x_prime: f64,
    y_prime: f64,
    z_depth: f64,
    l_hat: &Vector3<f64>,
) -> f64 {
    let r_x = x - x_prime;
    let r_y = y - y_prime;
    let r_z = z - z_depth;
    let r_mag = (r_x * r_x + r_y * r_y + r_z * r_z).sqrt();
    let l_dot_r = l_hat.x * r_x + l_hat.y * r_y + l_hat.z * r_z;
    let mu_dot_r = r_z - l_dot_r * l_hat.z;
    let term1 = l_hat.z / r_mag;
    let term2 = mu_dot_r / (r_mag * (r_mag + l_dot_r));
    (term1 + term2) / (2.0 * PI)
}

/// Integrate the Green's function over the boundary for every grid node.
///
/// # Arguments
/// * `boundary` - boundary field of shape `(ny, nx)` in the magnetogram unit
/// * `domain` - grid geometry; output shape is `domain.array_shape()`
/// * `l_hat` - normalized line-of-sight vector in the local frame
/// * `options` - quadrature options
///
/// # Returns
/// Scalar potential of shape `(ny, nx, nz)`, units of field x cm.
///
/// # Panics
/// Panics if the boundary shape does not match the domain (shape mismatches
/// are programming errors, not runtime conditions).
pub fn compute_potential(
    boundary: &Array2<f64>,
    domain: &Domain,
    l_hat: &Vector3<f64>,
    options: &PotentialOptions,
) -> Array3<f64> {
    assert_eq!(
        boundary.dim(),
        domain.boundary_shape(),
        "boundary field shape must match the domain grid"
    );

    let (ny, nx, nz) = domain.array_shape();
    let (dx, dy, dz) = (domain.x.delta(), domain.y.delta(), domain.z.delta());
    let z_depth = -dz / (2.0 * PI).sqrt();
    let area = dx * dy;

    // Node coordinates, hoisted out of the quadrature loop
    let xs: Vec<f64> = (0..nx).map(|j| domain.x.node(j)).collect();
    let ys: Vec<f64> = (0..ny).map(|i| domain.y.node(i)).collect();
    let zs: Vec<f64> = (0..nz).map(|k| domain.z.node(k)).collect();

    debug!(
        nx,
        ny,
        nz,
        parallel = options.parallel,
        "computing scalar potential"
    );

    let cell = |i: usize, j: usize, k: usize| -> f64 {
        let (x, y, z) = (xs[j], ys[i], zs[k]);
        let mut sum = 0.0;
        for i_prime in 0..ny {
            let y_prime = ys[i_prime];
            for j_prime in 0..nx {
                let green = greens_function(x, y, z, xs[j_prime], y_prime, z_depth, l_hat);
                sum += boundary[[i_prime, j_prime]] * green * area;
            }
        }
        sum
    };

    let mut phi = Array3::<f64>::zeros((ny, nx, nz));
    if options.parallel {
        let fill = |phi: &mut Array3<f64>| {
            Zip::indexed(phi).par_for_each(|(i, j, k), out| {
                *out = cell(i, j, k);
            });
        };
        match options.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| fill(&mut phi)),
                Err(error) => {
                    warn!(%error, "dedicated thread pool unavailable, using the global pool");
                    fill(&mut phi);
                }
            },
            None => fill(&mut phi),
        }
    } else {
        Zip::indexed(&mut phi).for_each(|(i, j, k), out| {
            *out = cell(i, j, k);
        });
    }

    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertical_los() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 1.0)
    }

    fn test_domain(n: usize) -> Domain {
        let extent = n as f64;
        Domain::from_ranges((0.0, extent), (0.0, extent), (0.0, extent), (n, n, n))
    }

    #[test]
    fn test_zero_boundary_gives_zero_potential() {
        let domain = test_domain(6);
        let boundary = Array2::zeros(domain.boundary_shape());
        let phi = compute_potential(&boundary, &domain, &vertical_los(), &Default::default());
        for &v in phi.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_impulse_potential_decays_with_height() {
        // Single unit impulse at the grid center, normal incidence: the
        // potential directly above must decrease monotonically with height
        let domain = test_domain(9);
        let mut boundary = Array2::zeros(domain.boundary_shape());
        boundary[[4, 4]] = 1.0;
        let phi = compute_potential(&boundary, &domain, &vertical_los(), &Default::default());

        let column: Vec<f64> = (0..9).map(|k| phi[[4, 4, k]]).collect();
        for pair in column.windows(2) {
            assert!(
                pair[1] < pair[0],
                "potential must decay with height: {:?}",
                column
            );
        }
        assert!(column[0] > 0.0);
    }

    #[test]
    fn test_kernel_finite_over_domain() {
        let domain = test_domain(5);
        let z_depth = -domain.z.delta() / (2.0 * PI).sqrt();
        // Oblique line of sight
        let l_hat = Vector3::new(0.3, -0.2, 0.933).normalize();
        for i in 0..5 {
            for j in 0..5 {
                for k in 0..5 {
                    for ip in 0..5 {
                        for jp in 0..5 {
                            let g = greens_function(
                                domain.x.node(j),
                                domain.y.node(i),
                                domain.z.node(k),
                                domain.x.node(jp),
                                domain.y.node(ip),
                                z_depth,
                                &l_hat,
                            );
                            assert!(g.is_finite(), "kernel not finite at ({i},{j},{k})");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_oblique_reduces_to_schmidt_at_normal_incidence() {
        // With l = z-hat the kernel is 1/(2*pi*R)
        let l_hat = vertical_los();
        let z_depth = -0.1;
        let g = greens_function(3.0, 1.0, 2.0, 0.0, 0.0, z_depth, &l_hat);
        let r = (3.0f64.powi(2) + 1.0 + (2.0 - z_depth).powi(2)).sqrt();
        assert_relative_eq!(g, 1.0 / (2.0 * PI * r), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let domain = test_domain(6);
        let mut boundary = Array2::zeros(domain.boundary_shape());
        for ((i, j), v) in boundary.indexed_iter_mut() {
            *v = (i as f64 - 2.0) * (j as f64 + 1.0);
        }
        let l_hat = Vector3::new(0.1, 0.1, 0.99).normalize();

        let seq = compute_potential(
            &boundary,
            &domain,
            &l_hat,
            &PotentialOptions {
                parallel: false,
                ..Default::default()
            },
        );
        let par = compute_potential(
            &boundary,
            &domain,
            &l_hat,
            &PotentialOptions {
                parallel: true,
                ..Default::default()
            },
        );

        for (&a, &b) in seq.iter().zip(par.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dedicated_thread_pool_matches_global_pool() {
        let domain = test_domain(6);
        let mut boundary = Array2::zeros(domain.boundary_shape());
        for ((i, j), v) in boundary.indexed_iter_mut() {
            *v = (i as f64 + 1.0) * (j as f64 - 2.5);
        }
        let l_hat = Vector3::new(-0.2, 0.1, 0.97).normalize();

        let global = compute_potential(&boundary, &domain, &l_hat, &Default::default());
        let dedicated = compute_potential(
            &boundary,
            &domain,
            &l_hat,
            &PotentialOptions {
                parallel: true,
                threads: Some(2),
            },
        );

        for (&a, &b) in global.iter().zip(dedicated.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "boundary field shape must match")]
    fn test_shape_mismatch_panics() {
        let domain = test_domain(6);
        let boundary = Array2::zeros((3, 3));
        compute_potential(&boundary, &domain, &vertical_los(), &Default::default());
    }
}
