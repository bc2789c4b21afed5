//! Field-line tracing through the extrapolated vector field
//!
//! Downstream consumers want loop geometries, not raw field arrays. The
//! tracer seeds footpoints on the boundary where |Bz| is strong, then
//! integrates the normalized field direction with a fixed-step RK4 scheme,
//! sampling the field trilinearly between grid nodes. Lines are oriented so
//! they leave the boundary upward and stop when they exit the domain or
//! exhaust the step budget. Seed selection is driven by a seeded RNG so
//! results are reproducible.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::gradient::VectorField;
use crate::grid::Domain;

/// Options for field-line tracing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraceOptions {
    /// Maximum number of integration steps per line
    pub max_steps: usize,
    /// Step size as a fraction of the smallest grid spacing
    pub step_fraction: f64,
    /// Seed cells must have |Bz| above this fraction of the boundary maximum
    pub relative_threshold: f64,
    /// RNG seed for reproducible footpoint selection
    pub seed: u64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            step_fraction: 0.25,
            relative_threshold: 0.1,
            seed: 0,
        }
    }
}

/// One traced field line in the local frame
#[derive(Debug, Clone)]
pub struct FieldLine {
    /// Positions along the line, in cm
    pub positions: Vec<Vector3<f64>>,
    /// Field magnitude at each position, in the field's unit
    pub strength: Vec<f64>,
}

/// Trilinear sampler over a vector field defined on a domain grid
struct FieldSampler<'a> {
    field: &'a VectorField,
    domain: &'a Domain,
}

impl<'a> FieldSampler<'a> {
    fn new(field: &'a VectorField, domain: &'a Domain) -> Self {
        assert_eq!(
            field.z.dim(),
            domain.array_shape(),
            "vector field shape must match the domain grid"
        );
        Self { field, domain }
    }

    /// Sample the field at a local-frame position, or None outside the grid
    fn sample(&self, p: &Vector3<f64>) -> Option<Vector3<f64>> {
        let fx = (p.x - self.domain.x.start) / self.domain.x.delta();
        let fy = (p.y - self.domain.y.start) / self.domain.y.delta();
        let fz = (p.z - self.domain.z.start) / self.domain.z.delta();

        let (ny, nx, nz) = self.domain.array_shape();
        if fx < 0.0
            || fy < 0.0
            || fz < 0.0
            || fx > (nx - 1) as f64
            || fy > (ny - 1) as f64
            || fz > (nz - 1) as f64
        {
            return None;
        }

        // Cell index and fractional offset, clamped so positions on the far
        // face still land in the last cell
        let j = (fx as usize).min(nx - 2);
        let i = (fy as usize).min(ny - 2);
        let k = (fz as usize).min(nz - 2);
        let tx = fx - j as f64;
        let ty = fy - i as f64;
        let tz = fz - k as f64;

        let lerp3 = |arr: &ndarray::Array3<f64>| -> f64 {
            let c000 = arr[[i, j, k]];
            let c001 = arr[[i, j, k + 1]];
            let c010 = arr[[i, j + 1, k]];
            let c011 = arr[[i, j + 1, k + 1]];
            let c100 = arr[[i + 1, j, k]];
            let c101 = arr[[i + 1, j, k + 1]];
            let c110 = arr[[i + 1, j + 1, k]];
            let c111 = arr[[i + 1, j + 1, k + 1]];

            let c00 = c000 * (1.0 - tz) + c001 * tz;
            let c01 = c010 * (1.0 - tz) + c011 * tz;
            let c10 = c100 * (1.0 - tz) + c101 * tz;
            let c11 = c110 * (1.0 - tz) + c111 * tz;

            let c0 = c00 * (1.0 - tx) + c01 * tx;
            let c1 = c10 * (1.0 - tx) + c11 * tx;

            c0 * (1.0 - ty) + c1 * ty
        };

        Some(Vector3::new(
            lerp3(&self.field.x),
            lerp3(&self.field.y),
            lerp3(&self.field.z),
        ))
    }
}

/// Trace field lines through the vector field.
///
/// # Arguments
/// * `field` - the extrapolated vector field
/// * `domain` - grid geometry the field is defined on
/// * `n_lines` - requested number of field lines
/// * `options` - tracing options
///
/// # Returns
/// Up to `n_lines` field lines in the local frame. Fewer (possibly zero)
/// lines come back when no boundary cell clears the seed threshold.
pub fn trace(
    field: &VectorField,
    domain: &Domain,
    n_lines: usize,
    options: &TraceOptions,
) -> Vec<FieldLine> {
    let sampler = FieldSampler::new(field, domain);
    let (ny, nx, _) = domain.array_shape();

    // Candidate footpoints: boundary cells with |Bz| above the threshold
    let mut max_bz = 0.0f64;
    for i in 0..ny {
        for j in 0..nx {
            max_bz = max_bz.max(field.z[[i, j, 0]].abs());
        }
    }
    if max_bz == 0.0 {
        return Vec::new();
    }
    let threshold = options.relative_threshold * max_bz;
    let mut candidates = Vec::new();
    for i in 0..ny {
        for j in 0..nx {
            if field.z[[i, j, 0]].abs() >= threshold {
                candidates.push((i, j));
            }
        }
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let step = options.step_fraction
        * domain
            .x
            .delta()
            .min(domain.y.delta())
            .min(domain.z.delta());
    let mut rng = StdRng::seed_from_u64(options.seed);

    (0..n_lines)
        .filter_map(|_| {
            let (i, j) = candidates[rng.gen_range(0..candidates.len())];
            let start = Vector3::new(
                domain.x.node(j),
                domain.y.node(i),
                domain.z.start + 0.5 * domain.z.delta(),
            );
            trace_one(&sampler, start, step, options.max_steps)
        })
        .collect()
}

/// Integrate a single line from `start` with fixed-step RK4 along the
/// normalized field direction.
fn trace_one(
    sampler: &FieldSampler<'_>,
    start: Vector3<f64>,
    step: f64,
    max_steps: usize,
) -> Option<FieldLine> {
    let b0 = sampler.sample(&start)?;
    if b0.norm() == 0.0 {
        return None;
    }
    // Orient the line so it initially leaves the boundary upward
    let sign = if b0.z >= 0.0 { 1.0 } else { -1.0 };

    let direction = |p: &Vector3<f64>| -> Option<Vector3<f64>> {
        let b = sampler.sample(p)?;
        let norm = b.norm();
        if norm == 0.0 {
            return None;
        }
        Some(b * (sign / norm))
    };

    let mut positions = vec![start];
    let mut strength = vec![b0.norm()];
    let mut p = start;

    for _ in 0..max_steps {
        let Some(k1) = direction(&p) else {
            break;
        };
        let Some(k2) = direction(&(p + k1 * (step / 2.0))) else {
            break;
        };
        let Some(k3) = direction(&(p + k2 * (step / 2.0))) else {
            break;
        };
        let Some(k4) = direction(&(p + k3 * step)) else {
            break;
        };
        p += (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (step / 6.0);

        let Some(b) = sampler.sample(&p) else {
            break;
        };
        positions.push(p);
        strength.push(b.norm());
    }

    Some(FieldLine {
        positions,
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::FieldUnit;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn uniform_vertical_field(n: usize, bz: f64) -> (VectorField, Domain) {
        let domain = Domain::from_ranges(
            (0.0, n as f64),
            (0.0, n as f64),
            (0.0, n as f64),
            (n, n, n),
        );
        let shape = domain.array_shape();
        let field = VectorField {
            x: Array3::zeros(shape),
            y: Array3::zeros(shape),
            z: Array3::from_elem(shape, bz),
            unit: FieldUnit::Gauss,
        };
        (field, domain)
    }

    #[test]
    fn test_uniform_field_gives_vertical_lines() {
        let (field, domain) = uniform_vertical_field(8, 100.0);
        let lines = trace(&field, &domain, 4, &TraceOptions::default());
        assert_eq!(lines.len(), 4);

        for line in &lines {
            assert!(line.positions.len() > 2);
            let first = line.positions.first().unwrap();
            let last = line.positions.last().unwrap();
            // Straight up: x and y do not move
            assert_relative_eq!(first.x, last.x, epsilon = 1e-9);
            assert_relative_eq!(first.y, last.y, epsilon = 1e-9);
            assert!(last.z > first.z);
            // Uniform magnitude along the whole line
            for &s in &line.strength {
                assert_relative_eq!(s, 100.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_negative_bz_lines_still_go_up() {
        let (field, domain) = uniform_vertical_field(8, -50.0);
        let lines = trace(&field, &domain, 2, &TraceOptions::default());
        for line in &lines {
            let first = line.positions.first().unwrap();
            let last = line.positions.last().unwrap();
            assert!(last.z > first.z);
        }
    }

    #[test]
    fn test_lines_stay_inside_domain() {
        let (field, domain) = uniform_vertical_field(8, 10.0);
        let lines = trace(&field, &domain, 3, &TraceOptions::default());
        for line in &lines {
            for p in &line.positions {
                assert!(p.z <= domain.z.start + domain.z.width);
            }
        }
    }

    #[test]
    fn test_reproducible_with_same_seed() {
        let (field, domain) = uniform_vertical_field(8, 75.0);
        let options = TraceOptions {
            seed: 1234,
            ..Default::default()
        };
        let first = trace(&field, &domain, 5, &options);
        let second = trace(&field, &domain, 5, &options);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.positions.len(), b.positions.len());
            for (pa, pb) in a.positions.iter().zip(b.positions.iter()) {
                assert_eq!(pa, pb);
            }
        }
    }

    #[test]
    fn test_zero_field_yields_no_lines() {
        let (field, domain) = uniform_vertical_field(6, 0.0);
        let lines = trace(&field, &domain, 3, &TraceOptions::default());
        assert!(lines.is_empty());
    }
}
