//! Boundary projection: resampling the magnetogram onto the regular grid
//!
//! The magnetogram pixel grid, mapped into the local frame, is an irregular
//! (rotated, foreshortened) mesh of scattered points. The potential solver
//! needs the boundary field on the domain's uniform x/y nodes, so every
//! source quad is split into two triangles and target nodes falling inside a
//! triangle receive the linear barycentric combination of its vertex values.
//! Nodes outside the convex hull of the source points stay zero; coverage
//! gaps are policy, not failure, so this function has no error path.

use ndarray::Array2;

use crate::grid::Domain;
use crate::magnetogram::Magnetogram;

// Triangles with an area below this fraction of a target cell are collapsed
// by foreshortening and contribute nothing.
const DEGENERATE_AREA_FRACTION: f64 = 1e-12;

/// Resample the magnetogram onto the domain's regular x/y grid.
///
/// # Arguments
/// * `magnetogram` - source pixel data and observer geometry
/// * `domain` - target grid; output shape is `domain.boundary_shape()`
///
/// # Returns
/// Boundary field of shape `(ny, nx)` in the magnetogram's native unit,
/// zero outside the footprint of the source pixels.
pub fn project_boundary(magnetogram: &Magnetogram, domain: &Domain) -> Array2<f64> {
    let (src_ny, src_nx) = magnetogram.shape();

    // Local-frame positions of every source pixel center
    let mut px = Array2::<f64>::zeros((src_ny, src_nx));
    let mut py = Array2::<f64>::zeros((src_ny, src_nx));
    for iy in 0..src_ny {
        for ix in 0..src_nx {
            let p = magnetogram.pixel_to_local(ix, iy);
            px[[iy, ix]] = p.x;
            py[[iy, ix]] = p.y;
        }
    }

    let mut boundary = Array2::<f64>::zeros(domain.boundary_shape());
    let values = magnetogram.data();
    let min_area = DEGENERATE_AREA_FRACTION * domain.x.delta() * domain.y.delta();

    for iy in 0..src_ny - 1 {
        for ix in 0..src_nx - 1 {
            let corner = |dy: usize, dx: usize| {
                let (r, c) = (iy + dy, ix + dx);
                ([px[[r, c]], py[[r, c]]], values[[r, c]])
            };
            let a = corner(0, 0);
            let b = corner(0, 1);
            let c = corner(1, 1);
            let d = corner(1, 0);
            fill_triangle(&mut boundary, domain, a, b, c, min_area);
            fill_triangle(&mut boundary, domain, a, c, d, min_area);
        }
    }

    boundary
}

/// Assign barycentric-interpolated values to every target node inside the
/// triangle `(a, b, c)`, each given as (position, value).
fn fill_triangle(
    boundary: &mut Array2<f64>,
    domain: &Domain,
    a: ([f64; 2], f64),
    b: ([f64; 2], f64),
    c: ([f64; 2], f64),
    min_area: f64,
) {
    let det = (b.0[0] - a.0[0]) * (c.0[1] - a.0[1]) - (c.0[0] - a.0[0]) * (b.0[1] - a.0[1]);
    if det.abs() < min_area {
        return;
    }

    let (ny, nx) = boundary.dim();
    let (dx, dy) = (domain.x.delta(), domain.y.delta());

    let min_x = a.0[0].min(b.0[0]).min(c.0[0]);
    let max_x = a.0[0].max(b.0[0]).max(c.0[0]);
    let min_y = a.0[1].min(b.0[1]).min(c.0[1]);
    let max_y = a.0[1].max(b.0[1]).max(c.0[1]);

    // Tolerance for nodes sitting exactly on shared triangle edges
    let eps = 1e-9;

    let j_lo = ((((min_x - domain.x.start) / dx) - eps).ceil().max(0.0)) as usize;
    let j_hi = (((max_x - domain.x.start) / dx) + eps).floor().min((nx - 1) as f64);
    let i_lo = ((((min_y - domain.y.start) / dy) - eps).ceil().max(0.0)) as usize;
    let i_hi = (((max_y - domain.y.start) / dy) + eps).floor().min((ny - 1) as f64);
    if j_hi < 0.0 || i_hi < 0.0 {
        return;
    }
    let (j_hi, i_hi) = (j_hi as usize, i_hi as usize);

    for i in i_lo..=i_hi.min(ny.saturating_sub(1)) {
        let y = domain.y.node(i);
        for j in j_lo..=j_hi.min(nx.saturating_sub(1)) {
            let x = domain.x.node(j);
            let w_b = ((x - a.0[0]) * (c.0[1] - a.0[1]) - (c.0[0] - a.0[0]) * (y - a.0[1])) / det;
            let w_c = ((b.0[0] - a.0[0]) * (y - a.0[1]) - (x - a.0[0]) * (b.0[1] - a.0[1])) / det;
            let w_a = 1.0 - w_b - w_c;
            if w_a >= -eps && w_b >= -eps && w_c >= -eps {
                boundary[[i, j]] = w_a * a.1 + w_b * b.1 + w_c * c.1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Heliographic;
    use crate::grid::Domain;
    use crate::units::{Length, LengthExt};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn magnetogram_with(data: Array2<f64>) -> Magnetogram {
        Magnetogram::new(
            data,
            "G",
            Heliographic::on_surface(0.0, 0.0),
            Heliographic::from_degrees(0.0, 0.0, 1.496e13),
            Heliographic::on_surface(-2.0, -2.0),
            Heliographic::on_surface(2.0, 2.0),
        )
        .unwrap()
    }

    #[test]
    fn test_constant_map_reproduced() {
        let mag = magnetogram_with(Array2::from_elem((8, 8), 250.0));
        let domain = Domain::new(&mag, Length::from_megameters(50.0), 8);
        let boundary = project_boundary(&mag, &domain);

        assert_eq!(boundary.dim(), (8, 8));
        for &v in boundary.iter() {
            assert_relative_eq!(v, 250.0, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_linear_field_reproduced() {
        // Barycentric interpolation is exact for fields linear in the local
        // plane coordinates
        let mut data = Array2::zeros((10, 10));
        let probe = magnetogram_with(data.clone());
        let (alpha, beta) = (3.0e-9, -1.5e-9);
        for iy in 0..10 {
            for ix in 0..10 {
                let p = probe.pixel_to_local(ix, iy);
                data[[iy, ix]] = alpha * p.x + beta * p.y;
            }
        }
        let mag = magnetogram_with(data);
        let domain = Domain::new(&mag, Length::from_megameters(50.0), 8);
        let boundary = project_boundary(&mag, &domain);

        for i in 0..10 {
            for j in 0..10 {
                let expected = alpha * domain.x.node(j) + beta * domain.y.node(i);
                assert_relative_eq!(boundary[[i, j]], expected, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn test_outside_hull_defaults_to_zero() {
        let mag = magnetogram_with(Array2::from_elem((8, 8), 100.0));
        let narrow = Domain::new(&mag, Length::from_megameters(50.0), 8);
        // Triple the x range while keeping the node count: the outer thirds
        // have no source coverage
        let wide = Domain::from_ranges(
            (narrow.x.start * 3.0, narrow.x.start * 3.0 + narrow.x.width * 3.0),
            (narrow.y.start, narrow.y.start + narrow.y.width),
            (0.0, narrow.z.width),
            (24, 8, 8),
        );
        let boundary = project_boundary(&mag, &wide);

        assert_eq!(boundary.dim(), (8, 24));
        // Leftmost node is far outside the magnetogram footprint
        assert_relative_eq!(boundary[[4, 0]], 0.0);
        assert_relative_eq!(boundary[[4, 23]], 0.0);
        // Center of the widened grid is still covered
        assert_relative_eq!(boundary[[4, 12]], 100.0, max_relative = 1e-9);
    }
}
