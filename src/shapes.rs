//! Shape painters
//!
//! Each function below consumes a flat `&[Real]` parameter stream in fixed-size
//! groups (one group per instance of the shape), adding a refractive-index
//! susceptibility to `epsilon`/`loss` for every covered cell, and returns the
//! unconsumed remainder. A trailing group too short to parse is silently
//! dropped, mirroring the C source's `while (nvar > k) { ...; var += k; nvar -= k; }`
//! pointer-advance loops in `mw_shape.c`.
//!
//! Physical coordinates (`x`, `y`, lengths) are in the same units as `dx` and
//! are converted to pixel coordinates the same way everywhere: `px = x/dx + nx/2`.
//! Two shapes (`add_gradient`, `add_ripple`) write `epsilon` directly rather
//! than going through a refractive-index susceptibility, matching
//! `mw_add_gradient`/`mw_add_ripple` in the C source, which never call
//! `mw_susceptibility` and never touch `Edamping`.

use crate::grid::{Grid, Real};
use crate::susceptibility::susceptibility;

/// Clip an inclusive pixel range to `[0, n-1]`, truncating toward zero the
/// same way the C source's implicit `double -> int` assignment does.
fn clip_range(lo: Real, hi: Real, n: usize) -> (i64, i64) {
    let mut lo = lo as i64;
    let mut hi = hi as i64;
    if lo < 0 {
        lo = 0;
    }
    if hi > n as i64 - 1 {
        hi = n as i64 - 1;
    }
    (lo, hi)
}

/// `(x0, y0, radius, nr, ni)` repeating. A filled disc.
pub fn add_circle(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 4 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let radius = rest[2] / dx;
        let (chi_r, chi_i) = susceptibility(rest[3], rest[4]);
        let radius2 = radius * radius;

        let (minx, maxx) = clip_range(x0 - radius, x0 + radius + 1.0, epsilon.nx());
        let (miny, maxy) = clip_range(y0 - radius, y0 + radius + 1.0, epsilon.ny());
        for j in miny..=maxy {
            for i in minx..=maxx {
                let (fi, fj) = (i as Real, j as Real);
                if (x0 - fi) * (x0 - fi) + (y0 - fj) * (y0 - fj) < radius2 {
                    epsilon.add(j as usize, i as usize, chi_r);
                    loss.add(j as usize, i as usize, chi_i);
                }
            }
        }
        rest = &rest[5..];
    }
}

/// `(x0, y0, angle_deg, nr, ni)` repeating. A sharp half-plane edge:
/// everything on one side of the line through `(x0, y0)` at `angle_deg`
/// gets the susceptibility, the whole domain is scanned.
pub fn add_edge(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 4 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let angle = rest[2] * std::f32::consts::PI / 180.0;
        let (sin_a, cos_a) = angle.sin_cos();
        let (chi_r, chi_i) = susceptibility(rest[3], rest[4]);

        for j in 0..epsilon.ny() {
            for i in 0..epsilon.nx() {
                let (fi, fj) = (i as Real, j as Real);
                if (fi - x0) * sin_a + (fj - y0) * cos_a > 0.0 {
                    epsilon.add(j, i, chi_r);
                    loss.add(j, i, chi_i);
                }
            }
        }
        rest = &rest[5..];
    }
}

/// `(x0, y0, angle_deg, width_factor, eps_offset, eps_scale)` repeating. A
/// whole-domain logistic ramp of `epsilon` along the direction `angle_deg`,
/// written directly rather than through a susceptibility (no `loss` term).
pub fn add_gradient(epsilon: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 5 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let angle = rest[2] * std::f32::consts::PI / 180.0;
        let (sin_a, cos_a) = angle.sin_cos();
        let eps_offset = rest[3];
        let eps_scale = rest[4];
        let xfactor = dx / rest[5];

        for j in 0..epsilon.ny() {
            for i in 0..epsilon.nx() {
                let (fi, fj) = (i as Real, j as Real);
                let dist = (fi - x0) * sin_a + (fj - y0) * cos_a;
                let v = eps_offset + eps_scale / (1.0 + (-dist * xfactor).exp());
                epsilon.add(j, i, v);
            }
        }
        rest = &rest[6..];
    }
}

/// `(x0, y0, angle_deg, eps_scale, wavelength, decay_scale)` repeating. A
/// whole-domain directional sinusoid with a 4th-power decay envelope, added
/// directly to `epsilon` (no `loss` term).
pub fn add_ripple(epsilon: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 5 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let angle = rest[2] * std::f32::consts::PI / 180.0;
        let (sin_a, cos_a) = angle.sin_cos();
        let eps_scale = rest[3];
        let xfactor = dx / rest[5];
        let wavenumber = 2.0 * std::f32::consts::PI * dx / rest[4];

        for j in 0..epsilon.ny() {
            for i in 0..epsilon.nx() {
                let (fi, fj) = (i as Real, j as Real);
                let dist = (fi - x0) * sin_a + (fj - y0) * cos_a;
                let v = eps_scale * (wavenumber * dist).sin() * (-(xfactor * dist).powi(4)).exp();
                epsilon.add(j, i, v);
            }
        }
        rest = &rest[6..];
    }
}

/// `(x0, y0, angle_deg, len1, len2, nr, ni)` repeating. A rectangle rotated
/// about its own center, scanned over the whole domain against the rotated
/// half-plane pair `|dist1| <= halfwidth1 && |dist2| <= halfwidth2`.
pub fn add_rotated_rectangle(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 6 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let angle = rest[2] * std::f32::consts::PI / 180.0;
        let halfwidth1 = 0.5 * rest[3] / dx;
        let halfwidth2 = 0.5 * rest[4] / dx;
        let (sin_a, cos_a) = angle.sin_cos();
        let (chi_r, chi_i) = susceptibility(rest[5], rest[6]);

        for j in 0..epsilon.ny() {
            for i in 0..epsilon.nx() {
                let (fi, fj) = (i as Real, j as Real);
                let dist1 = (fi - x0) * sin_a + (fj - y0) * cos_a;
                let dist2 = (fi - x0) * cos_a - (fj - y0) * sin_a;
                if dist1.abs() <= halfwidth1 && dist2.abs() <= halfwidth2 {
                    epsilon.add(j, i, chi_r);
                    loss.add(j, i, chi_i);
                }
            }
        }
        rest = &rest[7..];
    }
}

/// `(x0, y0, angle_deg, len1, len2, wavelength, nr, ni)` repeating. A
/// rotated-rectangle region windowed by `sin^2` along its first axis, so
/// the susceptibility tapers to zero at the rectangle's long edges — a
/// spatial wave packet baked directly into the permittivity.
pub fn add_wave_packet(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 7 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let angle = rest[2] * std::f32::consts::PI / 180.0;
        let halfwidth1 = 0.5 * rest[3] / dx;
        let halfwidth2 = 0.5 * rest[4] / dx;
        let wavelength = rest[5];
        let (sin_a, cos_a) = angle.sin_cos();
        let (chi_r, chi_i) = susceptibility(rest[6], rest[7]);

        for j in 0..epsilon.ny() {
            for i in 0..epsilon.nx() {
                let (fi, fj) = (i as Real, j as Real);
                let dist1 = (fi - x0) * sin_a + (fj - y0) * cos_a;
                let dist2 = (fi - x0) * cos_a - (fj - y0) * sin_a;
                if dist1.abs() <= halfwidth1 && dist2.abs() <= halfwidth2 {
                    let tmp = (std::f32::consts::PI * (halfwidth1 - dist1) / wavelength).sin();
                    let amplitude = tmp * tmp;
                    epsilon.add(j, i, chi_r * amplitude);
                    loss.add(j, i, chi_i * amplitude);
                }
            }
        }
        rest = &rest[8..];
    }
}

/// `(x_focus, y_focus, dist_scale, radius_left, radius_right, thickness,
/// nr, ni)` repeating. A parabolic dish surface: one filled column per `i`
/// from `x_focus - radius_left` to `x_focus + radius_right`, the column
/// spanning `thickness` cells downward from the parabola's sag.
pub fn add_dish(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 7 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let dist = rest[2] / dx;
        let radius_left = rest[3] / dx;
        let radius_right = rest[4] / dx;
        let thickness = rest[5] / dx;
        let (chi_r, chi_i) = susceptibility(rest[6], rest[7]);

        let i_start = (x0 - radius_left) as i64;
        let i_end_bound = x0 + radius_right;
        let mut i = i_start;
        while (i as Real) <= i_end_bound {
            if i >= 0 && i < epsilon.nx() as i64 {
                let di = i as Real - x0;
                let k = (y0 + (0.25 * di * di / dist - dist)) as i64;
                let mut j = k;
                while (j as Real) > k as Real - thickness {
                    if j >= 0 && j < epsilon.ny() as i64 {
                        epsilon.add(j as usize, i as usize, chi_r);
                        loss.add(j as usize, i as usize, chi_i);
                    }
                    j -= 1;
                }
            }
            i += 1;
        }
        rest = &rest[8..];
    }
}

/// `(x_bl, y_bl, x_tr, y_tr, nr, ni)` repeating. An axis-aligned filled
/// rectangle between two corner points, clipped to the domain cell by cell.
pub fn add_rectangle(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 5 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let x1 = rest[2] / dx + nx / 2.0;
        let y1 = rest[3] / dx + ny / 2.0;
        let (chi_r, chi_i) = susceptibility(rest[4], rest[5]);

        let mut i = x0 as i64;
        while (i as Real) <= x1 {
            if i >= 0 && i < epsilon.nx() as i64 {
                let mut j = y0 as i64;
                while (j as Real) <= y1 {
                    if j >= 0 && j < epsilon.ny() as i64 {
                        epsilon.add(j as usize, i as usize, chi_r);
                        loss.add(j as usize, i as usize, chi_i);
                    }
                    j += 1;
                }
            }
            i += 1;
        }
        rest = &rest[6..];
    }
}

/// `(x0, y0, radcurv, radius, nr, ni)` repeating. A plano-convex lens: one
/// filled column per `i` in `[x0-radius, x0+radius]`, each column spanning
/// `thickness` cells upward from `y0`, `thickness` set by the spherical
/// surface sag `2+radcurv-sqrt(radcurv^2-radius^2+(i-x0)^2)`.
pub fn add_lens(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 5 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let radcurv = rest[2] / dx;
        let radius = rest[3] / dx;
        let (chi_r, chi_i) = susceptibility(rest[4], rest[5]);

        let i_start = (x0 - radius) as i64;
        let i_end_bound = x0 + radius;
        let mut i = i_start;
        while (i as Real) <= i_end_bound {
            let di = i as Real - x0;
            let thickness =
                (2.0 + radcurv - (radcurv * radcurv - radius * radius + di * di).sqrt()) as i64;
            if i >= 0 && i < epsilon.nx() as i64 {
                let j_start = (y0 as i64) - thickness;
                let mut j = j_start;
                while (j as Real) < y0 {
                    if j >= 0 && j < epsilon.ny() as i64 {
                        epsilon.add(j as usize, i as usize, chi_r);
                        loss.add(j as usize, i as usize, chi_i);
                    }
                    j += 1;
                }
            }
            i += 1;
        }
        rest = &rest[6..];
    }
}

/// `(x_bl, y_bl, x_tr, y_tr, x_c, y_c, radius, nr, ni)` repeating. A
/// rectangular block with a circular region excluded: filled everywhere in
/// the rectangle except inside the circle of `radius` centered at
/// `(x_c, y_c)`.
pub fn add_cavity(epsilon: &mut Grid, loss: &mut Grid, dx: Real, params: &[Real]) {
    let nx = epsilon.nx() as Real;
    let ny = epsilon.ny() as Real;
    let mut rest = params;
    while rest.len() > 8 {
        let x0 = rest[0] / dx + nx / 2.0;
        let y0 = rest[1] / dx + ny / 2.0;
        let x1 = rest[2] / dx + nx / 2.0;
        let y1 = rest[3] / dx + ny / 2.0;
        let xc = rest[4] / dx + nx / 2.0;
        let yc = rest[5] / dx + ny / 2.0;
        let radius = rest[6] / dx;
        let radius2 = radius * radius;
        let (chi_r, chi_i) = susceptibility(rest[7], rest[8]);

        let mut i = x0 as i64;
        while (i as Real) <= x1 {
            if i >= 0 && i < epsilon.nx() as i64 {
                let mut j = y0 as i64;
                while (j as Real) <= y1 {
                    if j >= 0 && j < epsilon.ny() as i64 {
                        let (fi, fj) = (i as Real, j as Real);
                        if (xc - fi) * (xc - fi) + (yc - fj) * (yc - fj) > radius2 {
                            epsilon.add(j as usize, i as usize, chi_r);
                            loss.add(j as usize, i as usize, chi_i);
                        }
                    }
                    j += 1;
                }
            }
            i += 1;
        }
        rest = &rest[9..];
    }
}

/// Dispatch to a named shape painter by the configuration key it was
/// declared under. Unknown names are a configuration error: everywhere else
/// in this module, an out-of-range or malformed tuple is silently dropped,
/// but an unrecognized shape name means the scene description itself doesn't
/// match this build, which is worth surfacing.
pub fn paint_shape(
    name: &str,
    epsilon: &mut Grid,
    loss: &mut Grid,
    dx: Real,
    params: &[Real],
) -> Result<(), String> {
    match name {
        "circle" => add_circle(epsilon, loss, dx, params),
        "rectangle" => add_rectangle(epsilon, loss, dx, params),
        "rotated_rectangle" => add_rotated_rectangle(epsilon, loss, dx, params),
        "lens" => add_lens(epsilon, loss, dx, params),
        "dish" => add_dish(epsilon, loss, dx, params),
        "edge" => add_edge(epsilon, loss, dx, params),
        "gradient" => add_gradient(epsilon, dx, params),
        "ripple" => add_ripple(epsilon, dx, params),
        "wave_packet" => add_wave_packet(epsilon, loss, dx, params),
        "cavity" => add_cavity(epsilon, loss, dx, params),
        other => return Err(format!("unknown shape kind: {other}")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grids(n: usize) -> (Grid, Grid) {
        (Grid::new(n, n, 0.0).unwrap(), Grid::new(n, n, 0.0).unwrap())
    }

    #[test]
    fn circle_fills_a_disc_centered_at_origin() {
        let (mut eps, mut loss) = grids(21);
        add_circle(&mut eps, &mut loss, 1.0, &[0.0, 0.0, 5.0, 1.5, 0.1]);
        assert!((eps.get(10, 10) - 0.5).abs() < 1e-5);
        assert!((loss.get(10, 10) - 0.1).abs() < 1e-5);
        assert_eq!(eps.get(0, 0), 0.0);
    }

    #[test]
    fn rectangle_is_additive_across_overlaps() {
        let (mut eps, mut loss) = grids(21);
        // Two identical 10x10 corners-to-corner rectangles around the center.
        add_rectangle(
            &mut eps,
            &mut loss,
            1.0,
            &[-3.0, -3.0, 3.0, 3.0, 2.0, 0.0, -3.0, -3.0, 3.0, 3.0, 2.0, 0.0],
        );
        assert!((eps.get(10, 10) - 2.0).abs() < 1e-5);
        let _ = loss;
    }

    #[test]
    fn truncated_trailing_group_is_dropped() {
        let (mut eps, mut loss) = grids(11);
        // Three numbers: not enough to form a (x0,y0,r,nr,ni) circle group.
        add_circle(&mut eps, &mut loss, 1.0, &[0.0, 0.0, 1.0]);
        assert_eq!(eps.as_slice().iter().sum::<Real>(), 0.0);
    }

    #[test]
    fn rotated_rectangle_at_zero_angle_matches_axis_aligned() {
        let (mut eps, mut loss) = grids(21);
        // angle is the 3rd param: (x0, y0, angle_deg, len1, len2, nr, ni).
        add_rotated_rectangle(&mut eps, &mut loss, 1.0, &[0.0, 0.0, 0.0, 6.0, 4.0, 2.0, 0.0]);
        assert!(eps.get(10, 10) > 0.0);
        assert_eq!(eps.get(10, 18), 0.0);
        let _ = loss;
    }

    #[test]
    fn edge_fills_one_half_plane_only() {
        let (mut eps, mut loss) = grids(11);
        // Horizontal edge through the center: fills j > 5 (cos(0) = 1 term).
        add_edge(&mut eps, &mut loss, 1.0, &[0.0, 0.0, 0.0, 2.0, 0.0]);
        assert_eq!(eps.get(0, 5), 0.0);
        assert!(eps.get(9, 5) > 0.0);
        let _ = loss;
    }

    #[test]
    fn cavity_excludes_the_circular_region() {
        let (mut eps, mut loss) = grids(21);
        add_cavity(
            &mut eps,
            &mut loss,
            1.0,
            &[-8.0, -8.0, 8.0, 8.0, 0.0, 0.0, 3.0, 2.0, 0.0],
        );
        // Center of the excluded circle stays untouched...
        assert_eq!(eps.get(10, 10), 0.0);
        // ...but the rest of the rectangle is filled.
        assert!(eps.get(10, 17) > 0.0);
        let _ = loss;
    }

    #[test]
    fn gradient_ramps_monotonically_and_skips_loss() {
        let (mut eps, mut loss) = grids(21);
        // Horizontal gradient: epsilon increases with i (cos(0)=1 term uses j,
        // so use 90 degrees to ramp along i via the sin term instead).
        add_gradient(&mut eps, 1.0, &[0.0, 0.0, 90.0, 0.0, 1.0, 5.0]);
        assert!(eps.get(10, 18) > eps.get(10, 2));
        assert_eq!(loss.as_slice().iter().sum::<Real>(), 0.0);
    }

    #[test]
    fn lens_is_thickest_at_its_center_column() {
        let (mut eps, mut loss) = grids(21);
        add_lens(&mut eps, &mut loss, 1.0, &[0.0, 2.0, 20.0, 6.0, 2.0, 0.0]);
        // A positive-thickness column just below y0 should be filled.
        assert!(eps.get(11, 10) > 0.0);
        let _ = loss;
    }

    #[test]
    fn paint_shape_rejects_unknown_name() {
        let (mut eps, mut loss) = grids(5);
        let result = paint_shape("triangle", &mut eps, &mut loss, 1.0, &[]);
        assert!(result.is_err());
    }
}
