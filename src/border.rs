//! Absorbing border
//!
//! A simple tapered damping profile applied near the domain perimeter so
//! that outgoing waves do not reflect back off the edges. This replaces a
//! convolutional PML (the teacher's `cpml` module, and the more common
//! choice in the wider FDTD literature) with the reference implementation's
//! much cheaper scheme: a multiplicative `Bdamping` factor, ramped from
//! the edge inward over `border_width` cells, applied to every B update and
//! (for the vacuum twin) every E update too.
//!
//! Grounded directly on `mw_shape.c: mw_reset_damping` in the vendored C
//! source.

use crate::grid::Grid;

/// Write a tapered absorbing-border profile into `bdamping`.
///
/// For each ring `k` in `0..border_width`, cells on perimeter ring `k` get
/// `sqrt((k+1)/(border_width+1))`; everything else keeps the grid's
/// existing value (expected to be `1.0`, set by `Domain::new`). Corners are
/// touched only by the ring loop at their own depth, so they end up with
/// the same value a plain edge cell at that depth would get — there is no
/// separate min-of-two-rings step, the two loops simply never disagree at a
/// shared cell because each `k` only reaches columns/rows `k..n-k`.
pub fn init_border(bdamping: &mut Grid, border_width: usize) {
    let nx = bdamping.nx();
    let ny = bdamping.ny();
    bdamping.reset(1.0);

    for k in 0..border_width {
        if k >= nx || k >= ny {
            break;
        }
        let value = ((k + 1) as f32 / (border_width + 1) as f32).sqrt();

        for i in k..nx.saturating_sub(k) {
            bdamping.set(k, i, value);
            bdamping.set(ny - 1 - k, i, value);
        }
        for j in k..ny.saturating_sub(k) {
            bdamping.set(j, k, value);
            bdamping.set(j, nx - 1 - k, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_stays_unity() {
        let mut g = Grid::new(20, 20, 1.0).unwrap();
        init_border(&mut g, 6);
        assert_eq!(g.get(10, 10), 1.0);
    }

    #[test]
    fn outermost_ring_has_smallest_damping() {
        let mut g = Grid::new(20, 20, 1.0).unwrap();
        init_border(&mut g, 6);
        let outer = g.get(0, 10);
        let inner = g.get(5, 10);
        assert!(outer < inner);
        assert!((outer - (1.0f32 / 7.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn corners_match_their_ring_depth() {
        let mut g = Grid::new(20, 20, 1.0).unwrap();
        init_border(&mut g, 6);
        // Corner (0,0) is only ever touched at k=0.
        assert!((g.get(0, 0) - (1.0f32 / 7.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn handles_tiny_grids_without_panicking() {
        let mut g = Grid::new(3, 3, 1.0).unwrap();
        init_border(&mut g, 6);
        // border_width exceeds the grid; loop must stop, not index OOB.
        assert_eq!(g.nx(), 3);
    }
}
