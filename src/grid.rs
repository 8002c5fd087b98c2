//! Field storage
//!
//! A `Grid` is a flat, row-major Nx x Ny buffer of [`Real`] values addressed
//! by `(row, col)`. Every field carried by a [`crate::domain::Domain`] shares
//! the same `(nx, ny)` for its lifetime (invariant I1 of the data model).
//!
//! This replaces the row-pointer-of-pointers layout of the C source
//! (`real **`, built from `malloc` of a pointer array over one contiguous
//! block in `mw_alloc.c`) with a single owned buffer and a cheap index
//! accessor, per DESIGN NOTES: "no pointer-to-pointer indirection."

use crate::error::{SimError, SimResult};

/// The crate-wide numeric type. Single-precision per spec; mixing
/// precisions across grids is not supported.
pub type Real = f32;

/// A flat Nx x Ny grid of [`Real`] values, addressed `[row][col]` i.e.
/// `(j, i)` with `j` increasing in y and `i` in x.
#[derive(Clone, Debug)]
pub struct Grid {
    nx: usize,
    ny: usize,
    data: Vec<Real>,
}

impl Grid {
    /// Allocate an Nx x Ny grid with every cell set to `value`.
    pub fn new(nx: usize, ny: usize, value: Real) -> SimResult<Self> {
        let size = nx
            .checked_mul(ny)
            .ok_or_else(|| SimError::AllocationFailed(format!("{nx}x{ny} grid overflows usize")))?;
        Ok(Grid {
            nx,
            ny,
            data: vec![value; size],
        })
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    fn index(&self, j: usize, i: usize) -> usize {
        debug_assert!(j < self.ny && i < self.nx);
        j * self.nx + i
    }

    #[inline]
    pub fn get(&self, j: usize, i: usize) -> Real {
        self.data[self.index(j, i)]
    }

    #[inline]
    pub fn set(&mut self, j: usize, i: usize, value: Real) {
        let idx = self.index(j, i);
        self.data[idx] = value;
    }

    #[inline]
    pub fn add(&mut self, j: usize, i: usize, value: Real) {
        let idx = self.index(j, i);
        self.data[idx] += value;
    }

    /// Read-only access to the underlying flat buffer (row-major).
    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Mutable access to the underlying flat buffer (row-major).
    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Reset every cell to `value`.
    pub fn reset(&mut self, value: Real) {
        self.data.fill(value);
    }

    /// Element-wise `self = a - b`. Panics if shapes mismatch.
    pub fn subtract_into(&mut self, a: &Grid, b: &Grid) {
        assert_eq!((a.nx, a.ny), (b.nx, b.ny));
        assert_eq!((a.nx, a.ny), (self.nx, self.ny));
        for k in 0..self.data.len() {
            self.data[k] = a.data[k] - b.data[k];
        }
    }

    /// In-place scalar scaling of every cell.
    pub fn scale(&mut self, factor: Real) {
        for v in self.data.iter_mut() {
            *v *= factor;
        }
    }

    /// Sum of squares over every cell (used for energy bookkeeping).
    pub fn sum_of_squares(&self) -> Real {
        self.data.iter().fold(0.0, |acc, v| acc + v * v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_constant() {
        let g = Grid::new(4, 3, 2.0).unwrap();
        assert_eq!(g.nx(), 4);
        assert_eq!(g.ny(), 3);
        for j in 0..3 {
            for i in 0..4 {
                assert_eq!(g.get(j, i), 2.0);
            }
        }
    }

    #[test]
    fn reset_overwrites_all_cells() {
        let mut g = Grid::new(3, 3, 1.0).unwrap();
        g.set(1, 1, 9.0);
        g.reset(0.0);
        for j in 0..3 {
            for i in 0..3 {
                assert_eq!(g.get(j, i), 0.0);
            }
        }
    }

    #[test]
    fn subtract_into_is_elementwise() {
        let a = Grid::new(2, 2, 5.0).unwrap();
        let b = Grid::new(2, 2, 2.0).unwrap();
        let mut out = Grid::new(2, 2, 0.0).unwrap();
        out.subtract_into(&a, &b);
        for j in 0..2 {
            for i in 0..2 {
                assert_eq!(out.get(j, i), 3.0);
            }
        }
    }

    #[test]
    fn scale_multiplies_every_cell() {
        let mut g = Grid::new(2, 2, 4.0).unwrap();
        g.scale(0.5);
        assert_eq!(g.get(0, 0), 2.0);
    }
}
