//! Refractive-index to susceptibility conversion, and material presets
//!
//! Every shape rasterizer in [`crate::shapes`] takes a complex refractive
//! index `(nr, ni)` and *adds* a susceptibility to the cells it covers:
//! `epsilon += chi_r`, `sigma += chi_i`. `chi_r`/`chi_i` both come from this
//! module's [`susceptibility`] function.
//!
//! The C source (`mw_math.c`) carries a commented-out Clausius-Mosotti
//! relation (`xi = 3(n^2-1)/(n^2+2)`) and an active linear rule
//! (`xir = nr-1, xii = ni`). This crate keeps the linear rule active, per
//! DESIGN NOTES §9(b): it does not converge to the correct low-frequency
//! scattering cross-section for large `n`, and that approximation is
//! intentional, not a bug to silently fix. Unlike the C source (which
//! passes `ni` straight through, sign and all), the loss susceptibility is
//! clamped non-negative here, matching the documented rule `chi_i = |ni|`
//! and the `Edamping` grid's role as an attenuation input (a negative loss
//! would amplify the wave instead of damping it).

use crate::grid::Real;

/// Convert a complex refractive index `(nr, ni)` to the susceptibility
/// `(chi_r, chi_i)` added to `epsilon` and the loss grid respectively.
pub fn susceptibility(nr: Real, ni: Real) -> (Real, Real) {
    (nr - 1.0, ni.abs())
}

/// A named (nr, ni) preset, for callers building shape parameter tuples
/// without hard-coding index values inline — mirrors the teacher's
/// `MaterialPresets`, generalized from discrete material IDs to the
/// continuous refractive-index parameterization the shape library expects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialPreset {
    pub nr: Real,
    pub ni: Real,
}

impl MaterialPreset {
    pub const VACUUM: MaterialPreset = MaterialPreset { nr: 1.0, ni: 0.0 };
    pub const GLASS: MaterialPreset = MaterialPreset { nr: 1.5, ni: 0.0 };
    pub const WATER: MaterialPreset = MaterialPreset {
        nr: 1.33,
        ni: 0.01,
    };
    pub const SILICON: MaterialPreset = MaterialPreset {
        nr: 3.42,
        ni: 0.0,
    };
    pub const CRYSTAL: MaterialPreset = MaterialPreset { nr: 2.0, ni: 0.0 };
    /// Near-perfect conductor: very large loss, used e.g. by the dish
    /// antenna scenario (`epsilon_r` ~ 1000 with negligible `ni`).
    pub const ABSORBER: MaterialPreset = MaterialPreset { nr: 1.0, ni: 2.0 };

    /// Susceptibility contributed by this preset.
    pub fn susceptibility(self) -> (Real, Real) {
        susceptibility(self.nr, self.ni)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacuum_preset_contributes_nothing() {
        let (chi_r, chi_i) = MaterialPreset::VACUUM.susceptibility();
        assert_eq!(chi_r, 0.0);
        assert_eq!(chi_i, 0.0);
    }

    #[test]
    fn loss_susceptibility_is_magnitude() {
        let (_, chi_i) = susceptibility(1.5, -0.3);
        assert!((chi_i - 0.3).abs() < 1e-6);
    }

    #[test]
    fn glass_raises_epsilon_by_half() {
        let (chi_r, _) = MaterialPreset::GLASS.susceptibility();
        assert!((chi_r - 0.5).abs() < 1e-6);
    }
}
