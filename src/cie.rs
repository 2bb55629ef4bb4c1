//! Read-only colorimetric data: the CIE 1931 color matching functions, the RGB to spectrum basis
//! and the XYZ to RGB matrix.
//!
//! All tables are immutable. The sampled versions are built once on first use through
//! [`LazyLock`] and shared by every thread afterwards.
#![allow(clippy::unreadable_literal, clippy::excessive_precision)]

use std::sync::LazyLock;

use glam::DMat3;

use crate::Spectrum;

/// Piecewise gaussian with a different width left and right of the mean
fn lobe(lambda: f64, mean: f64, sigma_below: f64, sigma_above: f64) -> f64 {
    let sigma = if lambda < mean {
        sigma_below
    } else {
        sigma_above
    };
    let t = (lambda - mean) / sigma;
    (-0.5 * t * t).exp()
}

/// CIE 1931 2° `x̄(λ)` after Wyman, Sloan and Shirley
#[must_use]
pub fn x_bar(lambda: f64) -> f64 {
    1.056 * lobe(lambda, 599.8, 37.9, 31.0) + 0.362 * lobe(lambda, 442.0, 16.0, 26.7)
        - 0.065 * lobe(lambda, 501.1, 20.4, 26.2)
}

/// CIE 1931 2° `ȳ(λ)` after Wyman, Sloan and Shirley
#[must_use]
pub fn y_bar(lambda: f64) -> f64 {
    0.821 * lobe(lambda, 568.8, 46.9, 40.5) + 0.286 * lobe(lambda, 530.9, 16.3, 31.1)
}

/// CIE 1931 2° `z̄(λ)` after Wyman, Sloan and Shirley
#[must_use]
pub fn z_bar(lambda: f64) -> f64 {
    1.217 * lobe(lambda, 437.0, 11.8, 36.0) + 0.681 * lobe(lambda, 459.0, 26.0, 13.8)
}

pub static X: LazyLock<Spectrum> = LazyLock::new(|| Spectrum::from_fn(x_bar));
pub static Y: LazyLock<Spectrum> = LazyLock::new(|| Spectrum::from_fn(y_bar));
pub static Z: LazyLock<Spectrum> = LazyLock::new(|| Spectrum::from_fn(z_bar));

/// Discrete integral of [`Y`]. Dividing by it maps a flat unit spectrum to `Y = 1`.
pub static Y_INTEGRAL: LazyLock<f64> = LazyLock::new(|| Y.sum());

/// Linear sRGB primaries with an equal energy white point, so that a flat spectrum is neutral
pub const XYZ_TO_RGB: DMat3 = DMat3::from_cols_array(&[
    2.6896551724137936,
    -1.0221081721279117,
    0.06122448979591841,
    -1.2758620689655176,
    1.978286616660087,
    -0.22448979591836735,
    -0.41379310344827586,
    0.04382155546782472,
    1.163265306122449,
]);

/// The seven canonical spectra of the RGB to spectrum decomposition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasisComponent {
    White,
    Cyan,
    Magenta,
    Yellow,
    Red,
    Green,
    Blue,
}

const BASIS_BINS: usize = 10;
const BASIS_BEGIN: f64 = 380.0;
const BASIS_END: f64 = 720.0;

// Smits, "An RGB-to-spectrum conversion for reflectances"
const BASIS_WHITE: [f64; BASIS_BINS] = [
    1.0000, 1.0000, 0.9999, 0.9993, 0.9992, 0.9998, 1.0000, 1.0000, 1.0000, 1.0000,
];
const BASIS_CYAN: [f64; BASIS_BINS] = [
    0.9710, 0.9426, 1.0007, 1.0007, 1.0007, 1.0007, 0.1564, 0.0000, 0.0000, 0.0000,
];
const BASIS_MAGENTA: [f64; BASIS_BINS] = [
    1.0000, 1.0000, 0.9685, 0.2229, 0.0000, 0.0458, 0.8369, 1.0000, 1.0000, 0.9959,
];
const BASIS_YELLOW: [f64; BASIS_BINS] = [
    0.0001, 0.0000, 0.1088, 0.6651, 1.0000, 1.0000, 0.9996, 0.9586, 0.9685, 0.9840,
];
const BASIS_RED: [f64; BASIS_BINS] = [
    0.1012, 0.0515, 0.0000, 0.0000, 0.0000, 0.0000, 0.8325, 1.0149, 1.0149, 1.0149,
];
const BASIS_GREEN: [f64; BASIS_BINS] = [
    0.0000, 0.0000, 0.0273, 0.7937, 1.0000, 0.9418, 0.1719, 0.0000, 0.0000, 0.0025,
];
const BASIS_BLUE: [f64; BASIS_BINS] = [
    1.0000, 1.0000, 0.8916, 0.3323, 0.0000, 0.0000, 0.0003, 0.0369, 0.0483, 0.0496,
];

fn resample_basis(table: &[f64; BASIS_BINS]) -> Spectrum {
    let step = (BASIS_END - BASIS_BEGIN) / (BASIS_BINS - 1) as f64;
    Spectrum::from_fn(|lambda| {
        let x = ((lambda - BASIS_BEGIN) / step).clamp(0.0, (BASIS_BINS - 1) as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (x.floor() as usize).min(BASIS_BINS - 2);
        let t = x - i as f64;
        table[i] * (1.0 - t) + table[i + 1] * t
    })
}

static BASIS: LazyLock<[Spectrum; 7]> = LazyLock::new(|| {
    [
        resample_basis(&BASIS_WHITE),
        resample_basis(&BASIS_CYAN),
        resample_basis(&BASIS_MAGENTA),
        resample_basis(&BASIS_YELLOW),
        resample_basis(&BASIS_RED),
        resample_basis(&BASIS_GREEN),
        resample_basis(&BASIS_BLUE),
    ]
});

/// Returns one of the canonical spectra resampled onto the global wavelength grid
#[must_use]
pub fn basis(component: BasisComponent) -> &'static Spectrum {
    &BASIS[component as usize]
}

/// Forces every table to be built. Useful before timing a render.
pub fn initialize() {
    LazyLock::force(&X);
    LazyLock::force(&Y);
    LazyLock::force(&Z);
    LazyLock::force(&Y_INTEGRAL);
    LazyLock::force(&BASIS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_eq_approx_abs;

    #[test]
    fn matching_functions_peak_where_expected() {
        assert_eq_approx_abs!(y_bar(555.0), 1.0, 0.02);
        assert!(x_bar(600.0) > x_bar(500.0));
        assert!(z_bar(450.0) > 1.5);
        assert_eq_approx_abs!(y_bar(830.0), 0.0, 1e-3);
    }

    #[test]
    fn flat_spectrum_is_close_to_equal_energy() {
        let x = X.sum() / *Y_INTEGRAL;
        let z = Z.sum() / *Y_INTEGRAL;
        assert_eq_approx_abs!(x, 1.0, 0.01);
        assert_eq_approx_abs!(z, 1.0, 0.01);
    }

    #[test]
    fn white_point_maps_to_neutral_rgb() {
        let rgb = XYZ_TO_RGB * crate::Vec3d::ONE;
        assert_eq_approx_abs!(rgb, crate::Vec3d::ONE, crate::Vec3d::splat(1e-9));
    }

    #[test]
    fn basis_is_clamped_outside_its_range() {
        let red = basis(BasisComponent::Red);
        assert_eq_approx_abs!(red.value_at(360.0), 0.1012, 1e-9);
        assert_eq_approx_abs!(red.value_at(830.0), 1.0149, 1e-9);
        assert_eq_approx_abs!(basis(BasisComponent::White).value_at(550.0), 0.9992, 2e-3);
    }
}
