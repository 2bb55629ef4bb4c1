//! Sampled spectral power distributions

use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub};

use crate::{
    cie::{self, BasisComponent},
    Error, Result, Vec3d,
};

/// Number of wavelength bins
pub const SAMPLE_COUNT: usize = 48;
/// Centre of the first bin in nanometers
pub const WAVELENGTH_MIN: f64 = 360.0;
/// Centre of the last bin in nanometers
pub const WAVELENGTH_MAX: f64 = 830.0;
/// Distance between two bin centres in nanometers
pub const WAVELENGTH_STEP: f64 = (WAVELENGTH_MAX - WAVELENGTH_MIN) / (SAMPLE_COUNT - 1) as f64;

/// Reference wavelength where scalar indices of refraction are taken (sodium D line)
pub const REFERENCE_WAVELENGTH: f64 = 589.3;

const BLACKBODY_K1: f64 = 1.1910427585e19;
const BLACKBODY_K2: f64 = 1.4387751602e5;
const WIEN_DISPLACEMENT: f64 = 2.8977721e-3;

/// Selects how an RGB triple is interpreted by [`Spectrum::from_rgb`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RgbClass {
    /// Surface colors. The resulting spectrum is saturated to `[0, 1]`.
    Reflectance,
    /// Light source colors. The resulting spectrum is only kept non-negative.
    Illuminant,
}

/// Intensities on the fixed wavelength grid shared by the whole crate.
///
/// All arithmetic is element-wise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spectrum {
    samples: [f64; SAMPLE_COUNT],
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Spectrum {
    pub const ZERO: Self = Self::splat(0.0);
    pub const ONE: Self = Self::splat(1.0);

    #[must_use]
    pub const fn splat(value: f64) -> Self {
        Self {
            samples: [value; SAMPLE_COUNT],
        }
    }

    #[must_use]
    pub const fn from_array(samples: [f64; SAMPLE_COUNT]) -> Self {
        Self { samples }
    }

    /// Wavelength at the centre of bin `i` in nanometers
    #[must_use]
    pub fn wavelength(i: usize) -> f64 {
        (i as f64).mul_add(WAVELENGTH_STEP, WAVELENGTH_MIN)
    }

    /// Evaluates `f(λ)` at every bin centre
    #[must_use]
    pub fn from_fn(f: impl Fn(f64) -> f64) -> Self {
        Self {
            samples: std::array::from_fn(|i| f(Self::wavelength(i))),
        }
    }

    #[must_use]
    pub const fn samples(&self) -> &[f64; SAMPLE_COUNT] {
        &self.samples
    }

    /// Decomposes `rgb` into the White/Cyan/Magenta/Yellow/Red/Green/Blue basis.
    ///
    /// The smallest channel selects the amount of white, the middle channel the matching
    /// secondary color and the remainder the primary color.
    #[must_use]
    pub fn from_rgb(class: RgbClass, rgb: Vec3d) -> Self {
        use BasisComponent::{Blue, Cyan, Green, Magenta, Red, White, Yellow};

        let rgb = rgb.max(Vec3d::ZERO);
        let (r, g, b) = (rgb.x, rgb.y, rgb.z);
        let part = |component, amount: f64| *cie::basis(component) * amount;

        let result = if r <= g && r <= b {
            if g <= b {
                part(White, r) + part(Cyan, g - r) + part(Blue, b - g)
            } else {
                part(White, r) + part(Cyan, b - r) + part(Green, g - b)
            }
        } else if g <= r && g <= b {
            if r <= b {
                part(White, g) + part(Magenta, r - g) + part(Blue, b - r)
            } else {
                part(White, g) + part(Magenta, b - g) + part(Red, r - b)
            }
        } else if r <= g {
            part(White, b) + part(Yellow, r - b) + part(Green, g - r)
        } else {
            part(White, b) + part(Yellow, g - b) + part(Red, r - g)
        };

        match class {
            RgbClass::Reflectance => result.saturate(0.0, 1.0),
            RgbClass::Illuminant => result.saturate(0.0, f64::MAX),
        }
    }

    /// Resamples measured `(wavelength, value)` pairs onto the grid.
    ///
    /// Every bin receives the average of the piecewise linear interpolant over its 10nm
    /// interval. Outside of the measured range the closest sample is repeated.
    ///
    /// # Errors
    /// [`Error::InvalidSpectrum`] if the slices differ in length, are empty, contain non-finite
    /// numbers or the wavelengths are not strictly increasing.
    pub fn from_samples(wavelengths: &[f64], values: &[f64]) -> Result<Self> {
        if wavelengths.len() != values.len() {
            return Err(Error::InvalidSpectrum(format!(
                "{} wavelengths but {} values",
                wavelengths.len(),
                values.len()
            )));
        }
        if wavelengths.is_empty() {
            return Err(Error::InvalidSpectrum("no samples".into()));
        }
        if wavelengths.iter().chain(values).any(|v| !v.is_finite()) {
            return Err(Error::InvalidSpectrum("non-finite sample".into()));
        }
        if wavelengths.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidSpectrum(
                "wavelengths must be strictly increasing".into(),
            ));
        }
        Ok(Self::resample(wavelengths, values))
    }

    /// [`Spectrum::from_samples`] for data that is known to be well formed
    pub(crate) fn resample(wavelengths: &[f64], values: &[f64]) -> Self {
        Self {
            samples: std::array::from_fn(|i| {
                let center = Self::wavelength(i);
                average_samples(
                    wavelengths,
                    values,
                    center - 0.5 * WAVELENGTH_STEP,
                    center + 0.5 * WAVELENGTH_STEP,
                )
            }),
        }
    }

    /// Spectral radiance of a black body at `temperature` Kelvin (Planck's law)
    #[must_use]
    pub fn from_blackbody(temperature: f64) -> Self {
        Self::from_fn(|lambda| planck(lambda, temperature))
    }

    /// [`Spectrum::from_blackbody`] scaled to `1.0` at the peak wavelength given by Wien's law
    #[must_use]
    pub fn from_blackbody_normalized(temperature: f64) -> Self {
        let peak_lambda = WIEN_DISPLACEMENT / temperature * 1e9;
        Self::from_blackbody(temperature) / planck(peak_lambda, temperature)
    }

    /// Projects onto the CIE 1931 color matching functions
    #[must_use]
    pub fn to_xyz(&self) -> Vec3d {
        let y_integral = *cie::Y_INTEGRAL;
        Vec3d::new(
            self.dot(&cie::X) / y_integral,
            self.dot(&cie::Y) / y_integral,
            self.dot(&cie::Z) / y_integral,
        )
    }

    /// Linear RGB with the primaries of [`cie::XYZ_TO_RGB`]
    #[must_use]
    pub fn to_rgb(&self) -> Vec3d {
        cie::XYZ_TO_RGB * self.to_xyz()
    }

    /// The CIE `Y` component
    #[must_use]
    pub fn luminance(&self) -> f64 {
        self.dot(&cie::Y) / *cie::Y_INTEGRAL
    }

    /// Linear interpolation between the two closest bins
    #[must_use]
    pub fn value_at(&self, wavelength: f64) -> f64 {
        let x = ((wavelength - WAVELENGTH_MIN) / WAVELENGTH_STEP)
            .clamp(0.0, (SAMPLE_COUNT - 1) as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (x.floor() as usize).min(SAMPLE_COUNT - 2);
        let t = x - i as f64;
        self.samples[i].mul_add(1.0 - t, self.samples[i + 1] * t)
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.samples
            .iter()
            .zip(&other.samples)
            .map(|(a, b)| a * b)
            .sum()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    #[must_use]
    pub fn average(&self) -> f64 {
        self.sum() / SAMPLE_COUNT as f64
    }

    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.samples.iter().copied().fold(f64::MIN, f64::max)
    }

    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.samples.iter().copied().fold(f64::MAX, f64::min)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|v| v.is_finite())
    }

    #[must_use]
    pub fn is_black(&self) -> bool {
        self.samples.iter().all(|&v| v == 0.0)
    }

    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            samples: self.samples.map(f),
        }
    }

    #[must_use]
    pub fn saturate(&self, lower: f64, upper: f64) -> Self {
        self.map(|v| v.clamp(lower, upper))
    }

    #[must_use]
    pub fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }
}

/// Planck's law. Wavelengths enter in units of 100nm to keep the powers in range.
fn planck(lambda: f64, temperature: f64) -> f64 {
    let w = lambda / 100.0;
    BLACKBODY_K1 / (w.powi(5) * ((BLACKBODY_K2 / (w * temperature)).exp() - 1.0) * 1e9)
}

fn average_samples(wavelengths: &[f64], values: &[f64], begin: f64, end: f64) -> f64 {
    let count = wavelengths.len();
    if count == 1 || end <= wavelengths[0] {
        return values[0];
    }
    if begin >= wavelengths[count - 1] {
        return values[count - 1];
    }

    let interpolate = |l: f64, i: usize| {
        let t = (l - wavelengths[i]) / (wavelengths[i + 1] - wavelengths[i]);
        values[i].mul_add(1.0 - t, values[i + 1] * t)
    };

    let mut integral = 0.0;
    // the parts of the bin outside the measured range repeat the boundary values
    if begin < wavelengths[0] {
        integral += values[0] * (wavelengths[0] - begin);
    }
    if end > wavelengths[count - 1] {
        integral += values[count - 1] * (end - wavelengths[count - 1]);
    }

    let mut i = 0;
    while i + 2 < count && begin > wavelengths[i + 1] {
        i += 1;
    }
    while i + 1 < count && end > wavelengths[i] {
        let l0 = begin.max(wavelengths[i]);
        let l1 = end.min(wavelengths[i + 1]);
        if l1 > l0 {
            integral += 0.5 * (interpolate(l0, i) + interpolate(l1, i)) * (l1 - l0);
        }
        i += 1;
    }
    integral / (end - begin)
}

impl Index<usize> for Spectrum {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.samples[index]
    }
}

impl IndexMut<usize> for Spectrum {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.samples[index]
    }
}

macro_rules! impl_elementwise {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:tt) => {
        impl $trait for Spectrum {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                Self {
                    samples: std::array::from_fn(|i| self.samples[i] $op rhs.samples[i]),
                }
            }
        }

        impl $assign_trait for Spectrum {
            fn $assign_fn(&mut self, rhs: Self) {
                for (a, b) in self.samples.iter_mut().zip(rhs.samples) {
                    *a = *a $op b;
                }
            }
        }
    };
}

impl_elementwise!(Add, add, AddAssign, add_assign, +);
impl_elementwise!(Mul, mul, MulAssign, mul_assign, *);

impl Sub for Spectrum {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            samples: std::array::from_fn(|i| self.samples[i] - rhs.samples[i]),
        }
    }
}

impl Mul<f64> for Spectrum {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

impl Mul<Spectrum> for f64 {
    type Output = Spectrum;

    fn mul(self, rhs: Spectrum) -> Spectrum {
        rhs * self
    }
}

impl MulAssign<f64> for Spectrum {
    fn mul_assign(&mut self, rhs: f64) {
        for v in &mut self.samples {
            *v *= rhs;
        }
    }
}

impl Div<f64> for Spectrum {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.map(|v| v / rhs)
    }
}

impl DivAssign<f64> for Spectrum {
    fn div_assign(&mut self, rhs: f64) {
        for v in &mut self.samples {
            *v /= rhs;
        }
    }
}

impl std::iter::Sum for Spectrum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_eq_approx, assert_eq_approx_abs, assert_in_range};

    // the basis decomposition smooths saturated colors, greys survive almost unchanged
    const SATURATED_TOLERANCE: f64 = 0.12;
    const GREY_TOLERANCE: f64 = 0.01;

    #[test]
    fn grid_spans_visible_range() {
        assert_eq_approx_abs!(Spectrum::wavelength(0), WAVELENGTH_MIN, 1e-12);
        assert_eq_approx_abs!(Spectrum::wavelength(SAMPLE_COUNT - 1), WAVELENGTH_MAX, 1e-9);
        assert_eq_approx_abs!(WAVELENGTH_STEP, 10.0, 1e-12);
    }

    #[test]
    fn rgb_round_trip_greys() {
        for class in [RgbClass::Reflectance, RgbClass::Illuminant] {
            for v in [0.0, 0.1, 0.5, 0.9, 1.0] {
                let rgb = Vec3d::splat(v);
                let back = Spectrum::from_rgb(class, rgb).to_rgb();
                assert_eq_approx_abs!(back, rgb, Vec3d::splat(GREY_TOLERANCE));
            }
        }
    }

    #[test]
    fn rgb_round_trip_primaries_and_secondaries() {
        let colors = [
            Vec3d::X,
            Vec3d::Y,
            Vec3d::Z,
            Vec3d::new(0.0, 1.0, 1.0),
            Vec3d::new(1.0, 0.0, 1.0),
            Vec3d::new(1.0, 1.0, 0.0),
            Vec3d::new(0.2, 0.4, 0.8),
            Vec3d::new(0.9, 0.2, 0.1),
        ];
        for class in [RgbClass::Reflectance, RgbClass::Illuminant] {
            for rgb in colors {
                let back = Spectrum::from_rgb(class, rgb).to_rgb();
                assert_eq_approx_abs!(
                    back,
                    rgb,
                    Vec3d::splat(SATURATED_TOLERANCE),
                    "{rgb:?} came back as {back:?} ({class:?})"
                );
            }
        }
    }

    #[test]
    fn from_rgb_is_non_negative_and_reflectances_stay_below_one() {
        let mut rd = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let rgb = Vec3d::new(rd.f64() * 3.0 - 1.0, rd.f64() * 3.0 - 1.0, rd.f64() * 3.0 - 1.0);
            let reflectance = Spectrum::from_rgb(RgbClass::Reflectance, rgb);
            let illuminant = Spectrum::from_rgb(RgbClass::Illuminant, rgb);
            assert!(reflectance.min_value() >= 0.0);
            assert!(reflectance.max_value() <= 1.0);
            assert!(illuminant.min_value() >= 0.0);
        }
    }

    #[test]
    fn negative_rgb_is_clamped() {
        let s = Spectrum::from_rgb(RgbClass::Illuminant, Vec3d::new(-1.0, -2.0, -3.0));
        assert!(s.is_black());
    }

    #[test]
    fn flat_spectrum_has_unit_luminance() {
        assert_eq_approx_abs!(Spectrum::ONE.luminance(), 1.0, 1e-12);
        assert_eq_approx_abs!(Spectrum::splat(0.25).luminance(), 0.25, 1e-12);
        assert_eq_approx_abs!(Spectrum::ONE.to_rgb(), Vec3d::ONE, Vec3d::splat(0.01));
    }

    #[test]
    fn blackbody_peak_follows_wien() {
        let s = Spectrum::from_blackbody_normalized(5000.0);
        // peak at ~580nm
        assert_eq_approx_abs!(s.max_value(), 1.0, 1e-3);
        assert_eq_approx_abs!(s.value_at(579.55), 1.0, 1e-3);
        assert!(s[0] < s[20]);
        assert!(s[SAMPLE_COUNT - 1] < s[22]);
    }

    #[test]
    fn blackbody_gets_bluer_when_hotter() {
        let warm = Spectrum::from_blackbody_normalized(2700.0).to_rgb();
        let cold = Spectrum::from_blackbody_normalized(10_000.0).to_rgb();
        assert!(warm.x / warm.z > cold.x / cold.z);
        let hot = Spectrum::from_blackbody(6000.0);
        let cool = Spectrum::from_blackbody(3000.0);
        assert!(hot.luminance() > cool.luminance());
    }

    #[test]
    fn from_samples_reproduces_linear_data() {
        let wavelengths = [300.0, 900.0];
        let values = [0.0, 6.0];
        let s = Spectrum::from_samples(&wavelengths, &values).unwrap();
        for i in 0..SAMPLE_COUNT {
            let expected = (Spectrum::wavelength(i) - 300.0) / 100.0;
            assert_eq_approx!(s[i], expected, 1e-9, 1e-9);
        }
    }

    #[test]
    fn from_samples_extends_boundary_values() {
        let s = Spectrum::from_samples(&[500.0, 600.0], &[2.0, 4.0]).unwrap();
        assert_eq_approx_abs!(s[0], 2.0, 1e-12);
        assert_eq_approx_abs!(s[SAMPLE_COUNT - 1], 4.0, 1e-12);
        // bin 550nm is symmetric around the midpoint
        assert_eq_approx_abs!(s.value_at(550.0), 3.0, 1e-9);
        let single = Spectrum::from_samples(&[550.0], &[0.7]).unwrap();
        assert_eq!(single, Spectrum::splat(0.7));
    }

    #[test]
    fn from_samples_rejects_malformed_data() {
        assert!(Spectrum::from_samples(&[], &[]).is_err());
        assert!(Spectrum::from_samples(&[400.0, 500.0], &[1.0]).is_err());
        assert!(Spectrum::from_samples(&[500.0, 400.0], &[1.0, 2.0]).is_err());
        assert!(Spectrum::from_samples(&[400.0, f64::NAN], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn arithmetic_is_elementwise() {
        let a = Spectrum::from_fn(|l| l);
        let b = Spectrum::splat(2.0);
        let c = a * b + a - a * 0.5;
        for i in 0..SAMPLE_COUNT {
            assert_eq_approx_abs!(c[i], 2.5 * Spectrum::wavelength(i), 1e-9);
        }
        let mut d = a;
        d /= 2.0;
        d *= b;
        assert_eq!(d, a);
        let total: Spectrum = [a, a, a].into_iter().sum();
        assert_eq_approx_abs!(total.average(), 3.0 * a.average(), 1e-9);
        assert_in_range!(a.value_at(365.0), 364.999, 365.001);
    }
}
