pub trait ApproxEqual: Copy {
    fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool;
    fn equals_approx_abs(self, other: Self, eps: Self) -> bool;
}

macro_rules! assert_eq_approx {
    ($lhs:expr, $rhs:expr, $eps_abs:expr, $eps_rel:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel),
            r#"assert_eq_approx failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}
    {} (maximum relative error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
            stringify!($eps_rel),
            $eps_rel,
        );
    };

    ($lhs:expr, $rhs:expr, $eps_abs: expr, $eps_rel:expr, $($arg:tt)+) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel),
            $($arg)*
        );
    }
}

macro_rules! assert_eq_approx_abs {
    ($lhs:expr, $rhs:expr, $eps_abs:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
            r#"assert_eq_abs failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
        )
    };

    ($lhs:expr, $rhs:expr, $eps_abs:expr, $($arg:tt)+) => {
        assert!($crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
        $($arg)*);
    };
}

macro_rules! assert_in_range {
    ($value:expr, $lower:expr, $upper:expr) => {
        assert!(
            $lower <= $value && $value <= $upper,
            r#"assert_in_range failed:
    {} (value): {:?}
    {} (lower bound): {:?}
    {} (upper bound): {:?}"#,
            stringify!($value),
            $value,
            stringify!($lower),
            $lower,
            stringify!($upper),
            $upper
        )
    };
}

impl ApproxEqual for f64 {
    fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool {
        #[allow(clippy::float_cmp)]
        if self == other || (self - other).abs() <= eps {
            true
        } else {
            let diff = (self - other).abs();
            let max = self.abs().max(other.abs());
            diff <= max * eps_rel
        }
    }

    fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
        #[allow(clippy::float_cmp)]
        if self == other {
            true
        } else {
            (self - other).abs() <= eps
        }
    }
}

impl ApproxEqual for Vec3d {
    fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
        (0..3).all(|i| self[i].equals_approx_abs(other[i], eps[i]))
    }
    fn equals_approx(self, other: Self, eps_abs: Self, eps_rel: Self) -> bool {
        (0..3).all(|i| self[i].equals_approx(other[i], eps_abs[i], eps_rel[i]))
    }
}

impl ApproxEqual for Spectrum {
    fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
        (0..SAMPLE_COUNT).all(|i| self[i].equals_approx_abs(other[i], eps[i]))
    }
    fn equals_approx(self, other: Self, eps_abs: Self, eps_rel: Self) -> bool {
        (0..SAMPLE_COUNT).all(|i| self[i].equals_approx(other[i], eps_abs[i], eps_rel[i]))
    }
}

use std::f64::consts;

pub(crate) use assert_eq_approx;
pub(crate) use assert_eq_approx_abs;
pub(crate) use assert_in_range;

use crate::{
    spectrum::SAMPLE_COUNT, utils::FloatExt, Bsdf, RandomSample, Spectrum, Vec2d, Vec3d,
};

/** sample a direction with density 1 / 4pi */
pub fn spherical_sample(rd: &mut fastrand::Rng) -> Vec3d {
    let u = rd.f64();
    let v = rd.f64();
    spherical_sample_uv(u, v)
}

fn spherical_sample_uv(u: f64, v: f64) -> Vec3d {
    #[allow(clippy::suboptimal_flops)]
    let cos_theta = 2.0 * u - 1.0;
    #[allow(clippy::suboptimal_flops)]
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = v * 2.0 * consts::PI;
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(sin_theta * sin_phi, sin_theta * cos_phi, cos_theta)
}

/// Random numbers for a single bsdf sample
pub fn random_sample(rd: &mut fastrand::Rng) -> RandomSample {
    RandomSample {
        bsdf: Vec2d::new(rd.f64(), rd.f64()),
        component: rd.f64(),
        ..RandomSample::default()
    }
}

/// A direction arriving at the surface around `n`, at least `min_cos` away from grazing
fn arriving_sample(rd: &mut fastrand::Rng, n: Vec3d, min_cos: f64) -> Vec3d {
    loop {
        let w = spherical_sample(rd);
        let cos = w.dot(n);
        if cos.abs() >= min_cos {
            return if cos > 0.0 { -w } else { w };
        }
    }
}

/// Mean and standard error from the running sums of a sample and its square
#[allow(clippy::cast_precision_loss)]
fn mean_and_error(sum: f64, sum2: f64, num_samples: usize) -> (f64, f64) {
    let n = num_samples as f64;
    let mean = sum / n;
    let variance = (sum2 / n - mean.sq()).max(0.0) * n / (n - 1.0);
    (mean, (variance / n).sqrt())
}

/// Checks that the throughput weight of importance sampled directions does not create energy
/// for light arriving from above the surface `Vec3d::Z`.
pub fn test_energy_conservation<T: Bsdf>(material: &T, allowed_energy_loss: f64) {
    let mut rd = fastrand::Rng::with_seed(0x5eed);
    let runs = 20;
    let num_samples = 50_000;
    let n = Vec3d::Z;
    for i in 0..runs {
        let w_i = arriving_sample(&mut rd, n, 0.1);
        let mut sum = 0.0;
        let mut sum2 = 0.0;
        for _ in 0..num_samples {
            let sample = material.sample(n, w_i, &random_sample(&mut rd));
            if sample.valid {
                let contrib = sample.weight.average();
                sum += contrib;
                sum2 += contrib.sq();
            }
        }
        let (mean, std_error) = mean_and_error(sum, sum2, num_samples);
        let confidence = (4.0 * std_error).max(1e-3);
        assert!(
            1.0 - confidence - allowed_energy_loss <= mean && mean <= 1.0 + confidence,
            r#"
    energy out of range
    mean: {mean},
    confidence: {confidence},
    allowed_energy_loss: {allowed_energy_loss},
    w_i: {w_i:?},
    i: {i}"#
        );
    }
}

/// Every sampled direction must evaluate to exactly what the sample returned and its weight must
/// be `bsdf / pdf`.
pub fn test_bsdf_sample_eval<T: Bsdf>(material: &T) {
    let mut rd = fastrand::Rng::with_seed(0xe7a1);
    let runs = 10000;
    let mut valid = 0;
    for _ in 0..runs {
        let n = spherical_sample(&mut rd);
        let w_i = spherical_sample(&mut rd);
        let sampled = material.sample(n, w_i, &random_sample(&mut rd));
        if !sampled.valid {
            assert!(sampled.weight.is_black());
            assert_eq!(sampled.pdf, 0.0);
            continue;
        }
        valid += 1;
        let evaluated = material.evaluate(n, w_i, sampled.direction);
        assert!(evaluated.valid);
        assert_eq_approx!(
            sampled.pdf,
            evaluated.pdf,
            1e-9,
            1e-6,
            r#"
    PDFs must be equal for sample and evaluate,
    pdf: {},
    evaluated: {},
    w_i: {w_i:?},
    w_o: {:?}"#,
            sampled.pdf,
            evaluated.pdf,
            sampled.direction
        );
        assert_eq_approx!(
            sampled.bsdf,
            evaluated.bsdf,
            Spectrum::splat(1e-9),
            Spectrum::splat(1e-6)
        );
        assert_eq_approx!(
            sampled.weight,
            sampled.bsdf / sampled.pdf,
            Spectrum::splat(1e-9),
            Spectrum::splat(1e-6)
        );
        assert!(sampled.pdf > 0.0);
        assert!(sampled.bsdf.min_value() >= 0.0);
        assert!(sampled.weight.min_value() >= 0.0);
    }
    assert!(valid > runs / 10, "only {valid} of {runs} samples were valid");
}

/// `f(w_i -> w_o) = f(-w_o -> -w_i)`, compared on the cosine weighted values that
/// [`Bsdf::evaluate`] returns.
pub fn test_bsdf_reciprocity<T: Bsdf>(material: &T) {
    test_bsdf_reciprocity_refractive(material, 1.0, 1.0);
}

/// Reciprocity of a BSDF that refracts between `exterior_ior` (around `n`) and `interior_ior`.
/// Transmission is reciprocal after dividing by the squared index of the side the light ends
/// up in.
pub fn test_bsdf_reciprocity_refractive<T: Bsdf>(
    material: &T,
    exterior_ior: f64,
    interior_ior: f64,
) {
    let ior = |cos: f64| {
        if cos > 0.0 {
            exterior_ior
        } else {
            interior_ior
        }
    };
    let mut rd = fastrand::Rng::with_seed(0x7ec1);
    let runs = 10000;
    let n = Vec3d::Z;
    for _ in 0..runs {
        let w_i = spherical_sample(&mut rd);
        let w_o = spherical_sample(&mut rd);

        let forward = material.evaluate(n, w_i, w_o);
        let reverse = material.evaluate(n, -w_o, -w_i);
        assert_eq!(forward.valid, reverse.valid, "w_i: {w_i:?}, w_o: {w_o:?}");
        assert!(forward.pdf >= 0.0, "the pdf should never be negative");
        assert!(
            forward.bsdf.min_value() >= 0.0,
            "the bsdf should never be negative"
        );

        let forward_norm = forward.bsdf * (w_i.z.abs() / ior(w_o.z).sq());
        let reverse_norm = reverse.bsdf * (w_o.z.abs() / ior(-w_i.z).sq());
        assert_eq_approx!(
            forward_norm,
            reverse_norm,
            Spectrum::splat(1e-6),
            Spectrum::splat(1e-4),
            r#"
    - forward_norm: {forward_norm:?},
    - reverse_norm: {reverse_norm:?},
    - w_i: {w_i:?},
    - w_o: {w_o:?},
    "#
        );
    }
}

/// Integrates the pdf over the sphere and compares it with the fraction of valid samples.
/// Both are the probability that sampling yields a usable direction.
#[allow(clippy::cast_precision_loss)]
pub fn test_integrate_pdf<T: Bsdf>(material: &T) {
    const DOMAIN: f64 = 4.0 * consts::PI;

    let mut rd = fastrand::Rng::with_seed(0x1d7);
    let runs = 20;
    let num_samples = 200_000;
    let n = Vec3d::Z;
    for i in 0..runs {
        let w_i = arriving_sample(&mut rd, n, 0.05);

        let mut sum = 0.0;
        let mut sum2 = 0.0;
        let mut valid = 0usize;
        for _ in 0..num_samples {
            let pdf = material.evaluate(n, w_i, spherical_sample(&mut rd)).pdf * DOMAIN;
            sum += pdf;
            sum2 += pdf.sq();
            if material.sample(n, w_i, &random_sample(&mut rd)).valid {
                valid += 1;
            }
        }
        let (integral, std_error) = mean_and_error(sum, sum2, num_samples);
        let fraction = valid as f64 / num_samples as f64;
        let fraction_error = (fraction * (1.0 - fraction) / num_samples as f64).sqrt();
        let confidence = 4.0 * std_error.hypot(fraction_error) + 1e-3;

        assert_eq_approx_abs!(
            integral,
            fraction,
            confidence,
            r#"
    expected the pdf to integrate to the fraction of valid samples
    integral: {integral},
    fraction: {fraction},
    confidence: {confidence},
    w_i: {w_i:?}
    i: {i}"#
        );
        assert!(integral <= 1.0 + confidence);
    }
}
