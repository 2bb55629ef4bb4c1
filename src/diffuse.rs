//! [Bsdf] of ideal matte surfaces
use std::f64::consts;

use crate::{utils, Bsdf, RandomSample, SampledMaterial, Spectrum, Vec3d};

/// Lambertian reflection. Light is scattered equally into every direction of the hemisphere
/// around the normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diffuse {
    /// Every bin should be in \[0,1\] to preserve physical validity.
    pub albedo: Spectrum,
}

impl Bsdf for Diffuse {
    fn evaluate(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        let n_dot_i = -n.dot(w_i);
        let n_dot_o = n.dot(w_o);
        if n_dot_i <= 0.0 || n_dot_o <= 0.0 {
            return SampledMaterial::invalid(w_o);
        }
        let pdf = n_dot_o / consts::PI;
        // bsdf / pdf cancels exactly, assign it instead of dividing
        SampledMaterial::new(w_o, self.albedo * pdf, self.albedo, pdf)
    }

    fn sample_direction(&self, n: Vec3d, _w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d> {
        Some(utils::sample_cosine_hemisphere(n, sample.bsdf))
    }
}

#[cfg(test)]
mod tests {
    use super::Diffuse;
    use crate::{test_utils, Bsdf, RandomSample, Spectrum, Vec2d, Vec3d};

    fn material() -> Diffuse {
        Diffuse {
            albedo: Spectrum::from_fn(|l| (l - 300.0) / 600.0),
        }
    }

    #[test]
    fn sample_eval() {
        test_utils::test_bsdf_sample_eval(&material());
    }

    #[test]
    fn reciprocity() {
        test_utils::test_bsdf_reciprocity(&material());
    }

    #[test]
    fn pdf_integral() {
        test_utils::test_integrate_pdf(&material());
    }

    #[test]
    fn energy_conservation() {
        let mat = Diffuse {
            albedo: Spectrum::ONE,
        };
        test_utils::test_energy_conservation(&mat, 0.0);
    }

    #[test]
    fn weight_is_exactly_the_albedo() {
        let mat = material();
        let mut rd = fastrand::Rng::with_seed(31);
        let mut valid = 0;
        for _ in 0..10_000 {
            let n = test_utils::spherical_sample(&mut rd);
            let w_i = test_utils::spherical_sample(&mut rd);
            let sample = RandomSample {
                bsdf: Vec2d::new(rd.f64(), rd.f64()),
                ..RandomSample::default()
            };
            let result = mat.sample(n, w_i, &sample);
            if result.valid {
                valid += 1;
                assert_eq!(result.weight, mat.albedo);
            }
        }
        assert!(valid > 4000);
    }

    #[test]
    fn transmission_is_invalid() {
        let mat = material();
        let result = mat.evaluate(Vec3d::Z, Vec3d::new(0.0, 0.6, -0.8), Vec3d::new(0.0, 0.6, -0.8));
        assert!(!result.valid);
        assert!(result.weight.is_black());
        assert_eq!(result.pdf, 0.0);
    }
}
