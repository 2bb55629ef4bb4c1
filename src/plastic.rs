//! [Bsdf] of a diffuse base under a glossy dielectric coating
use std::f64::consts;

use crate::{
    fresnel::{self, Substrate, ThinFilm},
    ggx::Ggx,
    utils, Bsdf, RandomSample, SampledMaterial, Spectrum, Vec3d,
};

/// Mixture of a GGX reflection off the coating and Lambertian scattering of the light the coating
/// lets through. The diffuse part is attenuated by the Fresnel transmittance on the way in and on
/// the way out, which keeps the mixture reciprocal and energy conserving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plastic {
    /// albedo of the base
    pub diffuse: Spectrum,

    /// tint of the coating reflection
    pub specular: Spectrum,

    /// perceived roughness of the coating, `alpha = roughness²`
    pub roughness: f64,

    pub exterior_ior: f64,

    /// index of refraction of the coating
    pub interior_ior: f64,

    /// optional film on top of the coating
    pub thin_film: Option<ThinFilm>,
}

impl Plastic {
    #[must_use]
    pub const fn new(diffuse: Spectrum, roughness: f64, ior: f64) -> Self {
        Self {
            diffuse,
            specular: Spectrum::ONE,
            roughness,
            exterior_ior: 1.0,
            interior_ior: ior,
            thin_film: None,
        }
    }

    #[must_use]
    pub fn with_thin_film(mut self, film: ThinFilm) -> Self {
        self.thin_film = Some(film);
        self
    }

    fn fresnel(&self, cos_i: f64) -> Spectrum {
        match &self.thin_film {
            Some(film) => film.reflectance(
                cos_i,
                self.exterior_ior,
                Substrate::Dielectric(self.interior_ior),
            ),
            None => Spectrum::splat(fresnel::dielectric(
                cos_i,
                self.exterior_ior,
                self.interior_ior,
            )),
        }
    }

    /// Probability of sampling the coating instead of the base
    fn specular_probability(&self, n_dot_i: f64) -> f64 {
        match &self.thin_film {
            Some(_) => self.fresnel(n_dot_i).average(),
            None => fresnel::dielectric(n_dot_i, self.exterior_ior, self.interior_ior),
        }
    }
}

impl Bsdf for Plastic {
    fn evaluate(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        let n_dot_i = -n.dot(w_i);
        let n_dot_o = n.dot(w_o);
        if n_dot_i <= 0.0 || n_dot_o <= 0.0 {
            return SampledMaterial::invalid(w_o);
        }
        let Some(m) = (w_o - w_i).try_normalize() else {
            return SampledMaterial::invalid(w_o);
        };
        let n_dot_m = n.dot(m);
        let m_dot_o = m.dot(w_o);
        if n_dot_m <= 0.0 || m_dot_o <= 0.0 {
            return SampledMaterial::invalid(w_o);
        }

        let ggx = Ggx::from_roughness(self.roughness);
        let d = ggx.ndf(n_dot_m);
        let g = ggx.visibility(n, w_i, w_o, m);
        let f_m = self.fresnel(m_dot_o);
        let transmitted =
            (Spectrum::ONE - self.fresnel(n_dot_i)) * (Spectrum::ONE - self.fresnel(n_dot_o));

        let diffuse_pdf = n_dot_o / consts::PI;
        let specular_pdf = d * n_dot_m / (4.0 * m_dot_o);
        let bsdf = self.diffuse * transmitted * diffuse_pdf
            + self.specular * f_m * (d * g / (4.0 * n_dot_i));

        let p_specular = self.specular_probability(n_dot_i);
        #[allow(clippy::suboptimal_flops)]
        let pdf = (1.0 - p_specular) * diffuse_pdf + p_specular * specular_pdf;
        SampledMaterial::new(w_o, bsdf, bsdf / pdf, pdf)
    }

    fn sample_direction(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d> {
        let n_dot_i = -n.dot(w_i);
        if n_dot_i <= 0.0 {
            return None;
        }
        if sample.component < self.specular_probability(n_dot_i) {
            let m = Ggx::from_roughness(self.roughness).sample_normal(n, sample.bsdf);
            Some(utils::reflect(w_i, m))
        } else {
            Some(utils::sample_cosine_hemisphere(n, sample.bsdf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Plastic;
    use crate::{
        fresnel::ThinFilm,
        test_utils::{self, assert_in_range},
        Bsdf, Spectrum, Vec3d,
    };

    fn material() -> Plastic {
        Plastic::new(Spectrum::from_fn(|l| (830.0 - l) / 500.0), 0.4, 1.5)
    }

    #[test]
    fn sample_eval() {
        test_utils::test_bsdf_sample_eval(&material());
        test_utils::test_bsdf_sample_eval(&material().with_thin_film(ThinFilm {
            thickness: 400.0,
            ior: 1.3,
        }));
    }

    #[test]
    fn reciprocity() {
        test_utils::test_bsdf_reciprocity(&material());
        test_utils::test_bsdf_reciprocity(&material().with_thin_film(ThinFilm {
            thickness: 400.0,
            ior: 1.3,
        }));
    }

    #[test]
    fn pdf_integral() {
        test_utils::test_integrate_pdf(&material());
    }

    #[test]
    fn energy_conservation() {
        let white = Plastic::new(Spectrum::ONE, 0.3, 1.5);
        // the base loses the light that the coating reflects back inside
        test_utils::test_energy_conservation(&white, 0.5);
    }

    #[test]
    fn head_on_light_mostly_scatters_diffusely() {
        let mat = Plastic::new(Spectrum::ONE, 0.3, 1.5);
        let w_i = -Vec3d::Z;
        let w_o = Vec3d::new(0.8, 0.0, 0.6);
        let result = mat.evaluate(Vec3d::Z, w_i, w_o);
        assert!(result.valid);
        // 4% coating reflection at normal incidence
        assert!(mat.specular_probability(1.0) < 0.05);
        let black = Plastic::new(Spectrum::ZERO, 0.3, 1.5).evaluate(Vec3d::Z, w_i, w_o);
        assert!(black.bsdf.average() < result.bsdf.average() * 0.2);
    }

    /// Mean sample weight for light arriving with `cos` to the normal
    fn directional_albedo(mat: &Plastic, cos: f64) -> f64 {
        let mut rd = fastrand::Rng::with_seed(0xa1be);
        let n = Vec3d::Z;
        let w_i = -Vec3d::new((1.0 - cos * cos).sqrt(), 0.0, cos);
        let num_samples = 200_000;
        let sum: f64 = (0..num_samples)
            .map(|_| {
                mat.sample(n, w_i, &test_utils::random_sample(&mut rd))
                    .weight
                    .average()
            })
            .sum();
        sum / f64::from(num_samples)
    }

    #[test]
    fn grazing_light_is_attenuated_not_amplified() {
        let white = Plastic::new(Spectrum::ONE, 0.3, 1.5);
        let head_on = directional_albedo(&white, 1.0);
        let grazing = directional_albedo(&white, 0.1);
        // diffuse light pays the coating transmittance on the way in and on the way out
        assert_in_range!(head_on, 0.88, 0.94);
        assert_in_range!(grazing, 0.65, 0.78);
        for cos in [0.5, 0.2, 0.05] {
            assert!(directional_albedo(&white, cos) <= 1.0);
        }
    }
}
