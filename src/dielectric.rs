//! [Bsdf] of rough glass, water and other transparent interfaces
use crate::{
    fresnel,
    ggx::Ggx,
    spectrum::REFERENCE_WAVELENGTH,
    utils::{self, FloatExt},
    Bsdf, RandomSample, SampledMaterial, Spectrum, Vec3d,
};

/// Reflection and refraction through a rough interface between two dielectrics.
///
/// The geometric normal points into the exterior medium. Light arriving from behind the surface
/// is exiting the interior, the normal and the indices of refraction are swapped for it.
///
/// # Mathematical background
/// * [Microfacet Models for Refraction through Rough Surfaces](https://www.cs.cornell.edu/~srm/publications/EGSR07-btdf.pdf)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dielectric {
    /// tint of the reflected light
    pub specular: Spectrum,

    /// tint of the refracted light
    pub transmittance: Spectrum,

    /// perceived roughness, `alpha = roughness²`
    pub roughness: f64,

    pub exterior_ior: Spectrum,
    pub interior_ior: Spectrum,

    /// widen the lobe for grazing views, see [`Ggx::from_remapped`]. Breaks reciprocity.
    pub remap_roughness: bool,
}

/// The interface as seen from the incident ray
struct Side {
    n: Vec3d,
    eta_i: f64,
    eta_o: f64,
}

impl Dielectric {
    /// Clear glass with a constant index of refraction in vacuum
    #[must_use]
    pub const fn new(roughness: f64, ior: f64) -> Self {
        Self {
            specular: Spectrum::ONE,
            transmittance: Spectrum::ONE,
            roughness,
            exterior_ior: Spectrum::ONE,
            interior_ior: Spectrum::splat(ior),
            remap_roughness: false,
        }
    }

    /// Index of refraction of the interior at the sodium D line
    #[must_use]
    pub fn ior(&self) -> f64 {
        self.interior_ior.value_at(REFERENCE_WAVELENGTH)
    }

    fn side(&self, n: Vec3d, w_i: Vec3d) -> Side {
        let exterior = self.exterior_ior.value_at(REFERENCE_WAVELENGTH);
        let interior = self.ior();
        if n.dot(w_i) < 0.0 {
            Side {
                n,
                eta_i: exterior,
                eta_o: interior,
            }
        } else {
            Side {
                n: -n,
                eta_i: interior,
                eta_o: exterior,
            }
        }
    }

    fn ggx(&self, n_dot_i: f64) -> Ggx {
        if self.remap_roughness {
            Ggx::from_remapped(self.roughness, n_dot_i)
        } else {
            Ggx::from_roughness(self.roughness)
        }
    }

    fn reflection(&self, side: &Side, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        let n = side.n;
        let n_dot_i = -n.dot(w_i);
        let Some(m) = (w_o - w_i).try_normalize() else {
            return SampledMaterial::invalid(w_o);
        };
        let n_dot_m = n.dot(m);
        let m_dot_i = -m.dot(w_i);
        let m_dot_o = m.dot(w_o);
        if n_dot_m <= 0.0 || m_dot_i <= 0.0 || m_dot_o <= 0.0 {
            return SampledMaterial::invalid(w_o);
        }

        let ggx = self.ggx(n_dot_i);
        let f = fresnel::dielectric(m_dot_i, side.eta_i, side.eta_o);
        let d = ggx.ndf(n_dot_m);
        let g = ggx.visibility(n, w_i, w_o, m);

        let bsdf = self.specular * (f * d * g / (4.0 * n_dot_i));
        let pdf = f * d * n_dot_m / (4.0 * m_dot_o);
        let weight = self.specular * (g * m_dot_o / (n_dot_i * n_dot_m));
        SampledMaterial::new(w_o, bsdf, weight, pdf)
    }

    fn refraction(&self, side: &Side, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        let n = side.n;
        let n_dot_i = -n.dot(w_i);
        let eta = side.eta_i / side.eta_o;
        // generalized half vector of the refraction
        let Some(mut m) = (w_i * eta - w_o).try_normalize() else {
            return SampledMaterial::invalid(w_o);
        };
        if n.dot(m) < 0.0 {
            m = -m;
        }
        let n_dot_m = n.dot(m);
        let m_dot_i = -m.dot(w_i);
        let m_dot_o = m.dot(w_o);
        if n_dot_m <= 0.0 || m_dot_i <= 0.0 || m_dot_o >= 0.0 {
            return SampledMaterial::invalid(w_o);
        }

        let ggx = self.ggx(n_dot_i);
        let f = fresnel::dielectric(m_dot_i, side.eta_i, side.eta_o);
        let d = ggx.ndf(n_dot_m);
        let g = ggx.visibility(n, w_i, w_o, m);
        // solid angle compression of the refracted microfacet
        #[allow(clippy::suboptimal_flops)]
        let jacobian = m_dot_o.abs() / (eta * m_dot_i + m_dot_o).sq();

        let bsdf = self.transmittance * ((1.0 - f) * d * g * m_dot_i * jacobian / n_dot_i);
        let pdf = (1.0 - f) * d * n_dot_m * jacobian;
        let weight = self.transmittance * (g * m_dot_i / (n_dot_i * n_dot_m));
        SampledMaterial::new(w_o, bsdf, weight, pdf)
    }
}

impl Bsdf for Dielectric {
    fn evaluate(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        let side = self.side(n, w_i);
        let n_dot_i = -side.n.dot(w_i);
        let n_dot_o = side.n.dot(w_o);
        if n_dot_i <= 0.0 {
            return SampledMaterial::invalid(w_o);
        }
        if n_dot_o > 0.0 {
            self.reflection(&side, w_i, w_o)
        } else if n_dot_o < 0.0 {
            self.refraction(&side, w_i, w_o)
        } else {
            SampledMaterial::invalid(w_o)
        }
    }

    fn sample_direction(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d> {
        let side = self.side(n, w_i);
        let n_dot_i = -side.n.dot(w_i);
        if n_dot_i <= 0.0 {
            return None;
        }
        let m = self.ggx(n_dot_i).sample_normal(side.n, sample.bsdf);
        let m_dot_i = -m.dot(w_i);
        if m_dot_i <= 0.0 {
            return None;
        }

        // exactly 1.0 on total internal reflection, which always takes the reflection branch
        let f = fresnel::dielectric(m_dot_i, side.eta_i, side.eta_o);
        if sample.component >= f {
            let w_o = utils::refract(w_i, m, side.eta_i / side.eta_o)?;
            (side.n.dot(w_o) < 0.0).then_some(w_o)
        } else {
            let w_o = utils::reflect(w_i, m);
            (side.n.dot(w_o) > 0.0).then_some(w_o)
        }
    }
}
