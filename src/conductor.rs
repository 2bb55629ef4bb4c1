//! [Bsdf] that resembles the appearance of metals
use crate::{
    fresnel::{ComplexIor, Substrate, ThinFilm},
    ggx::Ggx,
    utils, Bsdf, RandomSample, SampledMaterial, Spectrum, Vec3d,
};

/// Rough specular reflection off a metal. There is no transmission and no diffuse part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conductor {
    /// Tint multiplied onto the Fresnel reflectance
    pub specular: Spectrum,

    /// perceived roughness, `alpha = roughness²`
    pub roughness: f64,

    /// Measured complex index of refraction. Without it the Fresnel term is `1.0`, the metal
    /// then absorbs nothing.
    pub ior: Option<ComplexIor>,

    /// index of refraction of the medium around the metal
    pub exterior_ior: f64,

    /// optional oxide layer
    pub thin_film: Option<ThinFilm>,
}

impl Conductor {
    /// A perfectly reflecting, colored metal
    #[must_use]
    pub const fn new(specular: Spectrum, roughness: f64) -> Self {
        Self {
            specular,
            roughness,
            ior: None,
            exterior_ior: 1.0,
            thin_film: None,
        }
    }

    #[must_use]
    pub fn with_ior(mut self, ior: ComplexIor) -> Self {
        self.ior = Some(ior);
        self
    }

    #[must_use]
    pub fn with_thin_film(mut self, film: ThinFilm) -> Self {
        self.thin_film = Some(film);
        self
    }

    fn ggx(&self) -> Ggx {
        Ggx::from_roughness(self.roughness)
    }

    /// The film is ignored without a measured index of refraction: on a lossless mirror it
    /// cannot change the reflectance.
    fn fresnel(&self, cos_i: f64) -> Spectrum {
        match (&self.ior, &self.thin_film) {
            (Some(ior), Some(film)) => {
                film.reflectance(cos_i, self.exterior_ior, Substrate::Conductor(ior))
            }
            (Some(ior), None) => ior.reflectance(cos_i, self.exterior_ior),
            (None, _) => Spectrum::ONE,
        }
    }
}

impl Bsdf for Conductor {
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

        let ggx = self.ggx();
        let f = self.fresnel(m_dot_o);
        let d = ggx.ndf(n_dot_m);
        let g = ggx.visibility(n, w_i, w_o, m);

        let bsdf = self.specular * f * (d * g / (4.0 * n_dot_i));
        let pdf = d * n_dot_m / (4.0 * m_dot_o);
        let weight = self.specular * f * (g * m_dot_o / (n_dot_m * n_dot_i));
        SampledMaterial::new(w_o, bsdf, weight, pdf)
    }

    fn sample_direction(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d> {
        let m = self.ggx().sample_normal(n, sample.bsdf);
        Some(utils::reflect(w_i, m))
    }
}

/// Approximate measured optical constants, `(wavelength in nm, eta, k)`
mod measured {
    pub const GOLD: [(f64, f64, f64); 8] = [
        (400.0, 1.658, 1.956),
        (450.0, 1.500, 1.880),
        (500.0, 0.970, 1.870),
        (550.0, 0.430, 2.450),
        (600.0, 0.250, 2.980),
        (650.0, 0.170, 3.470),
        (700.0, 0.160, 3.930),
        (750.0, 0.160, 4.390),
    ];
    pub const COPPER: [(f64, f64, f64); 7] = [
        (400.0, 1.180, 2.210),
        (450.0, 1.170, 2.400),
        (500.0, 1.130, 2.570),
        (550.0, 1.020, 2.580),
        (600.0, 0.260, 3.400),
        (650.0, 0.210, 3.670),
        (700.0, 0.210, 4.050),
    ];
    pub const SILVER: [(f64, f64, f64); 4] = [
        (400.0, 0.050, 2.100),
        (500.0, 0.050, 3.090),
        (600.0, 0.060, 3.950),
        (700.0, 0.040, 4.800),
    ];
    pub const ALUMINIUM: [(f64, f64, f64); 4] = [
        (400.0, 0.490, 4.860),
        (500.0, 0.770, 6.080),
        (600.0, 1.200, 7.260),
        (700.0, 1.830, 8.310),
    ];
}

impl ComplexIor {
    fn from_table(table: &[(f64, f64, f64)]) -> Self {
        let wavelengths: Vec<f64> = table.iter().map(|s| s.0).collect();
        let eta: Vec<f64> = table.iter().map(|s| s.1).collect();
        let k: Vec<f64> = table.iter().map(|s| s.2).collect();
        Self {
            eta: Spectrum::resample(&wavelengths, &eta),
            k: Spectrum::resample(&wavelengths, &k),
        }
    }

    #[must_use]
    pub fn gold() -> Self {
        Self::from_table(&measured::GOLD)
    }

    #[must_use]
    pub fn copper() -> Self {
        Self::from_table(&measured::COPPER)
    }

    #[must_use]
    pub fn silver() -> Self {
        Self::from_table(&measured::SILVER)
    }

    #[must_use]
    pub fn aluminium() -> Self {
        Self::from_table(&measured::ALUMINIUM)
    }
}
