use rand::{Rng, RngCore};

use crate::Spectrum;

/// used for direction vectors and positions
pub type Vec3d = glam::f64::DVec3;
/// used for sample pairs and texture coordinates
pub type Vec2d = glam::f64::DVec2;

/// Independent uniform numbers in `[0, 1)` consumed by a single bounce.
///
/// The core never owns a random generator. The caller draws a fresh bundle for every bounce and
/// hands it down, which keeps every function here deterministic.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RandomSample {
    /// Sub-pixel offset of the primary ray
    pub pixel: Vec2d,
    /// Drives the direction (or microfacet normal) drawn by a BSDF
    pub bsdf: Vec2d,
    /// Selects between the lobes of layered or refractive BSDFs
    pub component: f64,
    /// Selects the emitter triangle from the emitter CDF
    pub emitter: f64,
    /// Selects the point on the chosen emitter triangle
    pub barycentric: Vec2d,
    /// Compared against the survival probability during russian roulette
    pub russian_roulette: f64,
}

impl RandomSample {
    /// Draws a complete bundle from `rng`
    pub fn draw(rng: &mut dyn RngCore) -> Self {
        Self {
            pixel: Vec2d::new(rng.gen(), rng.gen()),
            bsdf: Vec2d::new(rng.gen(), rng.gen()),
            component: rng.gen(),
            emitter: rng.gen(),
            barycentric: Vec2d::new(rng.gen(), rng.gen()),
            russian_roulette: rng.gen(),
        }
    }
}

/// The result of evaluating or sampling a BSDF for one pair of directions.
#[derive(Clone, Copy, Debug)]
pub struct SampledMaterial {
    /// The scattered direction `w_o`
    pub direction: Vec3d,

    /// The BSDF value with the cosine of the outgoing direction already multiplied in
    pub bsdf: Spectrum,

    /// `bsdf / pdf`. This is what a path throughput gets multiplied with.
    pub weight: Spectrum,

    /// Solid angle density of sampling `direction`, including every lobe selection probability
    pub pdf: f64,

    /// `false` whenever the direction pair is impossible for the material. All other fields are
    /// zero then.
    pub valid: bool,
}

impl SampledMaterial {
    /// A zero contribution sample
    #[must_use]
    pub const fn invalid(direction: Vec3d) -> Self {
        Self {
            direction,
            bsdf: Spectrum::ZERO,
            weight: Spectrum::ZERO,
            pdf: 0.0,
            valid: false,
        }
    }

    /// Builds a sample and rejects it unless the pdf is finite and positive and both spectra are
    /// finite.
    #[must_use]
    pub fn new(direction: Vec3d, bsdf: Spectrum, weight: Spectrum, pdf: f64) -> Self {
        if !(pdf.is_finite() && pdf > 0.0 && bsdf.is_finite() && weight.is_finite()) {
            return Self::invalid(direction);
        }
        Self {
            direction,
            bsdf,
            weight,
            pdf,
            valid: true,
        }
    }
}

/// Bidirectional Scattering Distribution Functions.
///
/// `n` is the unit shading normal, `w_i` the unit direction of the arriving ray (pointing
/// towards the surface) and `w_o` the unit scattered direction.
pub trait Bsdf {
    /// Returns the value, density and weight of scattering `w_i` into `w_o`
    fn evaluate(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial;

    /// Draws an outgoing direction from `sample` only. Implementations must not compute their own
    /// weights, the default [`Bsdf::sample`] hands the direction to [`Bsdf::evaluate`].
    ///
    /// Returns `None` if no direction can be produced (total internal reflection into a
    /// refraction lobe, directions below the horizon, ...)
    fn sample_direction(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d>;

    /// Importance samples an outgoing direction and evaluates the BSDF for it
    fn sample(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> SampledMaterial {
        self.sample_direction(n, w_i, sample)
            .map_or_else(|| SampledMaterial::invalid(Vec3d::ZERO), |w_o| self.evaluate(n, w_i, w_o))
    }
}
