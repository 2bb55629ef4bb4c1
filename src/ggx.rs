//! An implementation of the isotropic GGX Distribution

use crate::{utils::{self, FloatExt}, Vec2d, Vec3d};
use std::f64::consts;

/// This is a common microsurface model to describe rough surfaces. It is used by
/// [`crate::conductor::Conductor`], [`crate::plastic::Plastic`] and
/// [`crate::dielectric::Dielectric`].
///
/// # Mathematical background
/// * [Microfacet Models for Refraction through Rough Surfaces](https://www.cs.cornell.edu/~srm/publications/EGSR07-btdf.pdf)
/// * [Understanding the Masking-Shadowing Function in Microfacet-Based BRDFs](https://jcgt.org/published/0003/02/03/)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ggx {
    /// This roughness value is not perceived linearly. The following formula is a good
    /// approximation for choosing it: `alpha = perceived_roughness^2`
    pub alpha: f64,
}

impl Ggx {
    const MIN_ALPHA: f64 = 1e-3;

    /// `alpha = roughness²`
    #[must_use]
    pub fn from_roughness(roughness: f64) -> Self {
        Self {
            alpha: roughness.sq().max(Self::MIN_ALPHA),
        }
    }

    /// View dependent widening of the lobe, `alpha = ((1.2 - 0.2 √|cos θi|) roughness)²`.
    /// Grazing views get a rougher lobe, which removes most fireflies of near mirrors.
    #[must_use]
    pub fn from_remapped(roughness: f64, cos_theta_i: f64) -> Self {
        #[allow(clippy::suboptimal_flops)]
        let widened = (1.2 - 0.2 * cos_theta_i.abs().sqrt()) * roughness;
        Self {
            alpha: widened.sq().max(Self::MIN_ALPHA),
        }
    }

    #[must_use]
    pub fn alpha_sq(&self) -> f64 {
        self.alpha.sq()
    }

    /// Distribution of normals / Normal Distribution Function
    /// This is the $D$ term in typical Cook-Torance / GGX model
    #[must_use]
    pub fn ndf(&self, n_dot_m: f64) -> f64 {
        if n_dot_m <= 0.0 {
            return 0.0;
        }
        let a2 = self.alpha_sq();
        #[allow(clippy::suboptimal_flops)]
        let denom = consts::PI * ((a2 - 1.0) * n_dot_m.sq() + 1.0).sq();
        a2 / denom
    }

    /// Smith masking for one direction, `2 / (1 + √(1 + α² tan²θ))`
    /// This is the `G_1` term in typical Cook-Torance / GGX model
    #[must_use]
    pub fn visibility_g1(&self, cos_theta: f64) -> f64 {
        let cos2 = cos_theta.sq();
        if cos2 < 1e-20 {
            return 0.0;
        }
        let tan2 = (1.0 - cos2).max(0.0) / cos2;
        2.0 / (1.0 + self.alpha_sq().mul_add(tan2, 1.0).sqrt())
    }

    /// Masking-Shadowing function
    /// This is the $G$ term in typical Cook-Torance / GGX model
    ///
    /// `w_i` is the incident ray direction, `w_o` the scattered one. Returns `0.0` if one of the
    /// directions sees the microfacet `m` from the other side than the macro surface `n`.
    #[must_use]
    pub fn visibility(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d, m: Vec3d) -> f64 {
        if !Self::g2_satisfied(n, w_i, w_o, m) {
            return 0.0;
        }
        self.visibility_g1(n.dot(w_i)) * self.visibility_g1(n.dot(w_o))
    }

    fn g1_satisfied(n: Vec3d, omega: Vec3d, m: Vec3d) -> bool {
        m.dot(omega) * n.dot(omega) > 0.0
    }

    /// Validity gate of [`Ggx::visibility`]
    #[must_use]
    pub fn g2_satisfied(n: Vec3d, w_i: Vec3d, w_o: Vec3d, m: Vec3d) -> bool {
        Self::g1_satisfied(n, -w_i, m) && Self::g1_satisfied(n, w_o, m)
    }

    /// Samples a microfacet normal around `n` proportional to `D(m) (n·m)`
    #[must_use]
    pub fn sample_normal(&self, n: Vec3d, rnd: Vec2d) -> Vec3d {
        let a2 = self.alpha_sq();
        let xi = rnd.x.clamp(0.0, 1.0 - 1e-12);
        #[allow(clippy::suboptimal_flops)]
        let cos_theta = ((1.0 - xi) / (1.0 + (a2 - 1.0) * xi)).sqrt();
        let sin_theta = (1.0 - cos_theta.sq()).max(0.0).sqrt();
        let phi = 2.0 * consts::PI * rnd.y;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let local = Vec3d::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
        utils::to_world(n, local)
    }

    /// Density of [`Ggx::sample_normal`] with respect to the solid angle of `m`
    #[must_use]
    pub fn normal_pdf(&self, n_dot_m: f64) -> f64 {
        self.ndf(n_dot_m) * n_dot_m.max(0.0)
    }
}
