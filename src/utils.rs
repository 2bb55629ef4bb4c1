use glam::DMat3;

use crate::{Vec2d, Vec3d};

pub trait FloatExt {
    fn sq(self) -> Self;
}

impl FloatExt for f64 {
    fn sq(self) -> Self {
        self * self
    }
}

/// Mirrors the incident direction `w_i` (pointing towards the surface) at `m`
pub fn reflect(w_i: Vec3d, m: Vec3d) -> Vec3d {
    w_i - m * (2.0 * w_i.dot(m))
}

/// Refracts the incident direction `w_i` through the microfacet `m` (which must face against
/// `w_i`), with `eta = eta_i / eta_o`.
///
/// Returns `None` on total internal reflection.
pub fn refract(w_i: Vec3d, m: Vec3d, eta: f64) -> Option<Vec3d> {
    let cos_i = -w_i.dot(m);
    let sin2_t = eta.sq() * (1.0 - cos_i.sq()).max(0.0);
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    #[allow(clippy::suboptimal_flops)]
    (w_i * eta + m * (eta * cos_i - cos_t)).try_normalize()
}

/// Rotation whose z axis is `n`. The columns are tangent, bitangent and normal.
pub fn tangent_space(n: Vec3d) -> DMat3 {
    let mut tan = Vec3d::new(0.0, 0.0, 1.0);
    if n.dot(tan).abs() > 0.9999 {
        tan = Vec3d::new(0.0, 1.0, 0.0);
    }
    let bi = n.cross(tan).normalize();
    let tan = bi.cross(n).normalize();
    DMat3::from_cols(tan, bi, n)
}

/// Transforms a direction given in the local frame around `n` to world space
pub fn to_world(n: Vec3d, local: Vec3d) -> Vec3d {
    (tangent_space(n) * local).normalize()
}

/* pdf is cos(theta) / pi */
#[must_use]
pub fn hemispherical_sample_cos_weighted_uv(u: f64, v: f64) -> (Vec3d, f64) {
    let eps_theta_sample = u.clamp(1e-6, 1.0); // prevent division by zero (division by pdf)
    let cos_theta = eps_theta_sample.sqrt();
    let sin_theta = (1.0 - eps_theta_sample).sqrt();
    let phi = 2.0 * std::f64::consts::PI * v;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let omega = Vec3d {
        x: sin_theta * sin_phi,
        y: sin_theta * cos_phi,
        z: cos_theta,
    };
    (omega, cos_theta / std::f64::consts::PI)
}

/// Cosine weighted direction in the hemisphere around `n`
pub fn sample_cosine_hemisphere(n: Vec3d, rnd: Vec2d) -> Vec3d {
    let (local, _pdf) = hemispherical_sample_cos_weighted_uv(rnd.x, rnd.y);
    to_world(n, local)
}

/// Uniform barycentric coordinates over a triangle, weights for the vertices 0, 1 and 2
pub fn barycentric(rnd: Vec2d) -> Vec3d {
    let r1 = rnd.x.sqrt();
    let r2 = rnd.y;
    Vec3d::new(1.0 - r1, r1 * (1.0 - r2), r1 * r2)
}
