//! Fresnel reflectance of dielectric and conducting interfaces, optionally coated with a thin
//! dielectric film.

use std::f64::consts;

use crate::{utils::FloatExt, Spectrum};

/// Unpolarized Fresnel reflectance of a dielectric interface.
///
/// `cos_i` is the cosine between the incident direction and the (micro) normal, `eta_i` the
/// index of refraction on the incident side and `eta_o` the one on the other side.
/// Returns exactly `1.0` on total internal reflection.
#[must_use]
pub fn dielectric(cos_i: f64, eta_i: f64, eta_o: f64) -> f64 {
    let cos_i = cos_i.abs().min(1.0);
    let sin2_t = (eta_i / eta_o).sq() * (1.0 - cos_i.sq());
    if sin2_t >= 1.0 {
        // total internal reflection
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let (rs, rp) = amplitudes(cos_i, cos_t, eta_i, eta_o);
    (0.5 * (rs.sq() + rp.sq())).clamp(0.0, 1.0)
}

/// Reflection amplitudes for s and p polarized light
fn amplitudes(cos_i: f64, cos_t: f64, eta_i: f64, eta_o: f64) -> (f64, f64) {
    #[allow(clippy::suboptimal_flops)]
    let rs = (eta_i * cos_i - eta_o * cos_t) / (eta_i * cos_i + eta_o * cos_t);
    #[allow(clippy::suboptimal_flops)]
    let rp = (eta_o * cos_i - eta_i * cos_t) / (eta_o * cos_i + eta_i * cos_t);
    (rs, rp)
}

/// Unpolarized reflectance of a conductor with complex index of refraction `eta + i k`, seen
/// from a dielectric with index `eta_ext`.
#[must_use]
pub fn conductor(cos_i: f64, eta_ext: f64, eta: f64, k: f64) -> f64 {
    let cos_i = cos_i.abs().min(1.0);
    let eta = eta / eta_ext;
    let k = k / eta_ext;

    let cos2 = cos_i.sq();
    let sin2 = 1.0 - cos2;
    let eta2 = eta.sq();
    let k2 = k.sq();

    let t0 = eta2 - k2 - sin2;
    #[allow(clippy::suboptimal_flops)]
    let a2b2 = (t0.sq() + 4.0 * eta2 * k2).sqrt();
    let t1 = a2b2 + cos2;
    let a = (0.5 * (a2b2 + t0)).max(0.0).sqrt();
    let t2 = 2.0 * cos_i * a;
    let rs = (t1 - t2) / (t1 + t2);

    #[allow(clippy::suboptimal_flops)]
    let t3 = cos2 * a2b2 + sin2.sq();
    let t4 = t2 * sin2;
    let rp = rs * (t3 - t4) / (t3 + t4);

    let r = 0.5 * (rp + rs);
    if r.is_finite() {
        r.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Complex index of refraction of a conductor, sampled per wavelength
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComplexIor {
    /// real part
    pub eta: Spectrum,
    /// imaginary part, the absorption coefficient
    pub k: Spectrum,
}

impl ComplexIor {
    /// [`conductor`] evaluated for every wavelength
    #[must_use]
    pub fn reflectance(&self, cos_i: f64, eta_ext: f64) -> Spectrum {
        Spectrum::from_array(std::array::from_fn(|i| {
            conductor(cos_i, eta_ext, self.eta[i], self.k[i])
        }))
    }
}

/// A thin dielectric film on top of an interface. Light reflected at the top and at the bottom
/// of the film interferes, which gives soap bubbles and oxidized metals their colors.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThinFilm {
    /// thickness in nanometers
    pub thickness: f64,
    /// index of refraction of the film
    pub ior: f64,
}

/// What lies beneath a [`ThinFilm`]
#[derive(Clone, Copy, Debug)]
pub enum Substrate<'a> {
    Dielectric(f64),
    Conductor(&'a ComplexIor),
}

impl ThinFilm {
    /// Airy reflectance of the film for every wavelength, averaged over both polarizations.
    ///
    /// `cos_i` is the angle of incidence in the exterior medium with index `eta_ext`.
    #[must_use]
    pub fn reflectance(&self, cos_i: f64, eta_ext: f64, substrate: Substrate<'_>) -> Spectrum {
        let cos1 = cos_i.abs().min(1.0);
        let sin2_film = (eta_ext / self.ior).sq() * (1.0 - cos1.sq());
        if sin2_film >= 1.0 {
            return Spectrum::ONE;
        }
        let cos2 = (1.0 - sin2_film).sqrt();
        let (rs12, rp12) = amplitudes(cos1, cos2, eta_ext, self.ior);

        Spectrum::from_array(std::array::from_fn(|i| {
            let lambda = Spectrum::wavelength(i);
            let (rs23, rp23) = match substrate {
                Substrate::Dielectric(eta) => {
                    let sin2_sub = (self.ior / eta).sq() * (1.0 - cos2.sq());
                    if sin2_sub >= 1.0 {
                        (1.0, 1.0)
                    } else {
                        amplitudes(cos2, (1.0 - sin2_sub).sqrt(), self.ior, eta)
                    }
                }
                Substrate::Conductor(ior) => {
                    // the phase shift of the metal is folded into a sign flip
                    let r = -conductor(cos2, self.ior, ior.eta[i], ior.k[i]).sqrt();
                    (r, r)
                }
            };
            let phase = 4.0 * consts::PI * self.ior * self.thickness * cos2 / lambda;
            0.5 * (airy(rs12, rs23, phase) + airy(rp12, rp23, phase))
        }))
    }
}

/// Reflectance of a layer with interface amplitudes `r12`, `r23` and round trip phase `phase`
fn airy(r12: f64, r23: f64, phase: f64) -> f64 {
    let cross = 2.0 * r12 * r23 * phase.cos();
    let numerator = r12.sq() + r23.sq() + cross;
    #[allow(clippy::suboptimal_flops)]
    let denominator = 1.0 + r12.sq() * r23.sq() + cross;
    if denominator <= 1e-12 {
        return 1.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}
