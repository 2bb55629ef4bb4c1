//! The closed set of surface descriptions a scene can reference

use crate::{
    conductor::Conductor, dielectric::Dielectric, diffuse::Diffuse, plastic::Plastic, Bsdf,
    RandomSample, SampledMaterial, Spectrum, Vec3d,
};

/// The scattering part of a [`Material`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialKind {
    Diffuse(Diffuse),
    Conductor(Conductor),
    Plastic(Plastic),
    Dielectric(Dielectric),
}

/// Immutable description of a surface. Owned by the scene and referenced by index from the
/// triangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,

    /// Radiance emitted from the front side of the surface
    pub emission: Spectrum,
}

impl Material {
    #[must_use]
    pub const fn new(kind: MaterialKind) -> Self {
        Self {
            kind,
            emission: Spectrum::ZERO,
        }
    }

    #[must_use]
    pub const fn diffuse(albedo: Spectrum) -> Self {
        Self::new(MaterialKind::Diffuse(Diffuse { albedo }))
    }

    #[must_use]
    pub const fn conductor(conductor: Conductor) -> Self {
        Self::new(MaterialKind::Conductor(conductor))
    }

    #[must_use]
    pub const fn plastic(plastic: Plastic) -> Self {
        Self::new(MaterialKind::Plastic(plastic))
    }

    #[must_use]
    pub const fn dielectric(dielectric: Dielectric) -> Self {
        Self::new(MaterialKind::Dielectric(dielectric))
    }

    #[must_use]
    pub fn with_emission(mut self, emission: Spectrum) -> Self {
        self.emission = emission;
        self
    }

    #[must_use]
    pub fn is_emissive(&self) -> bool {
        !self.emission.is_black()
    }

    /// Only transmissive materials tell the front from the back of a surface
    #[must_use]
    pub const fn is_transmissive(&self) -> bool {
        matches!(self.kind, MaterialKind::Dielectric(_))
    }

    /// Opaque surfaces are two sided, their normal is flipped towards the arriving ray
    #[must_use]
    pub fn shading_normal(&self, n: Vec3d, w_i: Vec3d) -> Vec3d {
        if !self.is_transmissive() && n.dot(w_i) > 0.0 {
            -n
        } else {
            n
        }
    }

    /// Radiance leaving the surface with geometric normal `n` into direction `w_o`. Only the front
    /// side emits.
    #[must_use]
    pub fn emitted(&self, n: Vec3d, w_o: Vec3d) -> Spectrum {
        if n.dot(w_o) > 0.0 {
            self.emission
        } else {
            Spectrum::ZERO
        }
    }
}

impl Bsdf for Material {
    fn evaluate(&self, n: Vec3d, w_i: Vec3d, w_o: Vec3d) -> SampledMaterial {
        match &self.kind {
            MaterialKind::Diffuse(m) => m.evaluate(n, w_i, w_o),
            MaterialKind::Conductor(m) => m.evaluate(n, w_i, w_o),
            MaterialKind::Plastic(m) => m.evaluate(n, w_i, w_o),
            MaterialKind::Dielectric(m) => m.evaluate(n, w_i, w_o),
        }
    }

    fn sample_direction(&self, n: Vec3d, w_i: Vec3d, sample: &RandomSample) -> Option<Vec3d> {
        match &self.kind {
            MaterialKind::Diffuse(m) => m.sample_direction(n, w_i, sample),
            MaterialKind::Conductor(m) => m.sample_direction(n, w_i, sample),
            MaterialKind::Plastic(m) => m.sample_direction(n, w_i, sample),
            MaterialKind::Dielectric(m) => m.sample_direction(n, w_i, sample),
        }
    }
}
