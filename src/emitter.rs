//! Importance sampling of emitting triangles.
//!
//! An emitter is chosen from a discrete CDF proportional to its emitted power, then a point is
//! chosen uniformly on its area.

use crate::{
    material::Material,
    scene::{Triangle, Vertex},
    utils, RandomSample, Spectrum, Vec3d,
};

/// A triangle with nonzero emission. The vertices are copied out of the scene so sampling never
/// touches the index buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterTriangle {
    pub vertices: [Vec3d; 3],
    pub area: f64,
    pub emission: Spectrum,
    /// unit normal of the emitting side
    pub normal: Vec3d,
    /// Cumulative probability of this and all previous emitters
    pub cdf: f64,
    /// Probability of choosing this emitter
    pub pdf: f64,
    /// index into the scene's triangles
    pub global_index: usize,
}

/// Direction towards a point on an emitter together with what arrives from it
#[derive(Clone, Copy, Debug)]
pub struct LightSample {
    /// unit direction from the shading point towards the emitter
    pub direction: Vec3d,
    pub distance: f64,
    /// solid angle density of `direction`
    pub pdf: f64,
    /// emitted radiance divided by `pdf`
    pub value: Spectrum,
    pub primitive_index: usize,
    pub valid: bool,
}

impl LightSample {
    const fn invalid() -> Self {
        Self {
            direction: Vec3d::ZERO,
            distance: 0.0,
            pdf: 0.0,
            value: Spectrum::ZERO,
            primitive_index: 0,
            valid: false,
        }
    }
}

/// Collects all emitting triangles and builds the CDF over their power.
///
/// Writes the selection probability of every triangle into [`Triangle::discrete_pdf`], zero for
/// triangles that do not emit. The areas of the triangles must already be known.
pub fn build_emitter_table(
    vertices: &[Vertex],
    triangles: &mut [Triangle],
    materials: &[Material],
) -> Vec<EmitterTriangle> {
    let mut emitters: Vec<EmitterTriangle> = triangles
        .iter()
        .enumerate()
        .filter_map(|(global_index, triangle)| {
            let material = &materials[triangle.material as usize];
            if !material.is_emissive() || triangle.area <= 0.0 {
                return None;
            }
            let [a, b, c] = triangle
                .indices
                .map(|index| vertices[index as usize].position);
            Some(EmitterTriangle {
                vertices: [a, b, c],
                area: triangle.area,
                emission: material.emission,
                normal: (b - a).cross(c - a).normalize(),
                cdf: 0.0,
                pdf: 0.0,
                global_index,
            })
        })
        .collect();

    for triangle in triangles.iter_mut() {
        triangle.discrete_pdf = 0.0;
    }

    let power = |e: &EmitterTriangle| e.area * e.emission.average();
    let total: f64 = emitters.iter().map(power).sum();
    if emitters.is_empty() || total <= 0.0 {
        log::warn!("the scene has no emitters, only the environment lights it");
        return Vec::new();
    }

    let mut cumulative = 0.0;
    for emitter in &mut emitters {
        emitter.pdf = emitter.area * emitter.emission.average() / total;
        cumulative += emitter.pdf;
        emitter.cdf = cumulative;
        triangles[emitter.global_index].discrete_pdf = emitter.pdf;
    }
    if let Some(last) = emitters.last_mut() {
        last.cdf = 1.0;
    }

    log::debug!(
        "emitter table: {} emitters, total power {total}",
        emitters.len()
    );
    emitters
}

/// Index of the first emitter whose cumulative probability exceeds `xi`, `None` without
/// emitters.
#[must_use]
pub fn sample_emitter_triangle(emitters: &[EmitterTriangle], xi: f64) -> Option<usize> {
    debug_assert!(emitters.windows(2).all(|w| w[0].cdf <= w[1].cdf));
    if emitters.is_empty() {
        return None;
    }
    let index = emitters.partition_point(|e| e.cdf <= xi);
    Some(index.min(emitters.len() - 1))
}

/// Uniform point on the triangle
#[must_use]
pub fn barycentric(vertices: &[Vec3d; 3], rnd: crate::Vec2d) -> Vec3d {
    let w = utils::barycentric(rnd);
    vertices[0] * w.x + vertices[1] * w.y + vertices[2] * w.z
}

/// Solid angle density of light sampling towards a point on an emitter.
///
/// `direction` points from the shading point towards the emitter, `distance` is the distance
/// between both. Returns zero if the back side of the emitter is seen.
#[must_use]
pub fn emitter_pdf(
    discrete_pdf: f64,
    area: f64,
    normal: Vec3d,
    direction: Vec3d,
    distance: f64,
) -> f64 {
    let cos_light = -normal.dot(direction);
    if cos_light <= 0.0 || area <= 0.0 {
        return 0.0;
    }
    discrete_pdf * distance * distance / (cos_light * area)
}

/// Chooses an emitter and a point on it as seen from `origin`
#[must_use]
pub fn sample_light(
    emitters: &[EmitterTriangle],
    origin: Vec3d,
    sample: &RandomSample,
) -> LightSample {
    let Some(index) = sample_emitter_triangle(emitters, sample.emitter) else {
        return LightSample::invalid();
    };
    let emitter = &emitters[index];
    let point = barycentric(&emitter.vertices, sample.barycentric);
    let to_light = point - origin;
    let distance = to_light.length();
    let Some(direction) = to_light.try_normalize() else {
        return LightSample::invalid();
    };

    let pdf = emitter_pdf(emitter.pdf, emitter.area, emitter.normal, direction, distance);
    if !pdf.is_finite() || pdf <= 0.0 {
        return LightSample::invalid();
    }
    LightSample {
        direction,
        distance,
        pdf,
        value: emitter.emission / pdf,
        primitive_index: emitter.global_index,
        valid: true,
    }
}
