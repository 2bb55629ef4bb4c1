//! Flat geometry arrays and the ray/scene intersection service.
//!
//! The [`Scene`] owns vertices, triangles, materials and the emitter table. Everything else refers
//! to them by index.

use crate::{
    emitter::{self, EmitterTriangle},
    material::Material,
    Error, Result, Vec2d, Vec3d,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3d,
    /// shading normal, unit length
    pub normal: Vec3d,
    pub tex_coord: Vec2d,
}

impl Vertex {
    #[must_use]
    pub const fn new(position: Vec3d, normal: Vec3d) -> Self {
        Self {
            position,
            normal,
            tex_coord: Vec2d::ZERO,
        }
    }
}

/// An indexed triangle. The front side is the one the counter clockwise winding is seen from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub material: u32,

    /// filled in by [`Scene::new`]
    pub area: f64,

    /// Probability of choosing this triangle from the emitter table, zero if it does not emit.
    /// Filled in by [`Scene::new`].
    pub discrete_pdf: f64,
}

impl Triangle {
    #[must_use]
    pub const fn new(indices: [u32; 3], material: u32) -> Self {
        Self {
            indices,
            material,
            area: 0.0,
            discrete_pdf: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3d,
    /// unit length
    pub direction: Vec3d,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Ray {
    #[must_use]
    pub fn new(origin: Vec3d, direction: Vec3d) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            min_distance: 0.0,
            max_distance: f64::INFINITY,
        }
    }

    /// A ray that stops `epsilon` in front of `distance`, used for shadow rays
    #[must_use]
    pub fn segment(origin: Vec3d, direction: Vec3d, distance: f64, epsilon: f64) -> Self {
        Self {
            max_distance: distance - epsilon,
            ..Self::new(origin, direction)
        }
    }

    #[must_use]
    pub fn at(&self, t: f64) -> Vec3d {
        self.origin + self.direction * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub distance: f64,
    pub primitive_index: usize,
    /// Weights of the first two vertices. The third one gets `1 - x - y`.
    pub barycentric: Vec2d,
}

impl Intersection {
    /// Weights of all three vertices
    #[must_use]
    pub fn weights(&self) -> Vec3d {
        let b = self.barycentric;
        Vec3d::new(b.x, b.y, 1.0 - b.x - b.y)
    }
}

/// The ray/scene intersection service
pub trait Intersector: Sync {
    /// Closest hit within `[ray.min_distance, ray.max_distance]`
    fn intersect(&self, ray: &Ray) -> Option<Intersection>;

    /// Whether anything blocks the ray
    fn occluded(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    emitters: Vec<EmitterTriangle>,
    bounds: (Vec3d, Vec3d),
    epsilon: f64,
}

impl Scene {
    /// Validates the indices, computes the triangle areas and builds the emitter table.
    ///
    /// # Errors
    /// [`Error::InvalidScene`] if an index is out of range, a position is not finite or an
    /// emitting triangle has no area.
    pub fn new(
        vertices: Vec<Vertex>,
        mut triangles: Vec<Triangle>,
        materials: Vec<Material>,
    ) -> Result<Self> {
        if let Some(i) = vertices.iter().position(|v| !v.position.is_finite()) {
            return Err(Error::InvalidScene(format!(
                "vertex {i} has a non-finite position"
            )));
        }
        for (i, triangle) in triangles.iter_mut().enumerate() {
            if let Some(&index) = triangle
                .indices
                .iter()
                .find(|&&index| index as usize >= vertices.len())
            {
                return Err(Error::InvalidScene(format!(
                    "triangle {i} references vertex {index}, but there are only {} vertices",
                    vertices.len()
                )));
            }
            let Some(material) = materials.get(triangle.material as usize) else {
                return Err(Error::InvalidScene(format!(
                    "triangle {i} references material {}, but there are only {} materials",
                    triangle.material,
                    materials.len()
                )));
            };
            let [a, b, c] = triangle.indices.map(|index| vertices[index as usize].position);
            triangle.area = 0.5 * (b - a).cross(c - a).length();
            if material.is_emissive() && triangle.area <= 0.0 {
                return Err(Error::InvalidScene(format!(
                    "emitting triangle {i} is degenerate"
                )));
            }
        }

        let emitters = emitter::build_emitter_table(&vertices, &mut triangles, &materials);

        let bounds = vertices.iter().fold(
            (Vec3d::splat(f64::INFINITY), Vec3d::splat(f64::NEG_INFINITY)),
            |(min, max), v| (min.min(v.position), max.max(v.position)),
        );
        let extent = if vertices.is_empty() {
            1.0
        } else {
            (bounds.1 - bounds.0).max_element().max(1e-6)
        };

        log::info!(
            "scene: {} vertices, {} triangles, {} materials, {} emitters",
            vertices.len(),
            triangles.len(),
            materials.len(),
            emitters.len()
        );

        Ok(Self {
            vertices,
            triangles,
            materials,
            emitters,
            bounds,
            epsilon: 1e-4 * extent,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[must_use]
    pub fn emitters(&self) -> &[EmitterTriangle] {
        &self.emitters
    }

    /// Axis aligned `(min, max)` corners around all vertices
    #[must_use]
    pub const fn bounds(&self) -> (Vec3d, Vec3d) {
        self.bounds
    }

    /// Distance rays are offset by to leave a surface
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn positions(&self, primitive: usize) -> [Vec3d; 3] {
        self.triangles[primitive]
            .indices
            .map(|index| self.vertices[index as usize].position)
    }

    #[must_use]
    pub fn material(&self, primitive: usize) -> &Material {
        &self.materials[self.triangles[primitive].material as usize]
    }

    /// Unit normal of the triangle plane, facing the front side
    #[must_use]
    pub fn geometric_normal(&self, primitive: usize) -> Vec3d {
        let [a, b, c] = self.positions(primitive);
        (b - a).cross(c - a).normalize_or_zero()
    }

    #[must_use]
    pub fn hit_point(&self, hit: &Intersection) -> Vec3d {
        let [a, b, c] = self.positions(hit.primitive_index);
        let w = hit.weights();
        a * w.x + b * w.y + c * w.z
    }

    /// Interpolated vertex normal. Falls back to the geometric normal when the vertex normals
    /// cancel out.
    #[must_use]
    pub fn shading_normal(&self, hit: &Intersection) -> Vec3d {
        let triangle = &self.triangles[hit.primitive_index];
        let [a, b, c] = triangle
            .indices
            .map(|index| self.vertices[index as usize].normal);
        let w = hit.weights();
        (a * w.x + b * w.y + c * w.z)
            .try_normalize()
            .unwrap_or_else(|| self.geometric_normal(hit.primitive_index))
    }
}

/// Tests every triangle for every ray. Good enough for tests and small scenes.
pub struct BruteForceIntersector {
    triangles: Vec<[Vec3d; 3]>,
}

impl BruteForceIntersector {
    #[must_use]
    pub fn new(scene: &Scene) -> Self {
        Self {
            triangles: (0..scene.triangles().len())
                .map(|i| scene.positions(i))
                .collect(),
        }
    }
}

/// Möller-Trumbore ray-triangle intersection, two sided.
/// Returns the distance and the barycentric weights of `v0` and `v1`.
fn intersect_triangle(ray: &Ray, [v0, v1, v2]: &[Vec3d; 3]) -> Option<(f64, Vec2d)> {
    let edge1 = *v1 - *v0;
    let edge2 = *v2 - *v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    // parallel to the triangle
    if a.abs() < 1e-12 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - *v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < ray.min_distance || t > ray.max_distance {
        return None;
    }
    Some((t, Vec2d::new(1.0 - u - v, u)))
}

impl Intersector for BruteForceIntersector {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut closest: Option<Intersection> = None;
        for (primitive_index, triangle) in self.triangles.iter().enumerate() {
            let Some((distance, barycentric)) = intersect_triangle(ray, triangle) else {
                continue;
            };
            if closest.map_or(true, |hit| distance < hit.distance) {
                closest = Some(Intersection {
                    distance,
                    primitive_index,
                    barycentric,
                });
            }
        }
        closest
    }

    fn occluded(&self, ray: &Ray) -> bool {
        self.triangles
            .iter()
            .any(|triangle| intersect_triangle(ray, triangle).is_some())
    }
}
