//! Path tracing with next event estimation and multiple importance sampling.
//!
//! A path is advanced one bounce at a time by [`Integrator::step`]. Each bounce gets its own
//! [`RandomSample`] bundle. Light sampling and BSDF sampling are combined with the power
//! heuristic, see Veach's thesis, chapter 9.

use rand::RngCore;

use crate::{
    config::{RenderConfig, RussianRoulette, SamplingStrategy},
    emitter,
    scene::{Intersector, Ray, Scene},
    Bsdf, RandomSample, Spectrum, Vec3d,
};

/// MIS weight of a sample drawn with density `a` against a second strategy with density `b`
#[must_use]
pub fn power_heuristic(a: f64, b: f64) -> f64 {
    let a2 = a * a;
    let b2 = b * b;
    if a2.is_infinite() {
        return 1.0;
    }
    if a2 + b2 <= 0.0 {
        return 0.0;
    }
    a2 / (a2 + b2)
}

/// Everything a path carries from one bounce to the next
#[derive(Clone, Copy, Debug)]
pub struct PathState {
    pub ray: Ray,
    pub radiance: Spectrum,
    pub throughput: Spectrum,
    /// number of scattering events so far
    pub bounce: u32,
    pub completed: bool,
    /// solid angle density of the BSDF sample that produced `ray`
    pub previous_pdf: f64,
    /// whether light sampling at the previous vertex could have produced `ray` as well
    pub previous_light_samplable: bool,
}

impl PathState {
    #[must_use]
    pub const fn new(ray: Ray) -> Self {
        Self {
            ray,
            radiance: Spectrum::ZERO,
            throughput: Spectrum::ONE,
            bounce: 0,
            completed: false,
            previous_pdf: 0.0,
            previous_light_samplable: false,
        }
    }
}

/// Estimates the radiance arriving along camera rays
pub struct Integrator<'a> {
    scene: &'a Scene,
    intersector: &'a dyn Intersector,
    strategy: SamplingStrategy,
    max_bounces: u32,
    russian_roulette: RussianRoulette,
    environment: Spectrum,
}

impl<'a> Integrator<'a> {
    #[must_use]
    pub fn new(scene: &'a Scene, intersector: &'a dyn Intersector, config: &RenderConfig) -> Self {
        Self {
            scene,
            intersector,
            strategy: config.strategy,
            max_bounces: config.max_bounces,
            russian_roulette: config.russian_roulette,
            environment: config.environment_spectrum(),
        }
    }

    fn light_sampling(&self) -> bool {
        self.strategy != SamplingStrategy::Bsdf && !self.scene.emitters().is_empty()
    }

    /// Moves `origin` off the surface with normal `n` to the side `direction` leaves into
    fn offset(&self, origin: Vec3d, n: Vec3d, direction: Vec3d) -> Vec3d {
        origin + n * self.scene.epsilon().copysign(n.dot(direction))
    }

    /// One radiance estimate along the camera ray `ray`.
    ///
    /// `first` drives the first bounce, later bounces draw fresh bundles from `rng`. Non-finite
    /// results are returned as they are, the caller filters them before accumulating.
    pub fn render_sample(&self, ray: Ray, first: &RandomSample, rng: &mut dyn RngCore) -> Spectrum {
        let mut state = PathState::new(ray);
        self.step(&mut state, first);
        while !state.completed {
            self.step(&mut state, &RandomSample::draw(rng));
        }
        state.radiance
    }

    /// Traces `state.ray`, collects emission and direct light at the hit and samples the next
    /// ray.
    pub fn step(&self, state: &mut PathState, sample: &RandomSample) {
        let scene = self.scene;
        let w_i = state.ray.direction;

        let Some(hit) = self.intersector.intersect(&state.ray) else {
            state.radiance += state.throughput * self.environment;
            state.completed = true;
            return;
        };

        let primitive = hit.primitive_index;
        let triangle = &scene.triangles()[primitive];
        let material = scene.material(primitive);
        let geometric_normal = scene.geometric_normal(primitive);
        let position = scene.hit_point(&hit);

        if material.is_emissive() {
            let emitted = material.emitted(geometric_normal, -w_i);
            if !emitted.is_black() {
                let weight = if state.previous_light_samplable {
                    match self.strategy {
                        SamplingStrategy::Mis => {
                            let light_pdf = emitter::emitter_pdf(
                                triangle.discrete_pdf,
                                triangle.area,
                                geometric_normal,
                                w_i,
                                hit.distance,
                            );
                            power_heuristic(state.previous_pdf, light_pdf)
                        }
                        SamplingStrategy::Light => 0.0,
                        SamplingStrategy::Bsdf => 1.0,
                    }
                } else {
                    1.0
                };
                state.radiance += state.throughput * emitted * weight;
            }
        }

        if state.bounce >= self.max_bounces {
            state.completed = true;
            return;
        }

        let n = material.shading_normal(scene.shading_normal(&hit), w_i);

        if self.light_sampling() {
            let light = emitter::sample_light(scene.emitters(), position, sample);
            if light.valid {
                let bsdf = material.evaluate(n, w_i, light.direction);
                if bsdf.valid && !bsdf.bsdf.is_black() {
                    let origin = self.offset(position, geometric_normal, light.direction);
                    let shadow = Ray::segment(
                        origin,
                        light.direction,
                        (position + light.direction * light.distance - origin).length(),
                        2.0 * scene.epsilon(),
                    );
                    if !self.intersector.occluded(&shadow) {
                        let weight = if self.strategy == SamplingStrategy::Mis {
                            power_heuristic(light.pdf, bsdf.pdf)
                        } else {
                            1.0
                        };
                        state.radiance += state.throughput * bsdf.bsdf * light.value * weight;
                    }
                }
            }
        }

        let scattered = material.sample(n, w_i, sample);
        if !scattered.valid {
            state.completed = true;
            return;
        }
        state.throughput *= scattered.weight;
        if state.throughput.is_black() {
            state.completed = true;
            return;
        }
        state.previous_pdf = scattered.pdf;
        state.previous_light_samplable = self.light_sampling();
        state.ray = Ray::new(
            self.offset(position, geometric_normal, scattered.direction),
            scattered.direction,
        );
        state.bounce += 1;

        self.russian_roulette(state, sample);
    }

    fn russian_roulette(&self, state: &mut PathState, sample: &RandomSample) {
        let rr = &self.russian_roulette;
        if !rr.enabled || state.bounce < rr.min_bounces {
            return;
        }
        let luminance = state.throughput.luminance();
        if luminance >= rr.threshold {
            return;
        }
        let survival = luminance / rr.threshold;
        if survival <= 0.0 || sample.russian_roulette >= survival {
            state.completed = true;
            return;
        }
        state.throughput /= survival;
    }
}
