#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::nursery)]
#![warn(clippy::suboptimal_flops)]
#![deny(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![deny(clippy::semicolon_if_nothing_returned)]
#![deny(clippy::must_use_candidate)]
#![deny(clippy::double_must_use)]
#![deny(clippy::use_self)]
#![deny(clippy::unreadable_literal)]
#![deny(clippy::explicit_iter_loop)]
// these are lints to enable later
#![allow(clippy::cast_lossless)]
#![allow(clippy::module_name_repetitions)]

//! The sampling and integration core of a spectral path tracer.
//!
//! Given triangle geometry, materials and emitters, the crate estimates the radiance arriving
//! along camera rays by tracing random light paths. Colour is carried as a sampled [Spectrum]
//! over the visible range instead of RGB triples, and light sampling is combined with BSDF
//! sampling through multiple importance sampling.
//!
//! # Design Decisions
//! Lighting calculations are done exclusively in [f64]s. Microfacet lobes can be extremely spiky
//! and the extra precision keeps the sample weights finite in almost every configuration that
//! the validity gates let through.
//!
//! [`Material`]s are a closed enum over the four supported surface types. Every type
//! implements [`Bsdf`], and [`Material::evaluate`] / [`Material::sample`] dispatch with a single
//! `match`. Sampling always draws a direction first and then calls `evaluate` for it, so the
//! values returned by both functions can never diverge.
//!
//! Unlike a local-space BSDF library, all functions here work on world-space vectors:
//! `w_i` is the direction of the ray arriving at the surface (it points *towards* the surface)
//! and `w_o` is the direction light leaves into. The cosine `NdotO` is folded into
//! [`SampledMaterial::bsdf`] and `weight = bsdf / pdf` is returned alongside.
//!
//! Randomness is always injected. BSDFs and emitter sampling consume a [`RandomSample`] bundle
//! and the frame renderer owns one seeded [`rand_pcg::Pcg32`] stream per pixel, so every image
//! is reproducible.
//!
//! The ray/scene intersection service is the [`Intersector`] trait. A brute force
//! [`BruteForceIntersector`] is shipped for tests and small scenes.
//!
//! # References
//! * Eric Veach. *Robust monte carlo methods for light transport simulation.* PhD thesis, Stanford University, 1997.
//! * Bruce Walter, Stephen R. Marschner, Hongsong Li, and Kenneth E. Torrance. Microfacet models for refraction through rough surfaces. In *Proceedings of the Eurographics Symposium on Rendering,* 2007.
//! * Brian Smits. An RGB-to-spectrum conversion for reflectances. *Journal of Graphics Tools, 4(4):11–22,* 1999.
//! * Chris Wyman, Peter-Pike Sloan, and Peter Shirley. Simple analytic approximations to the CIE XYZ color matching functions. *JCGT, 2(2):1–11,* 2013.
//!     <https://jcgt.org/published/0002/02/01/>
//! * Laurent Belcour and Pascal Barla. A practical extension to microfacet theory for the modeling of varying iridescence. *ACM Transactions on Graphics, 36(4),* 2017.

mod core;

pub use core::{Bsdf, RandomSample, SampledMaterial, Vec2d, Vec3d};

#[cfg(test)]
pub(crate) mod test_utils;
pub(crate) mod utils;

pub mod cie;
pub mod conductor;
pub mod config;
pub mod dielectric;
pub mod diffuse;
pub mod emitter;
pub mod error;
pub mod fresnel;
pub mod ggx;
pub mod integrator;
pub mod material;
pub mod plastic;
pub mod render;
pub mod scene;
pub mod spectrum;

pub use config::{RenderConfig, RussianRoulette, SamplingStrategy};
pub use emitter::{EmitterTriangle, LightSample};
pub use error::{Error, Result};
pub use integrator::{Integrator, PathState};
pub use material::{Material, MaterialKind};
pub use render::{Camera, Film, Renderer};
pub use scene::{BruteForceIntersector, Intersection, Intersector, Ray, Scene, Triangle, Vertex};
pub use spectrum::{RgbClass, Spectrum};
