//! Camera, progressive accumulation buffer and the parallel frame loop.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::{
    cie,
    config::RenderConfig,
    integrator::Integrator,
    scene::{Intersector, Ray, Scene},
    Error, RandomSample, Result, Spectrum, Vec2d, Vec3d,
};

/// Pinhole camera for generating primary rays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub width: u32,
    pub height: u32,
    center: Vec3d,
    pixel00_loc: Vec3d,
    pixel_delta_u: Vec3d,
    pixel_delta_v: Vec3d,
}

impl Camera {
    /// Looks from `look_from` towards `look_at` with a vertical field of view of `vfov` degrees
    #[must_use]
    pub fn look_at(
        look_from: Vec3d,
        look_at: Vec3d,
        vup: Vec3d,
        vfov: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let h = (vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (f64::from(width) / f64::from(height));

        // camera basis
        let w = (look_from - look_at).normalize();
        let u = vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;
        let pixel_delta_u = viewport_u / f64::from(width);
        let pixel_delta_v = viewport_v / f64::from(height);

        let viewport_upper_left = look_from - w - viewport_u / 2.0 - viewport_v / 2.0;
        Self {
            width,
            height,
            center: look_from,
            pixel00_loc: viewport_upper_left,
            pixel_delta_u,
            pixel_delta_v,
        }
    }

    /// Ray through pixel `(x, y)`, `jitter` in `[0, 1)²` picks the point within the pixel
    #[must_use]
    pub fn generate_ray(&self, x: u32, y: u32, jitter: Vec2d) -> Ray {
        let pixel_sample = self.pixel00_loc
            + (f64::from(x) + jitter.x) * self.pixel_delta_u
            + (f64::from(y) + jitter.y) * self.pixel_delta_v;
        Ray::new(self.center, pixel_sample - self.center)
    }
}

/// Apply the sRGB transfer curve
fn linear_to_gamma(linear: f64) -> f64 {
    if linear <= 0.003_130_8 {
        12.92 * linear.max(0.0)
    } else {
        1.055f64.mul_add(linear.powf(1.0 / 2.4), -0.055)
    }
}

/// Convert a linear color to 8-bit RGBA.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color_to_rgba(color: Vec3d) -> [u8; 4] {
    let channel = |c: f64| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

/// Running XYZ sums of all accumulated frames
#[derive(Clone, Debug)]
pub struct Film {
    width: u32,
    height: u32,
    sums: Vec<Vec3d>,
    frames: u32,
}

impl Film {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sums: vec![Vec3d::ZERO; width as usize * height as usize],
            frames: 0,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames in the average
    #[must_use]
    pub const fn frames(&self) -> u32 {
        self.frames
    }

    /// Discards everything accumulated so far, e.g. because the camera moved
    pub fn reset(&mut self) {
        self.sums.fill(Vec3d::ZERO);
        self.frames = 0;
    }

    /// Adds one frame of per pixel XYZ estimates
    ///
    /// # Panics
    /// if `frame` does not have one value per pixel
    pub fn add_frame(&mut self, frame: &[Vec3d]) {
        assert_eq!(frame.len(), self.sums.len());
        for (sum, value) in self.sums.iter_mut().zip(frame) {
            *sum += *value;
        }
        self.frames += 1;
    }

    /// Average XYZ of every pixel
    #[must_use]
    pub fn to_xyz(&self) -> Vec<Vec3d> {
        let scale = 1.0 / f64::from(self.frames.max(1));
        self.sums.iter().map(|sum| *sum * scale).collect()
    }

    /// Average linear RGB of every pixel
    #[must_use]
    pub fn to_rgb(&self) -> Vec<Vec3d> {
        self.to_xyz()
            .into_iter()
            .map(|xyz| cie::XYZ_TO_RGB * xyz)
            .collect()
    }

    /// Gamma corrected RGBA bytes, row by row
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.to_rgb().into_iter().flat_map(color_to_rgba).collect()
    }

    /// Root mean square difference between the current estimate and a linear RGB reference
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if the reference has a different number of pixels
    #[allow(clippy::cast_precision_loss)]
    pub fn rms_difference(&self, reference: &[Vec3d]) -> Result<f64> {
        if reference.len() != self.sums.len() {
            return Err(Error::InvalidConfig(format!(
                "reference has {} pixels, the film has {}",
                reference.len(),
                self.sums.len()
            )));
        }
        let squared: f64 = self
            .to_rgb()
            .iter()
            .zip(reference)
            .map(|(a, b)| (*a - *b).length_squared())
            .sum();
        Ok((squared / (3 * reference.len()).max(1) as f64).sqrt())
    }
}

/// Renders frames of a scene in parallel and accumulates them on a [`Film`]
pub struct Renderer<'a> {
    config: RenderConfig,
    camera: Camera,
    scene: &'a Scene,
    intersector: &'a dyn Intersector,
    film: Film,
    frame: u32,
    /// non-finite samples dropped in the last frame
    discarded: usize,
}

impl<'a> Renderer<'a> {
    /// # Errors
    /// [`Error::InvalidConfig`] if the configuration is invalid or the camera resolution does
    /// not match it
    pub fn new(
        config: RenderConfig,
        camera: Camera,
        scene: &'a Scene,
        intersector: &'a dyn Intersector,
    ) -> Result<Self> {
        config.validate()?;
        if camera.width != config.width || camera.height != config.height {
            return Err(Error::InvalidConfig(format!(
                "camera resolution {}x{} does not match the configured {}x{}",
                camera.width, camera.height, config.width, config.height
            )));
        }
        let film = Film::new(config.width, config.height);
        Ok(Self {
            config,
            camera,
            scene,
            intersector,
            film,
            frame: 0,
            discarded: 0,
        })
    }

    #[must_use]
    pub const fn film(&self) -> &Film {
        &self.film
    }

    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Number of non-finite samples dropped while rendering the last frame
    #[must_use]
    pub const fn discarded_samples(&self) -> usize {
        self.discarded
    }

    /// Moves the camera and discards the accumulated image
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.film.reset();
    }

    /// Whether `max_frames` have been accumulated
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.config.max_frames != 0 && self.film.frames() >= self.config.max_frames
    }

    /// Seed of the random streams of frame `frame`, every pixel uses its index as stream id
    const fn frame_seed(seed: u64, frame: u32) -> u64 {
        seed ^ (frame as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }

    /// Renders one frame and adds it to the film. Returns `false` without rendering once
    /// `max_frames` have been accumulated.
    pub fn render_frame(&mut self) -> bool {
        if self.is_converged() {
            return false;
        }
        let start = Instant::now();
        let integrator = Integrator::new(self.scene, self.intersector, &self.config);
        let seed = Self::frame_seed(self.config.seed, self.frame);
        let width = self.config.width as usize;
        let samples = self.config.samples_per_frame;
        let camera = &self.camera;
        let discarded = AtomicUsize::new(0);

        let mut pixels = vec![Vec3d::ZERO; self.config.pixel_count()];
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let index = y * width + x;
                    let mut rng = Pcg32::new(seed, index as u64);
                    let mut sum = Spectrum::ZERO;
                    for _ in 0..samples {
                        let sample = RandomSample::draw(&mut rng);
                        #[allow(clippy::cast_possible_truncation)]
                        let ray = camera.generate_ray(x as u32, y as u32, sample.pixel);
                        let radiance = integrator.render_sample(ray, &sample, &mut rng);
                        if radiance.is_finite() {
                            sum += radiance;
                        } else {
                            discarded.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    *pixel = (sum / f64::from(samples)).to_xyz();
                }
            });

        self.film.add_frame(&pixels);
        self.frame += 1;

        self.discarded = discarded.into_inner();
        if self.discarded > 0 {
            log::warn!(
                "frame {}: discarded {} non-finite samples",
                self.frame,
                self.discarded
            );
        }
        log::debug!(
            "frame {} took {:?}, {} samples per pixel accumulated",
            self.frame,
            start.elapsed(),
            self.film.frames() * samples
        );
        true
    }

    /// Renders until `max_frames` are accumulated. Does nothing for unbounded accumulation.
    pub fn render_to_convergence(&mut self) {
        while self.render_frame() {}
    }
}
