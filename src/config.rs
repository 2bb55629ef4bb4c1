//! Render settings, loadable from JSON
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    spectrum::{RgbClass, Spectrum},
    Error, Result, Vec3d,
};

/// How the integrator finds light
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Light and BSDF sampling combined with the power heuristic
    #[default]
    Mis,
    /// Next event estimation only. Emitters hit by BSDF sampling after the first bounce are
    /// ignored.
    Light,
    /// No next event estimation, emission is collected whenever a BSDF sample hits an emitter
    Bsdf,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RussianRoulette {
    pub enabled: bool,
    /// bounces that are always traced
    pub min_bounces: u32,
    /// paths whose throughput luminance falls below this value may be terminated
    pub threshold: f64,
}

impl Default for RussianRoulette {
    fn default() -> Self {
        Self {
            enabled: true,
            min_bounces: 3,
            threshold: 0.1,
        }
    }
}

/// Render configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel and frame
    pub samples_per_frame: u32,
    /// Accumulation stops after this many frames, `0` accumulates forever
    pub max_frames: u32,
    /// Maximum path length
    pub max_bounces: u32,
    pub strategy: SamplingStrategy,
    pub russian_roulette: RussianRoulette,
    /// Linear RGB radiance of rays that leave the scene
    pub environment: [f64; 3],
    /// Base of the per pixel random streams
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            samples_per_frame: 1,
            max_frames: 0,
            max_bounces: 16,
            strategy: SamplingStrategy::Mis,
            russian_roulette: RussianRoulette::default(),
            environment: [0.0; 3],
            seed: 0,
        }
    }
}

impl RenderConfig {
    /// # Errors
    /// [`Error::InvalidConfig`] for empty images, zero samples or bounces and negative or
    /// non-finite parameters.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "image size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.samples_per_frame == 0 {
            return Err(Error::InvalidConfig(
                "samples_per_frame must be at least 1".to_owned(),
            ));
        }
        if self.max_bounces == 0 {
            return Err(Error::InvalidConfig(
                "max_bounces must be at least 1".to_owned(),
            ));
        }
        let threshold = self.russian_roulette.threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "russian roulette threshold {threshold} is invalid"
            )));
        }
        if self.environment.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(Error::InvalidConfig(format!(
                "environment {:?} must be finite and non-negative",
                self.environment
            )));
        }
        Ok(())
    }

    /// Parses and validates a configuration. Missing fields take their default.
    ///
    /// # Errors
    /// [`Error::Json`] for malformed input, [`Error::InvalidConfig`] if validation fails
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [`Error::Io`] if the file cannot be read, otherwise see [`RenderConfig::from_json_str`]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The environment radiance as an illuminant spectrum
    #[must_use]
    pub fn environment_spectrum(&self) -> Spectrum {
        let [r, g, b] = self.environment;
        Spectrum::from_rgb(RgbClass::Illuminant, Vec3d::new(r, g, b))
    }

    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RenderConfig::from_json_str(
            r#"{ "width": 64, "strategy": "Bsdf", "russian_roulette": { "min_bounces": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 512);
        assert_eq!(config.strategy, SamplingStrategy::Bsdf);
        assert_eq!(config.russian_roulette.min_bounces, 5);
        assert!(config.russian_roulette.enabled);
        assert_eq!(config.max_bounces, 16);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        for json in [
            r#"{ "width": 0 }"#,
            r#"{ "samples_per_frame": 0 }"#,
            r#"{ "max_bounces": 0 }"#,
            r#"{ "russian_roulette": { "threshold": -1.0 } }"#,
            r#"{ "environment": [0.5, -0.1, 0.0] }"#,
        ] {
            assert!(matches!(
                RenderConfig::from_json_str(json),
                Err(Error::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            RenderConfig::from_json_str("{ width: }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let config = RenderConfig {
            environment: [0.1, 0.2, 0.3],
            seed: 42,
            ..RenderConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RenderConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn missing_files_are_io_errors() {
        assert!(matches!(
            RenderConfig::from_json_file("/nonexistent/render.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn grey_environment_is_flat() {
        let config = RenderConfig {
            environment: [0.5; 3],
            ..RenderConfig::default()
        };
        let env = config.environment_spectrum();
        assert!((env.min_value() - 0.5).abs() < 0.01);
        assert!((env.max_value() - 0.5).abs() < 0.01);
    }
}
