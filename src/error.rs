//! Error types for the construction boundary of the tracer.
//!
//! Sampling never fails with an error: impossible samples are flagged as invalid and contribute
//! nothing. Errors only come from loading a configuration or assembling a scene.

use thiserror::Error;

/// Errors raised while validating input data
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    #[error("invalid spectral data: {0}")]
    InvalidSpectrum(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
