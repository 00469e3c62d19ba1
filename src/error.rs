//! Error types for the fallible edges of the crate
//!
//! The simulation itself never fails; these only surface while loading
//! configuration, touching storage, or driving an audio backend, and the
//! callers degrade to defaults.

use thiserror::Error;

/// Settings or ruleset could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ruleset has no levels")]
    NoLevels,
    #[error("invalid spawn gap for {population}: min {min}, max {max}")]
    InvalidGap {
        population: &'static str,
        min: f32,
        max: f32,
    },
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// Key/value storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value for `{key}` is malformed")]
    Malformed { key: String },
}

/// Audio backend failure
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output not available")]
    Unavailable,
    #[error("audio backend rejected tone: {0}")]
    Backend(String),
}
