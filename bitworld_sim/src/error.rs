//! Error types for the batch driver.

use bitworld_core::ConfigError;
use thiserror::Error;

/// Errors surfaced to the operator by the batch driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A run's configuration was rejected before it started
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Writing run output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// Summary serialization failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// A run panicked, or its worker died before reporting it
    #[error("Task {0} panicked")]
    WorkerPanicked(usize),

    /// The worker pool shut down while tasks were still queued
    #[error("Worker pool disconnected")]
    Disconnected,
}
