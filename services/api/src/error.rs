//! services/api/src/error.rs
//!
//! Startup failures of the study companion server. Request-time failures never
//! reach this type; handlers turn them into responses (see `web::errors`).

use crate::config::ConfigError;
use study_companion_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment is missing a required variable or holds a bad value.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Opening the data directory failed.
    #[error("Storage setup failed: {0}")]
    Port(#[from] PortError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other startup problem, such as an `ALLOWED_ORIGIN` that is not a
    /// valid header value.
    #[error("Startup failed: {0}")]
    Internal(String),
}
