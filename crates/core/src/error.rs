//! Error types for the application layer.

use thiserror::Error;

/// Application-level error type.
///
/// GPU failures have their own type in `ripples-rhi`; this one covers the
/// window, configuration and setup concerns that sit above it.
#[derive(Error, Debug)]
pub enum Error {
    /// Vulkan-related errors surfaced outside the RHI (e.g. surface creation)
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Malformed configuration value
    #[error("Config error: {key}: {message}")]
    Config { key: String, message: String },

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias using the application's Error type.
pub type Result<T> = std::result::Result<T, Error>;
