//! Core utilities for the ripples demo.
//!
//! This crate provides foundational types used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Runtime configuration
//! - The frame [`Clock`]

mod clock;
mod config;
mod error;
mod logging;

pub use clock::{Clock, MonotonicSource, TimeSource, time_seed};
pub use config::{CameraConfig, Config, WindowConfig};
pub use error::{Error, Result};
pub use logging::{DEFAULT_FILTER, init_logging};
