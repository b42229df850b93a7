//! Logging initialization and configuration.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,ripples=debug,ripples_renderer=debug,ripples_rhi=info";

/// Initialize the logging system with tracing.
///
/// Filtering follows `RUST_LOG` and falls back to [`DEFAULT_FILTER`].
/// Calling this twice returns an error instead of panicking.
///
/// # Example
/// ```
/// ripples_core::init_logging().ok();
/// tracing::info!("Ripples starting");
/// ```
pub fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
