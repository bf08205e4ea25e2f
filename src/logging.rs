//! Logging setup using `tracing-subscriber`.
//!
//! Levels used across the crate:
//! - `warn`: skipped transforms, slow operations, unreadable settings
//! - `info`: project load/save, settings load/save, project replacement
//! - `debug`: pipeline totals, commits, undo/redo, rejected mutations
//! - `trace`: per-operation timings with the `profiling` feature

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global formatting subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice
/// returns an error instead of panicking.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("Invalid log filter {default_filter:?}: {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}
