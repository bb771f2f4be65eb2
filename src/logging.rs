use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{CatalogError, Result};

/// Build the filter: `RUST_LOG` wins, then the verbosity flag, then `info`
pub fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "drive_catalog=debug,info" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a stderr text subscriber for the process
///
/// The library only emits `tracing` events; the binary calls this once at
/// startup.
pub fn init(verbose: bool) -> Result<()> {
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    Registry::default()
        .with(build_filter(verbose))
        .with(layer)
        .try_init()
        .map_err(|e| CatalogError::InvalidConfig {
            message: format!("Failed to initialize logging: {}", e),
        })
}
