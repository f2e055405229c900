//! `tracing-subscriber` initialization.
//!
//! Installs a global subscriber with an `EnvFilter` and either JSON or
//! human-readable output. `RUST_LOG` takes precedence over the configured
//! filter.

use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case the
/// existing one is left in place.
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.log_json {
        builder.json().finish().try_init()
    } else {
        builder.finish().try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(json = config.log_json, "Tracing initialized");
            true
        }
        Err(_) => false,
    }
}
