//! Tracing subscriber setup for binaries and tests embedding the crate.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "workplace_tracker=info";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`; `filter` wins over [`DEFAULT_FILTER`].
/// Fails instead of panicking if a global subscriber is already set.
pub fn init(filter: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
}
