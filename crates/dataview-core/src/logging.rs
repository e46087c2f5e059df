//! JSON log output for production builds.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's call. This helper installs a JSON formatter filtered by an
//! `EnvFilter` directive such as `"dataview=debug,warn"`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Install a global JSON subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when set.
pub fn init_json(default_filter: &str) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}
