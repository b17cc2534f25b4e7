//! Tracing subscriber setup from the logging configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::models::LoggingConfig;

/// Install the global subscriber on stderr.
///
/// `RUST_LOG` still wins when set; otherwise the configured level seeds the
/// filter. The configured format picks the layer shape (`json` or `pretty`).
/// A second call keeps the first subscriber, so tests sharing a process can
/// call this freely.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    // Already-initialized is the only failure mode and it is benign.
    drop(result);
}
