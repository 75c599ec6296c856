use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set, so operators can
/// raise verbosity without touching config files.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    tracing::info!("Logging initialized with level: {}", config.level);
}
