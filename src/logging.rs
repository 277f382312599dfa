use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Routes tracing output to a daily log file; the terminal belongs to the UI.
///
/// `RUST_LOG` wins over the configured level when set. Keep the returned
/// guard alive for the life of the program or buffered lines are lost.
pub fn initialize_logging(config: &LoggingConfig) -> WorkerGuard {
    // Create the log directory if it doesn't exist
    let _ = std::fs::create_dir_all(&config.directory);

    let file_appender = tracing_appender::rolling::daily(&config.directory, "farefinder.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging initialized at level '{}'.", config.level);
    guard
}
