use relocator_core::AppConfig;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Terminal output plus a plain-text copy in `config.log_file`. Keep the
/// returned guard alive until exit so buffered lines reach the file.
pub fn init_logger(config: &AppConfig) -> WorkerGuard {
    let file_appender =
        tracing_appender::rolling::never(config.log_directory(), config.log_file_name());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(EnvFilter::new(&config.log_level))
        .init();

    info!("Logging at {} to {}", config.log_level, config.log_file);

    guard
}
