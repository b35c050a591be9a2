use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset: info everywhere, debug for
/// this crate's handlers, sessions and storage.
pub const DEFAULT_FILTER: &str = "info,appgen=debug";

/// Install stdout and daily-rolling `appgen.log` logging. `RUST_LOG`
/// replaces [`DEFAULT_FILTER`] entirely when set. Keep the returned guard
/// alive or buffered file output is lost.
pub fn init_logging(logs_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, "appgen.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()?;

    tracing::info!("Logging initialized. Logs directory: {:?}", logs_dir);
    Ok(guard)
}
