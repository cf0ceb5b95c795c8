use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber: stdout plus a daily-rolling
/// `<log_dir>/<file_name>`. `RUST_LOG` overrides the `info` default.
/// Calling it twice is a no-op.
pub fn init(paths: &AppPaths, file_name: &str) {
    if let Err(err) = std::fs::create_dir_all(&paths.log_dir) {
        eprintln!("cannot create {}: {}", paths.log_dir.display(), err);
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&paths.log_dir, file_name));
    if LOG_GUARD.set(guard).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init();
}
