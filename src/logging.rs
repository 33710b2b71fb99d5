//! File-only tracing setup. The terminal belongs to the TUI, so nothing is
//! ever written to stdout.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "config_manager_tui=info";

/// `<data_dir>/cfm/logs`, created on demand.
fn ensure_logs_dir() -> std::io::Result<PathBuf> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cfm")
        .join("logs");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_env("CFM_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());

    let mut log_guard = None;
    let file_layer = match ensure_logs_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "cfm.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            log_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: failed to create logs directory: {}", err);
            None
        }
    };

    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    log_guard
}
