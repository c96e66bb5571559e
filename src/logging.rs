use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants;

/// Initializes the logging system: console output always, plus a daily JSON
/// trace file in `trace_dir` when one is given.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the last event has been logged.
pub fn init_logging(trace_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match trace_dir {
        Some(dir) => {
            // Ensure logs directory exists
            let _ = fs::create_dir_all(dir);

            // Create a non-blocking file appender for daily log rotation
            let file_appender = tracing_appender::rolling::daily(dir, constants::TRACE_LOG_FILE);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(fmt::layer().json().with_writer(non_blocking_writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    // Human-readable on stderr so stdout stays clean for --json
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("app_ads_builder=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
