//! Logging Infrastructure
//!
//! `tracing` subscriber setup: env filter, optional JSON output, optional
//! daily rolling file.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional level, JSON formatting and file output.
///
/// `RUST_LOG` wins over `log_level` when set. A `log_dir` that does not exist
/// is ignored and logs go to stdout.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crab_sku={level},shared={level},warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_dir = log_dir
        .map(Path::new)
        .filter(|p| p.exists())
        .and_then(|p| p.to_str());

    // try_init: tests and embedders may already have a subscriber installed
    match (file_dir, json.unwrap_or(false)) {
        (Some(dir), true) => {
            let appender = tracing_appender::rolling::daily(dir, "crab-sku");
            let _ = builder.json().with_writer(appender).try_init();
        }
        (Some(dir), false) => {
            let appender = tracing_appender::rolling::daily(dir, "crab-sku");
            let _ = builder.with_ansi(false).with_writer(appender).try_init();
        }
        (None, true) => {
            let _ = builder.json().try_init();
        }
        (None, false) => {
            let _ = builder.try_init();
        }
    }
}
