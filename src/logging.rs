//! Logging setup: daily-rotated text and JSON files plus a compact terminal layer.
//!
//! The crawl runs for hours at the default politeness delay, so the file logs are what
//! you read afterwards; the terminal only gets the short form.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber with multi-layer setup.
///
/// Creates two log files in `log_dir`, rotated daily:
/// 1. `app.log` - Human-readable text format with ANSI colors disabled
/// 2. `app.json.log` - Structured JSON format for parsing/analysis
///
/// # Environment Variables
/// * `RUST_LOG` - Controls log level filtering (default: "info")
///   Examples:
///   - `RUST_LOG=debug` - Show all debug and above
///   - `RUST_LOG=docs_taxonomy=trace,reqwest=warn` - Trace for the crawler, warn for reqwest
///
/// # Errors
/// Fails if the directory cannot be created or a global subscriber is already installed.
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let text_file_appender = tracing_appender::rolling::daily(log_path, "app.log");
    let (text_writer, text_guard) = tracing_appender::non_blocking(text_file_appender);

    let json_file_appender = tracing_appender::rolling::daily(log_path, "app.json.log");
    let (json_writer, json_guard) = tracing_appender::non_blocking(json_file_appender);

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter.clone());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(env_filter.clone());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()?;

    // Guards flush the background writers on drop; they must outlive the program
    Box::leak(Box::new(text_guard));
    Box::leak(Box::new(json_guard));

    tracing::debug!("Logging to {}/app.log and {}/app.json.log", log_path.display(), log_path.display());

    Ok(())
}

/// Logs go to `<data_dir>/logs`.
pub fn init_logging_in_data_dir<P: AsRef<Path>>(data_dir: P) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(data_dir.as_ref().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logging_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        // The global subscriber can only be installed once per process; a second call
        // must report an error instead of panicking.
        let _ = init_logging_in_data_dir(&data_dir);
        assert!(data_dir.join("logs").is_dir());
        assert!(init_logging_in_data_dir(&data_dir).is_err());
    }
}
