//! Logging utilities for the Clubhouse crates.
//!
//! Everything logs through `tracing`. This module installs the subscriber:
//! a formatted stdout layer filtered by `RUST_LOG` plus a default directive,
//! and optionally a daily-rolling file under the configured directory.

use clubhouse_config::LoggingConfig;
use once_cell::sync::OnceCell;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keeps the background file writer alive for the life of the process.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize the tracing subscriber at INFO.
///
/// # Examples
///
/// ```
/// use clubhouse_common::logging;
///
/// logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// The level applies to the `clubhouse` targets; `RUST_LOG` can still add or
/// override directives. Calling this twice is harmless.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// An unparsable level falls back to INFO. When a directory is configured,
/// records are also written to `<directory>/clubhouse.log.<date>`.
pub fn init_from_config(config: &LoggingConfig) {
    let level = config
        .level
        .as_deref()
        .and_then(|raw| raw.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let Some(directory) = config.directory.as_deref() else {
        init_with_level(level);
        return;
    };

    let appender = tracing_appender::rolling::daily(directory, "clubhouse.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        let _ = FILE_GUARD.set(guard);
        info!(
            "Logging initialized at level: {} (files in {})",
            level, directory
        );
    }
}

fn stdout_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
}

fn filter_for(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("clubhouse={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
