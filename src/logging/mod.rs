//! Tracing and logging infrastructure.
//!
//! Call [`setup_tracing`] once at application startup:
//!
//! ```rust,ignore
//! let config = Config::from_env()?;
//! sensor_service::logging::setup_tracing(config.log_level);
//! ```
//!
//! # Output Modes
//!
//! Without `pretty_logs`, every event is written to stdout as one JSON object per line:
//! ```text
//! {"correlationId":"req-5d1c0a9e3b7f4a21","level":"info","message":"Fetching sensor","sensor_id":"motion_kitchen","service":"sensor-service","timestamp":"2026-01-18T14:30:00.123Z"}
//! ```
//!
//! With `pretty_logs`, output is colorized with a local timestamp:
//! ```text
//! 14:32:01.234 INFO  [req-5d1c0a9e3b7f4a21] sensor_service::service: Fetching sensor sensor_id="motion_kitchen"
//! ```
//!
//! # Correlation Ids
//!
//! Events inherit the `correlation_id` of the innermost enclosing span which
//! recorded one (see [`correlation::CorrelationLayer`]). Spans of this crate are
//! never filtered away by the log level, so a `warn` line emitted inside an
//! `info` request span still carries its id.

use crate::config::LogLevel;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{FilterExt, filter_fn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

pub mod correlation;
pub mod json;

#[cfg(feature = "pretty_logs")]
mod pretty;

use correlation::CorrelationLayer;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Initializes the tracing subscriber writing to stdout.
///
/// # Panics
///
/// Panics if called more than once (tracing subscriber can only be set once).
pub fn setup_tracing(level: LogLevel) {
    Registry::default()
        .with(CorrelationLayer)
        .with(setup_console_layer(level, std::io::stdout))
        .init();

    tracing::info!(log_level = %level, "Tracing initialized successfully");
}

pub fn as_level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
    }
}

/// Admits events up to the given level and every span of this crate.
fn console_filter<S>(level: LogLevel) -> impl Filter<S> + Send + Sync + 'static
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    filter_fn(|metadata| metadata.is_span() && metadata.target().starts_with(CRATE_TARGET))
        .or(as_level_filter(level))
}

#[cfg(not(feature = "pretty_logs"))]
fn setup_console_layer<S, W>(level: LogLevel, writer: W) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .event_format(json::JsonLogFormat)
        .with_filter(console_filter(level))
        .boxed()
}

#[cfg(feature = "pretty_logs")]
fn setup_console_layer<S, W>(level: LogLevel, writer: W) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .event_format(pretty::PrettyConsoleLogFormat)
        .with_filter(console_filter(level))
        .boxed()
}
