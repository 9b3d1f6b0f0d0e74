//! Structured logging initialization
//!
//! Installs a `tracing` subscriber for services embedding the dispatcher.
//! The library itself only emits events; calling [`init_logging_with_config`]
//! is the host application's choice.
//!
//! ## Environment Variables
//!
//! - `BRRTC_LOG_LEVEL`: trace/debug/info/warn/error (default `info`).
//!   `RUST_LOG`, when set, takes precedence.
//! - `BRRTC_LOG_FORMAT`: json/pretty (default `json`)
//! - `BRRTC_LOG_ASYNC`: buffer output on a background thread (default `true`)
//! - `BRRTC_LOG_TARGET_FILTER`: extra comma-separated filter directives,
//!   e.g. `brrtcontract::router=debug,hyper=warn`
//! - `BRRTC_LOG_INCLUDE_LOCATION`: include file:line (default `false`)

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    pub async_logging: bool,
    /// Comma-separated filter directives added on top of the level.
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup("BRRTC_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("BRRTC_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: lookup("BRRTC_LOG_ASYNC")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.async_logging),
            target_filter: lookup("BRRTC_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: lookup("BRRTC_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Development preset: debug level, pretty, synchronous, with locations.
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Parsed extra directives; invalid ones are skipped.
    fn directives(&self) -> Vec<Directive> {
        let Some(target_filter) = &self.target_filter else {
            return Vec::new();
        };
        target_filter
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .filter_map(|f| match f.parse() {
                Ok(directive) => Some(directive),
                Err(_) => {
                    eprintln!("Warning: Invalid log filter directive: {f}");
                    None
                }
            })
            .collect()
    }
}

/// Keeps the background writer alive; dropping it flushes pending logs.
#[must_use = "dropping the guard stops async log output"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set. Hold the returned guard for
/// the lifetime of the process when `async_logging` is on.
///
/// # Example
///
/// ```no_run
/// use brrtcontract::otel::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));
    for directive in config.directives() {
        env_filter = env_filter.add_directive(directive);
    }

    let (writer, worker) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking),
            Some(guard),
        )
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}
