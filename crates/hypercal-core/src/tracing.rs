//! Logging setup shared by the hypercal binaries.
//!
//! ```ignore
//! use hypercal_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::daemon())?;
//! ```
//!
//! `RUST_LOG` always wins over the configured level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Target prefix shared by every hypercal crate.
const CRATE_TARGET: &str = "hypercal";

/// Target of the HTTP request logs emitted by `tower-http`.
const HTTP_TARGET: &str = "tower_http";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber was already installed.
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter directive does not parse.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log collectors.
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for hypercal targets when `RUST_LOG` is unset.
    pub default_level: Level,
    /// Rendering of log lines.
    pub output_format: TracingOutputFormat,
    /// Include file and line of the call site.
    pub include_location: bool,
    /// Include timestamps.
    pub include_timestamp: bool,
    /// Log request spans opened by the HTTP layer.
    pub include_http_requests: bool,
    /// Explicit filter directive, replacing the level-based default.
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_timestamp: true,
            include_http_requests: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Verbose terminal output for debugging a local server.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
            include_http_requests: true,
            env_filter: None,
        }
    }

    /// Structured output for a long-running server.
    #[must_use]
    pub fn daemon() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Json,
            include_location: false,
            include_timestamp: true,
            include_http_requests: true,
            env_filter: None,
        }
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Sets an explicit filter directive.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Returns the directive used when neither `RUST_LOG` nor an explicit
    /// filter is set.
    pub fn default_directive(&self) -> String {
        let mut directive = format!("{CRATE_TARGET}={}", self.default_level);
        if self.include_http_requests {
            directive.push_str(&format!(",{HTTP_TARGET}={}", self.default_level));
        }
        directive
    }

    fn filter(&self) -> Result<EnvFilter, TracingError> {
        match &self.env_filter {
            Some(directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(true)
            .with_span_events(FmtSpan::NONE);

        match (self.output_format, self.include_timestamp) {
            (TracingOutputFormat::Pretty, true) => base.pretty().boxed(),
            (TracingOutputFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (TracingOutputFormat::Compact, true) => base.compact().boxed(),
            (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
            (TracingOutputFormat::Json, true) => base.json().boxed(),
            (TracingOutputFormat::Json, false) => base.json().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Call once, early in `main`.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter directive is
/// invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.filter()?;
    let subscriber = tracing_subscriber::registry()
        .with(config.layer())
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert!(!config.include_http_requests);
        assert_eq!(config.default_directive(), "hypercal=INFO");
    }

    #[test]
    fn cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(config.include_location);
        assert_eq!(
            config.default_directive(),
            "hypercal=DEBUG,tower_http=DEBUG"
        );
    }

    #[test]
    fn daemon_config() {
        let config = TracingConfig::daemon();
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.include_timestamp);
        assert!(config.include_http_requests);
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("hypercal_server=trace");

        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("hypercal_server=trace"));
    }

    #[test]
    fn invalid_directive_is_rejected() {
        let config = TracingConfig::default().with_env_filter("hypercal=loud");
        assert!(matches!(config.filter(), Err(TracingError::EnvFilter(_))));
    }
}
