//! Structured logging for the purge service.
//!
//! One global subscriber: an `EnvFilter` plus a single fmt layer whose shape
//! is picked by [`LogFormat`]. Purge ticks log with `aggregation`, `table`
//! and `cutoff` fields, so the JSON format is the one to ship to a collector.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Filter used when none is configured or the configured one is invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Output shape of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-field human readable lines.
    #[default]
    Full,
    /// Single-line human readable output without targets.
    Compact,
    /// One JSON object per event, including the current span.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "text" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `info,worker=debug`.
    pub filter: String,
    pub format: LogFormat,
    /// Log span open/close, useful for timing purge ticks.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Reads `RUST_LOG`, `LOG_FORMAT` and `LOG_SPANS`.
    ///
    /// An unknown `LOG_FORMAT` falls back to the default format.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            filter: lookup("RUST_LOG").unwrap_or(defaults.filter),
            format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.format),
            span_events: lookup("LOG_SPANS")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Full => fmt::layer().with_span_events(spans).boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_target(false)
                .with_span_events(spans)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_events(spans)
                .boxed(),
        }
    }
}

/// Installs the global subscriber.
///
/// Returns `false` if one was already installed, which happens when tests
/// initialize logging more than once.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let installed = tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    }
    installed
}

pub fn init_tracing_from_env() -> bool {
    init_tracing(&TracingConfig::from_env())
}
