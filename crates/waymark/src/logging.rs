//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; binaries and test harnesses call
//! [`init_tracing`] once to install a subscriber. The filter is read from
//! `WAYMARK_LOG`, then `RUST_LOG`, then falls back to `info`.

use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "WAYMARK_LOG";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = WaymarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(WaymarkError::config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Build the event filter, using `default_directive` when no variable is set
#[must_use]
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber at `info`
pub fn init_tracing(format: LogFormat) -> WaymarkResult<()> {
    init_tracing_with(format, "info")
}

/// Install the global subscriber with a default filter directive
///
/// # Errors
///
/// Returns a configuration error if a global subscriber is already set.
pub fn init_tracing_with(format: LogFormat, default_directive: &str) -> WaymarkResult<()> {
    let registry = tracing_subscriber::registry().with(env_filter(default_directive));
    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| WaymarkError::config(format!("tracing already initialized: {e}")))
}
