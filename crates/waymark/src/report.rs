//! Report sinks for chain progress.
//!
//! A chain reports each step, each soft failure and, optionally, a screenshot
//! request when it fails. Sinks are best-effort: a failing sink is logged and
//! ignored, it never changes a chain's outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Error reported by a sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("report sink error: {message}")]
pub struct SinkError {
    /// Error message
    pub message: String,
}

impl SinkError {
    /// Create a sink error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Destination for chain progress
pub trait ReportSink: Send + Sync {
    /// Record a step
    fn log_step(&self, chain: &str, step_index: usize, description: &str) -> Result<(), SinkError>;

    /// Record a soft failure
    fn log_warning(&self, chain: &str, message: &str) -> Result<(), SinkError>;

    /// Request a screenshot labelled `label`
    fn attach_screenshot(&self, label: &str) -> Result<(), SinkError>;
}

/// Forward a step to a sink, logging sink failures
pub fn report_step(sink: &dyn ReportSink, chain: &str, step_index: usize, description: &str) {
    if let Err(err) = sink.log_step(chain, step_index, description) {
        tracing::warn!(chain, step_index, error = %err, "report sink rejected step");
    }
}

/// Forward a warning to a sink, logging sink failures
pub fn report_warning(sink: &dyn ReportSink, chain: &str, message: &str) {
    if let Err(err) = sink.log_warning(chain, message) {
        tracing::warn!(chain, error = %err, "report sink rejected warning");
    }
}

/// Request a screenshot from a sink, logging sink failures
pub fn report_screenshot(sink: &dyn ReportSink, label: &str) {
    if let Err(err) = sink.attach_screenshot(label) {
        tracing::warn!(label, error = %err, "report sink rejected screenshot");
    }
}

/// Sink that forwards everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn log_step(&self, chain: &str, step_index: usize, description: &str) -> Result<(), SinkError> {
        tracing::info!(chain, step_index, step = description, "chain step");
        Ok(())
    }

    fn log_warning(&self, chain: &str, message: &str) -> Result<(), SinkError> {
        tracing::warn!(chain, message, "chain warning");
        Ok(())
    }

    fn attach_screenshot(&self, label: &str) -> Result<(), SinkError> {
        tracing::info!(label, "screenshot requested");
        Ok(())
    }
}

/// Kind of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Step
    Step,
    /// Soft failure
    Warning,
    /// Screenshot request
    Screenshot,
}

/// Entry recorded by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Entry kind
    pub kind: EntryKind,
    /// Chain name (empty for screenshots)
    pub chain: String,
    /// Step index, for steps
    pub step_index: Option<usize>,
    /// Description, warning text or screenshot label
    pub message: String,
    /// When the entry was recorded
    pub at: DateTime<Utc>,
}

/// Sink that keeps entries in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<ReportEntry>>,
    fail: bool,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose every call fails
    #[must_use]
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Recorded entries in order
    #[must_use]
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded entries of one kind
    #[must_use]
    pub fn entries_of(&self, kind: EntryKind) -> Vec<ReportEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    fn push(
        &self,
        kind: EntryKind,
        chain: &str,
        step_index: Option<usize>,
        message: &str,
    ) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::new("sink unavailable"));
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ReportEntry {
                kind,
                chain: chain.to_string(),
                step_index,
                message: message.to_string(),
                at: Utc::now(),
            });
        Ok(())
    }
}

impl ReportSink for MemorySink {
    fn log_step(&self, chain: &str, step_index: usize, description: &str) -> Result<(), SinkError> {
        self.push(EntryKind::Step, chain, Some(step_index), description)
    }

    fn log_warning(&self, chain: &str, message: &str) -> Result<(), SinkError> {
        self.push(EntryKind::Warning, chain, None, message)
    }

    fn attach_screenshot(&self, label: &str) -> Result<(), SinkError> {
        self.push(EntryKind::Screenshot, "", None, label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        report_step(&sink, "login", 0, "navigate to dashboard");
        report_warning(&sink, "login", "badge missing");
        report_screenshot(&sink, "login-failure");

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Step);
        assert_eq!(entries[0].step_index, Some(0));
        assert_eq!(entries[1].message, "badge missing");
        assert!(entries[0].at <= entries[2].at);
        assert_eq!(sink.entries_of(EntryKind::Screenshot).len(), 1);
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        let sink = MemorySink::failing();
        assert!(sink.log_step("c", 0, "x").is_err());
        report_step(&sink, "c", 0, "x");
        report_warning(&sink, "c", "w");
        report_screenshot(&sink, "s");
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_everything() {
        let sink = TracingSink;
        assert!(sink.log_step("c", 1, "tap").is_ok());
        assert!(sink.log_warning("c", "w").is_ok());
        assert!(sink.attach_screenshot("s").is_ok());
    }

    #[test]
    fn test_entry_serializes_kind_snake_case() {
        let sink = MemorySink::new();
        report_warning(&sink, "c", "w");
        let json = serde_json::to_string(&sink.entries()[0]).unwrap();
        assert!(json.contains("\"kind\":\"warning\""));
    }
}
