//! Action chains: ordered navigate/assert/act steps and their results.
//!
//! Each step carries an explicit `critical` flag. A critical failure aborts
//! the chain and marks it [`ChainStatus::Failed`]; a non-critical failure is
//! recorded as a warning and the chain continues. Navigation is always
//! critical.

use crate::driver::UiAction;
use crate::probe::Probe;
use crate::result::{WaymarkError, WaymarkResult};
use crate::screen::ScreenDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Drive the UI to a screen
    Navigate {
        /// Target screen
        screen: ScreenDescriptor,
        /// Actions performed on each attempt
        actions: Vec<UiAction>,
    },
    /// Evaluate a probe against an expected value
    Assert {
        /// Probe to evaluate
        probe: Probe,
        /// Expected value
        expected: bool,
    },
    /// Perform actions
    Act {
        /// Actions in order
        actions: Vec<UiAction>,
    },
}

/// A chain step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    kind: StepKind,
    critical: bool,
    label: Option<String>,
}

impl Step {
    /// Navigate to `screen` (always critical)
    #[must_use]
    pub fn navigate(screen: ScreenDescriptor, actions: Vec<UiAction>) -> Self {
        Self::critical(StepKind::Navigate { screen, actions })
    }

    /// Assert that `probe` evaluates to `expected`
    #[must_use]
    pub fn assert(probe: Probe, expected: bool) -> Self {
        Self::critical(StepKind::Assert { probe, expected })
    }

    /// Perform `actions`
    #[must_use]
    pub fn act(actions: Vec<UiAction>) -> Self {
        Self::critical(StepKind::Act { actions })
    }

    const fn critical(kind: StepKind) -> Self {
        Self {
            kind,
            critical: true,
            label: None,
        }
    }

    /// Downgrade to non-critical (no effect on navigation)
    #[must_use]
    pub fn soft(self) -> Self {
        self.with_critical(false)
    }

    /// Set criticality (navigation stays critical)
    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical || matches!(self.kind, StepKind::Navigate { .. });
        self
    }

    /// Attach a human-readable label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Step kind
    #[must_use]
    pub const fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Whether a failure aborts the chain
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.critical
    }

    /// Label, if any
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            return f.write_str(label);
        }
        match &self.kind {
            StepKind::Navigate { screen, .. } => write!(f, "navigate to {}", screen.id()),
            StepKind::Assert { probe, expected } => {
                write!(f, "assert {} is {expected}", probe.name())
            }
            StepKind::Act { actions } => {
                let parts: Vec<String> = actions.iter().map(ToString::to_string).collect();
                write!(f, "act: {}", parts.join(", "))
            }
        }
    }
}

/// A named sequence of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Chain name
    pub name: String,
    /// Steps replayed unless the previous chain handed off its state
    pub setup: Vec<Step>,
    /// Main steps
    pub steps: Vec<Step>,
    /// Let the next chain skip its setup after this one passes
    pub hand_off: bool,
}

impl Chain {
    /// Create an empty chain
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: Vec::new(),
            steps: Vec::new(),
            hand_off: false,
        }
    }

    /// Append a setup step
    #[must_use]
    pub fn setup_step(mut self, step: Step) -> Self {
        self.setup.push(step);
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Set the hand-off flag
    #[must_use]
    pub const fn with_hand_off(mut self, hand_off: bool) -> Self {
        self.hand_off = hand_off;
        self
    }
}

/// Part of a chain a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Setup steps
    Setup,
    /// Main steps
    Main,
}

/// What went wrong in a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    /// Navigation exhausted its attempts
    Navigation {
        /// Target screen
        screen: String,
        /// Attempts performed
        attempts: u32,
    },
    /// A probe disagreed with its expected value
    Assertion {
        /// Probe name
        probe: String,
        /// Expected value
        expected: bool,
        /// Observed value
        actual: bool,
    },
    /// An action could not be performed
    Action {
        /// Action description
        action: String,
        /// Driver error message
        message: String,
    },
    /// An asserted probe is malformed
    InvalidProbe {
        /// Probe name
        probe: String,
        /// Why the probe is invalid
        message: String,
    },
}

impl FailureKind {
    /// Failures that abort the chain regardless of the step's flag
    #[must_use]
    pub const fn is_always_critical(&self) -> bool {
        matches!(self, Self::Navigation { .. } | Self::InvalidProbe { .. })
    }
}

/// A step failure, critical or recorded as a warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Phase of the failing step
    pub phase: StepPhase,
    /// Index of the step within its phase
    pub step_index: usize,
    /// Whether the failure aborted the chain
    pub critical: bool,
    /// Failure details
    pub kind: FailureKind,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            StepPhase::Setup => "setup step",
            StepPhase::Main => "step",
        };
        match &self.kind {
            FailureKind::Navigation { screen, attempts } => write!(
                f,
                "{phase} {}: navigation to '{screen}' failed after {attempts} attempt(s)",
                self.step_index
            ),
            FailureKind::Assertion {
                probe,
                expected,
                actual,
            } => write!(
                f,
                "{phase} {}: probe '{probe}' expected {expected}, got {actual}",
                self.step_index
            ),
            FailureKind::Action { action, message } => {
                write!(f, "{phase} {}: {action} failed: {message}", self.step_index)
            }
            FailureKind::InvalidProbe { probe, message } => write!(
                f,
                "{phase} {}: probe '{probe}' is invalid: {message}",
                self.step_index
            ),
        }
    }
}

impl From<StepFailure> for WaymarkError {
    fn from(failure: StepFailure) -> Self {
        let step_index = failure.step_index;
        match failure.kind {
            FailureKind::Navigation { screen, attempts } => {
                Self::NavigationFailed { screen, attempts }
            }
            FailureKind::Assertion {
                probe,
                expected,
                actual,
            } => Self::AssertionFailed {
                step_index,
                probe,
                expected,
                actual,
            },
            FailureKind::Action { action, message } => Self::ActionFailed {
                step_index,
                action,
                message,
            },
            FailureKind::InvalidProbe { probe, message } => Self::InvalidProbe { probe, message },
        }
    }
}

/// Overall chain status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// No critical failure
    Passed,
    /// A critical step failed
    Failed,
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        })
    }
}

/// Outcome of running a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResult {
    /// Chain name
    pub chain: String,
    /// Identifier of this run
    pub run_id: Uuid,
    /// Overall status
    pub status: ChainStatus,
    /// Non-critical failures in order
    pub warnings: Vec<StepFailure>,
    /// First critical failure
    pub failure: Option<StepFailure>,
    /// Steps executed across both phases
    pub steps_executed: usize,
    /// Whether setup was skipped because of a hand-off
    pub setup_skipped: bool,
    /// Wall time of the run
    pub duration_ms: u64,
}

impl ChainResult {
    /// Check if the chain passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ChainStatus::Passed
    }

    /// Wall time of the run
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Convert a failed result into its critical error
    pub fn ensure_passed(&self) -> WaymarkResult<&Self> {
        match &self.failure {
            Some(failure) => Err(failure.clone().into()),
            None => Ok(self),
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> WaymarkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::Selector;

    fn screen() -> ScreenDescriptor {
        ScreenDescriptor::builder("dashboard")
            .primary(Probe::visible("badge", Selector::accessibility_id("badge")))
            .build()
            .unwrap()
    }

    mod steps {
        use super::*;

        #[test]
        fn test_steps_default_critical() {
            assert!(Step::assert(Probe::visible("p", Selector::id("x")), true).is_critical());
            assert!(Step::act(vec![]).is_critical());
        }

        #[test]
        fn test_soft_downgrades_assert() {
            let step = Step::assert(Probe::visible("p", Selector::id("x")), true).soft();
            assert!(!step.is_critical());
        }

        #[test]
        fn test_navigation_cannot_be_softened() {
            let step = Step::navigate(screen(), vec![]).soft();
            assert!(step.is_critical());
        }

        #[test]
        fn test_display() {
            let step = Step::act(vec![UiAction::tap(Selector::text("Home"))]);
            assert_eq!(step.to_string(), "act: tap text=\"Home\"");
            let step = Step::navigate(screen(), vec![]);
            assert_eq!(step.to_string(), "navigate to dashboard");
            let step = step.with_label("open dashboard");
            assert_eq!(step.to_string(), "open dashboard");
        }
    }

    mod results {
        use super::*;

        fn failure() -> StepFailure {
            StepFailure {
                phase: StepPhase::Main,
                step_index: 2,
                critical: true,
                kind: FailureKind::Assertion {
                    probe: "Dashboard-badge-visible".into(),
                    expected: true,
                    actual: false,
                },
            }
        }

        #[test]
        fn test_failure_display() {
            assert_eq!(
                failure().to_string(),
                "step 2: probe 'Dashboard-badge-visible' expected true, got false"
            );
        }

        #[test]
        fn test_failure_into_error() {
            let err: WaymarkError = failure().into();
            assert!(err.is_chain_failure());
            assert!(matches!(
                err,
                WaymarkError::AssertionFailed {
                    step_index: 2,
                    expected: true,
                    actual: false,
                    ..
                }
            ));
        }

        #[test]
        fn test_ensure_passed_and_json() {
            let result = ChainResult {
                chain: "c".into(),
                run_id: Uuid::new_v4(),
                status: ChainStatus::Failed,
                warnings: vec![],
                failure: Some(failure()),
                steps_executed: 3,
                setup_skipped: false,
                duration_ms: 12,
            };
            assert!(result.ensure_passed().is_err());
            let json = result.to_json().unwrap();
            assert!(json.contains("\"status\": \"failed\""));
            assert!(json.contains("\"type\": \"assertion\""));
        }
    }
}
