//! Action chain runner.
//!
//! Steps run strictly in order against a single driver session. Navigation
//! goes through the [`RetryingNavigator`]; assertions evaluate a probe once
//! with its timeout; actions run in sequence. A critical failure stops the
//! chain immediately, a non-critical one becomes a warning.
//!
//! # Example
//!
//! ```
//! use waymark::prelude::*;
//!
//! let driver = ScriptedDriver::new().with_visible(Selector::text("Sites"));
//! let dashboard = ScreenDescriptor::builder("dashboard")
//!     .primary(Probe::visible("Dashboard-badge-visible", Selector::accessibility_id("dashboard_badge")))
//!     .fallback(Probe::visible("Sites-button-visible", Selector::text("Sites")))
//!     .build()
//!     .unwrap();
//!
//! let runner = ActionChainRunner::new(&driver);
//! let chain = Chain::new("dashboard").step(Step::navigate(dashboard, vec![]));
//! let result = runner.run(&chain, &mut SessionState::new());
//! assert!(result.passed());
//! ```

use crate::chain::{
    Chain, ChainResult, ChainStatus, FailureKind, Step, StepFailure, StepKind, StepPhase,
};
use crate::clock::{Clock, SystemClock};
use crate::config::WaymarkConfig;
use crate::driver::{perform_all, UiDriver};
use crate::navigator::RetryingNavigator;
use crate::report::{report_screenshot, report_step, report_warning, ReportSink, TracingSink};
use crate::result::WaymarkError;
use crate::session::{SessionFlag, SessionState};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Runs action chains against a driver
pub struct ActionChainRunner<'d, D: UiDriver + ?Sized, C: Clock = SystemClock> {
    driver: &'d D,
    navigator: RetryingNavigator<C>,
    sink: Arc<dyn ReportSink>,
    screenshot_on_failure: bool,
}

impl<D: UiDriver + ?Sized, C: Clock> std::fmt::Debug for ActionChainRunner<'_, D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionChainRunner")
            .field("policy", &self.navigator.policy())
            .field("screenshot_on_failure", &self.screenshot_on_failure)
            .finish_non_exhaustive()
    }
}

impl<'d, D: UiDriver + ?Sized> ActionChainRunner<'d, D, SystemClock> {
    /// Create a runner with default navigation and a [`TracingSink`]
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self::with_navigator(driver, RetryingNavigator::default())
    }

    /// Create a runner from configuration
    #[must_use]
    pub fn from_config(driver: &'d D, config: &WaymarkConfig) -> Self {
        Self::with_navigator(driver, config.navigator())
            .with_screenshot_on_failure(config.screenshot_on_failure)
    }
}

impl<'d, D: UiDriver + ?Sized, C: Clock> ActionChainRunner<'d, D, C> {
    /// Create a runner with an explicit navigator
    #[must_use]
    pub fn with_navigator(driver: &'d D, navigator: RetryingNavigator<C>) -> Self {
        Self {
            driver,
            navigator,
            sink: Arc::new(TracingSink),
            screenshot_on_failure: false,
        }
    }

    /// Replace the report sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Request a screenshot when a chain fails
    #[must_use]
    pub const fn with_screenshot_on_failure(mut self, enabled: bool) -> Self {
        self.screenshot_on_failure = enabled;
        self
    }

    /// Navigator used for navigate steps
    #[must_use]
    pub const fn navigator(&self) -> &RetryingNavigator<C> {
        &self.navigator
    }

    /// Run a chain, consuming and producing session hand-off flags
    ///
    /// `skip_next_setup` is consumed on every run; setup runs unless it was
    /// set. After a passing run of a hand-off chain the flag is set for the
    /// next chain.
    pub fn run(&self, chain: &Chain, state: &mut SessionState) -> ChainResult {
        let started = Instant::now();
        let skip_setup = state.read_and_clear(SessionFlag::SkipNextSetup);
        let mut progress = Progress::default();

        let setup_skipped = skip_setup && !chain.setup.is_empty();
        if setup_skipped {
            tracing::debug!(chain = %chain.name, "setup skipped after hand-off");
        } else {
            self.run_phase(&chain.name, StepPhase::Setup, &chain.setup, &mut progress);
        }
        if progress.failure.is_none() {
            self.run_phase(&chain.name, StepPhase::Main, &chain.steps, &mut progress);
        }

        let result = self.finish(&chain.name, progress, setup_skipped, started);
        if result.passed() && chain.hand_off {
            state.set_flag(SessionFlag::SkipNextSetup, true);
        }
        result
    }

    /// Run bare steps without setup or session flags
    pub fn run_steps(&self, name: &str, steps: &[Step]) -> ChainResult {
        let started = Instant::now();
        let mut progress = Progress::default();
        self.run_phase(name, StepPhase::Main, steps, &mut progress);
        self.finish(name, progress, false, started)
    }

    fn run_phase(&self, chain: &str, phase: StepPhase, steps: &[Step], progress: &mut Progress) {
        for (index, step) in steps.iter().enumerate() {
            let description = step.to_string();
            tracing::debug!(chain, ?phase, step_index = index, step = %description, "step started");
            report_step(self.sink.as_ref(), chain, index, &description);
            progress.executed += 1;

            let Err(kind) = self.execute(step) else {
                continue;
            };
            let failure = StepFailure {
                phase,
                step_index: index,
                critical: step.is_critical() || kind.is_always_critical(),
                kind,
            };
            if failure.critical {
                tracing::error!(chain, failure = %failure, "critical step failed");
                progress.failure = Some(failure);
                return;
            }
            tracing::warn!(chain, failure = %failure, "step failed softly");
            report_warning(self.sink.as_ref(), chain, &failure.to_string());
            progress.warnings.push(failure);
        }
    }

    fn execute(&self, step: &Step) -> Result<(), FailureKind> {
        match step.kind() {
            StepKind::Navigate { screen, actions } => {
                let outcome = self.navigator.navigate_to(self.driver, screen, actions);
                if outcome.success {
                    Ok(())
                } else {
                    Err(FailureKind::Navigation {
                        screen: outcome.screen,
                        attempts: outcome.attempts,
                    })
                }
            }
            StepKind::Assert { probe, expected } => {
                let timeout = probe.timeout_or(self.navigator.resolver().probe_timeout());
                let actual = probe
                    .try_evaluate_within(self.driver, timeout)
                    .map_err(|err| FailureKind::InvalidProbe {
                        probe: probe.name().to_string(),
                        message: match err {
                            WaymarkError::InvalidProbe { message, .. } => message,
                            other => other.to_string(),
                        },
                    })?
                    .is_true();
                if actual == *expected {
                    Ok(())
                } else {
                    Err(FailureKind::Assertion {
                        probe: probe.name().to_string(),
                        expected: *expected,
                        actual,
                    })
                }
            }
            StepKind::Act { actions } => {
                perform_all(actions, self.driver).map_err(|err| FailureKind::Action {
                    action: err.action,
                    message: err.source.to_string(),
                })
            }
        }
    }

    fn finish(
        &self,
        chain: &str,
        progress: Progress,
        setup_skipped: bool,
        started: Instant,
    ) -> ChainResult {
        let status = if progress.failure.is_some() {
            ChainStatus::Failed
        } else {
            ChainStatus::Passed
        };
        if status == ChainStatus::Failed && self.screenshot_on_failure {
            report_screenshot(self.sink.as_ref(), &format!("{chain}-failure"));
        }
        tracing::info!(
            chain,
            status = %status,
            warnings = progress.warnings.len(),
            steps = progress.executed,
            "chain finished"
        );
        ChainResult {
            chain: chain.to_string(),
            run_id: Uuid::new_v4(),
            status,
            warnings: progress.warnings,
            failure: progress.failure,
            steps_executed: progress.executed,
            setup_skipped,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    executed: usize,
    warnings: Vec<StepFailure>,
    failure: Option<StepFailure>,
}
