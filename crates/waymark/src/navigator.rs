//! Retrying navigation with linear backoff.
//!
//! Each attempt performs the action sequence, waits `base_backoff * attempt`,
//! then asks the [`ScreenResolver`] whether the target screen is displayed.
//! UI state in the target apps settles within a few short waits, so backoff
//! grows linearly and attempts are capped at a small constant; the worst-case
//! total wait is `max_attempts * (max_attempts + 1) / 2 * base_backoff`.

use crate::clock::{Clock, SystemClock};
use crate::driver::{perform_all, UiAction, UiDriver};
use crate::resolver::ScreenResolver;
use crate::result::{WaymarkError, WaymarkResult};
use crate::screen::ScreenDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default number of navigation attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit (500ms)
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 500;

/// Retry policy for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPolicy {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Backoff unit in milliseconds; attempt `n` waits `n` units
    pub base_backoff_ms: u64,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
        }
    }
}

impl NavigationPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff_ms: base_backoff.as_millis() as u64,
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff unit
    #[must_use]
    pub const fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff_ms = base_backoff.as_millis() as u64;
        self
    }

    /// Backoff unit
    #[must_use]
    pub const fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Wait before checking attempt `attempt` (1-based)
    #[must_use]
    pub const fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }

    /// Upper bound on total backoff across all attempts
    #[must_use]
    pub const fn worst_case_wait(&self) -> Duration {
        let n = self.max_attempts as u64;
        Duration::from_millis(self.base_backoff_ms.saturating_mul(n * (n + 1) / 2))
    }
}

/// Outcome of a single navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The target screen was identified
    Matched,
    /// Actions ran but the screen was not identified
    NotMatched,
    /// An action could not be performed; the screen was not checked
    ActionFailed,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Matched => "matched",
            Self::NotMatched => "not_matched",
            Self::ActionFailed => "action_failed",
        })
    }
}

/// Diagnostic record of one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt_number: u32,
    /// Time since navigation started, measured after this attempt's wait
    pub elapsed_before_retry: Duration,
    /// Attempt outcome
    pub outcome: AttemptOutcome,
    /// Probe that identified the screen, if matched
    pub fired_probe: Option<String>,
}

/// Result of a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    /// Target screen identifier
    pub screen: String,
    /// Whether the screen was reached
    pub success: bool,
    /// Attempts performed
    pub attempts: u32,
    /// Probe that identified the screen
    pub fired_probe: Option<String>,
    /// Per-attempt diagnostics
    pub records: Vec<AttemptRecord>,
}

impl NavigationOutcome {
    /// Convert a failed navigation into [`WaymarkError::NavigationFailed`]
    pub fn into_result(self) -> WaymarkResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(WaymarkError::NavigationFailed {
                screen: self.screen,
                attempts: self.attempts,
            })
        }
    }
}

/// Drives UI actions toward a target screen, retrying with linear backoff
#[derive(Debug, Clone)]
pub struct RetryingNavigator<C: Clock = SystemClock> {
    policy: NavigationPolicy,
    resolver: ScreenResolver,
    clock: C,
}

impl Default for RetryingNavigator<SystemClock> {
    fn default() -> Self {
        Self::new(NavigationPolicy::default())
    }
}

impl RetryingNavigator<SystemClock> {
    /// Create a navigator that sleeps on the wall clock
    #[must_use]
    pub fn new(policy: NavigationPolicy) -> Self {
        Self::with_clock(policy, SystemClock::new())
    }
}

impl<C: Clock> RetryingNavigator<C> {
    /// Create a navigator with an explicit clock
    #[must_use]
    pub fn with_clock(policy: NavigationPolicy, clock: C) -> Self {
        Self {
            policy,
            resolver: ScreenResolver::default(),
            clock,
        }
    }

    /// Replace the resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: ScreenResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Navigation policy
    #[must_use]
    pub const fn policy(&self) -> NavigationPolicy {
        self.policy
    }

    /// Screen resolver
    #[must_use]
    pub const fn resolver(&self) -> &ScreenResolver {
        &self.resolver
    }

    /// Navigate using the configured policy
    pub fn navigate_to<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        descriptor: &ScreenDescriptor,
        actions: &[UiAction],
    ) -> NavigationOutcome {
        self.navigate_with(driver, descriptor, actions, self.policy)
    }

    /// Navigate, returning [`WaymarkError::NavigationFailed`] on exhaustion
    pub fn navigate_or_fail<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        descriptor: &ScreenDescriptor,
        actions: &[UiAction],
    ) -> WaymarkResult<NavigationOutcome> {
        self.navigate_to(driver, descriptor, actions).into_result()
    }

    /// Navigate with an explicit policy
    pub fn navigate_with<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        descriptor: &ScreenDescriptor,
        actions: &[UiAction],
        policy: NavigationPolicy,
    ) -> NavigationOutcome {
        let started = self.clock.now();
        let mut records = Vec::new();

        for attempt in 1..=policy.max_attempts {
            let action_result = perform_all(actions, driver);
            let backoff = policy.backoff_for(attempt);
            self.clock.sleep(backoff);

            let (outcome, fired_probe) = match action_result {
                Err(err) => {
                    tracing::debug!(screen = descriptor.id(), attempt, error = %err, "navigation action failed");
                    (AttemptOutcome::ActionFailed, None)
                }
                Ok(()) => {
                    let result = self.resolver.matches(driver, descriptor);
                    if result.matched {
                        (AttemptOutcome::Matched, result.fired_probe)
                    } else {
                        (AttemptOutcome::NotMatched, None)
                    }
                }
            };

            tracing::info!(
                screen = descriptor.id(),
                attempt,
                max_attempts = policy.max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                outcome = %outcome,
                "navigation attempt"
            );

            records.push(AttemptRecord {
                attempt_number: attempt,
                elapsed_before_retry: self.clock.now().saturating_sub(started),
                outcome,
                fired_probe: fired_probe.clone(),
            });

            if outcome == AttemptOutcome::Matched {
                return NavigationOutcome {
                    screen: descriptor.id().to_string(),
                    success: true,
                    attempts: attempt,
                    fired_probe,
                    records,
                };
            }
        }

        tracing::warn!(
            screen = descriptor.id(),
            attempts = policy.max_attempts,
            "navigation exhausted attempts"
        );
        NavigationOutcome {
            screen: descriptor.id().to_string(),
            success: false,
            attempts: policy.max_attempts,
            fired_probe: None,
            records,
        }
    }
}
