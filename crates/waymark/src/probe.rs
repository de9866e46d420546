//! Signal probes: single boolean checks against the current UI state.
//!
//! A probe is a named, side-effect-free predicate. Evaluation never fails:
//! a missing element is `false`, and a lookup that exceeds the probe's
//! timeout yields [`ProbeOutcome::TimedOut`], which every caller treats as
//! `false`.

use crate::driver::{DriverError, DriverResult, Selector, UiDriver};
use crate::result::{WaymarkError, WaymarkResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for a single probe evaluation (2 seconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

/// The predicate a probe evaluates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeCheck {
    /// Element is visible
    Visible {
        /// Element to look up
        selector: Selector,
    },
    /// Element is absent or not visible
    Hidden {
        /// Element to look up
        selector: Selector,
    },
    /// Element text equals `text`
    TextEquals {
        /// Element to read
        selector: Selector,
        /// Expected text
        text: String,
    },
    /// Element text contains `text`
    TextContains {
        /// Element to read
        selector: Selector,
        /// Expected substring
        text: String,
    },
    /// Element text matches a regular expression
    TextMatches {
        /// Element to read
        selector: Selector,
        /// Regular expression
        pattern: String,
    },
}

impl ProbeCheck {
    /// Selector the check reads
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        match self {
            Self::Visible { selector }
            | Self::Hidden { selector }
            | Self::TextEquals { selector, .. }
            | Self::TextContains { selector, .. }
            | Self::TextMatches { selector, .. } => selector,
        }
    }
}

/// Result of a single probe evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The predicate held
    True,
    /// The predicate did not hold (or the element was not found)
    False,
    /// The lookup exceeded the probe's timeout
    TimedOut,
}

impl ProbeOutcome {
    /// Timeouts count as `false`
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Check if the evaluation timed out
    #[must_use]
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

impl From<bool> for ProbeOutcome {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::True => "true",
            Self::False => "false",
            Self::TimedOut => "timeout",
        })
    }
}

/// A named signal probe
///
/// A `text_matches` pattern is compiled once, when the probe is created or
/// deserialized. A pattern that does not compile leaves the probe invalid:
/// [`Probe::validate`] rejects it and [`Probe::try_evaluate_within`] returns
/// an error instead of a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProbeDef")]
pub struct Probe {
    name: String,
    check: ProbeCheck,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip)]
    matcher: Option<Regex>,
}

#[derive(Deserialize)]
struct ProbeDef {
    name: String,
    check: ProbeCheck,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl From<ProbeDef> for Probe {
    fn from(def: ProbeDef) -> Self {
        let mut probe = Self::new(def.name, def.check);
        probe.timeout_ms = def.timeout_ms;
        probe
    }
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.check == other.check && self.timeout_ms == other.timeout_ms
    }
}

impl Eq for Probe {}

impl Probe {
    /// Create a probe from a check
    ///
    /// Never fails; call [`Probe::validate`] to reject malformed checks.
    #[must_use]
    pub fn new(name: impl Into<String>, check: ProbeCheck) -> Self {
        let matcher = match &check {
            ProbeCheck::TextMatches { pattern, .. } => Regex::new(pattern).ok(),
            _ => None,
        };
        Self {
            name: name.into(),
            check,
            timeout_ms: None,
            matcher,
        }
    }

    /// Probe that holds when the element is visible
    #[must_use]
    pub fn visible(name: impl Into<String>, selector: Selector) -> Self {
        Self::new(name, ProbeCheck::Visible { selector })
    }

    /// Probe that holds when the element is absent or hidden
    #[must_use]
    pub fn hidden(name: impl Into<String>, selector: Selector) -> Self {
        Self::new(name, ProbeCheck::Hidden { selector })
    }

    /// Probe that holds when the element text equals `text`
    #[must_use]
    pub fn text_equals(name: impl Into<String>, selector: Selector, text: impl Into<String>) -> Self {
        Self::new(
            name,
            ProbeCheck::TextEquals {
                selector,
                text: text.into(),
            },
        )
    }

    /// Probe that holds when the element text contains `text`
    #[must_use]
    pub fn text_contains(
        name: impl Into<String>,
        selector: Selector,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            ProbeCheck::TextContains {
                selector,
                text: text.into(),
            },
        )
    }

    /// Probe that holds when the element text matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::InvalidProbe`] if the pattern does not compile.
    pub fn text_matches(
        name: impl Into<String>,
        selector: Selector,
        pattern: impl Into<String>,
    ) -> WaymarkResult<Self> {
        let probe = Self::new(
            name,
            ProbeCheck::TextMatches {
                selector,
                pattern: pattern.into(),
            },
        );
        probe.validate()?;
        Ok(probe)
    }

    /// Override the evaluation timeout for this probe
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Probe name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The predicate
    #[must_use]
    pub const fn check(&self) -> &ProbeCheck {
        &self.check
    }

    /// Explicit timeout, if one was configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Explicit timeout, or `fallback`
    #[must_use]
    pub fn timeout_or(&self, fallback: Duration) -> Duration {
        self.timeout().unwrap_or(fallback)
    }

    /// Validate the probe definition
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::InvalidProbe`] for an empty name, a zero
    /// timeout or an unparsable pattern.
    pub fn validate(&self) -> WaymarkResult<()> {
        if self.name.trim().is_empty() {
            return Err(WaymarkError::InvalidProbe {
                probe: self.name.clone(),
                message: "probe name must not be empty".into(),
            });
        }
        if self.timeout_ms == Some(0) {
            return Err(WaymarkError::InvalidProbe {
                probe: self.name.clone(),
                message: "timeout must be greater than zero".into(),
            });
        }
        self.compiled_pattern()?;
        Ok(())
    }

    fn compiled_pattern(&self) -> WaymarkResult<Option<&Regex>> {
        match (&self.check, &self.matcher) {
            (ProbeCheck::TextMatches { .. }, Some(regex)) => Ok(Some(regex)),
            (ProbeCheck::TextMatches { pattern, .. }, None) => {
                let message = Regex::new(pattern)
                    .err()
                    .map_or_else(|| "pattern was not compiled".to_string(), |e| e.to_string());
                Err(WaymarkError::InvalidProbe {
                    probe: self.name.clone(),
                    message,
                })
            }
            _ => Ok(None),
        }
    }

    /// Evaluate with this probe's timeout, or the default
    pub fn evaluate<D: UiDriver + ?Sized>(&self, driver: &D) -> ProbeOutcome {
        self.evaluate_within(
            driver,
            self.timeout_or(Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS)),
        )
    }

    /// Evaluate against the current UI state
    ///
    /// `timeout` bounds each driver lookup. Driver errors never escape. An
    /// invalid probe evaluates to `false`; descriptors never hold one.
    pub fn evaluate_within<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        timeout: Duration,
    ) -> ProbeOutcome {
        self.try_evaluate_within(driver, timeout).unwrap_or_else(|err| {
            tracing::warn!(probe = %self.name, error = %err, "invalid probe evaluated");
            ProbeOutcome::False
        })
    }

    /// Evaluate, rejecting an invalid probe
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::InvalidProbe`] if the probe's pattern did not
    /// compile. Driver errors are still folded into the outcome.
    pub fn try_evaluate_within<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        timeout: Duration,
    ) -> WaymarkResult<ProbeOutcome> {
        let matcher = self.compiled_pattern()?;
        Ok(match self.run_check(driver, timeout, matcher) {
            Ok(holds) => ProbeOutcome::from(holds),
            Err(DriverError::Timeout { .. }) => {
                tracing::debug!(
                    probe = %self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "probe timed out"
                );
                ProbeOutcome::TimedOut
            }
            Err(DriverError::ElementNotFound { .. }) => ProbeOutcome::from(matches!(
                self.check,
                ProbeCheck::Hidden { .. }
            )),
            Err(err @ DriverError::Session { .. }) => {
                tracing::warn!(probe = %self.name, error = %err, "probe lookup failed");
                ProbeOutcome::False
            }
        })
    }

    fn run_check<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        timeout: Duration,
        matcher: Option<&Regex>,
    ) -> DriverResult<bool> {
        match &self.check {
            ProbeCheck::Visible { selector } => driver.find_visible(selector, timeout),
            ProbeCheck::Hidden { selector } => {
                driver.find_visible(selector, timeout).map(|visible| !visible)
            }
            ProbeCheck::TextEquals { selector, text } => {
                driver.read_text(selector, timeout).map(|actual| actual == *text)
            }
            ProbeCheck::TextContains { selector, text } => driver
                .read_text(selector, timeout)
                .map(|actual| actual.contains(text.as_str())),
            ProbeCheck::TextMatches { selector, .. } => {
                let Some(regex) = matcher else {
                    return Ok(false);
                };
                driver
                    .read_text(selector, timeout)
                    .map(|actual| regex.is_match(&actual))
            }
        }
    }
}
