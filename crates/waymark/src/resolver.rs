//! Screen identity resolution with fallback-first matching.
//!
//! A single accessibility id is often transient or renamed between app
//! states, so a screen is considered displayed as soon as *any* of its probes
//! holds. Probes are evaluated in declared order and evaluation stops at the
//! first that holds; the order only decides which probe is reported.

use crate::driver::UiDriver;
use crate::probe::{ProbeOutcome, DEFAULT_PROBE_TIMEOUT_MS};
use crate::screen::{ProbeRole, ScreenDescriptor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of matching a descriptor against the current UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether any probe held
    pub matched: bool,
    /// Name of the first probe that held
    pub fired_probe: Option<String>,
    /// Number of probes evaluated before stopping
    pub evaluated: usize,
    /// Number of evaluated probes that timed out
    pub timed_out: usize,
}

impl MatchResult {
    /// Name of the probe that fired, if any
    #[must_use]
    pub fn fired_probe_name(&self) -> Option<&str> {
        self.fired_probe.as_deref()
    }
}

/// Decides whether a target screen is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenResolver {
    probe_timeout: Duration,
}

impl Default for ScreenResolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS))
    }
}

impl ScreenResolver {
    /// Create a resolver using `probe_timeout` for probes without their own
    #[must_use]
    pub const fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    /// Default per-probe timeout
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Match a descriptor against the current UI state
    pub fn matches<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        descriptor: &ScreenDescriptor,
    ) -> MatchResult {
        let mut timed_out = 0;
        for (index, tagged) in descriptor.probes().iter().enumerate() {
            let probe = &tagged.probe;
            let outcome = probe.evaluate_within(driver, probe.timeout_or(self.probe_timeout));
            match outcome {
                ProbeOutcome::True => {
                    if tagged.role == ProbeRole::Fallback {
                        tracing::debug!(
                            screen = descriptor.id(),
                            probe = probe.name(),
                            "screen matched by fallback probe"
                        );
                    }
                    return MatchResult {
                        matched: true,
                        fired_probe: Some(probe.name().to_string()),
                        evaluated: index + 1,
                        timed_out,
                    };
                }
                ProbeOutcome::TimedOut => timed_out += 1,
                ProbeOutcome::False => {}
            }
        }

        tracing::debug!(
            screen = descriptor.id(),
            evaluated = descriptor.probes().len(),
            timed_out,
            "no probe matched"
        );
        MatchResult {
            matched: false,
            fired_probe: None,
            evaluated: descriptor.probes().len(),
            timed_out,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::Selector;
    use crate::mock::ScriptedDriver;
    use crate::probe::Probe;
    use proptest::prelude::*;

    fn dashboard() -> ScreenDescriptor {
        ScreenDescriptor::builder("dashboard")
            .primary(Probe::visible(
                "Dashboard-badge-visible",
                Selector::accessibility_id("dashboard_badge"),
            ))
            .fallback(Probe::visible(
                "Sites-button-visible",
                Selector::text("Sites"),
            ))
            .build()
            .unwrap()
    }

    mod matching {
        use super::*;

        #[test]
        fn test_fallback_fires_when_primary_absent() {
            let driver = ScriptedDriver::new().with_visible(Selector::text("Sites"));
            let result = ScreenResolver::default().matches(&driver, &dashboard());
            assert!(result.matched);
            assert_eq!(result.fired_probe_name(), Some("Sites-button-visible"));
            assert_eq!(result.evaluated, 2);
        }

        #[test]
        fn test_primary_short_circuits() {
            let driver = ScriptedDriver::new()
                .with_visible(Selector::accessibility_id("dashboard_badge"))
                .with_visible(Selector::text("Sites"));
            let result = ScreenResolver::default().matches(&driver, &dashboard());
            assert_eq!(result.fired_probe_name(), Some("Dashboard-badge-visible"));
            assert_eq!(result.evaluated, 1);
            assert_eq!(driver.lookup_count(), 1);
        }

        #[test]
        fn test_all_false_is_unmatched() {
            let driver = ScriptedDriver::new();
            let result = ScreenResolver::default().matches(&driver, &dashboard());
            assert!(!result.matched);
            assert_eq!(result.fired_probe, None);
        }

        #[test]
        fn test_timeouts_count_as_false() {
            let driver = ScriptedDriver::new()
                .with_slow(Selector::accessibility_id("dashboard_badge"))
                .with_visible(Selector::text("Sites"));
            let result = ScreenResolver::new(Duration::from_millis(5)).matches(&driver, &dashboard());
            assert!(result.matched);
            assert_eq!(result.timed_out, 1);
            assert_eq!(result.fired_probe_name(), Some("Sites-button-visible"));
        }

        #[test]
        fn test_repeated_matching_is_stable() {
            let driver = ScriptedDriver::new().with_visible(Selector::text("Sites"));
            let resolver = ScreenResolver::default();
            let first = resolver.matches(&driver, &dashboard());
            let second = resolver.matches(&driver, &dashboard());
            assert_eq!(first, second);
        }
    }

    mod properties {
        use super::*;

        fn descriptor_for(count: usize) -> ScreenDescriptor {
            let mut builder = ScreenDescriptor::builder("generated");
            for i in 0..count {
                let probe = Probe::visible(format!("probe-{i}"), Selector::id(format!("el-{i}")));
                builder = if i == 0 {
                    builder.primary(probe)
                } else {
                    builder.fallback(probe)
                };
            }
            builder.build().unwrap()
        }

        proptest! {
            #[test]
            fn prop_first_true_probe_fires(visible in prop::collection::vec(any::<bool>(), 1..8)) {
                let mut driver = ScriptedDriver::new();
                for (i, shown) in visible.iter().enumerate() {
                    if *shown {
                        driver = driver.with_visible(Selector::id(format!("el-{i}")));
                    }
                }
                let descriptor = descriptor_for(visible.len());
                let result = ScreenResolver::default().matches(&driver, &descriptor);

                match visible.iter().position(|v| *v) {
                    Some(first) => {
                        prop_assert!(result.matched);
                        let expected = format!("probe-{first}");
                        prop_assert_eq!(result.fired_probe_name(), Some(expected.as_str()));
                        prop_assert_eq!(result.evaluated, first + 1);
                    }
                    None => {
                        prop_assert!(!result.matched);
                        prop_assert_eq!(result.fired_probe, None);
                    }
                }
            }

            #[test]
            fn prop_matching_is_idempotent(visible in prop::collection::vec(any::<bool>(), 1..6)) {
                let mut driver = ScriptedDriver::new();
                for (i, shown) in visible.iter().enumerate() {
                    if *shown {
                        driver = driver.with_visible(Selector::id(format!("el-{i}")));
                    }
                }
                let descriptor = descriptor_for(visible.len());
                let resolver = ScreenResolver::default();
                let first = resolver.matches(&driver, &descriptor);
                let second = resolver.matches(&driver, &descriptor);
                prop_assert_eq!(first.matched, second.matched);
                prop_assert!(driver.actions().is_empty());
            }
        }
    }
}
