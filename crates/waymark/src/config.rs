//! Runtime configuration.
//!
//! Loaded from YAML, then optionally overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WAYMARK_MAX_ATTEMPTS` | `navigation.max_attempts` |
//! | `WAYMARK_BASE_BACKOFF_MS` | `navigation.base_backoff_ms` |
//! | `WAYMARK_PROBE_TIMEOUT_MS` | `probe_timeout_ms` |
//! | `WAYMARK_SCREENSHOT_ON_FAILURE` | `screenshot_on_failure` |
//!
//! Unparsable values are ignored.

use crate::logging::LogFormat;
use crate::navigator::{NavigationPolicy, RetryingNavigator};
use crate::probe::DEFAULT_PROBE_TIMEOUT_MS;
use crate::resolver::ScreenResolver;
use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Waymark configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaymarkConfig {
    /// Navigation retry policy
    pub navigation: NavigationPolicy,
    /// Default per-probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Request a screenshot when a chain fails
    pub screenshot_on_failure: bool,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for WaymarkConfig {
    fn default() -> Self {
        Self {
            navigation: NavigationPolicy::default(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            screenshot_on_failure: true,
            log_format: LogFormat::default(),
        }
    }
}

impl WaymarkConfig {
    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> WaymarkResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| WaymarkError::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> WaymarkResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            WaymarkError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Apply `WAYMARK_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let u64_var = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(value) = u64_var("WAYMARK_MAX_ATTEMPTS").and_then(|v| u32::try_from(v).ok()) {
            self.navigation.max_attempts = value;
        }
        if let Some(value) = u64_var("WAYMARK_BASE_BACKOFF_MS") {
            self.navigation.base_backoff_ms = value;
        }
        if let Some(value) = u64_var("WAYMARK_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = value;
        }
        if let Some(value) = lookup("WAYMARK_SCREENSHOT_ON_FAILURE").and_then(|v| {
            match v.trim() {
                "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
                "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
                _ => None,
            }
        }) {
            self.screenshot_on_failure = value;
        }
        self
    }

    /// Reject values that would make navigation or probing meaningless
    pub fn validate(&self) -> WaymarkResult<()> {
        if self.navigation.max_attempts == 0 {
            return Err(WaymarkError::config("navigation.max_attempts must be at least 1"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(WaymarkError::config("probe_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Default per-probe timeout
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Resolver using the configured probe timeout
    #[must_use]
    pub const fn resolver(&self) -> ScreenResolver {
        ScreenResolver::new(self.probe_timeout())
    }

    /// Navigator using the configured policy and resolver
    #[must_use]
    pub fn navigator(&self) -> RetryingNavigator {
        RetryingNavigator::new(self.navigation).with_resolver(self.resolver())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod parsing {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = WaymarkConfig::default();
            assert_eq!(config.navigation.max_attempts, 3);
            assert_eq!(config.navigation.base_backoff_ms, 500);
            assert_eq!(config.probe_timeout(), Duration::from_secs(2));
            assert!(config.screenshot_on_failure);
            assert_eq!(config.log_format, LogFormat::Pretty);
        }

        #[test]
        fn test_full_yaml() {
            let yaml = r"
navigation:
  max_attempts: 5
  base_backoff_ms: 250
probe_timeout_ms: 1500
screenshot_on_failure: false
log_format: json
";
            let config = WaymarkConfig::from_yaml(yaml).unwrap();
            assert_eq!(config.navigation.max_attempts, 5);
            assert_eq!(config.navigation.base_backoff_ms, 250);
            assert_eq!(config.probe_timeout_ms, 1500);
            assert!(!config.screenshot_on_failure);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.navigator().policy().max_attempts, 5);
            assert_eq!(
                config.navigator().resolver().probe_timeout(),
                Duration::from_millis(1500)
            );
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = WaymarkConfig::from_yaml("probe_timeout_ms: 100").unwrap();
            assert_eq!(config.navigation, NavigationPolicy::default());
        }

        #[test]
        fn test_zero_attempts_rejected() {
            let err = WaymarkConfig::from_yaml("navigation: { max_attempts: 0 }").unwrap_err();
            assert!(err.to_string().contains("max_attempts"));
        }

        #[test]
        fn test_zero_probe_timeout_rejected() {
            assert!(WaymarkConfig::from_yaml("probe_timeout_ms: 0").is_err());
        }

        #[test]
        fn test_unknown_field_rejected() {
            let err = WaymarkConfig::from_yaml("retries: 3").unwrap_err();
            assert!(matches!(err, WaymarkError::Config { .. }));
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn test_load_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "navigation:\n  max_attempts: 4").unwrap();
            let config = WaymarkConfig::load(file.path()).unwrap();
            assert_eq!(config.navigation.max_attempts, 4);
        }

        #[test]
        fn test_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = WaymarkConfig::load(dir.path().join("absent.yaml")).unwrap_err();
            assert!(err.to_string().contains("cannot read"));
        }
    }

    mod overrides {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |name| map.get(name).cloned()
        }

        #[test]
        fn test_overrides_apply() {
            let config = WaymarkConfig::default().with_overrides_from(lookup(&[
                ("WAYMARK_MAX_ATTEMPTS", "6"),
                ("WAYMARK_BASE_BACKOFF_MS", "10"),
                ("WAYMARK_PROBE_TIMEOUT_MS", "300"),
                ("WAYMARK_SCREENSHOT_ON_FAILURE", "no"),
            ]));
            assert_eq!(config.navigation.max_attempts, 6);
            assert_eq!(config.navigation.base_backoff_ms, 10);
            assert_eq!(config.probe_timeout_ms, 300);
            assert!(!config.screenshot_on_failure);
        }

        #[test]
        fn test_unparsable_overrides_ignored() {
            let config = WaymarkConfig::default().with_overrides_from(lookup(&[
                ("WAYMARK_MAX_ATTEMPTS", "many"),
                ("WAYMARK_SCREENSHOT_ON_FAILURE", "maybe"),
            ]));
            assert_eq!(config, WaymarkConfig::default());
        }
    }
}
