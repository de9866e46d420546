//! Session state carried across test groups.
//!
//! A test group may leave the application in a state the next group can reuse
//! (skip the app reset, skip the next setup). Every flag has read-and-clear
//! semantics so a value can never be observed by two groups, and flags are
//! reset to their defaults at the start and at the end of every group.

use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Cross-group session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFlag {
    /// Reuse the running app instead of resetting it
    SkipAppReset,
    /// Skip the next chain's setup steps
    SkipNextSetup,
}

impl SessionFlag {
    /// Every flag
    pub const ALL: [Self; 2] = [Self::SkipAppReset, Self::SkipNextSetup];

    /// Value the flag holds after a reset
    #[must_use]
    pub const fn default_value(self) -> bool {
        false
    }
}

impl fmt::Display for SessionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SkipAppReset => "skip_app_reset",
            Self::SkipNextSetup => "skip_next_setup",
        })
    }
}

/// Flags left set when a group started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("state leak entering group '{group}': {} flag(s) still set", .flags.len())]
pub struct StateLeak {
    /// Group being entered
    pub group: String,
    /// Flags that were not at their default value
    pub flags: Vec<SessionFlag>,
}

/// Flag store shared by consecutive test groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    flags: BTreeMap<SessionFlag, bool>,
}

impl SessionState {
    /// Create a state with every flag at its default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag
    pub fn set_flag(&mut self, flag: SessionFlag, value: bool) {
        tracing::debug!(flag = %flag, value, "session flag set");
        let _ = self.flags.insert(flag, value);
    }

    /// Read a flag without clearing it
    #[must_use]
    pub fn peek(&self, flag: SessionFlag) -> bool {
        self.flags
            .get(&flag)
            .copied()
            .unwrap_or_else(|| flag.default_value())
    }

    /// Read a flag and reset it to its default
    pub fn read_and_clear(&mut self, flag: SessionFlag) -> bool {
        self.flags
            .remove(&flag)
            .unwrap_or_else(|| flag.default_value())
    }

    /// Reset every flag to its default
    pub fn reset_all(&mut self) {
        self.flags.clear();
    }

    /// Flags not at their default value
    #[must_use]
    pub fn dirty_flags(&self) -> Vec<SessionFlag> {
        SessionFlag::ALL
            .into_iter()
            .filter(|flag| self.peek(*flag) != flag.default_value())
            .collect()
    }

    /// Check if every flag is at its default
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dirty_flags().is_empty()
    }

    /// Fail with [`StateLeak`] if any flag is set
    pub fn check_clean(&self, group: &str) -> Result<(), StateLeak> {
        let flags = self.dirty_flags();
        if flags.is_empty() {
            Ok(())
        } else {
            Err(StateLeak {
                group: group.to_string(),
                flags,
            })
        }
    }
}

/// Scope of one test group
///
/// The group's setup hook writes flags through [`GroupLifecycle::state`] and
/// the tests of the group consume them. `begin` records a [`StateLeak`] if an
/// earlier group skipped its teardown, then resets; the state is reset again
/// when the guard is ended or dropped.
#[derive(Debug)]
pub struct GroupLifecycle<'a> {
    name: String,
    state: &'a mut SessionState,
    leak: Option<StateLeak>,
}

impl<'a> GroupLifecycle<'a> {
    /// Enter a group
    pub fn begin(name: impl Into<String>, state: &'a mut SessionState) -> Self {
        let name = name.into();
        let leak = state.check_clean(&name).err();
        if let Some(leak) = &leak {
            tracing::warn!(group = %name, flags = ?leak.flags, "session state leaked into group");
        }
        state.reset_all();
        tracing::debug!(group = %name, "group started");
        Self { name, state, leak }
    }

    /// Group name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leak detected when the group started
    #[must_use]
    pub const fn leak(&self) -> Option<&StateLeak> {
        self.leak.as_ref()
    }

    /// Session state for the group body
    pub fn state(&mut self) -> &mut SessionState {
        &mut *self.state
    }

    /// Leave the group, returning the leak detected at entry
    pub fn end(mut self) -> Option<StateLeak> {
        self.leak.take()
    }
}

impl Drop for GroupLifecycle<'_> {
    fn drop(&mut self) {
        self.state.reset_all();
        tracing::debug!(group = %self.name, "group finished");
    }
}

/// Parameters for starting an app session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Application identifier
    pub app_id: String,
    /// Keep the app's data and process between sessions
    #[serde(default)]
    pub no_reset: bool,
    /// Extra driver capabilities
    #[serde(default)]
    pub capabilities: BTreeMap<String, String>,
}

impl SessionConfig {
    /// Create a config that resets the app
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            no_reset: false,
            capabilities: BTreeMap::new(),
        }
    }

    /// Add a capability
    #[must_use]
    pub fn with_capability(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.capabilities.insert(key.into(), value.into());
        self
    }

    /// Derive a config from the session state (does not clear the flag)
    #[must_use]
    pub fn for_state(app_id: impl Into<String>, state: &SessionState) -> Self {
        Self {
            no_reset: state.peek(SessionFlag::SkipAppReset),
            ..Self::new(app_id)
        }
    }
}

/// A started app session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Session identifier
    pub id: Uuid,
    /// Configuration it was started with
    pub config: SessionConfig,
}

impl SessionHandle {
    /// Create a handle with a fresh identifier
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
        }
    }
}

/// Starts and stops app sessions
pub trait SessionBootstrap {
    /// Start a session
    fn start_session(&mut self, config: &SessionConfig) -> WaymarkResult<SessionHandle>;

    /// End a session
    fn end_session(&mut self, handle: SessionHandle) -> WaymarkResult<()>;
}

/// Start a session inside a group, consuming the skip-app-reset flag
pub fn start_group_session<B: SessionBootstrap + ?Sized>(
    bootstrap: &mut B,
    app_id: &str,
    state: &mut SessionState,
) -> WaymarkResult<SessionHandle> {
    let config = SessionConfig::for_state(app_id, state);
    let _ = state.read_and_clear(SessionFlag::SkipAppReset);
    let handle = bootstrap.start_session(&config).map_err(|err| match err {
        WaymarkError::Session { .. } => err,
        other => WaymarkError::Session {
            message: other.to_string(),
        },
    })?;
    tracing::info!(app = app_id, session = %handle.id, no_reset = config.no_reset, "session started");
    Ok(handle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingBootstrap {
        started: Vec<SessionConfig>,
        ended: usize,
        fail: bool,
    }

    impl SessionBootstrap for RecordingBootstrap {
        fn start_session(&mut self, config: &SessionConfig) -> WaymarkResult<SessionHandle> {
            if self.fail {
                return Err(WaymarkError::config("no device"));
            }
            self.started.push(config.clone());
            Ok(SessionHandle::new(config.clone()))
        }

        fn end_session(&mut self, _handle: SessionHandle) -> WaymarkResult<()> {
            self.ended += 1;
            Ok(())
        }
    }

    mod flags {
        use super::*;

        #[test]
        fn test_read_and_clear() {
            let mut state = SessionState::new();
            state.set_flag(SessionFlag::SkipAppReset, true);
            assert!(state.peek(SessionFlag::SkipAppReset));
            assert!(state.read_and_clear(SessionFlag::SkipAppReset));
            assert!(!state.read_and_clear(SessionFlag::SkipAppReset));
        }

        #[test]
        fn test_unset_flag_reads_default() {
            let mut state = SessionState::new();
            assert!(!state.read_and_clear(SessionFlag::SkipNextSetup));
            assert!(state.is_clean());
        }

        #[test]
        fn test_explicit_false_is_clean() {
            let mut state = SessionState::new();
            state.set_flag(SessionFlag::SkipNextSetup, false);
            assert!(state.is_clean());
        }

        #[test]
        fn test_check_clean_lists_dirty_flags() {
            let mut state = SessionState::new();
            state.set_flag(SessionFlag::SkipNextSetup, true);
            let leak = state.check_clean("settings").unwrap_err();
            assert_eq!(leak.group, "settings");
            assert_eq!(leak.flags, vec![SessionFlag::SkipNextSetup]);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn test_leak_recorded_and_state_reset() {
            let mut state = SessionState::new();
            state.set_flag(SessionFlag::SkipAppReset, true);
            let group = GroupLifecycle::begin("sites", &mut state);
            assert!(group.leak().is_some());
            let leak = group.end();
            assert_eq!(leak.unwrap().flags, vec![SessionFlag::SkipAppReset]);
            assert!(state.is_clean());
        }

        #[test]
        fn test_flags_set_inside_group_do_not_survive() {
            let mut state = SessionState::new();
            {
                let mut group = GroupLifecycle::begin("dashboard", &mut state);
                group.state().set_flag(SessionFlag::SkipNextSetup, true);
            }
            assert!(state.is_clean());
        }

        #[test]
        fn test_clean_entry_has_no_leak() {
            let mut state = SessionState::new();
            let group = GroupLifecycle::begin("clean", &mut state);
            assert_eq!(group.name(), "clean");
            assert!(group.end().is_none());
        }
    }

    mod bootstrap {
        use super::*;

        #[test]
        fn test_skip_app_reset_consumed_by_session_start() {
            let mut state = SessionState::new();
            state.set_flag(SessionFlag::SkipAppReset, true);
            let mut bootstrap = RecordingBootstrap::default();

            let first = start_group_session(&mut bootstrap, "org.example.app", &mut state).unwrap();
            assert!(first.config.no_reset);
            let second = start_group_session(&mut bootstrap, "org.example.app", &mut state).unwrap();
            assert!(!second.config.no_reset);
            assert_ne!(first.id, second.id);

            bootstrap.end_session(first).unwrap();
            assert_eq!(bootstrap.ended, 1);
        }

        #[test]
        fn test_bootstrap_failure_maps_to_session_error() {
            let mut state = SessionState::new();
            let mut bootstrap = RecordingBootstrap {
                fail: true,
                ..RecordingBootstrap::default()
            };
            let err = start_group_session(&mut bootstrap, "app", &mut state).unwrap_err();
            assert!(matches!(err, WaymarkError::Session { .. }));
            assert!(bootstrap.started.is_empty());
        }

        #[test]
        fn test_config_capabilities() {
            let config = SessionConfig::new("app").with_capability("platformName", "iOS");
            assert_eq!(config.capabilities.get("platformName").unwrap(), "iOS");
        }
    }

    mod properties {
        use super::*;

        fn flag() -> impl Strategy<Value = SessionFlag> {
            prop_oneof![Just(SessionFlag::SkipAppReset), Just(SessionFlag::SkipNextSetup)]
        }

        proptest! {
            #[test]
            fn prop_reset_all_restores_defaults(ops in prop::collection::vec((flag(), any::<bool>()), 0..16)) {
                let mut state = SessionState::new();
                for (flag, value) in ops {
                    state.set_flag(flag, value);
                }
                state.reset_all();
                for flag in SessionFlag::ALL {
                    prop_assert_eq!(state.peek(flag), flag.default_value());
                }
            }

            #[test]
            fn prop_read_and_clear_observed_once(flag in flag(), value in any::<bool>()) {
                let mut state = SessionState::new();
                state.set_flag(flag, value);
                prop_assert_eq!(state.read_and_clear(flag), value);
                prop_assert_eq!(state.read_and_clear(flag), flag.default_value());
            }
        }
    }
}
