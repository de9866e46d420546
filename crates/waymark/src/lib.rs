//! Waymark: resilient screen navigation and verification for mobile UI tests.
//!
//! Mobile UI suites break when a single accessibility id is renamed or shows
//! up a few hundred milliseconds late. Waymark centralizes the defensive
//! patterns such suites end up copy-pasting: multi-signal screen
//! identification, bounded retries with backoff, soft versus hard failures
//! and state handed from one test group to the next.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ActionChainRunner        Navigate / Assert / Act steps          │
//! │        │                                                         │
//! │        ├──► RetryingNavigator ──► ScreenResolver ──► Probe       │
//! │        │         (Clock)            (ScreenDescriptor)   │       │
//! │        │                                                 ▼       │
//! │        ├──► ReportSink                              UiDriver     │
//! │        └──► SessionState (hand-off flags)                        │
//! │                                                                  │
//! │  SwipeTracker             one open quick-action panel per screen │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The driver is abstract; [`ScriptedDriver`] simulates an application in
//! memory for tests and for the `waymark replay` command.

#![warn(missing_docs)]

mod chain;
mod clock;
/// Runtime configuration
pub mod config;
mod driver;
/// Tracing subscriber setup
pub mod logging;
mod mock;
mod navigator;
mod probe;
mod report;
mod resolver;
mod result;
mod runner;
/// YAML chain scripts
pub mod script;
mod screen;
mod session;
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;
mod swipe;

pub use chain::{
    Chain, ChainResult, ChainStatus, FailureKind, Step, StepFailure, StepKind, StepPhase,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::WaymarkConfig;
pub use driver::{
    perform_all, ActionError, Direction, DriverError, DriverResult, Selector, UiAction, UiDriver,
};
pub use logging::{init_tracing, LogFormat};
pub use mock::{AppScript, Reaction, ScriptedDriver, TextEntry, Trigger};
pub use navigator::{
    AttemptOutcome, AttemptRecord, NavigationOutcome, NavigationPolicy, RetryingNavigator,
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
};
pub use probe::{Probe, ProbeCheck, ProbeOutcome, DEFAULT_PROBE_TIMEOUT_MS};
pub use report::{
    report_screenshot, report_step, report_warning, EntryKind, MemorySink, ReportEntry,
    ReportSink, SinkError, TracingSink,
};
pub use resolver::{MatchResult, ScreenResolver};
pub use result::{WaymarkError, WaymarkResult};
pub use runner::ActionChainRunner;
pub use screen::{ProbeRole, ScreenDescriptor, ScreenDescriptorBuilder, TaggedProbe};
pub use script::{ChainScript, ChainSpec, StepSpec};
pub use session::{
    start_group_session, GroupLifecycle, SessionBootstrap, SessionConfig, SessionFlag,
    SessionHandle, SessionState, StateLeak,
};
pub use swipe::{next_state, SwipeEvent, SwipeState, SwipeTracker, SwipeTransition};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::chain::*;
    pub use super::clock::*;
    pub use super::config::WaymarkConfig;
    pub use super::driver::*;
    pub use super::mock::*;
    pub use super::navigator::*;
    pub use super::probe::*;
    pub use super::report::*;
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::runner::*;
    pub use super::screen::*;
    pub use super::script::ChainScript;
    pub use super::session::*;
    pub use super::swipe::*;
}
