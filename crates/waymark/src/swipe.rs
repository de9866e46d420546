//! Swipe/quick-action tracking for list rows.
//!
//! At most one row's action panel is open at a time. Swiping a second row
//! moves straight from `OpenFor(a)` to `OpenFor(b)`; there is no observable
//! `Closed` state in between.

use crate::driver::{Direction, DriverResult, Selector, UiDriver};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction that reveals a row's quick actions
pub const OPEN_DIRECTION: Direction = Direction::Left;

/// Panel state of a list screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeState {
    /// No panel open
    #[default]
    Closed,
    /// The panel of the given row is open
    OpenFor(String),
}

impl SwipeState {
    /// Row whose panel is open
    #[must_use]
    pub fn open_row(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::OpenFor(row) => Some(row),
        }
    }

    /// Number of open panels (0 or 1)
    #[must_use]
    pub const fn open_count(&self) -> usize {
        match self {
            Self::Closed => 0,
            Self::OpenFor(_) => 1,
        }
    }
}

impl fmt::Display for SwipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::OpenFor(row) => write!(f, "open_for({row})"),
        }
    }
}

/// Gesture applied to a list screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "row", rename_all = "snake_case")]
pub enum SwipeEvent {
    /// Swipe a row open
    Swipe(String),
    /// Swipe a row back
    SwipeOpposite(String),
    /// Explicit dismiss
    Dismiss,
    /// Tap outside any panel
    TapElsewhere,
}

/// Compute the state after `event`
#[must_use]
pub fn next_state(current: &SwipeState, event: &SwipeEvent) -> SwipeState {
    match (current, event) {
        (_, SwipeEvent::Swipe(row)) => SwipeState::OpenFor(row.clone()),
        (SwipeState::OpenFor(open), SwipeEvent::SwipeOpposite(row)) if open == row => {
            SwipeState::Closed
        }
        (SwipeState::OpenFor(_), SwipeEvent::Dismiss | SwipeEvent::TapElsewhere) => {
            SwipeState::Closed
        }
        (state, _) => state.clone(),
    }
}

/// One applied transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeTransition {
    /// State before the event
    pub from: SwipeState,
    /// State after the event
    pub to: SwipeState,
    /// Row whose panel was closed, implicitly or explicitly
    pub closed: Option<String>,
}

impl SwipeTransition {
    /// Check if the state changed
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Tracks the open quick-action panel of one screen instance
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    state: SwipeState,
}

impl SwipeTracker {
    /// Create a tracker with no panel open
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &SwipeState {
        &self.state
    }

    /// Row whose panel is open
    #[must_use]
    pub fn open_row(&self) -> Option<&str> {
        self.state.open_row()
    }

    /// Number of open panels
    #[must_use]
    pub const fn open_count(&self) -> usize {
        self.state.open_count()
    }

    /// Apply an event
    pub fn apply(&mut self, event: &SwipeEvent) -> SwipeTransition {
        let to = next_state(&self.state, event);
        let from = std::mem::replace(&mut self.state, to.clone());
        let closed = match (&from, &to) {
            (SwipeState::OpenFor(prev), SwipeState::OpenFor(next)) if prev != next => {
                Some(prev.clone())
            }
            (SwipeState::OpenFor(prev), SwipeState::Closed) => Some(prev.clone()),
            _ => None,
        };
        if from != to {
            tracing::debug!(from = %from, to = %to, "swipe state changed");
        }
        SwipeTransition { from, to, closed }
    }

    /// Swipe `row` open on the device and record it
    ///
    /// The row is tracked by its full selector, strategy included.
    pub fn open<D: UiDriver + ?Sized>(
        &mut self,
        driver: &D,
        row: &Selector,
    ) -> DriverResult<SwipeTransition> {
        driver.swipe(row, OPEN_DIRECTION)?;
        Ok(self.apply(&SwipeEvent::Swipe(row.to_string())))
    }

    /// Swipe `row` closed on the device and record it
    pub fn close<D: UiDriver + ?Sized>(
        &mut self,
        driver: &D,
        row: &Selector,
    ) -> DriverResult<SwipeTransition> {
        driver.swipe(row, OPEN_DIRECTION.opposite())?;
        Ok(self.apply(&SwipeEvent::SwipeOpposite(row.to_string())))
    }
}
