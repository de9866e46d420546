//! UiDriver - Abstract Mobile Automation Trait
//!
//! The navigation layer never talks to a device directly. Everything it needs
//! from the automation backend goes through [`UiDriver`], so an Appium session,
//! an XCUITest bridge or the in-memory [`ScriptedDriver`](crate::ScriptedDriver)
//! can be swapped without touching probes, navigation or chains.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  UiDriver (Abstract Trait)                                        │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Appium session  │  │  Native bridge   │  │  ScriptedDriver │  │
//! │  │  (external)      │  │  (external)      │  │  (tests, CLI)   │  │
//! │  └──────────────────┘  └──────────────────┘  └─────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calls are synchronous: one driver session is driven by exactly one thread
//! of control.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a UI driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// No element matched the selector
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that was looked up
        selector: String,
    },

    /// The lookup did not resolve within its timeout
    #[error("Driver timed out after {timeout_ms}ms looking up {selector}")]
    Timeout {
        /// Selector that was looked up
        selector: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// The underlying automation session failed
    #[error("Driver session error: {message}")]
    Session {
        /// Error message
        message: String,
    },
}

impl DriverError {
    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(selector: &Selector) -> Self {
        Self::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(selector: &Selector, timeout: Duration) -> Self {
        Self::Timeout {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Check if this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an element-not-found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

/// Selector type for locating elements on a mobile screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Accessibility identifier (content-desc on Android, accessibilityIdentifier on iOS)
    AccessibilityId(String),
    /// Platform resource id
    Id(String),
    /// Exact visible text or label
    Text(String),
    /// XPath expression
    XPath(String),
}

impl Selector {
    /// Create an accessibility id selector
    #[must_use]
    pub fn accessibility_id(id: impl Into<String>) -> Self {
        Self::AccessibilityId(id.into())
    }

    /// Create a resource id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Locator strategy name as used by WebDriver-style backends
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::AccessibilityId(_) => "accessibility id",
            Self::Id(_) => "id",
            Self::Text(_) => "text",
            Self::XPath(_) => "xpath",
        }
    }

    /// Raw selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::AccessibilityId(v) | Self::Id(v) | Self::Text(v) | Self::XPath(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.strategy(), self.value())
    }
}

/// Gesture direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the top of the screen
    Up,
    /// Towards the bottom of the screen
    Down,
    /// Towards the left edge
    Left,
    /// Towards the right edge
    Right,
}

impl Direction {
    /// The reverse gesture
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

/// Abstract driver trait for mobile UI automation
///
/// Lookups take the caller's timeout. Implementations report a lookup that
/// exceeds it as [`DriverError::Timeout`] and a missing element as
/// [`DriverError::ElementNotFound`].
pub trait UiDriver {
    /// Check whether an element matching `selector` is visible
    fn find_visible(&self, selector: &Selector, timeout: Duration) -> DriverResult<bool>;

    /// Read the text or label of the element matching `selector`
    fn read_text(&self, selector: &Selector, timeout: Duration) -> DriverResult<String>;

    /// Tap an element
    fn tap(&self, selector: &Selector) -> DriverResult<()>;

    /// Type text into an element
    fn type_text(&self, selector: &Selector, text: &str) -> DriverResult<()>;

    /// Scroll the current view
    fn scroll(&self, direction: Direction) -> DriverResult<()>;

    /// Swipe on an element (e.g. to reveal row quick actions)
    fn swipe(&self, selector: &Selector, direction: Direction) -> DriverResult<()>;
}

impl<D: UiDriver + ?Sized> UiDriver for &D {
    fn find_visible(&self, selector: &Selector, timeout: Duration) -> DriverResult<bool> {
        (**self).find_visible(selector, timeout)
    }

    fn read_text(&self, selector: &Selector, timeout: Duration) -> DriverResult<String> {
        (**self).read_text(selector, timeout)
    }

    fn tap(&self, selector: &Selector) -> DriverResult<()> {
        (**self).tap(selector)
    }

    fn type_text(&self, selector: &Selector, text: &str) -> DriverResult<()> {
        (**self).type_text(selector, text)
    }

    fn scroll(&self, direction: Direction) -> DriverResult<()> {
        (**self).scroll(direction)
    }

    fn swipe(&self, selector: &Selector, direction: Direction) -> DriverResult<()> {
        (**self).swipe(selector, direction)
    }
}

/// A scripted UI interaction, opaque to the navigation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiAction {
    /// Tap an element
    Tap {
        /// Target element
        selector: Selector,
    },
    /// Type text into an element
    TypeText {
        /// Target element
        selector: Selector,
        /// Text to enter
        text: String,
    },
    /// Scroll the view
    Scroll {
        /// Scroll direction
        direction: Direction,
    },
    /// Swipe on an element
    Swipe {
        /// Target element
        selector: Selector,
        /// Swipe direction
        direction: Direction,
    },
}

impl UiAction {
    /// Tap action
    #[must_use]
    pub const fn tap(selector: Selector) -> Self {
        Self::Tap { selector }
    }

    /// Type-text action
    #[must_use]
    pub fn type_text(selector: Selector, text: impl Into<String>) -> Self {
        Self::TypeText {
            selector,
            text: text.into(),
        }
    }

    /// Scroll action
    #[must_use]
    pub const fn scroll(direction: Direction) -> Self {
        Self::Scroll { direction }
    }

    /// Swipe action
    #[must_use]
    pub const fn swipe(selector: Selector, direction: Direction) -> Self {
        Self::Swipe {
            selector,
            direction,
        }
    }

    /// Perform this action through a driver
    pub fn perform<D: UiDriver + ?Sized>(&self, driver: &D) -> DriverResult<()> {
        match self {
            Self::Tap { selector } => driver.tap(selector),
            Self::TypeText { selector, text } => driver.type_text(selector, text),
            Self::Scroll { direction } => driver.scroll(*direction),
            Self::Swipe {
                selector,
                direction,
            } => driver.swipe(selector, *direction),
        }
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tap { selector } => write!(f, "tap {selector}"),
            Self::TypeText { selector, text } => write!(f, "type {text:?} into {selector}"),
            Self::Scroll { direction } => write!(f, "scroll {direction}"),
            Self::Swipe {
                selector,
                direction,
            } => write!(f, "swipe {direction} on {selector}"),
        }
    }
}

/// A UI action that could not be performed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} failed: {source}")]
pub struct ActionError {
    /// Position of the action within its sequence
    pub index: usize,
    /// Description of the action
    pub action: String,
    /// Underlying driver error
    #[source]
    pub source: DriverError,
}

/// Perform a sequence of actions in order, stopping at the first failure
pub fn perform_all<D: UiDriver + ?Sized>(
    actions: &[UiAction],
    driver: &D,
) -> Result<(), ActionError> {
    for (index, action) in actions.iter().enumerate() {
        action.perform(driver).map_err(|source| ActionError {
            index,
            action: action.to_string(),
            source,
        })?;
    }
    Ok(())
}
