//! Scripted in-memory UI driver.
//!
//! [`ScriptedDriver`] simulates an application as a set of visible elements,
//! element texts and *reactions*: "when X is tapped, reveal Y and conceal Z".
//! A reaction can ignore its first `n` triggers, which is how flaky
//! navigation (a tap that only lands on the second try) is reproduced.
//!
//! The same model loads from YAML for the `waymark replay` command:
//!
//! ```yaml
//! visible:
//!   - { text: Home }
//! texts:
//!   - { selector: { id: title }, text: Home }
//! reactions:
//!   - on: { tap: { text: Home } }
//!     ignore_first: 1
//!     reveal: [ { accessibility_id: dashboard_badge } ]
//! ```

use crate::driver::{Direction, DriverError, DriverResult, Selector, UiAction, UiDriver};
use crate::result::WaymarkResult;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Interaction that fires a reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Tap on an element
    Tap(Selector),
    /// Swipe on an element in a direction
    Swipe {
        /// Swiped element
        selector: Selector,
        /// Swipe direction
        direction: Direction,
    },
    /// Scroll in a direction
    Scroll(Direction),
    /// Text typed into an element
    TypeText(Selector),
}

impl Trigger {
    fn fired_by(&self, action: &UiAction) -> bool {
        match (self, action) {
            (Self::Tap(expected), UiAction::Tap { selector }) => expected == selector,
            (
                Self::Swipe {
                    selector: expected,
                    direction: expected_dir,
                },
                UiAction::Swipe {
                    selector,
                    direction,
                },
            ) => expected == selector && expected_dir == direction,
            (Self::Scroll(expected), UiAction::Scroll { direction }) => expected == direction,
            (Self::TypeText(expected), UiAction::TypeText { selector, .. }) => expected == selector,
            _ => false,
        }
    }
}

/// Text value of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    /// Element
    pub selector: Selector,
    /// Its text
    pub text: String,
}

/// UI change applied when a trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Interaction that fires this reaction
    pub on: Trigger,
    /// Number of initial triggers that have no effect
    #[serde(default)]
    pub ignore_first: u32,
    /// Elements that become visible
    #[serde(default)]
    pub reveal: Vec<Selector>,
    /// Elements that disappear
    #[serde(default)]
    pub conceal: Vec<Selector>,
    /// Texts that change
    #[serde(default)]
    pub set_text: Vec<TextEntry>,
}

impl Reaction {
    /// Reaction to a tap
    #[must_use]
    pub fn on_tap(selector: Selector) -> Self {
        Self::on(Trigger::Tap(selector))
    }

    /// Reaction to an arbitrary trigger
    #[must_use]
    pub const fn on(trigger: Trigger) -> Self {
        Self {
            on: trigger,
            ignore_first: 0,
            reveal: Vec::new(),
            conceal: Vec::new(),
            set_text: Vec::new(),
        }
    }

    /// Ignore the first `n` triggers
    #[must_use]
    pub const fn after(mut self, n: u32) -> Self {
        self.ignore_first = n;
        self
    }

    /// Reveal an element
    #[must_use]
    pub fn reveal(mut self, selector: Selector) -> Self {
        self.reveal.push(selector);
        self
    }

    /// Conceal an element
    #[must_use]
    pub fn conceal(mut self, selector: Selector) -> Self {
        self.conceal.push(selector);
        self
    }

    /// Change an element's text
    #[must_use]
    pub fn set_text(mut self, selector: Selector, text: impl Into<String>) -> Self {
        self.set_text.push(TextEntry {
            selector,
            text: text.into(),
        });
        self
    }
}

/// Serializable description of a simulated application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppScript {
    /// Initially visible elements
    #[serde(default)]
    pub visible: Vec<Selector>,
    /// Initial element texts (these elements are also visible)
    #[serde(default)]
    pub texts: Vec<TextEntry>,
    /// Elements whose lookups always time out
    #[serde(default)]
    pub slow: Vec<Selector>,
    /// Reactions to interactions
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Default)]
struct AppState {
    visible: HashSet<Selector>,
    texts: HashMap<Selector, String>,
    slow: HashSet<Selector>,
    reactions: Vec<(Reaction, u32)>,
    actions: Vec<UiAction>,
    lookups: usize,
}

impl AppState {
    fn require_visible(&self, selector: &Selector) -> DriverResult<()> {
        if self.slow.contains(selector) {
            return Err(DriverError::timeout(selector, Duration::ZERO));
        }
        if self.visible.contains(selector) {
            Ok(())
        } else {
            Err(DriverError::not_found(selector))
        }
    }

    fn record(&mut self, action: UiAction) {
        let mut changes = Vec::new();
        for (reaction, seen) in &mut self.reactions {
            if reaction.on.fired_by(&action) {
                *seen += 1;
                if *seen > reaction.ignore_first {
                    changes.push(reaction.clone());
                }
            }
        }
        for reaction in changes {
            for selector in reaction.conceal {
                let _ = self.visible.remove(&selector);
            }
            for selector in reaction.reveal {
                let _ = self.visible.insert(selector);
            }
            for entry in reaction.set_text {
                let _ = self.visible.insert(entry.selector.clone());
                let _ = self.texts.insert(entry.selector, entry.text);
            }
        }
        self.actions.push(action);
    }
}

/// In-memory [`UiDriver`] driven by a script
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    state: Mutex<AppState>,
}

impl ScriptedDriver {
    /// Create an empty driver (nothing visible)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver from an application script
    #[must_use]
    pub fn from_script(script: AppScript) -> Self {
        let mut driver = Self::new();
        for selector in script.visible {
            driver = driver.with_visible(selector);
        }
        for entry in script.texts {
            driver = driver.with_text(entry.selector, entry.text);
        }
        for selector in script.slow {
            driver = driver.with_slow(selector);
        }
        for reaction in script.reactions {
            driver = driver.with_reaction(reaction);
        }
        driver
    }

    /// Parse an application script from YAML
    pub fn from_yaml(yaml: &str) -> WaymarkResult<Self> {
        let script: AppScript = serde_yaml_ng::from_str(yaml)?;
        Ok(Self::from_script(script))
    }

    /// Load an application script from a YAML file
    pub fn load(path: impl AsRef<Path>) -> WaymarkResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Make an element visible
    #[must_use]
    pub fn with_visible(self, selector: Selector) -> Self {
        self.show(selector);
        self
    }

    /// Give an element text (and make it visible)
    #[must_use]
    pub fn with_text(self, selector: Selector, text: impl Into<String>) -> Self {
        self.set_text(selector, text);
        self
    }

    /// Make every lookup of an element time out
    #[must_use]
    pub fn with_slow(self, selector: Selector) -> Self {
        let _ = self.lock().slow.insert(selector);
        self
    }

    /// Add a reaction
    #[must_use]
    pub fn with_reaction(self, reaction: Reaction) -> Self {
        self.lock().reactions.push((reaction, 0));
        self
    }

    /// Show an element now
    pub fn show(&self, selector: Selector) {
        let _ = self.lock().visible.insert(selector);
    }

    /// Hide an element now
    pub fn hide(&self, selector: &Selector) {
        let _ = self.lock().visible.remove(selector);
    }

    /// Set an element's text now
    pub fn set_text(&self, selector: Selector, text: impl Into<String>) {
        let mut state = self.lock();
        let _ = state.visible.insert(selector.clone());
        let _ = state.texts.insert(selector, text.into());
    }

    /// Check visibility without counting a lookup
    #[must_use]
    pub fn is_visible(&self, selector: &Selector) -> bool {
        self.lock().visible.contains(selector)
    }

    /// Actions performed successfully, in order
    #[must_use]
    pub fn actions(&self) -> Vec<UiAction> {
        self.lock().actions.clone()
    }

    /// Number of successful taps on `selector`
    #[must_use]
    pub fn tap_count(&self, selector: &Selector) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, UiAction::Tap { selector: s } if s == selector))
            .count()
    }

    /// Number of lookups (`find_visible` and `read_text`) served
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiDriver for ScriptedDriver {
    fn find_visible(&self, selector: &Selector, timeout: Duration) -> DriverResult<bool> {
        let mut state = self.lock();
        state.lookups += 1;
        if state.slow.contains(selector) {
            return Err(DriverError::timeout(selector, timeout));
        }
        Ok(state.visible.contains(selector))
    }

    fn read_text(&self, selector: &Selector, timeout: Duration) -> DriverResult<String> {
        let mut state = self.lock();
        state.lookups += 1;
        if state.slow.contains(selector) {
            return Err(DriverError::timeout(selector, timeout));
        }
        if !state.visible.contains(selector) {
            return Err(DriverError::not_found(selector));
        }
        Ok(state.texts.get(selector).cloned().unwrap_or_default())
    }

    fn tap(&self, selector: &Selector) -> DriverResult<()> {
        let mut state = self.lock();
        state.require_visible(selector)?;
        state.record(UiAction::tap(selector.clone()));
        Ok(())
    }

    fn type_text(&self, selector: &Selector, text: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.require_visible(selector)?;
        let _ = state.texts.insert(selector.clone(), text.to_string());
        state.record(UiAction::type_text(selector.clone(), text));
        Ok(())
    }

    fn scroll(&self, direction: Direction) -> DriverResult<()> {
        self.lock().record(UiAction::scroll(direction));
        Ok(())
    }

    fn swipe(&self, selector: &Selector, direction: Direction) -> DriverResult<()> {
        let mut state = self.lock();
        state.require_visible(selector)?;
        state.record(UiAction::swipe(selector.clone(), direction));
        Ok(())
    }
}
