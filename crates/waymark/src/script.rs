//! YAML chain scripts.
//!
//! A script declares screens once and references them by id from any number
//! of chains:
//!
//! ```yaml
//! version: "1.0"
//! screens:
//!   dashboard:
//!     probes:
//!       - role: primary
//!         name: Dashboard-badge-visible
//!         check: { type: visible, selector: { accessibility_id: dashboard_badge } }
//!       - role: fallback
//!         name: Sites-button-visible
//!         check: { type: visible, selector: { text: Sites } }
//! chains:
//!   - name: open dashboard
//!     hand_off: true
//!     steps:
//!       - type: navigate
//!         screen: dashboard
//!         actions: [ { type: tap, selector: { text: Home } } ]
//!       - type: assert
//!         probe: { name: badge, check: { type: visible, selector: { accessibility_id: dashboard_badge } } }
//!         critical: false
//! ```
//!
//! Scripts are validated when parsed: unsupported versions, malformed screens,
//! malformed probes, duplicate chain names and references to unknown screens
//! are all rejected up front.

use crate::chain::{Chain, Step};
use crate::driver::UiAction;
use crate::probe::Probe;
use crate::result::{WaymarkError, WaymarkResult};
use crate::screen::{ScreenDescriptor, TaggedProbe};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Supported script version
pub const SCRIPT_VERSION: &str = "1.0";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    screens: BTreeMap<String, RawScreen>,
    #[serde(default)]
    chains: Vec<ChainSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScreen {
    probes: Vec<TaggedProbe>,
}

/// Declared chain, resolved against the script's screens on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSpec {
    /// Chain name
    pub name: String,
    /// Let the next chain skip its setup after a pass
    #[serde(default)]
    pub hand_off: bool,
    /// Setup steps
    #[serde(default)]
    pub setup: Vec<StepSpec>,
    /// Main steps
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Declared step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    /// Navigate to a declared screen
    Navigate {
        /// Screen id
        screen: String,
        /// Actions performed on each attempt
        #[serde(default)]
        actions: Vec<UiAction>,
        /// Optional label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Evaluate a probe
    Assert {
        /// Probe
        probe: Probe,
        /// Expected value
        #[serde(default = "default_true")]
        expected: bool,
        /// Abort the chain on failure
        #[serde(default = "default_true")]
        critical: bool,
        /// Optional label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Perform actions
    Act {
        /// Actions
        actions: Vec<UiAction>,
        /// Abort the chain on failure
        #[serde(default = "default_true")]
        critical: bool,
        /// Optional label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

/// A parsed and validated chain script
#[derive(Debug, Clone)]
pub struct ChainScript {
    description: Option<String>,
    screens: BTreeMap<String, ScreenDescriptor>,
    chains: Vec<ChainSpec>,
}

impl ChainScript {
    /// Parse and validate a script
    ///
    /// # Errors
    ///
    /// [`WaymarkError::Script`] for parse, version and reference errors,
    /// [`WaymarkError::InvalidDescriptor`] or [`WaymarkError::InvalidProbe`]
    /// for malformed screens and probes.
    pub fn from_yaml(yaml: &str) -> WaymarkResult<Self> {
        let raw: RawScript = serde_yaml_ng::from_str(yaml)
            .map_err(|e| WaymarkError::script(format!("parse error: {e}")))?;
        if raw.version != SCRIPT_VERSION {
            return Err(WaymarkError::script(format!(
                "unsupported version '{}' (expected {SCRIPT_VERSION})",
                raw.version
            )));
        }

        let mut screens = BTreeMap::new();
        for (id, screen) in raw.screens {
            let descriptor = ScreenDescriptor::new(id.clone(), screen.probes)?;
            let _ = screens.insert(id, descriptor);
        }

        let script = Self {
            description: raw.description,
            screens,
            chains: raw.chains,
        };
        script.validate()?;
        Ok(script)
    }

    /// Load and validate a script file
    pub fn load(path: impl AsRef<Path>) -> WaymarkResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            WaymarkError::script(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> WaymarkResult<()> {
        let mut names = HashSet::new();
        for chain in &self.chains {
            if !names.insert(chain.name.as_str()) {
                return Err(WaymarkError::script(format!(
                    "duplicate chain name '{}'",
                    chain.name
                )));
            }
            for step in chain.setup.iter().chain(&chain.steps) {
                match step {
                    StepSpec::Navigate { screen, .. } if !self.screens.contains_key(screen) => {
                        return Err(WaymarkError::script(format!(
                            "chain '{}' references unknown screen '{screen}'",
                            chain.name
                        )));
                    }
                    StepSpec::Assert { probe, .. } => probe.validate()?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Script description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared screens by id
    #[must_use]
    pub const fn screens(&self) -> &BTreeMap<String, ScreenDescriptor> {
        &self.screens
    }

    /// Look up a screen
    #[must_use]
    pub fn screen(&self, id: &str) -> Option<&ScreenDescriptor> {
        self.screens.get(id)
    }

    /// Declared chains in order
    #[must_use]
    pub fn chain_specs(&self) -> &[ChainSpec] {
        &self.chains
    }

    /// Chain names in declared order
    pub fn chain_names(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|c| c.name.as_str())
    }

    /// Build a runnable chain by name
    pub fn chain(&self, name: &str) -> WaymarkResult<Chain> {
        let spec = self
            .chains
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| WaymarkError::script(format!("no chain named '{name}'")))?;
        self.build(spec)
    }

    /// Build every chain in declared order
    pub fn chains(&self) -> WaymarkResult<Vec<Chain>> {
        self.chains.iter().map(|spec| self.build(spec)).collect()
    }

    fn build(&self, spec: &ChainSpec) -> WaymarkResult<Chain> {
        let setup = spec
            .setup
            .iter()
            .map(|s| self.build_step(s))
            .collect::<WaymarkResult<Vec<_>>>()?;
        let steps = spec
            .steps
            .iter()
            .map(|s| self.build_step(s))
            .collect::<WaymarkResult<Vec<_>>>()?;
        Ok(Chain {
            name: spec.name.clone(),
            setup,
            steps,
            hand_off: spec.hand_off,
        })
    }

    fn build_step(&self, spec: &StepSpec) -> WaymarkResult<Step> {
        let (step, label) = match spec {
            StepSpec::Navigate {
                screen,
                actions,
                label,
            } => {
                let descriptor = self.screen(screen).ok_or_else(|| {
                    WaymarkError::script(format!("unknown screen '{screen}'"))
                })?;
                (Step::navigate(descriptor.clone(), actions.clone()), label)
            }
            StepSpec::Assert {
                probe,
                expected,
                critical,
                label,
            } => (
                Step::assert(probe.clone(), *expected).with_critical(*critical),
                label,
            ),
            StepSpec::Act {
                actions,
                critical,
                label,
            } => (Step::act(actions.clone()).with_critical(*critical), label),
        };
        Ok(match label {
            Some(label) => step.with_label(label.clone()),
            None => step,
        })
    }
}
