//! Screen descriptors: ordered probe lists identifying a target screen.
//!
//! Probes are listed from most to least authoritative and tagged
//! [`ProbeRole::Primary`] or [`ProbeRole::Fallback`]. A descriptor must hold at
//! least one primary probe; this is checked when it is constructed, so every
//! descriptor that reaches the resolver is well formed.

use crate::probe::Probe;
use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};

/// Authority of a probe within a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeRole {
    /// Authoritative signal for the screen
    Primary,
    /// Secondary signal consulted when primaries are absent
    Fallback,
}

/// A probe together with its role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedProbe {
    /// Probe role
    pub role: ProbeRole,
    /// The probe
    #[serde(flatten)]
    pub probe: Probe,
}

impl TaggedProbe {
    /// Tag a probe as primary
    #[must_use]
    pub const fn primary(probe: Probe) -> Self {
        Self {
            role: ProbeRole::Primary,
            probe,
        }
    }

    /// Tag a probe as fallback
    #[must_use]
    pub const fn fallback(probe: Probe) -> Self {
        Self {
            role: ProbeRole::Fallback,
            probe,
        }
    }
}

/// Identifies a target screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenDescriptor {
    id: String,
    probes: Vec<TaggedProbe>,
}

impl ScreenDescriptor {
    /// Create a descriptor
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::InvalidDescriptor`] if `probes` is empty or has
    /// no primary probe, and [`WaymarkError::InvalidProbe`] if a probe is
    /// malformed.
    pub fn new(id: impl Into<String>, probes: Vec<TaggedProbe>) -> WaymarkResult<Self> {
        let id = id.into();
        if probes.is_empty() {
            return Err(WaymarkError::InvalidDescriptor {
                screen: id,
                reason: "probe list is empty".into(),
            });
        }
        if !probes.iter().any(|p| p.role == ProbeRole::Primary) {
            return Err(WaymarkError::InvalidDescriptor {
                screen: id,
                reason: "no primary probe".into(),
            });
        }
        for tagged in &probes {
            tagged.probe.validate()?;
        }
        Ok(Self { id, probes })
    }

    /// Start building a descriptor
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ScreenDescriptorBuilder {
        ScreenDescriptorBuilder {
            id: id.into(),
            probes: Vec::new(),
        }
    }

    /// Screen identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Probes in declared order
    #[must_use]
    pub fn probes(&self) -> &[TaggedProbe] {
        &self.probes
    }

    /// Primary probes in declared order
    pub fn primary_probes(&self) -> impl Iterator<Item = &Probe> {
        self.probes
            .iter()
            .filter(|p| p.role == ProbeRole::Primary)
            .map(|p| &p.probe)
    }

    /// Look up a probe's role by name
    #[must_use]
    pub fn role_of(&self, probe_name: &str) -> Option<ProbeRole> {
        self.probes
            .iter()
            .find(|p| p.probe.name() == probe_name)
            .map(|p| p.role)
    }
}

/// Builder for [`ScreenDescriptor`]
#[derive(Debug, Clone)]
pub struct ScreenDescriptorBuilder {
    id: String,
    probes: Vec<TaggedProbe>,
}

impl ScreenDescriptorBuilder {
    /// Append a primary probe
    #[must_use]
    pub fn primary(mut self, probe: Probe) -> Self {
        self.probes.push(TaggedProbe::primary(probe));
        self
    }

    /// Append a fallback probe
    #[must_use]
    pub fn fallback(mut self, probe: Probe) -> Self {
        self.probes.push(TaggedProbe::fallback(probe));
        self
    }

    /// Build and validate
    ///
    /// # Errors
    ///
    /// See [`ScreenDescriptor::new`].
    pub fn build(self) -> WaymarkResult<ScreenDescriptor> {
        ScreenDescriptor::new(self.id, self.probes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::Selector;

    #[test]
    fn test_builder_preserves_order() {
        let screen = ScreenDescriptor::builder("dashboard")
            .primary(Probe::visible("badge", Selector::accessibility_id("badge")))
            .fallback(Probe::visible("sites", Selector::text("Sites")))
            .build()
            .unwrap();
        let names: Vec<&str> = screen.probes().iter().map(|p| p.probe.name()).collect();
        assert_eq!(names, vec!["badge", "sites"]);
        assert_eq!(screen.role_of("sites"), Some(ProbeRole::Fallback));
        assert_eq!(screen.primary_probes().count(), 1);
    }

    #[test]
    fn test_empty_probe_list_rejected() {
        let err = ScreenDescriptor::new("empty", Vec::new()).unwrap_err();
        match err {
            WaymarkError::InvalidDescriptor { screen, reason } => {
                assert_eq!(screen, "empty");
                assert!(reason.contains("empty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fallback_only_rejected() {
        let err = ScreenDescriptor::builder("sites")
            .fallback(Probe::visible("sites", Selector::text("Sites")))
            .build()
            .unwrap_err();
        assert!(matches!(err, WaymarkError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_malformed_probe_rejected() {
        let bad = Probe::new(
            "bad",
            crate::probe::ProbeCheck::TextMatches {
                selector: Selector::id("x"),
                pattern: "[".into(),
            },
        );
        let err = ScreenDescriptor::builder("x").primary(bad).build().unwrap_err();
        assert!(matches!(err, WaymarkError::InvalidProbe { .. }));
    }

    #[test]
    fn test_tagged_probe_yaml_is_flat() {
        let yaml = "role: fallback\nname: Sites-button-visible\ncheck: { type: visible, selector: { text: Sites } }\n";
        let tagged: TaggedProbe = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(tagged.role, ProbeRole::Fallback);
        assert_eq!(tagged.probe.name(), "Sites-button-visible");
    }
}
