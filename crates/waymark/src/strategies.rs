//! Proptest strategies for selectors, probes and swipe gestures.
//!
//! Enabled with the `proptest` feature so downstream suites can drive their
//! own screen descriptors and list screens with generated input.
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_one_panel(events in swipe_sequence(32)) {
//!         let mut tracker = SwipeTracker::new();
//!         for event in &events {
//!             tracker.apply(event);
//!             prop_assert!(tracker.open_count() <= 1);
//!         }
//!     }
//! }
//! ```

use crate::driver::Selector;
use crate::probe::{Probe, ProbeCheck};
use crate::swipe::SwipeEvent;
use proptest::prelude::*;

/// Row identifiers used by generated swipe events
pub const ROW_IDS: [&str; 4] = ["row-1", "row-2", "row-3", "row-4"];

/// Any selector with a short alphanumeric value
pub fn any_selector() -> impl Strategy<Value = Selector> {
    let value = "[a-z][a-z0-9_]{0,11}";
    prop_oneof![
        value.prop_map(|v| Selector::accessibility_id(v)),
        value.prop_map(|v| Selector::id(v)),
        value.prop_map(|v| Selector::text(v)),
    ]
}

/// Any probe check except regex matching
pub fn any_probe_check() -> impl Strategy<Value = ProbeCheck> {
    prop_oneof![
        any_selector().prop_map(|selector| ProbeCheck::Visible { selector }),
        any_selector().prop_map(|selector| ProbeCheck::Hidden { selector }),
        (any_selector(), "[A-Za-z ]{0,12}")
            .prop_map(|(selector, text)| ProbeCheck::TextEquals { selector, text }),
        (any_selector(), "[A-Za-z ]{0,12}")
            .prop_map(|(selector, text)| ProbeCheck::TextContains { selector, text }),
    ]
}

/// Any valid probe
pub fn any_probe() -> impl Strategy<Value = Probe> {
    ("[a-z][a-z-]{0,15}", any_probe_check()).prop_map(|(name, check)| Probe::new(name, check))
}

/// Any swipe event over [`ROW_IDS`]
pub fn any_swipe_event() -> impl Strategy<Value = SwipeEvent> {
    let row = prop::sample::select(ROW_IDS.to_vec()).prop_map(String::from);
    prop_oneof![
        3 => row.clone().prop_map(SwipeEvent::Swipe),
        1 => row.prop_map(SwipeEvent::SwipeOpposite),
        1 => Just(SwipeEvent::Dismiss),
        1 => Just(SwipeEvent::TapElsewhere),
    ]
}

/// Sequence of up to `max_len` swipe events
pub fn swipe_sequence(max_len: usize) -> impl Strategy<Value = Vec<SwipeEvent>> {
    prop::collection::vec(any_swipe_event(), 0..=max_len)
}
