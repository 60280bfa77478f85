//! Canonical selection model.
//!
//! A [`SelectionState`] is the unit broadcast from the Host Bridge to panels.
//! It is produced fresh on every normalization pass (change event, poll tick,
//! or explicit request) and is immutable once broadcast; each side keeps only
//! the most recent instance.
//!
//! ## Invariants
//!
//! - `primary` is always `elements[0]`, or absent when `elements` is empty.
//!   The in-memory type stores only `elements`; the duplicate `primary` field
//!   exists on the wire and is reconciled on deserialization.
//! - Width values are positive, finite, rounded pixel integers or absent -
//!   never zero, negative, or non-finite. All widths pass through
//!   [`round_px`].

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;

/// A named responsive viewport category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    /// Stable lowercase name used in signatures and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Desktop => "desktop",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Mobile => "mobile",
        }
    }
}

/// Round a raw measured width to a storable pixel value.
///
/// Returns `None` for non-finite, zero, or negative inputs, and for values
/// that round down to zero. This is the single gate through which every
/// stored width passes.
pub fn round_px(raw: f64) -> Option<u32> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let rounded = raw.round();
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return None;
    }
    Some(rounded as u32)
}

/// Rendered widths bucketed by breakpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointWidths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<u32>,
}

impl BreakpointWidths {
    /// No widths at any breakpoint.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The same measured scalar recorded in both the desktop and mobile
    /// slots. Only one width is physically knowable from a single bounding
    /// rect, so a local measurement fills both slots with it.
    pub fn uniform(width: u32) -> Self {
        Self {
            desktop: Some(width),
            tablet: None,
            mobile: Some(width),
        }
    }

    /// True when no breakpoint carries a width.
    pub fn is_empty(&self) -> bool {
        self.desktop.is_none() && self.tablet.is_none() && self.mobile.is_none()
    }

    /// Width for a specific breakpoint.
    pub fn get(&self, breakpoint: Breakpoint) -> Option<u32> {
        match breakpoint {
            Breakpoint::Desktop => self.desktop,
            Breakpoint::Tablet => self.tablet,
            Breakpoint::Mobile => self.mobile,
        }
    }
}

/// Why a dev-mock state was synthesized instead of derived from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MockReason {
    /// No host runtime appeared within the discovery deadline.
    HostUnavailable,
    /// A host runtime exists but exposes no selection getter.
    CapabilityGap,
    /// The host runtime threw while being probed.
    HostError,
}

impl std::fmt::Display for MockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MockReason::HostUnavailable => "host-unavailable",
            MockReason::CapabilityGap => "capability-gap",
            MockReason::HostError => "host-error",
        };
        f.write_str(s)
    }
}

/// One selected visual element, sanitized for cross-frame transport.
///
/// Carries whitelisted identity fields and widths only - never a DOM node or
/// the raw host object. `computed_width_desktop` / `computed_width_mobile`
/// are flattened duplicates of `computed_widths` kept in sync by
/// [`SelectionDescriptor::with_computed_widths`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Alias of `id` retained for consumers of the older payload shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Best-effort CSS-like path to the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    /// Widths supplied by the host, when it provides any.
    #[serde(default, skip_serializing_if = "BreakpointWidths::is_empty")]
    pub widths: BreakpointWidths,
    /// Widths measured locally from the rendered bounding box.
    #[serde(default, skip_serializing_if = "BreakpointWidths::is_empty")]
    pub computed_widths: BreakpointWidths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_width_desktop: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_width_mobile: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dev_mock: bool,
}

impl SelectionDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `id` and its `element_id` alias together.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.element_id = Some(id.clone());
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    /// Set host-supplied widths.
    pub fn with_widths(mut self, widths: BreakpointWidths) -> Self {
        self.widths = widths;
        self
    }

    /// Set locally computed widths, keeping the flattened duplicates in sync.
    pub fn with_computed_widths(mut self, widths: BreakpointWidths) -> Self {
        self.computed_width_desktop = widths.desktop;
        self.computed_width_mobile = widths.mobile;
        self.computed_widths = widths;
        self
    }

    /// Structural identity used for change detection: (id, selector, tag).
    pub fn signature_tuple(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            self.id.as_deref(),
            self.selector.as_deref(),
            self.tag_name.as_deref(),
        )
    }
}

/// Wire form of [`SelectionState`]: carries the duplicate `primary` field.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionStateWire {
    #[serde(default)]
    elements: Vec<SelectionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary: Option<SelectionDescriptor>,
    #[serde(default)]
    dev_mock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<MockReason>,
}

/// Canonical broadcast unit: the current selection as seen by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SelectionStateWire", into = "SelectionStateWire")]
pub struct SelectionState {
    elements: Vec<SelectionDescriptor>,
    dev_mock: bool,
    reason: Option<MockReason>,
}

impl SelectionState {
    /// An empty selection (nothing selected, not mocked).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a state from normalized descriptors. The `dev_mock` flag is
    /// propagated onto every descriptor.
    pub fn new(elements: Vec<SelectionDescriptor>, dev_mock: bool) -> Self {
        let elements = elements
            .into_iter()
            .map(|mut d| {
                d.dev_mock = dev_mock;
                d
            })
            .collect();
        Self {
            elements,
            dev_mock,
            reason: None,
        }
    }

    /// Tag a mocked state with the reason it was synthesized.
    pub fn with_reason(mut self, reason: MockReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Ordered selected elements, possibly empty.
    pub fn elements(&self) -> &[SelectionDescriptor] {
        &self.elements
    }

    /// The first selected element, or `None` when the selection is empty.
    pub fn primary(&self) -> Option<&SelectionDescriptor> {
        self.elements.first()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True when this state was synthesized locally rather than derived from
    /// a real host selection.
    pub fn is_dev_mock(&self) -> bool {
        self.dev_mock
    }

    pub fn reason(&self) -> Option<MockReason> {
        self.reason
    }
}

impl From<SelectionStateWire> for SelectionState {
    fn from(wire: SelectionStateWire) -> Self {
        // Older bridge builds sent a lone `primary`; reconcile towards the
        // elements list so `primary == elements[0]` always holds.
        let elements = if wire.elements.is_empty() {
            wire.primary.into_iter().collect()
        } else {
            wire.elements
        };
        Self {
            elements,
            dev_mock: wire.dev_mock,
            reason: wire.reason,
        }
    }
}

impl From<SelectionState> for SelectionStateWire {
    fn from(state: SelectionState) -> Self {
        Self {
            primary: state.elements.first().cloned(),
            elements: state.elements,
            dev_mock: state.dev_mock,
            reason: state.reason,
        }
    }
}

/// Serialized structural signature of a selection.
///
/// Two states with the same signature select the same elements, regardless
/// of measured widths. The bridge compares signatures between poll ticks and
/// broadcasts only on change.
pub fn selection_signature(state: &SelectionState) -> String {
    let tuples: Vec<_> = state
        .elements()
        .iter()
        .map(|d| d.signature_tuple())
        .collect();
    // The tuple list is always serializable; fall back to a sentinel that
    // never equals a real signature.
    serde_json::to_string(&tuples).unwrap_or_else(|_| "<unserializable>".to_string())
}
