//! Cross-frame message vocabulary.
//!
//! The wire format is a JSON object whose `type` field selects the message.
//! Host to panel: `element-selected`. Panel to host: the `riaa:`-prefixed
//! requests. The structured [`SelectionState`] payload is the only emitted
//! selection shape; the legacy single-element shape from older bridge builds
//! is still accepted on ingest and normalized away.

use serde::{Deserialize, Serialize};

use crate::selection::{round_px, BreakpointWidths, SelectionDescriptor, SelectionState};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// All messages that cross the panel/bridge boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Bridge to panel: the current selection.
    #[serde(rename = "element-selected")]
    ElementSelected(SelectionBroadcast),

    /// Panel to bridge: register for selection broadcasts.
    #[serde(rename = "riaa:selection:subscribe")]
    Subscribe,

    /// Panel to bridge: run a fresh normalization pass and answer.
    #[serde(rename = "riaa:selection:request")]
    Request,

    /// Panel to bridge: the panel document finished loading; re-broadcast
    /// the last-known state.
    #[serde(rename = "riaa:context-ready")]
    ContextReady,

    /// Panel to bridge: ask the host to resize the panel surface.
    #[serde(rename = "riaa:panel:resize")]
    PanelResize { width: u32, height: u32 },
}

impl BridgeMessage {
    /// Build a structured selection broadcast.
    pub fn selection(state: SelectionState) -> Self {
        BridgeMessage::ElementSelected(SelectionBroadcast {
            state: Some(state),
            element: None,
        })
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::ElementSelected(_) => "element-selected",
            BridgeMessage::Subscribe => "riaa:selection:subscribe",
            BridgeMessage::Request => "riaa:selection:request",
            BridgeMessage::ContextReady => "riaa:context-ready",
            BridgeMessage::PanelResize { .. } => "riaa:panel:resize",
        }
    }
}

/// Payload of an `element-selected` message.
///
/// Exactly one of `state` (structured, current) or `element` (legacy single
/// element) is expected; when both appear the structured state wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionBroadcast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SelectionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<LegacyElement>,
}

impl SelectionBroadcast {
    /// Resolve the payload into the canonical state, upgrading the legacy
    /// shape when necessary. A payload with neither field is an empty
    /// selection.
    pub fn into_state(self) -> SelectionState {
        if let Some(state) = self.state {
            return state;
        }
        match self.element {
            Some(legacy) => SelectionState::new(vec![legacy.into_descriptor()], false),
            None => SelectionState::empty(),
        }
    }
}

/// Single-element payload emitted by older bridge builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    /// Legacy widths arrived as loose numbers; re-validated on upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_width: Option<f64>,
}

impl LegacyElement {
    /// Upgrade to a sanitized descriptor. Width values that fail validation
    /// are dropped rather than carried through.
    pub fn into_descriptor(self) -> SelectionDescriptor {
        let mut descriptor = SelectionDescriptor::new();
        if let Some(id) = self.id {
            descriptor = descriptor.with_id(id);
        }
        if let Some(label) = self.label {
            descriptor = descriptor.with_label(label);
        }
        if let Some(selector) = self.selector {
            descriptor = descriptor.with_selector(selector);
        }
        if let Some(tag_name) = self.tag_name {
            descriptor = descriptor.with_tag_name(tag_name);
        }
        descriptor.with_widths(BreakpointWidths {
            desktop: self.desktop_width.and_then(round_px),
            tablet: None,
            mobile: self.mobile_width.and_then(round_px),
        })
    }
}
