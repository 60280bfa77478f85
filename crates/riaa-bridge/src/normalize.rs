//! Selection payload normalization.
//!
//! Raw host selection payloads are heterogeneous: a bare element, an array,
//! or an object nesting the selection under one of several field names.
//! Normalization flattens any accepted shape into sanitized
//! [`SelectionDescriptor`]s, measuring each element's rendered width
//! through the [`DomQuery`] surface. Candidates that cannot be resolved to
//! a document node drop silently; when every candidate drops the result
//! degrades to the empty state.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use riaa_protocols::selection::{
    round_px, BreakpointWidths, SelectionDescriptor, SelectionState,
};

use crate::dom::{is_media_tag, DomQuery, NodeId, MEDIA_SELECTOR};

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;

/// Payload fields that may nest the selection, in priority order.
pub const CANDIDATE_FIELDS: &[&str] = &[
    "selectedElements",
    "elements",
    "selection",
    "selectedElement",
    "element",
];

/// Candidate fields that may carry a node handle, in priority order.
pub const NODE_HANDLE_FIELDS: &[&str] = &["domNode", "element", "el", "node", "target"];

/// Extract a flat list of raw element candidates from any accepted payload
/// shape. Falls back to treating the whole payload as a single candidate.
pub fn extract_candidates(payload: &Value) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }
    if let Value::Object(map) = payload {
        for field in CANDIDATE_FIELDS {
            if let Some(nested) = map.get(*field) {
                return match nested {
                    Value::Array(items) => items.clone(),
                    Value::Null => Vec::new(),
                    other => vec![other.clone()],
                };
            }
        }
    }
    vec![payload.clone()]
}

/// Turns raw host payloads into canonical selection states.
pub struct Normalizer {
    dom: Arc<dyn DomQuery>,
}

impl Normalizer {
    pub fn new(dom: Arc<dyn DomQuery>) -> Self {
        Self { dom }
    }

    /// Normalize one raw payload into a fresh [`SelectionState`].
    pub fn normalize(&self, payload: &Value) -> SelectionState {
        let candidates = extract_candidates(payload);
        let total = candidates.len();
        let elements: Vec<SelectionDescriptor> = candidates
            .iter()
            .filter_map(|candidate| self.describe(candidate))
            .collect();
        if elements.len() < total {
            debug!(
                resolved = elements.len(),
                dropped = total - elements.len(),
                "some selection candidates did not resolve"
            );
        }
        SelectionState::new(elements, false)
    }

    /// Resolve one candidate into a sanitized descriptor, or `None` when no
    /// document node can be found for it.
    fn describe(&self, candidate: &Value) -> Option<SelectionDescriptor> {
        let node = self.resolve_node(candidate)?;
        let visual = self.visual_node(node);

        let mut descriptor = SelectionDescriptor::new();
        if let Some(id) = str_field(candidate, "id").or_else(|| self.dom.element_id(node)) {
            descriptor = descriptor.with_id(id);
        }
        if let Some(label) = str_field(candidate, "label")
            .or_else(|| str_field(candidate, "name"))
            .or_else(|| self.dom.label(node))
        {
            descriptor = descriptor.with_label(label);
        }
        if let Some(selector) = str_field(candidate, "selector").or_else(|| self.dom.css_path(node))
        {
            descriptor = descriptor.with_selector(selector);
        }
        if let Some(tag) = self
            .dom
            .tag_name(node)
            .or_else(|| str_field(candidate, "tagName"))
        {
            descriptor = descriptor.with_tag_name(tag.to_ascii_lowercase());
        }

        descriptor = descriptor.with_widths(host_widths(candidate));

        // Single-measurement policy: one bounding rect yields one scalar,
        // recorded under both the desktop and mobile slots regardless of
        // the active device context.
        let computed = self
            .dom
            .bounding_width(visual)
            .and_then(round_px)
            .map(BreakpointWidths::uniform)
            .unwrap_or_default();
        Some(descriptor.with_computed_widths(computed))
    }

    /// Resolve the underlying document node: handle fields in order, then a
    /// selector lookup, then an element-id lookup.
    fn resolve_node(&self, candidate: &Value) -> Option<NodeId> {
        if let Value::Object(map) = candidate {
            for field in NODE_HANDLE_FIELDS {
                if let Some(handle) = map.get(*field) {
                    if let Some(node) = self.dom.node_from_handle(handle) {
                        return Some(node);
                    }
                }
            }
        }
        if let Some(selector) = str_field(candidate, "selector") {
            if let Some(node) = self.dom.query_selector(&selector) {
                return Some(node);
            }
        }
        if let Some(id) = str_field(candidate, "id") {
            if let Some(node) = self.dom.element_by_id(&id) {
                return Some(node);
            }
        }
        None
    }

    /// Pick the node whose width is actually worth measuring: the node
    /// itself when it is media-like or carries a background image, else its
    /// first media-like descendant, else the node itself.
    fn visual_node(&self, node: NodeId) -> NodeId {
        let media_like = self
            .dom
            .tag_name(node)
            .map(|tag| is_media_tag(&tag))
            .unwrap_or(false);
        if media_like || self.dom.has_background_image(node) {
            return node;
        }
        self.dom.find_descendant(node, MEDIA_SELECTOR).unwrap_or(node)
    }
}

/// String field accessor tolerant of non-object candidates.
fn str_field(candidate: &Value, field: &str) -> Option<String> {
    candidate
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Host-supplied widths from a candidate's `widths` field, re-validated.
fn host_widths(candidate: &Value) -> BreakpointWidths {
    let Some(widths) = candidate.get("widths") else {
        return BreakpointWidths::empty();
    };
    let width_of = |field: &str| widths.get(field).and_then(Value::as_f64).and_then(round_px);
    BreakpointWidths {
        desktop: width_of("desktop"),
        tablet: width_of("tablet"),
        mobile: width_of("mobile"),
    }
}
