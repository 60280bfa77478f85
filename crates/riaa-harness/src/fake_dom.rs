//! In-memory document for normalization tests and the offline simulator.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use riaa_bridge::dom::{is_media_tag, DomQuery, NodeId};

/// One fake document node.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub tag: String,
    pub width: Option<f64>,
    pub background_image: bool,
    pub children: Vec<NodeId>,
    pub label: Option<String>,
    pub css_path: Option<String>,
    pub element_id: Option<String>,
}

impl FakeNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_background_image(mut self) -> Self {
        self.background_image = true;
        self
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_css_path(mut self, path: impl Into<String>) -> Self {
        self.css_path = Some(path.into());
        self
    }

    pub fn with_element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }
}

/// An in-memory [`DomQuery`] implementation.
///
/// Node handles are accepted either as bare numbers or as objects carrying
/// a `nodeId` field, matching the handle shapes raw host payloads use.
#[derive(Default)]
pub struct FakeDom {
    nodes: RwLock<HashMap<NodeId, FakeNode>>,
    by_selector: RwLock<HashMap<String, NodeId>>,
    by_id: RwLock<HashMap<String, NodeId>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under the given numeric handle, indexing its selector
    /// and element id when present.
    pub fn insert(&self, id: u64, node: FakeNode) -> NodeId {
        let node_id = NodeId(id);
        if let Some(path) = &node.css_path {
            self.by_selector.write().insert(path.clone(), node_id);
        }
        if let Some(element_id) = &node.element_id {
            self.by_id.write().insert(element_id.clone(), node_id);
        }
        self.nodes.write().insert(node_id, node);
        node_id
    }

    /// Change a node's rendered width mid-test.
    pub fn set_width(&self, node: NodeId, width: f64) {
        if let Some(entry) = self.nodes.write().get_mut(&node) {
            entry.width = Some(width);
        }
    }
}

impl DomQuery for FakeDom {
    fn node_from_handle(&self, handle: &Value) -> Option<NodeId> {
        let raw = match handle {
            Value::Number(n) => n.as_u64()?,
            Value::Object(map) => map.get("nodeId")?.as_u64()?,
            _ => return None,
        };
        let node = NodeId(raw);
        self.nodes.read().contains_key(&node).then_some(node)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.by_selector.read().get(selector).copied()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.read().get(id).copied()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.read().get(&node).map(|n| n.tag.clone())
    }

    fn has_background_image(&self, node: NodeId) -> bool {
        self.nodes
            .read()
            .get(&node)
            .is_some_and(|n| n.background_image)
    }

    fn find_descendant(&self, node: NodeId, _selector: &str) -> Option<NodeId> {
        // The bridge only ever passes the fixed media selector; breadth-first
        // over children looking for a media tag models it.
        let nodes = self.nodes.read();
        let mut queue: Vec<NodeId> = nodes.get(&node)?.children.clone();
        while let Some(next) = queue.pop() {
            let child = nodes.get(&next)?;
            if is_media_tag(&child.tag) {
                return Some(next);
            }
            queue.extend(child.children.iter().copied());
        }
        None
    }

    fn bounding_width(&self, node: NodeId) -> Option<f64> {
        self.nodes.read().get(&node).and_then(|n| n.width)
    }

    fn css_path(&self, node: NodeId) -> Option<String> {
        self.nodes.read().get(&node).and_then(|n| n.css_path.clone())
    }

    fn label(&self, node: NodeId) -> Option<String> {
        self.nodes.read().get(&node).and_then(|n| n.label.clone())
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.nodes
            .read()
            .get(&node)
            .and_then(|n| n.element_id.clone())
    }
}
