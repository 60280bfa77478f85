use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::*;

#[derive(Default)]
struct TestNode {
    tag: &'static str,
    width: Option<f64>,
    background_image: bool,
    children: Vec<NodeId>,
    label: Option<&'static str>,
    css_path: Option<&'static str>,
    element_id: Option<&'static str>,
}

#[derive(Default)]
struct TestDom {
    nodes: HashMap<NodeId, TestNode>,
    by_selector: HashMap<&'static str, NodeId>,
    by_id: HashMap<&'static str, NodeId>,
}

impl TestDom {
    fn insert(&mut self, id: u64, node: TestNode) -> NodeId {
        let node_id = NodeId(id);
        if let Some(element_id) = node.element_id {
            self.by_id.insert(element_id, node_id);
        }
        if let Some(path) = node.css_path {
            self.by_selector.insert(path, node_id);
        }
        self.nodes.insert(node_id, node);
        node_id
    }
}

impl DomQuery for TestDom {
    fn node_from_handle(&self, handle: &Value) -> Option<NodeId> {
        let raw = match handle {
            Value::Number(n) => n.as_u64()?,
            Value::Object(map) => map.get("nodeId")?.as_u64()?,
            _ => return None,
        };
        let node = NodeId(raw);
        self.nodes.contains_key(&node).then_some(node)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.by_selector.get(selector).copied()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.tag.to_string())
    }

    fn has_background_image(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.background_image)
    }

    fn find_descendant(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        assert_eq!(selector, MEDIA_SELECTOR);
        let start = self.nodes.get(&node)?;
        let mut queue: Vec<NodeId> = start.children.clone();
        while let Some(next) = queue.pop() {
            let child = self.nodes.get(&next)?;
            if is_media_tag(child.tag) {
                return Some(next);
            }
            queue.extend(child.children.iter().copied());
        }
        None
    }

    fn bounding_width(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).and_then(|n| n.width)
    }

    fn css_path(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.css_path).map(String::from)
    }

    fn label(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.label).map(String::from)
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.element_id)
            .map(String::from)
    }
}

/// A document with one hero image inside a section, plus a bare image.
fn sample_dom() -> TestDom {
    let mut dom = TestDom::default();
    dom.insert(
        2,
        TestNode {
            tag: "img",
            width: Some(640.3),
            label: Some("Hero"),
            css_path: Some("main > section > img"),
            element_id: Some("hero-img"),
            ..Default::default()
        },
    );
    dom.insert(
        1,
        TestNode {
            tag: "section",
            width: Some(1200.0),
            children: vec![NodeId(2)],
            css_path: Some("main > section"),
            element_id: Some("hero"),
            ..Default::default()
        },
    );
    dom.insert(
        3,
        TestNode {
            tag: "img",
            width: Some(320.0),
            css_path: Some("aside img"),
            element_id: Some("thumb"),
            ..Default::default()
        },
    );
    dom
}

fn normalizer() -> Normalizer {
    Normalizer::new(Arc::new(sample_dom()))
}

#[test]
fn test_extract_direct_array() {
    let payload = json!([{"id": "a"}, {"id": "b"}]);
    assert_eq!(extract_candidates(&payload).len(), 2);
}

#[test]
fn test_extract_field_priority() {
    // `selectedElements` outranks `element`.
    let payload = json!({
        "selectedElements": [{"id": "a"}],
        "element": {"id": "z"}
    });
    let candidates = extract_candidates(&payload);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["id"], "a");
}

#[test]
fn test_extract_each_nested_field() {
    for field in CANDIDATE_FIELDS {
        let mut map = serde_json::Map::new();
        map.insert((*field).to_string(), json!({"id": "x"}));
        let candidates = extract_candidates(&Value::Object(map));
        assert_eq!(candidates.len(), 1, "field {field}");
    }
}

#[test]
fn test_extract_whole_payload_fallback() {
    let payload = json!({"id": "standalone"});
    let candidates = extract_candidates(&payload);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["id"], "standalone");
}

#[test]
fn test_extract_null_nested_selection() {
    let payload = json!({"selection": null});
    assert!(extract_candidates(&payload).is_empty());
}

#[test]
fn test_normalize_resolves_by_handle() {
    let state = normalizer().normalize(&json!({"domNode": 2}));
    let primary = state.primary().unwrap();
    assert_eq!(primary.tag_name.as_deref(), Some("img"));
    assert_eq!(primary.computed_widths.desktop, Some(640));
    assert_eq!(primary.computed_widths.mobile, Some(640));
    assert_eq!(primary.computed_width_desktop, Some(640));
}

#[test]
fn test_normalize_handle_field_priority() {
    // `domNode` outranks `target`.
    let state = normalizer().normalize(&json!({"domNode": 2, "target": 3}));
    assert_eq!(state.primary().unwrap().id.as_deref(), Some("hero-img"));
}

#[test]
fn test_normalize_resolves_by_selector() {
    let state = normalizer().normalize(&json!({"selector": "aside img"}));
    assert_eq!(state.primary().unwrap().id.as_deref(), Some("thumb"));
}

#[test]
fn test_normalize_resolves_by_id() {
    let state = normalizer().normalize(&json!({"id": "thumb"}));
    assert_eq!(state.primary().unwrap().computed_widths.desktop, Some(320));
}

#[test]
fn test_normalize_container_measures_media_descendant() {
    // Selecting the section measures the img inside it, not the section.
    let state = normalizer().normalize(&json!({"domNode": 1}));
    let primary = state.primary().unwrap();
    assert_eq!(primary.tag_name.as_deref(), Some("section"));
    assert_eq!(primary.computed_widths.desktop, Some(640));
}

#[test]
fn test_normalize_background_image_measures_node_itself() {
    let mut dom = TestDom::default();
    dom.insert(
        10,
        TestNode {
            tag: "div",
            width: Some(900.0),
            background_image: true,
            ..Default::default()
        },
    );
    let state = Normalizer::new(Arc::new(dom)).normalize(&json!({"domNode": 10}));
    assert_eq!(state.primary().unwrap().computed_widths.desktop, Some(900));
}

#[test]
fn test_normalize_container_without_media_measures_itself() {
    let mut dom = TestDom::default();
    dom.insert(
        20,
        TestNode {
            tag: "div",
            width: Some(480.0),
            ..Default::default()
        },
    );
    let state = Normalizer::new(Arc::new(dom)).normalize(&json!({"domNode": 20}));
    assert_eq!(state.primary().unwrap().computed_widths.desktop, Some(480));
}

#[test]
fn test_normalize_unresolvable_candidates_drop() {
    let payload = json!([{"domNode": 2}, {"domNode": 999}, {"selector": "#nope"}]);
    let state = normalizer().normalize(&payload);
    assert_eq!(state.elements().len(), 1);
}

#[test]
fn test_normalize_all_drop_degrades_to_empty() {
    let state = normalizer().normalize(&json!({"domNode": 999}));
    assert!(state.is_empty());
    assert!(state.primary().is_none());
}

#[test]
fn test_normalize_null_payload_is_empty() {
    let state = normalizer().normalize(&Value::Null);
    assert!(state.is_empty());
}

#[test]
fn test_normalize_elements_count_matches_resolvable() {
    let payload = json!({"selectedElements": [{"domNode": 2}, {"domNode": 3}]});
    let state = normalizer().normalize(&payload);
    assert_eq!(state.elements().len(), 2);
    assert_eq!(
        state.primary().unwrap().id.as_deref(),
        state.elements()[0].id.as_deref()
    );
}

#[test]
fn test_normalize_keeps_host_widths() {
    let payload = json!({
        "domNode": 2,
        "widths": {"desktop": 800.0, "mobile": 400.4, "tablet": -1.0}
    });
    let state = normalizer().normalize(&payload);
    let primary = state.primary().unwrap();
    assert_eq!(primary.widths.desktop, Some(800));
    assert_eq!(primary.widths.mobile, Some(400));
    // Invalid width values are dropped, not clamped.
    assert_eq!(primary.widths.tablet, None);
}

#[test]
fn test_normalize_sanitizes_candidate_fields() {
    // Raw host fields like the node handle never reach the descriptor.
    let payload = json!({"domNode": 2, "secretHostField": {"huge": "blob"}});
    let state = normalizer().normalize(&payload);
    let value = serde_json::to_value(state.primary().unwrap()).unwrap();
    assert!(value.get("secretHostField").is_none());
    assert!(value.get("domNode").is_none());
}

#[test]
fn test_normalize_identity_prefers_candidate_fields() {
    let payload = json!({
        "domNode": 2,
        "id": "from-host",
        "label": "Host label",
        "selector": ".host-path"
    });
    let state = normalizer().normalize(&payload);
    let primary = state.primary().unwrap();
    assert_eq!(primary.id.as_deref(), Some("from-host"));
    assert_eq!(primary.element_id.as_deref(), Some("from-host"));
    assert_eq!(primary.label.as_deref(), Some("Host label"));
    assert_eq!(primary.selector.as_deref(), Some(".host-path"));
}

#[test]
fn test_normalize_identity_falls_back_to_dom() {
    let state = normalizer().normalize(&json!({"domNode": 2}));
    let primary = state.primary().unwrap();
    assert_eq!(primary.id.as_deref(), Some("hero-img"));
    assert_eq!(primary.label.as_deref(), Some("Hero"));
    assert_eq!(primary.selector.as_deref(), Some("main > section > img"));
}

#[test]
fn test_normalize_object_node_handle() {
    let state = normalizer().normalize(&json!({"element": {"nodeId": 3}}));
    assert_eq!(state.primary().unwrap().id.as_deref(), Some("thumb"));
}

#[test]
fn test_normalize_rejects_unmeasurable_width() {
    let mut dom = TestDom::default();
    dom.insert(
        30,
        TestNode {
            tag: "img",
            width: Some(0.0),
            element_id: Some("zero"),
            ..Default::default()
        },
    );
    let state = Normalizer::new(Arc::new(dom)).normalize(&json!({"domNode": 30}));
    let primary = state.primary().unwrap();
    assert!(primary.computed_widths.is_empty());
    assert_eq!(primary.computed_width_desktop, None);
}
