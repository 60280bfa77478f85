use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast as tokio_broadcast;

use riaa_protocols::error::{ChannelError, HostApiError};
use riaa_protocols::origin::{Environment, Origin};
use riaa_protocols::selection::SelectionDescriptor;

use super::*;
use crate::host::{AttachStyle, HostCapabilities};
use crate::dom::NodeId;

fn origin(s: &str) -> Origin {
    Origin::parse(s).unwrap()
}

fn trusted_origin() -> Origin {
    origin("https://canvas.sitepilot.io")
}

/// Channel endpoint that records everything posted through it.
struct TestLink {
    local: Origin,
    window: WindowRef,
    posted: Mutex<Vec<BridgeMessage>>,
    inbound_tx: tokio_broadcast::Sender<Envelope>,
}

impl TestLink {
    fn new() -> Arc<Self> {
        let (inbound_tx, _) = tokio_broadcast::channel(16);
        Arc::new(Self {
            local: origin("https://sitepilot.io"),
            window: WindowRef::new(),
            posted: Mutex::new(Vec::new()),
            inbound_tx,
        })
    }

    fn posted_states(&self) -> Vec<SelectionState> {
        self.posted
            .lock()
            .iter()
            .filter_map(|m| match m {
                BridgeMessage::ElementSelected(b) => Some(b.clone().into_state()),
                _ => None,
            })
            .collect()
    }
}

impl FrameChannel for TestLink {
    fn post(&self, message: BridgeMessage) -> Result<(), ChannelError> {
        self.posted.lock().push(message);
        Ok(())
    }

    fn inbound(&self) -> tokio_broadcast::Receiver<Envelope> {
        self.inbound_tx.subscribe()
    }

    fn local_origin(&self) -> &Origin {
        &self.local
    }

    fn local_window(&self) -> WindowRef {
        self.window
    }
}

/// Document with a single known image node.
struct SingleImgDom;

impl DomQuery for SingleImgDom {
    fn node_from_handle(&self, handle: &Value) -> Option<NodeId> {
        (handle.as_u64() == Some(1)).then_some(NodeId(1))
    }

    fn query_selector(&self, _selector: &str) -> Option<NodeId> {
        None
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        (id == "hero").then_some(NodeId(1))
    }

    fn tag_name(&self, _node: NodeId) -> Option<String> {
        Some("img".to_string())
    }

    fn has_background_image(&self, _node: NodeId) -> bool {
        false
    }

    fn find_descendant(&self, _node: NodeId, _selector: &str) -> Option<NodeId> {
        None
    }

    fn bounding_width(&self, _node: NodeId) -> Option<f64> {
        Some(640.0)
    }

    fn css_path(&self, _node: NodeId) -> Option<String> {
        Some("main img".to_string())
    }

    fn label(&self, _node: NodeId) -> Option<String> {
        None
    }

    fn element_id(&self, _node: NodeId) -> Option<String> {
        Some("hero".to_string())
    }
}

/// Host whose resize can be told to fail a number of times first.
struct FlakyHost {
    caps: HostCapabilities,
    selection: Value,
    resize_failures_left: AtomicU32,
    resize_calls: AtomicU32,
}

impl FlakyHost {
    fn new(selection: Value) -> Self {
        Self {
            caps: HostCapabilities::full(),
            selection,
            resize_failures_left: AtomicU32::new(0),
            resize_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl HostRuntime for FlakyHost {
    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    async fn ready(&self) -> Result<(), HostApiError> {
        Ok(())
    }

    fn attach_listener(
        &self,
        _style: AttachStyle,
        _event: &str,
        _events: mpsc::Sender<Value>,
    ) -> Result<(), HostApiError> {
        Ok(())
    }

    async fn selected_element(&self) -> Result<Value, HostApiError> {
        Ok(self.selection.clone())
    }

    async fn selected_elements(&self) -> Result<Value, HostApiError> {
        Ok(self.selection.clone())
    }

    async fn resize_panel(&self, _width: u32, _height: u32) -> Result<(), HostApiError> {
        self.resize_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.resize_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.resize_failures_left.store(left - 1, Ordering::SeqCst);
            Err(HostApiError::CallFailed("host busy".to_string()))
        } else {
            Ok(())
        }
    }
}

fn production_bridge() -> Arc<HostBridge> {
    HostBridge::new(
        BridgeSettings::default(),
        OriginPolicy::for_host(Environment::Production, None),
        Arc::new(SingleImgDom),
    )
}

fn sample_state(id: &str) -> SelectionState {
    SelectionState::new(vec![SelectionDescriptor::new().with_id(id)], false)
}

#[tokio::test]
async fn test_subscribe_registers_and_answers() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            window,
            BridgeMessage::Subscribe,
        ))
        .await;

    assert_eq!(bridge.subscriber_count(), 1);
    // With no pass completed yet, the answer is the empty state.
    let states = link.posted_states();
    assert_eq!(states.len(), 1);
    assert!(states[0].is_empty());
}

#[tokio::test]
async fn test_subscribe_answers_latest_state() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.publish(sample_state("hero"), false);

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            window,
            BridgeMessage::Subscribe,
        ))
        .await;

    let states = link.posted_states();
    assert_eq!(states[0].primary().unwrap().id.as_deref(), Some("hero"));
}

#[tokio::test]
async fn test_untrusted_origin_dropped() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());

    bridge
        .handle_envelope(Envelope::new(
            origin("https://evil.example.com"),
            window,
            BridgeMessage::Subscribe,
        ))
        .await;

    assert_eq!(bridge.subscriber_count(), 0);
    assert!(link.posted.lock().is_empty());
    assert!(!bridge.trust.is_pinned());
}

#[tokio::test]
async fn test_foreign_origin_after_pin_dropped() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            window,
            BridgeMessage::Subscribe,
        ))
        .await;
    // Same window, different (even allow-listed) origin: rejected.
    bridge
        .handle_envelope(Envelope::new(
            origin("https://sitepilot.io"),
            window,
            BridgeMessage::Request,
        ))
        .await;

    // Only the subscribe answer went out.
    assert_eq!(link.posted.lock().len(), 1);
}

#[tokio::test]
async fn test_same_origin_different_window_dropped() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let pinned_window = WindowRef::new();
    let other_window = WindowRef::new();
    bridge.links.insert(pinned_window, link.clone());
    bridge.links.insert(other_window, link.clone());

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            pinned_window,
            BridgeMessage::Subscribe,
        ))
        .await;
    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            other_window,
            BridgeMessage::Subscribe,
        ))
        .await;

    assert_eq!(bridge.subscriber_count(), 1);
}

#[tokio::test]
async fn test_request_runs_fresh_pass() {
    let bridge = production_bridge();
    *bridge.host.write() = Some(Arc::new(FlakyHost::new(json!({"elements": [{"domNode": 1}]}))));
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            window,
            BridgeMessage::Request,
        ))
        .await;

    let states = link.posted_states();
    assert_eq!(states.len(), 1);
    let primary = states[0].primary().unwrap();
    assert_eq!(primary.id.as_deref(), Some("hero"));
    assert_eq!(primary.computed_widths.desktop, Some(640));
}

#[tokio::test]
async fn test_context_ready_resends_last_known() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.publish(sample_state("hero"), false);

    bridge
        .handle_envelope(Envelope::new(
            trusted_origin(),
            window,
            BridgeMessage::ContextReady,
        ))
        .await;

    let states = link.posted_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].primary().unwrap().id.as_deref(), Some("hero"));
}

#[tokio::test]
async fn test_publish_dedups_by_signature() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.subscribers.insert(window, chrono::Utc::now());

    bridge.publish(sample_state("hero"), true);
    bridge.publish(sample_state("hero"), true);

    assert_eq!(link.posted.lock().len(), 1);
}

#[tokio::test]
async fn test_publish_dedup_still_replaces_latest() {
    let bridge = production_bridge();
    bridge.publish(sample_state("hero"), true);

    let mut updated = SelectionDescriptor::new().with_id("hero");
    updated.label = Some("fresh label".to_string());
    bridge.publish(SelectionState::new(vec![updated], false), true);

    let latest = bridge.latest_state().unwrap();
    assert_eq!(latest.primary().unwrap().label.as_deref(), Some("fresh label"));
}

#[tokio::test]
async fn test_publish_broadcasts_on_identity_change() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.subscribers.insert(window, chrono::Utc::now());

    bridge.publish(sample_state("hero"), true);
    bridge.publish(sample_state("other"), true);

    assert_eq!(link.posted.lock().len(), 2);
}

#[tokio::test]
async fn test_dev_fallback_is_mock() {
    let bridge = HostBridge::new(
        BridgeSettings::default(),
        OriginPolicy::for_host(Environment::Development, None),
        Arc::new(SingleImgDom),
    );
    bridge.publish_fallback(MockReason::HostUnavailable);

    let latest = bridge.latest_state().unwrap();
    assert!(latest.is_dev_mock());
    assert_eq!(latest.primary().unwrap().widths.desktop, Some(640));
    assert_eq!(latest.reason(), Some(MockReason::HostUnavailable));
}

#[tokio::test]
async fn test_production_fallback_is_empty() {
    let bridge = production_bridge();
    bridge.publish_fallback(MockReason::HostUnavailable);

    let latest = bridge.latest_state().unwrap();
    assert!(latest.is_empty());
    assert!(!latest.is_dev_mock());
}

#[tokio::test(start_paused = true)]
async fn test_resize_retries_until_success() {
    let bridge = production_bridge();
    let host = Arc::new(FlakyHost::new(Value::Null));
    host.resize_failures_left.store(1, Ordering::SeqCst);
    *bridge.host.write() = Some(host.clone());

    bridge.forward_resize(420, 600).await;

    assert_eq!(host.resize_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_resize_stops_at_attempt_cap() {
    let bridge = production_bridge();
    let host = Arc::new(FlakyHost::new(Value::Null));
    host.resize_failures_left.store(u32::MAX, Ordering::SeqCst);
    *bridge.host.write() = Some(host.clone());

    bridge.forward_resize(420, 600).await;

    assert_eq!(host.resize_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_resize_without_host_is_noop() {
    let bridge = production_bridge();
    // No host runtime at all; must return without panicking.
    bridge.forward_resize(420, 600).await;
}

#[tokio::test]
async fn test_event_payload_normalized_directly() {
    let bridge = production_bridge();
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.subscribers.insert(window, chrono::Utc::now());

    bridge.on_host_event(json!({"selectedElements": [{"domNode": 1}]})).await;

    let states = link.posted_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].primary().unwrap().id.as_deref(), Some("hero"));
}

#[tokio::test]
async fn test_bare_event_refetches_from_host() {
    let bridge = production_bridge();
    *bridge.host.write() = Some(Arc::new(FlakyHost::new(json!([{"domNode": 1}]))));
    let link = TestLink::new();
    let window = WindowRef::new();
    bridge.links.insert(window, link.clone());
    bridge.subscribers.insert(window, chrono::Utc::now());

    bridge.on_host_event(Value::Null).await;

    assert_eq!(link.posted_states().len(), 1);
}
