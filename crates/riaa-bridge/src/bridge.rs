//! The Host Bridge orchestrator.
//!
//! Owns the single latest-state cell, the trust pin, and the panel
//! subscriber registry, and drives the event/poll/request loop. All state
//! mutation happens on the run loop task; panels interact purely through
//! envelopes, so a new [`SelectionState`](riaa_protocols::SelectionState)
//! always replaces the prior one wholesale.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use riaa_protocols::channel::{Envelope, FrameChannel, WindowRef};
use riaa_protocols::message::BridgeMessage;
use riaa_protocols::origin::{OriginPolicy, TrustCell};
use riaa_protocols::selection::{selection_signature, MockReason, SelectionState};
use riaa_protocols::shutdown::ShutdownSignal;
use riaa_protocols::state_cell::StateCell;

use crate::devmock::dev_mock_state;
use crate::discovery::{discover, GlobalScope};
use crate::dom::DomQuery;
use crate::host::{pick_attach, pick_getter, HostRuntime, SelectionGetter, SELECTION_EVENTS};
use crate::normalize::Normalizer;

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;

/// Runtime tunables for the bridge. Defaults are the protocol constants.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Deadline for host runtime discovery.
    pub discovery_timeout: Duration,
    /// Interval between discovery probes.
    pub probe_interval: Duration,
    /// Selection polling interval.
    pub poll_interval: Duration,
    /// Attempt cap for forwarding one panel resize request.
    pub resize_max_attempts: u32,
    /// Delay between resize forwarding attempts.
    pub resize_retry: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_millis(5000),
            probe_interval: Duration::from_millis(250),
            poll_interval: Duration::from_millis(1500),
            resize_max_attempts: 3,
            resize_retry: Duration::from_millis(250),
        }
    }
}

/// The Host Bridge.
pub struct HostBridge {
    settings: BridgeSettings,
    policy: OriginPolicy,
    trust: TrustCell,
    normalizer: Normalizer,
    /// Channel endpoints keyed by the peer window observed on them.
    links: DashMap<WindowRef, Arc<dyn FrameChannel>>,
    /// Panels that asked for selection broadcasts.
    subscribers: DashMap<WindowRef, chrono::DateTime<chrono::Utc>>,
    /// The most recent selection state; replaced wholesale on every update.
    latest: StateCell<SelectionState>,
    /// Signature of the last broadcast state, for poll dedup.
    last_signature: Mutex<Option<String>>,
    host: RwLock<Option<Arc<dyn HostRuntime>>>,
    inbound_tx: mpsc::Sender<Envelope>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
}

impl HostBridge {
    pub fn new(settings: BridgeSettings, policy: OriginPolicy, dom: Arc<dyn DomQuery>) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        Arc::new(Self {
            settings,
            policy,
            trust: TrustCell::new(),
            normalizer: Normalizer::new(dom),
            links: DashMap::new(),
            subscribers: DashMap::new(),
            latest: StateCell::new(),
            last_signature: Mutex::new(None),
            host: RwLock::new(None),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
        })
    }

    /// Attach a panel channel endpoint. Envelopes arriving on it feed the
    /// run loop; the peer window observed on each envelope maps the window
    /// back to this endpoint for replies and broadcasts.
    pub fn attach_panel(self: &Arc<Self>, link: Arc<dyn FrameChannel>) {
        let bridge = Arc::clone(self);
        let mut rx = link.inbound();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        bridge.links.insert(envelope.window, Arc::clone(&link));
                        if bridge.inbound_tx.send(envelope).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "panel link lagged; envelopes dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Run the bridge until shutdown: discover the host, attach change
    /// listeners, poll as a fallback, and serve panel requests.
    pub async fn run(self: Arc<Self>, scope: Arc<dyn GlobalScope>, shutdown: ShutdownSignal) {
        let mut shutdown_rx = shutdown.subscribe();
        let (events_tx, mut events_rx) = mpsc::channel::<Value>(32);

        let discovered = discover(
            scope.as_ref(),
            self.settings.discovery_timeout,
            self.settings.probe_interval,
        )
        .await;

        match discovered {
            Some((host, _probe)) => {
                let caps = host.capabilities();
                *self.host.write() = Some(Arc::clone(&host));
                if caps.ready {
                    // Host-defined ready hook; absence is a no-op passthrough.
                    if let Err(e) = host.ready().await {
                        warn!(error = %e, "host ready callback failed");
                    }
                }
                self.attach_host_events(&host, events_tx.clone());
                if caps.has_selection_getter() {
                    self.refresh(false).await;
                } else {
                    self.publish_fallback(MockReason::CapabilityGap);
                }
            }
            None => self.publish_fallback(MockReason::HostUnavailable),
        }

        let polling = self
            .host
            .read()
            .as_ref()
            .is_some_and(|h| h.capabilities().has_selection_getter());
        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately; the initial
        // pass above already covered it.
        poll.tick().await;

        let Some(mut inbound) = self.inbound_rx.lock().take() else {
            error!("bridge run loop started twice");
            return;
        };

        info!(polling, "host bridge running");
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                Some(envelope) = inbound.recv() => self.handle_envelope(envelope).await,
                Some(payload) = events_rx.recv() => self.on_host_event(payload).await,
                _ = poll.tick(), if polling => self.refresh(true).await,
            }
        }
        info!("host bridge stopped");
    }

    /// Validate and dispatch one inbound envelope. Untrusted envelopes are
    /// dropped silently; this is the only place panel input enters the
    /// bridge.
    pub async fn handle_envelope(self: &Arc<Self>, envelope: Envelope) {
        let decision = self
            .trust
            .admit(&self.policy, &envelope.origin, envelope.window);
        if !decision.is_trusted() {
            debug!(
                origin = %envelope.origin,
                window = %envelope.window,
                ?decision,
                kind = envelope.message.kind(),
                "dropping untrusted envelope"
            );
            return;
        }

        match envelope.message {
            BridgeMessage::Subscribe => {
                self.subscribers.insert(envelope.window, chrono::Utc::now());
                debug!(window = %envelope.window, "panel subscribed");
                self.answer(envelope.window);
            }
            BridgeMessage::Request => {
                self.refresh(true).await;
                self.answer(envelope.window);
            }
            BridgeMessage::ContextReady => {
                // The panel document finished loading; re-send the
                // last-known state so it can render without a refetch.
                self.answer(envelope.window);
            }
            BridgeMessage::PanelResize { width, height } => {
                let bridge = Arc::clone(self);
                tokio::spawn(async move { bridge.forward_resize(width, height).await });
            }
            BridgeMessage::ElementSelected(_) => {
                debug!("ignoring selection broadcast addressed to panels");
            }
        }
    }

    /// Latest selection snapshot, if any pass has completed.
    pub fn latest_state(&self) -> Option<Arc<SelectionState>> {
        self.latest.latest()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn attach_host_events(&self, host: &Arc<dyn HostRuntime>, events_tx: mpsc::Sender<Value>) {
        let caps = host.capabilities();
        let Some(strategy) = pick_attach(&caps) else {
            info!("host exposes no listener registration; relying on polling");
            return;
        };
        for event in SELECTION_EVENTS {
            if let Err(e) = host.attach_listener(strategy.style, event, events_tx.clone()) {
                // One failed attach never aborts the others.
                warn!(event, style = strategy.name, error = %e, "failed to attach selection listener");
            }
        }
    }

    /// Fetch the raw selection through the ranked getter strategies.
    /// A throwing host call is logged and treated as absence for this call.
    async fn fetch_raw(&self) -> Option<Value> {
        let host = { self.host.read().clone() }?;
        let strategy = pick_getter(&host.capabilities())?;
        let result = match strategy.getter {
            SelectionGetter::Multi => host.selected_elements().await,
            SelectionGetter::Single => host.selected_element().await,
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(getter = strategy.name, error = %e, "host selection call failed");
                None
            }
        }
    }

    /// Run one normalization pass against the host selection.
    async fn refresh(&self, only_on_change: bool) {
        if let Some(raw) = self.fetch_raw().await {
            let state = self.normalizer.normalize(&raw);
            self.publish(state, only_on_change);
        }
    }

    /// A change event fired. Events that carry a payload are normalized
    /// directly; bare notifications trigger a fetch.
    async fn on_host_event(&self, payload: Value) {
        if payload.is_null() {
            self.refresh(false).await;
        } else {
            let state = self.normalizer.normalize(&payload);
            self.publish(state, false);
        }
    }

    /// Replace the latest state and broadcast it to subscribers. With
    /// `only_on_change`, a state whose structural signature matches the last
    /// broadcast updates the cell but skips the redundant cross-frame send.
    fn publish(&self, state: SelectionState, only_on_change: bool) {
        let signature = selection_signature(&state);
        {
            let mut last = self.last_signature.lock();
            if only_on_change && last.as_deref() == Some(signature.as_str()) {
                self.latest.replace(state);
                return;
            }
            *last = Some(signature);
        }
        let snapshot = self.latest.replace(state);
        for entry in self.subscribers.iter() {
            self.send_to(*entry.key(), (*snapshot).clone());
        }
    }

    /// No usable host selection API: synthesize the dev mock in development,
    /// degrade to the empty state otherwise.
    fn publish_fallback(&self, reason: MockReason) {
        let state = if self.policy.environment().is_development() {
            info!(%reason, "synthesizing dev-mock selection");
            dev_mock_state(reason)
        } else {
            info!(%reason, "no usable host selection API; serving empty state");
            SelectionState::empty()
        };
        self.publish(state, false);
    }

    /// Send the latest state (or an empty one) to a single panel.
    fn answer(&self, window: WindowRef) {
        let state = self
            .latest
            .latest()
            .map(|s| (*s).clone())
            .unwrap_or_else(SelectionState::empty);
        self.send_to(window, state);
    }

    fn send_to(&self, window: WindowRef, state: SelectionState) {
        let Some(link) = self.links.get(&window) else {
            debug!(window = %window, "no channel for subscriber window");
            return;
        };
        if let Err(e) = link.post(BridgeMessage::selection(state)) {
            warn!(window = %window, error = %e, "failed to post selection to panel");
        }
    }

    /// Forward a panel resize to the host, stopping on the first success or
    /// at the attempt cap.
    async fn forward_resize(&self, width: u32, height: u32) {
        let host = { self.host.read().clone() };
        let Some(host) = host else {
            debug!("panel resize requested with no host runtime");
            return;
        };
        if !host.capabilities().resize {
            debug!("host exposes no resize method");
            return;
        }
        for attempt in 1..=self.settings.resize_max_attempts {
            match host.resize_panel(width, height).await {
                Ok(()) => {
                    debug!(attempt, width, height, "panel resize forwarded");
                    return;
                }
                Err(e) => warn!(attempt, error = %e, "panel resize attempt failed"),
            }
            if attempt < self.settings.resize_max_attempts {
                sleep(self.settings.resize_retry).await;
            }
        }
    }
}
