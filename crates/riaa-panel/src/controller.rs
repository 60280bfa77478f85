//! The Panel Controller state machine.
//!
//! Phases: `Uninitialized -> Handshaking -> {SelectionEmpty, SelectionReady}
//! -> Analyzing -> {ResultsShown, Error}`. The handshake keeps re-sending
//! subscribe/request on a capped tick until the first validated selection
//! broadcast arrives; selection application is idempotent; analysis is an
//! explicit user action and never retries on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use riaa_protocols::channel::{Envelope, FrameChannel};
use riaa_protocols::error::{ChannelError, PanelError};
use riaa_protocols::message::BridgeMessage;
use riaa_protocols::origin::{OriginPolicy, TrustCell};
use riaa_protocols::selection::SelectionState;
use riaa_protocols::shutdown::ShutdownSignal;
use riaa_protocols::state_cell::StateCell;

use crate::recommend::{RecommendClient, RecommendationRequest, RecommendationResponse};
use crate::view::PanelView;
use crate::widths::{derive_widths, universal_fallback, AnalysisOutcome, MeasuredWidths};

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

/// Panel display phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Uninitialized,
    Handshaking,
    SelectionEmpty,
    SelectionReady,
    Analyzing,
    ResultsShown,
    Error,
}

impl PanelPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelPhase::Uninitialized => "uninitialized",
            PanelPhase::Handshaking => "handshaking",
            PanelPhase::SelectionEmpty => "selection-empty",
            PanelPhase::SelectionReady => "selection-ready",
            PanelPhase::Analyzing => "analyzing",
            PanelPhase::ResultsShown => "results-shown",
            PanelPhase::Error => "error",
        }
    }

    /// Phases from which the user can trigger analysis: a primary element
    /// is present and no request is already in flight.
    fn analysis_actionable(&self) -> bool {
        matches!(
            self,
            PanelPhase::SelectionReady | PanelPhase::ResultsShown | PanelPhase::Error
        )
    }
}

/// Runtime tunables for the panel. Defaults are the protocol constants.
#[derive(Debug, Clone)]
pub struct PanelSettings {
    /// Handshake retry interval.
    pub handshake_interval: Duration,
    /// Handshake retry attempt cap.
    pub handshake_max_attempts: u32,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            handshake_interval: Duration::from_millis(1000),
            handshake_max_attempts: 30,
        }
    }
}

/// The Panel Controller.
pub struct PanelController {
    settings: PanelSettings,
    policy: OriginPolicy,
    trust: TrustCell,
    channel: Arc<dyn FrameChannel>,
    view: Arc<dyn PanelView>,
    client: RecommendClient,
    /// Most recent validated selection; kept to re-render without refetch.
    current: StateCell<SelectionState>,
    phase_tx: watch::Sender<PanelPhase>,
}

impl PanelController {
    pub fn new(
        settings: PanelSettings,
        policy: OriginPolicy,
        channel: Arc<dyn FrameChannel>,
        view: Arc<dyn PanelView>,
        client: RecommendClient,
    ) -> Self {
        let (phase_tx, _) = watch::channel(PanelPhase::Uninitialized);
        Self {
            settings,
            policy,
            trust: TrustCell::new(),
            channel,
            view,
            client,
            current: StateCell::new(),
            phase_tx,
        }
    }

    pub fn phase(&self) -> PanelPhase {
        *self.phase_tx.borrow()
    }

    /// Watch phase transitions; used by embeddings and tests.
    pub fn watch_phase(&self) -> watch::Receiver<PanelPhase> {
        self.phase_tx.subscribe()
    }

    /// Most recent validated selection snapshot.
    pub fn current_state(&self) -> Option<Arc<SelectionState>> {
        self.current.latest()
    }

    /// Run the controller until shutdown: handshake, then consume
    /// broadcasts.
    pub async fn run(&self, shutdown: ShutdownSignal) {
        let mut shutdown_rx = shutdown.subscribe();
        let mut inbound = self.channel.inbound();

        self.set_phase(PanelPhase::Handshaking);
        self.view.show_status("Connecting to the design surface...");
        self.send_or_log(BridgeMessage::Subscribe);
        self.send_or_log(BridgeMessage::ContextReady);

        let mut retry = tokio::time::interval(self.settings.handshake_interval);
        retry.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick fires immediately; the sends above cover it.
        retry.tick().await;
        let mut attempts: u32 = 0;

        info!("panel controller running");
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                received = inbound.recv() => match received {
                    Ok(envelope) => self.on_envelope(envelope),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "panel inbound lagged; envelopes dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = retry.tick(), if self.phase() == PanelPhase::Handshaking
                        && attempts < self.settings.handshake_max_attempts => {
                    attempts += 1;
                    debug!(attempts, "re-sending handshake");
                    self.send_or_log(BridgeMessage::Subscribe);
                    self.send_or_log(BridgeMessage::Request);
                    if attempts >= self.settings.handshake_max_attempts {
                        warn!(attempts, "handshake attempts exhausted");
                        self.view
                            .show_status("Could not reach the design surface.");
                    }
                }
            }
        }
        info!("panel controller stopped");
    }

    /// Validate and consume one inbound envelope. The panel acts only on
    /// selection broadcasts; anything untrusted is dropped silently.
    pub fn on_envelope(&self, envelope: Envelope) {
        let decision = self
            .trust
            .admit(&self.policy, &envelope.origin, envelope.window);
        if !decision.is_trusted() {
            debug!(
                origin = %envelope.origin,
                window = %envelope.window,
                ?decision,
                "dropping untrusted envelope"
            );
            return;
        }
        match envelope.message {
            BridgeMessage::ElementSelected(broadcast) => {
                self.apply_selection(broadcast.into_state());
            }
            other => debug!(kind = other.kind(), "ignoring non-selection message"),
        }
    }

    /// Apply a validated selection state. Re-applying an identical state is
    /// a no-op beyond re-render; a changed state replaces the current one
    /// wholesale and recomputes the display phase.
    pub fn apply_selection(&self, state: SelectionState) {
        let unchanged = self
            .current
            .latest()
            .is_some_and(|current| *current == state);

        self.current.replace(state.clone());
        self.view.render_selection(&state);
        if unchanged {
            return;
        }

        if self.phase() == PanelPhase::ResultsShown {
            // Results computed for a different selection would mislead.
            self.view.clear_results();
        }

        match state.primary() {
            Some(primary) => {
                let label = primary
                    .label
                    .clone()
                    .or_else(|| primary.tag_name.clone())
                    .unwrap_or_else(|| "element".to_string());
                self.view
                    .show_status(&format!("Ready to analyze \u{201c}{label}\u{201d}."));
                self.set_phase(PanelPhase::SelectionReady);
            }
            None => {
                self.view.show_status("Select an element to analyze.");
                self.set_phase(PanelPhase::SelectionEmpty);
            }
        }
    }

    /// User-triggered analysis.
    ///
    /// Fails fast with a blocking status - and without touching the network
    /// - when the selection has no derivable width; the display phase then
    /// stays where it was. Backend failures clear results and enter
    /// [`PanelPhase::Error`]; the user must re-trigger.
    pub async fn analyze(&self) -> Result<AnalysisOutcome, PanelError> {
        let phase = self.phase();
        if !phase.analysis_actionable() {
            return Err(PanelError::NotReady(phase.as_str()));
        }
        let Some(state) = self.current.latest() else {
            return Err(PanelError::NotReady(phase.as_str()));
        };
        let Some(primary) = state.primary() else {
            return Err(PanelError::NotReady(phase.as_str()));
        };
        let Some(widths) = derive_widths(primary) else {
            self.view.show_status(
                "This element has no measurable width. Select an element with a rendered image.",
            );
            return Err(PanelError::NoMeasurableWidth);
        };

        self.set_phase(PanelPhase::Analyzing);
        self.view.show_status("Analyzing...");
        let request = RecommendationRequest::for_descriptor(primary, widths);
        match self.client.recommend(&request).await {
            Ok(response) => {
                let outcome = resolve_outcome(response, &widths);
                self.set_phase(PanelPhase::ResultsShown);
                self.view.show_results(&outcome);
                self.view.show_status("Analysis complete.");
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "recommendation request failed");
                self.view.clear_results();
                self.set_phase(PanelPhase::Error);
                self.view
                    .show_status("Analysis failed. Check your connection and try again.");
                Err(e.into())
            }
        }
    }

    /// Ask the host to resize the panel surface.
    pub fn request_resize(&self, width: u32, height: u32) -> Result<(), ChannelError> {
        self.channel.post(BridgeMessage::PanelResize { width, height })
    }

    fn set_phase(&self, next: PanelPhase) {
        let previous = *self.phase_tx.borrow();
        if previous != next {
            debug!(from = previous.as_str(), to = next.as_str(), "panel phase");
        }
        self.phase_tx.send_replace(next);
    }

    fn send_or_log(&self, message: BridgeMessage) {
        if let Err(e) = self.channel.post(message) {
            warn!(error = %e, "failed to post to host bridge");
        }
    }
}

/// Fill absent backend fields per the documented fallback policy.
fn resolve_outcome(
    response: RecommendationResponse,
    widths: &MeasuredWidths,
) -> AnalysisOutcome {
    let fallback_used = response.universal_upload_size.is_none();
    AnalysisOutcome {
        universal_upload_size: response
            .universal_upload_size
            .unwrap_or_else(|| universal_fallback(widths)),
        desktop_render_size: response.desktop_render_size,
        mobile_render_size: response.mobile_render_size,
        explanation: response.explanation,
        fallback_used,
    }
}
