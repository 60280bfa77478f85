//! In-memory linked frame channels.

use std::sync::Arc;

use tokio::sync::broadcast;

use riaa_protocols::channel::{Envelope, FrameChannel, WindowRef};
use riaa_protocols::error::ChannelError;
use riaa_protocols::message::BridgeMessage;
use riaa_protocols::origin::Origin;

/// Identity of one simulated browsing context.
#[derive(Debug, Clone)]
pub struct ContextSpec {
    pub origin: Origin,
    pub window: WindowRef,
}

impl ContextSpec {
    /// A context with a fresh window identity.
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            window: WindowRef::new(),
        }
    }
}

/// One endpoint of an in-memory cross-context channel pair.
///
/// Posting stamps the local context identity onto an envelope and hands it
/// to the peer's inbound stream. Like the real messaging primitive this is
/// fire-and-forget: a peer that has not subscribed yet simply misses the
/// message. [`LinkedChannel::inject`] pushes an arbitrary envelope - any
/// origin, any window - into this endpoint's own inbound stream, which is
/// how trust tests impersonate foreign frames.
pub struct LinkedChannel {
    local: ContextSpec,
    to_peer: broadcast::Sender<Envelope>,
    from_peer: broadcast::Sender<Envelope>,
}

impl LinkedChannel {
    /// Create a connected pair of endpoints.
    pub fn pair(a: ContextSpec, b: ContextSpec) -> (Arc<Self>, Arc<Self>) {
        let (a_to_b, _) = broadcast::channel(64);
        let (b_to_a, _) = broadcast::channel(64);
        let endpoint_a = Arc::new(Self {
            local: a,
            to_peer: a_to_b.clone(),
            from_peer: b_to_a.clone(),
        });
        let endpoint_b = Arc::new(Self {
            local: b,
            to_peer: b_to_a,
            from_peer: a_to_b,
        });
        (endpoint_a, endpoint_b)
    }

    pub fn local(&self) -> &ContextSpec {
        &self.local
    }

    /// Deliver a raw envelope to this endpoint's inbound stream, as if a
    /// frame with the envelope's identity had posted it.
    pub fn inject(&self, envelope: Envelope) {
        let _ = self.from_peer.send(envelope);
    }
}

impl FrameChannel for LinkedChannel {
    fn post(&self, message: BridgeMessage) -> Result<(), ChannelError> {
        let envelope = Envelope::new(self.local.origin.clone(), self.local.window, message);
        // No receiver is a dropped message, not an error.
        let _ = self.to_peer.send(envelope);
        Ok(())
    }

    fn inbound(&self) -> broadcast::Receiver<Envelope> {
        self.from_peer.subscribe()
    }

    fn local_origin(&self) -> &Origin {
        &self.local.origin
    }

    fn local_window(&self) -> WindowRef {
        self.local.window
    }
}
