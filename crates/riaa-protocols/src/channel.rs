//! Abstract cross-context frame channel.
//!
//! Panel and bridge share no memory; every interaction crosses a
//! fire-and-forget message channel. [`FrameChannel`] is the seam between the
//! protocol logic and the real embedding: production binds it to the host
//! messaging primitive, tests bind it to an in-memory linked pair that can
//! inject arbitrary envelopes.
//!
//! Delivery guarantees are deliberately weak: no acknowledgment, no ordering
//! beyond per-channel arrival order, and messages may be duplicated or
//! dropped. The protocol tolerates this through idempotent state replacement.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::message::BridgeMessage;
use crate::origin::Origin;

/// Opaque identity of one browsing context (a window/frame).
///
/// Trust pinning distinguishes windows that share an origin, so the sender
/// window travels with every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRef(Uuid);

impl WindowRef {
    /// Mint a fresh window identity.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WindowRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound message with its transport-level sender identity.
///
/// `origin` and `window` are stamped by the transport, not the sender
/// payload, mirroring how the embedding exposes the event origin and source
/// window alongside the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Origin of the sending browsing context.
    pub origin: Origin,
    /// The specific sending window.
    pub window: WindowRef,
    /// When the transport observed the message.
    pub received_at: chrono::DateTime<chrono::Utc>,
    /// The decoded message.
    pub message: BridgeMessage,
}

impl Envelope {
    pub fn new(origin: Origin, window: WindowRef, message: BridgeMessage) -> Self {
        Self {
            origin,
            window,
            received_at: chrono::Utc::now(),
            message,
        }
    }
}

/// A bidirectional message channel to one peer browsing context.
///
/// `post` is fire-and-forget: success means the message was handed to the
/// transport, not that the peer saw it. `inbound` yields envelopes from the
/// peer (and, in tests, injected ones) in arrival order.
pub trait FrameChannel: Send + Sync {
    /// Send a message to the peer context.
    fn post(&self, message: BridgeMessage) -> Result<(), ChannelError>;

    /// Subscribe to inbound envelopes from the peer context.
    fn inbound(&self) -> broadcast::Receiver<Envelope>;

    /// Origin of the local context this endpoint belongs to.
    fn local_origin(&self) -> &Origin;

    /// Window identity of the local context.
    fn local_window(&self) -> WindowRef;
}
