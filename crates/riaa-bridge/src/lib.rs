//! # RIAA Bridge
//!
//! The Host Bridge runs embedded in the design-tool surface. It discovers a
//! host selection API when one exists, subscribes to its change events,
//! polls as a fallback, normalizes raw selection payloads into the canonical
//! [`SelectionState`](riaa_protocols::SelectionState), and broadcasts that
//! state to registered panel subscribers over the cross-frame channel.
//!
//! Degradation is graceful at every step: a missing host runtime yields a
//! deterministic dev-mock state in development (an empty state otherwise),
//! a host without a selection getter does the same, and individual host API
//! failures are logged and treated as absence for that call only.

pub mod bridge;
pub mod devmock;
pub mod discovery;
pub mod dom;
pub mod host;
pub mod normalize;

pub use bridge::{BridgeSettings, HostBridge};
pub use devmock::{dev_mock_state, DEV_MOCK_DESKTOP_WIDTH, DEV_MOCK_MOBILE_WIDTH};
pub use discovery::{discover, GlobalScope, HostProbe, HOST_PROBES};
pub use dom::{is_media_tag, DomQuery, NodeId, MEDIA_SELECTOR, MEDIA_TAGS};
pub use host::{
    pick_attach, pick_getter, AttachStyle, HostCapabilities, HostRuntime, SelectionGetter,
    SELECTION_EVENTS,
};
pub use normalize::{extract_candidates, Normalizer, CANDIDATE_FIELDS, NODE_HANDLE_FIELDS};
