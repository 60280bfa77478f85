//! # RIAA Protocols
//!
//! Protocol definitions shared by the Host Bridge and the Panel Controller.
//! Contains the canonical selection model, the cross-frame message
//! vocabulary, origin/trust primitives, and the abstract frame channel -
//! no component implementations.
//!
//! ## Core Types
//!
//! - [`SelectionState`] / [`SelectionDescriptor`] - canonical selection model
//! - [`BridgeMessage`] / [`Envelope`] - cross-frame message vocabulary
//! - [`Origin`] / [`OriginPolicy`] / [`TrustCell`] - origin validation and
//!   first-contact pinning
//! - [`FrameChannel`] - abstract cross-context message channel
//! - [`StateCell`] - single-writer latest-state cell

pub mod channel;
pub mod error;
pub mod message;
pub mod origin;
pub mod selection;
pub mod shutdown;
pub mod state_cell;

// Re-export core types
pub use channel::{Envelope, FrameChannel, WindowRef};
pub use message::{BridgeMessage, LegacyElement, SelectionBroadcast};
pub use origin::{Environment, Origin, OriginPolicy, TrustAnchor, TrustCell, TrustDecision};
pub use selection::{
    round_px, selection_signature, Breakpoint, BreakpointWidths, MockReason, SelectionDescriptor,
    SelectionState,
};
pub use shutdown::ShutdownSignal;
pub use state_cell::StateCell;
pub use error::{ChannelError, HostApiError, PanelError, RecommendError};
