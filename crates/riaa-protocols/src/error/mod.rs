//! Error taxonomy for the RIAA bridge protocol.
//!
//! One enum per concern. Trust violations are deliberately not errors:
//! untrusted envelopes are dropped silently and never surfaced.

mod channel;
mod host;
mod panel;
mod recommend;

pub use channel::ChannelError;
pub use host::HostApiError;
pub use panel::PanelError;
pub use recommend::RecommendError;
