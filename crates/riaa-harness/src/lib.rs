//! # RIAA Harness
//!
//! Test and simulation doubles for the bridge protocol: an in-memory
//! [`LinkedChannel`] pair standing in for the cross-frame messaging
//! primitive (with raw envelope injection for trust tests), a
//! [`ScriptedHost`] with configurable capability gaps and failure
//! injection, a [`FakeDom`], and a [`RecordingView`].
//!
//! Everything here is also used by the offline simulator in the `riaa`
//! binary, so the full pipeline runs without a real embedding host.

pub mod fake_dom;
pub mod fake_host;
pub mod link;
pub mod view;

pub use fake_dom::{FakeDom, FakeNode};
pub use fake_host::{ScriptedHost, ScriptedScope};
pub use link::{ContextSpec, LinkedChannel};
pub use view::RecordingView;
