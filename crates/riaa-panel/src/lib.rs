//! # RIAA Panel
//!
//! The Panel Controller runs in the isolated embedded frame that users see.
//! On load it handshakes with the Host Bridge (subscribe + context-ready,
//! then a capped retry tick), consumes validated selection broadcasts, and
//! on explicit user action derives measured widths and asks the
//! recommendation backend for suggested upload dimensions.
//!
//! Display is a thin seam: the controller drives a [`PanelView`]
//! implementation and never touches rendering itself.

pub mod controller;
pub mod recommend;
pub mod view;
pub mod widths;

pub use controller::{PanelController, PanelPhase, PanelSettings};
pub use recommend::{
    ElementInfo, RecommendClient, RecommendationRequest, RecommendationResponse, RequestMetadata,
    WidthsBody,
};
pub use view::{LogView, PanelView};
pub use widths::{derive_widths, universal_fallback, AnalysisOutcome, MeasuredWidths};
