//! Width derivation and the universal-size fallback policy.

use serde::{Deserialize, Serialize};

use riaa_protocols::selection::SelectionDescriptor;

/// The two measured widths analysis is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredWidths {
    pub desktop: u32,
    pub mobile: u32,
}

impl MeasuredWidths {
    /// The larger of the two widths.
    pub fn widest(&self) -> u32 {
        self.desktop.max(self.mobile)
    }
}

/// Derive desktop/mobile measured widths from a descriptor.
///
/// Host-supplied widths take priority over locally computed ones; within a
/// source, a missing slot falls back to the other slot. Returns `None` when
/// neither source carries any width - the "cannot measure" signal.
pub fn derive_widths(descriptor: &SelectionDescriptor) -> Option<MeasuredWidths> {
    let host = &descriptor.widths;
    let computed = &descriptor.computed_widths;

    let desktop = host
        .desktop
        .or(host.mobile)
        .or(computed.desktop)
        .or(computed.mobile)?;
    let mobile = host
        .mobile
        .or(host.desktop)
        .or(computed.mobile)
        .or(computed.desktop)?;
    Some(MeasuredWidths { desktop, mobile })
}

/// Deterministic universal-upload-size fallback: twice the larger measured
/// width. Applied whenever the backend omits a value or is unreachable.
pub fn universal_fallback(widths: &MeasuredWidths) -> u32 {
    widths.widest().saturating_mul(2)
}

/// What the panel renders after a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Recommended upload width in pixels.
    pub universal_upload_size: u32,
    pub desktop_render_size: Option<u32>,
    pub mobile_render_size: Option<u32>,
    pub explanation: Option<String>,
    /// True when the universal size came from the fallback policy rather
    /// than the backend.
    pub fallback_used: bool,
}
