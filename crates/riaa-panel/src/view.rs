//! Display seam.
//!
//! Rendering is an external collaborator: the controller announces what to
//! show and an embedding-specific [`PanelView`] updates the actual surface.

use riaa_protocols::selection::SelectionState;
use tracing::info;

use crate::widths::AnalysisOutcome;

/// What the controller tells the display surface.
pub trait PanelView: Send + Sync {
    /// Show a short human-readable status line.
    fn show_status(&self, text: &str);

    /// Render the current selection (including the empty selection).
    fn render_selection(&self, state: &SelectionState);

    /// Show analysis results.
    fn show_results(&self, outcome: &AnalysisOutcome);

    /// Hide any previously shown results.
    fn clear_results(&self);
}

/// View that logs instead of rendering; used by the offline simulator.
#[derive(Debug, Default)]
pub struct LogView;

impl PanelView for LogView {
    fn show_status(&self, text: &str) {
        info!(status = text, "panel status");
    }

    fn render_selection(&self, state: &SelectionState) {
        let label = state
            .primary()
            .map(|p| {
                p.label
                    .clone()
                    .or_else(|| p.tag_name.clone())
                    .unwrap_or_else(|| "element".to_string())
            })
            .unwrap_or_else(|| "nothing selected".to_string());
        info!(selected = label, dev_mock = state.is_dev_mock(), "panel selection");
    }

    fn show_results(&self, outcome: &AnalysisOutcome) {
        info!(
            universal = outcome.universal_upload_size,
            fallback = outcome.fallback_used,
            "panel results"
        );
    }

    fn clear_results(&self) {
        info!("panel results cleared");
    }
}
