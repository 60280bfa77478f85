//! Recording panel view.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use riaa_panel::view::PanelView;
use riaa_panel::widths::AnalysisOutcome;
use riaa_protocols::selection::SelectionState;

/// View that records every display instruction for later assertions.
#[derive(Debug, Default)]
pub struct RecordingView {
    statuses: Mutex<Vec<String>>,
    renders: Mutex<Vec<SelectionState>>,
    results: Mutex<Vec<AnalysisOutcome>>,
    clears: AtomicU32,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    pub fn renders(&self) -> Vec<SelectionState> {
        self.renders.lock().clone()
    }

    pub fn results(&self) -> Vec<AnalysisOutcome> {
        self.results.lock().clone()
    }

    pub fn clear_count(&self) -> u32 {
        self.clears.load(Ordering::SeqCst)
    }

    /// The most recent status line shown.
    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().last().cloned()
    }
}

impl PanelView for RecordingView {
    fn show_status(&self, text: &str) {
        self.statuses.lock().push(text.to_string());
    }

    fn render_selection(&self, state: &SelectionState) {
        self.renders.lock().push(state.clone());
    }

    fn show_results(&self, outcome: &AnalysisOutcome) {
        self.results.lock().push(outcome.clone());
    }

    fn clear_results(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
