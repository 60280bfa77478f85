//! Panel controller errors.

use thiserror::Error;

use super::{ChannelError, RecommendError};

#[derive(Debug, Error)]
pub enum PanelError {
    /// Analysis was triggered outside `SelectionReady`.
    #[error("No analyzable selection in phase {0}")]
    NotReady(&'static str),

    /// The selected element has no derivable width in either the
    /// host-supplied or the locally computed source.
    #[error("Selected element has no measurable width")]
    NoMeasurableWidth,

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
