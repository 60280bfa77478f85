//! Recommendation backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Recommendation request failed: {0}")]
    Network(String),

    /// Any non-2xx response, uniformly.
    #[error("Recommendation backend returned status {status}")]
    Status { status: u16 },

    #[error("Recommendation response unreadable: {0}")]
    InvalidResponse(String),
}
