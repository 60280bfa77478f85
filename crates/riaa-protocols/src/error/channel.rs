//! Frame channel errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Malformed message: {0}")]
    Malformed(String),
}
