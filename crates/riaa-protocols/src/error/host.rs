//! Host runtime API errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostApiError {
    /// No host runtime was found on the global scope.
    #[error("Host runtime unavailable")]
    Unavailable,

    /// The runtime exists but lacks the probed capability.
    #[error("Host capability missing: {0}")]
    MissingCapability(&'static str),

    /// An individual host API call threw. Treated as absence for that call
    /// only, never fatal to the bridge.
    #[error("Host call failed: {0}")]
    CallFailed(String),

    #[error("Host call timed out after {0}ms")]
    Timeout(u64),
}
