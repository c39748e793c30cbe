use std::time::Duration;

use orator_engine::{EngineChoice, EngineError};
use thiserror::Error;

/// Reasons a speech request is not dispatched
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request failed validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No engine matching the request can be started
    #[error("no available speech engine for {requested} (say/swift/espeak)")]
    NoEngineAvailable { requested: EngineChoice },

    /// The same text was sent to the same engine within the dedupe window
    #[error("duplicate speech request suppressed, retry after {:.1}s", .retry_after.as_secs_f64())]
    DuplicateSuppressed { retry_after: Duration },

    /// The concurrency limit is reached
    #[error("speech busy ({active} of {limit} jobs running)")]
    Busy { active: usize, limit: usize },

    /// Dispatcher bookkeeping broke down
    #[error("internal dispatch error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Whether this is an ordinary rejection rather than a server fault
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

/// Why a warmup utterance did not finish cleanly
#[derive(Debug, Error)]
pub(crate) enum WarmupError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("engine exited unsuccessfully: {0}")]
    Exit(String),

    #[error("did not finish within {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}
