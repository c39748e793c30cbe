pub mod command;

use std::time::Duration;

use async_trait::async_trait;

use crate::{EngineKind, error::Result};

/// A speech engine that can start one synthesis process per utterance
pub trait SpeechEngine: Send + Sync {
    /// Which engine this is
    fn kind(&self) -> EngineKind;

    /// Whether the engine can be started on this host right now
    fn is_available(&self) -> bool;

    /// Start speaking `text` at the given speed multiplier
    ///
    /// Returns as soon as the process is spawned.
    fn start(&self, text: &str, speed: f64) -> Result<Box<dyn SpeechProcess>>;
}

/// How a synthesis process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exit status zero
    Success,
    /// Non-zero exit or termination by signal
    Failure {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
}

impl ProcessExit {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Human-readable failure description
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::Failure { code, stderr } => {
                let stderr = stderr.trim();
                let status = code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
                Some(if stderr.is_empty() {
                    status
                } else {
                    format!("{status}: {stderr}")
                })
            }
        }
    }
}

/// Handle to a running synthesis process
#[async_trait]
pub trait SpeechProcess: Send {
    /// Wait until the process exits
    ///
    /// Cancel safe: dropping the future leaves the process running.
    async fn wait(&mut self) -> Result<ProcessExit>;

    /// Kill the process and reap it
    ///
    /// A process that already exited is left alone.
    async fn kill(&mut self) -> Result<()>;

    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Wait at most `timeout`, `None` if the process is still running
    async fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ProcessExit>> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(exit) => exit.map(Some),
            Err(_) => Ok(None),
        }
    }
}
