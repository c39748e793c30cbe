use std::fmt::Write as _;

use orator_engine::EngineKind;
use serde::Serialize;

use crate::{JobId, JobState};

/// Whether the caller waited for the speech to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpeakMode {
    Sync,
    Async,
}

/// How a dispatched request ended from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpeakStatus {
    /// Running in the background
    Started,
    Completed,
    Failed,
    TimedOut,
    Killed,
    Stopped,
}

impl From<JobState> for SpeakStatus {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending | JobState::Running => Self::Started,
            JobState::Completed => Self::Completed,
            JobState::Failed => Self::Failed,
            JobState::TimedOut => Self::TimedOut,
            JobState::Killed => Self::Killed,
            JobState::Stopped => Self::Stopped,
        }
    }
}

/// Result of a dispatched speech request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakOutcome {
    pub mode: SpeakMode,
    pub status: SpeakStatus,
    pub job_id: JobId,
    pub engine: EngineKind,
    pub speed: f64,
    /// Timeout the caller was bounded by, in seconds
    pub applied_timeout: f64,
    /// Watchdog limit, in seconds
    pub hard_timeout: f64,
    /// Adaptive estimate, synchronous requests only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_timeout: Option<f64>,
    /// Timeout the client asked for, or the configured default
    pub timeout_seconds: f64,
    pub dedupe_seconds: f64,
    /// Concurrency limit
    pub concurrency: usize,
    /// Process run time, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    /// Engine diagnostic for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SpeakOutcome {
    /// One-line human-readable description of the outcome
    pub fn summary(&self) -> String {
        let head = match self.status {
            SpeakStatus::Started => "Speech started".to_string(),
            SpeakStatus::Completed => "Spoken".to_string(),
            SpeakStatus::TimedOut => format!("Speech timed out after {}s", seconds(self.applied_timeout)),
            SpeakStatus::Killed => format!("Speech killed after hard timeout of {}s", seconds(self.hard_timeout)),
            SpeakStatus::Stopped => "Speech stopped".to_string(),
            SpeakStatus::Failed => match self.detail {
                Some(ref detail) => format!("Speech failed: {detail}"),
                None => "Speech failed".to_string(),
            },
        };

        format!("{head} {}", self.status_line())
    }

    /// Parameter summary in parentheses
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "(engine={}, mode={}, speed={}x, hard_timeout={}s, dedupe={}s, concurrency={}",
            self.engine,
            self.mode,
            seconds(self.speed),
            seconds(self.hard_timeout),
            seconds(self.dedupe_seconds),
            self.concurrency,
        );

        // Writing to a String is infallible
        match self.mode {
            SpeakMode::Sync => {
                let _ = write!(line, ", timeout_seconds={}s", seconds(self.timeout_seconds));
                if let Some(dynamic) = self.dynamic_timeout {
                    let _ = write!(line, ", dynamic_timeout={}s", seconds(dynamic));
                }
                let _ = write!(line, ", timeout_used={}s", seconds(self.applied_timeout));
            }
            SpeakMode::Async => {
                let _ = write!(line, ", timeout_seconds={}s(ignored)", seconds(self.timeout_seconds));
            }
        }

        line.push(')');
        line
    }
}

/// Result of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    pub stopped_count: usize,
}

impl StopOutcome {
    pub fn summary(&self) -> String {
        if self.stopped_count == 0 {
            "No active speech.".to_string()
        } else {
            format!("Stopped speech ({}).", self.stopped_count)
        }
    }
}

/// Seconds rounded to milliseconds, without a trailing `.0`
fn seconds(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{rounded}")
}
