use std::collections::HashMap;
use std::time::Duration;

use orator_engine::EngineKind;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::DispatchError;

/// Unique identifier of a speech job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a speech job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    /// Admitted, process not started yet
    Pending,
    /// Process running
    Running,
    /// Process exited cleanly
    Completed,
    /// Process could not start or exited unsuccessfully
    Failed,
    /// A synchronous caller stopped waiting; the process may still be running
    TimedOut,
    /// Terminated by the hard-timeout watchdog
    Killed,
    /// Terminated on request
    Stopped,
}

impl JobState {
    /// States that survive the process exiting
    const fn is_sticky(self) -> bool {
        matches!(self, Self::TimedOut | Self::Killed | Self::Stopped)
    }

    /// A kill has been requested
    const fn is_killing(self) -> bool {
        matches!(self, Self::Killed | Self::Stopped)
    }
}

/// Signals shared between a job's caller, supervisor and watchdog
#[derive(Debug, Clone)]
pub(crate) struct JobHandle {
    pub id: JobId,
    pub engine: EngineKind,
    pub deadline: Instant,
    /// Cancelled to terminate the process
    pub kill: CancellationToken,
    /// Cancelled once the job is retired
    pub done: CancellationToken,
}

#[derive(Debug)]
struct Job {
    seq: u64,
    engine: EngineKind,
    admitted_at: Instant,
    deadline: Instant,
    started_at: Option<Instant>,
    state: JobState,
    kill: CancellationToken,
    done: CancellationToken,
}

/// Point-in-time view of a live job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub engine: EngineKind,
    pub state: JobState,
    /// Time since admission
    pub age: Duration,
    /// Time left before the watchdog kills the job
    pub remaining: Duration,
}

/// A job removed from the registry
#[derive(Debug, Clone)]
pub(crate) struct RetiredJob {
    pub id: JobId,
    pub engine: EngineKind,
    pub state: JobState,
    /// Wall-clock time the process ran, if it was started
    pub run_time: Option<Duration>,
}

/// Every live job, bounded by the concurrency limit
#[derive(Debug)]
pub(crate) struct JobRegistry {
    jobs: HashMap<JobId, Job>,
    limit: usize,
    next_seq: u64,
}

impl JobRegistry {
    pub fn new(limit: usize) -> Self {
        Self {
            jobs: HashMap::new(),
            limit,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Register a new pending job, or reject when the limit is reached
    pub fn admit(&mut self, engine: EngineKind, hard_timeout: Duration, now: Instant) -> Result<JobHandle, DispatchError> {
        if self.jobs.len() >= self.limit {
            return Err(DispatchError::Busy {
                active: self.jobs.len(),
                limit: self.limit,
            });
        }

        let id = JobId::new();
        let deadline = now.checked_add(hard_timeout).unwrap_or_else(far_future);
        let job = Job {
            seq: self.next_seq,
            engine,
            admitted_at: now,
            deadline,
            started_at: None,
            state: JobState::Pending,
            kill: CancellationToken::new(),
            done: CancellationToken::new(),
        };
        self.next_seq += 1;

        let handle = JobHandle {
            id,
            engine,
            deadline,
            kill: job.kill.clone(),
            done: job.done.clone(),
        };
        self.jobs.insert(id, job);

        Ok(handle)
    }

    /// Record that the process started
    pub fn mark_running(&mut self, id: JobId, now: Instant) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.started_at = Some(now);
            if job.state == JobState::Pending {
                job.state = JobState::Running;
            }
        }
    }

    /// Mark a running job as timed out for its synchronous caller
    ///
    /// Returns `false` when the job is no longer registered or is already
    /// being killed, in which case its final state is about to be reported.
    pub fn mark_timed_out(&mut self, id: JobId) -> bool {
        let Some(job) = self.jobs.get_mut(&id) else {
            return false;
        };
        if job.state.is_killing() {
            return false;
        }

        job.state = JobState::TimedOut;
        true
    }

    /// Request termination of a job
    ///
    /// Returns the job's completion signal when this call signalled the kill;
    /// a retired job or one already being killed is left alone.
    pub fn kill(&mut self, id: JobId, reason: JobState) -> Option<CancellationToken> {
        debug_assert!(reason.is_killing());

        let job = self.jobs.get_mut(&id)?;
        if job.state.is_killing() {
            return None;
        }

        job.state = reason;
        job.kill.cancel();
        Some(job.done.clone())
    }

    /// Request termination of every live job, returning the completion
    /// signals of those signalled
    pub fn kill_all(&mut self, reason: JobState) -> Vec<CancellationToken> {
        let ids: Vec<_> = self.jobs.keys().copied().collect();
        ids.into_iter().filter_map(|id| self.kill(id, reason)).collect()
    }

    /// Most recently admitted job that is not already being killed
    pub fn most_recent(&self) -> Option<JobId> {
        self.jobs
            .iter()
            .filter(|(_, job)| !job.state.is_killing())
            .max_by_key(|(_, job)| job.seq)
            .map(|(&id, _)| id)
    }

    /// Remove a job, resolving its final state
    ///
    /// A timed out, killed or stopped job keeps that state; otherwise `natural` applies.
    pub fn retire(&mut self, id: JobId, natural: JobState, now: Instant) -> Option<RetiredJob> {
        let job = self.jobs.remove(&id)?;
        job.done.cancel();

        let state = if job.state.is_sticky() { job.state } else { natural };

        Some(RetiredJob {
            id,
            engine: job.engine,
            state,
            run_time: job.started_at.map(|started| now.saturating_duration_since(started)),
        })
    }

    /// Live jobs ordered by admission
    pub fn list_active(&self, now: Instant) -> Vec<JobSnapshot> {
        let mut jobs: Vec<_> = self.jobs.iter().collect();
        jobs.sort_by_key(|(_, job)| job.seq);

        jobs.into_iter()
            .map(|(&id, job)| JobSnapshot {
                id,
                engine: job.engine,
                state: job.state,
                age: now.saturating_duration_since(job.admitted_at),
                remaining: job.deadline.saturating_duration_since(now),
            })
            .collect()
    }
}

/// Deadline used when `now + hard_timeout` overflows
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}
