use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use orator_config::DispatchConfig;
use orator_engine::{EngineKind, EngineSet, ProcessExit, SpeechEngine, SpeechProcess};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::dedup::{DedupDecision, DedupKey, DedupTable};
use crate::error::WarmupError;
use crate::metrics::DispatchMetrics;
use crate::registry::{JobHandle, JobRegistry, RetiredJob};
use crate::request::ValidRequest;
use crate::{
    DispatchError, EngineStats, JobSnapshot, JobState, SpeakMode, SpeakOutcome, SpeakStatus, SpeechRequest, StopOutcome,
    TimingModel,
};

/// How long `stop_speech` and `shutdown` wait for killed processes to be reaped
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Process-wide dispatch state, only touched under the dispatcher lock
struct DispatchState {
    dedup: DedupTable,
    jobs: JobRegistry,
    timing: TimingModel,
}

struct Shared {
    config: DispatchConfig,
    engines: EngineSet,
    state: Mutex<DispatchState>,
    metrics: DispatchMetrics,
}

/// Sent by a job's task once the job is retired
struct Completion {
    retired: RetiredJob,
    detail: Option<String>,
}

/// Admits, runs and supervises speech jobs
///
/// Cheap to clone; clones share the same jobs, dedupe table and timing model.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig, engines: EngineSet) -> Self {
        let state = DispatchState {
            dedup: DedupTable::new(),
            jobs: JobRegistry::new(config.max_concurrent),
            timing: TimingModel::from_config(&config),
        };

        Self {
            shared: Arc::new(Shared {
                config,
                engines,
                state: Mutex::new(state),
                metrics: DispatchMetrics::new(),
            }),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.shared.config
    }

    pub fn engines(&self) -> &EngineSet {
        &self.shared.engines
    }

    /// Speak the request's text
    ///
    /// Rejections (invalid input, no engine, duplicate, busy) are errors. An
    /// admitted request always produces an outcome: immediately with status
    /// `started` in async mode, or once the job ends or the effective timeout
    /// elapses in sync mode.
    ///
    /// Once admitted, a job runs on its own task; dropping this future never
    /// leaves it unretired.
    pub async fn speak(&self, request: SpeechRequest) -> Result<SpeakOutcome, DispatchError> {
        let request = match request.validate(&self.shared.config) {
            Ok(request) => request,
            Err(e) => {
                self.shared.metrics.record_request(None, "invalid");
                return Err(e);
            }
        };

        let Some(engine) = self.shared.engines.resolve(request.engine) else {
            self.shared.metrics.record_request(None, "no_engine");
            return Err(DispatchError::NoEngineAvailable {
                requested: request.engine,
            });
        };

        let job = self.admit(engine.kind(), &request)?;

        tracing::info!(
            job_id = %job.id,
            engine = %job.engine,
            chars = request.text.chars().count(),
            speed = request.speed,
            wait = request.wait,
            "speech job admitted"
        );

        let mode = if request.wait { SpeakMode::Sync } else { SpeakMode::Async };
        let effective = self.shared.lock().timing.estimate(job.engine, request.timeout);
        let outcome = self.pending_outcome(&request, &job, mode, effective);
        let hard_timeout = request.hard_timeout;

        let (started_tx, started_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(watchdog(Arc::clone(&self.shared), job.clone(), hard_timeout));
        tokio::spawn(run(Arc::clone(&self.shared), engine, request, job.clone(), started_tx, done_tx));

        match mode {
            SpeakMode::Async => Ok(outcome),
            SpeakMode::Sync => self.wait(&job, effective, hard_timeout, started_rx, done_rx, outcome).await,
        }
    }

    /// Stop the most recent job, or every job when `all` is set
    ///
    /// Waits briefly for the stopped processes to exit.
    pub async fn stop_speech(&self, all: bool) -> StopOutcome {
        let signalled = {
            let mut state = self.shared.lock();
            if all {
                state.jobs.kill_all(JobState::Stopped)
            } else {
                state
                    .jobs
                    .most_recent()
                    .and_then(|id| state.jobs.kill(id, JobState::Stopped))
                    .into_iter()
                    .collect()
            }
        };

        let stopped_count = signalled.len();
        self.shared.metrics.record_stops(stopped_count);
        tracing::info!(all, stopped_count, "speech stop requested");

        if !settle(&signalled, STOP_GRACE).await {
            tracing::warn!("stopped speech processes did not exit in time");
        }

        StopOutcome { stopped_count }
    }

    /// Stop every job and wait for the processes to exit
    pub async fn shutdown(&self) -> usize {
        let signalled = self.shared.lock().jobs.kill_all(JobState::Stopped);

        if !signalled.is_empty() {
            tracing::info!(count = signalled.len(), "stopping active speech for shutdown");
        }
        if !settle(&signalled, STOP_GRACE).await {
            tracing::warn!("speech processes still running at shutdown");
        }

        signalled.len()
    }

    /// Number of live jobs
    pub fn active_count(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Live jobs ordered by admission
    pub fn list_active(&self) -> Vec<JobSnapshot> {
        self.shared.lock().jobs.list_active(Instant::now())
    }

    /// Timing statistics of an engine, `None` before its first completed job
    pub fn engine_stats(&self, engine: EngineKind) -> Option<EngineStats> {
        self.shared.lock().timing.stats(engine)
    }

    /// Timeout the next synchronous request on `engine` would get
    pub fn estimate_timeout(&self, engine: EngineKind, explicit: Option<Duration>) -> Duration {
        self.shared.lock().timing.estimate(engine, explicit)
    }

    /// Check dedupe and capacity under one lock, recording the key only on admission
    fn admit(&self, engine: EngineKind, request: &ValidRequest) -> Result<JobHandle, DispatchError> {
        let key = DedupKey::new(engine, &request.text);
        let now = Instant::now();
        let mut state = self.shared.lock();

        let decision = state.dedup.check(&key, request.dedupe, now);
        if let DedupDecision::Duplicate { retry_after } = decision {
            drop(state);
            tracing::debug!(engine = %engine, key = %key, "duplicate speech request suppressed");
            self.shared.metrics.record_request(Some(engine), "duplicate");
            return Err(DispatchError::DuplicateSuppressed { retry_after });
        }

        let admitted = state.jobs.admit(engine, request.hard_timeout, now);
        match admitted {
            Ok(job) => {
                state.dedup.record(key, request.dedupe, now);
                Ok(job)
            }
            Err(e) => {
                drop(state);
                tracing::debug!(engine = %engine, error = %e, "speech request rejected");
                self.shared.metrics.record_request(Some(engine), "busy");
                Err(e)
            }
        }
    }

    /// Wait for a synchronous job, giving up after the effective timeout
    ///
    /// The timeout starts once the process is running, so warmup does not
    /// count against it. When the effective timeout is not shorter than the
    /// hard timeout the watchdog bounds the wait instead.
    async fn wait(
        &self,
        job: &JobHandle,
        effective: Duration,
        hard_timeout: Duration,
        started: oneshot::Receiver<()>,
        mut done: oneshot::Receiver<Completion>,
        mut outcome: SpeakOutcome,
    ) -> Result<SpeakOutcome, DispatchError> {
        let completion = if effective < hard_timeout {
            // Closed without a value when the job ended before starting
            let _ = started.await;

            match tokio::time::timeout(effective, &mut done).await {
                Ok(completion) => completion,
                Err(_) => {
                    if self.shared.lock().jobs.mark_timed_out(job.id) {
                        tracing::info!(
                            job_id = %job.id,
                            timeout_seconds = effective.as_secs_f64(),
                            "speech still running after timeout, leaving it to the watchdog"
                        );
                        outcome.status = SpeakStatus::TimedOut;
                        return Ok(outcome);
                    }
                    // Retired or being killed while the timeout fired
                    done.await
                }
            }
        } else {
            done.await
        };

        let completion =
            completion.map_err(|_| DispatchError::Internal("speech job exited without reporting".to_string()))?;

        Ok(outcome.finish(completion))
    }

    fn pending_outcome(
        &self,
        request: &ValidRequest,
        job: &JobHandle,
        mode: SpeakMode,
        effective: Duration,
    ) -> SpeakOutcome {
        let config = &self.shared.config;

        let (applied, dynamic) = match mode {
            SpeakMode::Sync => (effective.min(request.hard_timeout), Some(effective.as_secs_f64())),
            SpeakMode::Async => (request.hard_timeout, None),
        };

        SpeakOutcome {
            mode,
            status: SpeakStatus::Started,
            job_id: job.id,
            engine: job.engine,
            speed: request.speed,
            applied_timeout: applied.as_secs_f64(),
            hard_timeout: request.hard_timeout.as_secs_f64(),
            dynamic_timeout: dynamic,
            timeout_seconds: request
                .timeout
                .map_or(config.default_timeout_seconds, |timeout| timeout.as_secs_f64()),
            dedupe_seconds: request.dedupe.as_secs_f64(),
            concurrency: config.max_concurrent,
            elapsed_seconds: None,
            detail: None,
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Remove a job and fold a completed run into the timing model
    fn retire(&self, job: &JobHandle, natural: JobState) -> Option<RetiredJob> {
        let retired = {
            let mut state = self.lock();
            let retired = state.jobs.retire(job.id, natural, Instant::now())?;
            if retired.state == JobState::Completed
                && let Some(run_time) = retired.run_time
            {
                state.timing.record(retired.engine, run_time.as_secs_f64());
            }
            retired
        };

        self.metrics.record_request(Some(retired.engine), retired.state.into());
        if retired.state == JobState::Completed
            && let Some(run_time) = retired.run_time
        {
            self.metrics.record_duration(retired.engine, run_time.as_secs_f64());
        }

        Some(retired)
    }

    /// Retire a job, log how it ended and tell a waiting caller
    fn report(
        &self,
        job: &JobHandle,
        natural: JobState,
        detail: Option<String>,
        done: oneshot::Sender<Completion>,
    ) {
        let Some(retired) = self.retire(job, natural) else {
            return;
        };

        match retired.state {
            JobState::Killed => tracing::warn!(
                job_id = %retired.id,
                engine = %retired.engine,
                "speech job killed after hard timeout"
            ),
            JobState::Failed => tracing::warn!(
                job_id = %retired.id,
                engine = %retired.engine,
                detail = detail.as_deref().unwrap_or_default(),
                "speech job failed"
            ),
            state => tracing::info!(
                job_id = %retired.id,
                engine = %retired.engine,
                %state,
                elapsed_seconds = retired.run_time.map(|run_time| run_time.as_secs_f64()),
                "speech job finished"
            ),
        }

        // Async callers are gone by now
        let _ = done.send(Completion { retired, detail });
    }
}

impl SpeakOutcome {
    fn finish(mut self, completion: Completion) -> Self {
        self.status = completion.retired.state.into();
        self.elapsed_seconds = completion.retired.run_time.map(|run_time| run_time.as_secs_f64());
        if self.status == SpeakStatus::Failed {
            self.detail = completion.detail;
        }
        self
    }
}

/// Drive an admitted job from warmup to retirement
async fn run(
    shared: Arc<Shared>,
    engine: Arc<dyn SpeechEngine>,
    request: ValidRequest,
    job: JobHandle,
    started: oneshot::Sender<()>,
    done: oneshot::Sender<Completion>,
) {
    if request.warmup {
        warmup(&shared.config, engine.as_ref(), request.speed, &job.kill).await;
    }

    // Stopped or killed before the process started
    if job.kill.is_cancelled() {
        shared.report(&job, JobState::Stopped, None, done);
        return;
    }

    let process = match engine.start(&request.text, request.speed) {
        Ok(process) => process,
        Err(e) => {
            tracing::warn!(job_id = %job.id, engine = %job.engine, error = %e, "failed to start speech engine");
            shared.report(&job, JobState::Failed, Some(e.to_string()), done);
            return;
        }
    };

    shared.lock().jobs.mark_running(job.id, Instant::now());
    let _ = started.send(());

    supervise(&shared, &job, process, done).await;
}

/// Own a running process until it exits or is killed, then retire its job
async fn supervise(
    shared: &Shared,
    job: &JobHandle,
    mut process: Box<dyn SpeechProcess>,
    done: oneshot::Sender<Completion>,
) {
    let exited = tokio::select! {
        exit = process.wait() => Some(exit),
        () = job.kill.cancelled() => None,
    };

    let result = match exited {
        Some(result) => result,
        None => process.kill().await.map(|()| ProcessExit::Failure {
            code: None,
            stderr: String::new(),
        }),
    };

    let (natural, detail) = match result {
        Ok(ProcessExit::Success) => (JobState::Completed, None),
        Ok(exit) => (JobState::Failed, exit.diagnostic()),
        Err(e) => (JobState::Failed, Some(e.to_string())),
    };

    shared.report(job, natural, detail, done);
}

/// Kill a job that outlives its hard timeout
async fn watchdog(shared: Arc<Shared>, job: JobHandle, hard_timeout: Duration) {
    tokio::select! {
        () = tokio::time::sleep_until(job.deadline) => {
            if shared.lock().jobs.kill(job.id, JobState::Killed).is_some() {
                tracing::warn!(
                    job_id = %job.id,
                    engine = %job.engine,
                    hard_timeout_seconds = hard_timeout.as_secs_f64(),
                    "hard timeout reached, killing speech job"
                );
            }
        }
        () = job.done.cancelled() => {}
    }
}

/// Speak the configured warmup utterance, logging and discarding any failure
async fn warmup(config: &DispatchConfig, engine: &dyn SpeechEngine, speed: f64, kill: &CancellationToken) {
    let limit = Duration::try_from_secs_f64(config.warmup_timeout_seconds).unwrap_or(Duration::MAX);

    best_effort(
        "warmup",
        engine.kind(),
        warm(engine, &config.warmup_text, speed, limit, kill),
    )
    .await;
}

/// Speak the warmup text, giving up at `limit` or when the job is killed
async fn warm(
    engine: &dyn SpeechEngine,
    text: &str,
    speed: f64,
    limit: Duration,
    kill: &CancellationToken,
) -> Result<(), WarmupError> {
    let mut process = engine.start(text, speed)?;

    let finished = tokio::select! {
        exit = process.wait_timeout(limit) => Some(exit?),
        () = kill.cancelled() => None,
    };

    match finished {
        Some(Some(exit)) if exit.is_success() => Ok(()),
        Some(Some(exit)) => Err(WarmupError::Exit(exit.diagnostic().unwrap_or_default())),
        Some(None) => {
            process.kill().await?;
            Err(WarmupError::TimedOut(limit))
        }
        None => {
            process.kill().await?;
            Ok(())
        }
    }
}

/// Run a step whose failure is logged and otherwise ignored
async fn best_effort<E: Display>(step: &'static str, engine: EngineKind, attempt: impl Future<Output = Result<(), E>>) {
    if let Err(e) = attempt.await {
        tracing::warn!(engine = %engine, error = %e, "{step} failed, continuing");
    }
}

/// Wait until every signal fires or `grace` elapses; `true` if all fired
async fn settle(signals: &[CancellationToken], grace: Duration) -> bool {
    let all_done = async {
        for done in signals {
            done.cancelled().await;
        }
    };
    tokio::time::timeout(grace, all_done).await.is_ok()
}
