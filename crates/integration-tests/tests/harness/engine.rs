//! Scripted speech engine for integration tests
//!
//! Processes "speak" by sleeping in tokio time, so tests run under
//! `start_paused` without real audio or child processes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use orator_engine::{EngineKind, ProcessExit, SpeechEngine, SpeechProcess};
use tokio::time::Instant;

/// Speech engine whose runs take a configurable time and outcome
#[derive(Clone)]
pub struct MockEngine {
    kind: EngineKind,
    state: Arc<MockEngineState>,
}

struct MockEngineState {
    available: AtomicBool,
    succeed: AtomicBool,
    run_for: Mutex<Duration>,
    starts: AtomicUsize,
    kills: AtomicUsize,
    /// Text of every started utterance, in order
    spoken: Mutex<Vec<String>>,
}

impl MockEngine {
    /// Engine whose runs succeed after `run_for`
    pub fn new(kind: EngineKind, run_for: Duration) -> Self {
        Self {
            kind,
            state: Arc::new(MockEngineState {
                available: AtomicBool::new(true),
                succeed: AtomicBool::new(true),
                run_for: Mutex::new(run_for),
                starts: AtomicUsize::new(0),
                kills: AtomicUsize::new(0),
                spoken: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Engine whose runs exit with an error after `run_for`
    pub fn failing(kind: EngineKind, run_for: Duration) -> Self {
        let engine = Self::new(kind, run_for);
        engine.state.succeed.store(false, Ordering::SeqCst);
        engine
    }

    /// Change whether subsequent runs exit cleanly
    pub fn set_succeed(&self, succeed: bool) {
        self.state.succeed.store(succeed, Ordering::SeqCst);
    }

    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    /// Change how long subsequent runs take
    pub fn set_run_for(&self, run_for: Duration) {
        *self.state.run_for.lock().unwrap() = run_for;
    }

    /// Number of processes started, warmups included
    pub fn starts(&self) -> usize {
        self.state.starts.load(Ordering::SeqCst)
    }

    /// Number of processes killed
    pub fn kills(&self) -> usize {
        self.state.kills.load(Ordering::SeqCst)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.state.spoken.lock().unwrap().clone()
    }
}

impl SpeechEngine for MockEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.state.available.load(Ordering::SeqCst)
    }

    fn start(&self, text: &str, _speed: f64) -> orator_engine::Result<Box<dyn SpeechProcess>> {
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        self.state.spoken.lock().unwrap().push(text.to_owned());

        let run_for = *self.state.run_for.lock().unwrap();
        Ok(Box::new(MockProcess {
            finish_at: Instant::now() + run_for,
            succeed: self.state.succeed.load(Ordering::SeqCst),
            killed: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockProcess {
    finish_at: Instant,
    succeed: bool,
    killed: bool,
    state: Arc<MockEngineState>,
}

#[async_trait]
impl SpeechProcess for MockProcess {
    async fn wait(&mut self) -> orator_engine::Result<ProcessExit> {
        if !self.killed {
            tokio::time::sleep_until(self.finish_at).await;
        }

        Ok(if self.succeed && !self.killed {
            ProcessExit::Success
        } else if self.killed {
            ProcessExit::Failure {
                code: None,
                stderr: String::new(),
            }
        } else {
            ProcessExit::Failure {
                code: Some(1),
                stderr: "mock engine failure".to_owned(),
            }
        })
    }

    async fn kill(&mut self) -> orator_engine::Result<()> {
        if !self.killed {
            self.killed = true;
            self.state.kills.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        None
    }
}
