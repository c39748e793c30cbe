#![allow(dead_code)]

pub mod config;
pub mod engine;

use std::sync::Arc;

use orator_config::DispatchConfig;
use orator_dispatch::Dispatcher;
use orator_engine::{EngineSet, SpeechEngine};

use self::engine::MockEngine;

/// Dispatcher over the given mock engines
pub fn dispatcher(config: DispatchConfig, engines: &[&MockEngine]) -> Dispatcher {
    let engines = engines
        .iter()
        .map(|engine| Arc::new((*engine).clone()) as Arc<dyn SpeechEngine>)
        .collect();
    Dispatcher::new(config, EngineSet::new(engines))
}

/// Let spawned job tasks catch up without advancing paused time
pub async fn let_jobs_run() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}
