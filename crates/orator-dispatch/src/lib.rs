//! Speech job dispatch
//!
//! Admission control, deduplication, adaptive timeouts and job lifecycle for
//! speech requests. Engines are reached only through [`orator_engine::EngineSet`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod dedup;
mod dispatcher;
mod error;
mod metrics;
mod outcome;
mod registry;
mod request;
mod timing;

pub use dedup::{DedupDecision, DedupKey, DedupTable};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use outcome::{SpeakMode, SpeakOutcome, SpeakStatus, StopOutcome};
pub use registry::{JobId, JobSnapshot, JobState};
pub use request::SpeechRequest;
pub use timing::{EngineStats, TimingModel};
