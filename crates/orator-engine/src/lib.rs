#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod kind;
mod process;
mod provider;
mod rate;
mod scratch;
mod set;
pub mod text;

pub use error::{EngineError, Result};
pub use kind::{EngineChoice, EngineKind};
pub use process::ChildProcess;
pub use provider::command::{CommandEngine, SpeedArg};
pub use provider::{ProcessExit, SpeechEngine, SpeechProcess};
pub use rate::SpeechRate;
pub use scratch::ScratchEnv;
pub use set::EngineSet;
