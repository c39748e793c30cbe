use thiserror::Error;

use crate::EngineKind;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors raised while starting or supervising an engine process
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary or script does not exist
    #[error("{engine} command not found: {program}")]
    NotFound { engine: EngineKind, program: String },

    /// The engine binary or script exists but cannot be executed
    #[error("{engine} command is not executable: {program}")]
    NotExecutable { engine: EngineKind, program: String },

    /// Spawning failed for another reason
    #[error("failed to start {engine}: {source}")]
    Spawn {
        engine: EngineKind,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or killing a running process failed
    #[error("process i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn from_spawn(engine: EngineKind, program: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                engine,
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::NotExecutable {
                engine,
                program: program.to_string(),
            },
            _ => Self::Spawn { engine, source },
        }
    }
}
