use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use orator_config::{CommandEngineConfig, ScriptEngineConfig};
use tokio::process::Command;

use super::{SpeechEngine, SpeechProcess};
use crate::{ChildProcess, EngineKind, ScratchEnv, SpeechRate, error::EngineError, error::Result};

/// How an engine takes its speed setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedArg {
    /// Flag followed by a words-per-minute value
    WordsPerMinute(&'static str),
    /// Flag followed by the raw multiplier
    Multiplier(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Bare names are searched on `PATH` and must be executable
    Command,
    /// A file path that only has to exist
    Script,
}

/// Engine that speaks by running an external command with the text as its last argument
#[derive(Debug, Clone)]
pub struct CommandEngine {
    kind: EngineKind,
    program: PathBuf,
    lookup: Lookup,
    speed_arg: SpeedArg,
    rate: SpeechRate,
    env: Vec<(OsString, PathBuf)>,
}

impl CommandEngine {
    pub fn new(kind: EngineKind, program: impl Into<PathBuf>, speed_arg: SpeedArg) -> Self {
        Self {
            kind,
            program: program.into(),
            lookup: Lookup::Command,
            speed_arg,
            rate: SpeechRate::default(),
            env: Vec::new(),
        }
    }

    /// Treat the program as a script path that only needs to exist
    #[must_use]
    pub fn script(mut self) -> Self {
        self.lookup = Lookup::Script;
        self
    }

    #[must_use]
    pub const fn with_rate(mut self, rate: SpeechRate) -> Self {
        self.rate = rate;
        self
    }

    #[must_use]
    pub fn with_scratch_env(mut self, scratch: &ScratchEnv) -> Self {
        self.env = scratch.vars().map(|(k, v)| (k.clone(), v.clone())).collect();
        self
    }

    /// macOS `say`, rate given as `-r <wpm>`
    pub fn say(config: &CommandEngineConfig) -> Self {
        let program = config.command.as_deref().unwrap_or(EngineKind::Say.default_program());
        Self::new(EngineKind::Say, program, SpeedArg::WordsPerMinute("-r"))
    }

    /// `espeak`, rate given as `-s <wpm>`
    pub fn espeak(config: &CommandEngineConfig) -> Self {
        let program = config.command.as_deref().unwrap_or(EngineKind::Espeak.default_program());
        Self::new(EngineKind::Espeak, program, SpeedArg::WordsPerMinute("-s"))
    }

    /// Swift synthesis script, speed given as `--speed <multiplier>`
    ///
    /// Without a configured path the script is expected in `install_dir`.
    pub fn swift(config: &ScriptEngineConfig, install_dir: &Path) -> Self {
        let program = config
            .script
            .clone()
            .unwrap_or_else(|| install_dir.join(EngineKind::Swift.default_program()));
        Self::new(EngineKind::Swift, program, SpeedArg::Multiplier("--speed")).script()
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one utterance, text last
    pub(crate) fn args(&self, text: &str, speed: f64) -> Vec<String> {
        let mut args = Vec::with_capacity(3);

        if (speed - 1.0).abs() > f64::EPSILON {
            match self.speed_arg {
                SpeedArg::WordsPerMinute(flag) => {
                    args.push(flag.to_string());
                    args.push(self.rate.words_per_minute(speed).to_string());
                }
                SpeedArg::Multiplier(flag) => {
                    args.push(flag.to_string());
                    args.push(speed.to_string());
                }
            }
        }

        args.push(text.to_string());
        args
    }

    /// Locate the program the way the engine will be started
    fn resolve(&self) -> Option<PathBuf> {
        match self.lookup {
            Lookup::Script => self.program.exists().then(|| self.program.clone()),
            Lookup::Command if self.program.components().count() > 1 => {
                is_executable(&self.program).then(|| self.program.clone())
            }
            Lookup::Command => {
                let path = std::env::var_os("PATH")?;
                std::env::split_paths(&path)
                    .map(|dir| dir.join(&self.program))
                    .find(|candidate| is_executable(candidate))
            }
        }
    }
}

impl SpeechEngine for CommandEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    fn start(&self, text: &str, speed: f64) -> Result<Box<dyn SpeechProcess>> {
        let program = self.program.to_string_lossy();

        tracing::debug!(
            engine = %self.kind,
            program = %program,
            speed,
            chars = text.chars().count(),
            "starting speech process"
        );

        let child = Command::new(&self.program)
            .args(self.args(text, speed))
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::from_spawn(self.kind, &program, e))?;

        Ok(Box::new(ChildProcess::new(child)))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;

    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
