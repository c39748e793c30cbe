use std::path::PathBuf;

use serde::Deserialize;

/// Speech engine configuration
///
/// Engines are always tried in the fixed priority order `say`, `swift`,
/// `espeak` when a client asks for `auto`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnginesConfig {
    /// macOS `say`
    #[serde(default)]
    pub say: CommandEngineConfig,
    /// Embedded Swift synthesis script
    #[serde(default)]
    pub swift: ScriptEngineConfig,
    /// `espeak` fallback
    #[serde(default)]
    pub espeak: CommandEngineConfig,
    /// Speed multiplier to words-per-minute conversion
    #[serde(default)]
    pub rate: SpeechRateConfig,
    /// Directory used when `TMPDIR` is missing or not writable
    ///
    /// Defaults to the directory holding the executable.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

/// An engine invoked as a command
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEngineConfig {
    /// Whether the engine may be selected at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Command name looked up on `PATH`, or a path to the binary
    #[serde(default)]
    pub command: Option<String>,
}

impl Default for CommandEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

/// An engine implemented as an executable script
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEngineConfig {
    /// Whether the engine may be selected at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Script path, defaults to `swift_tts.swift` next to the executable
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl Default for ScriptEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script: None,
        }
    }
}

/// Words-per-minute conversion for engines that take a rate flag
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechRateConfig {
    /// Rate at speed 1.0
    #[serde(default = "default_base_wpm")]
    pub base_wpm: u32,
    /// Lowest rate passed to an engine
    #[serde(default = "default_min_wpm")]
    pub min_wpm: u32,
    /// Highest rate passed to an engine
    #[serde(default = "default_max_wpm")]
    pub max_wpm: u32,
}

impl Default for SpeechRateConfig {
    fn default() -> Self {
        Self {
            base_wpm: default_base_wpm(),
            min_wpm: default_min_wpm(),
            max_wpm: default_max_wpm(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}
#[allow(clippy::missing_const_for_fn)]
fn default_base_wpm() -> u32 {
    175
}
#[allow(clippy::missing_const_for_fn)]
fn default_min_wpm() -> u32 {
    80
}
#[allow(clippy::missing_const_for_fn)]
fn default_max_wpm() -> u32 {
    600
}
