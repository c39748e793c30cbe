use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A concrete speech engine
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineKind {
    /// macOS `say`
    Say,
    /// Embedded Swift synthesis script
    Swift,
    /// `espeak`
    Espeak,
}

impl EngineKind {
    /// Order in which `auto` tries engines
    pub const PRIORITY: [Self; 3] = [Self::Say, Self::Swift, Self::Espeak];

    /// Program name used when the configuration does not name one
    pub const fn default_program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::Swift => "swift_tts.swift",
            Self::Espeak => "espeak",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Engine selection as requested by a client
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineChoice {
    /// First available engine in priority order
    #[default]
    Auto,
    /// macOS `say`
    Say,
    /// Embedded Swift synthesis script
    Swift,
    /// `espeak`
    Espeak,
}

impl EngineChoice {
    /// The concrete engine this choice pins, `None` for `auto`
    pub const fn kind(self) -> Option<EngineKind> {
        match self {
            Self::Auto => None,
            Self::Say => Some(EngineKind::Say),
            Self::Swift => Some(EngineKind::Swift),
            Self::Espeak => Some(EngineKind::Espeak),
        }
    }
}

impl From<EngineKind> for EngineChoice {
    fn from(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Say => Self::Say,
            EngineKind::Swift => Self::Swift,
            EngineKind::Espeak => Self::Espeak,
        }
    }
}
