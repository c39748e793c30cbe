#![allow(clippy::must_use_candidate)]

pub mod dispatch;
pub mod engines;
mod env;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use dispatch::*;
pub use engines::*;
pub use telemetry::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig};

/// Top-level Orator configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Admission, dedupe and timing parameters
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Speech engine configuration
    #[serde(default)]
    pub engines: EnginesConfig,
    /// Logging and metrics configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
