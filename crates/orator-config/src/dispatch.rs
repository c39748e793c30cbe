use serde::Deserialize;

/// Default timeout advertised to protocol clients, in seconds
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 20.0;
/// Default dedupe window, in seconds
pub const DEFAULT_DEDUPE_SECONDS: f64 = 30.0;
/// Default hard timeout after which a job is killed, in seconds
pub const DEFAULT_HARD_TIMEOUT_SECONDS: f64 = 600.0;

/// Dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum number of concurrently running speech jobs across all engines
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Timeout a client gets when it does not pass one
    #[serde(default = "default_timeout_seconds")]
    pub default_timeout_seconds: f64,
    /// Dedupe window a client gets when it does not pass one
    #[serde(default = "default_dedupe_seconds")]
    pub default_dedupe_seconds: f64,
    /// Hard timeout a client gets when it does not pass one
    #[serde(default = "default_hard_timeout_seconds")]
    pub default_hard_timeout_seconds: f64,
    /// Lower bound of the adaptive timeout when no explicit value is given
    #[serde(default = "default_timeout_floor_seconds")]
    pub timeout_floor_seconds: f64,
    /// Lower bound of any explicit timeout
    #[serde(default = "default_min_timeout_seconds")]
    pub min_timeout_seconds: f64,
    /// Multiplier applied to the moving average before it is used as a timeout
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    /// Weight of a new sample in the exponential moving average
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Slowest accepted speed multiplier
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    /// Fastest accepted speed multiplier
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Utterance spoken by the warmup step
    #[serde(default = "default_warmup_text")]
    pub warmup_text: String,
    /// Upper bound for the warmup utterance
    #[serde(default = "default_warmup_timeout_seconds")]
    pub warmup_timeout_seconds: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            default_timeout_seconds: default_timeout_seconds(),
            default_dedupe_seconds: default_dedupe_seconds(),
            default_hard_timeout_seconds: default_hard_timeout_seconds(),
            timeout_floor_seconds: default_timeout_floor_seconds(),
            min_timeout_seconds: default_min_timeout_seconds(),
            safety_factor: default_safety_factor(),
            smoothing: default_smoothing(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            warmup_text: default_warmup_text(),
            warmup_timeout_seconds: default_warmup_timeout_seconds(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_concurrent() -> usize {
    2
}
#[allow(clippy::missing_const_for_fn)]
fn default_timeout_seconds() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}
#[allow(clippy::missing_const_for_fn)]
fn default_dedupe_seconds() -> f64 {
    DEFAULT_DEDUPE_SECONDS
}
#[allow(clippy::missing_const_for_fn)]
fn default_hard_timeout_seconds() -> f64 {
    DEFAULT_HARD_TIMEOUT_SECONDS
}
#[allow(clippy::missing_const_for_fn)]
fn default_timeout_floor_seconds() -> f64 {
    300.0
}
#[allow(clippy::missing_const_for_fn)]
fn default_min_timeout_seconds() -> f64 {
    5.0
}
#[allow(clippy::missing_const_for_fn)]
fn default_safety_factor() -> f64 {
    1.0
}
#[allow(clippy::missing_const_for_fn)]
fn default_smoothing() -> f64 {
    0.2
}
#[allow(clippy::missing_const_for_fn)]
fn default_min_speed() -> f64 {
    0.25
}
#[allow(clippy::missing_const_for_fn)]
fn default_max_speed() -> f64 {
    4.0
}
fn default_warmup_text() -> String {
    "warming up".to_string()
}
#[allow(clippy::missing_const_for_fn)]
fn default_warmup_timeout_seconds() -> f64 {
    10.0
}
