//! Programmatic dispatch configuration for integration tests

use orator_config::DispatchConfig;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: DispatchConfig,
}

impl ConfigBuilder {
    /// Start from the built-in defaults
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
        }
    }

    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.config.max_concurrent = limit;
        self
    }

    pub fn with_dedupe_seconds(mut self, seconds: f64) -> Self {
        self.config.default_dedupe_seconds = seconds;
        self
    }

    pub fn with_hard_timeout_seconds(mut self, seconds: f64) -> Self {
        self.config.default_hard_timeout_seconds = seconds;
        self
    }

    pub fn with_timeout_floor_seconds(mut self, seconds: f64) -> Self {
        self.config.timeout_floor_seconds = seconds;
        self
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.config.smoothing = smoothing;
        self
    }

    /// Build the final config
    pub fn build(self) -> DispatchConfig {
        self.config
    }
}
