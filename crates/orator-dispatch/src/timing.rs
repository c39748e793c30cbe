use std::collections::HashMap;
use std::time::Duration;

use orator_config::DispatchConfig;
use orator_engine::EngineKind;
use serde::Serialize;

/// Observed synthesis performance of one engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Exponential moving average of wall-clock duration, in seconds
    pub average_seconds: f64,
    /// Number of samples folded into the average
    pub samples: u64,
}

/// Per-engine moving average of synthesis duration, used to size timeouts
#[derive(Debug, Clone)]
pub struct TimingModel {
    stats: HashMap<EngineKind, EngineStats>,
    smoothing: f64,
    safety_factor: f64,
    floor: Duration,
    min_timeout: Duration,
}

impl TimingModel {
    pub fn new(smoothing: f64, safety_factor: f64, floor: Duration, min_timeout: Duration) -> Self {
        Self {
            stats: HashMap::new(),
            smoothing,
            safety_factor,
            floor,
            min_timeout,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(
            config.smoothing,
            config.safety_factor,
            Duration::try_from_secs_f64(config.timeout_floor_seconds).unwrap_or(Duration::MAX),
            Duration::try_from_secs_f64(config.min_timeout_seconds).unwrap_or(Duration::ZERO),
        )
    }

    /// Fold one completed run into the engine's average
    ///
    /// The first sample seeds the average. Negative or non-finite samples are ignored.
    pub fn record(&mut self, engine: EngineKind, observed_seconds: f64) {
        if !observed_seconds.is_finite() || observed_seconds < 0.0 {
            return;
        }

        let stats = self.stats.entry(engine).or_default();
        stats.average_seconds = if stats.samples == 0 {
            observed_seconds
        } else {
            stats
                .average_seconds
                .mul_add(1.0 - self.smoothing, observed_seconds * self.smoothing)
                .max(0.0)
        };
        stats.samples += 1;
    }

    /// Timeout to apply for the next run on `engine`
    ///
    /// An explicit override is a lower bound: the result is never below it,
    /// the scaled average or the minimum timeout. Without one the scaled
    /// average is used once it exceeds the floor.
    pub fn estimate(&self, engine: EngineKind, explicit: Option<Duration>) -> Duration {
        let scaled = Duration::try_from_secs_f64(self.scaled_average(engine)).unwrap_or(Duration::MAX);

        match explicit {
            Some(explicit) => explicit.max(scaled).max(self.min_timeout),
            None => scaled.max(self.floor),
        }
    }

    /// Average duration times the safety factor, zero without samples
    pub fn scaled_average(&self, engine: EngineKind) -> f64 {
        self.stats
            .get(&engine)
            .map_or(0.0, |stats| stats.average_seconds * self.safety_factor)
    }

    pub fn stats(&self, engine: EngineKind) -> Option<EngineStats> {
        self.stats.get(&engine).copied()
    }
}

impl Default for TimingModel {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}
