use orator_config::SpeechRateConfig;

/// Converts a speed multiplier into an engine words-per-minute rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRate {
    base_wpm: u32,
    min_wpm: u32,
    max_wpm: u32,
}

impl SpeechRate {
    pub const fn new(base_wpm: u32, min_wpm: u32, max_wpm: u32) -> Self {
        Self {
            base_wpm,
            min_wpm,
            max_wpm,
        }
    }

    pub const fn from_config(config: &SpeechRateConfig) -> Self {
        Self::new(config.base_wpm, config.min_wpm, config.max_wpm)
    }

    /// Rate for the given multiplier, rounded and clamped to the configured bounds
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn words_per_minute(&self, speed: f64) -> u32 {
        let wpm = (f64::from(self.base_wpm) * speed).round();
        let clamped = wpm.clamp(f64::from(self.min_wpm), f64::from(self.max_wpm));
        clamped as u32
    }
}

impl Default for SpeechRate {
    fn default() -> Self {
        Self::from_config(&SpeechRateConfig::default())
    }
}
