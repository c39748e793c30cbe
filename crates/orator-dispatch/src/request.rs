use std::time::Duration;

use orator_config::DispatchConfig;
use orator_engine::EngineChoice;

use crate::DispatchError;

/// A request to speak some text
///
/// Optional fields fall back to the dispatcher's configured defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub engine: EngineChoice,
    /// Speed multiplier, 1.0 is the engine's normal rate
    pub speed: f64,
    /// Explicit timeout; `None` selects the adaptive estimate
    pub timeout_seconds: Option<f64>,
    /// Speak a short utterance first to wake the engine
    pub warmup: bool,
    /// Wait for the speech to finish before returning
    pub wait_for_completion: bool,
    pub dedupe_seconds: Option<f64>,
    pub hard_timeout_seconds: Option<f64>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            engine: EngineChoice::Auto,
            speed: 1.0,
            timeout_seconds: None,
            warmup: false,
            wait_for_completion: false,
            dedupe_seconds: None,
            hard_timeout_seconds: None,
        }
    }

    #[must_use]
    pub const fn engine(mut self, engine: EngineChoice) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub const fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub const fn warmup(mut self, warmup: bool) -> Self {
        self.warmup = warmup;
        self
    }

    #[must_use]
    pub const fn wait_for_completion(mut self, wait: bool) -> Self {
        self.wait_for_completion = wait;
        self
    }

    #[must_use]
    pub const fn dedupe_seconds(mut self, seconds: f64) -> Self {
        self.dedupe_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub const fn hard_timeout_seconds(mut self, seconds: f64) -> Self {
        self.hard_timeout_seconds = Some(seconds);
        self
    }

    /// Normalize and check the request against configured limits
    pub(crate) fn validate(&self, config: &DispatchConfig) -> Result<ValidRequest, DispatchError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(invalid("text is empty"));
        }

        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(invalid("speed must be a positive number"));
        }
        if self.speed < config.min_speed || self.speed > config.max_speed {
            return Err(invalid(format!(
                "speed must be within {}..{}",
                config.min_speed, config.max_speed
            )));
        }

        let timeout = self
            .timeout_seconds
            .map(|seconds| positive("timeout_seconds", seconds))
            .transpose()?;

        let dedupe_seconds = self.dedupe_seconds.unwrap_or(config.default_dedupe_seconds);
        if !dedupe_seconds.is_finite() || dedupe_seconds < 0.0 {
            return Err(invalid("dedupe_seconds must not be negative"));
        }
        let dedupe = Duration::try_from_secs_f64(dedupe_seconds)
            .map_err(|_| invalid("dedupe_seconds is out of range"))?;

        let hard_timeout = positive(
            "hard_timeout_seconds",
            self.hard_timeout_seconds
                .unwrap_or(config.default_hard_timeout_seconds),
        )?;

        Ok(ValidRequest {
            text: text.to_string(),
            engine: self.engine,
            speed: self.speed,
            timeout,
            warmup: self.warmup,
            wait: self.wait_for_completion,
            dedupe,
            hard_timeout,
        })
    }
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub(crate) struct ValidRequest {
    pub text: String,
    pub engine: EngineChoice,
    pub speed: f64,
    pub timeout: Option<Duration>,
    pub warmup: bool,
    pub wait: bool,
    pub dedupe: Duration,
    pub hard_timeout: Duration,
}

fn invalid(reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidRequest(reason.into())
}

fn positive(name: &str, seconds: f64) -> Result<Duration, DispatchError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid(format!("{name} must be a positive number")));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid(format!("{name} is out of range")))
}
