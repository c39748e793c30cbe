use orator_dispatch::SpeechRequest;
use orator_engine::{EngineChoice, text::strip_markdown};
use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments of the `speak` tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SpeakParams {
    /// Text to read aloud; Markdown formatting is removed first
    pub text: String,
    /// Engine to use: auto, say, swift or espeak
    #[serde(default)]
    pub engine: EngineChoice,
    /// Speed multiplier, 1.0 is normal
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Minimum time to wait in synchronous mode; omit for an adaptive timeout
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    /// Speak a short utterance first to wake the engine
    #[serde(default)]
    pub warmup: bool,
    /// Wait until speech finishes before returning
    #[serde(default)]
    pub wait_for_completion: bool,
    /// Suppress identical requests within this many seconds; 0 disables
    #[serde(default)]
    pub dedupe_seconds: Option<f64>,
    /// Kill speech still running after this many seconds
    #[serde(default)]
    pub hard_timeout_seconds: Option<f64>,
}

impl SpeakParams {
    /// Build a dispatcher request
    ///
    /// A timeout equal to `default_timeout` selects the adaptive estimate,
    /// the same as an omitted one.
    pub fn into_request(self, default_timeout: f64) -> SpeechRequest {
        let timeout_seconds = self
            .timeout_seconds
            .filter(|&seconds| (seconds - default_timeout).abs() > f64::EPSILON);

        SpeechRequest {
            text: strip_markdown(&self.text),
            engine: self.engine,
            speed: self.speed,
            timeout_seconds,
            warmup: self.warmup,
            wait_for_completion: self.wait_for_completion,
            dedupe_seconds: self.dedupe_seconds,
            hard_timeout_seconds: self.hard_timeout_seconds,
        }
    }
}

/// Arguments of the `stop_speech` tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StopParams {
    /// Stop every running job instead of only the most recent one
    #[serde(default = "default_all")]
    pub all: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_speed() -> f64 {
    1.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_all() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> SpeakParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn omitted_fields_use_defaults() {
        let params = params(serde_json::json!({ "text": "hello" }));

        assert_eq!(params.engine, EngineChoice::Auto);
        assert!((params.speed - 1.0).abs() < f64::EPSILON);
        assert!(!params.wait_for_completion);
        assert!(params.timeout_seconds.is_none());

        let stop: StopParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(stop.all);
    }

    #[test]
    fn markdown_is_stripped() {
        let request = params(serde_json::json!({ "text": "## **Build** finished, see `log.txt`" })).into_request(20.0);
        assert_eq!(request.text, "Build finished, see log.txt");
    }

    #[test]
    fn default_timeout_means_adaptive() {
        let request = params(serde_json::json!({ "text": "hi", "timeout_seconds": 20.0 })).into_request(20.0);
        assert_eq!(request.timeout_seconds, None);

        let request = params(serde_json::json!({ "text": "hi", "timeout_seconds": 45 })).into_request(20.0);
        assert_eq!(request.timeout_seconds, Some(45.0));
    }

    #[test]
    fn engine_is_parsed() {
        let request = params(serde_json::json!({ "text": "hi", "engine": "espeak", "speed": 1.5 })).into_request(20.0);
        assert_eq!(request.engine, EngineChoice::Espeak);
        assert!((request.speed - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let result: Result<SpeakParams, _> = serde_json::from_value(serde_json::json!({ "text": "hi", "engine": "festival" }));
        assert!(result.is_err());
    }
}
