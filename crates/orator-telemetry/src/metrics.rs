//! Metric names shared by the speech dispatcher

/// Speech requests by engine and final status
pub const SPEECH_REQUEST_COUNT: &str = "speech.request.count";
/// Wall-clock synthesis duration of completed jobs, in seconds
pub const SPEECH_SYNTHESIS_DURATION: &str = "speech.synthesis.duration";
/// Jobs terminated by `stop_speech`
pub const SPEECH_STOP_COUNT: &str = "speech.stop.count";

/// Meter used by every Orator instrument
pub fn meter() -> opentelemetry::metrics::Meter {
    opentelemetry::global::meter("orator")
}
