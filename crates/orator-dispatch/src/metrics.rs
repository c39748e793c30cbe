use orator_engine::EngineKind;
use orator_telemetry::{Counter, Histogram, KeyValue, metrics};

/// Instruments recorded by the dispatcher
pub(crate) struct DispatchMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    stops: Counter<u64>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        let meter = metrics::meter();

        Self {
            requests: meter
                .u64_counter(metrics::SPEECH_REQUEST_COUNT)
                .with_description("Speech requests by engine and outcome")
                .build(),
            duration: meter
                .f64_histogram(metrics::SPEECH_SYNTHESIS_DURATION)
                .with_description("Wall-clock duration of completed speech")
                .with_unit("s")
                .build(),
            stops: meter
                .u64_counter(metrics::SPEECH_STOP_COUNT)
                .with_description("Speech jobs stopped on request")
                .build(),
        }
    }

    /// Count a request by its final or rejection status
    pub fn record_request(&self, engine: Option<EngineKind>, status: &'static str) {
        let engine = engine.map_or("none", EngineKind::as_str);
        self.requests
            .add(1, &[KeyValue::new("engine", engine), KeyValue::new("status", status)]);
    }

    pub fn record_duration(&self, engine: EngineKind, seconds: f64) {
        self.duration.record(seconds, &[KeyValue::new("engine", engine.as_str())]);
    }

    pub fn record_stops(&self, count: usize) {
        if count > 0 {
            self.stops.add(u64::try_from(count).unwrap_or(u64::MAX), &[]);
        }
    }
}
