//! Telemetry for Orator
//!
//! Structured logging via `tracing` and optional OpenTelemetry metrics export.
//! Log output always goes to stderr because stdout carries the MCP stream.

mod metadata;
pub mod metrics;

use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use orator_config::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig};

// Re-export common OpenTelemetry types for metrics
pub use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

/// Guard that flushes and shuts down the meter provider on drop
pub struct TelemetryGuard {
    meter_provider: Option<SdkMeterProvider>,
}

impl TelemetryGuard {
    /// Force flush all pending metrics immediately
    ///
    /// # Errors
    ///
    /// Returns an error if the meter provider fails to flush
    pub fn force_flush(&self) -> anyhow::Result<()> {
        if let Some(ref provider) = self.meter_provider {
            provider
                .force_flush()
                .map_err(|e| anyhow::anyhow!("failed to flush metrics: {e}"))?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.meter_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown meter provider: {e}");
        }
    }
}

/// Initialize logging and metrics from configuration
///
/// Returns a guard that must be held for the lifetime of the application.
///
/// # Errors
///
/// Returns an error if the OTLP metrics exporter cannot be built
pub fn init(config: &TelemetryConfig, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry().with(filter).with(fmt_layer).init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json().flatten_event(true))
            .init(),
    }

    let meter_provider = match config.exporter {
        Some(ref exporter) => {
            let provider = init_metrics(config, exporter)?;
            global::set_meter_provider(provider.clone());
            tracing::info!(endpoint = %exporter.endpoint, "metrics export enabled");
            Some(provider)
        }
        None => None,
    };

    Ok(TelemetryGuard { meter_provider })
}

/// Build a meter provider that periodically pushes to the OTLP endpoint
fn init_metrics(config: &TelemetryConfig, exporter_config: &ExporterConfig) -> anyhow::Result<SdkMeterProvider> {
    use opentelemetry_otlp::{MetricExporter, WithExportConfig};
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = match exporter_config.protocol {
        ExportProtocol::Grpc => MetricExporter::builder()
            .with_tonic()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build gRPC metrics exporter: {e}"))?,
        ExportProtocol::HttpProto => MetricExporter::builder()
            .with_http()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP metrics exporter: {e}"))?,
    };

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(exporter_config.interval_seconds.max(1)))
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(metadata::build_resource(config))
        .with_reader(reader)
        .build())
}
