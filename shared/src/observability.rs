use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::{RandomIdGenerator, SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Installs the tracing pipeline: an EnvFilter'd fmt layer for diagnostics
/// plus an OpenTelemetry layer so handler spans carry real trace/span ids.
///
/// No exporter is wired up — structured log emission is this service's only
/// output, and the span ids exist to be embedded into those log lines.
pub fn init_tracing() -> TracingGuard {
    let tracer_provider = SdkTracerProvider::builder()
        .with_id_generator(RandomIdGenerator::default())
        .build();
    let tracer = tracer_provider.tracer("process-records");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(OpenTelemetryLayer::new(tracer))
        .init();

    TracingGuard { tracer_provider }
}

pub struct TracingGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("{err:?}");
        }
    }
}
