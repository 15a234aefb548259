use lambda_runtime::{run, service_fn, Error};
mod event_handler;
use event_handler::{function_handler, HandlerDeps};
use shared::adapters::{SpanTelemetry, StdoutLogSink};
use shared::observability;

mod config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _tracing_guard = observability::init_tracing();
    let config = config::Config::load()?;

    let handler_deps = HandlerDeps {
        telemetry: SpanTelemetry::new(config.service_name),
        log_sink: StdoutLogSink::default(),
    };

    run(service_fn(|event| function_handler(&handler_deps, event))).await
}
