use lambda_runtime::{tracing, Error, LambdaEvent};
use serde_json::Value;
use shared::core::{LogSink, Telemetry};
use shared::records::{FailureEntry, LogEntry, RecordPayload, StreamEvent, StreamRecord};
use std::collections::HashMap;

pub(crate) struct HandlerDeps<T: Telemetry, S: LogSink> {
    pub telemetry: T,
    pub log_sink: S,
}

/// Processes one Kinesis batch: decodes every record, attaches propagated
/// trace context to the ambient invocation trace, and emits one structured
/// log line per record.
///
/// Per-record failures are isolated — a malformed record yields a failure
/// marker and processing continues. Only a malformed batch (no `Records`)
/// fails the invocation, handing redelivery to the platform.
pub(crate) async fn function_handler<T: Telemetry, S: LogSink>(
    deps: &HandlerDeps<T, S>,
    event: LambdaEvent<Value>,
) -> Result<(), Error> {
    let stream_event = StreamEvent::from_value(event.payload).map_err(Error::from)?;
    tracing::info!("processing {} stream records", stream_event.records.len());

    // Records are handled strictly in batch order; trace-context attachment
    // is order-sensitive relative to the ambient invocation trace.
    for record in stream_event.records {
        process_record(deps, record);
    }

    Ok(())
}

fn process_record<T: Telemetry, S: LogSink>(deps: &HandlerDeps<T, S>, record: StreamRecord) {
    let payload = match RecordPayload::decode(&record.kinesis.data) {
        Ok(payload) => payload,
        Err(failure) => {
            tracing::warn!(
                "skipping record {}: {:?} failure: {}",
                record.event_name,
                failure.kind,
                failure.detail
            );
            emit_line(
                deps,
                &FailureEntry {
                    event_name: record.event_name,
                    error: failure.kind,
                    detail: failure.detail,
                },
            );
            return;
        }
    };
    tracing::debug!("decoded payload: {:?}", payload);

    match payload.trace_context() {
        Some(Ok(context)) => {
            if let Err(e) = deps
                .telemetry
                .accept_distributed_trace_context("Other", &context)
            {
                tracing::warn!("failed to accept propagated trace context: {}", e);
            }
        }
        Some(Err(e)) => {
            tracing::warn!("trace context is not valid JSON, skipping attachment: {}", e);
        }
        None => {}
    }

    let mut attributes = HashMap::new();
    attributes.insert("myCustomData".to_string(), payload.message.clone());
    if let Err(e) = deps.telemetry.add_custom_attributes(attributes) {
        tracing::warn!("failed to add custom attributes: {}", e);
    }

    let linking_metadata = deps.telemetry.linking_metadata(true).unwrap_or_else(|e| {
        tracing::warn!("failed to fetch linking metadata: {}", e);
        HashMap::new()
    });

    emit_line(
        deps,
        &LogEntry {
            event_name: record.event_name,
            message: payload.message,
            nr_dt: payload.nr_dt,
            linking_metadata,
        },
    );
}

fn emit_line<T: Telemetry, S: LogSink, E: serde::Serialize>(deps: &HandlerDeps<T, S>, entry: &E) {
    match serde_json::to_string(entry) {
        Ok(line) => {
            if let Err(e) = deps.log_sink.emit(&line) {
                tracing::warn!("log sink rejected entry: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!("failed to serialize log entry: {}", e);
        }
    }
}
