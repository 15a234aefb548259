use crate::core::{LogSink, Telemetry};
use opentelemetry::{
    trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState},
    Context,
};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// [`Telemetry`] implementation backed by the ambient `tracing` span.
///
/// Accepted trace contexts become the remote parent of the current span, so
/// downstream exporters stitch this invocation into the producer's trace.
#[derive(Debug)]
pub struct SpanTelemetry {
    entity_name: Option<String>,
}

impl SpanTelemetry {
    pub fn new(entity_name: Option<String>) -> Self {
        Self { entity_name }
    }
}

impl Telemetry for SpanTelemetry {
    fn accept_distributed_trace_context(
        &self,
        _transport: &str,
        context: &Value,
    ) -> Result<(), String> {
        let remote = span_context_from_payload(context)
            .ok_or_else(|| "trace context carries no usable trace identifiers".to_string())?;
        let span = tracing::Span::current();
        span.set_parent(Context::new().with_remote_span_context(remote));
        Ok(())
    }

    fn add_custom_attributes(&self, attributes: HashMap<String, String>) -> Result<(), String> {
        let span = tracing::Span::current();
        for (key, value) in attributes {
            span.set_attribute(key, value);
        }
        Ok(())
    }

    fn linking_metadata(&self, include_span_id: bool) -> Result<HashMap<String, String>, String> {
        let span = tracing::Span::current();
        let context = span.context();
        let span_ref = context.span();
        let span_context = span_ref.span_context();

        let mut metadata = HashMap::new();
        if span_context.is_valid() {
            metadata.insert(
                "trace.id".to_string(),
                span_context.trace_id().to_string(),
            );
            if include_span_id {
                metadata.insert("span.id".to_string(), span_context.span_id().to_string());
            }
        }
        if let Some(name) = &self.entity_name {
            metadata.insert("entity.name".to_string(), name.clone());
        }
        Ok(metadata)
    }
}

/// Builds a span context from a propagated trace-context payload.
///
/// Supports the New Relic payload shape (`d.tr` trace id, `d.id`/`d.gu` span
/// guid) and falls back to a W3C `traceparent` field. Returns `None` when
/// neither carries parseable identifiers.
fn span_context_from_payload(context: &Value) -> Option<SpanContext> {
    if let Some(data) = context.get("d") {
        let trace_id = data.get("tr").and_then(Value::as_str)?;
        let span_id = data
            .get("id")
            .or_else(|| data.get("gu"))
            .and_then(Value::as_str);
        return build_span_context(trace_id, span_id);
    }

    if let Some(trace_parent) = context.get("traceparent").and_then(Value::as_str) {
        let parts: Vec<&str> = trace_parent.split('-').collect();
        if parts.len() < 4 {
            return None;
        }
        return build_span_context(parts[1], Some(parts[2]));
    }

    None
}

fn build_span_context(trace_id: &str, span_id: Option<&str>) -> Option<SpanContext> {
    // Upstream agents may send shorter hex ids; left-pad to the W3C widths.
    let trace_id = TraceId::from_hex(&format!("{:0>32}", trace_id.to_ascii_lowercase())).ok()?;
    let span_id = span_id
        .and_then(|id| SpanId::from_hex(&format!("{:0>16}", id.to_ascii_lowercase())).ok())
        .unwrap_or_else(|| SpanId::from_bytes([0u8; 8]));

    Some(SpanContext::new(
        trace_id,
        span_id,
        TraceFlags::SAMPLED,
        false,
        TraceState::NONE,
    ))
}

/// Writes one log line per call to locked stdout.
#[derive(Debug, Default)]
pub struct StdoutLogSink;

impl LogSink for StdoutLogSink {
    fn emit(&self, line: &str) -> Result<(), String> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{line}").map_err(|e| format!("failed to write log line: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_span_context_from_newrelic_payload() {
        let payload = json!({
            "v": [0, 1],
            "d": {
                "ty": "App",
                "tr": "d6b4ba0c3a883350",
                "id": "27856f70d3d314b7"
            }
        });

        let context = span_context_from_payload(&payload).unwrap();

        // Short agent ids are left-padded to the full W3C width.
        assert_eq!(
            context.trace_id().to_string(),
            "0000000000000000d6b4ba0c3a883350"
        );
        assert_eq!(context.span_id().to_string(), "27856f70d3d314b7");
        assert!(context.is_valid());
    }

    #[test]
    fn extracts_span_context_from_traceparent() {
        let payload = json!({
            "traceparent": "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
        });

        let context = span_context_from_payload(&payload).unwrap();

        assert_eq!(
            context.trace_id().to_string(),
            "0af7651916cd43dd8448eb211c80319c"
        );
        assert_eq!(context.span_id().to_string(), "b7ad6b7169203331");
    }

    #[test]
    fn rejects_payload_without_identifiers() {
        assert!(span_context_from_payload(&json!({ "traceId": "abc" })).is_none());
        assert!(span_context_from_payload(&json!({ "d": { "ty": "App" } })).is_none());
        assert!(span_context_from_payload(&json!({ "traceparent": "garbage" })).is_none());
    }

    #[test]
    fn rejects_non_hex_trace_id() {
        let payload = json!({ "d": { "tr": "zzzz" } });

        assert!(span_context_from_payload(&payload).is_none());
    }

    #[test]
    fn missing_span_guid_falls_back_to_invalid_span_id() {
        let payload = json!({ "d": { "tr": "0af7651916cd43dd8448eb211c80319c" } });

        let context = span_context_from_payload(&payload).unwrap();

        assert_eq!(context.span_id(), SpanId::from_bytes([0u8; 8]));
    }

    #[test]
    fn linking_metadata_without_active_span_only_carries_entity_name() {
        let telemetry = SpanTelemetry::new(Some("process-records".to_string()));

        let metadata = telemetry.linking_metadata(true).unwrap();

        assert_eq!(metadata.get("entity.name").map(String::as_str), Some("process-records"));
        assert!(metadata.get("trace.id").is_none());
        assert!(metadata.get("span.id").is_none());
    }
}
