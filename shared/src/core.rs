use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// The APM agent seam. Implementations operate on the ambient per-invocation
/// trace; the processor never reaches for global agent state itself.
#[cfg_attr(any(test, feature = "mocks"), automock)]
pub trait Telemetry: Debug {
    /// Stitch an upstream-produced trace context into the current
    /// invocation's trace. `transport` tags how the context travelled
    /// (Kinesis records carry no protocol of their own, so callers pass
    /// "Other").
    fn accept_distributed_trace_context(
        &self,
        transport: &str,
        context: &Value,
    ) -> Result<(), String>;

    /// Attach key/value attributes to the current invocation's telemetry
    /// event.
    fn add_custom_attributes(&self, attributes: HashMap<String, String>) -> Result<(), String>;

    /// Trace/span/entity identifiers for embedding into log lines so
    /// aggregation tooling can correlate them back to the trace.
    fn linking_metadata(&self, include_span_id: bool) -> Result<HashMap<String, String>, String>;
}

/// Line-oriented structured log output. One serialized record per call.
#[cfg_attr(any(test, feature = "mocks"), automock)]
pub trait LogSink: Debug {
    fn emit(&self, line: &str) -> Result<(), String>;
}
