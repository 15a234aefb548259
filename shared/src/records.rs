use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One invocation's worth of Kinesis stream records.
///
/// Deserialization is strict about the batch shape (`Records` must be
/// present) but lenient about individual records, so a single odd record
/// cannot take the whole batch down with it.
#[derive(Debug, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StreamRecord>,
}

impl StreamEvent {
    /// Validates the raw invocation payload into a typed batch. A payload
    /// without a `Records` sequence is a malformed invocation, not a
    /// data-quality problem, and fails here.
    pub fn from_value(event: Value) -> Result<Self, String> {
        serde_json::from_value(event)
            .map_err(|e| format!("invocation payload is not a Kinesis record batch: {e}"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    #[serde(default)]
    pub kinesis: KinesisData,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinesisData {
    /// Base64 text, exactly as Kinesis delivers it over the wire.
    #[serde(default)]
    pub data: String,
}

/// Application payload carried inside a record's data.
///
/// `nrDt` is double-encoded by the upstream producer: a JSON *string* whose
/// content is itself JSON. That wire contract is preserved here verbatim —
/// the raw string travels into log entries unchanged, and only
/// [`RecordPayload::trace_context`] re-parses a copy for the telemetry
/// collaborator.
#[derive(Debug, Deserialize)]
pub struct RecordPayload {
    pub message: String,
    #[serde(rename = "nrDt")]
    pub nr_dt: Option<String>,
}

impl RecordPayload {
    /// Decodes a record's base64 data and parses it into a typed payload.
    pub fn decode(data: &str) -> Result<Self, RecordFailure> {
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| RecordFailure::decode(format!("invalid base64: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| RecordFailure::decode(format!("data is not valid UTF-8: {e}")))?;
        serde_json::from_str(&text)
            .map_err(|e| RecordFailure::parse(format!("payload is not valid JSON: {e}")))
    }

    /// Parses the inner JSON of `nrDt`, when present.
    pub fn trace_context(&self) -> Option<Result<Value, serde_json::Error>> {
        self.nr_dt.as_deref().map(serde_json::from_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Decode,
    Parse,
}

/// A per-record failure. Never propagated past its own record.
#[derive(Debug, Serialize)]
pub struct RecordFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl RecordFailure {
    pub fn decode(detail: String) -> Self {
        Self {
            kind: FailureKind::Decode,
            detail,
        }
    }

    pub fn parse(detail: String) -> Self {
        Self {
            kind: FailureKind::Parse,
            detail,
        }
    }
}

/// One successfully processed record, serialized as a single JSON object
/// per log line. Linking-metadata keys are flattened in verbatim so log
/// aggregation can correlate the line to the distributed trace.
#[derive(Debug, Serialize)]
pub struct LogEntry {
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub message: String,
    #[serde(rename = "nrDt", skip_serializing_if = "Option::is_none")]
    pub nr_dt: Option<String>,
    #[serde(flatten)]
    pub linking_metadata: HashMap<String, String>,
}

/// Failure marker for a record that could not be decoded or parsed. Emitted
/// through the same sink as [`LogEntry`] so every record in a batch yields
/// exactly one outcome line, in batch order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub event_name: String,
    pub error: FailureKind,
    pub detail: String,
}
