//! The record/alarm data model and the message-bus boundary.
//!
//! [`RecordSource`]/[`RecordSink`] are a pluggable seam rather than a hard
//! binding to one broker client; [`channel`] and [`line_json`] are the two
//! shipped implementations.

pub mod channel;
pub mod line_json;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;

/// A decoded inbound record: field name to JSON value. Only string values
/// are ever matched against a variable.
pub type Record = HashMap<String, Value>;

/// Decode one line of wire bytes into a [`Record`].
pub fn decode(bytes: &[u8]) -> Result<Record, RecordError> {
    serde_json::from_slice(bytes).map_err(RecordError::Decode)
}

/// The wire-level alarm emitted when a rule fires.
///
/// The pass-through fields are lifted verbatim from the originating record
/// when present, `summary` names the rule, and `description` lists the
/// matched fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logsource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orgid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub summary: String,
    #[serde(rename = "desc")]
    pub description: String,
}

impl AlarmEnvelope {
    /// Build an envelope for a fired rule: pass-through fields lifted from
    /// `record` when present as strings, `summary` naming the rule, and
    /// `description` the comma-joined match fragments.
    pub fn new(record: &Record, rule_name: &str, alarm_text: &str, fragments: &[String]) -> Self {
        let field = |name: &str| record.get(name).and_then(Value::as_str).map(str::to_string);
        AlarmEnvelope {
            logsource: field("logsource"),
            class: field("class"),
            kind: field("type"),
            orgid: field("orgid"),
            message: field("message"),
            summary: format!("rule {rule_name} fired: {alarm_text}"),
            description: fragments.join(", "),
        }
    }
}

/// The external consumer: yields the next decoded record, or `None` on a
/// clean end-of-stream / shutdown signal.
pub trait RecordSource {
    fn recv(&mut self) -> Result<Option<Record>, RecordError>;
}

/// The external producer: enqueues one alarm. Failure is recoverable — the
/// dispatcher logs it and continues.
pub trait RecordSink {
    fn send(&mut self, alarm: &AlarmEnvelope) -> Result<(), RecordError>;
}
