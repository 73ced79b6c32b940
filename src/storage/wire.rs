//! Persisted record format.
//!
//! One record per save: a version, an advisory checksum of the file text,
//! and the list of changes. Field names and kind strings are fixed wire
//! vocabulary; unknown optional fields are ignored on load.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::{Position, Provenance, Range, SpanMeta, TaggedSpan, WallClock};

pub const WIRE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed record: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// A persisted batch of changes for one file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default)]
    pub changes: Vec<WireChange>,
}

impl LogRecord {
    pub fn new(spans: &[TaggedSpan], checksum: Option<String>) -> Self {
        Self {
            version: WIRE_VERSION,
            checksum,
            changes: spans.iter().map(WireChange::from_span).collect(),
        }
    }

    pub fn spans(&self) -> Vec<TaggedSpan> {
        self.changes.iter().map(WireChange::to_span).collect()
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let record: LogRecord = serde_json::from_str(raw)?;
        if record.version != WIRE_VERSION {
            return Err(DecodeError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct WirePosition {
    line: u32,
    character: u32,
}

impl From<Position> for WirePosition {
    fn from(p: Position) -> Self {
        Self {
            line: p.line,
            character: p.character,
        }
    }
}

impl From<WirePosition> for Position {
    fn from(p: WirePosition) -> Self {
        Self {
            line: p.line,
            character: p.character,
        }
    }
}

/// One change entry on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireChange {
    start: WirePosition,
    end: WirePosition,
    #[serde(rename = "type")]
    kind: Provenance,
    #[serde(rename = "creationTimestamp")]
    created_ms: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    author: String,
    #[serde(rename = "pasteUrl", default, skip_serializing_if = "String::is_empty")]
    paste_url: String,
    #[serde(rename = "pasteTitle", default, skip_serializing_if = "String::is_empty")]
    paste_title: String,
    #[serde(rename = "aiName", default, skip_serializing_if = "String::is_empty")]
    ai_name: String,
    #[serde(rename = "aiModel", default, skip_serializing_if = "String::is_empty")]
    ai_model: String,
    #[serde(
        rename = "aiExplanation",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    ai_explanation: String,
    #[serde(rename = "aiType", default, skip_serializing_if = "String::is_empty")]
    ai_type: String,
}

impl WireChange {
    fn from_span(span: &TaggedSpan) -> Self {
        Self {
            start: span.range.start.into(),
            end: span.range.end.into(),
            kind: span.kind,
            created_ms: span.created_ms.0,
            author: span.author.clone(),
            paste_url: span.meta.paste_url.clone(),
            paste_title: span.meta.paste_title.clone(),
            ai_name: span.meta.ai_name.clone(),
            ai_model: span.meta.ai_model.clone(),
            ai_explanation: span.meta.ai_explanation.clone(),
            ai_type: span.meta.ai_type.clone(),
        }
    }

    fn to_span(&self) -> TaggedSpan {
        TaggedSpan {
            range: Range::new(self.start.into(), self.end.into()),
            kind: self.kind,
            created_ms: WallClock(self.created_ms),
            author: self.author.clone(),
            meta: SpanMeta {
                paste_url: self.paste_url.clone(),
                paste_title: self.paste_title.clone(),
                ai_name: self.ai_name.clone(),
                ai_model: self.ai_model.clone(),
                ai_explanation: self.ai_explanation.clone(),
                ai_type: self.ai_type.clone(),
            },
        }
    }
}

/// Advisory checksum of the file text at save time.
pub fn checksum_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_span() -> TaggedSpan {
        TaggedSpan::new(
            Range::new(Position::new(0, 2), Position::new(1, 4)),
            Provenance::AiGenerated,
            WallClock(1_700_000_000_000),
        )
        .with_author("alice")
        .with_meta(SpanMeta {
            ai_name: "copilot".into(),
            ai_model: "gpt-test".into(),
            ai_type: "insertEdit".into(),
            ..SpanMeta::default()
        })
    }

    #[test]
    fn record_round_trips_spans() {
        let record = LogRecord::new(&[sample_span()], Some(checksum_hex("body")));
        let decoded = LogRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.spans(), vec![sample_span()]);
    }

    #[test]
    fn wire_uses_host_field_names() {
        let record = LogRecord::new(&[sample_span()], None);
        let json = record.encode().unwrap();
        assert!(json.contains("\"creationTimestamp\":1700000000000"));
        assert!(json.contains("\"type\":\"AI_GENERATED\""));
        assert!(json.contains("\"aiName\":\"copilot\""));
        assert!(json.contains("\"character\":2"));
        assert!(!json.contains("pasteUrl"), "empty fields stay off the wire");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let raw = r#"{"version": 9, "changes": []}"#;
        assert!(matches!(
            LogRecord::decode(raw),
            Err(DecodeError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn unknown_optional_fields_are_ignored() {
        let raw = r#"{
            "version": 1,
            "futureField": {"x": 1},
            "changes": [{
                "start": {"line": 0, "character": 0},
                "end": {"line": 0, "character": 3},
                "type": "PASTE",
                "creationTimestamp": 123,
                "somethingNew": "y"
            }]
        }"#;
        let record = LogRecord::decode(raw).unwrap();
        assert_eq!(record.changes.len(), 1);
        let span = &record.spans()[0];
        assert_eq!(span.kind, Provenance::Paste);
        assert_eq!(span.created_ms, WallClock(123));
        assert!(span.author.is_empty());
    }

    #[test]
    fn checksum_is_stable_hex_sha256() {
        assert_eq!(
            checksum_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
