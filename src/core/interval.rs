//! Tagged provenance spans.
//!
//! A span is a plain value: a range plus a provenance kind, a creation
//! timestamp, an author, and a flat metadata record. Equality is full-field,
//! including the timestamp.

use serde::{Deserialize, Serialize};

use super::position::{Position, Range};
use super::time::WallClock;

/// Who or what produced a stretch of text. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    Unknown,
    UserEdit,
    AiGenerated,
    UndoRedo,
    Paste,
    IdePaste,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::UserEdit => "USER_EDIT",
            Self::AiGenerated => "AI_GENERATED",
            Self::UndoRedo => "UNDO_REDO",
            Self::Paste => "PASTE",
            Self::IdePaste => "IDE_PASTE",
        }
    }
}

/// Origin metadata. Flat record; empty string means absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpanMeta {
    pub paste_url: String,
    pub paste_title: String,
    pub ai_name: String,
    pub ai_model: String,
    pub ai_explanation: String,
    pub ai_type: String,
}

impl SpanMeta {
    pub fn is_empty(&self) -> bool {
        self.paste_url.is_empty()
            && self.paste_title.is_empty()
            && self.ai_name.is_empty()
            && self.ai_model.is_empty()
            && self.ai_explanation.is_empty()
            && self.ai_type.is_empty()
    }
}

/// A provenance-annotated stretch of document text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedSpan {
    pub range: Range,
    pub kind: Provenance,
    pub created_ms: WallClock,
    pub author: String,
    pub meta: SpanMeta,
}

impl TaggedSpan {
    pub fn new(range: Range, kind: Provenance, created_ms: WallClock) -> Self {
        Self {
            range,
            kind,
            created_ms,
            author: String::new(),
            meta: SpanMeta::default(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_meta(mut self, meta: SpanMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn start(&self) -> Position {
        self.range.start
    }

    pub fn end(&self) -> Position {
        self.range.end
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Sort key: start position, then end position.
    pub fn order_key(&self) -> (Position, Position) {
        (self.range.start, self.range.end)
    }
}

/// Sort spans by `(start, end)` lexicographically.
pub fn sort_spans(spans: &mut [TaggedSpan]) {
    spans.sort_by_key(TaggedSpan::order_key);
}

/// Drop exact duplicates (full-field equality), keeping first occurrences.
pub fn dedup_spans(spans: &mut Vec<TaggedSpan>) {
    let mut seen: Vec<TaggedSpan> = Vec::with_capacity(spans.len());
    spans.retain(|s| {
        if seen.contains(s) {
            false
        } else {
            seen.push(s.clone());
            true
        }
    });
}
