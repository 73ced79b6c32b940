//! Core provenance engine.
//!
//! Module hierarchy follows type dependency order:
//! - time: wall clock (Layer 0)
//! - position: Position, Range, Edit, shift (Layer 1)
//! - interval: Provenance, SpanMeta, TaggedSpan (Layer 2)
//! - document: offset/position oracle (Layer 2)
//! - hints: clipboard + AI hint payloads (Layer 3)
//! - classify: edit → provenance decision (Layer 4)
//! - transform: batch fold over the span store (Layer 5)
//! - merge: loaded-log reconciliation (Layer 5)
//! - coalesce: save-time user-edit collapse (Layer 5)

pub mod classify;
pub mod coalesce;
pub mod document;
pub mod hints;
pub mod interval;
pub mod merge;
pub mod position;
pub mod time;
pub mod transform;

pub use classify::{
    AI_INLINE_WINDOW_MS, AI_WINDOW_MS, CLIPBOARD_WINDOW_MS, ClassifyCtx, EditReason, NoOrigin,
    OriginError, OriginResolver, PASTE_HINT_WINDOW_MS, PasteOrigin, Verdict, classify,
};
pub use coalesce::{COALESCE_WINDOW_MS, coalesce};
pub use document::{MemoryDocument, TextDocument, clamp_range};
pub use hints::{AiCommand, ClipboardHint, ClipboardKind, ai_kind};
pub use interval::{Provenance, SpanMeta, TaggedSpan, dedup_spans, sort_spans};
pub use merge::merge_sequential;
pub use position::{Edit, Position, Range, shift, text_len};
pub use time::WallClock;
pub use transform::{TransformCtx, TransformOutcome, apply_edits};
