#![forbid(unsafe_code)]

pub mod clipboard;
pub mod config;
pub mod core;
pub mod error;
pub mod paths;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod vcs;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    AiCommand, ClipboardHint, ClipboardKind, Edit, EditReason, MemoryDocument, Position,
    Provenance, Range, SpanMeta, TaggedSpan, TextDocument, WallClock, ai_kind, coalesce,
    merge_sequential, shift,
};
pub use crate::session::{FileState, SpanListener, Tracker};
pub use crate::storage::{LogRecord, Storage, checksum_hex};
