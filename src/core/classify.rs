//! Provenance classification for a single edit.
//!
//! Maps `(reason, edit shape, recent clipboard hint, recent AI hint)` to the
//! provenance kind and metadata of the span the transformer will emit, or to
//! one of the two non-emitting verdicts (silent fold, deferred AI edit).

use thiserror::Error;

use crate::core::document::TextDocument;
use crate::core::interval::{Provenance, SpanMeta};
use crate::core::position::{Edit, Range, text_len};
use crate::core::time::WallClock;
use super::hints::{AiCommand, ClipboardHint, ClipboardKind, ai_kind};

/// Paste hints deposited by the host's paste path expire after this long.
pub const PASTE_HINT_WINDOW_MS: u64 = 200;
/// Clipboard captures stay usable for paste metadata for an hour.
pub const CLIPBOARD_WINDOW_MS: u64 = 60 * 60 * 1_000;
/// A non-completion AI hint must be this fresh to claim an edit.
pub const AI_WINDOW_MS: u64 = 2_000;
/// Inline completions keep claiming edits for five minutes.
pub const AI_INLINE_WINDOW_MS: u64 = 5 * 60 * 1_000;

/// Why the host says a batch happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditReason {
    #[default]
    None,
    Undo,
    Redo,
    Paste,
    IdePaste,
    AiGenerated,
}

#[derive(Debug, Error)]
#[error("paste origin resolution failed: {0}")]
pub struct OriginError(pub String);

/// Resolved source location for an in-IDE paste.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasteOrigin {
    pub url: String,
    pub title: String,
}

/// Resolves an in-IDE clipboard capture to its VCS origin.
///
/// The production implementation lives in `crate::vcs`; tests substitute a
/// canned one.
pub trait OriginResolver {
    fn resolve(&self, workspace_path: &str, relative_path: &str)
    -> Result<PasteOrigin, OriginError>;
}

/// Resolver for hosts without VCS access: everything resolves to empty.
pub struct NoOrigin;

impl OriginResolver for NoOrigin {
    fn resolve(&self, _workspace_path: &str, _relative_path: &str) -> Result<PasteOrigin, OriginError> {
        Ok(PasteOrigin::default())
    }
}

/// Classification result for one edit.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Emit a span of this kind; the edit also folds into existing spans.
    Emit {
        kind: Provenance,
        meta: SpanMeta,
        clear_ai: bool,
    },
    /// No span, but the edit still folds into existing spans.
    Silent,
    /// Before-tool hint: the real change arrives later. Nothing is emitted
    /// or folded now; the derived edit replays on the post-insert signal.
    Deferred(Edit),
}

/// Inputs the classifier consults for one edit.
pub struct ClassifyCtx<'a> {
    pub doc: &'a dyn TextDocument,
    pub now: WallClock,
    pub clipboard: Option<&'a ClipboardHint>,
    pub ai: Option<&'a AiCommand>,
    pub origin: &'a dyn OriginResolver,
}

pub fn classify(edit: &Edit, reason: EditReason, ctx: &ClassifyCtx) -> Result<Verdict, OriginError> {
    let trimmed = edit.text.trim();
    match reason {
        EditReason::Paste | EditReason::IdePaste => resolve_paste(reason, trimmed, ctx),
        EditReason::AiGenerated => Ok(Verdict::Emit {
            kind: Provenance::AiGenerated,
            meta: ctx.ai.map(ai_meta).unwrap_or_default(),
            clear_ai: true,
        }),
        EditReason::Undo | EditReason::Redo => Ok(Verdict::Emit {
            kind: Provenance::UndoRedo,
            meta: SpanMeta::default(),
            clear_ai: false,
        }),
        EditReason::None => {
            let tool_hint = ctx.ai.is_some_and(AiCommand::is_tool_kind);
            if trimmed.chars().count() <= 1 && !tool_hint {
                Ok(Verdict::Emit {
                    kind: Provenance::UserEdit,
                    meta: SpanMeta::default(),
                    clear_ai: false,
                })
            } else {
                Ok(ai_branch(edit, trimmed, ctx))
            }
        }
    }
}

/// Fallback when classification itself failed: the edit still folds, with
/// reason-derived kind and no metadata.
pub fn fallback_verdict(reason: EditReason) -> Verdict {
    let kind = match reason {
        EditReason::Paste => Provenance::Paste,
        EditReason::IdePaste => Provenance::IdePaste,
        EditReason::AiGenerated => Provenance::AiGenerated,
        EditReason::Undo | EditReason::Redo => Provenance::UndoRedo,
        EditReason::None => return Verdict::Silent,
    };
    Verdict::Emit {
        kind,
        meta: SpanMeta::default(),
        clear_ai: false,
    }
}

fn resolve_paste(
    reason: EditReason,
    trimmed: &str,
    ctx: &ClassifyCtx,
) -> Result<Verdict, OriginError> {
    let mut kind = if reason == EditReason::IdePaste {
        Provenance::IdePaste
    } else {
        Provenance::Paste
    };
    let mut meta = SpanMeta::default();

    if let Some(clip) = ctx.clipboard
        && clip.text.trim() == trimmed
        && clip.is_fresh(ctx.now, CLIPBOARD_WINDOW_MS)
    {
        match clip.kind {
            ClipboardKind::IdeClipboardCopy => {
                kind = Provenance::IdePaste;
                let origin = ctx.origin.resolve(&clip.workspace_path, &clip.relative_path)?;
                meta.paste_url = origin.url;
                meta.paste_title = origin.title;
            }
            ClipboardKind::ClipboardCopy => {
                meta.paste_url = clip.url.clone();
                meta.paste_title = clip.title.clone();
            }
        }
    }

    Ok(Verdict::Emit {
        kind,
        meta,
        clear_ai: false,
    })
}

fn ai_branch(edit: &Edit, trimmed: &str, ctx: &ClassifyCtx) -> Verdict {
    let Some(ai) = ctx.ai else {
        return Verdict::Silent;
    };

    if ai.is_deferred_before_tool() {
        return match derived_ai_edit(ai, ctx.doc) {
            Some(derived) => Verdict::Deferred(derived),
            None => Verdict::Silent,
        };
    }

    let Some(insert) = ai.insert_text.as_deref() else {
        return Verdict::Silent;
    };
    if !insert.trim().contains(trimmed) {
        return Verdict::Silent;
    }

    let fresh = ai.ts > ctx.now.saturating_sub_ms(AI_WINDOW_MS)
        || (ai.kind == ai_kind::INLINE_COMPLETION
            && ai.ts > ctx.now.saturating_sub_ms(AI_INLINE_WINDOW_MS));
    if !fresh {
        return Verdict::Silent;
    }

    if let Some(start) = ai.range_start()
        && start != edit.range.start
    {
        return Verdict::Silent;
    }

    Verdict::Emit {
        kind: Provenance::AiGenerated,
        meta: ai_meta(ai),
        clear_ai: ai.is_after_tool(),
    }
}

fn ai_meta(ai: &AiCommand) -> SpanMeta {
    SpanMeta {
        ai_name: ai.extension_name.clone().unwrap_or_default(),
        ai_model: ai.model_id.clone().unwrap_or_default(),
        ai_explanation: ai.explanation.clone().unwrap_or_default(),
        ai_type: ai.ai_type_label().to_string(),
        ..SpanMeta::default()
    }
}

/// Synthesise the edit a before-tool hint describes: a zero-width range at
/// the divergence offset of `insert_text` against `old_text`, carrying the
/// trimmed insert text.
fn derived_ai_edit(ai: &AiCommand, doc: &dyn TextDocument) -> Option<Edit> {
    let insert = ai.insert_text.as_deref()?;
    let old = ai.old_text.as_deref().unwrap_or("");
    let prefix = common_affix_offsets(old, insert).0;
    let at = doc.position_at(prefix);
    Some(Edit::new(Range::empty_at(at), insert.trim()))
}

/// `(prefix, suffix)` lengths in UTF-16 units, with the suffix clamped so
/// the two regions never overlap.
fn common_affix_offsets(old: &str, new: &str) -> (usize, usize) {
    let prefix_chars = old
        .chars()
        .zip(new.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf16())
        .sum::<usize>();

    let mut suffix_chars = 0usize;
    for (a, b) in old.chars().rev().zip(new.chars().rev()) {
        if a != b {
            break;
        }
        suffix_chars += a.len_utf16();
    }
    let shortest = text_len(old).min(text_len(new)) as usize;
    (prefix_chars, suffix_chars.min(shortest - prefix_chars.min(shortest)))
}
