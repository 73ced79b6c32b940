//! Session coordinator.
//!
//! The serialisation point for all tracking state: one process-wide lock
//! guards every per-file store, the hint singletons, and the pending AI
//! batch. Host events enter here and nowhere else.

pub mod state;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::clipboard;
use crate::config::Config;
use crate::core::hints::ai_kind;
use crate::core::{
    AiCommand, ClipboardHint, Edit, EditReason, MemoryDocument, Position, Provenance, Range,
    TaggedSpan, TextDocument, TransformCtx, apply_edits, clamp_range, coalesce, merge_sequential,
};
use crate::paths::is_excluded;
use crate::storage::{LogRecord, Storage, StorageError, checksum_hex};
use crate::vcs::VcsOriginResolver;

pub use state::{FileState, PASTE_HINT_TTL_MS};

/// Invoked after every accepted batch with the file's current spans.
pub type SpanListener = Box<dyn Fn(&str, &[TaggedSpan]) + Send>;

/// Derived AI edits parked until the post-insert signal.
struct PendingAi {
    uri: String,
    edits: Vec<Edit>,
}

struct Inner {
    config: Config,
    storage: Storage,
    files: HashMap<String, FileState>,
    last_clipboard: Option<ClipboardHint>,
    last_ai: Option<AiCommand>,
    pending_ai: Option<PendingAi>,
    window_focused: bool,
}

/// Per-process tracking coordinator.
pub struct Tracker {
    inner: Mutex<Inner>,
    /// Kept outside the state lock so a listener may call back in.
    listener: Mutex<Option<SpanListener>>,
}

impl Tracker {
    pub fn new(config: Config) -> Self {
        let storage = Storage::from_config(&config.storage);
        Self {
            inner: Mutex::new(Inner {
                config,
                storage,
                files: HashMap::new(),
                last_clipboard: None,
                last_ai: None,
                pending_ai: None,
                window_focused: true,
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn set_listener(&self, listener: SpanListener) {
        *self
            .listener
            .lock()
            .unwrap_or_else(|err| err.into_inner()) = Some(listener);
    }

    /// One atomic host content change for `doc`.
    pub fn on_edit_batch(&self, doc: &dyn TextDocument, edits: &[Edit], reason: EditReason) {
        if !self.should_track(doc.uri()) {
            return;
        }
        let snapshot = {
            let mut inner = self.lock();
            inner.apply_batch(doc, edits, reason)
        };
        self.notify(doc.uri(), snapshot);
    }

    /// Paste markers from the host's paste path; consumed by edit batches
    /// arriving within the hint window.
    pub fn on_paste(&self, doc: &dyn TextDocument, ranges: &[Range]) {
        if !self.should_track(doc.uri()) {
            return;
        }
        let now = crate::core::WallClock::now();
        let mut inner = self.lock();
        let file = inner.files.entry(doc.uri().to_string()).or_default();
        for range in ranges {
            file.paste_hints
                .push(TaggedSpan::new(*range, Provenance::Paste, now));
        }
        file.prune_hints(now);
    }

    /// Lazy-load the persisted log into the live store, once per file.
    pub fn on_activate(&self, doc: &dyn TextDocument) {
        if !self.should_track(doc.uri()) {
            return;
        }
        let mut inner = self.lock();
        inner.activate(doc);
    }

    /// Coalesce, filter to new-since-load, persist.
    ///
    /// Persistence failures never roll back in-memory state; only a record
    /// path collision is surfaced to the caller.
    pub fn on_save(&self, doc: &dyn TextDocument) -> crate::Result<()> {
        if !self.should_track(doc.uri()) {
            return Ok(());
        }
        let mut inner = self.lock();
        inner.save(doc)
    }

    /// AI-tool intake. `doc` carries the affected document when the host
    /// has one open.
    pub fn on_ai_command(&self, payload: AiCommand, doc: Option<&dyn TextDocument>) {
        let (uri, snapshot) = {
            let mut inner = self.lock();
            inner.ai_command(payload, doc)
        };
        if let Some(uri) = uri {
            self.notify(&uri, snapshot);
        }
    }

    /// The host discarded the document; its tracking state goes with it.
    pub fn on_discard(&self, uri: &str) {
        self.lock().files.remove(uri);
    }

    /// Storage configuration changed: every cached file state is dropped.
    pub fn on_storage_config_change(&self, config: Config) {
        let mut inner = self.lock();
        inner.storage = Storage::from_config(&config.storage);
        inner.config = config;
        inner.files.clear();
        debug!("storage configuration changed; file states dropped");
    }

    pub fn on_window_state(&self, focused: bool) {
        self.lock().window_focused = focused;
    }

    /// Timer-driven clipboard poll; a no-op while the window is unfocused
    /// or no helper is configured.
    pub fn poll_clipboard(&self) {
        let mut inner = self.lock();
        if !inner.window_focused {
            return;
        }
        let command = inner.config.clipboard.helper.clone();
        if command.is_empty() {
            return;
        }
        match clipboard::query_helper(&command) {
            Ok(Some(hint)) => inner.last_clipboard = Some(hint),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "clipboard helper failed"),
        }
    }

    /// Direct clipboard capture from the host's own copy hook.
    pub fn set_clipboard_hint(&self, hint: ClipboardHint) {
        self.lock().last_clipboard = Some(hint);
    }

    /// Current spans for a file (decoration rendering reads through here).
    pub fn spans_of(&self, uri: &str) -> Vec<TaggedSpan> {
        self.lock()
            .files
            .get(uri)
            .map(|f| f.spans.clone())
            .unwrap_or_default()
    }

    fn should_track(&self, uri: &str) -> bool {
        !is_excluded(&uri_path(uri))
    }

    fn notify(&self, uri: &str, snapshot: Option<Vec<TaggedSpan>>) {
        let Some(spans) = snapshot else { return };
        let listener = self.listener.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(listener) = listener.as_ref() {
            listener(uri, &spans);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Inner {
    fn apply_batch(
        &mut self,
        doc: &dyn TextDocument,
        edits: &[Edit],
        reason: EditReason,
    ) -> Option<Vec<TaggedSpan>> {
        let now = crate::core::WallClock::now();
        let author = self.config.author.clone();
        let clipboard = self.last_clipboard.clone();
        let ai = self.last_ai.clone();

        let file = self.files.entry(doc.uri().to_string()).or_default();
        file.prune_hints(now);

        let ctx = TransformCtx {
            doc,
            now,
            author: &author,
            clipboard: clipboard.as_ref(),
            ai: ai.as_ref(),
            origin: &VcsOriginResolver,
        };
        let outcome = apply_edits(
            std::mem::take(&mut file.spans),
            &file.paste_hints,
            edits,
            reason,
            &ctx,
        );
        file.spans = outcome.spans;
        let snapshot = file.spans.clone();

        if outcome.clear_ai {
            self.last_ai = None;
        }
        if let Some(edits) = outcome.pending_ai {
            self.pending_ai = Some(PendingAi {
                uri: doc.uri().to_string(),
                edits,
            });
        }
        Some(snapshot)
    }

    fn activate(&mut self, doc: &dyn TextDocument) {
        let now = crate::core::WallClock::now();
        let path = uri_path(doc.uri());
        let file = self.files.entry(doc.uri().to_string()).or_default();
        if file.loaded {
            return;
        }
        file.loaded = true;
        file.load_ts = now.saturating_sub_ms(1);

        let records = match self.storage.load(&path) {
            Ok(records) => records,
            Err(err) => {
                warn!(uri = doc.uri(), error = %err, "log load failed; starting empty");
                return;
            }
        };

        let text = doc.text();
        for record in records {
            if let Some(stored) = record.checksum.as_deref()
                && stored != checksum_hex(&text)
            {
                debug!(uri = doc.uri(), "record checksum differs from buffer (advisory)");
            }
            merge_sequential(&mut file.spans, record.spans());
        }
        for span in &mut file.spans {
            span.range = clamp_range(doc, span.range);
        }
        debug!(uri = doc.uri(), spans = file.spans.len(), "log loaded");
    }

    fn save(&mut self, doc: &dyn TextDocument) -> crate::Result<()> {
        let path = uri_path(doc.uri());
        let Some(file) = self.files.get_mut(doc.uri()) else {
            return Ok(());
        };

        let coalesced = coalesce(&file.spans);
        let fresh: Vec<TaggedSpan> = coalesced
            .into_iter()
            .filter(|s| s.created_ms > file.load_ts)
            .collect();
        if fresh.is_empty() {
            debug!(uri = doc.uri(), "nothing new since load; save skipped");
            return Ok(());
        }

        let record = LogRecord::new(&fresh, Some(checksum_hex(&doc.text())));
        match self.storage.save(&path, &record) {
            Ok(()) => {
                file.save_path = Some(path);
                debug!(uri = doc.uri(), changes = record.changes.len(), "record saved");
                Ok(())
            }
            Err(err @ StorageError::PathCollision { .. }) => Err(err.into()),
            Err(err) => {
                warn!(uri = doc.uri(), error = %err, "save failed; tracking continues");
                Ok(())
            }
        }
    }

    fn ai_command(
        &mut self,
        payload: AiCommand,
        doc: Option<&dyn TextDocument>,
    ) -> (Option<String>, Option<Vec<TaggedSpan>>) {
        let kind = payload.kind.clone();
        self.last_ai = Some(payload.clone());

        match kind.as_str() {
            ai_kind::POST_INSERT_EDIT => {
                let Some(pending) = self.pending_ai.take() else {
                    return (None, None);
                };
                let Some(doc) = doc else {
                    warn!("post-insert signal without a document; derived edits kept");
                    self.pending_ai = Some(pending);
                    return (None, None);
                };
                let snapshot = self.apply_batch(doc, &pending.edits, EditReason::AiGenerated);
                (Some(pending.uri), snapshot)
            }
            ai_kind::CREATE_FILE => {
                let Some(uri) = payload.document.clone() else {
                    return (None, None);
                };
                if is_excluded(&uri_path(&uri)) {
                    return (None, None);
                }
                let text = payload.insert_text.clone().unwrap_or_default();
                let synthetic = MemoryDocument::new(uri.clone(), &text);
                let edit = Edit::insert_at(Position::ZERO, text);
                let snapshot =
                    self.apply_batch(&synthetic, &[edit], EditReason::AiGenerated);
                (Some(uri), snapshot)
            }
            _ => (None, None),
        }
    }
}

/// Filesystem path behind a document uri.
fn uri_path(uri: &str) -> PathBuf {
    Path::new(uri.strip_prefix("file://").unwrap_or(uri)).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_scheme_is_stripped() {
        assert_eq!(uri_path("file:///w/src/a.rs"), PathBuf::from("/w/src/a.rs"));
        assert_eq!(uri_path("/w/src/a.rs"), PathBuf::from("/w/src/a.rs"));
    }

    #[test]
    fn dot_paths_are_never_tracked() {
        let tracker = Tracker::new(Config::default());
        assert!(!tracker.should_track("file:///w/.env"));
        assert!(!tracker.should_track("/w/.git/config"));
        assert!(tracker.should_track("/w/src/main.rs"));
    }
}
