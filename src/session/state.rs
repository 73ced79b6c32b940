//! Per-file tracking state.

use std::path::PathBuf;

use crate::core::{TaggedSpan, WallClock};

/// Paste hints older than this are pruned on every write.
pub const PASTE_HINT_TTL_MS: u64 = 400;

/// Everything the coordinator holds for one tracked file.
#[derive(Debug, Default)]
pub struct FileState {
    pub spans: Vec<TaggedSpan>,
    /// Short-lived paste markers from the host's paste path.
    pub paste_hints: Vec<TaggedSpan>,
    pub save_path: Option<PathBuf>,
    /// Spans created after this stamp are "new since load" and get
    /// persisted; everything older came from the log itself.
    pub load_ts: WallClock,
    /// The persisted log has been merged in.
    pub loaded: bool,
}

impl FileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prune_hints(&mut self, now: WallClock) {
        self.paste_hints
            .retain(|h| h.created_ms.age_ms(now) < PASTE_HINT_TTL_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Position, Provenance, Range};

    #[test]
    fn hints_expire_after_the_ttl() {
        let mut state = FileState::new();
        let range = Range::empty_at(Position::new(0, 2));
        state
            .paste_hints
            .push(TaggedSpan::new(range, Provenance::Paste, WallClock(1_000)));
        state
            .paste_hints
            .push(TaggedSpan::new(range, Provenance::Paste, WallClock(1_300)));

        state.prune_hints(WallClock(1_500));
        assert_eq!(state.paste_hints.len(), 1);
        assert_eq!(state.paste_hints[0].created_ms, WallClock(1_300));
    }
}
