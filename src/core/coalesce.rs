//! Save-time collapsing of adjacent user edits.
//!
//! A typing burst leaves a trail of touching one-character spans; before
//! persisting, runs of touching `UserEdit` spans whose neighbours were
//! created within a minute of each other collapse into one span.

use super::interval::{Provenance, TaggedSpan, sort_spans};
use super::position::Range;

/// Adjacent user edits this close in time join one group.
pub const COALESCE_WINDOW_MS: u64 = 60_000;

/// Collapse runs of touching `UserEdit` spans. Everything else passes
/// through unchanged. Idempotent; output is sorted by `(start, end)`.
pub fn coalesce(spans: &[TaggedSpan]) -> Vec<TaggedSpan> {
    let mut users: Vec<TaggedSpan> = Vec::new();
    let mut out: Vec<TaggedSpan> = Vec::new();
    for span in spans {
        if span.kind == Provenance::UserEdit {
            users.push(span.clone());
        } else {
            out.push(span.clone());
        }
    }
    sort_spans(&mut users);

    let mut group: Vec<TaggedSpan> = Vec::new();
    for cur in users {
        let joins = group.last().is_some_and(|prev| {
            prev.range.end == cur.range.start
                && cur.created_ms.0.abs_diff(prev.created_ms.0) < COALESCE_WINDOW_MS
        });
        if joins {
            group.push(cur);
        } else {
            flush(&mut group, &mut out);
            group.push(cur);
        }
    }
    flush(&mut group, &mut out);

    sort_spans(&mut out);
    out
}

fn flush(group: &mut Vec<TaggedSpan>, out: &mut Vec<TaggedSpan>) {
    match group.len() {
        0 => {}
        1 => out.push(group.pop().expect("non-empty group")),
        _ => {
            let created = group
                .iter()
                .map(|s| s.created_ms)
                .min()
                .expect("non-empty group");
            let mut merged = group[0].clone();
            merged.range = Range::new(group[0].range.start, group[group.len() - 1].range.end);
            merged.created_ms = created;
            out.push(merged);
            group.clear();
        }
    }
}
