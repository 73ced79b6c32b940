//! Reconciling a loaded annotation log with the live store.
//!
//! New spans arrive one at a time; each contest with an existing span is
//! decided by creation timestamp. The newer side keeps its full range, the
//! older side keeps only its slices outside the contested region.

use super::interval::{TaggedSpan, dedup_spans, sort_spans};
use super::position::Range;

/// Merge `new_batch` into `store` by timestamp precedence.
///
/// Afterwards the store is duplicate-free and sorted by `(start, end)`.
pub fn merge_sequential(store: &mut Vec<TaggedSpan>, new_batch: Vec<TaggedSpan>) {
    for new in new_batch {
        let mut contested = Vec::new();
        store.retain(|existing| {
            if strictly_overlaps(existing.range, new.range) {
                contested.push(existing.clone());
                false
            } else {
                true
            }
        });

        // Parts of the new span not yet claimed by an older existing span.
        let mut new_parts = vec![new.range];

        for existing in contested {
            if new.created_ms > existing.created_ms {
                // New wins: the old span survives only outside the new range.
                for slice in outside_slices(existing.range, new.range) {
                    let mut part = existing.clone();
                    part.range = slice;
                    store.push(part);
                }
            } else {
                // Old wins: keep it whole, trim the new span around it.
                new_parts = new_parts
                    .into_iter()
                    .flat_map(|part| outside_slices(part, existing.range))
                    .collect();
                store.push(existing);
            }
        }

        for slice in new_parts {
            let mut part = new.clone();
            part.range = slice;
            store.push(part);
        }
    }

    dedup_spans(store);
    sort_spans(store);
}

fn strictly_overlaps(a: Range, b: Range) -> bool {
    a.start < b.end && b.start < a.end
}

/// The non-empty pieces of `range` lying outside `hole`.
fn outside_slices(range: Range, hole: Range) -> Vec<Range> {
    let mut slices = Vec::with_capacity(2);
    if range.start < hole.start {
        slices.push(Range::new(range.start, hole.start.min(range.end)));
    }
    if hole.end < range.end {
        slices.push(Range::new(hole.end.max(range.start), range.end));
    }
    slices.retain(|s| !s.is_empty());
    slices
}
