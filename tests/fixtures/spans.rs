//! Builders and invariant checks shared across integration tests.

use tabd::core::TextDocument;
use tabd::{Edit, Position, Provenance, Range, TaggedSpan, WallClock};

pub fn pos(line: u32, character: u32) -> Position {
    Position::new(line, character)
}

pub fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
    Range::new(pos(sl, sc), pos(el, ec))
}

pub fn edit(r: Range, text: &str) -> Edit {
    Edit::new(r, text)
}

pub fn span(kind: Provenance, r: Range, ts: u64) -> TaggedSpan {
    TaggedSpan::new(r, kind, WallClock(ts))
}

pub fn user_span(sc: u32, ec: u32, ts: u64) -> TaggedSpan {
    span(Provenance::UserEdit, range(0, sc, 0, ec), ts)
}

/// The store invariants that must hold after any transform: no inverted
/// ranges, everything in bounds, no strict overlap between non-empties.
pub fn assert_store_invariants(spans: &[TaggedSpan], doc: &dyn TextDocument) {
    let end = doc.end();
    for s in spans {
        assert!(s.range.start <= s.range.end, "inverted span {:?}", s.range);
        assert!(s.range.end <= end, "span {:?} beyond document end {end}", s.range);
    }
    for (i, a) in spans.iter().enumerate() {
        for b in &spans[i + 1..] {
            if a.is_empty() || b.is_empty() {
                continue;
            }
            let overlap = a.range.start < b.range.end && b.range.start < a.range.end;
            assert!(!overlap, "strict overlap between {:?} and {:?}", a.range, b.range);
        }
    }
}
