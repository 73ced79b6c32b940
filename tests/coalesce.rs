//! Save-time coalescing, including the full type-then-save flow.

mod fixtures;

use tabd::core::time::pin_clock_for_tests;
use fixtures::spans::{pos, range, user_span};
use fixtures::workspace::TempWorkspace;

use std::fs;

use tabd::config::Config;
use tabd::{Edit, EditReason, LogRecord, MemoryDocument, Provenance, Tracker, coalesce};

#[test]
fn three_touching_edits_collapse_into_one() {
    let t = 1_000_000u64;
    let spans = vec![
        user_span(0, 1, t),
        user_span(1, 2, t + 30_000),
        user_span(2, 3, t + 45_000),
    ];
    let out = coalesce(&spans);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].range, range(0, 0, 0, 3));
    assert_eq!(out[0].created_ms.0, t);
}

#[test]
fn an_edit_past_the_minute_window_stays_separate() {
    let t = 1_000_000u64;
    let spans = vec![
        user_span(0, 1, t),
        user_span(1, 2, t + 30_000),
        user_span(2, 3, t + 100_000),
    ];
    let out = coalesce(&spans);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].range, range(0, 0, 0, 2));
    assert_eq!(out[1].range, range(0, 2, 0, 3));
}

#[test]
fn coalescing_twice_changes_nothing() {
    let t = 1_000_000u64;
    let spans = vec![
        user_span(0, 1, t),
        user_span(1, 2, t + 10),
        user_span(4, 6, t + 20),
    ];
    let once = coalesce(&spans);
    assert_eq!(coalesce(&once), once);
}

#[test]
fn typing_burst_persists_as_one_change() {
    let t0 = 1_700_000_000_000u64;
    let clock = pin_clock_for_tests(t0);
    let workspace = TempWorkspace::new();
    workspace.write_file("src/main.rs", "abc");
    let file = workspace.file_path("src/main.rs");
    let uri = file.to_string_lossy().to_string();

    let tracker = Tracker::new(Config::default());

    // Type "abc" one character at a time, 30 s then 15 s apart.
    let steps = [("a", 0u32, 0u64), ("ab", 1, 30_000), ("abc", 2, 15_000)];
    for (text, at, delay) in steps {
        clock.advance(delay);
        let doc = MemoryDocument::new(&uri, text);
        tracker.on_edit_batch(
            &doc,
            &[Edit::insert_at(pos(0, at), &text[at as usize..at as usize + 1])],
            EditReason::None,
        );
    }

    let doc = MemoryDocument::new(&uri, "abc");
    tracker.on_save(&doc).expect("save");

    let record_dir = workspace.root().join(".tabd/log/src/main.rs");
    let mut files: Vec<_> = fs::read_dir(&record_dir)
        .expect("record dir")
        .map(|e| e.expect("entry").path())
        .collect();
    files.sort();
    assert_eq!(files.len(), 1);

    let record = LogRecord::decode(&fs::read_to_string(&files[0]).expect("read record"))
        .expect("decode record");
    assert_eq!(record.changes.len(), 1);
    let spans = record.spans();
    assert_eq!(spans[0].kind, Provenance::UserEdit);
    assert_eq!(spans[0].range, range(0, 0, 0, 3));
    assert_eq!(spans[0].created_ms.0, t0);
}
