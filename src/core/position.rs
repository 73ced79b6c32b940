//! Document positions, ranges, and the single-edit position rewrite.
//!
//! Positions are `(line, character)` pairs, both zero-based, with character
//! counted in UTF-16 code units per the host convention. Ordering is
//! lexicographic.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const ZERO: Position = Position {
        line: 0,
        character: 0,
    };

    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.character.cmp(&other.character))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A span of positions with `start <= end`. Empty iff `start == end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn empty_at(p: Position) -> Self {
        Self { start: p, end: p }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive containment on both ends.
    pub fn contains(&self, p: Position) -> bool {
        self.start <= p && p <= self.end
    }

    /// True when the ranges overlap or touch at an endpoint.
    pub fn intersects(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// One atomic content change emitted by the host: `range` is the replaced
/// span of the pre-edit document, `text` the replacement (empty for a pure
/// deletion; `range` is empty for a pure insertion).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub range: Range,
    pub text: String,
}

impl Edit {
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert_at(p: Position, text: impl Into<String>) -> Self {
        Self::new(Range::empty_at(p), text)
    }
}

/// UTF-16 code unit length of `s`.
pub fn text_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}

fn len_after_last_newline(s: &str) -> u32 {
    match s.rfind('\n') {
        Some(i) => text_len(&s[i + 1..]),
        None => text_len(s),
    }
}

/// Rewrite `p` to the position it occupies after applying `edit`.
///
/// An edit whose range *ends exactly at* `p` counts as before `p`, so an
/// insertion at `p` pushes `p` rightward. This is deliberate cursor-like
/// behaviour: text typed at a boundary lands before the boundary marker.
pub fn shift(p: Position, edit: &Edit) -> Position {
    let rs = edit.range.start;
    let re = edit.range.end;
    if re > p {
        return p;
    }

    let mut line = p.line;
    let mut character = p.character;

    if rs < re {
        if re.line == line {
            // Signed on purpose: a multi-line deletion can move the column
            // right (re.character < rs.character).
            character = (i64::from(character) - (i64::from(re.character) - i64::from(rs.character)))
                .max(0) as u32;
        }
        line -= re.line - rs.line;
    }

    if !edit.text.is_empty() {
        let newlines = edit.text.matches('\n').count() as u32;
        if rs.line == line {
            if newlines > 0 {
                character = len_after_last_newline(&edit.text) + (character - rs.character);
            } else {
                character += text_len(&edit.text);
            }
        }
        line += newlines;
    }

    Position::new(line, character)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position::new(line, character)
    }

    fn edit(sl: u32, sc: u32, el: u32, ec: u32, text: &str) -> Edit {
        Edit::new(Range::new(pos(sl, sc), pos(el, ec)), text)
    }

    #[test]
    fn edit_strictly_after_leaves_position() {
        assert_eq!(shift(pos(0, 3), &edit(0, 4, 0, 6, "")), pos(0, 3));
        assert_eq!(shift(pos(1, 0), &edit(2, 0, 3, 0, "x")), pos(1, 0));
    }

    #[test]
    fn insertion_at_position_pushes_right() {
        // Before-or-equal rule: range end == p counts as before.
        assert_eq!(shift(pos(0, 3), &edit(0, 3, 0, 3, "ab")), pos(0, 5));
    }

    #[test]
    fn same_line_deletion_shrinks_column() {
        assert_eq!(shift(pos(0, 7), &edit(0, 2, 0, 5, "")), pos(0, 4));
    }

    #[test]
    fn multi_line_deletion_joins_lines() {
        // "abcde\nfg|hij" with [0:5,1:2] deleted puts p after "abcde".
        assert_eq!(shift(pos(1, 3), &edit(0, 5, 1, 2, "")), pos(0, 6));
    }

    #[test]
    fn multi_line_insertion_rewrites_column() {
        assert_eq!(shift(pos(0, 4), &edit(0, 2, 0, 2, "x\nyz")), pos(1, 4));
    }

    #[test]
    fn replacement_applies_deletion_then_insertion() {
        assert_eq!(shift(pos(0, 8), &edit(0, 2, 0, 5, "Q")), pos(0, 6));
    }

    #[test]
    fn chained_shifts_never_go_negative() {
        let mut p = pos(0, 2);
        p = shift(p, &edit(0, 0, 0, 2, ""));
        p = shift(p, &edit(0, 0, 0, 0, ""));
        assert_eq!(p, pos(0, 0));
    }

    #[test]
    fn utf16_lengths_count_surrogate_pairs() {
        assert_eq!(text_len("a\u{1F600}b"), 4);
        assert_eq!(shift(pos(0, 1), &edit(0, 0, 0, 0, "\u{1F600}")), pos(0, 3));
    }
}
