//! Offset/position oracle for a document.
//!
//! The engine never maintains its own text index; the host exposes one
//! through this trait. Offsets and characters are UTF-16 code units, lines
//! are separated by `\n`.

use super::position::{Edit, Position, Range, text_len};

/// Host document capability: uri plus the offset/position oracle.
pub trait TextDocument {
    fn uri(&self) -> &str;

    /// Full document text; hashed for the advisory record checksum.
    fn text(&self) -> String;

    /// Offset of `pos` from the start of the document, clamped to bounds.
    fn offset_at(&self, pos: Position) -> usize;

    /// Position at `offset`, clamped to the document end.
    fn position_at(&self, offset: usize) -> Position;

    /// Text of line `line`, without the trailing newline. Empty when out of
    /// bounds.
    fn line_text(&self, line: u32) -> String;

    fn line_count(&self) -> u32;

    fn end(&self) -> Position {
        self.position_at(usize::MAX)
    }
}

/// In-memory document holding its own line index.
///
/// Backs the synthetic-file path (content known before the host has a
/// buffer) and the test suite.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    uri: String,
    lines: Vec<String>,
}

impl MemoryDocument {
    pub fn new(uri: impl Into<String>, text: &str) -> Self {
        Self {
            uri: uri.into(),
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Apply `edit` to the buffer. Positions are clamped to bounds.
    pub fn apply(&mut self, edit: &Edit) {
        let start = self.offset_at(edit.range.start);
        let end = self.offset_at(edit.range.end);
        let text = self.text();
        let sb = byte_of_utf16_offset(&text, start);
        let eb = byte_of_utf16_offset(&text, end);
        let next = format!("{}{}{}", &text[..sb], edit.text, &text[eb..]);
        self.lines = next.split('\n').map(str::to_string).collect();
    }
}

impl TextDocument for MemoryDocument {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn offset_at(&self, pos: Position) -> usize {
        let mut offset = 0usize;
        for (i, line) in self.lines.iter().enumerate() {
            let len = text_len(line) as usize;
            if i as u32 == pos.line {
                return offset + (pos.character as usize).min(len);
            }
            offset += len + 1;
        }
        offset.saturating_sub(1)
    }

    fn position_at(&self, offset: usize) -> Position {
        let mut remaining = offset;
        let last = self.lines.len().saturating_sub(1);
        for (i, line) in self.lines.iter().enumerate() {
            let len = text_len(line) as usize;
            if remaining <= len || i == last {
                return Position::new(i as u32, remaining.min(len) as u32);
            }
            remaining -= len + 1;
        }
        Position::ZERO
    }

    fn line_text(&self, line: u32) -> String {
        self.lines
            .get(line as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }
}

/// Clamp `range` into the document bounds.
pub fn clamp_range(doc: &dyn TextDocument, range: Range) -> Range {
    let end = doc.end();
    Range::new(range.start.min(end), range.end.min(end))
}

fn byte_of_utf16_offset(s: &str, units: usize) -> usize {
    let mut seen = 0usize;
    for (i, c) in s.char_indices() {
        if seen >= units {
            return i;
        }
        seen += c.len_utf16();
    }
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip_through_positions() {
        let doc = MemoryDocument::new("mem:a", "abc\nde\n\nfgh");
        for offset in 0..=11 {
            let pos = doc.position_at(offset);
            assert_eq!(doc.offset_at(pos), offset, "offset {offset}");
        }
    }

    #[test]
    fn position_clamps_past_document_end() {
        let doc = MemoryDocument::new("mem:a", "abc\nde");
        assert_eq!(doc.position_at(usize::MAX), Position::new(1, 2));
        assert_eq!(doc.end(), Position::new(1, 2));
    }

    #[test]
    fn apply_replaces_and_splits_lines() {
        let mut doc = MemoryDocument::new("mem:a", "abc\ndef");
        doc.apply(&Edit::new(
            Range::new(Position::new(0, 1), Position::new(1, 1)),
            "X\nY",
        ));
        assert_eq!(doc.text(), "aX\nYef");
        assert_eq!(doc.line_count(), 2);
    }

    #[test]
    fn line_text_out_of_bounds_is_empty() {
        let doc = MemoryDocument::new("mem:a", "abc");
        assert_eq!(doc.line_text(0), "abc");
        assert_eq!(doc.line_text(5), "");
    }
}
