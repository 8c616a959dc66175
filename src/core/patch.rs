//! Range Patcher
//!
//! Applies incremental text edits to a buffer. Positions follow the LSP
//! convention: zero-based lines and UTF-16 code unit columns.

use crate::error::{Error, Result};

/// A zero-based line/character position within a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    pub line: u32,
    pub character: u32,
}

impl TextPosition {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }
}

/// A single change to a document's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the text between two positions.
    Range { range: TextRange, text: String },
    /// Replace the whole document.
    Full { text: String },
}

impl Edit {
    /// Range edits need the current content; full replacements do not.
    pub fn needs_base(&self) -> bool {
        matches!(self, Edit::Range { .. })
    }

    pub fn apply_to(&self, content: &str) -> Result<String> {
        match self {
            Edit::Range { range, text } => apply(content, *range, text),
            Edit::Full { text } => Ok(text.clone()),
        }
    }
}

/// Replace the text covered by `range` with `replacement`.
///
/// Lines keep their original terminators; nothing is normalized. The line
/// just past the last one addresses the end of the buffer, which is what
/// clients send when appending after a trailing newline. Columns beyond the
/// end of a line clamp to the end of that line's content.
pub fn apply(content: &str, range: TextRange, replacement: &str) -> Result<String> {
    if range.end < range.start {
        return Err(Error::InvalidRange {
            line: range.end.line,
            character: range.end.character,
            reason: "range end precedes start",
        });
    }

    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let start = byte_offset(&lines, range.start)?;
    let end = byte_offset(&lines, range.end)?;

    let prefix = &content[..start];
    let suffix = &content[end.max(start)..];

    let mut patched = String::with_capacity(prefix.len() + replacement.len() + suffix.len());
    patched.push_str(prefix);
    patched.push_str(replacement);
    patched.push_str(suffix);
    Ok(patched)
}

fn byte_offset(lines: &[&str], position: TextPosition) -> Result<usize> {
    let index = position.line as usize;
    if index > lines.len() {
        return Err(Error::InvalidRange {
            line: position.line,
            character: position.character,
            reason: "line is past the end of the document",
        });
    }

    let line_start: usize = lines[..index].iter().map(|line| line.len()).sum();
    match lines.get(index) {
        Some(line) => Ok(line_start + column_offset(line, position)?),
        None => Ok(line_start),
    }
}

fn column_offset(line: &str, position: TextPosition) -> Result<usize> {
    let body = match line.strip_suffix('\n') {
        Some(body) => body.strip_suffix('\r').unwrap_or(body),
        None => line,
    };

    let target = position.character as usize;
    let mut units = 0;
    for (offset, ch) in body.char_indices() {
        if units == target {
            return Ok(offset);
        }
        units += ch.len_utf16();
        if units > target {
            return Err(Error::InvalidRange {
                line: position.line,
                character: position.character,
                reason: "character splits a surrogate pair",
            });
        }
    }
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> TextRange {
        TextRange::new(TextPosition::new(sl, sc), TextPosition::new(el, ec))
    }

    #[test]
    fn test_insert_line_before_existing_line() {
        let content = "class Foo\n  def foo\n    1\n  end\nend\n";
        let patched = apply(content, range(2, 0, 2, 0), "  def bar\n").unwrap();
        assert_eq!(patched, "class Foo\n  def foo\n  def bar\n    1\n  end\nend\n");
    }

    #[test]
    fn test_replace_within_line() {
        let patched = apply("def foo\nend\n", range(0, 4, 0, 7), "bar").unwrap();
        assert_eq!(patched, "def bar\nend\n");
    }

    #[test]
    fn test_replace_across_lines() {
        let content = "a\nbb\nccc\ndddd\n";
        let patched = apply(content, range(1, 1, 3, 2), "X\nY").unwrap();
        assert_eq!(patched, "a\nbX\nYdd\n");
    }

    #[test]
    fn test_delete_joins_lines() {
        let patched = apply("one\ntwo\n", range(0, 3, 1, 0), "").unwrap();
        assert_eq!(patched, "onetwo\n");
    }

    #[test]
    fn test_append_after_trailing_newline() {
        let patched = apply("x = 1\n", range(1, 0, 1, 0), "y = 2\n").unwrap();
        assert_eq!(patched, "x = 1\ny = 2\n");
    }

    #[test]
    fn test_insert_into_empty_buffer() {
        let patched = apply("", range(0, 0, 0, 0), "puts 1").unwrap();
        assert_eq!(patched, "puts 1");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let content = "a = 1\r\nb = 2\r\n";
        let patched = apply(content, range(1, 0, 1, 1), "c").unwrap();
        assert_eq!(patched, "a = 1\r\nc = 2\r\n");

        // A column past the end of a CRLF line lands before the terminator
        let patched = apply(content, range(0, 99, 0, 99), "0").unwrap();
        assert_eq!(patched, "a = 10\r\nb = 2\r\n");
    }

    #[test]
    fn test_column_past_line_end_clamps() {
        let patched = apply("ab\ncd\n", range(0, 10, 0, 10), "!").unwrap();
        assert_eq!(patched, "ab!\ncd\n");
    }

    #[test]
    fn test_utf16_columns() {
        // "é" is one UTF-16 unit (two bytes), "😀" is two units (four bytes)
        let content = "é😀x\n";
        let patched = apply(content, range(0, 3, 0, 4), "y").unwrap();
        assert_eq!(patched, "é😀y\n");

        let err = apply(content, range(0, 2, 0, 2), "y").unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_end_line_past_document_is_rejected() {
        let err = apply("a\nb\n", range(0, 0, 5, 0), "").unwrap_err();
        match err {
            Error::InvalidRange { line, .. } => assert_eq!(line, 5),
            other => panic!("expected InvalidRange, got {:?}", other),
        }
    }

    #[test]
    fn test_start_line_past_document_is_rejected() {
        assert!(apply("a\n", range(3, 0, 3, 0), "x").is_err());
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        assert!(apply("abc\ndef\n", range(1, 0, 0, 2), "x").is_err());
    }

    #[test]
    fn test_length_is_consistent() {
        let content = "class Foo\n  def foo\n    1\n  end\nend\n";
        let cases = [
            (range(0, 0, 0, 0), "# comment\n", 0),
            (range(1, 2, 1, 9), "def bar", 7),
            (range(1, 0, 3, 5), "", "  def foo\n    1\n  end".len()),
            (range(4, 0, 5, 0), "end", 4),
        ];

        for (edit_range, text, removed) in cases {
            let patched = apply(content, edit_range, text).unwrap();
            assert_eq!(
                patched.len(),
                content.len() - removed + text.len(),
                "length mismatch for {:?}",
                edit_range
            );
        }
    }

    #[test]
    fn test_full_replacement_matches_spanning_range() {
        let content = "def foo\n  1\nend\n";
        let replacement = "def bar\n  2\nend\n";
        let full = Edit::Full {
            text: replacement.to_string(),
        };
        let spanning = Edit::Range {
            range: range(0, 0, 3, 0),
            text: replacement.to_string(),
        };
        assert_eq!(
            full.apply_to(content).unwrap(),
            spanning.apply_to(content).unwrap()
        );
    }

    #[test]
    fn test_needs_base() {
        assert!(Edit::Range {
            range: TextRange::default(),
            text: String::new()
        }
        .needs_base());
        assert!(!Edit::Full {
            text: String::new()
        }
        .needs_base());
    }
}
