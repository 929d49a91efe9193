//! Source code location tracking
//!
//! Spans are byte ranges into a source buffer. Rows and columns are derived
//! on demand from a per-file line-start table, so tokens and AST nodes only
//! carry two integers each.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the source code (line and column, both 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Human-facing form is 1-based
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A byte range in the source code, inclusive start and exclusive end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A span for a single byte
    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos + 1 }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the source text for this span
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// An owned source file: name, full text, and a line-start table for
/// offset → position lookups. One per compiled file; never mutated after
/// load.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Derive the 0-based line/column of a byte offset
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position::new(line as u32, (offset - self.line_starts[line]) as u32)
    }

    /// The full text of a 0-based line, without its trailing newline
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|s| s - 1)
            .unwrap_or(self.text.len());
        Some(&self.text[start..end.max(start)])
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 5);
        let b = Span::new(3, 10);
        let merged = a.merge(b);
        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 10);
    }

    #[test]
    fn test_span_text() {
        let source = "hello world";
        let span = Span::new(0, 5);
        assert_eq!(span.text(source), "hello");
    }

    #[test]
    fn test_position_lookup() {
        let file = SourceFile::new("test.enki", "let a = 1\nlet b = 2\n");
        assert_eq!(file.position(0), Position::new(0, 0));
        assert_eq!(file.position(4), Position::new(0, 4));
        assert_eq!(file.position(10), Position::new(1, 0));
        assert_eq!(file.position(14), Position::new(1, 4));
    }

    #[test]
    fn test_line_extraction() {
        let file = SourceFile::new("test.enki", "first\nsecond\nthird");
        assert_eq!(file.line(0), Some("first"));
        assert_eq!(file.line(1), Some("second"));
        assert_eq!(file.line(2), Some("third"));
        assert_eq!(file.line(3), None);
    }

    #[test]
    fn test_position_display_is_one_based() {
        assert_eq!(Position::new(0, 0).to_string(), "1:1");
    }
}
