//! Source location tracking for diagnostics and reports.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A position in source code (line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of file
    pub offset: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Create a location at the start of a file.
    pub fn start() -> Self {
        Self { line: 1, column: 1, offset: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span in source code (start and end positions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed, exclusive)
    pub end_column: usize,
    /// Byte offset of the first character
    pub start_offset: usize,
    /// Byte offset one past the last character
    pub end_offset: usize,
}

impl Span {
    /// Create a new span without byte offsets.
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Create a span from start and end locations.
    pub fn from_locations(start: SourceLocation, end: SourceLocation) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }

    /// Span for nodes with no source text.
    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn is_dummy(&self) -> bool {
        self.start_line == 0 && self.end_line == 0
    }

    pub fn start(&self) -> SourceLocation {
        SourceLocation::new(self.start_line, self.start_column, self.start_offset)
    }

    pub fn end(&self) -> SourceLocation {
        SourceLocation::new(self.end_line, self.end_column, self.end_offset)
    }

    /// Merge two spans to create a span covering both.
    pub fn merge(&self, other: &Span) -> Span {
        if self.is_dummy() {
            return *other;
        }
        if other.is_dummy() {
            return *self;
        }
        let start = if self.start_offset <= other.start_offset { self.start() } else { other.start() };
        let end = if self.end_offset >= other.end_offset { self.end() } else { other.end() };
        Span::from_locations(start, end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            )
        }
    }
}

/// Line index over a source text.
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Create a new source map.
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { source, line_starts }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the text for a span, or `None` if its offsets fall outside the source.
    pub fn span_text(&self, span: &Span) -> Option<&str> {
        self.source.get(span.start_offset..span.end_offset)
    }

    /// Get a line of source code (1-indexed).
    pub fn line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 || line_number > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_number - 1];
        let end = self.line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
