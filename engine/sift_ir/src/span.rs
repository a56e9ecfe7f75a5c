//! Source location spans and line/column rendering.

use std::fmt;

/// Source location span.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from expression start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Create a point span (zero-length).
    #[inline]
    pub const fn point(offset: u32) -> Span {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Convert to a `std::ops::Range`.
    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// Size assertion to prevent accidental regressions
const _: () = assert!(std::mem::size_of::<Span>() == 8);

/// 1-based line and column position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to 1-based line/column positions.
///
/// Built once per source text; lookups binary-search the newline table.
/// Columns count bytes from the line start, which is exact for ASCII and
/// stable (if not glyph-accurate) for multi-byte input.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                // Offsets fit u32: scan() rejects longer inputs first.
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineIndex { line_starts }
    }

    /// Line/column for a byte offset. Offsets past the end clamp to the
    /// final line.
    pub fn line_col(&self, offset: u32) -> LineCol {
        // line_starts[0] == 0, so the partition point is always >= 1.
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = offset - self.line_starts[line];
        LineCol {
            line: u32::try_from(line).unwrap_or(u32::MAX - 1) + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_basic() {
        let span = Span::new(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert_eq!(format!("{span:?}"), "10..20");
    }

    #[test]
    fn span_merge() {
        let a = Span::new(10, 20);
        let b = Span::new(15, 30);
        assert_eq!(a.merge(b), Span::new(10, 30));
    }

    #[test]
    fn span_merge_disjoint() {
        let a = Span::new(20, 30);
        let b = Span::new(0, 10);
        assert_eq!(a.merge(b), Span::new(0, 30));
    }

    #[test]
    fn span_point_is_empty() {
        assert!(Span::point(42).is_empty());
    }

    #[test]
    fn line_index_single_line() {
        let idx = LineIndex::new("a + b");
        assert_eq!(idx.line_col(0), LineCol { line: 1, column: 1 });
        assert_eq!(idx.line_col(4), LineCol { line: 1, column: 5 });
    }

    #[test]
    fn line_index_multi_line() {
        let idx = LineIndex::new("a +\n  b\nc");
        assert_eq!(idx.line_col(0), LineCol { line: 1, column: 1 });
        // First byte after the newline is line 2, column 1.
        assert_eq!(idx.line_col(4), LineCol { line: 2, column: 1 });
        assert_eq!(idx.line_col(6), LineCol { line: 2, column: 3 });
        assert_eq!(idx.line_col(8), LineCol { line: 3, column: 1 });
    }

    #[test]
    fn line_index_offset_at_newline() {
        let idx = LineIndex::new("ab\ncd");
        // The newline byte itself belongs to line 1.
        assert_eq!(idx.line_col(2), LineCol { line: 1, column: 3 });
        assert_eq!(idx.line_col(3), LineCol { line: 2, column: 1 });
    }

    #[test]
    fn line_index_past_end_clamps() {
        let idx = LineIndex::new("ab");
        assert_eq!(idx.line_col(10), LineCol { line: 1, column: 11 });
    }
}
