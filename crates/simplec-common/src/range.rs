//! Source ranges as carried across the parser→core contract (§6).
//!
//! Unlike `tsz`'s byte-offset `Span`, the Simple AST contract is defined in
//! terms of 1-based, inclusive line/column pairs (`FileRange`) — this
//! matches `yaram/simple-compiler`'s `FileRange` and is what every
//! declaration, statement and expression in `simplec-ast` carries.

use serde::{Deserialize, Serialize};

/// A 1-based, inclusive source range within a single file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRange {
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl FileRange {
    pub const fn new(first_line: u32, first_column: u32, last_line: u32, last_column: u32) -> Self {
        FileRange {
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// A synthetic range for compiler-generated nodes (e.g. default-typed literals).
    pub const fn synthetic() -> Self {
        FileRange::new(0, 0, 0, 0)
    }

    /// True if `(line, column)` (both 1-based) falls within this range, inclusive.
    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line < self.first_line || line > self.last_line {
            return false;
        }
        if line == self.first_line && column < self.first_column {
            return false;
        }
        if line == self.last_line && column > self.last_column {
            return false;
        }
        true
    }

    /// The number of source lines a narrower range spans, used to prefer the
    /// narrowest containing range when several nodes' ranges overlap at a point.
    pub fn span_size(&self) -> (u32, u32) {
        let lines = self.last_line.saturating_sub(self.first_line);
        let cols = if lines == 0 {
            self.last_column.saturating_sub(self.first_column)
        } else {
            u32::MAX
        };
        (lines, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_single_line() {
        let r = FileRange::new(3, 5, 3, 10);
        assert!(r.contains(3, 5));
        assert!(r.contains(3, 10));
        assert!(r.contains(3, 7));
        assert!(!r.contains(3, 4));
        assert!(!r.contains(3, 11));
        assert!(!r.contains(2, 7));
    }

    #[test]
    fn contains_multi_line() {
        let r = FileRange::new(3, 5, 5, 2);
        assert!(r.contains(4, 100));
        assert!(r.contains(3, 5));
        assert!(!r.contains(3, 4));
        assert!(r.contains(5, 2));
        assert!(!r.contains(5, 3));
    }

    #[test]
    fn narrower_range_wins() {
        let outer = FileRange::new(1, 1, 1, 20);
        let inner = FileRange::new(1, 5, 1, 8);
        assert!(inner.span_size() < outer.span_size());
    }
}
