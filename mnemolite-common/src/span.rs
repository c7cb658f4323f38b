//! Source location model: a byte/line range into one file's content.
//!
//! Lines are 1-based and inclusive on both ends (as printed to a user);
//! bytes are 0-based, end-exclusive offsets into the file's raw content.
//! Containment and slicing are the Chunker's and Symbol Path Builder's
//! concern, not this type's — `Span` only ever carries the four numbers
//! and nothing else, so every caller that reasons about overlap does so
//! against the exact fields it needs rather than a generic predicate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_byte,
            end_byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_fields_verbatim() {
        let span = Span::new(3, 9, 40, 120);
        assert_eq!(span.start_line, 3);
        assert_eq!(span.end_line, 9);
        assert_eq!(span.start_byte, 40);
        assert_eq!(span.end_byte, 120);
    }
}
