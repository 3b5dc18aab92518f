//! Char-offset view over a UTF-8 document.
//!
//! Every public offset in litground is a char (Unicode scalar value) offset.
//! `SourceText` records the byte position of each char boundary once, so
//! chunking, span arithmetic and context slicing all share one coordinate
//! system and never slice through a multi-byte character.

use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` char interval into a reference text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Shift the span by `offset` chars (chunk-local to document-global).
    /// Returns `None` if either bound overflows.
    pub fn shifted(&self, offset: usize) -> Option<Self> {
        Some(Self {
            start: self.start.checked_add(offset)?,
            end: self.end.checked_add(offset)?,
        })
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A borrowed document with O(1) char-to-byte lookup
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`
    boundaries: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in chars
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte position of a char offset, clamped to the end of the text
    pub fn char_to_byte(&self, offset: usize) -> usize {
        self.boundaries[offset.min(self.char_len())]
    }

    /// Char offset of a byte position. A byte inside a multi-byte char maps
    /// to that char's offset.
    pub fn byte_to_char(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Slice by char offsets. Out-of-range bounds are clamped, so the call
    /// never panics.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let start_byte = self.char_to_byte(start);
        let end_byte = self.char_to_byte(end.max(start));
        &self.text[start_byte..end_byte]
    }

    pub fn slice_span(&self, span: Span) -> &'a str {
        self.slice(span.start, span.end)
    }

    /// Char at a char offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.char_len() {
            return None;
        }
        self.text[self.boundaries[offset]..].chars().next()
    }

    /// First literal occurrence of `needle`, as a char span
    pub fn find(&self, needle: &str) -> Option<Span> {
        if needle.is_empty() {
            return None;
        }
        let byte_start = self.text.find(needle)?;
        Some(self.byte_range_to_span(byte_start, byte_start + needle.len()))
    }

    /// Convert a byte range that lies on char boundaries (e.g. a regex match)
    /// into a char span
    pub fn byte_range_to_span(&self, byte_start: usize, byte_end: usize) -> Span {
        Span::new(self.byte_to_char(byte_start), self.byte_to_char(byte_end))
    }

    /// Char offset of the last whitespace char strictly inside `(lower, upper)`
    pub fn rfind_whitespace(&self, lower: usize, upper: usize) -> Option<usize> {
        let upper = upper.min(self.char_len());
        (lower + 1..upper)
            .rev()
            .find(|&i| self.char_at(i).is_some_and(char::is_whitespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_scalars() {
        let text = SourceText::new("β-catenin → Wnt");
        assert_eq!(text.char_len(), 15);
        assert!(text.as_str().len() > 15);
    }

    #[test]
    fn test_slice_multibyte() {
        let text = SourceText::new("αβγ δεζ");
        assert_eq!(text.slice(0, 3), "αβγ");
        assert_eq!(text.slice(4, 7), "δεζ");
        assert_eq!(text.slice(4, 100), "δεζ");
        assert_eq!(text.slice(5, 2), "");
    }

    #[test]
    fn test_byte_char_conversion() {
        let text = SourceText::new("aé b");
        // 'é' is two bytes
        assert_eq!(text.char_to_byte(2), 3);
        assert_eq!(text.byte_to_char(3), 2);
        assert_eq!(text.byte_to_char(2), 1);
        assert_eq!(text.byte_to_char(text.as_str().len()), 4);
    }

    #[test]
    fn test_find_returns_char_span() {
        let text = SourceText::new("µM dose of 5 µM");
        let span = text.find("5 µM").unwrap();
        assert_eq!(span, Span::new(11, 15));
        assert_eq!(text.slice_span(span), "5 µM");
        assert!(text.find("").is_none());
        assert!(text.find("mM").is_none());
    }

    #[test]
    fn test_rfind_whitespace_is_exclusive() {
        let text = SourceText::new("ab cd ef");
        assert_eq!(text.rfind_whitespace(0, 8), Some(5));
        assert_eq!(text.rfind_whitespace(0, 5), Some(2));
        assert_eq!(text.rfind_whitespace(2, 5), None);
    }

    #[test]
    fn test_span_helpers() {
        let span = Span::new(3, 7);
        assert_eq!(span.len(), 4);
        assert_eq!(span.shifted(10), Some(Span::new(13, 17)));
        assert_eq!(span.shifted(usize::MAX - 5), None);
        assert!(span.overlaps(&Span::new(6, 9)));
        assert!(!span.overlaps(&Span::new(7, 9)));
        assert!(Span::new(4, 4).is_empty());
    }
}
