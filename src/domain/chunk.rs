//! Chunks produced from a source document.
//!
//! A chunk is an immutable, offset-tagged window of the document that is sent
//! to the extraction collaborator on its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::text::Span;

/// Coarse structural label of a region of a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
    References,
    /// No header has been seen yet
    Unknown,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Abstract => "abstract",
            SectionType::Introduction => "introduction",
            SectionType::Methods => "methods",
            SectionType::Results => "results",
            SectionType::Discussion => "discussion",
            SectionType::References => "references",
            SectionType::Unknown => "unknown",
        }
    }
}

impl Default for SectionType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abstract" => Ok(SectionType::Abstract),
            "introduction" => Ok(SectionType::Introduction),
            "methods" => Ok(SectionType::Methods),
            "results" => Ok(SectionType::Results),
            "discussion" => Ok(SectionType::Discussion),
            "references" => Ok(SectionType::References),
            "unknown" => Ok(SectionType::Unknown),
            other => Err(format!("Unknown section type: {}", other)),
        }
    }
}

/// Bookkeeping attached to each chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Number of chars in the chunk
    pub char_len: usize,

    /// UTF-8 byte range of the chunk in the source `&str`. Convenience for
    /// Rust callers only; every other offset is a char offset.
    pub byte_start: usize,
    pub byte_end: usize,

    /// Whether a section header was detected in this chunk (as opposed to
    /// the section being inherited from an earlier chunk)
    pub section_detected: bool,
}

/// A contiguous, offset-tagged slice of a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text (exactly the document's chars in `[start_char, end_char)`)
    pub text: String,

    /// Char offset of the first char (inclusive)
    pub start_char: usize,

    /// Char offset past the last char (exclusive)
    pub end_char: usize,

    /// Position in generation order, starting at 0
    pub id: usize,

    /// Section this chunk belongs to
    pub section_type: SectionType,

    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn span(&self) -> Span {
        Span::new(self.start_char, self.end_char)
    }

    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}
