//! Evidence and grounding data types
//!
//! These types describe a resolved quote and the evidence.jsonl schema.

use serde::{Deserialize, Serialize};

use crate::text::Span;

/// Method used to resolve the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Literal match in the full document
    ExactDocument,
    /// Literal match in the chunk the quote was extracted from
    ExactChunk,
    /// Case-insensitive match tolerating whitespace differences
    FlexibleWhitespace,
    /// Longest shared block covering most of the quote
    LongestCommonSubstring,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::ExactDocument => "exact_document",
            ResolutionMethod::ExactChunk => "exact_chunk",
            ResolutionMethod::FlexibleWhitespace => "flexible_whitespace",
            ResolutionMethod::LongestCommonSubstring => "longest_common_substring",
        }
    }

    /// Whether the quote was found verbatim
    pub fn is_exact(&self) -> bool {
        matches!(
            self,
            ResolutionMethod::ExactDocument | ResolutionMethod::ExactChunk
        )
    }
}

/// A quote resolved to its true position in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Document text at the resolved span (never the caller's claim)
    pub quote: String,
    /// Chunk the quote was resolved in; `None` when resolved against the
    /// whole document
    pub source_chunk_id: Option<usize>,
    /// Char offset range [start, end)
    pub start_char: usize,
    pub end_char: usize,
    /// Up to `context_window` chars before the span
    pub context_before: String,
    /// Up to `context_window` chars after the span
    pub context_after: String,
    /// How the span was found
    pub method: ResolutionMethod,
}

impl Evidence {
    pub fn span(&self) -> Span {
        Span::new(self.start_char, self.end_char)
    }
}

/// Which review queue an extraction belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBucket {
    /// Quote located in the source
    Grounded,
    /// Quote could not be located; keep for lower-confidence review
    NeedsReview,
}

/// A caller-owned extraction payload plus its resolved evidence, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedExtraction<T> {
    pub payload: T,
    /// Quote as returned by the extraction collaborator
    pub claimed_quote: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl<T> GroundedExtraction<T> {
    pub fn is_grounded(&self) -> bool {
        self.evidence.is_some()
    }

    pub fn bucket(&self) -> ReviewBucket {
        if self.is_grounded() {
            ReviewBucket::Grounded
        } else {
            ReviewBucket::NeedsReview
        }
    }
}

/// Split extractions into (grounded, needs review), preserving order
pub fn partition_by_grounding<T>(
    extractions: Vec<GroundedExtraction<T>>,
) -> (Vec<GroundedExtraction<T>>, Vec<GroundedExtraction<T>>) {
    extractions.into_iter().partition(|e| e.is_grounded())
}

/// Resolution status of an evidence line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Span found
    Resolved,
    /// No span; the extraction needs review
    Unresolved,
}

/// An evidence line in evidence.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Deterministic evidence ID
    pub id: String,
    /// SHA256 of the whole document at grounding time
    pub document_sha256: String,
    /// Quote as claimed by the extractor
    pub claimed_quote: String,
    /// SHA256 hash of the claimed quote
    pub quote_sha256: String,
    /// Resolution status
    pub status: Status,
    /// Resolved evidence (present if resolved)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    /// SHA256 of the document slice at the span (present if resolved)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_sha256: Option<String>,
    /// Extracted item, minus its quote
    pub payload: serde_json::Value,
    /// Timestamp when evidence was created
    pub ts: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> Evidence {
        Evidence {
            quote: "AUC was 0.85".to_string(),
            source_chunk_id: None,
            start_char: 4,
            end_char: 16,
            context_before: "The ".to_string(),
            context_after: ".".to_string(),
            method: ResolutionMethod::ExactDocument,
        }
    }

    #[test]
    fn test_partition_by_grounding() {
        let extractions = vec![
            GroundedExtraction {
                payload: 1,
                claimed_quote: "AUC was 0.85".to_string(),
                evidence: Some(evidence()),
            },
            GroundedExtraction {
                payload: 2,
                claimed_quote: "invented".to_string(),
                evidence: None,
            },
        ];

        assert_eq!(extractions[1].bucket(), ReviewBucket::NeedsReview);

        let (grounded, review) = partition_by_grounding(extractions);
        assert_eq!(grounded.len(), 1);
        assert_eq!(grounded[0].payload, 1);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].payload, 2);
    }

    #[test]
    fn test_evidence_serialization() {
        let json = serde_json::to_value(evidence()).unwrap();
        assert_eq!(json["method"], "exact_document");
        assert!(json["source_chunk_id"].is_null());
        assert_eq!(evidence().span(), Span::new(4, 16));
    }

    #[test]
    fn test_method_is_exact() {
        assert!(ResolutionMethod::ExactChunk.is_exact());
        assert!(!ResolutionMethod::LongestCommonSubstring.is_exact());
    }
}
