//! Span utilities for evidence grounding
//!
//! Hashing, whitespace normalisation and offset-to-position conversion shared
//! by the resolver, the evidence store and the CLI.
//!
//! All offsets here are char offsets, matching [`crate::text::SourceText`].

use sha2::{Digest, Sha256};

use crate::text::{SourceText, Span};

/// Collapse runs of whitespace to a single space, trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute SHA256 hash of a byte slice, returning hex string with prefix
///
/// # Returns
/// * String in format "sha256:abc123..."
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Compute the hash of the document text covered by a char span
pub fn compute_slice_hash(document: &SourceText<'_>, span: Span) -> String {
    compute_hash(document.slice_span(span).as_bytes())
}

/// Compute deterministic evidence ID
///
/// Two-tier strategy:
/// - Unresolved: sha256(document_sha256 + quote_sha256)[0:16]
/// - Resolved: sha256(document_sha256 + quote_sha256 + start + end)[0:16]
///
/// # Returns
/// * 16-character hex ID
pub fn compute_evidence_id(document_sha256: &str, quote_sha256: &str, span: Option<Span>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_sha256.as_bytes());
    hasher.update(quote_sha256.as_bytes());

    if let Some(span) = span {
        hasher.update(span.start.to_string().as_bytes());
        hasher.update(span.end.to_string().as_bytes());
    }

    let result = hasher.finalize();
    hex::encode(&result[..8]) // 16 hex chars = 8 bytes
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert a char offset to a 1-indexed line/column position
pub fn offset_to_line_col(document: &SourceText<'_>, offset: usize) -> LineCol {
    let prefix = document.slice(0, offset);

    let line = prefix.matches('\n').count() + 1;

    // Column counts chars from the start of the current line
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = prefix[line_start..].chars().count() + 1;

    LineCol { line, col }
}
