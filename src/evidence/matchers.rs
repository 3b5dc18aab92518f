//! Fuzzy quote matching strategies.
//!
//! When a claimed quote is not found verbatim, the resolver tries each
//! [`QuoteMatcher`] in order and keeps the first span returned. Strategies
//! are independent of each other and of the resolver's control flow.

use std::fmt;

use regex::RegexBuilder;
use tracing::debug;

use crate::text::{SourceText, Span};

use super::types::ResolutionMethod;

/// Compiled-pattern ceiling for flexible-whitespace regexes
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A strategy for locating a non-verbatim quote in a document
pub trait QuoteMatcher: Send + Sync + fmt::Debug {
    /// Method recorded on evidence found by this matcher
    fn method(&self) -> ResolutionMethod;

    /// Span of the quote in `document`, if this strategy can find it
    fn find(&self, document: &SourceText<'_>, quote: &str) -> Option<Span>;
}

/// Build a regex that matches `quote` with any run of whitespace between
/// its words. Returns `None` for a quote with no words.
pub fn flexible_whitespace_pattern(quote: &str) -> Option<String> {
    let words: Vec<String> = quote.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(r"\s+"))
}

/// Case-insensitive match that tolerates line wraps and collapsed spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexibleWhitespace;

impl QuoteMatcher for FlexibleWhitespace {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::FlexibleWhitespace
    }

    fn find(&self, document: &SourceText<'_>, quote: &str) -> Option<Span> {
        let pattern = flexible_whitespace_pattern(quote)?;
        let re = match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(re) => re,
            Err(e) => {
                debug!(error = %e, "Flexible whitespace pattern rejected");
                return None;
            }
        };

        let m = re.find(document.as_str())?;
        Some(document.byte_range_to_span(m.start(), m.end()))
    }
}

/// Accepts the longest block shared by document and quote when it covers
/// more than `threshold` of the quote's chars.
///
/// Costs O(document × quote) time, so documents longer than
/// `max_document_chars` are skipped outright.
#[derive(Debug, Clone, Copy)]
pub struct LongestCommonSubstring {
    pub threshold: f64,
    pub max_document_chars: Option<usize>,
}

impl Default for LongestCommonSubstring {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            max_document_chars: None,
        }
    }
}

impl QuoteMatcher for LongestCommonSubstring {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::LongestCommonSubstring
    }

    fn find(&self, document: &SourceText<'_>, quote: &str) -> Option<Span> {
        if let Some(limit) = self.max_document_chars {
            if document.char_len() > limit {
                debug!(
                    chars = document.char_len(),
                    limit, "Document too long for longest-common-substring matching"
                );
                return None;
            }
        }

        let doc_chars: Vec<char> = document.as_str().chars().collect();
        let quote_chars: Vec<char> = quote.chars().collect();
        if quote_chars.is_empty() {
            return None;
        }

        let (span, size) = longest_common_block(&doc_chars, &quote_chars)?;
        let ratio = size as f64 / quote_chars.len() as f64;
        debug!(size, ratio, "Longest common block");

        if ratio > self.threshold {
            Some(span)
        } else {
            None
        }
    }
}

/// Longest contiguous block shared by `a` and `b`, as a span into `a` plus
/// its length. Ties resolve to the earliest block in `a`.
pub fn longest_common_block<T: PartialEq>(a: &[T], b: &[T]) -> Option<(Span, usize)> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    // prev[j + 1] = length of the common suffix of a[..i] and b[..=j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    let mut best = 0;
    let mut best_end = 0;

    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            cur[j + 1] = if x == y { prev[j] + 1 } else { 0 };
            if cur[j + 1] > best {
                best = cur[j + 1];
                best_end = i + 1;
            }
        }
        if best == b.len() {
            break;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    if best == 0 {
        return None;
    }
    Some((Span::new(best_end - best, best_end), best))
}

/// The default fuzzy strategies, in the order they are tried
pub fn default_matchers(
    lcs_threshold: f64,
    max_document_chars: Option<usize>,
) -> Vec<Box<dyn QuoteMatcher>> {
    vec![
        Box::new(FlexibleWhitespace),
        Box::new(LongestCommonSubstring {
            threshold: lcs_threshold,
            max_document_chars,
        }),
    ]
}
