//! Quote grounding against the source document.
//!
//! Resolution order for a claimed quote:
//! 1. Exact match in the full document
//! 2. Exact match in the originating chunk, shifted to document offsets
//! 3. Each fuzzy [`QuoteMatcher`] in turn (skipped for quotes under
//!    `min_fuzzy_chars` once whitespace is normalised)
//!
//! The first stage that finds a span wins. The returned [`Evidence`] always
//! quotes the document itself, so drift in the claimed text never leaks
//! through. A quote that cannot be located yields `None`; nothing here
//! returns an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::Chunk;
use crate::schema::Container;
use crate::text::{SourceText, Span};

use super::matchers::{default_matchers, QuoteMatcher};
use super::spans::normalize_whitespace;
use super::types::{Evidence, GroundedExtraction, ResolutionMethod};

/// Grounding settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundingConfig {
    /// Chars of context captured on each side of a span (default: 100)
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Shortest normalised quote eligible for fuzzy matching (default: 10)
    #[serde(default = "default_min_fuzzy_chars")]
    pub min_fuzzy_chars: usize,

    /// Fraction of the quote the longest common block must exceed (default: 0.8)
    #[serde(default = "default_lcs_threshold")]
    pub lcs_threshold: f64,

    /// Documents longer than this skip longest-common-substring matching
    /// (default: 250,000 chars)
    #[serde(default = "default_max_fuzzy_document_chars")]
    pub max_fuzzy_document_chars: Option<usize>,
}

fn default_context_window() -> usize {
    100
}
fn default_min_fuzzy_chars() -> usize {
    10
}
fn default_lcs_threshold() -> f64 {
    0.8
}
fn default_max_fuzzy_document_chars() -> Option<usize> {
    Some(250_000)
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            min_fuzzy_chars: default_min_fuzzy_chars(),
            lcs_threshold: default_lcs_threshold(),
            max_fuzzy_document_chars: default_max_fuzzy_document_chars(),
        }
    }
}

/// The chunk a quote was extracted from
#[derive(Debug, Clone, Copy)]
pub struct ChunkContext<'a> {
    pub id: usize,
    pub text: &'a str,
    /// Char offset of the chunk in the document
    pub offset: usize,
}

impl<'a> From<&'a Chunk> for ChunkContext<'a> {
    fn from(chunk: &'a Chunk) -> Self {
        Self {
            id: chunk.id,
            text: &chunk.text,
            offset: chunk.start_char,
        }
    }
}

/// Locates claimed quotes in a document
#[derive(Debug)]
pub struct GroundingResolver {
    config: GroundingConfig,
    matchers: Vec<Box<dyn QuoteMatcher>>,
}

impl Default for GroundingResolver {
    fn default() -> Self {
        Self::new(GroundingConfig::default())
    }
}

impl GroundingResolver {
    /// Resolver with the default fuzzy strategies
    pub fn new(config: GroundingConfig) -> Self {
        let matchers = default_matchers(config.lcs_threshold, config.max_fuzzy_document_chars);
        Self { config, matchers }
    }

    /// Resolver with a custom, ordered list of fuzzy strategies
    pub fn with_matchers(config: GroundingConfig, matchers: Vec<Box<dyn QuoteMatcher>>) -> Self {
        Self { config, matchers }
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    /// Locate `claimed_quote` in `full_text`
    pub fn locate(
        &self,
        full_text: &str,
        claimed_quote: &str,
        chunk: Option<ChunkContext<'_>>,
    ) -> Option<Evidence> {
        self.locate_in(&SourceText::new(full_text), claimed_quote, chunk)
    }

    /// Locate `claimed_quote` in an already indexed document. Prefer this
    /// when grounding many quotes against one document.
    #[instrument(level = "debug", skip_all, fields(quote_bytes = claimed_quote.len()))]
    pub fn locate_in(
        &self,
        document: &SourceText<'_>,
        claimed_quote: &str,
        chunk: Option<ChunkContext<'_>>,
    ) -> Option<Evidence> {
        if claimed_quote.is_empty() || document.is_empty() {
            return None;
        }

        if let Some(span) = document.find(claimed_quote) {
            return Some(self.build_evidence(document, span, ResolutionMethod::ExactDocument, None));
        }

        if let Some(chunk) = chunk {
            if let Some(span) = self.find_in_chunk(document, claimed_quote, &chunk) {
                return Some(self.build_evidence(
                    document,
                    span,
                    ResolutionMethod::ExactChunk,
                    Some(chunk.id),
                ));
            }
        }

        let normalized_len = normalize_whitespace(claimed_quote).chars().count();
        if normalized_len < self.config.min_fuzzy_chars {
            debug!(normalized_len, "Quote too short for fuzzy matching");
            return None;
        }

        for matcher in &self.matchers {
            match matcher.find(document, claimed_quote) {
                Some(span) if !span.is_empty() && span.end <= document.char_len() => {
                    debug!(method = matcher.method().as_str(), ?span, "Quote resolved");
                    return Some(self.build_evidence(document, span, matcher.method(), None));
                }
                _ => {}
            }
        }

        debug!("Quote could not be grounded");
        None
    }

    /// Ground every item of a collaborator response
    pub fn ground_items<T>(
        &self,
        full_text: &str,
        container: Container<T>,
        chunk: Option<ChunkContext<'_>>,
    ) -> Vec<GroundedExtraction<T>> {
        let document = SourceText::new(full_text);
        container
            .items
            .into_iter()
            .map(|grounded| {
                let (payload, claimed_quote) = grounded.into_parts();
                let evidence = self.locate_in(&document, &claimed_quote, chunk);
                GroundedExtraction {
                    payload,
                    claimed_quote,
                    evidence,
                }
            })
            .collect()
    }

    fn find_in_chunk(
        &self,
        document: &SourceText<'_>,
        claimed_quote: &str,
        chunk: &ChunkContext<'_>,
    ) -> Option<Span> {
        let local = SourceText::new(chunk.text).find(claimed_quote)?;
        let Some(span) = local.shifted(chunk.offset) else {
            debug!(chunk_id = chunk.id, offset = chunk.offset, "Chunk offset overflows");
            return None;
        };
        if span.end > document.char_len() {
            debug!(chunk_id = chunk.id, ?span, "Chunk match falls outside the document");
            return None;
        }
        Some(span)
    }

    fn build_evidence(
        &self,
        document: &SourceText<'_>,
        span: Span,
        method: ResolutionMethod,
        source_chunk_id: Option<usize>,
    ) -> Evidence {
        let window = self.config.context_window;
        Evidence {
            quote: document.slice_span(span).to_string(),
            source_chunk_id,
            start_char: span.start,
            end_char: span.end,
            context_before: document
                .slice(span.start.saturating_sub(window), span.start)
                .to_string(),
            context_after: document
                .slice(span.end, span.end.saturating_add(window))
                .to_string(),
            method,
        }
    }
}

/// Locate a quote with default settings and the given context window
pub fn locate(
    full_text: &str,
    claimed_quote: &str,
    context_window: usize,
    chunk: Option<ChunkContext<'_>>,
) -> Option<Evidence> {
    let config = GroundingConfig {
        context_window,
        ..Default::default()
    };
    GroundingResolver::new(config).locate(full_text, claimed_quote, chunk)
}
