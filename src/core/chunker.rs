//! Overlapping, section-tagged document windows.
//!
//! The chunker walks a document with a fixed-size window, prefers to end each
//! window on a word boundary, and tags every chunk with the most recent
//! section header seen so far. The running section is carried in an explicit
//! [`ChunkCursor`] from one step to the next, so chunking is a pure function
//! of the document and the [`ChunkConfig`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{Chunk, ChunkMetadata, SectionType};
use crate::text::SourceText;

use super::sections::{SectionClassifier, HEADER_SCAN_CHARS};

/// Window size and overlap, both in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chars per chunk (default: 4000)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chars shared by consecutive chunks (default: 200)
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    4000
}
fn default_overlap() -> usize {
    200
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Reject configurations that cannot make progress
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfiguration {
                reason: "chunk_size must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Chunking errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("Invalid chunking configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

/// State threaded from one chunk to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCursor {
    /// Char offset where the next chunk starts
    pub start: usize,
    /// Id the next chunk will get
    pub next_id: usize,
    /// Section inherited by the next chunk if it has no header of its own
    pub current_section: SectionType,
}

impl Default for ChunkCursor {
    fn default() -> Self {
        Self {
            start: 0,
            next_id: 0,
            current_section: SectionType::Unknown,
        }
    }
}

/// Splits documents into overlapping chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
    classifier: SectionClassifier,
}

impl Chunker {
    /// Create a chunker, rejecting a zero `chunk_size`
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        Self::with_classifier(config, SectionClassifier::default())
    }

    pub fn with_classifier(
        config: ChunkConfig,
        classifier: SectionClassifier,
    ) -> Result<Self, ChunkError> {
        config.validate()?;
        if config.overlap >= config.chunk_size {
            warn!(
                chunk_size = config.chunk_size,
                overlap = config.overlap,
                "Overlap is not smaller than chunk size; chunks will not overlap"
            );
        }
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk a whole document
    #[instrument(skip(self, document), fields(bytes = document.len()))]
    pub fn chunk(&self, document: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self.iter(document).collect();
        debug!(count = chunks.len(), "Document chunked");
        chunks
    }

    /// Lazily chunk a document. Each call starts from a fresh cursor.
    pub fn iter<'c, 'a>(&'c self, document: &'a str) -> ChunkIter<'c, 'a> {
        ChunkIter {
            chunker: self,
            text: SourceText::new(document),
            cursor: Some(ChunkCursor::default()),
        }
    }

    /// Produce the chunk starting at `cursor` and the cursor for the next one.
    ///
    /// Returns `None` once the cursor has reached the end of the text.
    pub fn step(&self, text: &SourceText<'_>, cursor: ChunkCursor) -> Option<(Chunk, ChunkCursor)> {
        let len = text.char_len();
        let start = cursor.start;
        if start >= len {
            return None;
        }

        let size = self.config.chunk_size;
        let mut end = (start + size).min(len);

        // Only rewind to whitespace past the window's midpoint; a rewind any
        // further back would leave a tiny chunk.
        if end < len {
            if let Some(boundary) = text.rfind_whitespace(start + size / 2, end) {
                end = boundary;
            }
        }

        let head_end = (start + HEADER_SCAN_CHARS).min(end);
        let detected = self.classifier.classify(text.slice(start, head_end));
        let section_type = detected.unwrap_or(cursor.current_section);

        let chunk = Chunk {
            text: text.slice(start, end).to_string(),
            start_char: start,
            end_char: end,
            id: cursor.next_id,
            section_type,
            metadata: ChunkMetadata {
                char_len: end - start,
                byte_start: text.char_to_byte(start),
                byte_end: text.char_to_byte(end),
                section_detected: detected.is_some(),
            },
        };

        let next_start = if end >= len {
            len
        } else {
            let candidate = end.saturating_sub(self.config.overlap);
            if candidate <= start {
                end
            } else {
                candidate
            }
        };

        let next = ChunkCursor {
            start: next_start,
            next_id: cursor.next_id + 1,
            current_section: section_type,
        };

        Some((chunk, next))
    }
}

/// Iterator over the chunks of one document
pub struct ChunkIter<'c, 'a> {
    chunker: &'c Chunker,
    text: SourceText<'a>,
    cursor: Option<ChunkCursor>,
}

impl Iterator for ChunkIter<'_, '_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let cursor = self.cursor.take()?;
        let (chunk, next) = self.chunker.step(&self.text, cursor)?;
        self.cursor = Some(next);
        Some(chunk)
    }
}

/// Chunk `document` with the given window size and overlap
pub fn chunk_document(
    document: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkError> {
    let chunker = Chunker::new(ChunkConfig::new(chunk_size, overlap))?;
    Ok(chunker.chunk(document))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(document: &str, chunks: &[Chunk], overlap: usize) {
        let text = SourceText::new(document);
        assert_eq!(chunks.first().map(|c| c.start_char), Some(0));
        assert_eq!(chunks.last().map(|c| c.end_char), Some(text.char_len()));

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, i);
            assert!(chunk.end_char > chunk.start_char);
            assert_eq!(chunk.text, text.slice(chunk.start_char, chunk.end_char));
        }

        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert!(next.start_char > prev.start_char, "no forward progress");
            assert!(next.start_char <= prev.end_char, "gap between chunks");
            if prev.end_char - prev.start_char > overlap {
                assert_eq!(prev.end_char - next.start_char, overlap);
            }
        }
    }

    #[test]
    fn test_empty_document() {
        assert!(chunk_document("", 100, 20).unwrap().is_empty());
    }

    #[test]
    fn test_no_trailing_overlap_only_chunk() {
        // The first chunk already reaches the end; no [80, 100) chunk follows
        let document = "x".repeat(100);
        let chunks = chunk_document(&document, 100, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 100));

        let document = "x".repeat(250);
        let chunks = chunk_document(&document, 100, 10).unwrap();
        let spans: Vec<_> = chunks.iter().map(|c| (c.start_char, c.end_char)).collect();
        assert_eq!(spans, vec![(0, 100), (90, 190), (180, 250)]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = chunk_document("some text", 0, 0);
        assert!(matches!(result, Err(ChunkError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks = chunk_document("Short abstract.", 100, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short abstract.");
        assert_eq!(chunks[0].section_type, SectionType::Unknown);
        assert!(!chunks[0].metadata.section_detected);
    }

    #[test]
    fn test_rewinds_to_word_boundary() {
        let document = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = chunk_document(document, 20, 5).unwrap();
        // "alpha beta gamma del" would cut "delta"; the last space inside
        // the window is at 16
        assert_eq!(chunks[0].text, "alpha beta gamma");
        assert_covers(document, &chunks, 5);
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let document = "x".repeat(250);
        let chunks = chunk_document(&document, 100, 10).unwrap();
        assert_eq!(chunks[0].end_char, 100);
        assert_eq!(chunks[1].start_char, 90);
        assert_covers(&document, &chunks, 10);
    }

    #[test]
    fn test_rewind_rejected_before_midpoint() {
        // Only whitespace is at position 3, well before the midpoint of 10
        let document = format!("abc {}", "y".repeat(40));
        let chunks = chunk_document(&document, 20, 4).unwrap();
        assert_eq!(chunks[0].end_char, 20);
        assert_covers(&document, &chunks, 4);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_progresses() {
        let document = "word ".repeat(40);
        let chunks = chunk_document(&document, 10, 10).unwrap();
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_char, pair[0].end_char);
        }
        assert_eq!(chunks.last().map(|c| c.end_char), Some(document.len()));

        let chunks = chunk_document(&document, 10, 50).unwrap();
        assert_eq!(chunks.last().map(|c| c.end_char), Some(document.len()));
    }

    #[test]
    fn test_sticky_section() {
        let abstract_body = "Polygenic scores were evaluated in a large cohort of adults. ".repeat(3);
        let intro_body = "Coronary artery disease remains a leading cause of death. ".repeat(6);
        let document = format!("Abstract\n{}\nIntroduction\n{}", abstract_body, intro_body);

        let chunks = chunk_document(&document, 100, 20).unwrap();
        assert_covers(&document, &chunks, 20);
        assert_eq!(chunks[0].section_type, SectionType::Abstract);

        let intro_idx = chunks
            .iter()
            .position(|c| c.text.lines().any(|l| l.trim() == "Introduction"))
            .unwrap();
        assert!(intro_idx > 0);

        for chunk in &chunks[..intro_idx] {
            assert_eq!(chunk.section_type, SectionType::Abstract);
        }
        assert_eq!(chunks[intro_idx].section_type, SectionType::Introduction);
        assert!(chunks[intro_idx].metadata.section_detected);
        for chunk in &chunks[intro_idx + 1..] {
            assert_eq!(chunk.section_type, SectionType::Introduction);
            assert!(!chunk.metadata.section_detected);
        }
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let document = "Die Größe des Effekts war β = 0.12 für jede Variante. ".repeat(5);
        let chunks = chunk_document(&document, 40, 8).unwrap();
        assert_covers(&document, &chunks, 8);
        for chunk in &chunks {
            assert_eq!(
                &document[chunk.metadata.byte_start..chunk.metadata.byte_end],
                chunk.text
            );
        }
    }

    #[test]
    fn test_step_is_restartable() {
        let chunker = Chunker::new(ChunkConfig::new(30, 5)).unwrap();
        let document = "Results\nThe hazard ratio was 1.4 per standard deviation.";
        let first: Vec<Chunk> = chunker.iter(document).collect();
        let second = chunker.chunk(document);
        assert_eq!(first, second);
    }
}
