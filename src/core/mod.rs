//! Core document processing.
//!
//! This module contains:
//! - Chunker: Overlapping, section-tagged document windows
//! - Sections: Header detection for scientific papers
//! - Safety: Input size limits

pub mod chunker;
pub mod safety;
pub mod sections;

// Re-export commonly used types
pub use chunker::{chunk_document, ChunkConfig, ChunkCursor, ChunkError, ChunkIter, Chunker};
pub use safety::{InputLimits, LimitViolation};
pub use sections::{SectionClassifier, HEADER_SCAN_CHARS};
