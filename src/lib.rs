//! litground - Grounded extraction for scientific literature
//!
//! Splits long papers into overlapping, section-tagged chunks, asks nothing
//! of the extraction collaborator except a verbatim `quote` per item, and then
//! proves each quote against the source text before anything downstream
//! trusts it.
//!
//! # Architecture
//!
//! The system is built around verifiable quotes:
//! - Every chunk carries exact char offsets back into the document
//! - Every extracted item carries the quote it was derived from
//! - Quotes are located exactly first, then by tolerant fallbacks
//! - Items whose quote cannot be located are routed to review
//!
//! # Modules
//!
//! - `core`: Chunking, section detection and input limits
//! - `domain`: Data structures (Chunk, SectionType)
//! - `schema`: Quote-augmented extraction schemas
//! - `evidence`: Grounding, HTML rendering and evidence files
//! - `text`: Char-offset indexing over UTF-8 documents
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Inspect chunk boundaries
//! litground chunk paper.txt --summary
//!
//! # Locate one quote
//! litground locate paper.txt --quote "AUC was 0.85"
//!
//! # Ground a whole extraction response
//! litground evidence ground paper.txt response.json -o evidence.jsonl
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod evidence;
pub mod schema;
pub mod text;

// Re-export main types at crate root for convenience
pub use core::{chunk_document, ChunkConfig, ChunkError, Chunker, SectionClassifier};
pub use domain::{Chunk, SectionType};
pub use evidence::{
    locate, render, Evidence, GroundedExtraction, GroundingConfig, GroundingResolver,
    ResolutionMethod,
};
pub use schema::{Container, ExtractionSchema, Grounded};
pub use text::{SourceText, Span};
