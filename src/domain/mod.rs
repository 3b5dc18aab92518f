//! Domain types for litground.
//!
//! This module contains the data produced by chunking:
//! - Chunk: An offset-tagged window of a document
//! - SectionType: The structural label carried by each chunk

pub mod chunk;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkMetadata, SectionType};
