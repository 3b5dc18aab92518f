//! Evidence grounding for extracted claims
//!
//! This module proves that a quote returned by the extraction collaborator
//! actually occurs in the source paper, finds its exact char span, and turns
//! the result into reviewable HTML and auditable evidence lines.
//!
//! # Design Principles
//!
//! - **Ground truth quotes**: Evidence always quotes the document at the
//!   resolved span, never the collaborator's claim.
//! - **Honest unresolved**: A quote that cannot be located yields `None` and
//!   the extraction is routed to review, not dropped.
//! - **Ordered fallbacks**: Exact document, exact chunk, then each fuzzy
//!   matcher in turn.
//! - **Hash verification**: Stored evidence carries slice hashes for drift
//!   detection.
//!
//! # Example
//!
//! ```ignore
//! use litground::evidence::{render, GroundingResolver};
//!
//! let resolver = GroundingResolver::default();
//! if let Some(evidence) = resolver.locate(&paper, &quote, None) {
//!     println!("{}", render(&evidence));
//! }
//! ```

pub mod matchers;
pub mod render;
pub mod resolver;
pub mod spans;
pub mod store;
pub mod types;

pub use matchers::{
    default_matchers, flexible_whitespace_pattern, longest_common_block, FlexibleWhitespace,
    LongestCommonSubstring, QuoteMatcher,
};

pub use render::{escape_html, render, render_document, render_page};

pub use resolver::{locate, ChunkContext, GroundingConfig, GroundingResolver};

pub use spans::{
    compute_evidence_id, compute_hash, compute_slice_hash, normalize_whitespace,
    offset_to_line_col, LineCol,
};

pub use store::{append_records, load_records, validate_records, ValidationReport};

pub use types::{
    partition_by_grounding, Evidence, EvidenceRecord, GroundedExtraction, ResolutionMethod,
    ReviewBucket, Status,
};
