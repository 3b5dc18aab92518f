//! Input size limits.
//!
//! The grounding fallbacks are quadratic in the worst case, so documents and
//! quotes are checked against configurable ceilings before any work is done:
//! - Maximum document length
//! - Maximum claimed quote length

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits applied to caller input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum document length in chars (default: 2,000,000)
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,

    /// Maximum claimed quote length in chars (default: 10,000)
    #[serde(default = "default_max_quote_chars")]
    pub max_quote_chars: usize,
}

fn default_max_document_chars() -> usize {
    2_000_000
}
fn default_max_quote_chars() -> usize {
    10_000
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_document_chars: default_max_document_chars(),
            max_quote_chars: default_max_quote_chars(),
        }
    }
}

impl InputLimits {
    /// Validate a document against the length limit
    pub fn validate_document(&self, document: &str) -> Result<(), LimitViolation> {
        let size = document.chars().count();
        if size > self.max_document_chars {
            return Err(LimitViolation::DocumentTooLong {
                actual: size,
                limit: self.max_document_chars,
            });
        }
        Ok(())
    }

    /// Validate a claimed quote against the length limit
    pub fn validate_quote(&self, quote: &str) -> Result<(), LimitViolation> {
        let size = quote.chars().count();
        if size > self.max_quote_chars {
            return Err(LimitViolation::QuoteTooLong {
                actual: size,
                limit: self.max_quote_chars,
            });
        }
        Ok(())
    }
}

/// Limit violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Document too long: {actual} chars > {limit}")]
    DocumentTooLong { actual: usize, limit: usize },

    #[error("Quote too long: {actual} chars > {limit}")]
    QuoteTooLong { actual: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = InputLimits::default();
        assert_eq!(limits.max_document_chars, 2_000_000);
        assert_eq!(limits.max_quote_chars, 10_000);
    }

    #[test]
    fn test_document_validation_counts_chars() {
        let limits = InputLimits {
            max_document_chars: 4,
            ..Default::default()
        };

        // Four chars, eight bytes
        assert!(limits.validate_document("αβγδ").is_ok());

        let result = limits.validate_document("αβγδε");
        assert_eq!(
            result,
            Err(LimitViolation::DocumentTooLong {
                actual: 5,
                limit: 4
            })
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let limits: InputLimits = serde_yaml::from_str("max_quote_chars: 50").unwrap();
        assert_eq!(limits.max_quote_chars, 50);
        assert_eq!(limits.max_document_chars, 2_000_000);
    }
}
