//! Pattern-based section header detection.
//!
//! Headers are recognised only when they stand alone on a line, optionally
//! numbered (`2.`, `II.`) and optionally followed by a colon. Patterns are
//! tried in a fixed order and the first one that matches anywhere in the
//! window wins.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::domain::SectionType;

/// Number of leading chars of a chunk inspected for a header
pub const HEADER_SCAN_CHARS: usize = 500;

/// Optional numbering in front of a header: "3", "3.", "III."
const NUMBER_PREFIX: &str = r"(?:(?:\d+|[ivx]+)\.?[ \t]+)?";

/// Header alternatives in match order
const DEFAULT_HEADERS: &[(SectionType, &str)] = &[
    (SectionType::Abstract, r"abstract|summary"),
    (SectionType::Introduction, r"introduction|background"),
    (
        SectionType::Methods,
        r"materials[ \t]+and[ \t]+methods|methodology|methods",
    ),
    (SectionType::Results, r"results|findings"),
    (
        SectionType::Discussion,
        r"discussion(?:[ \t]+and[ \t]+conclusions?)?|conclusions?",
    ),
    (SectionType::References, r"references|bibliography"),
];

static DEFAULT_CLASSIFIER: OnceLock<SectionClassifier> = OnceLock::new();

/// Detects which section a text window starts or contains
#[derive(Debug, Clone)]
pub struct SectionClassifier {
    patterns: Vec<(SectionType, Regex)>,
}

impl SectionClassifier {
    /// Build a classifier from `(section, header alternatives)` pairs.
    ///
    /// Each alternative string is wrapped into a case-insensitive whole-line
    /// pattern, so callers only supply the header words.
    pub fn with_headers(headers: &[(SectionType, &str)]) -> Result<Self, regex::Error> {
        let patterns = headers
            .iter()
            .map(|(section, alternatives)| {
                let pattern = format!(
                    r"^[ \t]*{}(?:{})[ \t]*:?[ \t]*\r?$",
                    NUMBER_PREFIX, alternatives
                );
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map(|re| (*section, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Shared classifier with the built-in header set
    pub fn shared() -> &'static SectionClassifier {
        DEFAULT_CLASSIFIER.get_or_init(|| {
            Self::with_headers(DEFAULT_HEADERS).expect("built-in section patterns are valid")
        })
    }

    /// Return the first section whose header appears in `window`, or `None`
    /// when no header is present. `None` is not the same as
    /// `SectionType::Unknown`; the caller decides what an absent header means.
    pub fn classify(&self, window: &str) -> Option<SectionType> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(window))
            .map(|(section, _)| *section)
    }
}

impl Default for SectionClassifier {
    fn default() -> Self {
        Self::shared().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Option<SectionType> {
        SectionClassifier::shared().classify(text)
    }

    #[test]
    fn test_detects_each_header() {
        assert_eq!(classify("Abstract\nWe studied..."), Some(SectionType::Abstract));
        assert_eq!(classify("SUMMARY\n..."), Some(SectionType::Abstract));
        assert_eq!(classify("Background\n..."), Some(SectionType::Introduction));
        assert_eq!(
            classify("Materials and Methods\nSamples were..."),
            Some(SectionType::Methods)
        );
        assert_eq!(classify("Methodology\n"), Some(SectionType::Methods));
        assert_eq!(classify("Findings\n"), Some(SectionType::Results));
        assert_eq!(classify("Conclusions\n"), Some(SectionType::Discussion));
        assert_eq!(classify("Bibliography\n"), Some(SectionType::References));
    }

    #[test]
    fn test_header_must_be_whole_line() {
        assert_eq!(classify("The results of the trial were mixed."), None);
        assert_eq!(classify("see methods section for details"), None);
    }

    #[test]
    fn test_header_mid_window() {
        let text = "the cohort was recruited in 2010.\n\nResults\nThe AUC was 0.85.";
        assert_eq!(classify(text), Some(SectionType::Results));
    }

    #[test]
    fn test_numbered_and_colon_headers() {
        assert_eq!(classify("2. Methods\n"), Some(SectionType::Methods));
        assert_eq!(classify("III. Results:\n"), Some(SectionType::Results));
        assert_eq!(classify("  Discussion  \r\nText"), Some(SectionType::Discussion));
    }

    #[test]
    fn test_first_pattern_wins() {
        // References is later in the window but earlier patterns take priority
        let text = "References\n1. Smith\nIntroduction\n";
        assert_eq!(classify(text), Some(SectionType::Introduction));
    }

    #[test]
    fn test_no_header() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("plain body text with no structure"), None);
    }

    #[test]
    fn test_custom_headers() {
        let classifier =
            SectionClassifier::with_headers(&[(SectionType::Methods, "study design")]).unwrap();
        assert_eq!(classifier.classify("Study Design\n"), Some(SectionType::Methods));
        assert_eq!(classifier.classify("Methods\n"), None);
    }
}
