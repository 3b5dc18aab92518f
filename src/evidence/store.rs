//! Append-only evidence.jsonl storage and drift validation.
//!
//! Each grounded (or ungroundable) extraction becomes one JSON line. Lines are
//! never rewritten; `validate_records` checks whether the stored spans still
//! match a possibly edited document.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;

use crate::text::SourceText;

use super::spans::{compute_evidence_id, compute_hash, compute_slice_hash};
use super::types::{EvidenceRecord, GroundedExtraction, Status};

impl EvidenceRecord {
    /// Build the evidence line for one extraction
    pub fn from_extraction<T: Serialize>(
        document_sha256: &str,
        extraction: &GroundedExtraction<T>,
    ) -> Result<Self> {
        let quote_sha256 = compute_hash(extraction.claimed_quote.as_bytes());
        let span = extraction.evidence.as_ref().map(|e| e.span());
        let id = compute_evidence_id(document_sha256, &quote_sha256, span);

        let (status, slice_sha256) = match &extraction.evidence {
            // Evidence quotes are sliced from the document, so this is the
            // slice hash
            Some(evidence) => (Status::Resolved, Some(compute_hash(evidence.quote.as_bytes()))),
            None => (Status::Unresolved, None),
        };

        let payload =
            serde_json::to_value(&extraction.payload).context("Failed to serialize payload")?;

        Ok(Self {
            id,
            document_sha256: document_sha256.to_string(),
            claimed_quote: extraction.claimed_quote.clone(),
            quote_sha256,
            status,
            evidence: extraction.evidence.clone(),
            slice_sha256,
            payload,
            ts: Utc::now().to_rfc3339(),
        })
    }
}

/// Append records to an evidence.jsonl file with file locking
pub fn append_records(path: &Path, records: &[EvidenceRecord]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open evidence file: {}", path.display()))?;

    // Acquire exclusive lock
    file.lock_exclusive()
        .context("Failed to acquire file lock on evidence file")?;

    let mut file = file;
    for record in records {
        let json = serde_json::to_string(record).context("Failed to serialize evidence")?;
        writeln!(file, "{}", json).context("Failed to write evidence")?;
    }
    file.flush().context("Failed to flush evidence")?;

    // Lock is released when file is dropped
    Ok(())
}

/// Load all records from an evidence.jsonl file
pub fn load_records(path: &Path) -> Result<Vec<EvidenceRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open evidence file: {}", path.display()))?;

    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: EvidenceRecord = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse evidence line: {}", line))?;

        records.push(record);
    }

    Ok(records)
}

/// Outcome of checking stored evidence against a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Document hash matched; per-span checks were skipped
    pub digest_ok: bool,
    pub valid_count: usize,
    /// IDs of records whose span no longer matches the document
    pub stale: Vec<String>,
    pub unresolved_count: usize,
}

impl ValidationReport {
    pub fn stale_count(&self) -> usize {
        self.stale.len()
    }
}

/// Check every resolved record's span against `document`
pub fn validate_records(document: &str, records: &[EvidenceRecord]) -> ValidationReport {
    let document_sha256 = compute_hash(document.as_bytes());
    let text = SourceText::new(document);
    let mut report = ValidationReport {
        digest_ok: true,
        ..Default::default()
    };

    for record in records {
        let unchanged = record.document_sha256 == document_sha256;
        if !unchanged {
            report.digest_ok = false;
        }

        let (Some(evidence), Some(slice_sha256)) = (&record.evidence, &record.slice_sha256) else {
            report.unresolved_count += 1;
            continue;
        };

        // Fast path: unchanged document
        if unchanged {
            report.valid_count += 1;
            continue;
        }

        let span = evidence.span();
        if span.end <= text.char_len() && &compute_slice_hash(&text, span) == slice_sha256 {
            report.valid_count += 1;
        } else {
            report.stale.push(record.id.clone());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::resolver::GroundingResolver;
    use crate::schema::{Container, Grounded};
    use tempfile::TempDir;

    const DOCUMENT: &str = "Results\nThe PRS explained 7.3% of variance in LDL cholesterol.";

    fn records() -> Vec<EvidenceRecord> {
        let container = Container::new(vec![
            Grounded::new(serde_json::json!({"metric": "R2"}), "explained 7.3% of variance"),
            Grounded::new(serde_json::json!({"metric": "AUC"}), "AUC of 0.91 in Finns"),
        ]);
        let resolver = GroundingResolver::default();
        let document_sha256 = compute_hash(DOCUMENT.as_bytes());
        resolver
            .ground_items(DOCUMENT, container, None)
            .iter()
            .map(|e| EvidenceRecord::from_extraction(&document_sha256, e).unwrap())
            .collect()
    }

    #[test]
    fn test_record_fields() {
        let records = records();
        assert_eq!(records[0].status, Status::Resolved);
        assert!(records[0].slice_sha256.is_some());
        assert_eq!(records[0].payload["metric"], "R2");
        assert_eq!(records[1].status, Status::Unresolved);
        assert!(records[1].evidence.is_none());
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_append_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("evidence.jsonl");

        append_records(&path, &records()).unwrap();
        append_records(&path, &records()[..1]).unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].id, loaded[2].id);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(load_records(&temp.path().join("absent.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn test_validate_unchanged_document() {
        let report = validate_records(DOCUMENT, &records());
        assert!(report.digest_ok);
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.unresolved_count, 1);
        assert_eq!(report.stale_count(), 0);
    }

    #[test]
    fn test_validate_unresolved_only_reports_changed_digest() {
        let unresolved: Vec<EvidenceRecord> = records()
            .into_iter()
            .filter(|r| r.status == Status::Unresolved)
            .collect();
        assert_eq!(unresolved.len(), 1);

        let report = validate_records("An entirely different document.", &unresolved);
        assert!(!report.digest_ok);
        assert_eq!(report.unresolved_count, 1);
        assert_eq!(report.valid_count, 0);

        assert!(validate_records(DOCUMENT, &unresolved).digest_ok);
    }

    #[test]
    fn test_validate_detects_drift() {
        let records = records();

        // Appending text keeps existing spans intact
        let appended = format!("{} Discussion follows.", DOCUMENT);
        let report = validate_records(&appended, &records);
        assert!(!report.digest_ok);
        assert_eq!(report.valid_count, 1);

        // Editing before the span shifts it
        let edited = DOCUMENT.replace("Results", "Findings");
        let report = validate_records(&edited, &records);
        assert_eq!(report.stale, vec![records[0].id.clone()]);
    }
}
