//! Evidence CLI subcommands for grounding and validating extractions.
//!
//! Provides commands to:
//! - `ground`: Resolve every quote in an extraction response
//! - `show`: Display one evidence record with its source position
//! - `validate`: Verify stored evidence against the current document

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config;
use crate::domain::Chunk;
use crate::evidence::{
    append_records, compute_hash, load_records, offset_to_line_col, partition_by_grounding,
    render_page, validate_records, ChunkContext, Evidence, EvidenceRecord, GroundedExtraction,
    GroundingResolver,
};
use crate::schema::{Container, Grounded};
use crate::text::SourceText;

use super::{find_chunk, read_document, ChunkArgs};

/// Item payloads are kept as raw JSON objects
type Item = Map<String, Value>;

/// Evidence-related subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Ground every quote in an extraction response ({"items": [...]})
    Ground {
        /// Source document
        document: PathBuf,

        /// Extraction response JSON
        response: PathBuf,

        /// Chunk the response was extracted from
        #[arg(long)]
        chunk_id: Option<usize>,

        #[command(flatten)]
        chunking: ChunkArgs,

        /// Append evidence lines here instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an HTML review page
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Show details of an evidence record
    Show {
        /// Evidence file (evidence.jsonl)
        evidence: PathBuf,

        /// Evidence ID (prefix match)
        evidence_id: String,

        /// Source document, for line/column and snippet output
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Validate stored evidence against the current document
    Validate {
        /// Source document
        document: PathBuf,

        /// Evidence file (evidence.jsonl)
        evidence: PathBuf,
    },
}

/// Execute evidence subcommands
pub async fn execute(command: EvidenceCommands) -> Result<()> {
    match command {
        EvidenceCommands::Ground {
            document,
            response,
            chunk_id,
            chunking,
            output,
            html,
        } => {
            execute_ground(
                &document,
                &response,
                chunk_id,
                &chunking,
                output.as_deref(),
                html.as_deref(),
            )
            .await
        }
        EvidenceCommands::Show {
            evidence,
            evidence_id,
            document,
        } => execute_show(&evidence, &evidence_id, document.as_deref()).await,
        EvidenceCommands::Validate { document, evidence } => {
            execute_validate(&document, &evidence).await
        }
    }
}

/// Resolve all items concurrently, one blocking task per quote
async fn ground_concurrently(
    document: Arc<str>,
    items: Vec<Grounded<Item>>,
    chunk: Option<Chunk>,
    resolver: Arc<GroundingResolver>,
) -> Result<Vec<GroundedExtraction<Item>>> {
    let limits = config::config()?.limits;
    let chunk = Arc::new(chunk);
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let document = Arc::clone(&document);
        let chunk = Arc::clone(&chunk);
        let resolver = Arc::clone(&resolver);

        tasks.spawn_blocking(move || {
            let (payload, claimed_quote) = item.into_parts();
            let evidence = match limits.validate_quote(&claimed_quote) {
                Ok(()) => {
                    let context = Option::as_ref(&*chunk).map(ChunkContext::from);
                    resolver.locate(&document, &claimed_quote, context)
                }
                Err(e) => {
                    warn!(index, "Skipping quote: {}", e);
                    None
                }
            };
            (
                index,
                GroundedExtraction {
                    payload,
                    claimed_quote,
                    evidence,
                },
            )
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Grounding task failed")?);
    }
    results.sort_by_key(|(index, _)| *index);

    Ok(results.into_iter().map(|(_, extraction)| extraction).collect())
}

/// Execute the `evidence ground` command
async fn execute_ground(
    document_path: &Path,
    response_path: &Path,
    chunk_id: Option<usize>,
    chunking: &ChunkArgs,
    output: Option<&Path>,
    html: Option<&Path>,
) -> Result<()> {
    let document = read_document(document_path).await?;
    let raw = tokio::fs::read_to_string(response_path)
        .await
        .with_context(|| format!("Failed to read response: {}", response_path.display()))?;
    let container = Container::<Item>::from_json(&raw)
        .with_context(|| format!("Failed to parse response: {}", response_path.display()))?;

    let chunk = chunk_id
        .map(|id| find_chunk(&document, chunking, id))
        .transpose()?;

    let resolver = Arc::new(GroundingResolver::new(config::config()?.grounding));
    let document_sha256 = compute_hash(document.as_bytes());
    let document: Arc<str> = Arc::from(document);

    info!(items = container.len(), "Grounding extraction response");
    let extractions =
        ground_concurrently(Arc::clone(&document), container.items, chunk, resolver).await?;

    let records = extractions
        .iter()
        .map(|e| EvidenceRecord::from_extraction(&document_sha256, e))
        .collect::<Result<Vec<_>>>()?;

    match output {
        Some(path) => {
            append_records(path, &records)?;
            eprintln!("Appended {} evidence lines to {}", records.len(), path.display());
        }
        None => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }

    let (grounded, review) = partition_by_grounding(extractions);

    if let Some(path) = html {
        let evidence: Vec<Evidence> = grounded.iter().filter_map(|e| e.evidence.clone()).collect();
        let title = document_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        tokio::fs::write(path, render_page(&title, &document, &evidence))
            .await
            .with_context(|| format!("Failed to write HTML: {}", path.display()))?;
        eprintln!("Wrote review page to {}", path.display());
    }

    let mut by_method: BTreeMap<&str, usize> = BTreeMap::new();
    for evidence in grounded.iter().filter_map(|e| e.evidence.as_ref()) {
        *by_method.entry(evidence.method.as_str()).or_default() += 1;
    }

    eprintln!();
    eprintln!("Summary:");
    eprintln!("  Grounded:     {}", grounded.len());
    for (method, count) in &by_method {
        eprintln!("    {:<26} {}", method, count);
    }
    eprintln!("  Needs review: {}", review.len());
    for extraction in &review {
        eprintln!("    \"{}\"", extraction.claimed_quote);
    }

    Ok(())
}

/// Execute the `evidence show` command
async fn execute_show(
    evidence_path: &Path,
    evidence_id: &str,
    document_path: Option<&Path>,
) -> Result<()> {
    let records = load_records(evidence_path)?;
    let record = records
        .iter()
        .find(|r| r.id.starts_with(evidence_id) || evidence_id.starts_with(&r.id))
        .with_context(|| format!("Evidence not found: {}", evidence_id))?;

    println!("Evidence ID: {}", record.id);
    println!("Status:      {:?}", record.status);
    println!("Timestamp:   {}", record.ts);
    println!();
    println!("Payload:");
    println!("  {}", serde_json::to_string(&record.payload)?);
    println!();
    println!("Claimed quote:");
    println!("  \"{}\"", record.claimed_quote);
    println!("  (SHA256: {})", record.quote_sha256);

    let Some(evidence) = &record.evidence else {
        println!();
        println!("(No span - evidence is unresolved)");
        return Ok(());
    };

    println!();
    println!("Source Location:");
    println!("  Chars:  {} - {}", evidence.start_char, evidence.end_char);
    println!("  Method: {}", evidence.method.as_str());
    if let Some(chunk_id) = evidence.source_chunk_id {
        println!("  Chunk:  {}", chunk_id);
    }

    if let Some(path) = document_path {
        let document = read_document(path).await?;
        let text = SourceText::new(&document);
        let position = offset_to_line_col(&text, evidence.start_char);
        println!("  Position: line {}, col {}", position.line, position.col);

        println!();
        println!("Snippet:");
        println!("  ---");
        let snippet = text.slice(evidence.start_char, evidence.end_char);
        for line in snippet.lines().take(5) {
            println!("  {}", line);
        }
        if snippet.lines().count() > 5 {
            println!("  ...");
        }
        println!("  ---");
    } else {
        println!();
        println!("Quote:");
        println!("  \"{}\"", evidence.quote);
    }

    Ok(())
}

/// Execute the `evidence validate` command
async fn execute_validate(document_path: &Path, evidence_path: &Path) -> Result<()> {
    let document = read_document(document_path).await?;
    let records = load_records(evidence_path)?;

    println!("Validating evidence for: {}", document_path.display());
    println!();

    if records.is_empty() {
        println!("No evidence found in {}", evidence_path.display());
        return Ok(());
    }

    let report = validate_records(&document, &records);

    if report.digest_ok {
        println!("Digest: OK (fast-path - skipping per-span checks)");
    } else {
        println!("Digest: CHANGED (checked individual spans)");
        for id in &report.stale {
            println!("    STALE: {}", id);
        }
    }

    println!();
    println!("Summary:");
    println!("  Total evidence: {}", records.len());
    println!("  Valid:          {}", report.valid_count);
    println!("  Stale:          {}", report.stale_count());
    println!("  Unresolved:     {}", report.unresolved_count);

    if report.stale_count() > 0 {
        println!();
        println!("Some evidence needs re-grounding due to document changes.");
    }

    Ok(())
}
