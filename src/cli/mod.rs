//! Command-line interface for litground.
//!
//! Provides commands for chunking papers, locating single quotes, printing
//! quote-augmented extraction schemas, and managing evidence files.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use crate::config::{self, ResolvedConfig};
use crate::core::{ChunkConfig, Chunker};
use crate::domain::Chunk;
use crate::evidence::{self as ev, ChunkContext, GroundingResolver};
use crate::schema;
use crate::text::SourceText;

pub mod evidence;

/// litground - Grounded extraction for scientific literature
#[derive(Parser, Debug)]
#[command(name = "litground")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Chunking flags shared by several commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChunkArgs {
    /// Chunk size in chars (overrides config)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between chunks in chars (overrides config)
    #[arg(long)]
    pub overlap: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a document into overlapping, section-tagged chunks
    Chunk {
        /// Document to chunk ("-" reads stdin)
        document: PathBuf,

        #[command(flatten)]
        chunking: ChunkArgs,

        /// Print a table instead of JSON lines
        #[arg(long)]
        summary: bool,
    },

    /// Locate a single quote in a document
    Locate {
        /// Document to search ("-" reads stdin)
        document: PathBuf,

        /// Claimed quote
        #[arg(short, long)]
        quote: String,

        /// Chunk the quote was extracted from
        #[arg(long)]
        chunk_id: Option<usize>,

        #[command(flatten)]
        chunking: ChunkArgs,

        /// Context chars on each side (overrides config)
        #[arg(long)]
        context_window: Option<usize>,

        /// Print an HTML snippet instead of JSON
        #[arg(long)]
        html: bool,
    },

    /// Print a JSON schema augmented with the required quote field
    Schema {
        /// Item JSON schema file
        schema: PathBuf,

        /// Wrap the item schema in the {items: [...]} response envelope
        #[arg(long)]
        container: bool,
    },

    /// Show resolved configuration (debug)
    Config,

    /// Ground extraction responses and manage evidence files
    Evidence {
        #[command(subcommand)]
        command: evidence::EvidenceCommands,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Chunk {
                document,
                chunking,
                summary,
            } => chunk_command(&document, &chunking, summary).await,
            Commands::Locate {
                document,
                quote,
                chunk_id,
                chunking,
                context_window,
                html,
            } => locate_command(&document, &quote, chunk_id, &chunking, context_window, html).await,
            Commands::Schema { schema, container } => schema_command(&schema, container).await,
            Commands::Config => show_config(),
            Commands::Evidence { command } => evidence::execute(command).await,
        }
    }
}

/// Read a document from a file, or stdin for "-"
pub(crate) async fn read_document(path: &Path) -> Result<String> {
    let text = if path == Path::new("-") {
        if io::stdin().is_terminal() {
            anyhow::bail!("No input provided. Pass a file or pipe to stdin");
        }
        read_all(tokio::io::stdin())
            .await
            .context("Failed to read from stdin")?
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document: {}", path.display()))?
    };

    config::config()?.limits.validate_document(&text)?;
    Ok(text)
}

/// Read an async source to the end as UTF-8
async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<String> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer).await?;
    Ok(buffer)
}

/// Merge chunking flags over the configured defaults
pub(crate) fn chunk_config(args: &ChunkArgs, config: &ResolvedConfig) -> ChunkConfig {
    ChunkConfig {
        chunk_size: args.chunk_size.unwrap_or(config.chunking.chunk_size),
        overlap: args.overlap.unwrap_or(config.chunking.overlap),
    }
}

/// Regenerate the chunk with the given id
pub(crate) fn find_chunk(document: &str, args: &ChunkArgs, chunk_id: usize) -> Result<Chunk> {
    let chunker = Chunker::new(chunk_config(args, config::config()?))?;
    chunker
        .iter(document)
        .find(|c| c.id == chunk_id)
        .with_context(|| format!("Chunk {} not found in document", chunk_id))
}

async fn chunk_command(path: &Path, args: &ChunkArgs, summary: bool) -> Result<()> {
    let document = read_document(path).await?;
    let chunker = Chunker::new(chunk_config(args, config::config()?))?;
    let chunks = chunker.chunk(&document);
    info!(chunks = chunks.len(), "Chunked {}", path.display());

    if summary {
        println!("{:<6} {:<10} {:<10} {:<14} HEADER", "ID", "START", "END", "SECTION");
        println!("{}", "-".repeat(50));
        for chunk in &chunks {
            println!(
                "{:<6} {:<10} {:<10} {:<14} {}",
                chunk.id,
                chunk.start_char,
                chunk.end_char,
                chunk.section_type,
                if chunk.metadata.section_detected { "yes" } else { "" }
            );
        }
        return Ok(());
    }

    for chunk in &chunks {
        println!("{}", serde_json::to_string(chunk)?);
    }
    Ok(())
}

async fn locate_command(
    path: &Path,
    quote: &str,
    chunk_id: Option<usize>,
    args: &ChunkArgs,
    context_window: Option<usize>,
    html: bool,
) -> Result<()> {
    let document = read_document(path).await?;
    let config = config::config()?;
    config.limits.validate_quote(quote)?;

    let chunk = chunk_id
        .map(|id| find_chunk(&document, args, id))
        .transpose()?;

    let mut grounding = config.grounding;
    if let Some(window) = context_window {
        grounding.context_window = window;
    }

    let resolver = GroundingResolver::new(grounding);
    let evidence = resolver
        .locate(&document, quote, chunk.as_ref().map(ChunkContext::from))
        .context("Quote could not be grounded in the document")?;

    let position = ev::offset_to_line_col(&SourceText::new(&document), evidence.start_char);
    eprintln!(
        "Found via {} at line {}, col {} (chars {}-{})",
        evidence.method.as_str(),
        position.line,
        position.col,
        evidence.start_char,
        evidence.end_char
    );

    if html {
        println!("{}", ev::render(&evidence));
    } else {
        println!("{}", serde_json::to_string_pretty(&evidence)?);
    }
    Ok(())
}

async fn schema_command(path: &Path, container: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    let item: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse schema file: {}", path.display()))?;

    let augmented = if container {
        schema::container_json_schema(&item)?
    } else {
        schema::augment_json_schema(&item)?
    };

    println!("{}", serde_json::to_string_pretty(&augmented)?);
    Ok(())
}

fn show_config() -> Result<()> {
    let config = config::config()?;

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!();
    println!("Chunking:");
    println!("  chunk_size: {}", config.chunking.chunk_size);
    println!("  overlap:    {}", config.chunking.overlap);
    println!();
    println!("Grounding:");
    println!("  context_window:  {}", config.grounding.context_window);
    println!("  min_fuzzy_chars: {}", config.grounding.min_fuzzy_chars);
    println!("  lcs_threshold:   {}", config.grounding.lcs_threshold);
    match config.grounding.max_fuzzy_document_chars {
        Some(limit) => println!("  max_fuzzy_document_chars: {}", limit),
        None => println!("  max_fuzzy_document_chars: (unlimited)"),
    }
    println!();
    println!("Limits:");
    println!("  max_document_chars: {}", config.limits.max_document_chars);
    println!("  max_quote_chars:    {}", config.limits.max_quote_chars);

    Ok(())
}
