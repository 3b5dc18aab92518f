//! Configuration for litground.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LITGROUND_CHUNK_SIZE, LITGROUND_OVERLAP,
//!    LITGROUND_CONTEXT_WINDOW, LITGROUND_MAX_DOCUMENT_CHARS)
//! 2. Project config file (.litground/config.yaml)
//! 3. User config file (~/.litground/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .litground/config.yaml
//! - Falls back to the user's home directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{ChunkConfig, InputLimits};
use crate::evidence::GroundingConfig;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".litground";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub chunking: Option<ChunkConfig>,
    #[serde(default)]
    pub grounding: Option<GroundingConfig>,
    #[serde(default)]
    pub limits: Option<InputLimits>,
}

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub chunking: ChunkConfig,
    pub grounding: GroundingConfig,
    pub limits: InputLimits,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Read a numeric environment override
fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {}", name, value)),
        Err(_) => Ok(None),
    }
}

/// Apply environment overrides on top of file/default settings
fn apply_env_overrides(config: &mut ResolvedConfig) -> Result<()> {
    if let Some(chunk_size) = env_usize("LITGROUND_CHUNK_SIZE")? {
        config.chunking.chunk_size = chunk_size;
    }
    if let Some(overlap) = env_usize("LITGROUND_OVERLAP")? {
        config.chunking.overlap = overlap;
    }
    if let Some(window) = env_usize("LITGROUND_CONTEXT_WINDOW")? {
        config.grounding.context_window = window;
    }
    if let Some(max_chars) = env_usize("LITGROUND_MAX_DOCUMENT_CHARS")? {
        config.limits.max_document_chars = max_chars;
    }
    Ok(())
}

/// Build a resolved config from an optional config file
fn resolve(config_file: Option<PathBuf>) -> Result<ResolvedConfig> {
    let mut resolved = match config_file {
        Some(path) => {
            let file = load_config_file(&path)?;
            ResolvedConfig {
                chunking: file.chunking.unwrap_or_default(),
                grounding: file.grounding.unwrap_or_default(),
                limits: file.limits.unwrap_or_default(),
                config_file: Some(path),
            }
        }
        None => ResolvedConfig::default(),
    };

    apply_env_overrides(&mut resolved)?;
    resolved
        .chunking
        .validate()
        .context("Invalid chunking configuration")?;

    Ok(resolved)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    resolve(find_config_file())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Load configuration from an explicit file, ignoring discovery
pub fn config_from_file(path: &Path) -> Result<ResolvedConfig> {
    resolve(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "{}", contents).unwrap();
        (temp, config_path)
    }

    #[test]
    fn test_config_file_parsing() {
        let (_temp, path) = write_config(
            r#"
version: "1.0"
chunking:
  chunk_size: 2000
  overlap: 150
grounding:
  context_window: 60
  lcs_threshold: 0.9
  max_fuzzy_document_chars: null
limits:
  max_quote_chars: 500
"#,
        );

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.chunking, Some(ChunkConfig::new(2000, 150)));

        let grounding = config.grounding.unwrap();
        assert_eq!(grounding.context_window, 60);
        assert_eq!(grounding.lcs_threshold, 0.9);
        assert_eq!(grounding.min_fuzzy_chars, 10);
        assert_eq!(grounding.max_fuzzy_document_chars, None);

        let limits = config.limits.unwrap();
        assert_eq!(limits.max_quote_chars, 500);
        assert_eq!(limits.max_document_chars, 2_000_000);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let (_temp, path) = write_config("version: \"1.0\"");
        let config = load_config_file(&path).unwrap();
        assert!(config.chunking.is_none());
        assert!(config.grounding.is_none());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let (_temp, path) = write_config(
            r#"
version: "1.0"
chunking:
  chunk_size: 0
"#,
        );
        let err = resolve(Some(path)).unwrap_err();
        assert!(format!("{:#}", err).contains("chunk_size must be positive"));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let (_temp, path) = write_config("chunking: [unterminated");
        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
