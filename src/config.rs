//! Configuration for rollcall.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--registry`), applied by the CLI
//! 2. Environment variables (ROLLCALL_HOME, ROLLCALL_REGISTRY)
//! 3. Config file (.rollcall/config.yaml)
//! 4. Defaults (~/.rollcall)
//!
//! Config file discovery:
//! - Searches current directory and parents for .rollcall/config.yaml
//! - Paths in config file are relative to the project root (the parent of .rollcall/)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::registry::DEFAULT_RECENT;
use crate::domain::DEFAULT_STATUS;
use crate::ingest::FieldTable;

pub mod paths;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// File name of the registry inside the home directory
pub const REGISTRY_FILE: &str = "students_database.json";

/// Input file analyzed when the operator picks the default
pub const DEFAULT_INPUT: &str = "README002.md";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
    /// Per-field label lists replacing the built-in ones
    #[serde(default)]
    pub labels: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to project root)
    pub home: Option<String>,
    /// Registry file (relative to project root)
    pub registry: Option<String>,
    /// Default input file (relative to project root)
    pub default_input: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub default_status: Option<String>,
    pub recent: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Registry file
    pub registry: PathBuf,
    /// File analyzed when the operator chooses the default
    pub default_input: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Status stamped on new registry entries
    pub default_status: String,
    /// How many recent entries stats reports
    pub recent: usize,
    /// Label overrides keyed by field name
    pub labels: HashMap<String, Vec<String>>,
}

impl ResolvedConfig {
    /// Extraction table with any label overrides applied
    pub fn field_table(&self) -> Result<FieldTable> {
        if self.labels.is_empty() {
            return Ok(FieldTable::builtin().clone());
        }
        FieldTable::with_overrides(&self.labels).context("Invalid label overrides in config file")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".rollcall").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge an optional config file with environment overrides and defaults
fn resolve(config_file: Option<(PathBuf, ConfigFile)>, default_home: PathBuf) -> ResolvedConfig {
    let env_home = std::env::var("ROLLCALL_HOME").ok().map(PathBuf::from);
    let env_registry = std::env::var("ROLLCALL_REGISTRY").ok().map(PathBuf::from);

    let Some((config_path, config)) = config_file else {
        let home = env_home.unwrap_or(default_home);
        let registry = env_registry.unwrap_or_else(|| home.join(REGISTRY_FILE));

        return ResolvedConfig {
            home,
            registry,
            default_input: PathBuf::from(DEFAULT_INPUT),
            config_file: None,
            default_status: DEFAULT_STATUS.to_string(),
            recent: DEFAULT_RECENT,
            labels: HashMap::new(),
        };
    };

    // Base directory is the parent of .rollcall/ (i.e., grandparent of config.yaml)
    let base_dir = config_path
        .parent()
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let home = env_home
        .or_else(|| config.paths.home.as_deref().map(|h| resolve_path(&base_dir, h)))
        .unwrap_or(default_home);

    let registry = env_registry
        .or_else(|| config.paths.registry.as_deref().map(|r| resolve_path(&base_dir, r)))
        .unwrap_or_else(|| home.join(REGISTRY_FILE));

    let default_input = config
        .paths
        .default_input
        .as_deref()
        .map(|i| resolve_path(&base_dir, i))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

    let default_status = config
        .registry
        .as_ref()
        .and_then(|r| r.default_status.clone())
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());

    let recent = config
        .registry
        .as_ref()
        .and_then(|r| r.recent)
        .unwrap_or(DEFAULT_RECENT);

    ResolvedConfig {
        home,
        registry,
        default_input,
        config_file: Some(config_path),
        default_status,
        recent,
        labels: config.labels,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".rollcall");

    let config_file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(config_file, default_home))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
