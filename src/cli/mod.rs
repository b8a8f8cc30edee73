//! Command-line interface for rollcall.
//!
//! Provides commands for extracting student records from files, checking
//! them against the registry, listing every name in a batch of files and
//! reporting registry statistics. Without a subcommand the interactive
//! session starts.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::{self, paths, ResolvedConfig};
use crate::core::RegistryStore;
use crate::domain::Field;
use crate::ingest::decode;

pub mod prompt;
pub mod render;
pub mod session;

use prompt::StdinPrompter;
use session::{Outcome, Session};

/// rollcall - student record extraction and registry
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry file (overrides config file and ROLLCALL_REGISTRY)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive menu (default)
    Session,

    /// Extract fields from a file and print them
    Extract {
        /// File to analyze
        file: PathBuf,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a file, fill gaps interactively and check the registry
    Check {
        /// File to analyze (defaults to the configured input file)
        file: Option<PathBuf>,
    },

    /// List every distinct name found in the given files
    Names {
        /// Files or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show registry statistics
    Stats {
        /// Number of recent entries to show
        #[arg(short, long)]
        recent: Option<usize>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let registry = self.registry;
        match self.command.unwrap_or(Commands::Session) {
            Commands::Session => run_session(registry.as_deref()),
            Commands::Extract { file, json } => extract_file(&file, json),
            Commands::Check { file } => check_file(registry.as_deref(), file),
            Commands::Names { patterns } => list_names(&patterns),
            Commands::Stats { recent } => show_stats(registry.as_deref(), recent),
            Commands::Config => show_config(registry.as_deref()),
        }
    }
}

/// Open the registry store the way every command does
fn open_store(cfg: &ResolvedConfig, registry: Option<&Path>) -> Result<RegistryStore> {
    let path = paths::registry_file(registry)?;
    Ok(RegistryStore::open(path).with_default_status(cfg.default_status.clone()))
}

fn run_session(registry: Option<&Path>) -> Result<()> {
    let cfg = config::config()?;
    let mut store = open_store(cfg, registry)?;

    let mut session = Session::new(&mut store, cfg.field_table()?, StdinPrompter, io::stdout())
        .with_default_input(cfg.default_input.clone())
        .with_recent(cfg.recent);
    session.run()
}

fn extract_file(file: &Path, json: bool) -> Result<()> {
    let cfg = config::config()?;
    let decoded = decode(file)?;
    let record = cfg.field_table()?.extract(&decoded.text);

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        eprintln!("Encoding: {}", decoded.encoding);
        render::record(&mut io::stdout(), &record)?;
    }

    Ok(())
}

fn check_file(registry: Option<&Path>, file: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let file = match file {
        Some(file) => file,
        None => paths::default_input()?,
    };
    let mut store = open_store(cfg, registry)?;

    let mut session = Session::new(&mut store, cfg.field_table()?, StdinPrompter, io::stdout())
        .with_recent(cfg.recent);

    match session.process_file(&file)? {
        Outcome::FileMissing(path) => anyhow::bail!("File not found: {}", path.display()),
        Outcome::Undecodable(path) => {
            anyhow::bail!("No applicable encoding for: {}", path.display())
        }
        Outcome::PersistFailed(_) => anyhow::bail!("Registry could not be saved"),
        _ => Ok(()),
    }
}

/// Expand each argument as a glob; plain paths match themselves
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
            match entry {
                Ok(path) if path.is_file() => {
                    files.push(path);
                    matched = true;
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable path"),
            }
        }
        if !matched {
            warn!(pattern = %pattern, "No files matched");
        }
    }
    Ok(files)
}

fn list_names(patterns: &[String]) -> Result<()> {
    let cfg = config::config()?;
    let table = cfg.field_table()?;
    let files = expand_patterns(patterns)?;

    if files.is_empty() {
        println!("No files matched.");
        return Ok(());
    }

    let mut seen = HashSet::new();
    for file in &files {
        let decoded = match decode(file) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Skipping file");
                continue;
            }
        };

        let names = table.collect_all(&decoded.text, Field::Name);
        println!("{} ({} name(s))", file.display(), names.len());
        for name in names {
            println!("  {}", name);
            seen.insert(name);
        }
    }

    println!("\nTotal distinct names: {}", seen.len());
    Ok(())
}

fn show_stats(registry: Option<&Path>, recent: Option<usize>) -> Result<()> {
    let cfg = config::config()?;
    let store = open_store(cfg, registry)?;

    let stats = store.stats(recent.unwrap_or(cfg.recent));
    render::stats(&mut io::stdout(), &stats)?;
    Ok(())
}

fn show_config(registry: Option<&Path>) -> Result<()> {
    let cfg = config::config()?;

    println!("rollcall configuration");
    println!("{}", "=".repeat(50));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:          {}", cfg.home.display());
    println!("  Registry:      {}", paths::registry_file(registry)?.display());
    println!("  Default input: {}", cfg.default_input.display());
    println!();
    println!("Registry:");
    println!("  Default status: {}", cfg.default_status);
    println!("  Recent window:  {}", cfg.recent);
    println!();
    println!("Labels:");
    for spec in cfg.field_table()?.specs() {
        println!("  {:<8} {}", spec.field.as_str(), spec.labels().join(", "));
    }

    Ok(())
}
