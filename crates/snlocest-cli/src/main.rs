//! snlocest CLI - Home-location inference experiments
//!
//! A command-line interface for running cross-validated location inference
//! over a social graph and scoring the results.
//!
//! # Usage
//!
//! ```bash
//! # 10-fold cross-validation with majority vote, one file per fold
//! snlocest kfold edges.tsv labels.tsv mv --output-dir results/
//!
//! # Score the folds against the labels
//! snlocest evaluate labels.tsv results/
//!
//! # Leave-one-out with the probability model
//! snlocest --area-db areas.tsv loocv edges.tsv labels.tsv pm --fast
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use snlocest_config::{ConfigOverrides, SnlocestConfig};
use snlocest_core::{GraphBackend, MethodKind};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod progress;

/// snlocest - Infer where users live from where their friends live
#[derive(Parser, Debug)]
#[command(name = "snlocest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (replaces .snlocest/config.toml)
    #[arg(long, short = 'c', global = true, env = "SNLOCEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Graph representation (csr, adjacency-list)
    #[arg(long, global = true, env = "SNLOCEST_BACKEND", value_parser = parse_backend)]
    backend: Option<GraphBackend>,

    /// Area coordinate table used by distance-based methods
    #[arg(long, global = true, env = "SNLOCEST_AREA_DB")]
    area_db: Option<PathBuf>,

    /// Column delimiter of edge and label lists
    #[arg(long, short = 'd', global = true)]
    delimiter: Option<char>,
}

/// Parse graph backend from string
fn parse_backend(s: &str) -> Result<GraphBackend, String> {
    s.parse().map_err(|e: snlocest_core::GraphError| e.to_string())
}

/// Parse inference method from its short or long name
pub(crate) fn parse_method(s: &str) -> Result<MethodKind, String> {
    s.parse().map_err(|e: snlocest_core::MethodError| {
        let names: Vec<&str> = MethodKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("{} (expected one of: {})", e, names.join(", "))
    })
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            delimiter: self.delimiter,
            graph_backend: self.backend,
            area_db: self.area_db.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// K-fold cross-validation, one result file per fold
    Kfold(commands::kfold::KfoldArgs),

    /// Leave-one-out cross-validation to stdout
    Loocv(commands::loocv::LoocvArgs),

    /// Precision, recall and F1 of result files
    Evaluate(commands::evaluate::EvaluateArgs),

    /// Node, edge and label counts of a dataset
    Stats(commands::stats::StatsArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the stderr subscriber. `RUST_LOG` wins over flags and config.
fn init_tracing(global: &GlobalOptions, config: Option<&SnlocestConfig>) -> Result<()> {
    let level = if global.quiet {
        "error".to_string()
    } else if global.verbose {
        "debug".to_string()
    } else {
        config
            .map(|c| c.logging.level.to_lowercase())
            .unwrap_or_else(|| "info".to_string())
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.global);
    init_tracing(&cli.global, config.as_ref().ok())?;

    match cli.command {
        Commands::Kfold(args) => commands::kfold::execute(args, cli.global, config?),
        Commands::Loocv(args) => commands::loocv::execute(args, cli.global, config?),
        Commands::Evaluate(args) => commands::evaluate::execute(args, cli.global, config?),
        Commands::Stats(args) => commands::stats::execute(args, cli.global, config?),
        // Works even when the config itself is broken
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global),
    }
}
