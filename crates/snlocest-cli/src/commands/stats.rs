//! Stats command - Dataset summary

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use snlocest_config::SnlocestConfig;

use super::load_dataset;
use crate::GlobalOptions;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Edge list (`src<TAB>dst`)
    pub edges: PathBuf,

    /// Label list (`node<TAB>area`)
    pub labels: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Dataset counts
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub backend: String,
    pub nodes: usize,
    pub edges: usize,
    pub labeled: usize,
    pub areas: usize,
}

/// Execute the stats command
pub fn execute(args: StatsArgs, global: GlobalOptions, config: SnlocestConfig) -> Result<()> {
    let data = load_dataset(&args.edges, &args.labels, &config, global.quiet)?;

    let areas: BTreeSet<_> = data.y.iter().filter(|a| !a.is_none()).collect();
    let stats = DatasetStats {
        backend: config.data.graph_backend.to_string(),
        nodes: data.graph.num_nodes(),
        edges: data.graph.num_edges(),
        labeled: data.len(),
        areas: areas.len(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Backend:  {}", stats.backend);
        println!("Nodes:    {}", stats.nodes);
        println!("Edges:    {}", stats.edges);
        println!("Labeled:  {}", stats.labeled);
        println!("Areas:    {}", stats.areas);
    }

    Ok(())
}
