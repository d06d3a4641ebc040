//! CLI command implementations
//!
//! This module contains all snlocest CLI command implementations.

pub mod config;
pub mod evaluate;
pub mod kfold;
pub mod loocv;
pub mod stats;

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use snlocest_config::{ConfigLoader, SnlocestConfig};
use snlocest_core::{
    write_result, AreaCoordinateData, AreaDistance, AreaMetric, Dataset, FoldOutcome, MethodKind,
};

use crate::progress;
use crate::GlobalOptions;

/// Load configuration with optional config file override and CLI flags.
pub fn load_config(global: &GlobalOptions) -> Result<SnlocestConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    match global.config {
        Some(ref path) => loader
            .load_from(path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            loader
                .load(&cwd, Some(&overrides))
                .context("Failed to load configuration")
        }
    }
}

/// Load the edge and label lists, with a spinner unless quiet.
pub fn load_dataset(
    edges: &Path,
    labels: &Path,
    config: &SnlocestConfig,
    quiet: bool,
) -> Result<Dataset> {
    let pb = progress::spinner(
        &format!(
            "Loading {} as {} graph...",
            edges.display(),
            config.data.graph_backend
        ),
        quiet,
    );

    match snlocest_core::load_dataset(
        edges,
        labels,
        config.data.graph_backend,
        config.data.delimiter,
    ) {
        Ok(data) => {
            progress::finish_spinner(
                pb,
                &format!(
                    "Loaded {} nodes, {} edges, {} labeled",
                    data.graph.num_nodes(),
                    data.graph.num_edges(),
                    data.len()
                ),
            );
            Ok(data)
        }
        Err(e) => {
            progress::finish_spinner_error(pb, "Failed to load dataset");
            Err(e).with_context(|| {
                format!(
                    "Failed to load dataset from {} and {}",
                    edges.display(),
                    labels.display()
                )
            })
        }
    }
}

/// Builds a fresh memoized metric per fold, or nothing for methods that
/// never measure distance.
pub struct MetricFactory {
    areas: Option<Arc<AreaCoordinateData>>,
    config: SnlocestConfig,
}

impl MetricFactory {
    /// Load the area table if `kind` needs one.
    pub fn for_method(kind: MethodKind, config: &SnlocestConfig) -> Result<Self> {
        let areas = if kind.needs_metric() {
            let path = config.data.area_db.as_ref().with_context(|| {
                format!(
                    "Method '{}' needs area coordinates; pass --area-db or set data.area_db",
                    kind
                )
            })?;
            let areas = AreaCoordinateData::load(path)
                .with_context(|| format!("Failed to load area table {}", path.display()))?;
            Some(Arc::new(areas))
        } else {
            None
        };
        Ok(Self {
            areas,
            config: config.clone(),
        })
    }

    pub fn metric(&self) -> Option<Arc<dyn AreaMetric>> {
        self.areas.as_ref().map(|areas| {
            Arc::new(AreaDistance::with_capacity(
                Arc::clone(areas),
                self.config.distance.formula,
                self.config.distance.cache_capacity,
            )) as Arc<dyn AreaMetric>
        })
    }
}

/// Write one fold's predictions to `out`.
pub fn write_fold<W: Write>(
    out: &mut W,
    data: &Dataset,
    fold: &FoldOutcome,
    extra: bool,
) -> Result<()> {
    write_result(out, data.graph.as_ref(), &fold.test_nodes, &fold.estimates, extra)
        .with_context(|| format!("Failed to write results of fold {}", fold.fold))
}

/// Buffered, locked stdout.
pub fn stdout() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
