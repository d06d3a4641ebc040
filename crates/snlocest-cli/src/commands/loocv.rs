//! Loocv command - Leave-one-out cross-validation
//!
//! `--fast` fits once on every label and predicts every labeled node, which
//! only matches true leave-one-out for methods that never read the query
//! node's own label. `nn` reads it, so `--fast` is the only mode where it
//! estimates anything.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use snlocest_config::{ConfigOverrides, SnlocestConfig};
use snlocest_core::{accuracy, loo_fast, AreaId, CrossValidator, MethodKind, MethodSpec, Splitter};

use super::{load_dataset, print_info, stdout, write_fold, MetricFactory};
use crate::progress;
use crate::GlobalOptions;

/// Arguments for the loocv command
#[derive(Args, Debug)]
pub struct LoocvArgs {
    /// Edge list (`src<TAB>dst`)
    pub edges: PathBuf,

    /// Label list (`node<TAB>area`)
    pub labels: PathBuf,

    /// Inference method (mv, gm, rn, nn, pm)
    #[arg(value_parser = crate::parse_method)]
    pub method: MethodKind,

    /// Fit once on all labels instead of once per node
    #[arg(long)]
    pub fast: bool,

    /// Append method diagnostics to each result row
    #[arg(long)]
    pub extra: bool,

    /// Folds evaluated concurrently (ignored with --fast)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

/// Execute the loocv command
pub fn execute(args: LoocvArgs, global: GlobalOptions, mut config: SnlocestConfig) -> Result<()> {
    config.apply_overrides(&ConfigOverrides {
        jobs: args.jobs,
        ..Default::default()
    });
    config.validate().context("Invalid configuration")?;

    let data = load_dataset(&args.edges, &args.labels, &config, global.quiet)?;
    let metrics = MetricFactory::for_method(args.method, &config)?;
    let spec = MethodSpec::new(args.method).with_params(config.method_params());

    let pb = progress::spinner(
        &format!(
            "Leave-one-out over {} nodes with {}...",
            data.len(),
            args.method.long_name()
        ),
        global.quiet,
    );

    let result = if args.fast {
        loo_fast(data.graph.as_ref(), &data.x, &data.y, &spec, metrics.metric())
            .map(|fold| vec![fold])
    } else {
        CrossValidator::new(Splitter::LeaveOneOut)
            .with_jobs(config.crossval.jobs)
            .run(data.graph.as_ref(), &data.x, &data.y, &spec, || {
                metrics.metric()
            })
    };
    let folds = match result {
        Ok(folds) => {
            progress::finish_spinner(pb, "Leave-one-out finished");
            folds
        }
        Err(e) => {
            progress::finish_spinner_error(pb, "Leave-one-out failed");
            return Err(e).context("Leave-one-out failed");
        }
    };

    let mut out = stdout();
    for fold in &folds {
        write_fold(&mut out, &data, fold, args.extra)?;
    }
    out.flush()?;

    let truth: Vec<AreaId> = folds.iter().flat_map(|f| f.truth.iter().copied()).collect();
    let predicted: Vec<AreaId> = folds.iter().flat_map(|f| f.predicted()).collect();
    print_info(
        &format!("Accuracy: {:.4}", accuracy(&truth, &predicted)),
        global.quiet,
    );

    Ok(())
}
