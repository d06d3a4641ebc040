//! Kfold command - K-fold cross-validation
//!
//! Each fold's test nodes are predicted from a model fitted on the other
//! folds. Results go to `result_<i>.tsv` in the output directory, or a
//! single fold is written to stdout with `--nth`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use snlocest_config::{ConfigOverrides, SnlocestConfig};
use snlocest_core::{CrossValidator, MethodKind, MethodSpec, Splitter};

use super::{load_dataset, print_info, stdout, write_fold, MetricFactory};
use crate::progress;
use crate::GlobalOptions;

/// File name stem of per-fold result files
pub const RESULT_STEM: &str = "result";

/// File extension of per-fold result files
pub const RESULT_EXT: &str = "tsv";

/// Arguments for the kfold command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["output_dir", "nth"])))]
pub struct KfoldArgs {
    /// Edge list (`src<TAB>dst`)
    pub edges: PathBuf,

    /// Label list (`node<TAB>area`)
    pub labels: PathBuf,

    /// Inference method (mv, gm, rn, nn, pm)
    #[arg(value_parser = crate::parse_method)]
    pub method: MethodKind,

    /// Number of folds
    #[arg(long)]
    pub n_splits: Option<usize>,

    /// Seed for the fold shuffle
    #[arg(long)]
    pub random_state: Option<u64>,

    /// Directory for `result_<i>.tsv` files
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Only predict fold N and write it to stdout
    #[arg(long)]
    pub nth: Option<usize>,

    /// Folds evaluated concurrently
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Append method diagnostics to each result row
    #[arg(long)]
    pub extra: bool,
}

impl KfoldArgs {
    fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            n_splits: self.n_splits,
            crossval_random_state: self.random_state,
            jobs: self.jobs,
            ..Default::default()
        }
    }
}

/// Path of fold `i` inside `dir`
pub fn fold_path(dir: &std::path::Path, stem: &str, i: usize, ext: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", stem, i, ext))
}

/// Execute the kfold command
pub fn execute(args: KfoldArgs, global: GlobalOptions, mut config: SnlocestConfig) -> Result<()> {
    config.apply_overrides(&args.to_config_overrides());
    config.validate().context("Invalid configuration")?;

    let data = load_dataset(&args.edges, &args.labels, &config, global.quiet)?;
    let metrics = MetricFactory::for_method(args.method, &config)?;
    let spec = MethodSpec::new(args.method).with_params(config.method_params());
    let validator =
        CrossValidator::new(Splitter::KFold(config.kfold())).with_jobs(config.crossval.jobs);

    if let Some(nth) = args.nth {
        let fold = validator
            .run_nth(data.graph.as_ref(), &data.x, &data.y, &spec, metrics.metric(), nth)
            .with_context(|| format!("Fold {} failed", nth))?;
        let mut out = stdout();
        write_fold(&mut out, &data, &fold, args.extra)?;
        out.flush()?;
        print_info(
            &format!("Fold {} accuracy: {:.4}", nth, fold.accuracy),
            global.quiet,
        );
        return Ok(());
    }

    // Required by the argument group when --nth is absent
    let Some(output_dir) = args.output_dir else {
        anyhow::bail!("Either --output-dir or --nth is required");
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let pb = progress::spinner(
        &format!(
            "Running {}-fold cross-validation with {}...",
            config.crossval.n_splits,
            args.method.long_name()
        ),
        global.quiet,
    );
    let folds = match validator.run(data.graph.as_ref(), &data.x, &data.y, &spec, || {
        metrics.metric()
    }) {
        Ok(folds) => {
            progress::finish_spinner(pb, &format!("Evaluated {} folds", folds.len()));
            folds
        }
        Err(e) => {
            progress::finish_spinner_error(pb, "Cross-validation failed");
            return Err(e).context("Cross-validation failed");
        }
    };

    for fold in &folds {
        let path = fold_path(&output_dir, RESULT_STEM, fold.fold, RESULT_EXT);
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        write_fold(&mut out, &data, fold, args.extra)?;
        out.flush()?;
        print_info(
            &format!(
                "Saved at: {} (accuracy {:.4})",
                path.display(),
                fold.accuracy
            ),
            global.quiet,
        );
    }

    Ok(())
}
