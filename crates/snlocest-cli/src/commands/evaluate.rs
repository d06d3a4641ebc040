//! Evaluate command - Precision, recall and F1 of result files
//!
//! Given a directory, reproduces the k-fold split of the label list and
//! scores `<stem>_<i>.<ext>` for every fold, checking that each file lists
//! exactly that fold's test nodes in order. Given a file, scores it against
//! the whole label list (leave-one-out output).

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use snlocest_config::{ConfigOverrides, SnlocestConfig};
use snlocest_core::{read_labellist, read_result, AreaId, PrfScore};

use super::kfold::{fold_path, RESULT_EXT, RESULT_STEM};
use super::stdout;
use crate::GlobalOptions;

/// Arguments for the evaluate command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Label list (`node<TAB>area`)
    pub labels: PathBuf,

    /// A result file, or a directory of per-fold result files
    pub result: PathBuf,

    /// Seed the folds were shuffled with
    #[arg(long)]
    pub random_state: Option<u64>,

    /// Number of folds
    #[arg(long)]
    pub n_splits: Option<usize>,

    /// File name stem of per-fold result files
    #[arg(long, default_value = RESULT_STEM)]
    pub stem: String,

    /// File extension of per-fold result files
    #[arg(long, default_value = RESULT_EXT)]
    pub ext: String,
}

/// Execute the evaluate command
pub fn execute(
    args: EvaluateArgs,
    _global: GlobalOptions,
    mut config: SnlocestConfig,
) -> Result<()> {
    config.apply_overrides(&ConfigOverrides {
        n_splits: args.n_splits,
        crossval_random_state: args.random_state,
        ..Default::default()
    });
    config.validate().context("Invalid configuration")?;

    let (nodes, labels) = read_labellist(&args.labels, config.data.delimiter)
        .with_context(|| format!("Failed to read labels from {}", args.labels.display()))?;

    let mut out = stdout();
    if args.result.is_dir() {
        let folds = config
            .kfold()
            .test_folds(nodes.len())
            .context("Failed to reproduce the k-fold split")?;
        for (i, test) in folds.iter().enumerate() {
            let path = fold_path(&args.result, &args.stem, i, &args.ext);
            let expected: Vec<&str> = test.iter().map(|&j| nodes[j].as_str()).collect();
            let truth: Vec<AreaId> = test.iter().map(|&j| labels[j]).collect();
            let score = score_file(&path, &expected, &truth)
                .with_context(|| format!("Fold {} does not match", i))?;
            writeln!(out, "{}\t{}\t{}", args.result.display(), i, score.to_row())?;
        }
    } else {
        let expected: Vec<&str> = nodes.iter().map(String::as_str).collect();
        let score = score_file(&args.result, &expected, &labels)?;
        writeln!(out, "{}\t{}", args.result.display(), score.to_row())?;
    }
    out.flush()?;

    Ok(())
}

/// Read a result file and score it, requiring its nodes to be `expected`.
fn score_file(path: &Path, expected: &[&str], truth: &[AreaId]) -> Result<PrfScore> {
    let (names, predicted) = read_result(path)
        .with_context(|| format!("Failed to read results from {}", path.display()))?;

    if names.len() != expected.len() || names.iter().zip(expected).any(|(a, b)| a != b) {
        anyhow::bail!(
            "{} lists different nodes than the labels' split ({} rows, expected {}); \
             was it produced with another --random-state or --n-splits?",
            path.display(),
            names.len(),
            expected.len()
        );
    }

    Ok(PrfScore::compute(truth, &predicted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_score_file_counts() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = write(temp.path(), "r.tsv", "a\t1\nb\t0\nc\t3\n");

        let truth = [AreaId(1), AreaId(2), AreaId(4)];
        let score = score_file(&path, &["a", "b", "c"], &truth).unwrap();
        assert_eq!(score.n_test, 3);
        assert_eq!(score.n_predicted, 2);
        assert_eq!(score.n_correct, 1);
        assert!((score.precision - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_file_rejects_other_nodes() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = write(temp.path(), "r.tsv", "a\t1\nc\t3\n");

        let truth = [AreaId(1), AreaId(2)];
        let err = score_file(&path, &["a", "b"], &truth).unwrap_err();
        assert!(err.to_string().contains("different nodes"));
    }
}
