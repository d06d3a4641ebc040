//! Cross-Validation
//!
//! Splits the labeled nodes into folds, fits on the complement of each test
//! fold and predicts the fold. Every fold builds its own method and metric,
//! so folds share nothing but the read-only graph and can run in parallel.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::areadata::AreaId;
use crate::distance::AreaMetric;
use crate::evaluate;
use crate::graph::{IndexedGraph, NodeIdx};
use crate::methods::{self, Estimate, FitResult, MethodError, MethodSpec};

/// Default number of folds
pub const DEFAULT_N_SPLITS: usize = 10;

/// Default shuffle seed
pub const DEFAULT_RANDOM_STATE: u64 = 100;

/// Errors from splitting or running folds
#[derive(Debug, Error)]
pub enum CrossValError {
    #[error("cannot split {n_samples} samples into {n_splits} folds")]
    InvalidSplits { n_splits: usize, n_samples: usize },

    #[error("fold {fold} out of range, only {n_folds} folds")]
    FoldOutOfRange { fold: usize, n_folds: usize },

    #[error("got {nodes} nodes but {labels} labels")]
    LengthMismatch { nodes: usize, labels: usize },

    #[error("{0}")]
    Method(#[from] MethodError),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, CrossValError>;

/// K-fold splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: u64,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: DEFAULT_N_SPLITS,
            shuffle: true,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            ..Self::default()
        }
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Test positions of every fold, each sorted.
    ///
    /// The first `n % n_splits` folds hold one extra sample.
    pub fn test_folds(&self, n: usize) -> Result<Vec<Vec<usize>>> {
        if self.n_splits < 2 || self.n_splits > n {
            return Err(CrossValError::InvalidSplits {
                n_splits: self.n_splits,
                n_samples: n,
            });
        }
        let mut positions: Vec<usize> = (0..n).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.random_state);
            positions.shuffle(&mut rng);
        }

        let base = n / self.n_splits;
        let extra = n % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let size = base + usize::from(i < extra);
            let mut fold = positions[start..start + size].to_vec();
            fold.sort_unstable();
            folds.push(fold);
            start += size;
        }
        Ok(folds)
    }
}

/// How to split the labeled nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Splitter {
    KFold(KFold),
    LeaveOneOut,
}

impl Splitter {
    pub fn test_folds(&self, n: usize) -> Result<Vec<Vec<usize>>> {
        match self {
            Splitter::KFold(kfold) => kfold.test_folds(n),
            Splitter::LeaveOneOut => {
                if n < 2 {
                    return Err(CrossValError::InvalidSplits {
                        n_splits: n,
                        n_samples: n,
                    });
                }
                Ok((0..n).map(|i| vec![i]).collect())
            }
        }
    }
}

/// Positions in `0..n` not in the sorted `test`
pub fn train_positions(n: usize, test: &[usize]) -> Vec<usize> {
    let mut train = Vec::with_capacity(n.saturating_sub(test.len()));
    let mut it = test.iter().peekable();
    for i in 0..n {
        if it.peek() == Some(&&i) {
            it.next();
        } else {
            train.push(i);
        }
    }
    train
}

/// Result of one fold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldOutcome {
    pub fold: usize,
    pub test_nodes: Vec<NodeIdx>,
    pub truth: Vec<AreaId>,
    pub estimates: Vec<Estimate>,
    pub accuracy: f64,
}

impl FoldOutcome {
    pub fn predicted(&self) -> Vec<AreaId> {
        self.estimates.iter().map(|e| e.area).collect()
    }
}

/// Runs a [`MethodSpec`] over the folds of a [`Splitter`].
#[derive(Debug, Clone, Copy)]
pub struct CrossValidator {
    splitter: Splitter,
    jobs: usize,
}

impl CrossValidator {
    pub fn new(splitter: Splitter) -> Self {
        Self { splitter, jobs: 1 }
    }

    /// Folds evaluated concurrently; 1 runs them on the calling thread
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// Evaluate every fold, returning outcomes in fold order.
    ///
    /// `metric_factory` is called once per fold so each fold gets its own
    /// distance cache.
    pub fn run<G, F>(
        &self,
        graph: &G,
        x: &[NodeIdx],
        y: &[AreaId],
        spec: &MethodSpec,
        metric_factory: F,
    ) -> Result<Vec<FoldOutcome>>
    where
        G: IndexedGraph + ?Sized,
        F: Fn() -> Option<Arc<dyn AreaMetric>> + Sync,
    {
        check_lengths(x, y)?;
        let folds = self.splitter.test_folds(x.len())?;
        info!(
            "Cross-validating {} over {} folds ({} jobs)",
            spec.kind,
            folds.len(),
            self.jobs
        );

        let run_one = |(i, test): (usize, &Vec<usize>)| {
            evaluate_fold(graph, x, y, i, test, spec, metric_factory())
        };

        if self.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()?;
            pool.install(|| folds.par_iter().enumerate().map(run_one).collect())
        } else {
            folds.iter().enumerate().map(run_one).collect()
        }
    }

    /// Evaluate only fold `nth`
    pub fn run_nth<G>(
        &self,
        graph: &G,
        x: &[NodeIdx],
        y: &[AreaId],
        spec: &MethodSpec,
        metric: Option<Arc<dyn AreaMetric>>,
        nth: usize,
    ) -> Result<FoldOutcome>
    where
        G: IndexedGraph + ?Sized,
    {
        check_lengths(x, y)?;
        let folds = self.splitter.test_folds(x.len())?;
        let test = folds.get(nth).ok_or(CrossValError::FoldOutOfRange {
            fold: nth,
            n_folds: folds.len(),
        })?;
        evaluate_fold(graph, x, y, nth, test, spec, metric)
    }
}

/// Leave-one-out with a single fit on all labels.
///
/// Matches true leave-one-out for methods that ignore the query node's own
/// label. Methods that read it (`nn`) see it only here.
pub fn loo_fast<G>(
    graph: &G,
    x: &[NodeIdx],
    y: &[AreaId],
    spec: &MethodSpec,
    metric: Option<Arc<dyn AreaMetric>>,
) -> Result<FoldOutcome>
where
    G: IndexedGraph + ?Sized,
{
    check_lengths(x, y)?;
    if spec.kind.reads_own_label() {
        warn!(
            "Method '{}' reads each node's own label; fast leave-one-out scores are not held out",
            spec.kind
        );
    }
    let fit = FitResult::new(x, y)?;
    let mut method = spec.build(metric)?;
    let estimates = methods::predict(graph, method.as_mut(), &fit, x)?;
    let predicted: Vec<AreaId> = estimates.iter().map(|e| e.area).collect();
    let accuracy = evaluate::accuracy(y, &predicted);
    info!("Fast leave-one-out accuracy {:.4}", accuracy);
    Ok(FoldOutcome {
        fold: 0,
        test_nodes: x.to_vec(),
        truth: y.to_vec(),
        estimates,
        accuracy,
    })
}

fn check_lengths(x: &[NodeIdx], y: &[AreaId]) -> Result<()> {
    if x.len() != y.len() {
        return Err(CrossValError::LengthMismatch {
            nodes: x.len(),
            labels: y.len(),
        });
    }
    Ok(())
}

fn evaluate_fold<G>(
    graph: &G,
    x: &[NodeIdx],
    y: &[AreaId],
    fold: usize,
    test: &[usize],
    spec: &MethodSpec,
    metric: Option<Arc<dyn AreaMetric>>,
) -> Result<FoldOutcome>
where
    G: IndexedGraph + ?Sized,
{
    let train = train_positions(x.len(), test);
    let x_train: Vec<NodeIdx> = train.iter().map(|&i| x[i]).collect();
    let y_train: Vec<AreaId> = train.iter().map(|&i| y[i]).collect();
    let test_nodes: Vec<NodeIdx> = test.iter().map(|&i| x[i]).collect();
    let truth: Vec<AreaId> = test.iter().map(|&i| y[i]).collect();

    let fit = FitResult::new(&x_train, &y_train)?;
    let mut method = spec.build(metric)?;
    let estimates = methods::predict(graph, method.as_mut(), &fit, &test_nodes)?;
    let predicted: Vec<AreaId> = estimates.iter().map(|e| e.area).collect();
    let accuracy = evaluate::accuracy(&truth, &predicted);
    debug!(
        "Fold {}: {} train, {} test, accuracy {:.4}",
        fold,
        x_train.len(),
        test_nodes.len(),
        accuracy
    );

    Ok(FoldOutcome {
        fold,
        test_nodes,
        truth,
        estimates,
        accuracy,
    })
}
