//! Prediction quality metrics

use serde::Serialize;

use crate::areadata::AreaId;

/// Fraction of exact matches over `truth`.
///
/// Pairs beyond the shorter slice are ignored; an empty `truth` scores 0.
pub fn accuracy(truth: &[AreaId], predicted: &[AreaId]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// Precision, recall and F1 where "no estimate" counts as abstaining.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrfScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Predictions other than `AreaId::NONE`
    pub n_predicted: usize,
    pub n_correct: usize,
    pub n_test: usize,
}

impl PrfScore {
    pub fn compute(truth: &[AreaId], predicted: &[AreaId]) -> Self {
        let n_test = truth.len();
        let n_predicted = predicted.iter().filter(|p| !p.is_none()).count();
        let n_correct = truth
            .iter()
            .zip(predicted)
            .filter(|(t, p)| !p.is_none() && t == p)
            .count();

        let precision = ratio(n_correct, n_predicted);
        let recall = ratio(n_correct, n_test);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            n_predicted,
            n_correct,
            n_test,
        }
    }

    /// Tab-separated `precision recall f1 n_predicted n_correct n_test`
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.precision, self.recall, self.f1, self.n_predicted, self.n_correct, self.n_test
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(ids: &[u64]) -> Vec<AreaId> {
        ids.iter().copied().map(AreaId).collect()
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&areas(&[1, 2, 3, 4]), &areas(&[1, 2, 0, 5])), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_prf() {
        let truth = areas(&[1, 2, 3, 4]);
        let predicted = areas(&[1, 2, 0, 5]);
        let s = PrfScore::compute(&truth, &predicted);
        assert_eq!(s.n_test, 4);
        assert_eq!(s.n_predicted, 3);
        assert_eq!(s.n_correct, 2);
        assert!((s.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.recall - 0.5).abs() < 1e-12);
        let f1 = 2.0 * (2.0 / 3.0) * 0.5 / (2.0 / 3.0 + 0.5);
        assert!((s.f1 - f1).abs() < 1e-12);
    }

    #[test]
    fn test_prf_zero_denominators() {
        let s = PrfScore::compute(&areas(&[1, 2]), &areas(&[0, 0]));
        assert_eq!((s.precision, s.recall, s.f1), (0.0, 0.0, 0.0));

        let s = PrfScore::compute(&[], &[]);
        assert_eq!((s.precision, s.recall, s.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_row_format() {
        let s = PrfScore::compute(&areas(&[1]), &areas(&[1]));
        assert_eq!(s.to_row(), "1\t1\t1\t1\t1\t1");
    }
}
