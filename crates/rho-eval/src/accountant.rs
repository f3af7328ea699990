//! Robustness accounting: accuracy and worst-case perturbation statistics.
//!
//! ## Worst-case accounting
//!
//! The attack's worst-case matrix holds one chosen perturbation per holdout
//! sample. After applying it, exactly one of two outcomes holds:
//!
//! - **Total success**: no sample keeps its correct prediction. The mean
//!   norm is taken over every row.
//! - **Partial success**: some samples still predict correctly. The mean
//!   norm is taken over the flipped rows only, and the number of samples that
//!   were not flipped is reported as `missed_count`.
//!
//! Averaging over successes only measures how much distortion the attack
//! needed where it worked.

use crate::apply::apply_perturbation;
use crate::traits::Predictor;
use rho_core::{LabelVector, Norm, Result, RhoError, SampleMatrix, WorstCaseStats};
use tracing::debug;

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(predicted: &LabelVector, truth: &LabelVector) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(RhoError::shape_mismatch(
            vec![truth.len()],
            vec![predicted.len()],
        ));
    }
    if truth.is_empty() {
        return Err(RhoError::EmptyHoldout);
    }
    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Outcome of applying the worst-case perturbation.
#[derive(Debug, Clone, PartialEq)]
pub enum WorstCaseOutcome {
    /// Every holdout sample was flipped.
    TotalSuccess { mean_norm: f64 },
    /// At least one sample kept its correct label.
    PartialSuccess {
        /// Mean over flipped rows; `None` if nothing flipped.
        mean_norm: Option<f64>,
        missed_count: usize,
    },
}

impl WorstCaseOutcome {
    pub fn into_stats(self, eps: Option<f64>) -> WorstCaseStats {
        match self {
            WorstCaseOutcome::TotalSuccess { mean_norm } => WorstCaseStats {
                eps,
                mean_norm: Some(mean_norm),
                missed_count: None,
            },
            WorstCaseOutcome::PartialSuccess {
                mean_norm,
                missed_count,
            } => WorstCaseStats {
                eps,
                mean_norm,
                missed_count: Some(missed_count),
            },
        }
    }
}

/// Apply the worst-case perturbation, predict once, and classify the outcome.
pub fn classify_worst_case<P: Predictor + ?Sized>(
    predictor: &P,
    x: &SampleMatrix,
    y: &LabelVector,
    perturbation: &SampleMatrix,
    metric: Norm,
) -> Result<WorstCaseOutcome> {
    if x.nrows() == 0 {
        return Err(RhoError::EmptyHoldout);
    }
    let perturbed = apply_perturbation(x, perturbation)?;
    let predicted = predictor.predict(&perturbed)?;
    if predicted.len() != y.len() {
        return Err(RhoError::ContractViolation(format!(
            "predict returned {} labels for {} samples",
            predicted.len(),
            y.len()
        )));
    }

    let norms = metric.row_norms(perturbation.view());
    let flipped: Vec<f64> = predicted
        .iter()
        .zip(y.iter())
        .zip(norms.iter())
        .filter(|((p, t), _)| p != t)
        .map(|(_, &n)| n)
        .collect();
    let missed_count = y.len() - flipped.len();

    let outcome = if missed_count == 0 {
        WorstCaseOutcome::TotalSuccess {
            mean_norm: mean(&flipped).unwrap_or(0.0),
        }
    } else {
        WorstCaseOutcome::PartialSuccess {
            mean_norm: mean(&flipped),
            missed_count,
        }
    };
    debug!(
        flipped = flipped.len(),
        missed_count,
        ?outcome,
        "Worst-case perturbation accounted"
    );
    Ok(outcome)
}

/// Worst-case stats for the report, tagged with `eps` when given.
pub fn worst_case_stats<P: Predictor + ?Sized>(
    predictor: &P,
    x: &SampleMatrix,
    y: &LabelVector,
    perturbation: &SampleMatrix,
    metric: Norm,
    eps: Option<f64>,
) -> Result<WorstCaseStats> {
    Ok(classify_worst_case(predictor, x, y, perturbation, metric)?.into_stats(eps))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
