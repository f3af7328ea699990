//! Perturbation budget validation.
//!
//! Every row of a perturbation matrix must satisfy
//! `norm(row) <= eps + BUDGET_TOLERANCE` under the run's metric. A violation
//! means the attack is non-compliant and any accuracy measured with it would
//! not support a robustness claim, so it is reported as a hard error.

use ndarray::ArrayView2;
use rho_core::{Norm, Result, RhoError, BUDGET_TOLERANCE};
use tracing::trace;

/// Check that every row of `perturbation` lies within the `eps` ball.
///
/// Fails on the first offending row.
pub fn validate_budget(perturbation: ArrayView2<'_, f64>, eps: f64, metric: Norm) -> Result<()> {
    let bound = eps + BUDGET_TOLERANCE;
    let mut max_norm = 0.0f64;
    for (row, values) in perturbation.rows().into_iter().enumerate() {
        let norm = metric.of(values);
        if norm.is_nan() || norm > bound {
            return Err(RhoError::BudgetViolation {
                row,
                norm,
                eps,
                metric,
            });
        }
        max_norm = max_norm.max(norm);
    }
    trace!(
        rows = perturbation.nrows(),
        eps,
        max_norm,
        %metric,
        "Perturbation within budget"
    );
    Ok(())
}
