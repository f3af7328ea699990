//! Applying a perturbation to the holdout set.

use rho_core::{Result, RhoError, SampleMatrix};

/// Return `x + perturbation` as a new matrix. Inputs are not modified.
pub fn apply_perturbation(x: &SampleMatrix, perturbation: &SampleMatrix) -> Result<SampleMatrix> {
    if x.dim() != perturbation.dim() {
        return Err(RhoError::shape_mismatch(
            x.shape().to_vec(),
            perturbation.shape().to_vec(),
        ));
    }
    Ok(x + perturbation)
}
