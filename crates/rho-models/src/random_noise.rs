//! Random-noise attack with restarts.
//!
//! Draws uniform noise in the budget box and projects it onto the budget
//! ball. Each row gets up to `restarts` draws; a draw that flips a 1-NN
//! surrogate fitted on the training set is kept, otherwise the last draw is.

use crate::KnnClassifier;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rho_core::{check_aligned, LabelVector, Norm, Result, RhoError, SampleMatrix};
use rho_eval::{Attack, Classifier, Predictor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the random-noise attack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Draws per sample before giving up.
    pub restarts: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            restarts: 10,
            seed: 42,
        }
    }
}

pub struct RandomNoiseAttack {
    config: NoiseConfig,
    metric: Norm,
    surrogate: KnnClassifier,
    rng: StdRng,
}

impl RandomNoiseAttack {
    pub fn new(
        train_x: &SampleMatrix,
        train_y: &LabelVector,
        metric: Norm,
        config: NoiseConfig,
    ) -> Result<Self> {
        if config.restarts == 0 {
            return Err(RhoError::Config(
                "random_noise needs at least one restart".to_string(),
            ));
        }
        check_aligned(train_x, train_y)?;
        let mut surrogate = KnnClassifier::new(1)?;
        surrogate.fit(train_x, train_y)?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            metric,
            surrogate,
        })
    }

    fn draw(&mut self, dim: usize, eps: f64) -> Array1<f64> {
        let raw: Array1<f64> = (0..dim)
            .map(|_| eps * self.rng.random_range(-1.0f64..=1.0))
            .collect();
        self.metric.project(raw.view(), eps)
    }
}

impl Attack for RandomNoiseAttack {
    fn perturb(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<SampleMatrix> {
        check_aligned(x, y)?;
        let (n, dim) = x.dim();
        let mut out = Array2::zeros((n, dim));
        if eps == 0.0 || n == 0 {
            return Ok(out);
        }

        let mut pending: Vec<usize> = (0..n).collect();
        for restart in 0..self.config.restarts {
            if pending.is_empty() {
                break;
            }
            let mut candidates = Array2::<f64>::zeros((pending.len(), dim));
            for mut row in candidates.rows_mut() {
                row.assign(&self.draw(dim, eps));
            }
            let adv = &x.select(Axis(0), &pending) + &candidates;
            let predicted = self.surrogate.predict(&adv)?;

            let mut still_pending = Vec::with_capacity(pending.len());
            for (k, &i) in pending.iter().enumerate() {
                out.row_mut(i).assign(&candidates.row(k));
                if predicted[k] == y[i] {
                    still_pending.push(i);
                }
            }
            debug!(
                restart,
                flipped = pending.len() - still_pending.len(),
                remaining = still_pending.len(),
                eps,
                "random_noise restart"
            );
            pending = still_pending;
        }
        Ok(out)
    }
}
