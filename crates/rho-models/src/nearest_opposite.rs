//! Nearest-opposite attack.
//!
//! Each sample is pushed toward the closest training point (under the run's
//! metric) that carries a different label. The full move is the attack's
//! worst-case perturbation; per-budget perturbations are that move projected
//! onto the budget ball.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use rho_core::{check_aligned, LabelVector, Norm, Result, RhoError, SampleMatrix};
use rho_eval::Attack;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NearestOppositeAttack {
    train_x: SampleMatrix,
    train_y: LabelVector,
    metric: Norm,
    worst: Option<SampleMatrix>,
}

impl NearestOppositeAttack {
    pub fn new(train_x: &SampleMatrix, train_y: &LabelVector, metric: Norm) -> Result<Self> {
        check_aligned(train_x, train_y)?;
        Ok(Self {
            train_x: train_x.clone(),
            train_y: train_y.clone(),
            metric,
            worst: None,
        })
    }

    /// Unprojected move from every row of `x` to its nearest opposite-label
    /// training point. Rows with no such point get a zero move.
    pub fn directions(&self, x: &SampleMatrix, y: &LabelVector) -> Result<SampleMatrix> {
        check_aligned(x, y)?;
        if x.ncols() != self.train_x.ncols() {
            return Err(RhoError::shape_mismatch(
                vec![x.nrows(), self.train_x.ncols()],
                vec![x.nrows(), x.ncols()],
            ));
        }
        let moves: Vec<Array1<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| self.move_for(x, y[i], i))
            .collect();

        let mut out = Array2::zeros(x.raw_dim());
        for (mut row, m) in out.rows_mut().into_iter().zip(moves) {
            row.assign(&m);
        }
        Ok(out)
    }

    fn move_for(&self, x: &SampleMatrix, label: usize, i: usize) -> Array1<f64> {
        let src = x.row(i);
        self.train_x
            .rows()
            .into_iter()
            .zip(self.train_y.iter())
            .filter(|(_, t)| **t != label)
            .map(|(target, _)| &target - &src)
            .map(|d| (self.metric.of(d.view()), d))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or_else(|| Array1::zeros(x.ncols()), |(_, d)| d)
    }

    fn project_all(&self, moves: &SampleMatrix, eps: f64) -> SampleMatrix {
        let mut out = moves.clone();
        for (mut row, src) in out.rows_mut().into_iter().zip(moves.rows()) {
            row.assign(&self.metric.project(src, eps));
        }
        out
    }
}

impl Attack for NearestOppositeAttack {
    fn perturb(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<SampleMatrix> {
        let moves = self.directions(x, y)?;
        let out = self.project_all(&moves, eps);
        self.worst = Some(moves);
        Ok(out)
    }

    fn perturb_schedule(
        &mut self,
        x: &SampleMatrix,
        y: &LabelVector,
        schedule: &[f64],
    ) -> Result<Vec<SampleMatrix>> {
        let moves = self.directions(x, y)?;
        let out: Vec<SampleMatrix> = schedule
            .iter()
            .map(|&eps| self.project_all(&moves, eps))
            .collect();
        debug!(
            rows = x.nrows(),
            budgets = schedule.len(),
            metric = %self.metric,
            "nearest-opposite perturbations computed"
        );
        self.worst = Some(moves);
        Ok(out)
    }

    fn worst_case(&self) -> Option<&SampleMatrix> {
        self.worst.as_ref()
    }
}
