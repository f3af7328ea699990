//! Shared fixtures for evaluator tests.
//!
//! Data lives on the first feature: class 1 samples sit at `x0 = 1.0`, class 0
//! samples at `x0 = 0.0`, and [`Threshold`] splits them at 0.5.

use crate::{AdversarialClassifier, Attack, Classifier, Predictor};
use ndarray::{s, Array1, Array2};
use rho_core::{DataSplit, LabelVector, Result, RhoError, SampleMatrix};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};


/// Alternating-label samples with two features.
pub(crate) fn samples(n: usize) -> (SampleMatrix, LabelVector) {
    let y: LabelVector = (0..n).map(|i| i % 2).collect();
    let mut x = Array2::zeros((n, 2));
    for (i, &label) in y.iter().enumerate() {
        x[[i, 0]] = label as f64;
        x[[i, 1]] = i as f64 * 0.01;
    }
    (x, y)
}

pub(crate) fn split(n_train: usize, n_test: usize) -> DataSplit {
    let (train_x, train_y) = samples(n_train);
    let (test_x, test_y) = samples(n_test);
    DataSplit::new(train_x, train_y, test_x, test_y).unwrap()
}

/// Move every sample toward the decision boundary by `amount` along x0.
pub(crate) fn shift_toward_boundary(y: &LabelVector, n_features: usize, amount: f64) -> SampleMatrix {
    let mut p = Array2::zeros((y.len(), n_features));
    for (i, &label) in y.iter().enumerate() {
        p[[i, 0]] = if label == 1 { -amount } else { amount };
    }
    p
}

/// Predicts class 1 when `x0 > 0.5`. Counts fits and predictions.
#[derive(Default)]
pub(crate) struct Threshold {
    pub fits: Arc<AtomicUsize>,
    pub predictions: Arc<AtomicUsize>,
}

impl Predictor for Threshold {
    fn predict(&self, x: &SampleMatrix) -> Result<LabelVector> {
        self.predictions.fetch_add(1, Ordering::SeqCst);
        Ok(x.column(0).mapv(|v| usize::from(v > 0.5)))
    }
}

impl Classifier for Threshold {
    fn fit(&mut self, _x: &SampleMatrix, _y: &LabelVector) -> Result<()> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Classifier whose fit always fails.
pub(crate) struct Broken;

impl Predictor for Broken {
    fn predict(&self, _x: &SampleMatrix) -> Result<LabelVector> {
        Err(RhoError::Collaborator("predict on broken model".to_string()))
    }
}

impl Classifier for Broken {
    fn fit(&mut self, _x: &SampleMatrix, _y: &LabelVector) -> Result<()> {
        Err(RhoError::Collaborator("fit exploded".to_string()))
    }
}

/// Adversarial classifier that appends `extra` shifted copies of its first
/// rows at every fit, recording the row count it was handed each time.
pub(crate) struct Augmenting {
    pub extra: usize,
    pub fit_rows: Arc<Mutex<Vec<usize>>>,
    pub augmented_rows: Arc<Mutex<Vec<usize>>>,
    pub shrink: bool,
    aug: Option<(SampleMatrix, LabelVector)>,
}

impl Augmenting {
    pub fn new(extra: usize) -> Self {
        Self {
            extra,
            fit_rows: Arc::default(),
            augmented_rows: Arc::default(),
            shrink: false,
            aug: None,
        }
    }
}

impl Predictor for Augmenting {
    fn predict(&self, x: &SampleMatrix) -> Result<LabelVector> {
        Ok(x.column(0).mapv(|v| usize::from(v > 0.5)))
    }
}

impl AdversarialClassifier for Augmenting {
    fn fit_with_budget(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<()> {
        self.fit_rows.lock().unwrap().push(x.nrows());
        let (aug_x, aug_y) = if self.shrink {
            let keep = x.nrows() / 2;
            (x.slice(s![..keep, ..]).to_owned(), y.slice(s![..keep]).to_owned())
        } else {
            let extra = self.extra.min(x.nrows());
            let adv_x = &x.slice(s![..extra, ..]) + &shift_toward_boundary(
                &y.slice(s![..extra]).to_owned(),
                x.ncols(),
                eps,
            );
            let aug_x = ndarray::concatenate![ndarray::Axis(0), x.view(), adv_x.view()];
            let aug_y = ndarray::concatenate![ndarray::Axis(0), y.view(), y.slice(s![..extra])];
            (aug_x, aug_y)
        };
        self.augmented_rows.lock().unwrap().push(aug_x.nrows());
        self.aug = Some((aug_x, aug_y));
        Ok(())
    }

    fn augmented_set(&self) -> Option<(&SampleMatrix, &LabelVector)> {
        self.aug.as_ref().map(|(x, y)| (x, y))
    }
}

/// Adversarial classifier whose fit always fails.
pub(crate) struct BrokenAdversarial;

impl Predictor for BrokenAdversarial {
    fn predict(&self, _x: &SampleMatrix) -> Result<LabelVector> {
        Err(RhoError::Collaborator("predict on broken model".to_string()))
    }
}

impl AdversarialClassifier for BrokenAdversarial {
    fn fit_with_budget(&mut self, _x: &SampleMatrix, _y: &LabelVector, _eps: f64) -> Result<()> {
        Err(RhoError::Collaborator("adversarial fit exploded".to_string()))
    }

    fn augmented_set(&self) -> Option<(&SampleMatrix, &LabelVector)> {
        None
    }
}

/// Attack returning preset matrices.
///
/// `perturb_schedule` hands back all of them; `perturb` hands them out one
/// per call. The optional worst-case matrix is exposed as is.
#[derive(Clone)]
pub(crate) struct Fixed {
    pub per_budget: Vec<SampleMatrix>,
    pub worst: Option<SampleMatrix>,
    calls: usize,
}

impl Fixed {
    pub fn new(per_budget: Vec<SampleMatrix>) -> Self {
        Self {
            per_budget,
            worst: None,
            calls: 0,
        }
    }

    pub fn with_worst(mut self, worst: SampleMatrix) -> Self {
        self.worst = Some(worst);
        self
    }
}

impl Attack for Fixed {
    fn perturb(&mut self, _x: &SampleMatrix, _y: &LabelVector, _eps: f64) -> Result<SampleMatrix> {
        let idx = self.calls.min(self.per_budget.len().saturating_sub(1));
        self.calls += 1;
        self.per_budget
            .get(idx)
            .cloned()
            .ok_or_else(|| RhoError::Collaborator("no preset perturbation".to_string()))
    }

    fn perturb_schedule(
        &mut self,
        _x: &SampleMatrix,
        _y: &LabelVector,
        _schedule: &[f64],
    ) -> Result<Vec<SampleMatrix>> {
        Ok(self.per_budget.clone())
    }

    fn worst_case(&self) -> Option<&SampleMatrix> {
        self.worst.as_ref()
    }
}

/// Zero-perturbation attack recording every schedule it is handed and
/// counting single-budget calls.
#[derive(Clone, Default)]
pub(crate) struct Counting {
    pub schedules: Arc<Mutex<Vec<Vec<f64>>>>,
    pub single_calls: Arc<AtomicUsize>,
}

impl Attack for Counting {
    fn perturb(&mut self, x: &SampleMatrix, _y: &LabelVector, _eps: f64) -> Result<SampleMatrix> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(zeros_like(x))
    }

    fn perturb_schedule(
        &mut self,
        x: &SampleMatrix,
        _y: &LabelVector,
        schedule: &[f64],
    ) -> Result<Vec<SampleMatrix>> {
        self.schedules.lock().unwrap().push(schedule.to_vec());
        Ok(schedule.iter().map(|_| zeros_like(x)).collect())
    }
}

/// Attack pushing every sample toward the boundary by exactly `eps`, keeping
/// a full boundary crossing of `worst_amount` as its worst case.
pub(crate) struct Shift {
    pub worst_amount: Option<f64>,
    worst: Option<SampleMatrix>,
}

impl Shift {
    pub fn new(worst_amount: Option<f64>) -> Self {
        Self {
            worst_amount,
            worst: None,
        }
    }
}

impl Attack for Shift {
    fn perturb(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<SampleMatrix> {
        if let Some(amount) = self.worst_amount {
            self.worst = Some(shift_toward_boundary(y, x.ncols(), amount));
        }
        Ok(shift_toward_boundary(y, x.ncols(), eps))
    }

    fn worst_case(&self) -> Option<&SampleMatrix> {
        self.worst.as_ref()
    }
}

pub(crate) fn zeros_like(x: &SampleMatrix) -> SampleMatrix {
    Array2::zeros(x.raw_dim())
}

pub(crate) fn labels(values: &[usize]) -> LabelVector {
    Array1::from_vec(values.to_vec())
}
