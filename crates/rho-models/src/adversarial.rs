//! Adversarially trained k-NN.

use crate::{KnnClassifier, NearestOppositeAttack};
use ndarray::{concatenate, Axis};
use rho_core::{check_aligned, LabelVector, Norm, Result, RhoError, SampleMatrix};
use rho_eval::{apply_perturbation, AdversarialClassifier, Attack, Classifier, Predictor};
use tracing::debug;

/// k-NN that, for each budget, attacks its own training set with the
/// nearest-opposite attack and refits on the union of the clean rows and
/// the adversarial rows that fooled it.
///
/// Adversarial rows keep their source sample's label.
#[derive(Debug, Clone)]
pub struct AdversarialKnn {
    inner: KnnClassifier,
    metric: Norm,
    augmented: Option<(SampleMatrix, LabelVector)>,
}

impl AdversarialKnn {
    pub fn new(k: usize, metric: Norm) -> Result<Self> {
        Ok(Self {
            inner: KnnClassifier::new(k)?,
            metric,
            augmented: None,
        })
    }
}

impl Predictor for AdversarialKnn {
    fn predict(&self, x: &SampleMatrix) -> Result<LabelVector> {
        self.inner.predict(x)
    }
}

impl AdversarialClassifier for AdversarialKnn {
    fn fit_with_budget(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<()> {
        check_aligned(x, y)?;
        self.inner.fit(x, y)?;
        if eps == 0.0 {
            self.augmented = Some((x.clone(), y.clone()));
            return Ok(());
        }

        let mut attack = NearestOppositeAttack::new(x, y, self.metric)?;
        let perturbation = attack.perturb(x, y, eps)?;
        let adv = apply_perturbation(x, &perturbation)?;
        let predicted = self.inner.predict(&adv)?;

        let fooled: Vec<usize> = predicted
            .iter()
            .zip(y.iter())
            .enumerate()
            .filter(|(_, (p, t))| p != t)
            .map(|(i, _)| i)
            .collect();

        let adv_x = adv.select(Axis(0), &fooled);
        let adv_y = y.select(Axis(0), &fooled);
        let aug_x = concatenate(Axis(0), &[x.view(), adv_x.view()])
            .map_err(|e| RhoError::Collaborator(format!("adv_knn: {}", e)))?;
        let aug_y = concatenate(Axis(0), &[y.view(), adv_y.view()])
            .map_err(|e| RhoError::Collaborator(format!("adv_knn: {}", e)))?;
        debug!(
            eps,
            clean = x.nrows(),
            added = fooled.len(),
            total = aug_x.nrows(),
            "adv_knn augmented training set"
        );
        self.inner.fit(&aug_x, &aug_y)?;
        self.augmented = Some((aug_x, aug_y));
        Ok(())
    }

    fn augmented_set(&self) -> Option<(&SampleMatrix, &LabelVector)> {
        self.augmented.as_ref().map(|(x, y)| (x, y))
    }
}
