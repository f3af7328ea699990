//! Collaborator interfaces seen by the evaluator.
//!
//! Classifiers and attacks are opaque beyond these traits. The training regime
//! is carried by [`ClassifierHandle`] as an explicit variant instead of being
//! inferred from a model name.

use rho_core::{LabelVector, Result, RhoError, SampleMatrix};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anything that maps samples to class indices.
pub trait Predictor: Send + Sync {
    /// Predict one label per row of `x`.
    fn predict(&self, x: &SampleMatrix) -> Result<LabelVector>;
}

/// A classifier trained once on unperturbed data.
pub trait Classifier: Predictor {
    fn fit(&mut self, x: &SampleMatrix, y: &LabelVector) -> Result<()>;
}

/// A classifier that retrains under a perturbation budget.
///
/// `fit_with_budget` augments the given training set with adversarial
/// examples it generates itself; the augmented pair must be readable through
/// [`augmented_set`](AdversarialClassifier::augmented_set) once it returns.
pub trait AdversarialClassifier: Predictor {
    fn fit_with_budget(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<()>;

    /// Training set used by the last fit, including generated samples.
    fn augmented_set(&self) -> Option<(&SampleMatrix, &LabelVector)>;
}

/// Produces perturbation matrices for a holdout set.
pub trait Attack: Send {
    /// One perturbation per row of `x`, each meant to stay within `eps`.
    fn perturb(&mut self, x: &SampleMatrix, y: &LabelVector, eps: f64) -> Result<SampleMatrix>;

    /// One perturbation matrix per budget, in schedule order.
    fn perturb_schedule(
        &mut self,
        x: &SampleMatrix,
        y: &LabelVector,
        schedule: &[f64],
    ) -> Result<Vec<SampleMatrix>> {
        schedule
            .iter()
            .map(|&eps| self.perturb(x, y, eps))
            .collect()
    }

    /// The attack's single chosen perturbation per sample, if it keeps one.
    fn worst_case(&self) -> Option<&SampleMatrix> {
        None
    }
}

/// Builds an attack against a particular training set.
///
/// In the adversarial regime the training set changes every iteration, so
/// the evaluator rebuilds the attack after each fit.
pub trait AttackFactory {
    fn build(&self, train_x: &SampleMatrix, train_y: &LabelVector) -> Result<Box<dyn Attack>>;
}

impl<F> AttackFactory for F
where
    F: Fn(&SampleMatrix, &LabelVector) -> Result<Box<dyn Attack>>,
{
    fn build(&self, train_x: &SampleMatrix, train_y: &LabelVector) -> Result<Box<dyn Attack>> {
        self(train_x, train_y)
    }
}

/// How a classifier is trained during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingRegime {
    /// Trained once on clean data.
    Static,
    /// Retrained at every budget on its own augmented set.
    Adversarial,
}

impl fmt::Display for TrainingRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingRegime::Static => write!(f, "static"),
            TrainingRegime::Adversarial => write!(f, "adversarial"),
        }
    }
}

impl FromStr for TrainingRegime {
    type Err = RhoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(TrainingRegime::Static),
            "adversarial" | "robust" => Ok(TrainingRegime::Adversarial),
            other => Err(RhoError::Config(format!(
                "Unknown training regime '{}': expected static or adversarial",
                other
            ))),
        }
    }
}

/// A classifier tagged with its training regime.
pub enum ClassifierHandle {
    Static(Box<dyn Classifier>),
    Adversarial(Box<dyn AdversarialClassifier>),
}

impl ClassifierHandle {
    pub fn regime(&self) -> TrainingRegime {
        match self {
            ClassifierHandle::Static(_) => TrainingRegime::Static,
            ClassifierHandle::Adversarial(_) => TrainingRegime::Adversarial,
        }
    }

    pub fn predict(&self, x: &SampleMatrix) -> Result<LabelVector> {
        match self {
            ClassifierHandle::Static(c) => c.predict(x),
            ClassifierHandle::Adversarial(c) => c.predict(x),
        }
    }
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassifierHandle")
            .field(&self.regime())
            .finish()
    }
}
