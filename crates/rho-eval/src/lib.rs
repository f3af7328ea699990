//! Robustness evaluation for ρ-eval.
//!
//! Given a data split, a classifier, an attack factory and an epsilon
//! schedule, the [`Evaluator`] measures holdout accuracy under perturbation at
//! every budget and assembles a [`RobustnessReport`].
//!
//! The pieces compose bottom-up:
//! - [`budget`]: per-row norm check against `eps + 1e-6`
//! - [`apply`]: elementwise addition of a perturbation
//! - [`accountant`]: accuracy and worst-case perturbation statistics
//! - [`assembler`]: positional collection of per-budget records
//! - [`evaluator`]: static and adversarial regimes
//!
//! [`RobustnessReport`]: rho_core::RobustnessReport

pub mod accountant;
pub mod apply;
pub mod assembler;
pub mod budget;
pub mod evaluator;
pub mod traits;

pub use accountant::{accuracy, classify_worst_case, worst_case_stats, WorstCaseOutcome};
pub use apply::apply_perturbation;
pub use assembler::ReportAssembler;
pub use budget::validate_budget;
pub use evaluator::{score_budget, EvalConfig, Evaluator, RunContext};
pub use traits::{
    AdversarialClassifier, Attack, AttackFactory, Classifier, ClassifierHandle, Predictor,
    TrainingRegime,
};

pub use rho_core::{
    DataSplit, EpsilonSchedule, LabelVector, Norm, Result, RhoError, RobustnessRecord,
    RobustnessReport, SampleMatrix, WorstCaseStats,
};

#[cfg(test)]
mod tests;
