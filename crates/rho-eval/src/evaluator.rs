//! Robustness evaluator: regime selection and the per-budget loop.
//!
//! # Regimes
//!
//! - **Static**: fit once on clean data, ask the attack for the whole
//!   schedule in one call, then score each budget. Budgets are independent,
//!   so scoring may run on rayon when the schedule is long enough.
//! - **Adversarial**: for each budget in order, refit on the current training
//!   set with the budget, adopt the classifier's augmented set as the next
//!   training set, rebuild the attack against it, and score this budget.
//!   Each iteration depends on the previous fit, so this loop never runs in
//!   parallel.
//!
//! Both regimes share the validate → apply → predict → record step.

use crate::accountant::{accuracy, worst_case_stats};
use crate::apply::apply_perturbation;
use crate::assembler::ReportAssembler;
use crate::budget::validate_budget;
use crate::traits::{AdversarialClassifier, AttackFactory, Classifier, ClassifierHandle, Predictor};
use rayon::prelude::*;
use rho_core::{
    check_aligned, DataSplit, EpsilonSchedule, LabelVector, Norm, Result, RhoError,
    RobustnessRecord, RobustnessReport, SampleMatrix,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tuning knobs for the evaluation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Score static-regime budgets on rayon.
    pub parallel: bool,

    /// Minimum schedule length before parallel scoring is used.
    /// Below this threshold the loop runs serially.
    pub min_schedule_for_parallel: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_schedule_for_parallel: 4,
        }
    }
}

/// Everything a run needs besides the data and the collaborators.
///
/// Built once per run and passed explicitly; nothing here is mutated during
/// evaluation.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub seed: u64,
    pub metric: Norm,
    pub schedule: EpsilonSchedule,
    pub config: EvalConfig,
}

impl RunContext {
    pub fn new(seed: u64, metric: Norm, schedule: EpsilonSchedule) -> Self {
        Self {
            seed,
            metric,
            schedule,
            config: EvalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }
}

/// Runs one robustness evaluation.
pub struct Evaluator {
    ctx: RunContext,
}

impl Evaluator {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Evaluate `classifier` against attacks built by `attacks` on `split`.
    ///
    /// The regime follows the classifier handle's variant. Any error aborts
    /// the run; no partial report is returned.
    pub fn evaluate(
        &self,
        classifier: &mut ClassifierHandle,
        attacks: &dyn AttackFactory,
        split: &DataSplit,
    ) -> Result<RobustnessReport> {
        if split.test_x.nrows() == 0 {
            return Err(RhoError::EmptyHoldout);
        }
        debug!(
            regime = %classifier.regime(),
            budgets = self.ctx.schedule.len(),
            increasing = self.ctx.schedule.is_increasing(),
            metric = %self.ctx.metric,
            train = split.train_x.nrows(),
            holdout = split.test_x.nrows(),
            "Starting robustness evaluation"
        );
        match classifier {
            ClassifierHandle::Static(model) => self.evaluate_static(model.as_mut(), attacks, split),
            ClassifierHandle::Adversarial(model) => {
                self.evaluate_adversarial(model.as_mut(), attacks, split)
            }
        }
    }

    /// Static regime: one fit, one attack call for the whole schedule.
    pub fn evaluate_static(
        &self,
        model: &mut dyn Classifier,
        attacks: &dyn AttackFactory,
        split: &DataSplit,
    ) -> Result<RobustnessReport> {
        let schedule = self.ctx.schedule.as_slice();
        let metric = self.ctx.metric;

        model.fit(&split.train_x, &split.train_y)?;

        let mut attack = attacks.build(&split.train_x, &split.train_y)?;
        let perturbations = attack.perturb_schedule(&split.test_x, &split.test_y, schedule)?;
        if perturbations.len() != schedule.len() {
            return Err(RhoError::ScheduleMismatch {
                expected: schedule.len(),
                got: perturbations.len(),
            });
        }

        // Validate every budget before any prediction is made.
        for (&eps, perturbation) in schedule.iter().zip(&perturbations) {
            validate_budget(perturbation.view(), eps, metric)?;
        }

        let model: &dyn Classifier = model;
        let use_parallel =
            self.ctx.config.parallel && schedule.len() >= self.ctx.config.min_schedule_for_parallel;
        let records: Vec<RobustnessRecord> = if use_parallel {
            debug!("Scoring {} budgets in parallel", schedule.len());
            schedule
                .par_iter()
                .zip(perturbations.par_iter())
                .map(|(&eps, perturbation)| {
                    score_budget(model, &split.test_x, &split.test_y, perturbation, eps)
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            schedule
                .iter()
                .zip(&perturbations)
                .map(|(&eps, perturbation)| {
                    score_budget(model, &split.test_x, &split.test_y, perturbation, eps)
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut report = ReportAssembler::new(split.train_x.nrows());
        for record in records {
            info!(
                eps = record.eps,
                test_accuracy = record.test_accuracy,
                "Budget scored"
            );
            report.push(record);
        }

        if let Some(worst) = attack.worst_case() {
            let stats = worst_case_stats(model, &split.test_x, &split.test_y, worst, metric, None)?;
            info!(
                mean_norm = ?stats.mean_norm,
                missed_count = ?stats.missed_count,
                "Worst-case perturbation stats"
            );
            report.set_worst_case(stats);
        }

        report.finish(&self.ctx.schedule)
    }

    /// Adversarial regime: refit and re-attack at every budget, in order.
    pub fn evaluate_adversarial(
        &self,
        model: &mut dyn AdversarialClassifier,
        attacks: &dyn AttackFactory,
        split: &DataSplit,
    ) -> Result<RobustnessReport> {
        let metric = self.ctx.metric;
        let n_features = split.n_features();
        let mut train_x = split.train_x.clone();
        let mut train_y = split.train_y.clone();
        let mut report = ReportAssembler::new(split.train_x.nrows());

        for (idx, eps) in self.ctx.schedule.iter().enumerate() {
            model.fit_with_budget(&train_x, &train_y, eps)?;
            let (aug_x, aug_y) = adopt_augmented_set(&*model, train_x.nrows(), n_features)?;
            debug!(
                iteration = idx,
                eps,
                before = train_x.nrows(),
                after = aug_x.nrows(),
                "Training set augmented"
            );
            train_x = aug_x;
            train_y = aug_y;

            let mut attack = attacks.build(&train_x, &train_y)?;
            let perturbation = attack.perturb(&split.test_x, &split.test_y, eps)?;
            validate_budget(perturbation.view(), eps, metric)?;

            let record = score_budget(&*model, &split.test_x, &split.test_y, &perturbation, eps)?;
            info!(
                eps = record.eps,
                test_accuracy = record.test_accuracy,
                augmented = train_x.nrows(),
                "Budget scored"
            );
            report.push(record);

            if let Some(worst) = attack.worst_case() {
                let stats =
                    worst_case_stats(&*model, &split.test_x, &split.test_y, worst, metric, Some(eps))?;
                report.set_worst_case(stats);
            }
        }

        report.set_augmented_set_size(train_x.nrows());
        report.finish(&self.ctx.schedule)
    }
}

/// Apply one budget's perturbation, predict, and record the accuracy.
///
/// The perturbation must already have passed budget validation.
pub fn score_budget<P: Predictor + ?Sized>(
    model: &P,
    test_x: &SampleMatrix,
    test_y: &LabelVector,
    perturbation: &SampleMatrix,
    eps: f64,
) -> Result<RobustnessRecord> {
    let perturbed = apply_perturbation(test_x, perturbation)?;
    let predicted = model.predict(&perturbed)?;
    Ok(RobustnessRecord {
        eps,
        test_accuracy: accuracy(&predicted, test_y)?,
    })
}

/// Read back the augmented set after a fit and check it against the contract:
/// present, aligned, same feature count, and no smaller than the set it was
/// fitted on.
fn adopt_augmented_set(
    model: &dyn AdversarialClassifier,
    fitted_rows: usize,
    n_features: usize,
) -> Result<(SampleMatrix, LabelVector)> {
    let (aug_x, aug_y) = model.augmented_set().ok_or_else(|| {
        RhoError::ContractViolation("classifier exposed no augmented set after fit".to_string())
    })?;
    check_aligned(aug_x, aug_y)?;
    if aug_x.ncols() != n_features {
        return Err(RhoError::shape_mismatch(
            vec![aug_x.nrows(), n_features],
            vec![aug_x.nrows(), aug_x.ncols()],
        ));
    }
    if aug_x.nrows() < fitted_rows {
        return Err(RhoError::ContractViolation(format!(
            "augmented set shrank from {} to {} rows",
            fitted_rows,
            aug_x.nrows()
        )));
    }
    Ok((aug_x.clone(), aug_y.clone()))
}
