//! Core types for ρ-eval adversarial robustness evaluation.
//!
//! This crate provides the shared vocabulary used by the evaluator and its
//! collaborators: sample and label matrices, the perturbation metric, the
//! epsilon schedule, the train/holdout split, and the robustness report.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod report;

pub use report::{RobustnessRecord, RobustnessReport, WorstCaseStats};

/// Slack allowed on top of a budget when checking perturbation norms.
pub const BUDGET_TOLERANCE: f64 = 1e-6;

/// Row-major sample matrix: one feature vector per row.
pub type SampleMatrix = Array2<f64>;

/// Encoded class indices aligned with the rows of a [`SampleMatrix`].
pub type LabelVector = Array1<usize>;

/// Norm used to measure perturbation size. Selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Norm {
    #[serde(rename = "1", alias = "l1")]
    L1,
    #[serde(rename = "2", alias = "l2")]
    L2,
    #[serde(rename = "inf", alias = "linf")]
    LInf,
}

impl Norm {
    /// Norm of a single vector.
    pub fn of(&self, v: ArrayView1<'_, f64>) -> f64 {
        match self {
            Norm::L1 => v.iter().map(|x| x.abs()).sum(),
            Norm::L2 => v.iter().map(|x| x * x).sum::<f64>().sqrt(),
            // f64::max drops NaN, so carry it through explicitly
            Norm::LInf => v.iter().fold(0.0, |acc: f64, x| {
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.max(x.abs())
                }
            }),
        }
    }

    /// Norm of every row of a matrix.
    pub fn row_norms(&self, m: ArrayView2<'_, f64>) -> Array1<f64> {
        m.rows().into_iter().map(|row| self.of(row)).collect()
    }

    /// Map `v` into the closed ball of the given radius.
    ///
    /// L∞ clamps each coordinate; L1 and L2 rescale the whole vector when it
    /// lies outside the ball. Vectors already inside are returned unchanged.
    pub fn project(&self, v: ArrayView1<'_, f64>, radius: f64) -> Array1<f64> {
        match self {
            Norm::LInf => v.mapv(|x| x.clamp(-radius, radius)),
            Norm::L1 | Norm::L2 => {
                let n = self.of(v);
                if n <= radius || n == 0.0 {
                    v.to_owned()
                } else {
                    v.mapv(|x| x * (radius / n))
                }
            }
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Norm::L1 => write!(f, "L1"),
            Norm::L2 => write!(f, "L2"),
            Norm::LInf => write!(f, "L∞"),
        }
    }
}

impl FromStr for Norm {
    type Err = RhoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "l1" => Ok(Norm::L1),
            "2" | "l2" => Ok(Norm::L2),
            "inf" | "linf" | "l_inf" | "max" => Ok(Norm::LInf),
            other => Err(RhoError::Config(format!(
                "Unknown norm '{}': expected one of 1, 2, inf",
                other
            ))),
        }
    }
}

/// Ordered sequence of perturbation budgets.
///
/// Order is positional: reports list one record per entry in this order.
/// Entries must be finite and non-negative; increasing order is conventional
/// but not required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct EpsilonSchedule(Vec<f64>);

impl EpsilonSchedule {
    pub fn new(eps: Vec<f64>) -> Result<Self> {
        if eps.is_empty() {
            return Err(RhoError::InvalidSchedule(
                "Epsilon schedule is empty".to_string(),
            ));
        }
        if let Some((idx, bad)) = eps
            .iter()
            .enumerate()
            .find(|(_, e)| !e.is_finite() || **e < 0.0)
        {
            return Err(RhoError::InvalidSchedule(format!(
                "Epsilon[{}] = {} is not a finite non-negative budget",
                idx, bad
            )));
        }
        Ok(Self(eps))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Whether budgets are strictly increasing.
    pub fn is_increasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] < w[1])
    }
}

impl TryFrom<Vec<f64>> for EpsilonSchedule {
    type Error = RhoError;

    fn try_from(eps: Vec<f64>) -> Result<Self> {
        Self::new(eps)
    }
}

impl From<EpsilonSchedule> for Vec<f64> {
    fn from(schedule: EpsilonSchedule) -> Self {
        schedule.0
    }
}

/// Training set plus a fixed-size holdout set, already preprocessed.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train_x: SampleMatrix,
    pub train_y: LabelVector,
    pub test_x: SampleMatrix,
    pub test_y: LabelVector,
}

impl DataSplit {
    /// Build a split, checking row/label alignment and feature dimensionality.
    pub fn new(
        train_x: SampleMatrix,
        train_y: LabelVector,
        test_x: SampleMatrix,
        test_y: LabelVector,
    ) -> Result<Self> {
        check_aligned(&train_x, &train_y)?;
        check_aligned(&test_x, &test_y)?;
        if train_x.ncols() != test_x.ncols() {
            return Err(RhoError::shape_mismatch(
                vec![test_x.nrows(), train_x.ncols()],
                vec![test_x.nrows(), test_x.ncols()],
            ));
        }
        Ok(Self {
            train_x,
            train_y,
            test_x,
            test_y,
        })
    }

    pub fn n_features(&self) -> usize {
        self.train_x.ncols()
    }
}

/// Check that a label vector has one entry per sample row.
pub fn check_aligned(x: &SampleMatrix, y: &LabelVector) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(RhoError::shape_mismatch(vec![x.nrows()], vec![y.len()]));
    }
    Ok(())
}

/// Errors raised by the evaluator and its collaborators.
#[derive(Debug, Error)]
pub enum RhoError {
    #[error(
        "Perturbation budget violated: row {row} has {metric} norm {norm:.9} > eps {eps} (+{tol:e})",
        tol = BUDGET_TOLERANCE
    )]
    BudgetViolation {
        row: usize,
        norm: f64,
        eps: f64,
        metric: Norm,
    },

    #[error("Schedule mismatch: {expected} budgets but {got} perturbation matrices")]
    ScheduleMismatch { expected: usize, got: usize },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid epsilon schedule: {0}")]
    InvalidSchedule(String),

    #[error("Holdout set is empty")]
    EmptyHoldout,

    #[error("Collaborator contract violated: {0}")]
    ContractViolation(String),

    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RhoError {
    /// Create a ShapeMismatch error, panicking if the shapes are identical.
    #[track_caller]
    pub fn shape_mismatch(expected: Vec<usize>, got: Vec<usize>) -> Self {
        if expected == got {
            let loc = std::panic::Location::caller();
            panic!(
                "BUG at {}:{}:{}: ShapeMismatch created with identical shapes: {:?}",
                loc.file(),
                loc.line(),
                loc.column(),
                expected
            );
        }
        RhoError::ShapeMismatch { expected, got }
    }

    /// Whether this error means the attack broke its budget contract.
    pub fn is_budget_violation(&self) -> bool {
        matches!(self, RhoError::BudgetViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, RhoError>;
