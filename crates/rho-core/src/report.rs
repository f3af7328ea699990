//! Robustness report types.
//!
//! A report is the only output of an evaluation run. It is serialized to JSON
//! for humans and downstream tooling; optional fields are omitted rather than
//! written as `null` so that the shape of the stats tells which accounting
//! path produced them.

use crate::{Result, RhoError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Accuracy on the perturbed holdout set for one budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustnessRecord {
    pub eps: f64,
    pub test_accuracy: f64,
}

/// Summary of the attack's single worst-case perturbation per sample.
///
/// `missed_count` is present only when at least one holdout sample kept its
/// correct prediction; `mean_norm` then averages over the flipped rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstCaseStats {
    /// Budget of the iteration that produced the stats (adversarial regime only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    /// Mean perturbation norm over flipped rows.
    ///
    /// Always serialized. `null` means no holdout row flipped; `missed_count`
    /// then equals the holdout size, so it is never a total-success record.
    pub mean_norm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_count: Option<usize>,
}

impl WorstCaseStats {
    /// Whether every holdout sample was flipped.
    pub fn is_total_success(&self) -> bool {
        self.missed_count.is_none()
    }
}

/// Result of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    /// One record per budget, in schedule order.
    pub results: Vec<RobustnessRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst_case: Option<WorstCaseStats>,
    /// Rows in the training set handed to the first fit.
    pub training_set_size: usize,
    /// Rows in the final augmented training set (adversarial regime only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented_set_size: Option<usize>,
}

impl RobustnessReport {
    /// Budgets covered by the report, in order.
    pub fn budgets(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.eps).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the report as JSON, writing to a temp file then renaming so a
    /// crash never leaves a truncated report behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        let temp_path = path.with_extension("json.tmp");

        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report: Self = serde_json::from_str(&json)?;
        if report.results.is_empty() {
            return Err(RhoError::InvalidSchedule(format!(
                "Report {} has no records",
                path.display()
            )));
        }
        Ok(report)
    }
}
