//! Run configuration.
//!
//! Loaded from a JSON file with `--config`; command-line flags override
//! individual fields afterwards.

use rho_core::{EpsilonSchedule, Norm, Result, RhoError};
use rho_data::DEFAULT_HOLDOUT_SIZE;
use rho_eval::{EvalConfig, TrainingRegime};
use rho_models::{attack_entry, model_entry};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Built-in dataset name or path to a JSON dataset file.
    pub dataset: String,
    /// Sample count for built-in datasets.
    pub samples: usize,
    pub model: String,
    pub attack: String,
    pub ord: Norm,
    pub random_seed: u64,
    pub holdout_size: usize,
    /// Replaces the dataset's default schedule when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<Vec<f64>>,
    /// Expected training regime of `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<TrainingRegime>,
    pub k: usize,
    pub restarts: usize,
    pub eval: EvalConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dataset: "blobs".to_string(),
            samples: 600,
            model: "knn".to_string(),
            attack: "nearest_opposite".to_string(),
            ord: Norm::L2,
            random_seed: 0,
            holdout_size: DEFAULT_HOLDOUT_SIZE,
            eps: None,
            regime: None,
            k: 3,
            restarts: 10,
            eval: EvalConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check names and numeric fields before any work starts.
    pub fn validate(&self) -> Result<()> {
        let model = model_entry(&self.model)?;
        attack_entry(&self.attack)?;
        if let Some(regime) = self.regime {
            if regime != model.regime {
                return Err(RhoError::Config(format!(
                    "regime is {} but model '{}' is {}",
                    regime, self.model, model.regime
                )));
            }
        }
        if self.k == 0 {
            return Err(RhoError::Config("k must be at least 1".to_string()));
        }
        if self.restarts == 0 {
            return Err(RhoError::Config("restarts must be at least 1".to_string()));
        }
        if self.holdout_size == 0 {
            return Err(RhoError::Config("holdout_size must be positive".to_string()));
        }
        if let Some(eps) = &self.eps {
            EpsilonSchedule::new(eps.clone())?;
        }
        Ok(())
    }

    /// The configured schedule, or `default` when none is set.
    pub fn schedule(&self, default: &EpsilonSchedule) -> Result<EpsilonSchedule> {
        match &self.eps {
            Some(eps) => EpsilonSchedule::new(eps.clone()),
            None => Ok(default.clone()),
        }
    }

    /// Whether `dataset` names a file rather than a built-in.
    pub fn dataset_is_file(&self) -> bool {
        self.dataset.ends_with(".json") || Path::new(&self.dataset).is_file()
    }
}
