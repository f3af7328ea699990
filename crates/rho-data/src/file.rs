//! JSON dataset files.
//!
//! Format:
//! ```json
//! { "name": "iris", "features": [[5.1, 3.5], ...], "labels": [0, ...], "eps_list": [0.0, 0.1] }
//! ```
//! `name` is optional and defaults to the file stem.

use crate::Dataset;
use ndarray::{Array1, Array2};
use rho_core::{EpsilonSchedule, Result, RhoError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// On-disk dataset description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
    pub eps_list: Vec<f64>,
}

impl DatasetFile {
    /// Read and parse a dataset file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: DatasetFile = serde_json::from_str(&content)?;
        Ok(file)
    }

    /// Read a dataset file and convert it into a [`Dataset`].
    pub fn load(path: &Path) -> Result<Dataset> {
        let file = Self::read(path)?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let dataset = file.into_dataset(&fallback)?;
        debug!(
            path = %path.display(),
            samples = dataset.len(),
            features = dataset.n_features(),
            "Loaded dataset file"
        );
        Ok(dataset)
    }

    /// Convert into a [`Dataset`], checking the feature rows are rectangular.
    pub fn into_dataset(self, fallback_name: &str) -> Result<Dataset> {
        let name = self.name.unwrap_or_else(|| fallback_name.to_string());
        let rows = self.features.len();
        let cols = self.features.first().map_or(0, Vec::len);
        if let Some((idx, row)) = self
            .features
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != cols)
        {
            return Err(RhoError::Dataset(format!(
                "{}: row {} has {} features, expected {}",
                name,
                idx,
                row.len(),
                cols
            )));
        }
        let flat: Vec<f64> = self.features.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| RhoError::Dataset(format!("{}: {}", name, e)))?;
        let schedule = EpsilonSchedule::new(self.eps_list)?;
        Dataset::new(name, features, Array1::from(self.labels), schedule)
    }
}
