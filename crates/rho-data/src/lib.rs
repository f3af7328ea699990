//! Datasets and the setup stage for ρ-eval.
//!
//! A [`Dataset`] is raw features, raw integer labels and a default epsilon
//! schedule. [`prepare`] turns it into a [`DataSplit`](rho_core::DataSplit):
//! seeded shuffle, fixed-size holdout, min-max scaling fitted on the training
//! rows, and label encoding over the sorted distinct labels.

pub mod encoder;
pub mod file;
pub mod scaler;
pub mod setup;
pub mod synthetic;

pub use encoder::LabelEncoder;
pub use file::DatasetFile;
pub use scaler::MinMaxScaler;
pub use setup::{prepare, split_indices, Prepared, SetupConfig, DEFAULT_HOLDOUT_SIZE};
pub use synthetic::BuiltinProvider;

use ndarray::Array1;
use rho_core::{EpsilonSchedule, Result, RhoError, SampleMatrix};

/// Raw dataset as handed out by a provider.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub features: SampleMatrix,
    pub labels: Array1<i64>,
    pub default_schedule: EpsilonSchedule,
}

impl Dataset {
    pub fn new(
        name: impl Into<String>,
        features: SampleMatrix,
        labels: Array1<i64>,
        default_schedule: EpsilonSchedule,
    ) -> Result<Self> {
        let name = name.into();
        if features.nrows() != labels.len() {
            return Err(RhoError::Dataset(format!(
                "{}: {} feature rows but {} labels",
                name,
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() == 0 {
            return Err(RhoError::Dataset(format!("{}: samples have no features", name)));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(RhoError::Dataset(format!(
                "{}: features contain NaN or infinite values",
                name
            )));
        }
        Ok(Self {
            name,
            features,
            labels,
            default_schedule,
        })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Source of named datasets.
pub trait DatasetProvider {
    fn load(&self, name: &str) -> Result<Dataset>;

    /// Names this provider can load.
    fn available(&self) -> Vec<String>;
}
