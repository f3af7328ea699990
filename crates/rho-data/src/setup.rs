//! Setup stage: seeded split, scaling, and label encoding.

use crate::{Dataset, LabelEncoder, MinMaxScaler};
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rho_core::{DataSplit, EpsilonSchedule, Result, RhoError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of samples held out for evaluation unless configured otherwise.
pub const DEFAULT_HOLDOUT_SIZE: usize = 100;

/// Setup parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    pub seed: u64,
    pub holdout_size: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            holdout_size: DEFAULT_HOLDOUT_SIZE,
        }
    }
}

/// Output of the setup stage.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub split: DataSplit,
    pub scaler: MinMaxScaler,
    pub encoder: LabelEncoder,
    /// The dataset's default schedule.
    pub schedule: EpsilonSchedule,
}

/// Shuffle `0..n` with the seed and split off the last `holdout` indices.
///
/// Returns `(train, holdout)`. The same seed always yields the same split.
pub fn split_indices(n: usize, holdout: usize, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if holdout == 0 {
        return Err(RhoError::Config("holdout size must be positive".to_string()));
    }
    if n <= holdout {
        return Err(RhoError::Dataset(format!(
            "dataset has {} samples; need more than the holdout size {}",
            n, holdout
        )));
    }
    let mut idxs: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idxs.shuffle(&mut rng);
    let test = idxs.split_off(n - holdout);
    Ok((idxs, test))
}

/// Run the setup stage on a dataset.
///
/// The scaler is fitted on the training rows only and applied to both sides;
/// the label encoder is fitted on every label so that a class present only in
/// the holdout still gets an index.
pub fn prepare(dataset: &Dataset, config: &SetupConfig) -> Result<Prepared> {
    let (train_idx, test_idx) = split_indices(dataset.len(), config.holdout_size, config.seed)?;

    let train_raw = dataset.features.select(Axis(0), &train_idx);
    let test_raw = dataset.features.select(Axis(0), &test_idx);

    let (scaler, train_x) = MinMaxScaler::fit_transform(&train_raw)?;
    let test_x = scaler.transform(&test_raw)?;

    let encoder = LabelEncoder::fit(&dataset.labels)?;
    let train_y = encoder.encode(&dataset.labels.select(Axis(0), &train_idx))?;
    let test_y = encoder.encode(&dataset.labels.select(Axis(0), &test_idx))?;

    debug!(
        dataset = %dataset.name,
        train = train_x.nrows(),
        holdout = test_x.nrows(),
        features = train_x.ncols(),
        classes = encoder.n_classes(),
        seed = config.seed,
        "Dataset prepared"
    );

    Ok(Prepared {
        split: DataSplit::new(train_x, train_y, test_x, test_y)?,
        scaler,
        encoder,
        schedule: dataset.default_schedule.clone(),
    })
}
