//! Label encoding over the sorted distinct labels of a dataset.

use ndarray::Array1;
use rho_core::{LabelVector, Result, RhoError};

/// Maps raw integer labels to dense class indices `0..n_classes`.
///
/// Classes are the sorted distinct labels seen at fit time, so class index
/// order matches label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<i64>,
}

impl LabelEncoder {
    pub fn fit(labels: &Array1<i64>) -> Result<Self> {
        let mut classes: Vec<i64> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.is_empty() {
            return Err(RhoError::Dataset("no labels to encode".to_string()));
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, labels: &Array1<i64>) -> Result<LabelVector> {
        labels
            .iter()
            .map(|label| {
                self.classes.binary_search(label).map_err(|_| {
                    RhoError::Dataset(format!("label {} was not seen when fitting", label))
                })
            })
            .collect::<Result<Vec<usize>>>()
            .map(Array1::from_vec)
    }
}
