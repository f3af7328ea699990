//! Min-max feature scaling to `[0, 1]`.

use ndarray::{Array1, Axis};
use rho_core::{Result, RhoError, SampleMatrix};

/// Per-feature affine map fitted on training rows.
///
/// Constant features get a unit scale so they map to zero instead of
/// dividing by zero. Rows transformed after fitting may fall outside
/// `[0, 1]` when they exceed the training range.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    scale: Array1<f64>,
}

impl MinMaxScaler {
    pub fn fit(x: &SampleMatrix) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(RhoError::Dataset(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }
        let min = x.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let scale = (&max - &min).mapv(|range| if range > 0.0 { range } else { 1.0 });
        Ok(Self { min, scale })
    }

    pub fn transform(&self, x: &SampleMatrix) -> Result<SampleMatrix> {
        if x.ncols() != self.min.len() {
            return Err(RhoError::shape_mismatch(
                vec![x.nrows(), self.min.len()],
                vec![x.nrows(), x.ncols()],
            ));
        }
        Ok((x - &self.min) / &self.scale)
    }

    pub fn fit_transform(x: &SampleMatrix) -> Result<(Self, SampleMatrix)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    pub fn n_features(&self) -> usize {
        self.min.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_fit_transform_maps_to_unit_interval() {
        let x = arr2(&[[0.0, 10.0], [5.0, 20.0], [10.0, 30.0]]);
        let (_, scaled) = MinMaxScaler::fit_transform(&x).unwrap();
        assert_eq!(scaled, arr2(&[[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]]));
    }

    #[test]
    fn test_constant_feature_maps_to_zero() {
        let x = arr2(&[[3.0, 1.0], [3.0, 2.0]]);
        let (_, scaled) = MinMaxScaler::fit_transform(&x).unwrap();
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_transform_uses_training_range() {
        let scaler = MinMaxScaler::fit(&arr2(&[[0.0], [2.0]])).unwrap();
        let out = scaler.transform(&arr2(&[[4.0], [-2.0]])).unwrap();
        assert_eq!(out, arr2(&[[2.0], [-1.0]]));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let scaler = MinMaxScaler::fit(&arr2(&[[0.0, 1.0]])).unwrap();
        assert!(scaler.transform(&arr2(&[[0.0]])).is_err());
        assert_eq!(scaler.n_features(), 2);
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(MinMaxScaler::fit(&SampleMatrix::zeros((0, 2))).is_err());
    }
}
