//! k-nearest-neighbour classifier.

use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;
use rho_core::{check_aligned, LabelVector, Result, RhoError, SampleMatrix};
use rho_eval::{Classifier, Predictor};
use tracing::{debug, trace};

/// Rows below this count are predicted serially.
const MIN_ROWS_FOR_PARALLEL: usize = 64;

/// Squared Euclidean distance.
fn sq_dist(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Indices of the `k` training rows closest to `row`, nearest first.
///
/// Equal distances keep training order.
pub fn nearest_neighbors(train_x: &SampleMatrix, row: ArrayView1<'_, f64>, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = train_x
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, t)| (sq_dist(t, row), i))
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    dists.truncate(k);
    dists.into_iter().map(|(_, i)| i).collect()
}

/// Majority vote over the `k` nearest training rows. Ties go to the smaller class.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    parallel: bool,
    train_x: Option<SampleMatrix>,
    train_y: Option<LabelVector>,
    n_classes: usize,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RhoError::Config("k must be at least 1".to_string()));
        }
        Ok(Self {
            k,
            parallel: true,
            train_x: None,
            train_y: None,
            n_classes: 0,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn vote(&self, train_x: &SampleMatrix, train_y: &LabelVector, row: ArrayView1<'_, f64>) -> usize {
        let mut counts = vec![0usize; self.n_classes];
        for i in nearest_neighbors(train_x, row, self.k) {
            counts[train_y[i]] += 1;
        }
        // max_by_key keeps the last maximum, so scan in reverse to favour the smaller class.
        counts
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, c)| *c)
            .map_or(0, |(class, _)| class)
    }
}

impl Predictor for KnnClassifier {
    fn predict(&self, x: &SampleMatrix) -> Result<LabelVector> {
        let (train_x, train_y) = match (&self.train_x, &self.train_y) {
            (Some(tx), Some(ty)) => (tx, ty),
            _ => {
                return Err(RhoError::Collaborator(
                    "knn: predict called before fit".to_string(),
                ))
            }
        };
        if x.ncols() != train_x.ncols() {
            return Err(RhoError::shape_mismatch(
                vec![x.nrows(), train_x.ncols()],
                vec![x.nrows(), x.ncols()],
            ));
        }
        let n = x.nrows();
        let labels: Vec<usize> = if self.parallel && n >= MIN_ROWS_FOR_PARALLEL {
            (0..n)
                .into_par_iter()
                .map(|i| self.vote(train_x, train_y, x.row(i)))
                .collect()
        } else {
            (0..n).map(|i| self.vote(train_x, train_y, x.row(i))).collect()
        };
        trace!(rows = n, k = self.k, "knn predicted");
        Ok(Array1::from(labels))
    }
}

impl Classifier for KnnClassifier {
    fn fit(&mut self, x: &SampleMatrix, y: &LabelVector) -> Result<()> {
        check_aligned(x, y)?;
        if x.nrows() == 0 {
            return Err(RhoError::Collaborator("knn: empty training set".to_string()));
        }
        self.n_classes = y.iter().copied().max().map_or(0, |m| m + 1);
        self.train_x = Some(x.clone());
        self.train_y = Some(y.clone());
        debug!(rows = x.nrows(), classes = self.n_classes, k = self.k, "knn fitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn fitted(k: usize) -> KnnClassifier {
        let x = arr2(&[[0.0, 0.0], [0.1, 0.0], [1.0, 1.0], [0.9, 1.0], [0.5, 0.5]]);
        let y = arr1(&[0usize, 0, 1, 1, 2]);
        let mut knn = KnnClassifier::new(k).unwrap();
        knn.fit(&x, &y).unwrap();
        knn
    }

    #[test]
    fn test_one_nn_recovers_training_labels() {
        let knn = fitted(1);
        let x = arr2(&[[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]]);
        assert_eq!(knn.predict(&x).unwrap(), arr1(&[0, 1, 2]));
    }

    #[test]
    fn test_tie_goes_to_smaller_class() {
        // Neighbours of the query: one class 0 and one class 1 at equal counts.
        let x = arr2(&[[0.0], [2.0]]);
        let y = arr1(&[1usize, 0]);
        let mut knn = KnnClassifier::new(2).unwrap();
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&arr2(&[[0.1]])).unwrap(), arr1(&[0]));
    }

    #[test]
    fn test_k_larger_than_training_set_uses_all_rows() {
        let knn = fitted(50);
        let pred = knn.predict(&arr2(&[[0.0, 0.0]])).unwrap();
        // Two votes each for classes 0 and 1, one for class 2.
        assert_eq!(pred, arr1(&[0]));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let x = SampleMatrix::from_shape_fn((200, 3), |(i, j)| ((i * 7 + j * 13) % 17) as f64);
        let y: LabelVector = (0..200).map(|i| i % 3).collect();
        let queries = SampleMatrix::from_shape_fn((100, 3), |(i, j)| ((i * 5 + j) % 11) as f64);

        let mut serial = KnnClassifier::new(5).unwrap().with_parallel(false);
        serial.fit(&x, &y).unwrap();
        let mut parallel = KnnClassifier::new(5).unwrap();
        parallel.fit(&x, &y).unwrap();
        assert_eq!(serial.predict(&queries).unwrap(), parallel.predict(&queries).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let knn = KnnClassifier::new(3).unwrap();
        assert!(matches!(
            knn.predict(&arr2(&[[0.0]])).unwrap_err(),
            RhoError::Collaborator(_)
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(matches!(KnnClassifier::new(0).unwrap_err(), RhoError::Config(_)));
    }

    #[test]
    fn test_feature_mismatch_rejected() {
        let knn = fitted(1);
        assert!(matches!(
            knn.predict(&arr2(&[[0.0, 0.0, 0.0]])).unwrap_err(),
            RhoError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_nearest_neighbors_order() {
        let x = arr2(&[[3.0], [1.0], [2.0], [1.0]]);
        assert_eq!(nearest_neighbors(&x, arr1(&[0.0]).view(), 3), vec![1, 3, 2]);
    }
}
