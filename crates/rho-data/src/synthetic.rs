//! Seeded synthetic datasets.

use crate::{Dataset, DatasetProvider};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rho_core::{EpsilonSchedule, Result, RhoError};
use std::f64::consts::PI;
use tracing::debug;

const BUILTIN: &[&str] = &["blobs", "moons", "xor"];

/// Provider for the built-in `blobs`, `moons` and `xor` datasets.
///
/// Generation is fully determined by `seed` and `sample_count`.
#[derive(Debug, Clone)]
pub struct BuiltinProvider {
    pub sample_count: usize,
    pub seed: u64,
}

impl Default for BuiltinProvider {
    fn default() -> Self {
        Self {
            sample_count: 600,
            seed: 0,
        }
    }
}

impl BuiltinProvider {
    pub fn new(sample_count: usize, seed: u64) -> Self {
        Self { sample_count, seed }
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Three isotropic Gaussian clusters in the plane.
    fn blobs(&self) -> (Array2<f64>, Array1<i64>) {
        const CENTERS: [[f64; 2]; 3] = [[-2.0, -2.0], [2.0, -1.0], [0.0, 2.5]];
        const SPREAD: f64 = 0.8;
        let mut rng = self.rng();
        let n = self.sample_count;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let class = i % CENTERS.len();
            let (g0, g1) = gaussian_pair(&mut rng);
            x[[i, 0]] = CENTERS[class][0] + SPREAD * g0;
            x[[i, 1]] = CENTERS[class][1] + SPREAD * g1;
            y[i] = class as i64;
        }
        (x, y)
    }

    /// Two interleaving half circles with Gaussian noise.
    fn moons(&self) -> (Array2<f64>, Array1<i64>) {
        const NOISE: f64 = 0.1;
        let mut rng = self.rng();
        let n = self.sample_count;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let t = rng.random_range(0.0..PI);
            let (g0, g1) = gaussian_pair(&mut rng);
            let (px, py) = if i % 2 == 0 {
                (t.cos(), t.sin())
            } else {
                (1.0 - t.cos(), 0.5 - t.sin())
            };
            x[[i, 0]] = px + NOISE * g0;
            x[[i, 1]] = py + NOISE * g1;
            y[i] = (i % 2) as i64;
        }
        (x, y)
    }

    /// Uniform points in [-1, 1]^2 labelled by the sign of `x0 * x1`.
    fn xor(&self) -> (Array2<f64>, Array1<i64>) {
        let mut rng = self.rng();
        let n = self.sample_count;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a: f64 = rng.random_range(-1.0..1.0);
            let b: f64 = rng.random_range(-1.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            y[i] = i64::from(a * b > 0.0);
        }
        (x, y)
    }
}

/// Two independent standard normal draws (Box-Muller).
fn gaussian_pair<R: Rng>(rng: &mut R) -> (f64, f64) {
    // 1 - u keeps the log argument in (0, 1].
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (r * theta.cos(), r * theta.sin())
}

impl DatasetProvider for BuiltinProvider {
    fn load(&self, name: &str) -> Result<Dataset> {
        let (features, labels, eps) = match name {
            "blobs" => {
                let (x, y) = self.blobs();
                (x, y, vec![0.0, 0.05, 0.1, 0.2, 0.3, 0.5])
            }
            "moons" => {
                let (x, y) = self.moons();
                (x, y, vec![0.0, 0.02, 0.05, 0.1, 0.15, 0.2])
            }
            "xor" => {
                let (x, y) = self.xor();
                (x, y, vec![0.0, 0.05, 0.1, 0.2])
            }
            other => {
                return Err(RhoError::Config(format!(
                    "Unknown dataset '{}': expected one of {} or a path to a JSON file",
                    other,
                    BUILTIN.join(", ")
                )))
            }
        };
        debug!(
            dataset = name,
            samples = self.sample_count,
            seed = self.seed,
            "Generated synthetic dataset"
        );
        Dataset::new(name, features, labels, EpsilonSchedule::new(eps)?)
    }

    fn available(&self) -> Vec<String> {
        BUILTIN.iter().map(|s| s.to_string()).collect()
    }
}
