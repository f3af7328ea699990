//! Reference collaborators for ρ-eval.
//!
//! - [`KnnClassifier`]: static k-NN
//! - [`AdversarialKnn`]: k-NN retrained on its own adversarial examples
//! - [`NearestOppositeAttack`]: deterministic attack with a worst-case move
//! - [`RandomNoiseAttack`]: seeded noise with restarts
//!
//! [`registry`] maps configuration names onto these, together with each
//! entry's training regime and random-state capability.

pub mod adversarial;
pub mod knn;
pub mod nearest_opposite;
pub mod random_noise;
pub mod registry;

pub use adversarial::AdversarialKnn;
pub use knn::{nearest_neighbors, KnnClassifier};
pub use nearest_opposite::NearestOppositeAttack;
pub use random_noise::{NoiseConfig, RandomNoiseAttack};
pub use registry::{
    attack_entry, build_classifier, model_entry, AttackEntry, AttackParams, ModelEntry,
    ModelParams, RegisteredAttack, ATTACKS, MODELS,
};

#[cfg(test)]
mod tests;
