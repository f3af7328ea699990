//! Name-to-collaborator registry.
//!
//! Every entry declares its training regime and whether it takes a random
//! state, so callers never have to guess either from a name or a signature.

use crate::{AdversarialKnn, KnnClassifier, NearestOppositeAttack, NoiseConfig, RandomNoiseAttack};
use rho_core::{LabelVector, Norm, Result, RhoError, SampleMatrix};
use rho_eval::{Attack, AttackFactory, ClassifierHandle, TrainingRegime};
use serde::Serialize;
use tracing::debug;

/// Registered classifier.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelEntry {
    pub name: &'static str,
    pub regime: TrainingRegime,
    pub accepts_random_state: bool,
    pub description: &'static str,
}

/// Registered attack.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AttackEntry {
    pub name: &'static str,
    pub accepts_random_state: bool,
    pub has_worst_case: bool,
    pub description: &'static str,
}

pub const MODELS: &[ModelEntry] = &[
    ModelEntry {
        name: "knn",
        regime: TrainingRegime::Static,
        accepts_random_state: false,
        description: "k-nearest-neighbour majority vote",
    },
    ModelEntry {
        name: "adv_knn",
        regime: TrainingRegime::Adversarial,
        accepts_random_state: false,
        description: "k-NN retrained on its own nearest-opposite adversarial examples",
    },
];

pub const ATTACKS: &[AttackEntry] = &[
    AttackEntry {
        name: "nearest_opposite",
        accepts_random_state: false,
        has_worst_case: true,
        description: "move toward the nearest differently-labelled training point",
    },
    AttackEntry {
        name: "random_noise",
        accepts_random_state: true,
        has_worst_case: false,
        description: "uniform noise in the budget ball with restarts",
    },
];

pub fn model_entry(name: &str) -> Result<&'static ModelEntry> {
    MODELS.iter().find(|m| m.name == name).ok_or_else(|| {
        RhoError::Config(format!(
            "Unknown model '{}': expected one of {}",
            name,
            MODELS.iter().map(|m| m.name).collect::<Vec<_>>().join(", ")
        ))
    })
}

pub fn attack_entry(name: &str) -> Result<&'static AttackEntry> {
    ATTACKS.iter().find(|a| a.name == name).ok_or_else(|| {
        RhoError::Config(format!(
            "Unknown attack '{}': expected one of {}",
            name,
            ATTACKS.iter().map(|a| a.name).collect::<Vec<_>>().join(", ")
        ))
    })
}

/// Parameters handed to classifier constructors.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub k: usize,
    pub metric: Norm,
    /// Declared regime; must agree with the registry entry when set.
    pub regime: Option<TrainingRegime>,
}

/// Build the named classifier, wrapped in its declared regime.
pub fn build_classifier(name: &str, params: &ModelParams) -> Result<ClassifierHandle> {
    let entry = model_entry(name)?;
    if let Some(declared) = params.regime {
        if declared != entry.regime {
            return Err(RhoError::Config(format!(
                "Model '{}' is trained in the {} regime, but {} was configured",
                name, entry.regime, declared
            )));
        }
    }
    debug!(model = name, regime = %entry.regime, k = params.k, "Building classifier");
    match entry.name {
        "knn" => Ok(ClassifierHandle::Static(Box::new(KnnClassifier::new(
            params.k,
        )?))),
        "adv_knn" => Ok(ClassifierHandle::Adversarial(Box::new(AdversarialKnn::new(
            params.k,
            params.metric,
        )?))),
        other => Err(RhoError::Config(format!("Model '{}' has no constructor", other))),
    }
}

/// Parameters handed to attack constructors.
#[derive(Debug, Clone)]
pub struct AttackParams {
    pub metric: Norm,
    pub seed: u64,
    pub restarts: usize,
}

/// Attack factory for a registered attack.
///
/// The seed reaches the attack only if its entry accepts a random state.
#[derive(Debug, Clone)]
pub struct RegisteredAttack {
    entry: &'static AttackEntry,
    metric: Norm,
    seed: Option<u64>,
    restarts: usize,
}

impl RegisteredAttack {
    pub fn new(name: &str, params: &AttackParams) -> Result<Self> {
        let entry = attack_entry(name)?;
        Ok(Self {
            entry,
            metric: params.metric,
            seed: entry.accepts_random_state.then_some(params.seed),
            restarts: params.restarts,
        })
    }

    pub fn entry(&self) -> &'static AttackEntry {
        self.entry
    }
}

impl AttackFactory for RegisteredAttack {
    fn build(&self, train_x: &SampleMatrix, train_y: &LabelVector) -> Result<Box<dyn Attack>> {
        match self.entry.name {
            "nearest_opposite" => Ok(Box::new(NearestOppositeAttack::new(
                train_x,
                train_y,
                self.metric,
            )?)),
            "random_noise" => {
                let mut config = NoiseConfig {
                    restarts: self.restarts,
                    ..NoiseConfig::default()
                };
                if let Some(seed) = self.seed {
                    config.seed = seed;
                }
                Ok(Box::new(RandomNoiseAttack::new(
                    train_x,
                    train_y,
                    self.metric,
                    config,
                )?))
            }
            other => Err(RhoError::Config(format!("Attack '{}' has no constructor", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn model_params(regime: Option<TrainingRegime>) -> ModelParams {
        ModelParams {
            k: 3,
            metric: Norm::L2,
            regime,
        }
    }

    #[test]
    fn test_registry_declares_regimes() {
        assert_eq!(model_entry("knn").unwrap().regime, TrainingRegime::Static);
        assert_eq!(
            model_entry("adv_knn").unwrap().regime,
            TrainingRegime::Adversarial
        );
    }

    #[test]
    fn test_handle_variant_follows_entry() {
        let handle = build_classifier("adv_knn", &model_params(None)).unwrap();
        assert_eq!(handle.regime(), TrainingRegime::Adversarial);
        let handle = build_classifier("knn", &model_params(Some(TrainingRegime::Static))).unwrap();
        assert_eq!(handle.regime(), TrainingRegime::Static);
    }

    #[test]
    fn test_regime_disagreement_is_config_error() {
        let err = build_classifier("knn", &model_params(Some(TrainingRegime::Adversarial)))
            .unwrap_err();
        assert!(matches!(err, RhoError::Config(_)));
    }

    #[test]
    fn test_unknown_names_are_config_errors() {
        // A name mentioning "adv" still has to be registered.
        assert!(matches!(
            build_classifier("adv_svm", &model_params(None)).unwrap_err(),
            RhoError::Config(_)
        ));
        let params = AttackParams {
            metric: Norm::L1,
            seed: 0,
            restarts: 1,
        };
        assert!(matches!(
            RegisteredAttack::new("pgd", &params).unwrap_err(),
            RhoError::Config(_)
        ));
    }

    #[test]
    fn test_seed_only_reaches_random_state_attacks() {
        let params = AttackParams {
            metric: Norm::LInf,
            seed: 17,
            restarts: 2,
        };
        assert_eq!(RegisteredAttack::new("random_noise", &params).unwrap().seed, Some(17));
        assert_eq!(RegisteredAttack::new("nearest_opposite", &params).unwrap().seed, None);
    }

    #[test]
    fn test_factory_builds_working_attacks() {
        let x = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        let y = arr1(&[0usize, 1]);
        let params = AttackParams {
            metric: Norm::L2,
            seed: 3,
            restarts: 2,
        };
        for entry in ATTACKS {
            let factory = RegisteredAttack::new(entry.name, &params).unwrap();
            let mut attack = factory.build(&x, &y).unwrap();
            let p = attack.perturb(&x, &y, 0.1).unwrap();
            assert_eq!(p.dim(), (2, 2));
            assert_eq!(attack.worst_case().is_some(), entry.has_worst_case, "{}", entry.name);
        }
    }
}
