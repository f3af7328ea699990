//! Reference collaborators driven through the evaluator.

use crate::*;
use ndarray::Array2;
use proptest::prelude::*;
use rho_core::{DataSplit, EpsilonSchedule, LabelVector, Norm, SampleMatrix};
use rho_eval::{validate_budget, AttackFactory, EvalConfig, Evaluator, RunContext, TrainingRegime};

/// Two well-separated 2-D clusters on a jittered grid.
fn clusters(n: usize, offset: usize) -> (SampleMatrix, LabelVector) {
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let i = i + offset;
        let base = if i % 2 == 0 { 0.2 } else { 0.8 };
        base + (((i * 7 + j * 3) % 10) as f64 - 4.5) * 0.01
    });
    let y: LabelVector = (0..n).map(|i| (i + offset) % 2).collect();
    (x, y)
}

fn split() -> DataSplit {
    let (train_x, train_y) = clusters(40, 0);
    let (test_x, test_y) = clusters(20, 40);
    DataSplit::new(train_x, train_y, test_x, test_y).unwrap()
}

fn evaluator(schedule: Vec<f64>, metric: Norm) -> Evaluator {
    Evaluator::new(
        RunContext::new(3, metric, EpsilonSchedule::new(schedule).unwrap()).with_config(
            EvalConfig {
                parallel: true,
                min_schedule_for_parallel: 2,
            },
        ),
    )
}

fn attack_params(metric: Norm) -> AttackParams {
    AttackParams {
        metric,
        seed: 3,
        restarts: 4,
    }
}

#[test]
fn knn_accuracy_falls_as_budget_grows() {
    let data = split();
    let params = ModelParams {
        k: 3,
        metric: Norm::LInf,
        regime: None,
    };
    let mut model = build_classifier("knn", &params).unwrap();
    let factory = RegisteredAttack::new("nearest_opposite", &attack_params(Norm::LInf)).unwrap();

    let report = evaluator(vec![0.0, 0.05, 0.6], Norm::LInf)
        .evaluate(&mut model, &factory, &data)
        .unwrap();

    let acc: Vec<f64> = report.results.iter().map(|r| r.test_accuracy).collect();
    assert_eq!(acc[0], 1.0);
    assert_eq!(acc[1], 1.0);
    assert_eq!(acc[2], 0.0);
    // The full move lands on an opposite training point, so everything flips.
    let stats = report.worst_case.unwrap();
    assert!(stats.is_total_success());
    assert!(stats.missed_count.is_none());
}

#[test]
fn adv_knn_reports_augmented_size() {
    let data = split();
    let params = ModelParams {
        k: 1,
        metric: Norm::L2,
        regime: Some(TrainingRegime::Adversarial),
    };
    let mut model = build_classifier("adv_knn", &params).unwrap();
    let factory = RegisteredAttack::new("nearest_opposite", &attack_params(Norm::L2)).unwrap();

    let report = evaluator(vec![0.0, 0.2, 0.4], Norm::L2)
        .evaluate(&mut model, &factory, &data)
        .unwrap();

    assert_eq!(report.budgets(), vec![0.0, 0.2, 0.4]);
    assert_eq!(report.training_set_size, 40);
    assert!(report.augmented_set_size.unwrap() >= 40);
    assert_eq!(report.worst_case.unwrap().eps, Some(0.4));
}

#[test]
fn random_noise_run_is_reproducible() {
    let data = split();
    let params = ModelParams {
        k: 3,
        metric: Norm::L1,
        regime: None,
    };
    let factory = RegisteredAttack::new("random_noise", &attack_params(Norm::L1)).unwrap();
    let run = || {
        let mut model = build_classifier("knn", &params).unwrap();
        evaluator(vec![0.0, 0.3, 0.9], Norm::L1)
            .evaluate(&mut model, &factory, &data)
            .unwrap()
    };
    let first = run();
    assert_eq!(first, run());
    assert!(first.worst_case.is_none());
}

fn any_norm() -> impl Strategy<Value = Norm> {
    prop_oneof![Just(Norm::L1), Just(Norm::L2), Just(Norm::LInf)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Both reference attacks stay within every budget.
    #[test]
    fn reference_attacks_respect_budget(
        coords in prop::collection::vec(-1.0f64..1.0, 24),
        eps in 0.0f64..1.5,
        metric in any_norm(),
        seed in any::<u64>(),
    ) {
        let x = Array2::from_shape_vec((8, 3), coords).unwrap();
        let y: LabelVector = (0..8).map(|i| i % 2).collect();
        let params = AttackParams { metric, seed, restarts: 2 };
        for entry in ATTACKS {
            let mut attack = RegisteredAttack::new(entry.name, &params)
                .unwrap()
                .build(&x, &y)
                .unwrap();
            let p = attack.perturb(&x, &y, eps).unwrap();
            prop_assert!(validate_budget(p.view(), eps, metric).is_ok());
        }
    }
}
