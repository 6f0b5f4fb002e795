use dynamics::{
    DynamicsEnsemble, LinearEnsemble, LinearEnsembleConfig, ModelEnv, ModelStep, Sampling, Task,
    Transition, TransitionDataset,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Free;

impl Task for Free {
    fn reward(&self, _obs: &[f32], _action: &[f32], _next_obs: &[f32]) -> f32 {
        0.0
    }

    fn is_terminal(&self, _obs: &[f32], _action: &[f32], _next_obs: &[f32]) -> bool {
        false
    }
}

/// Noisy double integrator: x' = x + 0.1 v, v' = v + 0.1 u.
fn collect(n: usize, seed: u64) -> TransitionDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = TransitionDataset::new();
    for _ in 0..n {
        let x: f32 = rng.gen_range(-1.0..1.0);
        let v: f32 = rng.gen_range(-1.0..1.0);
        let u: f32 = rng.gen_range(-1.0..1.0);
        let noise: f32 = rng.gen_range(-0.01..0.01);
        data.push(Transition::new(vec![x, v], vec![u], vec![x + 0.1 * v, v + 0.1 * u + noise]))
            .unwrap();
    }
    data
}

fn fitted(seed: u64) -> LinearEnsemble {
    let data = collect(200, 5);
    let mut ensemble = LinearEnsemble::new(2, 1, LinearEnsembleConfig::default());
    let mut rng = StdRng::seed_from_u64(seed);
    ensemble.fit(&data.snapshot(), 100, &mut rng).unwrap();
    ensemble
}

#[test]
fn same_data_and_seed_give_identical_members() {
    let a = fitted(3);
    let b = fitted(3);
    for member in 0..a.members() {
        assert_eq!(
            a.predict_member(member, &[0.3, -0.2, 0.7]).unwrap(),
            b.predict_member(member, &[0.3, -0.2, 0.7]).unwrap()
        );
    }
}

#[test]
fn refitting_discards_previous_parameters() {
    let data = collect(200, 5);
    let mut reused = LinearEnsemble::new(2, 1, LinearEnsembleConfig::default());
    let mut rng = StdRng::seed_from_u64(99);
    reused.fit(&collect(50, 8).snapshot(), 100, &mut rng).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    reused.fit(&data.snapshot(), 100, &mut rng).unwrap();
    let fresh = fitted(3);
    assert_eq!(reused.predict(&[0.1, 0.2, 0.3]).unwrap(), fresh.predict(&[0.1, 0.2, 0.3]).unwrap());
}

#[test]
fn bootstrapped_members_differ_but_agree_roughly() {
    let ensemble = fitted(4);
    let predictions = ensemble.predict(&[0.5, 0.5, -0.5]).unwrap();
    assert_eq!(predictions.len(), 5);
    for p in &predictions {
        assert!((p.mean[0] - 0.05).abs() < 0.01, "{p:?}");
        assert!((p.mean[1] + 0.05).abs() < 0.01, "{p:?}");
    }
    assert!(predictions.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn model_env_rolls_the_fitted_dynamics_forward() {
    let ensemble = fitted(6);
    let mut model = ModelEnv::new(&ensemble, &Free);
    let mut rng = StdRng::seed_from_u64(0);
    let t = model.step(&[0.0, 1.0], &[1.0], Sampling::Deterministic, &mut rng).unwrap();
    assert!((t.next_obs[0] - 0.1).abs() < 0.01, "{:?}", t.next_obs);
    assert!((t.next_obs[1] - 1.1).abs() < 0.01, "{:?}", t.next_obs);
}
