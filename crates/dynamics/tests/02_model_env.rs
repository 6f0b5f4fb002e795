use approx::assert_relative_eq;
use dynamics::{
    DynamicsEnsemble, DynamicsError, FitSummary, GaussianPrediction, ModelEnv, ModelStep, Sampling,
    Task, TrainingSet,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Member `i` always predicts a delta of `i + 1` with zero spread.
struct OffsetEnsemble {
    members: usize,
}

impl DynamicsEnsemble for OffsetEnsemble {
    fn members(&self) -> usize {
        self.members
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn fit(
        &mut self,
        data: &TrainingSet,
        _epochs: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<FitSummary, DynamicsError> {
        Ok(FitSummary { samples: data.len(), members: self.members, train_mse: 0.0 })
    }

    fn predict_member(&self, member: usize, _input: &[f32]) -> Result<GaussianPrediction, DynamicsError> {
        Ok(GaussianPrediction { mean: vec![member as f32 + 1.0], std: vec![0.0] })
    }
}

struct Position;

impl Task for Position {
    fn reward(&self, _obs: &[f32], action: &[f32], next_obs: &[f32]) -> f32 {
        next_obs[0] - action[0]
    }

    fn is_terminal(&self, _obs: &[f32], _action: &[f32], next_obs: &[f32]) -> bool {
        next_obs[0] > 10.0
    }
}

#[test]
fn deterministic_step_uses_the_member_average() {
    let ensemble = OffsetEnsemble { members: 4 };
    let mut model = ModelEnv::new(&ensemble, &Position);
    let mut rng = StdRng::seed_from_u64(0);
    let t = model.step(&[1.0], &[0.5], Sampling::Deterministic, &mut rng).unwrap();
    // (1 + 2 + 3 + 4) / 4
    assert_relative_eq!(t.next_obs[0], 3.5);
    assert_relative_eq!(t.reward, 3.0);
    assert!(!t.done);
}

#[test]
fn stochastic_rollout_sticks_to_one_member() {
    let ensemble = OffsetEnsemble { members: 5 };
    let mut model = ModelEnv::new(&ensemble, &Position);
    let mut rng = StdRng::seed_from_u64(11);

    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..50 {
        model.begin_rollout(&mut rng);
        let member = model.active_member().unwrap();
        seen.insert(member);
        let mut obs = vec![0.0];
        for _ in 0..4 {
            let t = model.step(&obs, &[0.0], Sampling::Stochastic, &mut rng).unwrap();
            assert_relative_eq!(t.next_obs[0] - obs[0], member as f32 + 1.0);
            assert_eq!(model.active_member(), Some(member));
            obs = t.next_obs;
        }
    }
    assert!(seen.len() > 1, "member choice never changed between rollouts");
}

#[test]
fn termination_comes_from_the_task() {
    let ensemble = OffsetEnsemble { members: 1 };
    let mut model = ModelEnv::new(&ensemble, &Position);
    let mut rng = StdRng::seed_from_u64(0);
    let t = model.step(&[9.5], &[0.0], Sampling::Stochastic, &mut rng).unwrap();
    assert!(t.done);
}
