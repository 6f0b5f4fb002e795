//! Rolling flattened action sequences through a model-based step function.

use dynamics::{ModelStep, Sampling};
use rand::RngCore;

use crate::error::PlanError;

/// States, actions and rewards of one imagined rollout.
///
/// `states` holds the initial state followed by one entry per executed step,
/// so it is always one longer than `actions` and `rewards`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub rewards: Vec<f32>,
    /// The model signalled termination before the sequence ran out.
    pub terminated: bool,
}

impl Trajectory {
    /// Undiscounted sum of the step rewards.
    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn check_sequence(sequence: &[f32], action_dim: usize) -> Result<(), PlanError> {
    if action_dim == 0 || sequence.len() % action_dim != 0 {
        return Err(PlanError::DimensionMismatch {
            what: "action sequence",
            expected: sequence.len().next_multiple_of(action_dim.max(1)),
            actual: sequence.len(),
        });
    }
    Ok(())
}

/// Cumulative reward of `sequence` executed from `state` under trajectory
/// sampling.
///
/// A new rollout is opened on `model` first, so a stochastic model keeps one
/// ensemble member for every step of this sequence. Evaluation stops at the
/// first terminal step; that step's reward is still counted.
///
/// # Errors
///
/// Fails when `sequence` is not a whole number of `action_dim` blocks, or
/// when the model cannot predict.
pub fn evaluate<M>(
    model: &mut M,
    state: &[f32],
    sequence: &[f32],
    action_dim: usize,
    rng: &mut dyn RngCore,
) -> Result<f32, PlanError>
where
    M: ModelStep + ?Sized,
{
    check_sequence(sequence, action_dim)?;
    model.begin_rollout(rng);
    let mut obs = state.to_vec();
    let mut total = 0.0;
    for action in sequence.chunks_exact(action_dim) {
        let step = model.step(&obs, action, Sampling::Stochastic, rng)?;
        total += step.reward;
        if step.done {
            break;
        }
        obs = step.next_obs;
    }
    Ok(total)
}

/// Like [`evaluate`], but keeps every visited state, action and reward.
///
/// # Errors
///
/// See [`evaluate`].
pub fn rollout<M>(
    model: &mut M,
    state: &[f32],
    sequence: &[f32],
    action_dim: usize,
    sampling: Sampling,
    rng: &mut dyn RngCore,
) -> Result<Trajectory, PlanError>
where
    M: ModelStep + ?Sized,
{
    check_sequence(sequence, action_dim)?;
    model.begin_rollout(rng);
    let horizon = sequence.len() / action_dim;
    let mut trajectory = Trajectory {
        states: Vec::with_capacity(horizon + 1),
        actions: Vec::with_capacity(horizon),
        rewards: Vec::with_capacity(horizon),
        terminated: false,
    };
    trajectory.states.push(state.to_vec());
    for action in sequence.chunks_exact(action_dim) {
        let obs = trajectory.states.last().map_or_else(Vec::new, Clone::clone);
        let step = model.step(&obs, action, sampling, rng)?;
        trajectory.actions.push(action.to_vec());
        trajectory.rewards.push(step.reward);
        trajectory.states.push(step.next_obs);
        if step.done {
            trajectory.terminated = true;
            break;
        }
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamics::{DynamicsError, ModelTransition};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Integrates the action into a scalar state; terminal once past `limit`.
    struct Integrator {
        limit: f32,
        rollouts: usize,
        sampling: Vec<Sampling>,
    }

    impl ModelStep for Integrator {
        fn begin_rollout(&mut self, _rng: &mut dyn RngCore) {
            self.rollouts += 1;
        }

        fn step(
            &mut self,
            obs: &[f32],
            action: &[f32],
            sampling: Sampling,
            _rng: &mut dyn RngCore,
        ) -> Result<ModelTransition, DynamicsError> {
            self.sampling.push(sampling);
            let next = obs[0] + action[0];
            Ok(ModelTransition { next_obs: vec![next], reward: next, done: next > self.limit })
        }
    }

    fn integrator(limit: f32) -> Integrator {
        Integrator { limit, rollouts: 0, sampling: Vec::new() }
    }

    #[test]
    fn evaluate_sums_rewards_undiscounted() {
        let mut model = integrator(100.0);
        let mut rng = StdRng::seed_from_u64(0);
        let total = evaluate(&mut model, &[0.0], &[1.0, 1.0, 1.0], 1, &mut rng).unwrap();
        assert_eq!(total, 1.0 + 2.0 + 3.0);
        assert_eq!(model.rollouts, 1);
        assert!(model.sampling.iter().all(|&s| s == Sampling::Stochastic));
    }

    #[test]
    fn evaluate_stops_at_termination() {
        let mut model = integrator(1.5);
        let mut rng = StdRng::seed_from_u64(0);
        let total = evaluate(&mut model, &[0.0], &[1.0; 5], 1, &mut rng).unwrap();
        assert_eq!(total, 1.0 + 2.0);
        assert_eq!(model.sampling.len(), 2);
    }

    #[test]
    fn ragged_sequence_is_rejected() {
        let mut model = integrator(1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let err = evaluate(&mut model, &[0.0, 0.0], &[1.0; 3], 2, &mut rng).unwrap_err();
        assert!(matches!(err, PlanError::DimensionMismatch { actual: 3, .. }));
        assert_eq!(model.rollouts, 0);
    }

    #[test]
    fn rollout_records_the_visited_states() {
        let mut model = integrator(2.5);
        let mut rng = StdRng::seed_from_u64(0);
        let traj =
            rollout(&mut model, &[0.0], &[1.0; 4], 1, Sampling::Deterministic, &mut rng).unwrap();
        assert_eq!(traj.states, vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(traj.len(), 3);
        assert!(traj.terminated);
        assert_eq!(traj.total_reward(), 6.0);
        assert!(model.sampling.iter().all(|&s| s == Sampling::Deterministic));
    }
}
