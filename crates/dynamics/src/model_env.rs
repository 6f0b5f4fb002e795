use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::ensemble::DynamicsEnsemble;
use crate::error::DynamicsError;
use crate::task::Task;

/// How the next state is drawn from the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Mean of the member means, no noise.
    Deterministic,
    /// A single member, held fixed for the whole rollout, sampled from its
    /// predictive Gaussian.
    Stochastic,
}

/// One simulated transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTransition {
    pub next_obs: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// A simulated environment driven by a learned model.
///
/// [`begin_rollout`](ModelStep::begin_rollout) marks the start of a new
/// imagined trajectory; implementations that choose a model per trajectory do
/// so there and keep the choice to themselves.
pub trait ModelStep {
    fn begin_rollout(&mut self, rng: &mut dyn RngCore);

    /// # Errors
    ///
    /// Propagates prediction failures of the underlying model.
    fn step(
        &mut self,
        obs: &[f32],
        action: &[f32],
        sampling: Sampling,
        rng: &mut dyn RngCore,
    ) -> Result<ModelTransition, DynamicsError>;
}

/// Model-based step function over a dynamics ensemble and an oracle task.
pub struct ModelEnv<'a, M: ?Sized, T: ?Sized> {
    ensemble: &'a M,
    task: &'a T,
    active_member: Option<usize>,
}

impl<'a, M, T> ModelEnv<'a, M, T>
where
    M: DynamicsEnsemble + ?Sized,
    T: Task + ?Sized,
{
    pub fn new(ensemble: &'a M, task: &'a T) -> Self {
        Self { ensemble, task, active_member: None }
    }

    /// Member used by stochastic steps of the current rollout, once chosen.
    pub fn active_member(&self) -> Option<usize> {
        self.active_member
    }

    fn model_input(obs: &[f32], action: &[f32]) -> Vec<f32> {
        let mut input = Vec::with_capacity(obs.len() + action.len());
        input.extend_from_slice(obs);
        input.extend_from_slice(action);
        input
    }

    fn select_member(&mut self, rng: &mut dyn RngCore) -> Result<usize, DynamicsError> {
        if let Some(member) = self.active_member {
            return Ok(member);
        }
        let members = self.ensemble.members();
        if members == 0 {
            return Err(DynamicsError::NotFitted);
        }
        let member = rng.gen_range(0..members);
        self.active_member = Some(member);
        Ok(member)
    }

    fn delta(
        &mut self,
        input: &[f32],
        sampling: Sampling,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f32>, DynamicsError> {
        match sampling {
            Sampling::Deterministic => {
                let predictions = self.ensemble.predict(input)?;
                let count = predictions.len().max(1) as f32;
                let width = predictions.first().map_or(0, |p| p.mean.len());
                let mut delta = vec![0.0; width];
                for prediction in &predictions {
                    for (d, m) in delta.iter_mut().zip(&prediction.mean) {
                        *d += m / count;
                    }
                }
                Ok(delta)
            }
            Sampling::Stochastic => {
                let member = self.select_member(rng)?;
                let prediction = self.ensemble.predict_member(member, input)?;
                Ok(prediction
                    .mean
                    .iter()
                    .zip(&prediction.std)
                    .map(|(m, s)| {
                        let z: f32 = rng.sample(StandardNormal);
                        m + s * z
                    })
                    .collect())
            }
        }
    }
}

impl<M, T> ModelStep for ModelEnv<'_, M, T>
where
    M: DynamicsEnsemble + ?Sized,
    T: Task + ?Sized,
{
    fn begin_rollout(&mut self, rng: &mut dyn RngCore) {
        self.active_member = None;
        let members = self.ensemble.members();
        if members > 0 {
            self.active_member = Some(rng.gen_range(0..members));
        }
    }

    fn step(
        &mut self,
        obs: &[f32],
        action: &[f32],
        sampling: Sampling,
        rng: &mut dyn RngCore,
    ) -> Result<ModelTransition, DynamicsError> {
        let input = Self::model_input(obs, action);
        let delta = self.delta(&input, sampling, rng)?;
        if delta.len() != obs.len() {
            return Err(DynamicsError::DimensionMismatch {
                what: "predicted delta",
                expected: obs.len(),
                actual: delta.len(),
            });
        }
        let next_obs: Vec<f32> = obs.iter().zip(&delta).map(|(o, d)| o + d).collect();
        let reward = self.task.reward(obs, action, &next_obs);
        let done = self.task.is_terminal(obs, action, &next_obs);
        Ok(ModelTransition { next_obs, reward, done })
    }
}
