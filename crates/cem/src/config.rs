use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Cross-entropy planner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CemConfig {
    /// Planning horizon in control steps.
    pub horizon: usize,
    /// Candidate sequences sampled per iteration.
    pub num_trajectories: usize,
    /// Candidates kept to refit the belief; capped at `num_trajectories`.
    pub num_elites: usize,
    pub max_iters: usize,
    /// Weight of the previous belief in each update, in `[0, 1]`.
    pub alpha: f32,
    /// Max-norm elite-mean shift below which iteration stops.
    pub epsilon: f32,
    /// Variance every planning call starts from.
    pub init_var: f32,
    /// Lower bound applied to the belief variance after each update. `None`
    /// leaves collapsed variances untouched.
    pub variance_floor: Option<f32>,
}

impl Default for CemConfig {
    fn default() -> Self {
        Self::cartpole()
    }
}

impl CemConfig {
    pub fn cartpole() -> Self {
        Self {
            horizon: 30,
            num_trajectories: 500,
            num_elites: 50,
            max_iters: 5,
            alpha: 0.1,
            epsilon: 0.001,
            init_var: 1.0,
            variance_floor: None,
        }
    }

    pub fn pendulum() -> Self {
        Self {
            horizon: 30,
            num_trajectories: 100,
            num_elites: 5,
            max_iters: 5,
            alpha: 0.0,
            epsilon: 0.001,
            init_var: 3.0,
            variance_floor: None,
        }
    }

    /// Elite set size actually used: never more than the population.
    #[must_use]
    pub fn elite_count(&self) -> usize {
        self.num_elites.min(self.num_trajectories)
    }

    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PlanError> {
        let invalid = |field, reason: &str| {
            Err(PlanError::InvalidConfig { field, reason: reason.to_owned() })
        };
        if self.horizon == 0 {
            return invalid("horizon", "must be at least 1");
        }
        if self.num_trajectories == 0 {
            return invalid("num_trajectories", "must be at least 1");
        }
        if self.num_elites == 0 {
            return invalid("num_elites", "must be at least 1");
        }
        if self.max_iters == 0 {
            return invalid("max_iters", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return invalid("alpha", "must lie in [0, 1]");
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return invalid("epsilon", "must be non-negative");
        }
        if !self.init_var.is_finite() || self.init_var < 0.0 {
            return invalid("init_var", "must be finite and non-negative");
        }
        if let Some(floor) = self.variance_floor {
            if !floor.is_finite() || floor < 0.0 {
                return invalid("variance_floor", "must be finite and non-negative");
            }
        }
        Ok(())
    }
}

/// What happens to the planner's warm-start mean at an episode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmStartPolicy {
    /// Every episode starts planning from a zero mean.
    ResetEachEpisode,
    /// The first call of an episode continues from the last plan of the
    /// previous one.
    CarryAcrossEpisodes,
}

/// Online train/plan loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub episodes: usize,
    /// Step budget of a single episode.
    pub max_steps: usize,
    pub seed: u64,
    /// Leading episodes that act uniformly at random to seed the dataset.
    pub exploration_episodes: usize,
    pub warm_start: WarmStartPolicy,
    /// Passed to [`DynamicsEnsemble::fit`](dynamics::DynamicsEnsemble::fit) on
    /// every retrain.
    pub training_epochs: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            episodes: 15,
            max_steps: 200,
            seed: 0,
            exploration_episodes: 1,
            warm_start: WarmStartPolicy::ResetEachEpisode,
            training_epochs: 100,
        }
    }
}

impl LoopConfig {
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] when no exploration episode is
    /// configured.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.exploration_episodes == 0 {
            return Err(PlanError::InvalidConfig {
                field: "exploration_episodes",
                reason: "the first episode must collect data before any model exists".into(),
            });
        }
        Ok(())
    }
}
