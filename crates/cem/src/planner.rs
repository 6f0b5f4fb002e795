use dynamics::{ActionSpace, ModelStep};
use rand::RngCore;
use tracing::{debug, trace};

use crate::config::CemConfig;
use crate::distribution::{select_elites, Belief, EliteStats, SequenceBounds};
use crate::error::PlanError;
use crate::trajectory::evaluate;

/// Final mean of the previous planning call.
///
/// The next call starts from this mean shifted left by one action block, with
/// the freed block padded by zero clamped into the action bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarmStart {
    mean: Option<Vec<f32>>,
}

impl WarmStart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the stored plan; the next call starts from the pad value.
    pub fn reset(&mut self) {
        self.mean = None;
    }

    pub fn mean(&self) -> Option<&[f32]> {
        self.mean.as_deref()
    }

    /// Belief mean the next planning call starts from.
    ///
    /// A stored mean whose length disagrees with `bounds` is ignored.
    #[must_use]
    pub fn initial_mean(&self, action_dim: usize, bounds: &SequenceBounds) -> Vec<f32> {
        let len = bounds.len();
        let keep = len.saturating_sub(action_dim);
        let mut mean: Vec<f32> = (0..len).map(|i| bounds.clamp(i, 0.0)).collect();
        if let Some(prev) = self.mean.as_deref().filter(|prev| prev.len() == len) {
            mean[..keep].copy_from_slice(&prev[action_dim..]);
        }
        mean
    }

    fn store(&mut self, mean: Vec<f32>) {
        self.mean = Some(mean);
    }
}

/// Statistics of one refinement iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    pub elite_count: usize,
    pub best_reward: f32,
    /// Mean cumulative reward over the elite set.
    pub elite_mean_reward: f32,
    /// `max |elite_mean - mean|` against the mean the iteration sampled from.
    pub mean_shift: f32,
}

/// Everything one planning call did.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    /// First action block of `final_mean`.
    pub action: Vec<f32>,
    pub initial_mean: Vec<f32>,
    pub final_mean: Vec<f32>,
    pub iterations: Vec<IterationStats>,
}

impl PlanReport {
    /// `true` when the loop ended on the convergence test rather than the
    /// iteration budget.
    #[must_use]
    pub fn converged(&self, epsilon: f32) -> bool {
        self.iterations.last().is_some_and(|it| it.mean_shift < epsilon)
    }
}

/// Cross-entropy planner over fixed-horizon action sequences.
///
/// Candidates are scored by [`evaluate`] against the step function `S`, so the
/// planner never learns which ensemble member a rollout used.
pub struct CemPlanner<S> {
    config: CemConfig,
    action_space: ActionSpace,
    bounds: SequenceBounds,
    model: S,
    warm_start: WarmStart,
}

impl<S: ModelStep> CemPlanner<S> {
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] when `config` does not validate.
    pub fn new(config: CemConfig, action_space: ActionSpace, model: S) -> Result<Self, PlanError> {
        config.validate()?;
        let bounds = SequenceBounds::tiled(&action_space, config.horizon);
        Ok(Self { config, action_space, bounds, model, warm_start: WarmStart::new() })
    }

    /// Replaces the warm-start state, e.g. with one carried over from a planner
    /// bound to a previous model.
    #[must_use]
    pub fn with_warm_start(mut self, warm_start: WarmStart) -> Self {
        self.warm_start = warm_start;
        self
    }

    #[must_use]
    pub fn into_warm_start(self) -> WarmStart {
        self.warm_start
    }

    pub fn warm_start(&self) -> &WarmStart {
        &self.warm_start
    }

    pub fn reset(&mut self) {
        self.warm_start.reset();
    }

    pub fn config(&self) -> &CemConfig {
        &self.config
    }

    pub fn bounds(&self) -> &SequenceBounds {
        &self.bounds
    }

    pub fn model(&self) -> &S {
        &self.model
    }

    /// Plans from `state` and returns the first action of the refined mean.
    ///
    /// # Errors
    ///
    /// Propagates model failures during candidate evaluation.
    pub fn plan(&mut self, state: &[f32], rng: &mut dyn RngCore) -> Result<Vec<f32>, PlanError> {
        self.plan_with_report(state, rng).map(|report| report.action)
    }

    /// [`plan`](Self::plan) with per-iteration statistics.
    ///
    /// # Errors
    ///
    /// See [`plan`](Self::plan). The warm-start state is left untouched when
    /// the call fails.
    pub fn plan_with_report(
        &mut self,
        state: &[f32],
        rng: &mut dyn RngCore,
    ) -> Result<PlanReport, PlanError> {
        let action_dim = self.action_space.dim();
        let initial_mean = self.warm_start.initial_mean(action_dim, &self.bounds);
        let mut belief =
            Belief::new(initial_mean.clone(), vec![self.config.init_var; self.bounds.len()]);
        let elite_count = self.config.elite_count();
        let mut iterations = Vec::with_capacity(self.config.max_iters);

        for iteration in 0..self.config.max_iters {
            let population =
                belief.sample_population(&self.bounds, self.config.num_trajectories, rng);
            let mut rewards = Vec::with_capacity(population.len());
            for sequence in &population {
                rewards.push(evaluate(&mut self.model, state, sequence, action_dim, rng)?);
            }

            let elites = select_elites(&rewards, elite_count);
            let stats = EliteStats::from_population(&population, &elites);
            let mean_shift = stats
                .mean
                .iter()
                .zip(&belief.mean)
                .map(|(e, m)| (e - m).abs())
                .fold(0.0_f32, f32::max);

            belief.blend(&stats, self.config.alpha);
            if let Some(floor) = self.config.variance_floor {
                belief.apply_floor(floor);
            }

            let best_reward = elites.first().map_or(f32::NEG_INFINITY, |&i| rewards[i]);
            let elite_mean_reward =
                elites.iter().map(|&i| rewards[i]).sum::<f32>() / elites.len().max(1) as f32;
            trace!(iteration, best_reward, elite_mean_reward, mean_shift, "cem iteration");
            iterations.push(IterationStats {
                elite_count: elites.len(),
                best_reward,
                elite_mean_reward,
                mean_shift,
            });

            if mean_shift < self.config.epsilon {
                break;
            }
        }

        let action = self.action_space.clip(&belief.mean[..action_dim]);
        debug!(
            iterations = iterations.len(),
            best_reward = iterations.last().map(|it| it.best_reward),
            ?action,
            "planned action"
        );
        let final_mean = belief.mean;
        self.warm_start.store(final_mean.clone());
        Ok(PlanReport { action, initial_mean, final_mean, iterations })
    }
}
