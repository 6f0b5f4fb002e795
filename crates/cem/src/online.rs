use dynamics::{
    DynamicsEnsemble, Env, FitSummary, ModelEnv, Task, Transition, TransitionDataset,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{CemConfig, LoopConfig, WarmStartPolicy};
use crate::error::PlanError;
use crate::planner::{CemPlanner, PlanReport, WarmStart};

/// What an episode does before and during its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Act uniformly at random; no model is consulted.
    Collect,
    /// Refit the ensemble on the whole dataset, then plan every action.
    TrainThenPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSource {
    Sampled,
    Planned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub action: Vec<f32>,
    pub reward: f32,
    pub source: ActionSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Zero-based episode index.
    pub episode: usize,
    pub mode: Mode,
    pub steps: usize,
    pub total_reward: f32,
    /// The environment ended the episode before the step budget ran out.
    pub terminated: bool,
    /// Result of the retrain that opened the episode, if any.
    pub fit: Option<FitSummary>,
    /// Report of the first planning call, which shows the mean the episode
    /// started planning from.
    pub opening_plan: Option<PlanReport>,
    pub records: Vec<StepRecord>,
}

/// The PETS control loop: collect, retrain, plan, act.
///
/// The loop exclusively owns the real environment, the transition dataset and
/// the random source. Every episode after the exploration phase refits the
/// ensemble from scratch and plans with a fresh [`CemPlanner`] bound to it.
pub struct OnlineLoop<E, M, T> {
    env: E,
    ensemble: M,
    task: T,
    cem: CemConfig,
    config: LoopConfig,
    dataset: TransitionDataset,
    rng: StdRng,
    warm_start: WarmStart,
    episodes_run: usize,
    timesteps: usize,
    cumulative_reward: f32,
    reward_trace: Vec<(usize, f32)>,
}

impl<E, M, T> OnlineLoop<E, M, T>
where
    E: Env,
    M: DynamicsEnsemble,
    T: Task,
{
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] when either configuration does not
    /// validate.
    pub fn new(
        env: E,
        ensemble: M,
        task: T,
        cem: CemConfig,
        config: LoopConfig,
    ) -> Result<Self, PlanError> {
        cem.validate()?;
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            env,
            ensemble,
            task,
            cem,
            config,
            dataset: TransitionDataset::new(),
            rng,
            warm_start: WarmStart::new(),
            episodes_run: 0,
            timesteps: 0,
            cumulative_reward: 0.0,
            reward_trace: Vec::new(),
        })
    }

    pub fn mode_for(&self, episode: usize) -> Mode {
        if episode < self.config.exploration_episodes {
            Mode::Collect
        } else {
            Mode::TrainThenPlan
        }
    }

    /// Runs the remaining configured episodes.
    ///
    /// # Errors
    ///
    /// Stops at the first failing episode; see [`run_episode`](Self::run_episode).
    pub fn run(&mut self) -> Result<Vec<EpisodeSummary>, PlanError> {
        let remaining = self.config.episodes.saturating_sub(self.episodes_run);
        (0..remaining).map(|_| self.run_episode()).collect()
    }

    /// Runs the next episode.
    ///
    /// # Errors
    ///
    /// Propagates ensemble fitting, planning and dataset failures. The episode
    /// counts as run once it starts: transitions stepped before the failure
    /// stay in the dataset, a carried warm start is dropped, and a retry moves
    /// on to the next episode.
    pub fn run_episode(&mut self) -> Result<EpisodeSummary, PlanError> {
        let episode = self.episodes_run;
        self.episodes_run += 1;
        let mode = self.mode_for(episode);
        let mut state = self.env.reset(&mut self.rng);

        let mut fit = None;
        let mut planner = match mode {
            Mode::Collect => None,
            Mode::TrainThenPlan => {
                let data = self.dataset.snapshot();
                let summary = self.ensemble.fit(&data, self.config.training_epochs, &mut self.rng)?;
                info!(
                    episode,
                    samples = summary.samples,
                    members = summary.members,
                    train_mse = summary.train_mse,
                    "retrained dynamics ensemble"
                );
                fit = Some(summary);
                let warm_start = match self.config.warm_start {
                    WarmStartPolicy::ResetEachEpisode => WarmStart::new(),
                    WarmStartPolicy::CarryAcrossEpisodes => std::mem::take(&mut self.warm_start),
                };
                let model = ModelEnv::new(&self.ensemble, &self.task);
                let planner =
                    CemPlanner::new(self.cem.clone(), self.env.action_space().clone(), model)?;
                Some(planner.with_warm_start(warm_start))
            }
        };

        let mut records = Vec::new();
        let mut total_reward = 0.0;
        let mut terminated = false;
        let mut opening_plan = None;
        while records.len() < self.config.max_steps {
            let (action, source) = match planner.as_mut() {
                Some(planner) => {
                    let report = planner.plan_with_report(&state, &mut self.rng)?;
                    let action = report.action.clone();
                    if opening_plan.is_none() {
                        opening_plan = Some(report);
                    }
                    (action, ActionSource::Planned)
                }
                None => (self.env.action_space().sample(&mut self.rng), ActionSource::Sampled),
            };
            let step = self.env.step(&action);
            self.dataset.push(Transition::new(state, action.clone(), step.obs.clone()))?;

            total_reward += step.reward;
            self.timesteps += 1;
            self.cumulative_reward += step.reward;
            self.reward_trace.push((self.timesteps, self.cumulative_reward));
            debug!(episode, step = records.len(), reward = step.reward, ?source, "env step");
            records.push(StepRecord { action, reward: step.reward, source });

            state = step.obs;
            if step.done {
                terminated = true;
                break;
            }
        }

        if let Some(planner) = planner {
            self.warm_start = planner.into_warm_start();
        }

        info!(
            episode,
            ?mode,
            reward = total_reward,
            steps = records.len(),
            total_timesteps = self.timesteps,
            "episode finished"
        );
        Ok(EpisodeSummary {
            episode,
            mode,
            steps: records.len(),
            total_reward,
            terminated,
            fit,
            opening_plan,
            records,
        })
    }

    pub fn dataset(&self) -> &TransitionDataset {
        &self.dataset
    }

    pub fn ensemble(&self) -> &M {
        &self.ensemble
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    /// Episodes started so far, failed ones included.
    pub fn episodes_run(&self) -> usize {
        self.episodes_run
    }

    /// Real environment steps taken so far, across all episodes.
    pub fn total_timesteps(&self) -> usize {
        self.timesteps
    }

    /// Reward summed over every real step so far.
    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    /// `(timestep, cumulative reward)` after every real step, timesteps
    /// counted from 1.
    pub fn reward_trace(&self) -> &[(usize, f32)] {
        &self.reward_trace
    }

    /// Warm-start state left by the last planning episode.
    pub fn warm_start(&self) -> &WarmStart {
        &self.warm_start
    }
}
