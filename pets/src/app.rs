use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cem::{CemConfig, LoopConfig, OnlineLoop, WarmStartPolicy};
use dynamics::{Env, LinearEnsemble, LinearEnsembleConfig, Task};
use envs::{CartPole, CartPoleConfig, CartPoleTask, Pendulum, PendulumConfig, PendulumTask};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{Args, TaskKind};

/// Contents of a `--config` file. The `cem` section only lists the fields that
/// differ from the preset of the chosen task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetsConfig {
    pub cem: Option<Value>,
    pub run: LoopConfig,
    pub ensemble: LinearEnsembleConfig,
}

impl PetsConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cem: CemConfig,
    pub run: LoopConfig,
    pub ensemble: LinearEnsembleConfig,
}

fn preset(task: TaskKind) -> CemConfig {
    match task {
        TaskKind::Pendulum => CemConfig::pendulum(),
        TaskKind::Cartpole => CemConfig::cartpole(),
    }
}

fn cem_config(task: TaskKind, section: Option<Value>) -> Result<CemConfig> {
    let Some(section) = section else {
        return Ok(preset(task));
    };
    let Value::Object(overrides) = section else {
        bail!("the `cem` section must be a JSON object");
    };
    let mut merged = serde_json::to_value(preset(task))?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    serde_json::from_value(merged).context("parsing the `cem` section")
}

/// Layers the flags over the config file over the task preset.
///
/// # Errors
///
/// Fails when the `cem` section is not an object of [`CemConfig`] fields.
pub fn settings(args: &Args, file: PetsConfig) -> Result<Settings> {
    let mut cem = cem_config(args.task, file.cem)?;
    let mut run = file.run;
    let mut ensemble = file.ensemble;

    if let Some(v) = args.episodes {
        run.episodes = v;
    }
    if let Some(v) = args.seed {
        run.seed = v;
    }
    if args.carry_warm_start {
        run.warm_start = WarmStartPolicy::CarryAcrossEpisodes;
    }
    if let Some(v) = args.num_trajs {
        cem.num_trajectories = v;
    }
    if let Some(v) = args.num_elites {
        cem.num_elites = v;
    }
    if let Some(v) = args.alpha {
        cem.alpha = v;
    }
    if let Some(v) = args.plan_hor {
        cem.horizon = v;
    }
    if let Some(v) = args.max_iters {
        cem.max_iters = v;
    }
    if let Some(v) = args.epsilon {
        cem.epsilon = v;
    }
    if let Some(v) = args.var {
        cem.init_var = v;
    }
    if let Some(v) = args.members {
        ensemble.members = v;
    }
    Ok(Settings { cem, run, ensemble })
}

/// Runs the configured number of episodes and logs their rewards.
///
/// # Errors
///
/// Returns configuration, environment, fitting and planning failures.
pub fn run(args: &Args) -> Result<()> {
    let file = match &args.config {
        Some(path) => PetsConfig::from_file(path)?,
        None => PetsConfig::default(),
    };
    let settings = settings(args, file)?;

    info!(
        task = ?args.task,
        seed = settings.run.seed,
        episodes = settings.run.episodes,
        members = settings.ensemble.members,
        trajectories = settings.cem.num_trajectories,
        elites = settings.cem.num_elites,
        horizon = settings.cem.horizon,
        warm_start = ?settings.run.warm_start,
        "starting PETS"
    );

    match args.task {
        TaskKind::Pendulum => {
            drive(Pendulum::new(PendulumConfig::default())?, PendulumTask, settings)
        }
        TaskKind::Cartpole => {
            let config = CartPoleConfig::default();
            let task = CartPoleTask { config: config.clone() };
            drive(CartPole::new(config)?, task, settings)
        }
    }
}

fn drive<E: Env, T: Task>(env: E, task: T, settings: Settings) -> Result<()> {
    let ensemble =
        LinearEnsemble::new(env.obs_size(), env.action_space().dim(), settings.ensemble);
    let episodes = settings.run.episodes;
    let mut online = OnlineLoop::new(env, ensemble, task, settings.cem, settings.run)?;

    for _ in 0..episodes {
        let summary = online.run_episode()?;
        info!(
            episode = summary.episode + 1,
            of = episodes,
            reward = summary.total_reward,
            steps = summary.steps,
            total_timesteps = online.total_timesteps(),
            "episode"
        );
    }
    info!(
        total_timesteps = online.total_timesteps(),
        cumulative_reward = online.cumulative_reward(),
        "PETS complete"
    );
    Ok(())
}
