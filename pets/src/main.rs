//! # PETS Runner
//!
//! Runs the PETS control loop on one of the bundled environments. Settings
//! come from the task preset, an optional JSON file given with `--config`, and
//! individual flags, in increasing order of precedence.

mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskKind {
    Pendulum,
    Cartpole,
}

#[derive(Debug, Parser)]
#[command(name = "pets", about = "CEM planning with trajectory sampling over a learned ensemble")]
pub struct Args {
    #[arg(long, value_enum, default_value_t = TaskKind::Pendulum)]
    pub task: TaskKind,
    /// JSON file holding `cem`, `run` and `ensemble` sections.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub episodes: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long = "num-trajs")]
    pub num_trajs: Option<usize>,
    #[arg(long)]
    pub num_elites: Option<usize>,
    #[arg(long)]
    pub alpha: Option<f32>,
    #[arg(long = "plan-hor")]
    pub plan_hor: Option<usize>,
    #[arg(long)]
    pub max_iters: Option<usize>,
    #[arg(long)]
    pub epsilon: Option<f32>,
    /// Initial sampling variance of every planning call.
    #[arg(long)]
    pub var: Option<f32>,
    /// Ensemble size.
    #[arg(long)]
    pub members: Option<usize>,
    /// Keep the planner's warm start across episode boundaries.
    #[arg(long)]
    pub carry_warm_start: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    app::run(&Args::parse())
}
