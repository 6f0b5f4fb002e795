#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::cast_precision_loss)]
//! # Dynamics
//!
//! Everything the planner needs to know about transitions, without knowing how
//! they are produced: the real-environment interface, the injected reward and
//! termination strategy, the append-only transition store, the dynamics
//! ensemble contract with a closed-form reference implementation, and the
//! model-based step function that turns an ensemble plus a task into a
//! simulated environment.

pub mod dataset;
pub mod ensemble;
pub mod env;
pub mod error;
pub mod model_env;
pub mod task;

pub use dataset::{TrainingSet, Transition, TransitionDataset};
pub use ensemble::{
    DynamicsEnsemble, FitSummary, GaussianPrediction, LinearEnsemble, LinearEnsembleConfig,
};
pub use env::{ActionSpace, Env, EnvStep};
pub use error::DynamicsError;
pub use model_env::{ModelEnv, ModelStep, ModelTransition, Sampling};
pub use task::Task;
