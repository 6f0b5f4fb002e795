#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::cast_precision_loss)]
//! # CEM
//!
//! Cross-entropy model-predictive control with trajectory sampling (PETS).
//!
//! [`CemPlanner`] refines a Gaussian belief over flattened action sequences by
//! scoring sampled candidates in a learned model through
//! [`trajectory::evaluate`], and warm-starts each call from the previous one.
//! [`OnlineLoop`] closes the loop against a real environment: it explores,
//! grows the transition dataset, retrains the ensemble every episode and acts
//! on the planner's first action.

pub mod config;
pub mod distribution;
pub mod error;
pub mod online;
pub mod planner;
pub mod trajectory;

pub use config::{CemConfig, LoopConfig, WarmStartPolicy};
pub use distribution::{select_elites, Belief, EliteStats, SequenceBounds};
pub use error::PlanError;
pub use online::{ActionSource, EpisodeSummary, Mode, OnlineLoop, StepRecord};
pub use planner::{CemPlanner, IterationStats, PlanReport, WarmStart};
pub use trajectory::{evaluate, rollout, Trajectory};
