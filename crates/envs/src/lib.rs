#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::cast_precision_loss)]
//! Continuous control environments and their oracle tasks.
//!
//! Each environment implements [`dynamics::Env`] and ships with a matching
//! [`dynamics::Task`] that scores model-predicted transitions exactly the way
//! the environment scores real ones.

pub mod cartpole;
pub mod pendulum;

pub use cartpole::{CartPole, CartPoleConfig, CartPoleTask};
pub use pendulum::{Pendulum, PendulumConfig, PendulumTask};
