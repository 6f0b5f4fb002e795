//! Inverted pendulum swing-up with a continuous torque action.
//!
//! The pendulum starts at a random angle and must be swung up and held
//! upright. There is no terminal state; episodes end on the caller's step
//! budget.

use std::f32::consts::PI;

use dynamics::{ActionSpace, DynamicsError, Env, EnvStep, Task};
use rand::{Rng, RngCore};

/// Physical constants of the pendulum.
#[derive(Clone, Debug, PartialEq)]
pub struct PendulumConfig {
    /// Angular velocity clip (rad/s)
    pub max_speed: f32,
    /// Torque bound; also the action bound
    pub max_torque: f32,
    /// Integration step (s)
    pub dt: f32,
    /// Gravitational acceleration
    pub g: f32,
    /// Bob mass (kg)
    pub m: f32,
    /// Rod length (m)
    pub l: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self { max_speed: 8.0, max_torque: 2.0, dt: 0.05, g: 10.0, m: 1.0, l: 1.0 }
    }
}

/// Wraps an angle into `[-π, π)`.
#[must_use]
pub fn angle_normalize(theta: f32) -> f32 {
    (theta + PI).rem_euclid(2.0 * PI) - PI
}

fn cost(theta: f32, theta_dot: f32, torque: f32) -> f32 {
    angle_normalize(theta).powi(2) + 0.1 * theta_dot.powi(2) + 0.001 * torque.powi(2)
}

pub struct Pendulum {
    config: PendulumConfig,
    action_space: ActionSpace,
    theta: f32,
    theta_dot: f32,
}

impl Pendulum {
    /// # Errors
    ///
    /// Fails when `max_torque` is not a finite number.
    pub fn new(config: PendulumConfig) -> Result<Self, DynamicsError> {
        let action_space = ActionSpace::symmetric(1, config.max_torque.abs())?;
        Ok(Self { config, action_space, theta: 0.0, theta_dot: 0.0 })
    }

    /// Current `(θ, θ̇)`.
    pub fn state(&self) -> (f32, f32) {
        (self.theta, self.theta_dot)
    }

    /// Places the pendulum at an exact state and returns its observation.
    pub fn reset_to(&mut self, theta: f32, theta_dot: f32) -> Vec<f32> {
        self.theta = theta;
        self.theta_dot = theta_dot;
        self.observe()
    }

    fn observe(&self) -> Vec<f32> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}

impl Env for Pendulum {
    fn reset(&mut self, rng: &mut dyn RngCore) -> Vec<f32> {
        self.theta = rng.gen_range(-PI..=PI);
        self.theta_dot = rng.gen_range(-1.0..=1.0);
        self.observe()
    }

    fn step(&mut self, action: &[f32]) -> EnvStep {
        let c = &self.config;
        let u = action
            .first()
            .copied()
            .unwrap_or(0.0)
            .clamp(-c.max_torque, c.max_torque);
        let reward = -cost(self.theta, self.theta_dot, u);

        let theta_acc = 3.0 * c.g / (2.0 * c.l) * self.theta.sin() + 3.0 / (c.m * c.l * c.l) * u;
        let theta_dot = (self.theta_dot + theta_acc * c.dt).clamp(-c.max_speed, c.max_speed);
        self.theta += theta_dot * c.dt;
        self.theta_dot = theta_dot;

        EnvStep { obs: self.observe(), reward, done: false }
    }

    fn obs_size(&self) -> usize {
        3
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }
}

/// Oracle reward for pendulum transitions, read off the next observation
/// `[cos θ, sin θ, θ̇]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PendulumTask;

impl Task for PendulumTask {
    fn reward(&self, _obs: &[f32], action: &[f32], next_obs: &[f32]) -> f32 {
        let theta = next_obs[1].atan2(next_obs[0]);
        let u = action.first().copied().unwrap_or(0.0);
        -cost(theta, next_obs[2], u)
    }

    fn is_terminal(&self, _obs: &[f32], _action: &[f32], _next_obs: &[f32]) -> bool {
        false
    }
}
