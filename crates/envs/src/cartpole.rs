//! Cart-pole balancing with a continuous force action.
//!
//! The action in `[-1, 1]` is scaled by [`CartPoleConfig::force_mag`] and
//! applied to the cart. Every step earns a reward of one; the episode ends when
//! the cart leaves the track or the pole tilts past the failure angle.

use dynamics::{ActionSpace, DynamicsError, Env, EnvStep, Task};
use rand::{Rng, RngCore};

/// Configuration for the cart-pole system
#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleConfig {
    pub gravity: f32,
    /// Cart mass in kg
    pub cart_mass: f32,
    /// Pole mass in kg
    pub pole_mass: f32,
    /// Half the pole length in meters
    pub half_length: f32,
    /// Force applied for a unit action
    pub force_mag: f32,
    /// Integration step in seconds
    pub tau: f32,
    /// Position threshold for failure detection (meters)
    pub x_threshold: f32,
    /// Angle threshold for failure detection (radians, ~12 degrees)
    pub theta_threshold: f32,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            half_length: 0.5,
            force_mag: 30.0,
            tau: 0.02,
            x_threshold: 2.4,
            theta_threshold: 0.2095,
        }
    }
}

impl CartPoleConfig {
    /// Whether `[x, ẋ, θ, θ̇]` lies outside the admissible region.
    #[must_use]
    pub fn is_failure(&self, obs: &[f32]) -> bool {
        obs[0].abs() > self.x_threshold || obs[2].abs() > self.theta_threshold
    }
}

pub struct CartPole {
    config: CartPoleConfig,
    action_space: ActionSpace,
    state: [f32; 4],
}

impl CartPole {
    /// # Errors
    ///
    /// Never fails for the unit action box; the `Result` mirrors the other
    /// environment constructors.
    pub fn new(config: CartPoleConfig) -> Result<Self, DynamicsError> {
        let action_space = ActionSpace::symmetric(1, 1.0)?;
        Ok(Self { config, action_space, state: [0.0; 4] })
    }

    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    /// Places the system at `[x, ẋ, θ, θ̇]`.
    pub fn reset_to(&mut self, state: [f32; 4]) -> Vec<f32> {
        self.state = state;
        self.state.to_vec()
    }

    fn integrate(&mut self, force: f32) {
        let c = &self.config;
        let [x, x_dot, theta, theta_dot] = self.state;
        let total_mass = c.cart_mass + c.pole_mass;
        let polemass_length = c.pole_mass * c.half_length;
        let (sin, cos) = theta.sin_cos();

        let temp = (force + polemass_length * theta_dot * theta_dot * sin) / total_mass;
        let theta_acc = (c.gravity * sin - cos * temp)
            / (c.half_length * (4.0 / 3.0 - c.pole_mass * cos * cos / total_mass));
        let x_acc = temp - polemass_length * theta_acc * cos / total_mass;

        self.state = [
            x + c.tau * x_dot,
            x_dot + c.tau * x_acc,
            theta + c.tau * theta_dot,
            theta_dot + c.tau * theta_acc,
        ];
    }
}

impl Env for CartPole {
    fn reset(&mut self, rng: &mut dyn RngCore) -> Vec<f32> {
        for s in &mut self.state {
            *s = rng.gen_range(-0.05..=0.05);
        }
        self.state.to_vec()
    }

    fn step(&mut self, action: &[f32]) -> EnvStep {
        let u = action.first().copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        self.integrate(self.config.force_mag * u);
        let obs = self.state.to_vec();
        let done = self.config.is_failure(&obs);
        EnvStep { obs, reward: 1.0, done }
    }

    fn obs_size(&self) -> usize {
        4
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }
}

/// Oracle task: one point per step, failure read off the next observation.
#[derive(Clone, Debug, Default)]
pub struct CartPoleTask {
    pub config: CartPoleConfig,
}

impl Task for CartPoleTask {
    fn reward(&self, _obs: &[f32], _action: &[f32], _next_obs: &[f32]) -> f32 {
        1.0
    }

    fn is_terminal(&self, _obs: &[f32], _action: &[f32], next_obs: &[f32]) -> bool {
        self.config.is_failure(next_obs)
    }
}
