use rand::{Rng, RngCore};

use crate::error::DynamicsError;

/// Box-shaped continuous action space with per-dimension bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl ActionSpace {
    /// Creates an action space from per-dimension bounds.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::InvalidActionSpace`] when the bound vectors are
    /// empty, differ in length, or when some `low[i] > high[i]`.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, DynamicsError> {
        if low.is_empty() {
            return Err(DynamicsError::InvalidActionSpace(
                "action space needs at least one dimension".into(),
            ));
        }
        if low.len() != high.len() {
            return Err(DynamicsError::InvalidActionSpace(format!(
                "{} lower bounds but {} upper bounds",
                low.len(),
                high.len()
            )));
        }
        if let Some(i) = low
            .iter()
            .zip(&high)
            .position(|(l, h)| !(l.is_finite() && h.is_finite() && l <= h))
        {
            return Err(DynamicsError::InvalidActionSpace(format!(
                "dimension {i} has bounds [{}, {}]",
                low[i], high[i]
            )));
        }
        Ok(Self { low, high })
    }

    /// Same bound `[-bound, bound]` on every one of `dim` dimensions.
    ///
    /// # Errors
    ///
    /// See [`ActionSpace::new`].
    pub fn symmetric(dim: usize, bound: f32) -> Result<Self, DynamicsError> {
        Self::new(vec![-bound; dim], vec![bound; dim])
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn high(&self) -> &[f32] {
        &self.high
    }

    /// Uniform sample from the box.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| if l < h { rng.gen_range(l..=h) } else { l })
            .collect()
    }

    pub fn contains(&self, action: &[f32]) -> bool {
        action.len() == self.dim()
            && action
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(a, (l, h))| l <= a && a <= h)
    }

    #[must_use]
    pub fn clip(&self, action: &[f32]) -> Vec<f32> {
        action
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .map(|(&a, (&l, &h))| a.clamp(l, h))
            .collect()
    }
}

/// Result of advancing a real environment by one action.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    pub obs: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// Reinforcement learning environment trait.
///
/// Modelled on the Gym interface: [`reset`] starts an episode and returns the
/// first observation, [`step`] applies one continuous action vector. The
/// environment draws any randomness it needs for resets from the caller's
/// random source so that a whole experiment replays from a single seed.
///
/// [`reset`]: Env::reset
/// [`step`]: Env::step
pub trait Env {
    /// Reset the environment to a (possibly random) starting state and return
    /// the initial observation vector.
    fn reset(&mut self, rng: &mut dyn RngCore) -> Vec<f32>;

    /// Advance the environment by one action.
    fn step(&mut self, action: &[f32]) -> EnvStep;

    /// Size of the observation vector.
    fn obs_size(&self) -> usize;

    fn action_space(&self) -> &ActionSpace;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_inverted_bounds() {
        let err = ActionSpace::new(vec![1.0], vec![-1.0]).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidActionSpace(_)));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(ActionSpace::new(vec![-1.0, -1.0], vec![1.0]).is_err());
        assert!(ActionSpace::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn samples_stay_in_box() {
        let space = ActionSpace::new(vec![-2.0, 0.0, 3.0], vec![2.0, 0.5, 3.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let a = space.sample(&mut rng);
            assert!(space.contains(&a), "{a:?}");
            assert_eq!(a[2], 3.0);
        }
    }

    #[test]
    fn clip_projects_onto_bounds() {
        let space = ActionSpace::symmetric(2, 1.0).unwrap();
        assert_eq!(space.clip(&[-3.0, 0.25]), vec![-1.0, 0.25]);
        assert!(!space.contains(&[0.0]));
    }
}
