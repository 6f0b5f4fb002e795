//! Sampling distribution over flattened action sequences.

use dynamics::ActionSpace;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

/// Samples are drawn from a normal truncated to this many standard deviations.
pub const TRUNCATION: f32 = 2.0;

/// Per-dimension box over a flattened action sequence: the action-space
/// bounds repeated once per horizon step.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBounds {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl SequenceBounds {
    #[must_use]
    pub fn tiled(space: &ActionSpace, horizon: usize) -> Self {
        Self {
            low: space.low().repeat(horizon),
            high: space.high().repeat(horizon),
        }
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn high(&self) -> &[f32] {
        &self.high
    }

    pub fn clamp(&self, index: usize, value: f32) -> f32 {
        value.clamp(self.low[index], self.high[index])
    }

    pub fn contains(&self, sequence: &[f32]) -> bool {
        sequence.len() == self.len()
            && sequence
                .iter()
                .enumerate()
                .all(|(i, &v)| self.low[i] <= v && v <= self.high[i])
    }
}

/// Mean and variance of the elite candidates of one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct EliteStats {
    pub mean: Vec<f32>,
    pub var: Vec<f32>,
}

impl EliteStats {
    /// Per-dimension mean and population variance of `population[i]` for
    /// every `i` in `elites`.
    #[must_use]
    pub fn from_population(population: &[Vec<f32>], elites: &[usize]) -> Self {
        let dim = population.first().map_or(0, Vec::len);
        let count = elites.len().max(1) as f32;
        let mut mean = vec![0.0; dim];
        for &e in elites {
            for (m, x) in mean.iter_mut().zip(&population[e]) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= count;
        }
        let mut var = vec![0.0; dim];
        for &e in elites {
            for ((v, x), m) in var.iter_mut().zip(&population[e]).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        for v in &mut var {
            *v /= count;
        }
        Self { mean, var }
    }
}

/// Indices of the `k` highest rewards, best first.
///
/// The sort is stable, so equal rewards keep their sampling order. NaN
/// rewards rank below every number.
#[must_use]
pub fn select_elites(rewards: &[f32], k: usize) -> Vec<usize> {
    let key = |r: f32| if r.is_nan() { f32::NEG_INFINITY } else { r };
    let mut order: Vec<usize> = (0..rewards.len()).collect();
    order.sort_by(|&a, &b| {
        key(rewards[b])
            .partial_cmp(&key(rewards[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);
    order
}

/// Independent per-dimension Gaussian belief over action sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief {
    pub mean: Vec<f32>,
    pub var: Vec<f32>,
}

impl Belief {
    pub fn new(mean: Vec<f32>, var: Vec<f32>) -> Self {
        debug_assert_eq!(mean.len(), var.len());
        Self { mean, var }
    }

    /// `min(var, (mean - low)² / 4, (high - mean)² / 4)` per dimension, so that
    /// a `±2σ` draw cannot leave the bounds.
    #[must_use]
    pub fn constrained_variance(&self, bounds: &SequenceBounds) -> Vec<f32> {
        self.mean
            .iter()
            .zip(&self.var)
            .enumerate()
            .map(|(i, (&m, &v))| {
                let to_low = (m - bounds.low()[i]) / 2.0;
                let to_high = (bounds.high()[i] - m) / 2.0;
                v.min(to_low * to_low).min(to_high * to_high)
            })
            .collect()
    }

    /// Draws `count` candidate sequences from the bound-truncated belief.
    pub fn sample_population(
        &self,
        bounds: &SequenceBounds,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Vec<f32>> {
        let std: Vec<f32> = self
            .constrained_variance(bounds)
            .into_iter()
            .map(f32::sqrt)
            .collect();
        (0..count)
            .map(|_| {
                self.mean
                    .iter()
                    .zip(&std)
                    .enumerate()
                    .map(|(i, (&m, &s))| bounds.clamp(i, m + s * truncated_standard_normal(rng)))
                    .collect()
            })
            .collect()
    }

    /// `mean ← α·mean + (1−α)·elite.mean`, and likewise for the variance.
    pub fn blend(&mut self, elite: &EliteStats, alpha: f32) {
        for (m, e) in self.mean.iter_mut().zip(&elite.mean) {
            *m = alpha * *m + (1.0 - alpha) * e;
        }
        for (v, e) in self.var.iter_mut().zip(&elite.var) {
            *v = alpha * *v + (1.0 - alpha) * e;
        }
    }

    pub fn apply_floor(&mut self, floor: f32) {
        for v in &mut self.var {
            *v = v.max(floor);
        }
    }
}

fn truncated_standard_normal(rng: &mut dyn RngCore) -> f32 {
    loop {
        let z: f32 = rng.sample(StandardNormal);
        if z.abs() <= TRUNCATION {
            return z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_bounds(len: usize) -> SequenceBounds {
        SequenceBounds::tiled(&ActionSpace::symmetric(1, 1.0).unwrap(), len)
    }

    #[test]
    fn variance_is_clipped_towards_the_nearer_bound() {
        let bounds = unit_bounds(3);
        let belief = Belief::new(vec![0.0, 0.8, -0.6], vec![1.0, 1.0, 0.01]);
        let cv = belief.constrained_variance(&bounds);
        assert_relative_eq!(cv[0], 0.25);
        assert_relative_eq!(cv[1], 0.01, epsilon = 1e-6);
        assert_relative_eq!(cv[2], 0.01);
    }

    #[test]
    fn samples_never_leave_the_bounds() {
        let bounds = unit_bounds(4);
        let belief = Belief::new(vec![0.99, -1.0, 0.0, 0.5], vec![10.0; 4]);
        let mut rng = StdRng::seed_from_u64(9);
        for sample in belief.sample_population(&bounds, 2000, &mut rng) {
            assert!(bounds.contains(&sample), "{sample:?}");
            assert_eq!(sample[1], -1.0);
        }
    }

    #[test]
    fn elites_are_stable_for_ties() {
        let rewards = [1.0, 3.0, 3.0, f32::NAN, 2.0, 3.0];
        assert_eq!(select_elites(&rewards, 4), vec![1, 2, 5, 4]);
        assert_eq!(select_elites(&rewards, 10).len(), rewards.len());
        assert_eq!(select_elites(&rewards, 10).last(), Some(&3));
    }

    #[test]
    fn elite_stats_use_population_variance() {
        let population = vec![vec![1.0, 0.0], vec![3.0, 2.0], vec![100.0, 100.0]];
        let stats = EliteStats::from_population(&population, &[0, 1]);
        assert_eq!(stats.mean, vec![2.0, 1.0]);
        assert_eq!(stats.var, vec![1.0, 1.0]);
    }

    #[test]
    fn blend_is_a_convex_combination() {
        let elite = EliteStats { mean: vec![1.0, -1.0], var: vec![0.5, 0.0] };
        for alpha in [0.0_f32, 0.25, 0.5, 1.0] {
            let mut belief = Belief::new(vec![0.2, 0.4], vec![2.0, 1.0]);
            belief.blend(&elite, alpha);
            assert_relative_eq!(belief.mean[0], alpha * 0.2 + (1.0 - alpha) * 1.0);
            assert_relative_eq!(belief.mean[1], alpha * 0.4 + (1.0 - alpha) * -1.0);
            assert_relative_eq!(belief.var[0], alpha * 2.0 + (1.0 - alpha) * 0.5);
            assert_relative_eq!(belief.var[1], alpha * 1.0);
        }
    }

    #[test]
    fn floor_lifts_collapsed_variance() {
        let mut belief = Belief::new(vec![0.0; 2], vec![0.0, 0.5]);
        belief.apply_floor(0.1);
        assert_eq!(belief.var, vec![0.1, 0.5]);
    }
}
