/// Oracle reward and termination functions of one control task.
///
/// Both functions are pure and score a single transition. They are injected
/// into the model-based step function so that simulated rollouts are judged
/// exactly like real ones.
pub trait Task {
    fn reward(&self, obs: &[f32], action: &[f32], next_obs: &[f32]) -> f32;

    fn is_terminal(&self, obs: &[f32], action: &[f32], next_obs: &[f32]) -> bool;

    /// Row-wise [`Task::reward`] over a batch of transitions.
    fn reward_batch(&self, obs: &[Vec<f32>], actions: &[Vec<f32>], next_obs: &[Vec<f32>]) -> Vec<f32> {
        obs.iter()
            .zip(actions)
            .zip(next_obs)
            .map(|((o, a), n)| self.reward(o, a, n))
            .collect()
    }

    /// Row-wise [`Task::is_terminal`] over a batch of transitions.
    fn terminal_batch(&self, obs: &[Vec<f32>], actions: &[Vec<f32>], next_obs: &[Vec<f32>]) -> Vec<bool> {
        obs.iter()
            .zip(actions)
            .zip(next_obs)
            .map(|((o, a), n)| self.is_terminal(o, a, n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Distance;

    impl Task for Distance {
        fn reward(&self, _obs: &[f32], action: &[f32], next_obs: &[f32]) -> f32 {
            -(next_obs[0].abs() + action[0].abs())
        }

        fn is_terminal(&self, _obs: &[f32], _action: &[f32], next_obs: &[f32]) -> bool {
            next_obs[0].abs() > 1.0
        }
    }

    #[test]
    fn batch_forms_match_single_rows() {
        let obs = vec![vec![0.0], vec![0.5]];
        let actions = vec![vec![0.25], vec![-1.0]];
        let next = vec![vec![0.5], vec![2.0]];
        assert_eq!(Distance.reward_batch(&obs, &actions, &next), vec![-0.75, -3.0]);
        assert_eq!(Distance.terminal_batch(&obs, &actions, &next), vec![false, true]);
    }
}
