use approx::assert_relative_eq;
use dynamics::{Env, Task};
use envs::pendulum::angle_normalize;
use envs::{Pendulum, PendulumConfig, PendulumTask};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn reset_draws_a_valid_observation() {
    let mut env = Pendulum::new(PendulumConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..20 {
        let obs = env.reset(&mut rng);
        assert_eq!(obs.len(), env.obs_size());
        assert_relative_eq!(obs[0] * obs[0] + obs[1] * obs[1], 1.0, epsilon = 1e-5);
        assert!(obs[2].abs() <= 1.0);
    }
}

#[test]
fn upright_and_still_costs_nothing() {
    let mut env = Pendulum::new(PendulumConfig::default()).unwrap();
    env.reset_to(0.0, 0.0);
    let step = env.step(&[0.0]);
    assert_relative_eq!(step.reward, 0.0);
    assert!(!step.done);
    assert_relative_eq!(step.obs[0], 1.0);
}

#[test]
fn hanging_pendulum_is_penalised() {
    let mut env = Pendulum::new(PendulumConfig::default()).unwrap();
    env.reset_to(std::f32::consts::PI, 0.0);
    let step = env.step(&[2.0]);
    assert_relative_eq!(step.reward, -(std::f32::consts::PI.powi(2) + 0.001 * 4.0), epsilon = 1e-4);
}

#[test]
fn torque_and_speed_are_clipped() {
    let mut env = Pendulum::new(PendulumConfig::default()).unwrap();
    env.reset_to(0.0, 7.9);
    let step = env.step(&[100.0]);
    assert!(step.obs[2] <= 8.0);
    assert_eq!(env.action_space().high(), &[2.0]);
}

#[test]
fn task_reward_matches_the_next_state_cost() {
    let theta = 0.3_f32;
    let next = vec![theta.cos(), theta.sin(), -1.5];
    let r = PendulumTask.reward(&[1.0, 0.0, 0.0], &[1.0], &next);
    assert_relative_eq!(r, -(0.09 + 0.1 * 2.25 + 0.001), epsilon = 1e-5);
    assert!(!PendulumTask.is_terminal(&[0.0; 3], &[0.0], &next));
}

#[test]
fn angles_wrap_into_half_open_interval() {
    assert_relative_eq!(angle_normalize(3.0 * std::f32::consts::PI / 2.0), -std::f32::consts::PI / 2.0, epsilon = 1e-5);
    assert_relative_eq!(angle_normalize(0.25), 0.25, epsilon = 1e-6);
}
