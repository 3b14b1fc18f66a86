//! Minimal problems exercising planner edge cases from the tests.

use crate::Action;
use crate::Obs;
use crate::Probability;
use crate::Reward;
use crate::belief::belief::ParticleBelief;
use crate::belief::particle::Particle;
use crate::model::Outcome;
use crate::model::Pomdp;
use crate::model::ValuedAction;
use crate::random::seeds::Seeds;
use rand::Rng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// One hidden-state-free machine whose arms pay their own index and
/// always emit observation 0. Arm k is optimal, trivially.
pub struct Bandit {
    arms: usize,
}

impl Bandit {
    pub fn new(arms: usize) -> Self {
        assert!(arms > 0);
        Self { arms }
    }
}

impl Pomdp for Bandit {
    type State = ();

    fn step(&self, _state: &mut Self::State, _random: f64, action: Action) -> Outcome {
        Outcome {
            reward: action as Reward,
            obs: 0,
            terminal: false,
        }
    }

    fn obs_probability(&self, obs: Obs, _state: &Self::State, _action: Action) -> Probability {
        if obs == 0 { 1.0 } else { 0.0 }
    }

    fn num_actions(&self) -> usize {
        self.arms
    }

    fn start_state(&self, _rng: &mut SmallRng) -> Self::State {}

    fn initial_belief(
        self: Arc<Self>,
        _start: Option<&Self::State>,
        seeds: &Seeds,
    ) -> ParticleBelief<Self> {
        ParticleBelief::new(self.clone(), vec![Particle::new((), 1.0, 0)], seeds)
    }

    fn max_reward(&self) -> Reward {
        (self.arms - 1) as Reward
    }

    fn min_reward_action(&self) -> ValuedAction {
        ValuedAction::new(0, 0.0)
    }

    fn enumerate(&self) -> Option<Vec<Self::State>> {
        Some(vec![()])
    }
}

/// Every state is absorbing: stepping terminates immediately with no
/// reward. A planner must still produce some action without growing a
/// tree past the root.
#[derive(Default)]
pub struct Absorbing;

impl Pomdp for Absorbing {
    type State = ();

    fn step(&self, _state: &mut Self::State, _random: f64, _action: Action) -> Outcome {
        Outcome {
            reward: 0.0,
            obs: 0,
            terminal: true,
        }
    }

    fn obs_probability(&self, obs: Obs, _state: &Self::State, _action: Action) -> Probability {
        if obs == 0 { 1.0 } else { 0.0 }
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn start_state(&self, _rng: &mut SmallRng) -> Self::State {}

    fn initial_belief(
        self: Arc<Self>,
        _start: Option<&Self::State>,
        seeds: &Seeds,
    ) -> ParticleBelief<Self> {
        ParticleBelief::new(self.clone(), vec![Particle::new((), 1.0, 0)], seeds)
    }

    fn max_reward(&self) -> Reward {
        0.0
    }

    fn min_reward_action(&self) -> ValuedAction {
        ValuedAction::new(0, 0.0)
    }
}

/// A frozen bit observed without noise. Exists to drive the particle
/// filter into (and out of) degenerate reweightings.
#[derive(Default)]
pub struct Parity;

impl Parity {
    pub const LOOK: Action = 0;
    pub const IDLE: Action = 1;
}

impl Pomdp for Parity {
    type State = u64;

    fn step(&self, state: &mut Self::State, _random: f64, _action: Action) -> Outcome {
        Outcome {
            reward: 0.0,
            obs: *state,
            terminal: false,
        }
    }

    fn obs_probability(&self, obs: Obs, state: &Self::State, _action: Action) -> Probability {
        if obs == *state { 1.0 } else { 0.0 }
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn start_state(&self, rng: &mut SmallRng) -> Self::State {
        rng.random_range(0..2)
    }

    fn initial_belief(
        self: Arc<Self>,
        start: Option<&Self::State>,
        seeds: &Seeds,
    ) -> ParticleBelief<Self> {
        let particles = match start {
            Some(state) => vec![Particle::new(*state, 1.0, 0)],
            None => vec![Particle::new(0, 0.5, 0), Particle::new(1, 0.5, 1)],
        };
        ParticleBelief::new(self.clone(), particles, seeds)
    }

    fn max_reward(&self) -> Reward {
        0.0
    }

    fn min_reward_action(&self) -> ValuedAction {
        ValuedAction::new(Self::LOOK, 0.0)
    }

    fn enumerate(&self) -> Option<Vec<Self::State>> {
        Some(vec![0, 1])
    }
}
