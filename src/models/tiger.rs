use crate::Action;
use crate::Obs;
use crate::Probability;
use crate::Reward;
use crate::belief::belief::ParticleBelief;
use crate::belief::particle::Particle;
use crate::bounds::registry::Registry;
use crate::bounds::upper::LookaheadUpperBound;
use crate::model::Outcome;
use crate::model::Pomdp;
use crate::model::ValuedAction;
use crate::random::seeds::Seeds;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// The tiger waits behind one of two doors. Listening costs a little
/// and mishears with probability `noise`; opening the quiet door pays,
/// opening the loud one hurts, and either way the tiger relocates and
/// the game goes on.
pub struct Tiger {
    noise: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Door {
    Left,
    Right,
}

impl Door {
    fn across(self) -> Self {
        match self {
            Door::Left => Door::Right,
            Door::Right => Door::Left,
        }
    }

    fn heard(self) -> Obs {
        match self {
            Door::Left => Tiger::HEAR_LEFT,
            Door::Right => Tiger::HEAR_RIGHT,
        }
    }
}

impl Tiger {
    pub const OPEN_LEFT: Action = 0;
    pub const OPEN_RIGHT: Action = 1;
    pub const LISTEN: Action = 2;

    pub const HEAR_LEFT: Obs = 0;
    pub const HEAR_RIGHT: Obs = 1;

    const LISTEN_COST: Reward = -1.0;
    const TREASURE: Reward = 10.0;
    const MAULING: Reward = -100.0;

    pub fn new(noise: f64) -> Self {
        assert!(noise >= 0.0 && noise < 0.5);
        Self { noise }
    }

    fn opened(action: Action) -> Door {
        match action {
            Self::OPEN_LEFT => Door::Left,
            Self::OPEN_RIGHT => Door::Right,
            _ => unreachable!("listening opens no door"),
        }
    }
}

impl Default for Tiger {
    fn default() -> Self {
        Self::new(0.15)
    }
}

impl Pomdp for Tiger {
    type State = Door;

    fn step(&self, state: &mut Self::State, random: f64, action: Action) -> Outcome {
        // one uniform in, several draws out: reseed on the sample bits
        // so the step stays bit-reproducible
        let mut rng = SmallRng::seed_from_u64(random.to_bits());
        match action {
            Self::LISTEN => {
                let truthful = rng.random::<f64>() >= self.noise;
                let heard = if truthful {
                    state.heard()
                } else {
                    state.across().heard()
                };
                Outcome {
                    reward: Self::LISTEN_COST,
                    obs: heard,
                    terminal: false,
                }
            }
            open => {
                let reward = if Self::opened(open) == *state {
                    Self::MAULING
                } else {
                    Self::TREASURE
                };
                *state = if rng.random::<f64>() < 0.5 {
                    Door::Left
                } else {
                    Door::Right
                };
                let heard = if rng.random::<f64>() < 0.5 {
                    Self::HEAR_LEFT
                } else {
                    Self::HEAR_RIGHT
                };
                Outcome {
                    reward,
                    obs: heard,
                    terminal: false,
                }
            }
        }
    }

    fn obs_probability(&self, obs: Obs, state: &Self::State, action: Action) -> Probability {
        match action {
            Self::LISTEN => {
                if obs == state.heard() {
                    1.0 - self.noise
                } else {
                    self.noise
                }
            }
            _ => 0.5,
        }
    }

    fn num_actions(&self) -> usize {
        3
    }

    fn start_state(&self, rng: &mut SmallRng) -> Self::State {
        if rng.random::<f64>() < 0.5 {
            Door::Left
        } else {
            Door::Right
        }
    }

    /// the belief starts uniform whether or not the true door is known
    fn initial_belief(
        self: Arc<Self>,
        _start: Option<&Self::State>,
        seeds: &Seeds,
    ) -> ParticleBelief<Self> {
        let particles = vec![
            Particle::new(Door::Left, 0.5, 0),
            Particle::new(Door::Right, 0.5, 1),
        ];
        ParticleBelief::new(self.clone(), particles, seeds)
    }

    fn max_reward(&self) -> Reward {
        Self::TREASURE
    }

    fn min_reward_action(&self) -> ValuedAction {
        ValuedAction::new(Self::LISTEN, Self::LISTEN_COST)
    }

    fn reward(&self, state: &Self::State, action: Action) -> Reward {
        match action {
            Self::LISTEN => Self::LISTEN_COST,
            open => {
                if Self::opened(open) == *state {
                    Self::MAULING
                } else {
                    Self::TREASURE
                }
            }
        }
    }

    fn register_bounds(&self, registry: &mut Registry<Self>) {
        registry.register_upper(
            "LOOKAHEAD",
            Box::new(|_, config| {
                Ok(Box::new(LookaheadUpperBound::new(
                    config.discount,
                    config.search_depth,
                )))
            }),
        );
    }

    fn enumerate(&self) -> Option<Vec<Self::State>> {
        Some(vec![Door::Left, Door::Right])
    }

    fn print_state(&self, state: &Self::State) -> String {
        match state {
            Door::Left => String::from("tiger-left"),
            Door::Right => String::from("tiger-right"),
        }
    }

    fn print_obs(&self, obs: Obs) -> String {
        match obs {
            Self::HEAR_LEFT => String::from("hear-left"),
            _ => String::from("hear-right"),
        }
    }

    fn print_action(&self, action: Action) -> String {
        match action {
            Self::OPEN_LEFT => String::from("open-left"),
            Self::OPEN_RIGHT => String::from("open-right"),
            _ => String::from("listen"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::planner::Planner;

    fn quick() -> Config {
        Config {
            time_per_move: 0.1,
            num_scenarios: 64,
            search_depth: 10,
            ..Config::default()
        }
    }

    #[test]
    fn steps_are_bit_reproducible() {
        let tiger = Tiger::default();
        let mut a = Door::Left;
        let mut b = Door::Left;
        let one = tiger.step(&mut a, 0.371, Tiger::OPEN_RIGHT);
        let two = tiger.step(&mut b, 0.371, Tiger::OPEN_RIGHT);
        assert_eq!(one, two);
        assert_eq!(a, b);
    }

    #[test]
    fn listening_never_moves_the_tiger() {
        let tiger = Tiger::default();
        let mut state = Door::Right;
        let outcome = tiger.step(&mut state, 0.9, Tiger::LISTEN);
        assert_eq!(state, Door::Right);
        assert_eq!(outcome.reward, -1.0);
    }

    #[test]
    fn observation_probabilities_are_normalized() {
        let tiger = Tiger::default();
        for action in 0..3 {
            for state in [Door::Left, Door::Right] {
                let total: f64 = [Tiger::HEAR_LEFT, Tiger::HEAR_RIGHT]
                    .iter()
                    .map(|&obs| tiger.obs_probability(obs, &state, action))
                    .sum();
                assert!((total - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn uncertain_start_means_listen_first() {
        let mut planner = Planner::new(Arc::new(Tiger::default()), quick()).unwrap();
        assert_eq!(planner.plan().unwrap(), Tiger::LISTEN);
    }

    #[test]
    fn model_registered_upper_bound_resolves() {
        let config = Config {
            upper_bound: String::from("LOOKAHEAD"),
            ..quick()
        };
        let mut planner = Planner::new(Arc::new(Tiger::default()), config).unwrap();
        assert_eq!(planner.plan().unwrap(), Tiger::LISTEN);
    }

    #[test]
    fn two_left_growls_open_the_right_door() {
        let mut planner = Planner::new(Arc::new(Tiger::default()), quick()).unwrap();
        planner.update(Tiger::LISTEN, Tiger::HEAR_LEFT).unwrap();
        planner.update(Tiger::LISTEN, Tiger::HEAR_LEFT).unwrap();
        assert_eq!(planner.plan().unwrap(), Tiger::OPEN_RIGHT);
    }

    #[test]
    fn updates_concentrate_the_belief() {
        let mut planner = Planner::new(Arc::new(Tiger::default()), quick()).unwrap();
        planner.update(Tiger::LISTEN, Tiger::HEAR_LEFT).unwrap();
        planner.update(Tiger::LISTEN, Tiger::HEAR_LEFT).unwrap();
        let history = planner.belief().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some((Tiger::LISTEN, Tiger::HEAR_LEFT)));
    }

    #[test]
    fn seeded_episodes_replay_exactly() {
        let config = Config {
            root_seed: 42,
            time_per_move: 0.05,
            num_scenarios: 8,
            search_depth: 2,
            sim_len: 4,
            ..Config::default()
        };
        let episode = |config: Config| -> Vec<Action> {
            let model = Arc::new(Tiger::default());
            let mut planner = Planner::new(model.clone(), config).unwrap();
            let mut world = Seeds::new(42).world();
            let mut state = model.start_state(&mut world);
            let mut actions = Vec::new();
            for _ in 0..4 {
                let action = planner.plan().unwrap();
                actions.push(action);
                let outcome = model.step(&mut state, world.random::<f64>(), action);
                planner.update(action, outcome.obs).unwrap();
            }
            actions
        };
        assert_eq!(episode(config.clone()), episode(config));
    }
}
