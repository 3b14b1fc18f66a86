use crate::Action;
use crate::Obs;
use crate::Probability;
use crate::Reward;
use crate::belief::belief::ParticleBelief;
use crate::bounds::registry::Registry;
use crate::random::seeds::Seeds;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// What one generative step produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub reward: Reward,
    pub obs: Obs,
    pub terminal: bool,
}

/// An action paired with the value some policy attributes to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuedAction {
    pub action: Action,
    pub value: Reward,
}

impl ValuedAction {
    pub fn new(action: Action, value: Reward) -> Self {
        Self { action, value }
    }
}

impl std::fmt::Display for ValuedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.action, self.value)
    }
}

/// The generative problem interface the planner is polymorphic over.
///
/// The planner treats states as opaque values it clones, weighs, and
/// hands back; all problem semantics flow through these methods. `step`
/// must be bit-reproducible for fixed inputs: every stochastic choice
/// is resolved by the single uniform sample it receives, which is how
/// scenarios determinize the problem.
pub trait Pomdp: Sized + Send + Sync + 'static {
    type State: Clone + std::fmt::Debug + Send + Sync;

    /// advance `state` in place under `action`, with all randomness
    /// drawn from `random`
    fn step(&self, state: &mut Self::State, random: f64, action: Action) -> Outcome;

    /// probability of observing `obs` after `action` landed in `state`
    fn obs_probability(&self, obs: Obs, state: &Self::State, action: Action) -> Probability;

    /// actions are the dense integers 0..num_actions()
    fn num_actions(&self) -> usize;

    /// draw a start state from the prior
    fn start_state(&self, rng: &mut SmallRng) -> Self::State;

    /// bootstrap a belief, optionally conditioned on a known start state
    fn initial_belief(self: Arc<Self>, start: Option<&Self::State>, seeds: &Seeds)
    -> ParticleBelief<Self>;

    /// largest single-step reward, for trivial upper bounds
    fn max_reward(&self) -> Reward;

    /// the action with the best worst-case single-step reward,
    /// for trivial lower bounds
    fn min_reward_action(&self) -> ValuedAction;

    /// immediate reward shortcut for bounds that want it
    fn reward(&self, _state: &Self::State, _action: Action) -> Reward {
        0.0
    }

    /// enumerate the full discrete state space, when that is tractable
    fn enumerate(&self) -> Option<Vec<Self::State>> {
        None
    }

    /// problem-supplied bound strategies, consulted once at planner init
    fn register_bounds(&self, _registry: &mut Registry<Self>) {}

    fn print_state(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }

    fn print_obs(&self, obs: Obs) -> String {
        format!("{}", obs)
    }

    fn print_action(&self, action: Action) -> String {
        format!("{}", action)
    }
}
