use crate::Action;
use crate::belief::particle::Particle;
use crate::history::History;
use crate::model::Pomdp;
use crate::random::seeds::Seeds;
use crate::random::streams::Streams;
use rand::Rng;
use rand::rngs::SmallRng;

/// The action source a default-policy rollout consults at each step.
/// Implementations see the live particle set and the history so that
/// problem-supplied policies can be as informed as they like.
pub trait RolloutPolicy<P: Pomdp>: Send {
    fn action(
        &mut self,
        model: &P,
        particles: &[Particle<P::State>],
        streams: &Streams,
        history: &History,
    ) -> Action;
}

/// Uniformly random legal action, drawn from the dedicated rollout
/// randomness domain so scenario streams stay untouched.
pub struct RandomPolicy {
    rng: SmallRng,
}

impl RandomPolicy {
    pub fn new(seeds: &Seeds) -> Self {
        Self {
            rng: seeds.rollout(),
        }
    }
}

impl<P: Pomdp> RolloutPolicy<P> for RandomPolicy {
    fn action(
        &mut self,
        model: &P,
        _particles: &[Particle<P::State>],
        _streams: &Streams,
        _history: &History,
    ) -> Action {
        self.rng.random_range(0..model.num_actions())
    }
}

/// The same fixed action at every step.
pub struct BlindPolicy {
    action: Action,
}

impl BlindPolicy {
    pub fn new(action: Action) -> Self {
        Self { action }
    }
}

impl<P: Pomdp> RolloutPolicy<P> for BlindPolicy {
    fn action(
        &mut self,
        _model: &P,
        _particles: &[Particle<P::State>],
        _streams: &Streams,
        _history: &History,
    ) -> Action {
        self.action
    }
}
