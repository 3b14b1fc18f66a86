use crate::Discount;
use crate::Reward;
use crate::Weight;
use crate::belief::particle::Particle;
use crate::bounds::infinite_horizon;
use crate::history::History;
use crate::model::Pomdp;
use crate::random::streams::Streams;

/// A scenario-wise upper value estimator; weighted-sum and additive
/// over scenario subsets, like its lower sibling.
pub trait ScenarioUpperBound<P: Pomdp>: Send {
    fn value(
        &self,
        model: &P,
        particles: &[Particle<P::State>],
        streams: &Streams,
        history: &History,
    ) -> Reward;
}

/// Collect the best single-step reward forever.
pub struct TrivialUpperBound {
    discount: Discount,
    horizon: usize,
}

impl TrivialUpperBound {
    pub fn new(discount: Discount, horizon: usize) -> Self {
        Self { discount, horizon }
    }
}

impl<P: Pomdp> ScenarioUpperBound<P> for TrivialUpperBound {
    fn value(
        &self,
        model: &P,
        particles: &[Particle<P::State>],
        _streams: &Streams,
        _history: &History,
    ) -> Reward {
        let weight = particles.iter().map(|p| p.weight).sum::<Weight>();
        weight * model.max_reward() * infinite_horizon(self.discount, self.horizon)
    }
}

/// One step of exact immediate reward, then the trivial tail. Tighter
/// than the trivial bound whenever the best action differs per state;
/// only sound for models that implement the `reward` shortcut.
pub struct LookaheadUpperBound {
    discount: Discount,
    horizon: usize,
}

impl LookaheadUpperBound {
    pub fn new(discount: Discount, horizon: usize) -> Self {
        Self { discount, horizon }
    }
}

impl<P: Pomdp> ScenarioUpperBound<P> for LookaheadUpperBound {
    fn value(
        &self,
        model: &P,
        particles: &[Particle<P::State>],
        _streams: &Streams,
        _history: &History,
    ) -> Reward {
        let immediate = particles
            .iter()
            .map(|p| {
                let best = (0..model.num_actions())
                    .map(|action| model.reward(&p.state, action))
                    .fold(Reward::NEG_INFINITY, Reward::max);
                p.weight * best
            })
            .sum::<Reward>();
        let weight = particles.iter().map(|p| p.weight).sum::<Weight>();
        let tail = weight * model.max_reward() * infinite_horizon(self.discount, self.horizon.saturating_sub(1));
        immediate + self.discount * tail
    }
}
