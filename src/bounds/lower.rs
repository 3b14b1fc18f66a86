use crate::Discount;
use crate::Weight;
use crate::belief::particle::Particle;
use crate::bounds::infinite_horizon;
use crate::bounds::policy::RolloutPolicy;
use crate::history::History;
use crate::model::Pomdp;
use crate::model::ValuedAction;
use crate::random::streams::Streams;

/// A scenario-wise lower value estimator. Given particles at some
/// history depth it returns a weighted-sum lower bound on the optimal
/// value together with the action its fallback policy would take.
/// Outputs are scenario-weight-additive: bounding a subset of the
/// scenarios and summing gives the bound of the union.
pub trait ScenarioLowerBound<P: Pomdp>: Send {
    fn value(
        &mut self,
        model: &P,
        particles: &[Particle<P::State>],
        streams: &mut Streams,
        history: &History,
    ) -> ValuedAction;
}

/// Repeat the best worst-case action forever.
pub struct TrivialLowerBound {
    discount: Discount,
    horizon: usize,
}

impl TrivialLowerBound {
    pub fn new(discount: Discount, horizon: usize) -> Self {
        Self { discount, horizon }
    }
}

impl<P: Pomdp> ScenarioLowerBound<P> for TrivialLowerBound {
    fn value(
        &mut self,
        model: &P,
        particles: &[Particle<P::State>],
        _streams: &mut Streams,
        _history: &History,
    ) -> ValuedAction {
        let fallback = model.min_reward_action();
        let weight = particles.iter().map(|p| p.weight).sum::<Weight>();
        let value = weight * fallback.value * infinite_horizon(self.discount, self.horizon);
        ValuedAction::new(fallback.action, value)
    }
}

/// Roll the particles forward jointly under a default policy, drawing
/// each scenario's outcomes from its own stream, truncating at the
/// policy simulation depth or stream exhaustion, and closing with the
/// trivial tail. The stream cursor is restored before returning.
pub struct PolicyLowerBound<P: Pomdp> {
    policy: Box<dyn RolloutPolicy<P>>,
    tail: TrivialLowerBound,
    discount: Discount,
    max_len: usize,
}

impl<P: Pomdp> PolicyLowerBound<P> {
    pub fn new(
        policy: Box<dyn RolloutPolicy<P>>,
        discount: Discount,
        max_len: usize,
        horizon: usize,
    ) -> Self {
        Self {
            tail: TrivialLowerBound::new(discount, horizon),
            policy,
            discount,
            max_len,
        }
    }
}

impl<P: Pomdp> ScenarioLowerBound<P> for PolicyLowerBound<P> {
    fn value(
        &mut self,
        model: &P,
        particles: &[Particle<P::State>],
        streams: &mut Streams,
        history: &History,
    ) -> ValuedAction {
        let origin = streams.position();
        let mut live = particles.to_vec();
        let mut value = 0.0;
        let mut discounting = 1.0;
        let mut first: Option<crate::Action> = None;
        let mut steps = 0;
        while !live.is_empty() && !streams.exhausted() && steps < self.max_len {
            let action = self.policy.action(model, &live, streams, history);
            first.get_or_insert(action);
            let mut survivors = Vec::with_capacity(live.len());
            for mut particle in live {
                let outcome =
                    model.step(&mut particle.state, streams.entry(particle.scenario), action);
                value += discounting * particle.weight * outcome.reward;
                if !outcome.terminal {
                    survivors.push(particle);
                }
            }
            live = survivors;
            streams.advance();
            discounting *= self.discount;
            steps += 1;
        }
        if !live.is_empty() {
            let tail = ScenarioLowerBound::<P>::value(&mut self.tail, model, &live, streams, history);
            value += discounting * tail.value;
        }
        streams.seek(origin);
        ValuedAction::new(
            first.unwrap_or_else(|| model.min_reward_action().action),
            value,
        )
    }
}
