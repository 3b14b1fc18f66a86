use crate::Action;
use crate::Obs;
use crate::RESAMPLE_EFFORT;
use crate::WEIGHT_EPSILON;
use crate::Weight;
use crate::belief::particle::Particle;
use crate::history::History;
use crate::model::Pomdp;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;

/// Recovery strategies for a particle filter whose live set died, tried
/// in order. Each returns an unnormalized set; empty means the strategy
/// failed and the next one is consulted.
pub fn cascade<P: Pomdp>(
    model: &P,
    pool: &[Particle<P::State>],
    history: &History,
    action: Action,
    obs: Obs,
    count: usize,
    rng: &mut SmallRng,
) -> Vec<Particle<P::State>> {
    let particles = by_prior(model, history, 0, count, rng);
    if !particles.is_empty() {
        log::debug!("recovered {} particles from the prior", particles.len());
        return particles;
    }
    let particles = by_pool(model, pool, history, 0, count, rng);
    if !particles.is_empty() {
        log::debug!("recovered {} particles from the initial pool", particles.len());
        return particles;
    }
    let particles = by_enumeration(model, action, obs);
    if !particles.is_empty() {
        log::debug!("recovered {} particles by state enumeration", particles.len());
    }
    particles
}

/// I. draw fresh candidate states from the prior and keep those that
/// survive a simulated pass through the recorded history.
pub fn by_prior<P: Pomdp>(
    model: &P,
    history: &History,
    hstart: usize,
    count: usize,
    rng: &mut SmallRng,
) -> Vec<Particle<P::State>> {
    let mut accepted = Vec::new();
    for _ in 0..count * RESAMPLE_EFFORT {
        if accepted.len() == count {
            break;
        }
        let state = model.start_state(rng);
        if let Some((state, weight)) = replay(model, state, 1.0, history, hstart, rng) {
            accepted.push(Particle::new(state, weight, accepted.len()));
        }
    }
    accepted
}

/// II. the same filter, restricted to the belief's fixed initial pool.
pub fn by_pool<P: Pomdp>(
    model: &P,
    pool: &[Particle<P::State>],
    history: &History,
    hstart: usize,
    count: usize,
    rng: &mut SmallRng,
) -> Vec<Particle<P::State>> {
    let weights = pool.iter().map(|p| p.weight).collect::<Vec<Weight>>();
    let Ok(choices) = WeightedIndex::new(weights) else {
        return vec![];
    };
    let mut accepted = Vec::new();
    for _ in 0..count * RESAMPLE_EFFORT {
        if accepted.len() == count {
            break;
        }
        let pick = &pool[choices.sample(rng)];
        let state = pick.state.clone();
        if let Some((state, weight)) = replay(model, state, 1.0, history, hstart, rng) {
            accepted.push(Particle::new(state, weight, accepted.len()));
        }
    }
    accepted
}

/// III. invert the last (action, observation) pair over an enumerable
/// state space: every state the observation is plausible in, weighted
/// by that plausibility.
pub fn by_enumeration<P: Pomdp>(model: &P, action: Action, obs: Obs) -> Vec<Particle<P::State>> {
    let Some(states) = model.enumerate() else {
        return vec![];
    };
    states
        .into_iter()
        .map(|state| {
            let prob = model.obs_probability(obs, &state, action);
            (state, prob)
        })
        .filter(|(_, prob)| *prob > WEIGHT_EPSILON)
        .enumerate()
        .map(|(i, (state, prob))| Particle::new(state, prob, i))
        .collect()
}

/// Simulate one candidate through history[hstart..] with fresh noise,
/// multiplying in the likelihood of each recorded observation. None on
/// early termination or a weight that dies along the way.
fn replay<P: Pomdp>(
    model: &P,
    mut state: P::State,
    mut weight: Weight,
    history: &History,
    hstart: usize,
    rng: &mut SmallRng,
) -> Option<(P::State, Weight)> {
    for i in hstart..history.len() {
        let action = history.action(i);
        let outcome = model.step(&mut state, rng.random::<f64>(), action);
        if outcome.terminal && i + 1 < history.len() {
            return None;
        }
        weight *= model.obs_probability(history.observation(i), &state, action);
        if weight <= WEIGHT_EPSILON {
            return None;
        }
    }
    Some((state, weight))
}
