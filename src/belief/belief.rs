use crate::Action;
use crate::Obs;
use crate::WEIGHT_EPSILON;
use crate::Weight;
use crate::belief::particle::Particle;
use crate::belief::resample;
use crate::errors::Error;
use crate::errors::Result;
use crate::history::History;
use crate::model::Pomdp;
use crate::random::seeds::Seeds;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// A probability distribution over hidden states, owned by the
/// evaluator and borrowed read-only by the planner during sampling.
pub trait Belief<P: Pomdp>: Send {
    /// draw `count` particles with replacement, weights proportional to
    /// stored weights; returned particles carry scenario ids 0..count
    /// and weight 1/count. Empty when the belief has collapsed.
    fn sample(&self, count: usize, rng: &mut SmallRng) -> Vec<Particle<P::State>>;

    /// advance the belief past one realized (action, observation) pair
    fn update(&mut self, action: Action, obs: Obs) -> Result<()>;

    fn history(&self) -> &History;

    /// deep, independent copy
    fn fork(&self) -> Box<dyn Belief<P>>;

    /// true once every particle died and every resampler failed
    fn collapsed(&self) -> bool;

    fn text(&self) -> String {
        String::from("belief")
    }
}

/// The workhorse particle filter.
pub struct ParticleBelief<P: Pomdp> {
    model: Arc<P>,
    particles: Vec<Particle<P::State>>,
    initial: Vec<Particle<P::State>>,
    history: History,
    rng: SmallRng,
    collapsed: bool,
}

impl<P: Pomdp> ParticleBelief<P> {
    pub fn new(model: Arc<P>, particles: Vec<Particle<P::State>>, seeds: &Seeds) -> Self {
        let mut particles = particles;
        normalize(&mut particles);
        Self {
            collapsed: particles.is_empty(),
            initial: particles.clone(),
            rng: seeds.filter(),
            history: History::new(),
            particles,
            model,
        }
    }

    pub fn particles(&self) -> &[Particle<P::State>] {
        &self.particles
    }

    pub fn model(&self) -> &Arc<P> {
        &self.model
    }
}

impl<P: Pomdp> Clone for ParticleBelief<P> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            particles: self.particles.clone(),
            initial: self.initial.clone(),
            history: self.history.clone(),
            rng: self.rng.clone(),
            collapsed: self.collapsed,
        }
    }
}

impl<P: Pomdp> Belief<P> for ParticleBelief<P> {
    fn sample(&self, count: usize, rng: &mut SmallRng) -> Vec<Particle<P::State>> {
        let weights = self.particles.iter().map(|p| p.weight).collect::<Vec<Weight>>();
        let Ok(choices) = WeightedIndex::new(weights) else {
            return vec![];
        };
        (0..count)
            .map(|scenario| {
                let pick = &self.particles[choices.sample(rng)];
                Particle::new(pick.state.clone(), 1.0 / count as Weight, scenario)
            })
            .collect()
    }

    fn update(&mut self, action: Action, obs: Obs) -> Result<()> {
        self.history.record(action, obs);
        let mut updated = Vec::new();
        for particle in &self.particles {
            let mut state = particle.state.clone();
            let outcome = self
                .model
                .step(&mut state, self.rng.random::<f64>(), action);
            let prob = self.model.obs_probability(obs, &state, action);
            if !prob.is_finite() || prob < 0.0 || prob > 1.0 {
                return Err(Error::Model(format!(
                    "observation probability {} outside [0, 1]",
                    prob
                )));
            }
            let weight = particle.weight * prob;
            if !outcome.terminal && weight > WEIGHT_EPSILON {
                updated.push(Particle::new(state, weight, particle.scenario));
            }
        }
        if updated.is_empty() {
            log::warn!(
                "particle filter died after ({}, {}), resampling",
                self.model.print_action(action),
                self.model.print_obs(obs),
            );
            let count = self.initial.len().max(1);
            updated = resample::cascade(
                self.model.as_ref(),
                &self.initial,
                &self.history,
                action,
                obs,
                count,
                &mut self.rng,
            );
        }
        normalize(&mut updated);
        if updated.is_empty() {
            self.collapsed = true;
            log::warn!("belief collapsed: every resampling strategy failed");
        }
        self.particles = updated;
        Ok(())
    }

    fn history(&self) -> &History {
        &self.history
    }

    fn fork(&self) -> Box<dyn Belief<P>> {
        Box::new(self.clone())
    }

    fn collapsed(&self) -> bool {
        self.collapsed
    }

    fn text(&self) -> String {
        let particles = self
            .particles
            .iter()
            .map(|p| format!("{:.3} @ {}", p.weight, self.model.print_state(&p.state)))
            .collect::<Vec<String>>()
            .join(", ");
        format!("[{}]", particles)
    }
}

/// Scale weights to sum to 1; a dead set is emptied instead.
pub fn normalize<S>(particles: &mut Vec<Particle<S>>) {
    let total = particles.iter().map(|p| p.weight).sum::<Weight>();
    if total > 0.0 && total.is_finite() {
        for particle in particles.iter_mut() {
            particle.weight /= total;
        }
    } else {
        particles.clear();
    }
}
