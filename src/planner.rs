use crate::Action;
use crate::Obs;
use crate::belief::belief::Belief;
use crate::bounds::lower::ScenarioLowerBound;
use crate::bounds::registry::Registry;
use crate::bounds::registry::fallback_action;
use crate::bounds::upper::ScenarioUpperBound;
use crate::config::Config;
use crate::errors::Error;
use crate::errors::Result;
use crate::model::Pomdp;
use crate::random::seeds::Seeds;
use crate::search::search::Search;
use crate::search::statistics::Statistics;
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// The online planning loop's stateful half: owns the current belief,
/// the resolved bound strategies, and the interrupt flag. Each `plan`
/// call builds a fresh determinized tree, searches it within the move
/// budget, and returns the chosen action without touching the belief;
/// `update` advances the belief once the world has answered.
pub struct Planner<P: Pomdp> {
    model: Arc<P>,
    config: Config,
    lower: Box<dyn ScenarioLowerBound<P>>,
    upper: Box<dyn ScenarioUpperBound<P>>,
    belief: Box<dyn Belief<P>>,
    seeds: Seeds,
    sampler: SmallRng,
    fallback: Action,
    interrupt: Arc<AtomicBool>,
    statistics: Option<Statistics>,
}

impl<P: Pomdp> Planner<P> {
    pub fn new(model: Arc<P>, config: Config) -> Result<Self> {
        config.validate()?;
        if model.num_actions() == 0 {
            return Err(Error::Model(String::from("model declares no actions")));
        }
        let mut registry = Registry::standard();
        model.register_bounds(&mut registry);
        let lower = registry.lower(&config.lower_bound, &model, &config)?;
        let upper = registry.upper(&config.upper_bound, &model, &config)?;
        let fallback = fallback_action(model.as_ref(), &config)?;
        let seeds = Seeds::new(config.root_seed);
        let belief = Box::new(model.clone().initial_belief(None, &seeds));
        Ok(Self {
            sampler: seeds.belief(),
            interrupt: Arc::new(AtomicBool::new(false)),
            statistics: None,
            model,
            config,
            lower,
            upper,
            belief,
            seeds,
            fallback,
        })
    }

    /// choose an action for the current belief within the move budget
    pub fn plan(&mut self) -> Result<Action> {
        if self.belief.collapsed() {
            log::warn!("belief collapsed, falling back to action {}", self.fallback);
            return Ok(self.fallback);
        }
        let particles = self
            .belief
            .sample(self.config.num_scenarios, &mut self.sampler);
        if particles.is_empty() {
            log::warn!("belief yielded no scenarios, falling back to action {}", self.fallback);
            return Ok(self.fallback);
        }
        let history = self.belief.history().clone();
        let mut search = Search::new(
            self.model.as_ref(),
            &self.config,
            self.lower.as_mut(),
            self.upper.as_ref(),
            particles,
            history,
            &self.seeds,
        )?;
        let best = search.plan(self.interrupt.as_ref())?;
        let statistics = search.statistics().clone();
        log::debug!(
            "planned {} worth {:.4}",
            self.model.print_action(best.action),
            best.value
        );
        self.statistics = Some(statistics);
        Ok(best.action)
    }

    /// advance the belief past the realized (action, observation) pair
    pub fn update(&mut self, action: Action, obs: Obs) -> Result<()> {
        self.belief.update(action, obs)
    }

    pub fn set_belief(&mut self, belief: Box<dyn Belief<P>>) {
        self.belief = belief;
    }

    pub fn belief(&self) -> &dyn Belief<P> {
        self.belief.as_ref()
    }

    /// replace the belief with a fresh initial one, optionally
    /// conditioned on a known start state
    pub fn reset(&mut self, start: Option<&P::State>) {
        self.belief = Box::new(self.model.clone().initial_belief(start, &self.seeds));
    }

    /// a handle other threads may set to end the current decision early
    pub fn interrupter(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &Arc<P> {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Probability;
    use crate::Reward;
    use crate::belief::belief::ParticleBelief;
    use crate::belief::particle::Particle;
    use crate::model::Outcome;
    use crate::model::ValuedAction;
    use crate::models::toys::Bandit;
    use std::sync::atomic::Ordering;

    /// hears nothing, tells nothing: the filter cannot survive a
    /// nonzero observation and no resampler can help it.
    struct Mute;

    impl Pomdp for Mute {
        type State = ();

        fn step(&self, _state: &mut Self::State, _random: f64, _action: Action) -> Outcome {
            Outcome {
                reward: 0.0,
                obs: 0,
                terminal: false,
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

    fn quick() -> Config {
        Config {
            time_per_move: 0.02,
            num_scenarios: 8,
            search_depth: 5,
            ..Config::default()
        }
    }

    #[test]
    fn unknown_bound_name_fails_at_init() {
        let config = Config {
            lower_bound: String::from("LEARNED"),
            ..quick()
        };
        let result = Planner::new(Arc::new(Bandit::new(2)), config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn invalid_config_fails_at_init() {
        let config = Config {
            num_scenarios: 0,
            ..quick()
        };
        assert!(Planner::new(Arc::new(Bandit::new(2)), config).is_err());
    }

    #[test]
    fn plan_update_plan_cycle() {
        let mut planner = Planner::new(Arc::new(Bandit::new(3)), quick()).unwrap();
        let action = planner.plan().unwrap();
        assert!(action < 3);
        planner.update(action, 0).unwrap();
        assert_eq!(planner.belief().history().len(), 1);
        let again = planner.plan().unwrap();
        assert!(again < 3);
    }

    #[test]
    fn collapsed_belief_falls_back_to_configured_action() {
        let config = Config {
            default_action: Some(String::from("1")),
            ..quick()
        };
        let mut planner = Planner::new(Arc::new(Mute), config).unwrap();
        planner.update(0, 7).unwrap();
        assert!(planner.belief().collapsed());
        assert_eq!(planner.plan().unwrap(), 1);
    }

    #[test]
    fn interrupt_still_yields_an_action() {
        let mut planner = Planner::new(Arc::new(Bandit::new(3)), quick()).unwrap();
        planner.interrupter().store(true, Ordering::Relaxed);
        let action = planner.plan().unwrap();
        assert!(action < 3);
    }
}
