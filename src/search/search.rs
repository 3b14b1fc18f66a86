use crate::GAP_TOLERANCE;
use crate::Obs;
use crate::Reward;
use crate::belief::particle::Particle;
use crate::bounds::lower::ScenarioLowerBound;
use crate::bounds::upper::ScenarioUpperBound;
use crate::config::Config;
use crate::errors::Error;
use crate::errors::Result;
use crate::history::History;
use crate::model::Pomdp;
use crate::model::ValuedAction;
use crate::random::seeds::Seeds;
use crate::random::streams::Streams;
use crate::search::statistics::Statistics;
use crate::tree::qnode::Qnode;
use crate::tree::tree::Data;
use crate::tree::tree::Tree;
use crate::tree::vnode::Vnode;
use petgraph::graph::NodeIndex;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

/// One decision's worth of anytime search: a determinized sparse tree
/// grown trial by trial until the wall clock or the root gap gives out.
///
/// A trial descends from the root along the action with the best
/// regularized upper bound and the observation child with the most
/// excess uncertainty, expands the leaf it lands on, and backs the
/// refreshed bounds up the path. The model is invoked at most once per
/// (node, scenario): stepped outcomes live on in the children they
/// created, so revisits replay rather than resimulate.
pub struct Search<'a, P: Pomdp> {
    model: &'a P,
    config: &'a Config,
    lower: &'a mut dyn ScenarioLowerBound<P>,
    upper: &'a dyn ScenarioUpperBound<P>,
    tree: Tree<P::State>,
    streams: Streams,
    history: History,
    statistics: Statistics,
}

impl<'a, P: Pomdp> Search<'a, P> {
    pub fn new(
        model: &'a P,
        config: &'a Config,
        lower: &'a mut dyn ScenarioLowerBound<P>,
        upper: &'a dyn ScenarioUpperBound<P>,
        particles: Vec<Particle<P::State>>,
        history: History,
        seeds: &Seeds,
    ) -> Result<Self> {
        if particles.is_empty() {
            return Err(Error::Model(String::from(
                "cannot search from an empty scenario set",
            )));
        }
        let scenarios = config.num_scenarios.max(particles.len());
        let mut streams = Streams::new(seeds, scenarios, config.search_depth);
        let mut root = Vnode::new(particles, 0);
        let default = lower.value(model, root.particles(), &mut streams, &history);
        let bound = upper.value(model, root.particles(), &streams, &history);
        root.init(default, bound);
        let statistics = Statistics {
            initial_lower: root.lower(),
            initial_upper: root.upper(),
            ..Statistics::default()
        };
        Ok(Self {
            tree: Tree::new(root),
            model,
            config,
            lower,
            upper,
            streams,
            history,
            statistics,
        })
    }

    /// run trials until the budget, the root gap, or the interrupt flag
    /// ends the decision, then commit to the best known root action.
    pub fn plan(&mut self, interrupt: &AtomicBool) -> Result<ValuedAction> {
        let start = Instant::now();
        let budget = Duration::from_secs_f64(self.config.time_per_move);
        while start.elapsed() < budget {
            if interrupt.load(Ordering::Relaxed) {
                log::debug!("search interrupted, returning best known action");
                break;
            }
            if self.root_gap() <= GAP_TOLERANCE {
                break;
            }
            if self.tree.vnode(self.tree.root()).pruned() {
                break;
            }
            self.explore()?;
        }
        self.statistics.elapsed = start.elapsed();
        let root = self.tree.vnode(self.tree.root());
        self.statistics.final_lower = root.lower();
        self.statistics.final_upper = root.upper();
        log::debug!("{}", self.statistics);
        Ok(self.best_action())
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn tree(&self) -> &Tree<P::State> {
        &self.tree
    }

    pub fn root_bounds(&self) -> (Reward, Reward) {
        let root = self.tree.vnode(self.tree.root());
        (root.lower(), root.upper())
    }

    fn root_gap(&self) -> Reward {
        self.tree.vnode(self.tree.root()).gap()
    }

    /// one trial: gap-directed descent, expansion, backup.
    fn explore(&mut self) -> Result<()> {
        let root = self.tree.root();
        let epsilon = self.config.xi * self.root_gap();
        let mark = self.history.len();
        let mut path = vec![root];
        let mut cursor = root;
        loop {
            let vnode = self.tree.vnode(cursor);
            let depth = vnode.depth();
            if depth >= self.config.search_depth {
                break;
            }
            if cursor != root && vnode.gap() <= self.target(epsilon, depth) {
                break;
            }
            if vnode.pruned() {
                break;
            }
            if !vnode.expanded() {
                self.expand(cursor)?;
            }
            let Some(chosen) = self.select_action(cursor) else {
                self.tree.vnode_mut(cursor).prune();
                break;
            };
            let Some((obs, child)) = self.select_observation(chosen, epsilon) else {
                break;
            };
            let action = self.tree.qnode(chosen).action();
            self.history.record(action, obs);
            self.streams.advance();
            path.push(chosen);
            path.push(child);
            cursor = child;
        }
        self.backup(&path);
        self.history.truncate(mark);
        self.streams.seek(0);
        self.statistics.trials += 1;
        self.statistics.deepest = self.statistics.deepest.max(self.tree.vnode(cursor).depth());
        Ok(())
    }

    /// the depth-scaled gap a node must beat to stay interesting
    fn target(&self, epsilon: Reward, depth: usize) -> Reward {
        if epsilon > 0.0 {
            epsilon * self.config.discount.powi(-(depth as i32))
        } else {
            0.0
        }
    }

    /// grow every q-child of a leaf at once, stepping each scenario
    /// exactly once per action and grouping the outcomes by observation.
    /// A second call on the same node is a no-op.
    fn expand(&mut self, cursor: NodeIndex) -> Result<()> {
        if self.tree.vnode(cursor).expanded() {
            return Ok(());
        }
        let depth = self.tree.vnode(cursor).depth();
        let weight = self.tree.vnode(cursor).weight();
        let particles = self.tree.vnode(cursor).particles().to_vec();
        let discount = self.config.discount;
        for action in 0..self.model.num_actions() {
            let mut step_reward = 0.0;
            let mut partitions: BTreeMap<Obs, Vec<Particle<P::State>>> = BTreeMap::new();
            for particle in &particles {
                let mut state = particle.state.clone();
                let random = self.streams.entry(particle.scenario);
                let outcome = self.model.step(&mut state, random, action);
                if !outcome.reward.is_finite() {
                    return Err(Error::Model(format!(
                        "non-finite reward {} stepping action {}",
                        outcome.reward, action
                    )));
                }
                step_reward += particle.weight * outcome.reward;
                if !outcome.terminal {
                    partitions
                        .entry(outcome.obs)
                        .or_default()
                        .push(Particle::new(state, particle.weight, particle.scenario));
                }
            }
            let chosen = self.tree.attach_action(cursor, Qnode::new(action, step_reward, weight));
            let mut lower = step_reward;
            let mut upper = step_reward;
            let mark = self.history.len();
            self.streams.advance();
            for (obs, stepped) in partitions {
                self.history.record(action, obs);
                let mut child = Vnode::new(stepped, depth + 1);
                let default =
                    self.lower
                        .value(self.model, child.particles(), &mut self.streams, &self.history);
                let bound =
                    self.upper
                        .value(self.model, child.particles(), &self.streams, &self.history);
                child.init(default, bound);
                lower += discount * child.lower();
                upper += discount * child.upper();
                self.history.truncate(mark);
                self.tree.attach_belief(chosen, obs, child);
            }
            self.streams.regress();
            self.tree.qnode_mut(chosen).set_bounds(lower, upper);
        }
        self.tree.vnode_mut(cursor).mark_expanded();
        self.statistics.expansions += 1;
        Ok(())
    }

    /// the unblocked q-child with the best regularized upper bound,
    /// ties toward the smaller action
    fn select_action(&self, cursor: NodeIndex) -> Option<NodeIndex> {
        let lambda = self.config.pruning_constant;
        let mut best: Option<(Reward, NodeIndex)> = None;
        for (_, index) in self.tree.actions(cursor) {
            let qnode = self.tree.qnode(index);
            if qnode.blocked() {
                continue;
            }
            let score = qnode.regularized(lambda);
            if best.is_none_or(|(incumbent, _)| score > incumbent) {
                best = Some((score, index));
            }
        }
        best.map(|(_, index)| index)
    }

    /// the observation child with the largest excess uncertainty, ties
    /// toward the smaller observation; None once every child is within
    /// its depth-scaled target
    fn select_observation(&self, chosen: NodeIndex, epsilon: Reward) -> Option<(Obs, NodeIndex)> {
        let mut best: Option<(Reward, Obs, NodeIndex)> = None;
        for (obs, index) in self.tree.beliefs(chosen) {
            let child = self.tree.vnode(index);
            let excess = child.gap() - self.target(epsilon, child.depth());
            if best.is_none_or(|(incumbent, _, _)| excess > incumbent) {
                best = Some((excess, obs, index));
            }
        }
        match best {
            Some((excess, obs, index)) if excess > 0.0 => Some((obs, index)),
            _ => None,
        }
    }

    /// recompute bounds bottom-up along the trial path. The backup is
    /// exact: each node's bounds are rebuilt from its children, not
    /// merely tightened.
    fn backup(&mut self, path: &[NodeIndex]) {
        for &index in path.iter().rev() {
            match self.tree.data(index) {
                Data::Belief(_) => self.refresh_vnode(index),
                Data::Action(_) => self.refresh_qnode(index),
            }
        }
    }

    fn refresh_qnode(&mut self, index: NodeIndex) {
        let discount = self.config.discount;
        let step_reward = self.tree.qnode(index).step_reward();
        let mut lower = step_reward;
        let mut upper = step_reward;
        for (_, child) in self.tree.beliefs(index) {
            let vnode = self.tree.vnode(child);
            lower += discount * vnode.lower();
            upper += discount * vnode.upper();
        }
        self.tree.qnode_mut(index).set_bounds(lower, upper);
    }

    fn refresh_vnode(&mut self, index: NodeIndex) {
        if !self.tree.vnode(index).expanded() {
            return;
        }
        let lambda = self.config.pruning_constant;
        let children = self.tree.actions(index);
        let mut lower = self.tree.vnode(index).default().value;
        let mut upper = Reward::NEG_INFINITY;
        for (_, chosen) in &children {
            let qnode = self.tree.qnode(*chosen);
            lower = lower.max(qnode.lower());
            upper = upper.max(qnode.regularized(lambda));
        }
        let upper = upper.max(lower);
        self.tree.vnode_mut(index).set_bounds(lower, upper);
        let mut live = 0;
        for (_, chosen) in &children {
            let qnode = self.tree.qnode_mut(*chosen);
            let closed = qnode.upper() - qnode.lower() <= crate::BOUND_SLACK;
            let beaten = qnode.regularized(lambda) < lower - crate::BOUND_SLACK;
            if closed || beaten {
                qnode.block();
            } else {
                live += 1;
            }
        }
        if live == 0 {
            self.tree.vnode_mut(index).prune();
        }
    }

    /// the root action with the best lower bound; the default move wins
    /// unless some expanded action strictly beats it
    fn best_action(&self) -> ValuedAction {
        let root = self.tree.root();
        let default = self.tree.vnode(root).default();
        let mut best = ValuedAction::new(default.action, Reward::NEG_INFINITY);
        for (action, chosen) in self.tree.actions(root) {
            let lower = self.tree.qnode(chosen).lower();
            if lower > best.value {
                best = ValuedAction::new(action, lower);
            }
        }
        if default.value > best.value {
            best = default;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::belief::Belief;
    use crate::bounds::registry::Registry;
    use crate::models::toys::Absorbing;
    use crate::models::toys::Bandit;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn run<P: Pomdp>(model: &Arc<P>, config: &Config) -> (ValuedAction, (Reward, Reward), usize) {
        let registry = Registry::standard();
        let mut lower = registry.lower(&config.lower_bound, model.as_ref(), config).unwrap();
        let upper = registry.upper(&config.upper_bound, model.as_ref(), config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        let best = search.plan(&AtomicBool::new(false)).unwrap();
        (best, search.root_bounds(), search.tree().len())
    }

    fn quick(config: Config) -> Config {
        Config {
            time_per_move: 0.05,
            num_scenarios: 16,
            search_depth: 10,
            ..config
        }
    }

    #[test]
    fn absorbing_model_keeps_tree_at_root() {
        let model = Arc::new(Absorbing);
        let config = quick(Config::default());
        let (best, (lower, upper), size) = run(&model, &config);
        assert!(best.action < model.num_actions());
        assert_eq!(size, 1);
        assert_eq!(lower, 0.0);
        assert_eq!(upper, 0.0);
    }

    #[test]
    fn zero_discount_takes_best_immediate_reward() {
        let model = Arc::new(Bandit::new(4));
        let config = quick(Config {
            discount: 0.0,
            ..Config::default()
        });
        let (best, _, _) = run(&model, &config);
        assert_eq!(best.action, 3);
    }

    #[test]
    fn deterministic_observation_means_one_child_per_action() {
        let model = Arc::new(Bandit::new(3));
        let config = quick(Config {
            discount: 0.5,
            ..Config::default()
        });
        let registry = Registry::standard();
        let mut lower = registry.lower("DEFAULT", model.as_ref(), &config).unwrap();
        let upper = registry.upper("DEFAULT", model.as_ref(), &config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            &config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        search.plan(&AtomicBool::new(false)).unwrap();
        let root = search.tree().root();
        for (_, chosen) in search.tree().actions(root) {
            assert_eq!(search.tree().beliefs(chosen).len(), 1);
        }
    }

    #[test]
    fn qnode_backup_is_exact() {
        let model = Arc::new(Bandit::new(3));
        let config = quick(Config {
            discount: 0.5,
            ..Config::default()
        });
        let registry = Registry::standard();
        let mut lower = registry.lower("DEFAULT", model.as_ref(), &config).unwrap();
        let upper = registry.upper("DEFAULT", model.as_ref(), &config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            &config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        search.plan(&AtomicBool::new(false)).unwrap();
        let tree = search.tree();
        for (_, chosen) in tree.actions(tree.root()) {
            let qnode = tree.qnode(chosen);
            let mut lower = qnode.step_reward();
            let mut upper = qnode.step_reward();
            for (_, child) in tree.beliefs(chosen) {
                lower += config.discount * tree.vnode(child).lower();
                upper += config.discount * tree.vnode(child).upper();
            }
            assert!((qnode.lower() - lower).abs() < 1e-9);
            assert!((qnode.upper() - upper).abs() < 1e-9);
        }
    }

    #[test]
    fn bounds_stay_ordered_everywhere() {
        let model = Arc::new(Bandit::new(3));
        let config = quick(Config {
            discount: 0.9,
            ..Config::default()
        });
        let (best, (lower, upper), _) = run(&model, &config);
        assert!(lower <= upper + crate::BOUND_SLACK);
        assert!(best.value <= upper + crate::BOUND_SLACK);
    }

    #[test]
    fn same_seed_same_answer() {
        let model = Arc::new(Bandit::new(3));
        let config = Config {
            time_per_move: 0.05,
            num_scenarios: 4,
            search_depth: 3,
            discount: 0.9,
            ..Config::default()
        };
        let (a, bounds_a, _) = run(&model, &config);
        let (b, bounds_b, _) = run(&model, &config);
        assert_eq!(a, b);
        assert_eq!(bounds_a, bounds_b);
    }

    #[test]
    fn expansion_is_idempotent_on_tree_shape() {
        let model = Arc::new(Bandit::new(3));
        let config = quick(Config {
            discount: 0.9,
            ..Config::default()
        });
        let registry = Registry::standard();
        let mut lower = registry.lower("DEFAULT", model.as_ref(), &config).unwrap();
        let upper = registry.upper("DEFAULT", model.as_ref(), &config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            &config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        let root = search.tree.root();
        search.expand(root).unwrap();
        let grown = search.tree().len();
        search.expand(root).unwrap();
        assert_eq!(search.tree().len(), grown);
    }

    #[test]
    fn revisited_outcomes_are_replayed_not_resimulated() {
        let model = Arc::new(Bandit::new(3));
        let config = quick(Config {
            discount: 0.9,
            ..Config::default()
        });
        let registry = Registry::standard();
        let mut lower = registry.lower("DEFAULT", model.as_ref(), &config).unwrap();
        let upper = registry.upper("DEFAULT", model.as_ref(), &config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            &config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        search.explore().unwrap();
        let root = search.tree().root();
        let before = search
            .tree()
            .actions(root)
            .into_iter()
            .map(|(_, q)| search.tree().qnode(q).step_reward())
            .collect::<Vec<Reward>>();
        search.explore().unwrap();
        let after = search
            .tree()
            .actions(root)
            .into_iter()
            .map(|(_, q)| search.tree().qnode(q).step_reward())
            .collect::<Vec<Reward>>();
        assert_eq!(before, after);
    }

    #[test]
    fn lone_scenario_still_plans() {
        let model = Arc::new(Bandit::new(2));
        let config = Config {
            num_scenarios: 1,
            time_per_move: 0.05,
            search_depth: 10,
            discount: 0.9,
            ..Config::default()
        };
        let (best, _, _) = run(&model, &config);
        assert!(best.action < 2);
    }

    #[test]
    fn zero_budget_returns_the_default_move() {
        let model = Arc::new(Bandit::new(3));
        let config = Config {
            time_per_move: 0.0,
            lower_bound: String::from("TRIVIAL"),
            num_scenarios: 8,
            search_depth: 10,
            discount: 0.9,
            ..Config::default()
        };
        let registry = Registry::standard();
        let mut lower = registry.lower(&config.lower_bound, model.as_ref(), &config).unwrap();
        let upper = registry.upper(&config.upper_bound, model.as_ref(), &config).unwrap();
        let seeds = Seeds::new(config.root_seed);
        let particles = model
            .clone()
            .initial_belief(None, &seeds)
            .sample(config.num_scenarios, &mut seeds.belief());
        let mut search = Search::new(
            model.as_ref(),
            &config,
            lower.as_mut(),
            upper.as_ref(),
            particles,
            History::new(),
            &seeds,
        )
        .unwrap();
        let best = search.plan(&AtomicBool::new(false)).unwrap();
        assert_eq!(search.statistics().trials, 0);
        assert_eq!(best.action, 0);
    }
}
