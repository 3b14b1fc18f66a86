use crate::BOUND_SLACK;
use crate::Reward;
use crate::Weight;
use crate::belief::particle::Particle;
use crate::model::ValuedAction;

/// A belief node: the scenarios consistent with the path from the root,
/// bracketed by a lower and an upper bound on the node's value. The
/// default move is the fallback the node's lower-bound policy committed
/// to, and doubles as the floor the backup never sinks below.
#[derive(Debug)]
pub struct Vnode<S> {
    particles: Vec<Particle<S>>,
    depth: usize,
    lower: Reward,
    upper: Reward,
    default: ValuedAction,
    weight: Weight,
    expanded: bool,
    pruned: bool,
}

impl<S> Vnode<S> {
    pub fn new(particles: Vec<Particle<S>>, depth: usize) -> Self {
        let weight = particles.iter().map(|p| p.weight).sum::<Weight>();
        Self {
            particles,
            depth,
            weight,
            lower: 0.0,
            upper: 0.0,
            default: ValuedAction::new(0, 0.0),
            expanded: false,
            pruned: false,
        }
    }

    /// install the initial scenario bounds. A numerically inverted pair
    /// is clamped so the gap invariant holds from the start.
    pub fn init(&mut self, default: ValuedAction, upper: Reward) {
        self.default = default;
        self.lower = default.value;
        self.upper = upper.max(default.value);
    }

    pub fn particles(&self) -> &[Particle<S>] {
        &self.particles
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn lower(&self) -> Reward {
        self.lower
    }

    pub fn upper(&self) -> Reward {
        self.upper
    }

    pub fn gap(&self) -> Reward {
        self.upper - self.lower
    }

    pub fn default(&self) -> ValuedAction {
        self.default
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn mark_expanded(&mut self) {
        self.expanded = true;
    }

    pub fn pruned(&self) -> bool {
        self.pruned
    }

    pub fn prune(&mut self) {
        self.pruned = true;
    }

    pub fn set_bounds(&mut self, lower: Reward, upper: Reward) {
        debug_assert!(
            lower <= upper + BOUND_SLACK,
            "belief node bounds inverted: {} > {}",
            lower,
            upper
        );
        self.lower = lower;
        self.upper = upper;
    }
}
