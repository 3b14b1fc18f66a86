use crate::Action;
use crate::BOUND_SLACK;
use crate::Reward;
use crate::Weight;

/// An action node under a belief node: the scenario-weighted immediate
/// reward of taking its action, bounds aggregated over its observation
/// children, and the blocked flag the pruning rule sets once the node
/// can no longer influence the answer.
#[derive(Debug)]
pub struct Qnode {
    action: Action,
    step_reward: Reward,
    lower: Reward,
    upper: Reward,
    weight: Weight,
    blocked: bool,
}

impl Qnode {
    pub fn new(action: Action, step_reward: Reward, weight: Weight) -> Self {
        Self {
            action,
            step_reward,
            weight,
            lower: step_reward,
            upper: step_reward,
            blocked: false,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn step_reward(&self) -> Reward {
        self.step_reward
    }

    pub fn lower(&self) -> Reward {
        self.lower
    }

    pub fn upper(&self) -> Reward {
        self.upper
    }

    /// the action-selection value: the upper bound minus a penalty
    /// proportional to the scenario weight routed through this node
    pub fn regularized(&self, lambda: f64) -> Reward {
        self.upper - lambda * self.weight
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn set_bounds(&mut self, lower: Reward, upper: Reward) {
        debug_assert!(
            lower <= upper + BOUND_SLACK,
            "action node bounds inverted: {} > {}",
            lower,
            upper
        );
        self.lower = lower;
        self.upper = upper;
    }
}
