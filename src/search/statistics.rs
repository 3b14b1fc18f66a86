use crate::Reward;
use std::time::Duration;

/// What one decision's search did, for the curious log reader.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub trials: usize,
    pub expansions: usize,
    pub deepest: usize,
    pub initial_lower: Reward,
    pub initial_upper: Reward,
    pub final_lower: Reward,
    pub final_upper: Reward,
    pub elapsed: Duration,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} trials, {} expansions, depth {}, bounds [{:.4}, {:.4}] -> [{:.4}, {:.4}] in {:?}",
            self.trials,
            self.expansions,
            self.deepest,
            self.initial_lower,
            self.initial_upper,
            self.final_lower,
            self.final_upper,
            self.elapsed,
        )
    }
}
