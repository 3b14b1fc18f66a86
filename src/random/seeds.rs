use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

/// Fans the root seed out into non-interfering randomness domains:
/// world outcomes, belief sampling and updates, default-policy rollouts,
/// and one private stream per scenario id. Domains are derived by
/// hashing, so scenario i's stream does not depend on how many other
/// scenarios exist.
#[derive(Debug, Clone, Copy)]
pub struct Seeds {
    root: u64,
}

impl Seeds {
    pub fn new(root: u64) -> Self {
        Self { root }
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    /// drives the simulated environment
    pub fn world(&self) -> SmallRng {
        self.domain("world", 0)
    }

    /// drives scenario sampling out of the belief
    pub fn belief(&self) -> SmallRng {
        self.domain("belief", 0)
    }

    /// drives the particle filter's own stepping and resampling
    pub fn filter(&self) -> SmallRng {
        self.domain("filter", 0)
    }

    /// drives default-policy action choices during rollouts
    pub fn rollout(&self) -> SmallRng {
        self.domain("rollout", 0)
    }

    /// drives every stochastic outcome along scenario i's trajectories
    pub fn stream(&self, scenario: usize) -> SmallRng {
        self.domain("stream", scenario)
    }

    fn domain(&self, tag: &str, index: usize) -> SmallRng {
        let mut hasher = DefaultHasher::new();
        (self.root, tag, index).hash(&mut hasher);
        SmallRng::seed_from_u64(hasher.finish())
    }
}
