use crate::Discount;
use crate::errors::Error;
use crate::errors::Result;

/// Immutable planning parameters, threaded through the planner at
/// construction. Per-decision overrides travel as call arguments,
/// never through shared mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// maximum tree depth
    pub search_depth: usize,
    /// discount factor in [0, 1]
    pub discount: Discount,
    /// seed for all derived randomness
    pub root_seed: u64,
    /// wall-clock seconds per decision
    pub time_per_move: f64,
    /// determinized particles per decision
    pub num_scenarios: usize,
    /// regularization constant applied per unit of scenario weight
    pub pruning_constant: f64,
    /// target gap ratio in [0, 1]
    pub xi: f64,
    /// steps per simulated episode
    pub sim_len: usize,
    /// rollout truncation depth for default policies
    pub max_policy_sim_len: usize,
    /// fallback action index, parsed at planner init
    pub default_action: Option<String>,
    /// model-dependent noise knob, 0 meaning "model default"
    pub noise: f64,
    /// suppress non-essential logging
    pub silence: bool,
    /// lower bound strategy name
    pub lower_bound: String,
    /// upper bound strategy name
    pub upper_bound: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_depth: 90,
            discount: 0.95,
            root_seed: 42,
            time_per_move: 1.0,
            num_scenarios: 500,
            pruning_constant: 0.0,
            xi: 0.95,
            sim_len: 90,
            max_policy_sim_len: 90,
            default_action: None,
            noise: 0.0,
            silence: false,
            lower_bound: String::from("DEFAULT"),
            upper_bound: String::from("DEFAULT"),
        }
    }
}

impl Config {
    /// the seed the binary falls back to when none is given:
    /// last nine digits of the current time in milliseconds.
    pub fn clock_seed() -> u64 {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time moves slow")
            .as_millis() as u64;
        millis % 1_000_000_000
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_scenarios == 0 {
            return Err(Error::Config(String::from("num_scenarios must be positive")));
        }
        if !(self.discount >= 0.0 && self.discount <= 1.0) {
            return Err(Error::Config(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            )));
        }
        if !(self.xi >= 0.0 && self.xi <= 1.0) {
            return Err(Error::Config(format!("xi must be in [0, 1], got {}", self.xi)));
        }
        if self.search_depth == 0 {
            return Err(Error::Config(String::from("search_depth must be positive")));
        }
        if !(self.time_per_move >= 0.0) {
            return Err(Error::Config(format!(
                "time_per_move must be non-negative, got {}",
                self.time_per_move
            )));
        }
        if !(self.pruning_constant >= 0.0) {
            return Err(Error::Config(format!(
                "pruning_constant must be non-negative, got {}",
                self.pruning_constant
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Random root seed = {}", self.root_seed)?;
        writeln!(f, "Search depth = {}", self.search_depth)?;
        writeln!(f, "Discount = {}", self.discount)?;
        writeln!(f, "Simulation steps = {}", self.sim_len)?;
        writeln!(f, "Number of scenarios = {}", self.num_scenarios)?;
        writeln!(f, "Search time per step = {}", self.time_per_move)?;
        writeln!(f, "Regularization constant = {}", self.pruning_constant)?;
        writeln!(f, "Lower bound = {}", self.lower_bound)?;
        writeln!(f, "Upper bound = {}", self.upper_bound)?;
        writeln!(f, "Policy simulation depth = {}", self.max_policy_sim_len)?;
        write!(f, "Target gap ratio = {}", self.xi)
    }
}
