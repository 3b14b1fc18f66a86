use crate::Reward;
use crate::config::Config;
use crate::errors::Result;
use crate::model::Pomdp;
use crate::planner::Planner;
use crate::random::seeds::Seeds;
use rand::Rng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// Drives the real (simulated) world against the planner: one hidden
/// state per round, `sim_len` decisions, reward bookkeeping on the way.
/// World randomness comes from its own seed domain, so planning effort
/// never perturbs what actually happens.
pub struct Evaluator<P: Pomdp> {
    model: Arc<P>,
    planner: Planner<P>,
    world: SmallRng,
    config: Config,
}

/// One episode's outcome.
#[derive(Debug, Clone, Copy)]
pub struct Round {
    pub discounted: Reward,
    pub undiscounted: Reward,
    pub steps: usize,
}

/// All episodes' outcomes, with the summary statistics the original
/// evaluation loop reports.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub rounds: Vec<Round>,
}

impl Summary {
    pub fn average_discounted(&self) -> Reward {
        average(self.rounds.iter().map(|r| r.discounted))
    }

    pub fn stderr_discounted(&self) -> Reward {
        stderr(self.rounds.iter().map(|r| r.discounted))
    }

    pub fn average_undiscounted(&self) -> Reward {
        average(self.rounds.iter().map(|r| r.undiscounted))
    }

    pub fn stderr_undiscounted(&self) -> Reward {
        stderr(self.rounds.iter().map(|r| r.undiscounted))
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Completed {} run(s).", self.rounds.len())?;
        writeln!(
            f,
            "Average total discounted reward (stderr) = {:.6} ({:.6})",
            self.average_discounted(),
            self.stderr_discounted()
        )?;
        write!(
            f,
            "Average total undiscounted reward (stderr) = {:.6} ({:.6})",
            self.average_undiscounted(),
            self.stderr_undiscounted()
        )
    }
}

impl<P: Pomdp> Evaluator<P> {
    pub fn new(model: Arc<P>, config: Config) -> Result<Self> {
        let seeds = Seeds::new(config.root_seed);
        let planner = Planner::new(model.clone(), config.clone())?;
        Ok(Self {
            world: seeds.world(),
            model,
            planner,
            config,
        })
    }

    pub fn planner(&self) -> &Planner<P> {
        &self.planner
    }

    pub fn run(&mut self, rounds: usize) -> Result<Summary> {
        let mut summary = Summary::default();
        for round in 0..rounds {
            log::info!("######## round {} ########", round);
            let outcome = self.round()?;
            log::info!(
                "round {} finished in {} steps, discounted {:.4}, undiscounted {:.4}",
                round,
                outcome.steps,
                outcome.discounted,
                outcome.undiscounted,
            );
            summary.rounds.push(outcome);
        }
        Ok(summary)
    }

    fn round(&mut self) -> Result<Round> {
        let mut state = self.model.start_state(&mut self.world);
        self.planner.reset(Some(&state));
        let mut discounted = 0.0;
        let mut undiscounted = 0.0;
        let mut discounting = 1.0;
        let mut steps = 0;
        for step in 0..self.config.sim_len {
            let action = self.planner.plan()?;
            let outcome = self
                .model
                .step(&mut state, self.world.random::<f64>(), action);
            log::debug!(
                "step {}: {} -> {} reward {:.2}, now {}",
                step,
                self.model.print_action(action),
                self.model.print_obs(outcome.obs),
                outcome.reward,
                self.model.print_state(&state),
            );
            discounted += discounting * outcome.reward;
            undiscounted += outcome.reward;
            discounting *= self.config.discount;
            steps += 1;
            if outcome.terminal {
                break;
            }
            self.planner.update(action, outcome.obs)?;
        }
        Ok(Round {
            discounted,
            undiscounted,
            steps,
        })
    }
}

fn average(values: impl Iterator<Item = Reward>) -> Reward {
    let values = values.collect::<Vec<Reward>>();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<Reward>() / values.len() as Reward
}

fn stderr(values: impl Iterator<Item = Reward>) -> Reward {
    let values = values.collect::<Vec<Reward>>();
    let n = values.len() as Reward;
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<Reward>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<Reward>() / (n - 1.0);
    (variance / n).sqrt()
}
