//! Tiger evaluation binary.
//!
//! Wires command-line flags into a planner configuration, runs the
//! evaluator for the requested number of episodes, and prints the
//! reward summary.

use anyhow::Result;
use clap::Parser;
use despot::config::Config;
use despot::evaluator::Evaluator;
use despot::models::tiger::Tiger;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "tiger", about = "anytime online POMDP planning on the tiger problem")]
struct Args {
    /// maximum search depth
    #[arg(long, default_value_t = 90)]
    depth: usize,

    /// discount factor
    #[arg(long, default_value_t = 0.95)]
    discount: f64,

    /// root seed, derived from the wall clock when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// seconds of search per move
    #[arg(long, default_value_t = 1.0)]
    timeout: f64,

    /// scenarios sampled per decision
    #[arg(long, default_value_t = 500)]
    particles: usize,

    /// regularization constant
    #[arg(long, default_value_t = 0.0)]
    prune: f64,

    /// target gap ratio
    #[arg(long, default_value_t = 0.95)]
    xi: f64,

    /// steps per episode
    #[arg(long, default_value_t = 90)]
    simlen: usize,

    /// rollout truncation depth
    #[arg(long = "max-policy-simlen", default_value_t = 90)]
    max_policy_sim_len: usize,

    /// fallback action index
    #[arg(long)]
    default_action: Option<String>,

    /// probability a listen mishears
    #[arg(long, default_value_t = 0.15)]
    noise: f64,

    /// lower bound strategy name
    #[arg(long, default_value = "DEFAULT")]
    lower: String,

    /// upper bound strategy name
    #[arg(long, default_value = "DEFAULT")]
    upper: String,

    /// episodes to run
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// keep the terminal quiet
    #[arg(long)]
    silence: bool,
}

/// terminal + file logging
fn init(silence: bool) {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let level = if silence {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    let term = simplelog::TermLogger::new(
        level,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init(args.silence);
    let config = Config {
        search_depth: args.depth,
        discount: args.discount,
        root_seed: args.seed.unwrap_or_else(Config::clock_seed),
        time_per_move: args.timeout,
        num_scenarios: args.particles,
        pruning_constant: args.prune,
        xi: args.xi,
        sim_len: args.simlen,
        max_policy_sim_len: args.max_policy_sim_len,
        default_action: args.default_action,
        noise: args.noise,
        silence: args.silence,
        lower_bound: args.lower,
        upper_bound: args.upper,
    };
    log::info!("Model = tiger");
    for line in config.to_string().lines() {
        log::info!("{}", line);
    }
    let model = Arc::new(Tiger::new(config.noise));
    let mut evaluator = Evaluator::new(model, config)?;
    let summary = evaluator.run(args.runs)?;
    println!("{}", summary);
    Ok(())
}
