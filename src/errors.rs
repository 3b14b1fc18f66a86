use thiserror::Error;

/// Failure kinds the planner can surface.
///
/// Belief collapse and budget exhaustion are deliberately absent:
/// the former is recovered locally by the belief's resampling cascade
/// and the latter is the expected end of every decision.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(String),

    #[error("model violation: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, Error>;
