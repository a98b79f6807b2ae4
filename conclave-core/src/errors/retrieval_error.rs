/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval limit must be between 1 and {max}, got {requested}")]
    InvalidLimit { requested: usize, max: usize },

    #[error("no retrieval strategies requested")]
    NoStrategies,

    #[error("strategy {strategy} failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },
}
