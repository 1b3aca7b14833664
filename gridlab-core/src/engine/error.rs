use thiserror::Error;

/// Errors that abort a backtest run before or during processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("shape mismatch: {bars} bars but {signals} signals")]
    ShapeMismatch { bars: usize, signals: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
