use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeSynthError {
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Problems found while loading a recorded sequence.
///
/// Every variant that refers to a single entry carries its zero-based index
/// so the offending `[token, delayMs]` pair can be located in the source.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Malformed sequence JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Empty token at entry {index}")]
    EmptyToken { index: usize },
    #[error("Unknown key name '{name}' at entry {index}")]
    UnknownToken { name: String, index: usize },
    #[error("Invalid delay {delay_ms} at entry {index} (must be finite and >= 0)")]
    InvalidDelay { delay_ms: f64, index: usize },
}

impl SequenceError {
    /// Attach an entry index to an error produced while decoding a single token.
    pub(crate) fn at(self, index: usize) -> Self {
        match self {
            SequenceError::EmptyToken { .. } => SequenceError::EmptyToken { index },
            SequenceError::UnknownToken { name, .. } => SequenceError::UnknownToken { name, index },
            SequenceError::InvalidDelay { delay_ms, .. } => SequenceError::InvalidDelay { delay_ms, index },
            other => other,
        }
    }
}
