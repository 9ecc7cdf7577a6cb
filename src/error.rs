use thiserror::Error;

/// The single failure kind of a model call: connection refused, unknown
/// model, malformed response, or anything else the call can raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModelCallFailure {
    pub message: String,
}

impl ModelCallFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ModelCallFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for ModelCallFailure {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("malformed response: {}", err))
    }
}
