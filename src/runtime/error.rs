use http::StatusCode;
use thiserror::Error;

/// A request value could not be decoded; answered with 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode {target}: {message}")]
pub struct DecodeError {
    /// What was being decoded, e.g. `query parameter 'limit'`
    pub target: String,
    pub message: String,
}

impl DecodeError {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        DecodeError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// A required value was absent
    pub fn missing(target: impl Into<String>) -> Self {
        DecodeError::new(target, "required value is missing")
    }

    /// Replace the target, keeping the message
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

/// A response value could not be written; answered with 500.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to serialize response: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl SerializationError {
    pub fn new(message: impl Into<String>) -> Self {
        SerializationError {
            message: message.into(),
        }
    }
}

/// Request-time failure of one dispatch unit.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    /// The delegate's future resolved to an error
    #[error("asynchronous result failed: {0:#}")]
    AsyncCompletion(anyhow::Error),
    /// A response was already written for this exchange
    #[error("exchange already completed")]
    AlreadyCompleted,
}

impl EndpointError {
    /// Status code answered for this failure
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            EndpointError::Decode(_) => StatusCode::BAD_REQUEST,
            EndpointError::Serialization(_)
            | EndpointError::AsyncCompletion(_)
            | EndpointError::AlreadyCompleted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
