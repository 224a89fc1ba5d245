use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// Network or I/O failure talking to the engine or the inference service.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The engine answered, but with a non-success status.
    #[error("Engine returned status {status}: {body}")]
    Engine { status: u16, body: String },

    /// The caller aborted the call or its deadline elapsed. Never retried.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
