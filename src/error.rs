use thiserror::Error;

/// Errors returned by [`crate::NextBusClient`].
#[derive(Error, Debug)]
pub enum NextBusError {
    /// A required parameter was missing. Raised before any request is sent.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unsupported output format {0:?}, expected \"json\" or \"xml\"")]
    InvalidFormat(String),

    #[error("client configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("NextBus returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The body could not be decoded in the configured format.
    #[error("malformed feed response: {0}")]
    Format(String),

    /// The feed answered with its own error payload (JSON mode only).
    #[error("{message}")]
    Feed { message: String, should_retry: bool },
}

impl NextBusError {
    pub fn should_retry(&self) -> bool {
        matches!(
            self,
            NextBusError::Feed {
                should_retry: true,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, NextBusError>;
