use thiserror::Error;

/// Everything that can go wrong talking to the API.
///
/// `Api` carries the server's `{error}` message verbatim; the other
/// variants are transport and decoding failures on this side of the wire.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// HTTP status of an API-level failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing in a form.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Other(message) => message.clone(),
            _ => "Request failed".to_string(),
        }
    }
}

/// Cloneable snapshot of a failure, kept so callers that lost the refresh
/// race can observe the same outcome as the caller that performed it.
#[derive(Debug, Clone)]
pub(crate) struct SharedFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl SharedFailure {
    pub fn of(err: &ClientError) -> Self {
        Self {
            status: err.status(),
            message: err.user_message(),
        }
    }
}

impl From<SharedFailure> for ClientError {
    fn from(failure: SharedFailure) -> Self {
        match failure.status {
            Some(status) => ClientError::Api {
                status,
                message: failure.message,
            },
            None => ClientError::Other(failure.message),
        }
    }
}
