//! Client error types

use cn_shared::ErrorResponse;
use thiserror::Error;

/// Errors surfaced by the client runtime
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Refresh token storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// No session is held for a call that needs one
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Machine-readable `error` code of the server's error body, if any
    pub fn error_code(&self) -> Option<String> {
        match self {
            ClientError::Http { body, .. } => serde_json::from_str::<ErrorResponse>(body)
                .ok()
                .map(|response| response.error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_body() {
        let error = ClientError::Http {
            status: 401,
            body: r#"{"error":"invalid_session","message":"Session is no longer valid, please log in again","timestamp":"2024-01-01T00:00:00Z"}"#.to_string(),
        };
        assert!(error.is_unauthorized());
        assert_eq!(error.error_code().as_deref(), Some("invalid_session"));

        let opaque = ClientError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(opaque.error_code(), None);
        assert_eq!(ClientError::NotAuthenticated.status(), None);
    }
}
