use reqwest::Method;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the credential and the session could not be
    /// renewed. The session has already been cleared when this is returned.
    #[error("session expired and could not be renewed; log in again")]
    Unauthenticated,

    /// Any non-2xx response other than a recovered 401, passed through as
    /// received.
    #[error("{method} {url} failed: {status}; content-type={content_type}; body={body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        content_type: String,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("decode error for {url}: {source}; body={body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("session store error: {0}")]
    Session(#[from] std::io::Error),
}

/// Coarse classification callers use to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    /// A 401 on the request that was already retried after renewal.
    Unauthorized,
    Forbidden,
    Validation,
    Server,
    Transport,
    Other,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated => ErrorKind::Unauthenticated,
            ApiError::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
                StatusCode::FORBIDDEN => ErrorKind::Forbidden,
                s if s.is_client_error() => ErrorKind::Validation,
                s if s.is_server_error() => ErrorKind::Server,
                _ => ErrorKind::Other,
            },
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Decode { .. } | ApiError::Encode(_) | ApiError::Session(_) => {
                ErrorKind::Other
            }
        }
    }

    /// Response body of a passed-through status error.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
