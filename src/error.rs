use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the credential exchange against the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint rejected the client ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("malformed token response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[source] AuthError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::AuthenticationFailed(err)
    }
}

impl ApiError {
    /// Whether a caller-side retry may succeed. A failed credential exchange
    /// is surfaced immediately so the user can fix the credentials instead.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::AuthenticationFailed(_) | ApiError::InvalidBaseUrl(_)
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed(_))
    }
}
