use thiserror::Error;

/// Errors surfaced by the API client, per the failure taxonomy the views
/// distinguish: fail-fast when no token exists, forced sign-out on 401,
/// server-supplied detail for other statuses, transport errors verbatim.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Fallback message when the error body has no detail field.
    pub fn from_status(status: u16) -> Self {
        ApiError::RequestFailed {
            status,
            message: format!("API error: {}", status),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
