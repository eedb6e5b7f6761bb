use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Postgres unique-violation code, returned by the table API when the same
/// passenger requests the same ride twice.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Geocoding or routing failure. Every network problem on those paths
    /// collapses into this single user-facing message.
    #[error("Could not calculate the route")]
    RouteUnavailable,

    #[error("Realtime channel error: {0}")]
    Realtime(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned by the backend's table and auth endpoints.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "error_description")]
    pub error_description: Option<String>,
    #[serde(rename = "msg")]
    pub msg: Option<String>,
}

impl ApiErrorBody {
    fn message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.msg.clone())
            .unwrap_or_else(|| "Unknown backend error".to_string())
    }
}

/// Translate a backend error body into an `AppError`, pattern-matching the
/// constraint-violation codes this client knows how to phrase for users.
pub fn from_api_error(status: reqwest::StatusCode, body: ApiErrorBody) -> AppError {
    if body.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return AppError::Conflict("You already requested this ride".to_string());
    }

    match status.as_u16() {
        401 => AppError::Unauthorized(body.message()),
        403 => AppError::Forbidden(body.message()),
        404 | 406 => AppError::NotFound(body.message()),
        409 => AppError::Conflict(body.message()),
        400 | 422 => AppError::BadRequest(body.message()),
        _ => AppError::Internal(body.message()),
    }
}
