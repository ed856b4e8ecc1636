use crate::http::{IntoResponse, Json, Response, StatusCode};

/// The error surface for the affordance runtime and HTTP boundary.
///
/// Each variant carries the HTTP status it maps to (section 7 of the spec):
/// `NotFound` -> 404, `NotAllowed` -> 405, `ValidationFailed` -> 422,
/// `NotObservable` -> 403, `ConflictOrUnavailable` -> 503. `Configuration`
/// and `ServerNotRunning` are raised eagerly and are never swallowed; they
/// surface as 500 if they ever reach an HTTP handler (they normally don't —
/// `Configuration` errors abort server construction before any request is
/// routed).
pub enum AppError {
    NotFound(String),
    NotAllowed(String),
    ValidationFailed(serde_json::Value),
    NotObservable(String),
    ConflictOrUnavailable(String),
    Configuration(String),
    ServerNotRunning(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotObservable(_) => StatusCode::FORBIDDEN,
            AppError::ConflictOrUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_) | AppError::ServerNotRunning(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::ValidationFailed(details) => serde_json::json!({
                "error": "Validation failed",
                "details": details,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::NotAllowed(msg) => write!(f, "not allowed: {msg}"),
            AppError::ValidationFailed(details) => write!(f, "validation failed: {details}"),
            AppError::NotObservable(msg) => write!(f, "not observable: {msg}"),
            AppError::ConflictOrUnavailable(msg) => write!(f, "unavailable: {msg}"),
            AppError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            AppError::ServerNotRunning(msg) => write!(f, "server not running: {msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for AppError {}

/// Generate `From<E> for AppError` implementations that map error types to
/// a specific `AppError` variant that takes a `String`.
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::error::AppError {
                fn from(err: $err_ty) -> Self {
                    $crate::error::AppError::$variant(err.to_string())
                }
            }
        )*
    };
}
