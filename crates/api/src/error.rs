use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskhub_core::error::CoreError;
use taskhub_core::wire::ErrorBody;
use taskhub_db::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent `{error, code}` JSON
/// for queries; mutations turn expected failures into rejection envelopes
/// via [`AppError::rejection`] first.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `taskhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(core) => AppError::Core(core),
            StoreError::Database(db) => AppError::Database(db),
        }
    }
}

impl AppError {
    /// Status and messages for a failure the caller can correct.
    ///
    /// Returns `None` for server-side failures, which stay errors rather
    /// than becoming a rejected mutation.
    pub fn rejection(&self) -> Option<(StatusCode, Vec<String>)> {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } | CoreError::ScopeMismatch { .. } => {
                    Some((StatusCode::NOT_FOUND, core.messages()))
                }
                CoreError::Validation(_) => Some((StatusCode::UNPROCESSABLE_ENTITY, core.messages())),
                CoreError::Conflict(_) => Some((StatusCode::CONFLICT, core.messages())),
                CoreError::Internal(_) => None,
            },
            AppError::Database(err) => unique_violation(err)
                .map(|constraint| (StatusCode::CONFLICT, vec![conflict_message(constraint)])),
            AppError::BadRequest(msg) => Some((StatusCode::BAD_REQUEST, vec![msg.clone()])),
            AppError::InternalError(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                // Indistinguishable from NotFound on the wire; the resolver
                // has already logged the mismatch.
                CoreError::ScopeMismatch { entity, key, .. } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                CoreError::Validation(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    core.messages().join("; "),
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Name of the violated `uq_` constraint, if `err` is a unique violation.
fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        // PostgreSQL unique constraint violation: error code 23505
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => db_err
            .constraint()
            .filter(|constraint| constraint.starts_with("uq_")),
        _ => None,
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_projects_organization_name" => {
            "name: a project with this name already exists in the organization".to_string()
        }
        "uq_tasks_project_title" => {
            "title: a task with this title already exists in the project".to_string()
        }
        "uq_organizations_slug" => {
            "name: another organization claimed the same slug, retry".to_string()
        }
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if let Some(constraint) = unique_violation(err) {
        return (StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint));
    }
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
