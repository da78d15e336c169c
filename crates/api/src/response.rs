//! Shared response envelope types for API handlers.
//!
//! Queries answer `{ "data": ... }`; mutations answer the uniform
//! [`MutationResponse`] envelope with a status chosen by outcome.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taskhub_core::wire::{EntityKey, MutationResponse};

use crate::error::{AppError, AppResult};

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// A settled mutation: the envelope plus the HTTP status it travels with.
#[derive(Debug)]
pub struct Mutation<T> {
    pub status: StatusCode,
    pub body: MutationResponse<T>,
}

impl<T> Mutation<T> {
    /// Turn a mutation result into a response.
    ///
    /// Success answers `status`; failures the caller can correct become a
    /// rejected envelope; anything else stays an [`AppError`].
    pub fn settle(status: StatusCode, result: AppResult<T>) -> AppResult<Self> {
        match result {
            Ok(entity) => Ok(Self {
                status,
                body: MutationResponse::applied(entity),
            }),
            Err(err) => match err.rejection() {
                Some((status, errors)) => {
                    tracing::debug!(%status, ?errors, "Mutation rejected");
                    Ok(Self {
                        status,
                        body: MutationResponse::rejected(errors),
                    })
                }
                None => Err(err),
            },
        }
    }
}

impl<T: Serialize + EntityKey> IntoResponse for Mutation<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Unwrap a validation result into the domain error.
pub fn validated<T>(
    result: Result<T, Vec<taskhub_core::validation::FieldError>>,
) -> Result<T, AppError> {
    result.map_err(|errors| AppError::Core(taskhub_core::error::CoreError::Validation(errors)))
}
