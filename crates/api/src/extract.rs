//! Request body extraction for mutation handlers.

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::{AppError, AppResult};

/// A JSON request body that never rejects the request by itself.
///
/// An unreadable body (bad JSON, wrong field types, missing content type)
/// is kept as [`AppError::BadRequest`] so the handler can answer it with the
/// mutation envelope like any other failure.
pub struct Payload<T>(AppResult<T>);

impl<T> Payload<T> {
    pub fn into_inner(self) -> AppResult<T> {
        self.0
    }
}

impl<S, T> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(value),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Unreadable request body");
                Err(AppError::BadRequest(rejection.body_text()))
            }
        };
        Ok(Self(body))
    }
}
