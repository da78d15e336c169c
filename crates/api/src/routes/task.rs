//! Route definitions for the `/tasks` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{comment, task};
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{task_id}                         -> get_by_id
/// PUT    /{task_id}/status                  -> update_status
/// GET    /{task_id}/comments                -> list_by_task
/// POST   /{task_id}/comments                -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{task_id}", get(task::get_by_id))
        .route("/{task_id}/status", put(task::update_status))
        .route(
            "/{task_id}/comments",
            get(comment::list_by_task).post(comment::create),
        )
}
