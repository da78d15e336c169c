//! Route definitions for the `/projects` resource.
//!
//! Also nests the project-scoped task routes under
//! `/projects/{project_id}/tasks`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{project, task};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /{project_id}                      -> get_by_id
///
/// GET    /{project_id}/tasks                -> list_by_project
/// POST   /{project_id}/tasks                -> create
/// GET    /{project_id}/tasks/{task_id}      -> get_scoped
/// ```
pub fn router() -> Router<AppState> {
    let task_routes = Router::new()
        .route("/", get(task::list_by_project).post(task::create))
        .route("/{task_id}", get(task::get_scoped));

    Router::new()
        .route("/{project_id}", get(project::get_by_id))
        .nest("/{project_id}/tasks", task_routes)
}
