pub mod health;
pub mod organization;
pub mod project;
pub mod task;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /organizations                                   list, create
/// /organizations/{slug}                            get (PUT takes the id)
/// /organizations/{slug}/stats                      tenant-wide stats
/// /organizations/{slug}/projects                   list, create
/// /organizations/{slug}/projects/{project_id}      scoped get
///
/// /projects/{project_id}                           get
/// /projects/{project_id}/tasks                     list, create
/// /projects/{project_id}/tasks/{task_id}           scoped get
///
/// /tasks/{task_id}                                 get
/// /tasks/{task_id}/status                          update status (PUT)
/// /tasks/{task_id}/comments                        list, create
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/organizations", organization::router())
        .nest("/projects", project::router())
        .nest("/tasks", task::router())
}
