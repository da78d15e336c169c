//! Route definitions for the `/organizations` resource.
//!
//! Also nests the tenant-scoped project routes under
//! `/organizations/{slug}/projects`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{organization, project};
use crate::state::AppState;

/// Routes mounted at `/organizations`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{slug}                            -> get_by_slug
/// PUT    /{slug}                            -> update (segment is the organization id)
/// GET    /{slug}/stats                      -> stats
///
/// GET    /{slug}/projects                   -> list_by_organization
/// POST   /{slug}/projects                   -> create
/// GET    /{slug}/projects/{project_id}      -> get_scoped
/// ```
pub fn router() -> Router<AppState> {
    let project_routes = Router::new()
        .route(
            "/",
            get(project::list_by_organization).post(project::create),
        )
        .route("/{project_id}", get(project::get_scoped));

    Router::new()
        .route("/", get(organization::list).post(organization::create))
        .route(
            "/{slug}",
            get(organization::get_by_slug).put(organization::update),
        )
        .route("/{slug}/stats", get(organization::stats))
        .nest("/{slug}/projects", project_routes)
}
