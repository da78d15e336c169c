//! Handlers for projects, both tenant-scoped and by bare ID.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use taskhub_core::entity::ProjectView;
use taskhub_core::types::EntityId;
use taskhub_core::validation::CreateProject;
use taskhub_core::wire::Page;
use taskhub_db::repositories::ProjectRepo;
use taskhub_db::{resolver, views};

use crate::error::AppResult;
use crate::extract::Payload;
use crate::response::{validated, DataResponse, Mutation};
use crate::state::AppState;

/// GET /api/v1/organizations/{slug}/projects
pub async fn list_by_organization(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(page): Query<Page>,
) -> AppResult<Json<DataResponse<Vec<ProjectView>>>> {
    let organization = resolver::resolve_organization(&state.pool, &slug).await?;
    let rows = ProjectRepo::list_by_organization(&state.pool, organization.id, &page).await?;
    let data = views::project_views(&state.pool, rows, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/organizations/{slug}/projects/{project_id}
pub async fn get_scoped(
    State(state): State<AppState>,
    Path((slug, project_id)): Path<(String, EntityId)>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let row = resolver::resolve_project(&state.pool, &slug, project_id).await?;
    let data = views::project_view(&state.pool, row, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/projects/{project_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(project_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let row = resolver::find_project(&state.pool, project_id).await?;
    let data = views::project_view(&state.pool, row, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/organizations/{slug}/projects
pub async fn create(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    input: Payload<CreateProject>,
) -> AppResult<Mutation<ProjectView>> {
    Mutation::settle(StatusCode::CREATED, create_project(&state, &slug, input).await)
}

async fn create_project(
    state: &AppState,
    slug: &str,
    input: Payload<CreateProject>,
) -> AppResult<ProjectView> {
    let input = validated(input.into_inner()?.validate())?;
    let organization = resolver::resolve_organization(&state.pool, slug).await?;
    let row = ProjectRepo::create(&state.pool, organization.id, &input).await?;
    tracing::info!(project_id = %row.id, slug = %slug, "Project created");
    Ok(views::project_view(&state.pool, row, Utc::now().date_naive()).await?)
}
