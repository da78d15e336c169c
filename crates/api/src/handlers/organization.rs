//! Handlers for the `/organizations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use taskhub_core::aggregate::OrganizationStats;
use taskhub_core::entity::OrganizationView;
use taskhub_core::error::CoreError;
use taskhub_core::types::EntityId;
use taskhub_core::validation::{CreateOrganization, UpdateOrganization};
use taskhub_core::wire::Page;
use taskhub_db::repositories::OrganizationRepo;
use taskhub_db::{resolver, views};

use crate::error::AppResult;
use crate::extract::Payload;
use crate::response::{validated, DataResponse, Mutation};
use crate::state::AppState;

/// GET /api/v1/organizations
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<Json<DataResponse<Vec<OrganizationView>>>> {
    let rows = OrganizationRepo::list(&state.pool, &page).await?;
    let data = views::organization_views(&state.pool, rows).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/organizations/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<OrganizationView>>> {
    let row = resolver::resolve_organization(&state.pool, &slug).await?;
    let data = views::organization_view(&state.pool, row).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/organizations/{slug}/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<OrganizationStats>>> {
    let row = resolver::resolve_organization(&state.pool, &slug).await?;
    let data = views::organization_stats(&state.pool, row.id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/organizations
pub async fn create(
    State(state): State<AppState>,
    input: Payload<CreateOrganization>,
) -> AppResult<Mutation<OrganizationView>> {
    Mutation::settle(StatusCode::CREATED, create_organization(&state, input).await)
}

async fn create_organization(
    state: &AppState,
    input: Payload<CreateOrganization>,
) -> AppResult<OrganizationView> {
    let input = validated(input.into_inner()?.validate())?;
    let row = OrganizationRepo::create(&state.pool, &input).await?;
    tracing::info!(organization_id = %row.id, slug = %row.slug, "Organization created");
    Ok(views::organization_view(&state.pool, row).await?)
}

/// PUT /api/v1/organizations/{id}
///
/// Partial update of name and contact email. The slug never changes.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    input: Payload<UpdateOrganization>,
) -> AppResult<Mutation<OrganizationView>> {
    Mutation::settle(StatusCode::OK, update_organization(&state, id, input).await)
}

async fn update_organization(
    state: &AppState,
    id: EntityId,
    input: Payload<UpdateOrganization>,
) -> AppResult<OrganizationView> {
    let changes = validated(input.into_inner()?.validate())?;
    let row = OrganizationRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| CoreError::not_found("Organization", id))?;
    tracing::info!(organization_id = %id, "Organization updated");
    Ok(views::organization_view(&state.pool, row).await?)
}
