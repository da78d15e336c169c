//! Handlers for task comments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use taskhub_core::entity::CommentView;
use taskhub_core::types::EntityId;
use taskhub_core::validation::CreateComment;
use taskhub_core::wire::Page;
use taskhub_db::repositories::CommentRepo;
use taskhub_db::{resolver, views};

use crate::error::AppResult;
use crate::extract::Payload;
use crate::response::{validated, DataResponse, Mutation};
use crate::state::AppState;

/// GET /api/v1/tasks/{task_id}/comments
pub async fn list_by_task(
    State(state): State<AppState>,
    Path(task_id): Path<EntityId>,
    Query(page): Query<Page>,
) -> AppResult<Json<DataResponse<Vec<CommentView>>>> {
    resolver::find_task(&state.pool, task_id).await?;
    let rows = CommentRepo::list_by_task(&state.pool, task_id, &page).await?;
    Ok(Json(DataResponse {
        data: views::comment_views(rows),
    }))
}

/// POST /api/v1/tasks/{task_id}/comments
pub async fn create(
    State(state): State<AppState>,
    Path(task_id): Path<EntityId>,
    input: Payload<CreateComment>,
) -> AppResult<Mutation<CommentView>> {
    Mutation::settle(StatusCode::CREATED, post_comment(&state, task_id, input).await)
}

async fn post_comment(
    state: &AppState,
    task_id: EntityId,
    input: Payload<CreateComment>,
) -> AppResult<CommentView> {
    let input = validated(input.into_inner()?.validate())?;
    resolver::find_task(&state.pool, task_id).await?;
    let row = CommentRepo::create(&state.pool, task_id, &input).await?;
    tracing::info!(comment_id = %row.id, task_id = %task_id, "Comment posted");
    Ok(CommentView::from(row))
}
