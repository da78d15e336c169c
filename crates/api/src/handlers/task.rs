//! Handlers for tasks, both project-scoped and by bare ID.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use taskhub_core::entity::TaskView;
use taskhub_core::error::CoreError;
use taskhub_core::types::EntityId;
use taskhub_core::validation::{CreateTask, UpdateTaskStatus};
use taskhub_core::wire::Page;
use taskhub_db::repositories::TaskRepo;
use taskhub_db::{resolver, views};

use crate::error::AppResult;
use crate::extract::Payload;
use crate::response::{validated, DataResponse, Mutation};
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/tasks
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<EntityId>,
    Query(page): Query<Page>,
) -> AppResult<Json<DataResponse<Vec<TaskView>>>> {
    resolver::find_project(&state.pool, project_id).await?;
    let rows = TaskRepo::list_by_project(&state.pool, project_id, &page).await?;
    let data = views::task_views(&state.pool, rows, Utc::now()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/projects/{project_id}/tasks/{task_id}
pub async fn get_scoped(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(EntityId, EntityId)>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let row = resolver::resolve_task(&state.pool, project_id, task_id).await?;
    let data = views::task_view(&state.pool, row, Utc::now()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/tasks/{task_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(task_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let row = resolver::find_task(&state.pool, task_id).await?;
    let data = views::task_view(&state.pool, row, Utc::now()).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/projects/{project_id}/tasks
pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<EntityId>,
    input: Payload<CreateTask>,
) -> AppResult<Mutation<TaskView>> {
    Mutation::settle(StatusCode::CREATED, create_task(&state, project_id, input).await)
}

async fn create_task(
    state: &AppState,
    project_id: EntityId,
    input: Payload<CreateTask>,
) -> AppResult<TaskView> {
    let input = validated(input.into_inner()?.validate())?;
    resolver::find_project(&state.pool, project_id).await?;
    let row = TaskRepo::create(&state.pool, project_id, &input).await?;
    tracing::info!(task_id = %row.id, project_id = %project_id, "Task created");
    Ok(views::task_view(&state.pool, row, Utc::now()).await?)
}

/// PUT /api/v1/tasks/{task_id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(task_id): Path<EntityId>,
    input: Payload<UpdateTaskStatus>,
) -> AppResult<Mutation<TaskView>> {
    Mutation::settle(StatusCode::OK, set_task_status(&state, task_id, input).await)
}

async fn set_task_status(
    state: &AppState,
    task_id: EntityId,
    input: Payload<UpdateTaskStatus>,
) -> AppResult<TaskView> {
    let status = validated(input.into_inner()?.validate())?;
    let row = TaskRepo::update_status(&state.pool, task_id, status)
        .await?
        .ok_or_else(|| CoreError::not_found("Task", task_id))?;
    tracing::info!(task_id = %task_id, status = %status, "Task status updated");
    Ok(views::task_view(&state.pool, row, Utc::now()).await?)
}
