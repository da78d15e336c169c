//! Identity and scoping resolution.
//!
//! Every read that names a parent goes through here. An identifier that
//! exists but belongs to a different parent yields
//! [`CoreError::ScopeMismatch`], which callers report exactly like
//! `NotFound`. The mismatch is logged at WARN so cross-tenant probing stays
//! visible in the server logs.

use sqlx::PgPool;
use taskhub_core::error::CoreError;
use taskhub_core::scope::{self, Scope};
use taskhub_core::types::EntityId;

use crate::error::StoreError;
use crate::models::organization::OrganizationRow;
use crate::models::project::ProjectRow;
use crate::models::task::TaskRow;
use crate::repositories::{OrganizationRepo, ProjectRepo, TaskRepo};

/// Resolve an organization by slug.
pub async fn resolve_organization(pool: &PgPool, slug: &str) -> Result<OrganizationRow, StoreError> {
    OrganizationRepo::find_by_slug(pool, slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Organization", slug).into())
}

/// Resolve a project by ID with no tenant claim.
pub async fn find_project(pool: &PgPool, id: EntityId) -> Result<ProjectRow, StoreError> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id).into())
}

/// Resolve a task by ID with no project claim.
pub async fn find_task(pool: &PgPool, id: EntityId) -> Result<TaskRow, StoreError> {
    TaskRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Task", id).into())
}

/// Resolve `project_id` inside the organization named by `organization_slug`.
pub async fn resolve_project(
    pool: &PgPool,
    organization_slug: &str,
    project_id: EntityId,
) -> Result<ProjectRow, StoreError> {
    let organization = resolve_organization(pool, organization_slug).await?;
    let project = find_project(pool, project_id).await?;
    let parent = project.organization_id;
    let claimed = Scope::Organization {
        id: organization.id,
        slug: &organization.slug,
    };
    scope::within(project, "Project", project_id, parent, claimed)
        .inspect_err(log_mismatch)
        .map_err(StoreError::from)
}

/// Resolve `task_id` inside the project `project_id`.
pub async fn resolve_task(
    pool: &PgPool,
    project_id: EntityId,
    task_id: EntityId,
) -> Result<TaskRow, StoreError> {
    // The claimed parent must exist on its own; a missing project is a
    // NotFound for the project, not a mismatch for the task.
    find_project(pool, project_id).await?;
    let task = find_task(pool, task_id).await?;
    let parent = task.project_id;
    scope::within(task, "Task", task_id, parent, Scope::Project { id: project_id })
        .inspect_err(log_mismatch)
        .map_err(StoreError::from)
}

fn log_mismatch(err: &CoreError) {
    if let CoreError::ScopeMismatch { entity, key, scope } = err {
        tracing::warn!(entity = %entity, key = %key, scope = %scope, "Scope mismatch on lookup");
    }
}
