//! Assembles API views: stored rows plus aggregates derived from their
//! live children.
//!
//! Children are always loaded in full, whatever page of parents was asked
//! for, so an aggregate never reflects a partial collection.

use std::collections::HashMap;

use sqlx::PgPool;
use taskhub_core::aggregate::{self, OrganizationStats};
use taskhub_core::entity::{
    Comment, CommentView, OrganizationView, Project, ProjectView, Task, TaskView,
};
use taskhub_core::types::{Date, EntityId, Timestamp};

use crate::models::comment::CommentRow;
use crate::models::organization::OrganizationRow;
use crate::models::project::ProjectRow;
use crate::models::task::TaskRow;
use crate::repositories::{CommentRepo, ProjectRepo, TaskRepo};

/// Attach project aggregates to each organization.
pub async fn organization_views(
    pool: &PgPool,
    rows: Vec<OrganizationRow>,
) -> Result<Vec<OrganizationView>, sqlx::Error> {
    let ids: Vec<EntityId> = rows.iter().map(|r| r.id).collect();
    let projects = ProjectRepo::list_by_organizations(pool, &ids).await?;
    let mut by_parent = group_by(projects.into_iter().map(|r| r.into_parts().0), |p| {
        p.organization_id
    });

    Ok(rows
        .into_iter()
        .map(|row| {
            let children = by_parent.remove(&row.id).unwrap_or_default();
            aggregate::organization_view(row.into(), &children)
        })
        .collect())
}

pub async fn organization_view(
    pool: &PgPool,
    row: OrganizationRow,
) -> Result<OrganizationView, sqlx::Error> {
    single(organization_views(pool, vec![row]).await?)
}

/// Attach task aggregates to each project. `today` decides overdue.
pub async fn project_views(
    pool: &PgPool,
    rows: Vec<ProjectRow>,
    today: Date,
) -> Result<Vec<ProjectView>, sqlx::Error> {
    let ids: Vec<EntityId> = rows.iter().map(|r| r.id).collect();
    let tasks = TaskRepo::list_by_projects(pool, &ids).await?;
    let mut by_parent = group_by(tasks.into_iter().map(|r| r.into_parts().0), |t| t.project_id);

    Ok(rows
        .into_iter()
        .map(|row| {
            let children = by_parent.remove(&row.id).unwrap_or_default();
            let (project, organization) = row.into_parts();
            ProjectView {
                aggregate: aggregate::project_aggregate(&project, &children, today),
                project,
                organization,
            }
        })
        .collect())
}

pub async fn project_view(
    pool: &PgPool,
    row: ProjectRow,
    today: Date,
) -> Result<ProjectView, sqlx::Error> {
    single(project_views(pool, vec![row], today).await?)
}

/// Attach comment aggregates to each task. `now` decides overdue.
pub async fn task_views(
    pool: &PgPool,
    rows: Vec<TaskRow>,
    now: Timestamp,
) -> Result<Vec<TaskView>, sqlx::Error> {
    let ids: Vec<EntityId> = rows.iter().map(|r| r.id).collect();
    let comments = CommentRepo::list_by_tasks(pool, &ids).await?;
    let mut by_parent = group_by(comments.iter().map(CommentRow::comment), |c: &Comment| {
        c.task_id
    });

    Ok(rows
        .into_iter()
        .map(|row| {
            let children = by_parent.remove(&row.id).unwrap_or_default();
            let (task, project) = row.into_parts();
            TaskView {
                aggregate: aggregate::task_aggregate(&task, &children, now),
                task,
                project,
            }
        })
        .collect())
}

pub async fn task_view(pool: &PgPool, row: TaskRow, now: Timestamp) -> Result<TaskView, sqlx::Error> {
    single(task_views(pool, vec![row], now).await?)
}

pub fn comment_views(rows: Vec<CommentRow>) -> Vec<CommentView> {
    rows.into_iter().map(CommentView::from).collect()
}

/// Tenant-wide stats over every project and task of the organization.
pub async fn organization_stats(
    pool: &PgPool,
    organization_id: EntityId,
) -> Result<OrganizationStats, sqlx::Error> {
    let projects: Vec<Project> = ProjectRepo::list_by_organizations(pool, &[organization_id])
        .await?
        .into_iter()
        .map(|r| r.into_parts().0)
        .collect();
    let tasks: Vec<Task> = TaskRepo::list_by_organization(pool, organization_id)
        .await?
        .into_iter()
        .map(|r| r.into_parts().0)
        .collect();
    Ok(aggregate::organization_stats(&projects, &tasks))
}

fn group_by<T>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> EntityId,
) -> HashMap<EntityId, Vec<T>> {
    let mut groups: HashMap<EntityId, Vec<T>> = HashMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

fn single<T>(mut views: Vec<T>) -> Result<T, sqlx::Error> {
    views.pop().ok_or(sqlx::Error::RowNotFound)
}
