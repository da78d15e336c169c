//! Repository for the `tasks` table.

use sqlx::PgPool;
use taskhub_core::status::TaskStatus;
use taskhub_core::types::{new_entity_id, EntityId};
use taskhub_core::validation::NewTask;
use taskhub_core::wire::Page;

use crate::models::task::TaskRow;

/// Task columns plus the project and organization lineage.
const COLUMNS: &str = "t.id, t.project_id, t.title, t.description, \
    t.status_id AS status, t.assignee_email, t.due_date, t.created_at, t.updated_at, \
    p.name AS project_name, p.organization_id, \
    o.name AS organization_name, o.slug AS organization_slug";

const JOIN: &str = "JOIN projects p ON p.id = t.project_id \
    JOIN organizations o ON o.id = p.organization_id";

/// Provides create/read/status-update operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task under `project_id`, returning the joined row.
    pub async fn create(
        pool: &PgPool,
        project_id: EntityId,
        input: &NewTask,
    ) -> Result<TaskRow, sqlx::Error> {
        let query = format!(
            "WITH t AS (
                INSERT INTO tasks (id, project_id, title, description, status_id, assignee_email, due_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
             )
             SELECT {COLUMNS} FROM t {JOIN}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(new_entity_id())
            .bind(project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.id())
            .bind(&input.assignee_email)
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    /// Find a task by ID regardless of project.
    pub async fn find_by_id(pool: &PgPool, id: EntityId) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t {JOIN} WHERE t.id = $1");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's tasks, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: EntityId,
        page: &Page,
    ) -> Result<Vec<TaskRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t {JOIN}
             WHERE t.project_id = $1
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(project_id)
            .bind(page.sql_limit())
            .bind(page.sql_offset())
            .fetch_all(pool)
            .await
    }

    /// Every task of the given projects, unpaged. Used to derive project
    /// aggregates.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[EntityId],
    ) -> Result<Vec<TaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t {JOIN} WHERE t.project_id = ANY($1)");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }

    /// Every task across an organization's projects.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: EntityId,
    ) -> Result<Vec<TaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t {JOIN} WHERE p.organization_id = $1");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Set a task's status. Setting the current status again still counts
    /// as an update and advances `updated_at`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        pool: &PgPool,
        id: EntityId,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!(
            "WITH t AS (
                UPDATE tasks SET status_id = $2, updated_at = clock_timestamp()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM t {JOIN}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_optional(pool)
            .await
    }
}
