//! Repository for the `task_comments` table.

use sqlx::PgPool;
use taskhub_core::types::{new_entity_id, EntityId};
use taskhub_core::validation::NewComment;
use taskhub_core::wire::Page;

use crate::models::comment::CommentRow;

/// Comment columns plus the full task lineage.
const COLUMNS: &str = "c.id, c.task_id, c.content, c.author_email, c.posted_at, \
    t.title AS task_title, t.project_id, p.name AS project_name, p.organization_id, \
    o.name AS organization_name, o.slug AS organization_slug";

const JOIN: &str = "JOIN tasks t ON t.id = c.task_id \
    JOIN projects p ON p.id = t.project_id \
    JOIN organizations o ON o.id = p.organization_id";

/// Provides append/read operations for task comments. Comments are
/// immutable once posted.
pub struct CommentRepo;

impl CommentRepo {
    /// Append a comment to `task_id`, returning the joined row.
    pub async fn create(
        pool: &PgPool,
        task_id: EntityId,
        input: &NewComment,
    ) -> Result<CommentRow, sqlx::Error> {
        let query = format!(
            "WITH c AS (
                INSERT INTO task_comments (id, task_id, content, author_email)
                VALUES ($1, $2, $3, $4)
                RETURNING *
             )
             SELECT {COLUMNS} FROM c {JOIN}"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(new_entity_id())
            .bind(task_id)
            .bind(&input.content)
            .bind(&input.author_email)
            .fetch_one(pool)
            .await
    }

    /// List a task's comments in posting order.
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: EntityId,
        page: &Page,
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_comments c {JOIN}
             WHERE c.task_id = $1
             ORDER BY c.posted_at, c.id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(task_id)
            .bind(page.sql_limit())
            .bind(page.sql_offset())
            .fetch_all(pool)
            .await
    }

    /// Every comment of the given tasks, unpaged. Used to derive task
    /// aggregates.
    pub async fn list_by_tasks(
        pool: &PgPool,
        task_ids: &[EntityId],
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_comments c {JOIN} WHERE c.task_id = ANY($1)");
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(task_ids)
            .fetch_all(pool)
            .await
    }
}
