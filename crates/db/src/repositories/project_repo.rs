//! Repository for the `projects` table.

use sqlx::PgPool;
use taskhub_core::types::{new_entity_id, EntityId};
use taskhub_core::validation::NewProject;
use taskhub_core::wire::Page;

use crate::models::project::ProjectRow;

/// Project columns plus the owning organization's lineage.
const COLUMNS: &str = "p.id, p.organization_id, p.name, p.description, \
    p.status_id AS status, p.due_date, p.created_at, p.updated_at, \
    o.name AS organization_name, o.slug AS organization_slug";

const JOIN: &str = "JOIN organizations o ON o.id = p.organization_id";

/// Provides create/read operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project under `organization_id`, returning the joined row.
    pub async fn create(
        pool: &PgPool,
        organization_id: EntityId,
        input: &NewProject,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                INSERT INTO projects (id, organization_id, name, description, status_id, due_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
             )
             SELECT {COLUMNS} FROM p {JOIN}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(new_entity_id())
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.id())
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    /// Find a project by ID regardless of tenant. Scoped lookups go through
    /// [`crate::resolver`].
    pub async fn find_by_id(pool: &PgPool, id: EntityId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects p {JOIN} WHERE p.id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an organization's projects, newest first.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: EntityId,
        page: &Page,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p {JOIN}
             WHERE p.organization_id = $1
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(organization_id)
            .bind(page.sql_limit())
            .bind(page.sql_offset())
            .fetch_all(pool)
            .await
    }

    /// Every project of the given organizations, unpaged. Used to derive
    /// organization aggregates.
    pub async fn list_by_organizations(
        pool: &PgPool,
        organization_ids: &[EntityId],
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p {JOIN}
             WHERE p.organization_id = ANY($1)"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(organization_ids)
            .fetch_all(pool)
            .await
    }
}
