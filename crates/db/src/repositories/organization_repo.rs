//! Repository for the `organizations` table.

use std::collections::HashSet;

use sqlx::PgPool;
use taskhub_core::slug::{slugify, unique_slug};
use taskhub_core::types::{new_entity_id, EntityId};
use taskhub_core::validation::{NewOrganization, OrganizationChanges};
use taskhub_core::wire::Page;

use crate::models::organization::OrganizationRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, contact_email, created_at, updated_at";

/// Provides create/read/update operations for organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Insert a new organization with a freshly derived unique slug.
    ///
    /// Slug selection and insert run in one transaction. Two concurrent
    /// creates of the same name can still race to the same candidate; the
    /// loser fails on `uq_organizations_slug` and nothing is written.
    pub async fn create(
        pool: &PgPool,
        input: &NewOrganization,
    ) -> Result<OrganizationRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let base = slugify(&input.name);
        let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM organizations WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(&base)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
        let slug = unique_slug(&input.name, |candidate| taken.contains(candidate));

        let query = format!(
            "INSERT INTO organizations (id, name, slug, contact_email)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(new_entity_id())
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.contact_email)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(slug = %row.slug, "Organization created");
        Ok(row)
    }

    /// Find an organization by its slug.
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<OrganizationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE slug = $1");
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find an organization by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: EntityId,
    ) -> Result<Option<OrganizationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List organizations ordered by name.
    pub async fn list(pool: &PgPool, page: &Page) -> Result<Vec<OrganizationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM organizations
             ORDER BY name, slug
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(page.sql_limit())
            .bind(page.sql_offset())
            .fetch_all(pool)
            .await
    }

    /// Update an organization. Only `Some` fields are applied; the slug is
    /// never touched and `updated_at` always advances.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: EntityId,
        input: &OrganizationChanges,
    ) -> Result<Option<OrganizationRow>, sqlx::Error> {
        let query = format!(
            "UPDATE organizations SET
                name = COALESCE($2, name),
                contact_email = COALESCE($3, contact_email),
                updated_at = clock_timestamp()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.contact_email)
            .fetch_optional(pool)
            .await
    }
}
