//! Organization row model.

use sqlx::FromRow;
use taskhub_core::entity::Organization;
use taskhub_core::types::{EntityId, Timestamp};

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            slug: row.slug,
            contact_email: row.contact_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
