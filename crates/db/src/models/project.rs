//! Project row model.

use sqlx::FromRow;
use taskhub_core::entity::{OrganizationRef, Project};
use taskhub_core::status::ProjectStatus;
use taskhub_core::types::{Date, EntityId, Timestamp};

/// A project row joined with its organization's lineage columns.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: EntityId,
    pub organization_id: EntityId,
    pub name: String,
    pub description: String,
    #[sqlx(try_from = "i16")]
    pub status: ProjectStatus,
    pub due_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub organization_name: String,
    pub organization_slug: String,
}

impl ProjectRow {
    pub fn organization_ref(&self) -> OrganizationRef {
        OrganizationRef {
            id: self.organization_id,
            name: self.organization_name.clone(),
            slug: self.organization_slug.clone(),
        }
    }

    /// Split into the stored entity and its lineage.
    pub fn into_parts(self) -> (Project, OrganizationRef) {
        let organization = self.organization_ref();
        let project = Project {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            description: self.description,
            status: self.status,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (project, organization)
    }
}
