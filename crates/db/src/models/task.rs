//! Task row model.

use sqlx::FromRow;
use taskhub_core::entity::{OrganizationRef, ProjectRef, Task};
use taskhub_core::status::TaskStatus;
use taskhub_core::types::{EntityId, Timestamp};

/// A task row joined with its project and organization lineage columns.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: EntityId,
    pub project_id: EntityId,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "i16")]
    pub status: TaskStatus,
    pub assignee_email: Option<String>,
    pub due_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub project_name: String,
    pub organization_id: EntityId,
    pub organization_name: String,
    pub organization_slug: String,
}

impl TaskRow {
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef {
            id: self.project_id,
            name: self.project_name.clone(),
            organization: OrganizationRef {
                id: self.organization_id,
                name: self.organization_name.clone(),
                slug: self.organization_slug.clone(),
            },
        }
    }

    /// Split into the stored entity and its lineage.
    pub fn into_parts(self) -> (Task, ProjectRef) {
        let project = self.project_ref();
        let task = Task {
            id: self.id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            status: self.status,
            assignee_email: self.assignee_email,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (task, project)
    }
}
