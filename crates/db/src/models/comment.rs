//! Task comment row model.

use sqlx::FromRow;
use taskhub_core::entity::{Comment, CommentView, OrganizationRef, ProjectRef, TaskRef};
use taskhub_core::types::{EntityId, Timestamp};

/// A `task_comments` row joined with the full task lineage.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: EntityId,
    pub task_id: EntityId,
    pub content: String,
    pub author_email: String,
    pub posted_at: Timestamp,
    pub task_title: String,
    pub project_id: EntityId,
    pub project_name: String,
    pub organization_id: EntityId,
    pub organization_name: String,
    pub organization_slug: String,
}

impl CommentRow {
    pub fn comment(&self) -> Comment {
        Comment {
            id: self.id,
            task_id: self.task_id,
            content: self.content.clone(),
            author_email: self.author_email.clone(),
            timestamp: self.posted_at,
        }
    }
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        let comment = row.comment();
        CommentView {
            comment,
            task: TaskRef {
                id: row.task_id,
                title: row.task_title,
                project: ProjectRef {
                    id: row.project_id,
                    name: row.project_name,
                    organization: OrganizationRef {
                        id: row.organization_id,
                        name: row.organization_name,
                        slug: row.organization_slug,
                    },
                },
            },
        }
    }
}
