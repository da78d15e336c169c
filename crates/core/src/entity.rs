//! Entity definitions shared by the server and the client.
//!
//! Plain entities carry only stored fields. The `*View` types are what
//! crosses the wire: the entity, its lineage, and the aggregate record the
//! [`aggregate`](crate::aggregate) engine derived from its live children.

use serde::{Deserialize, Serialize};

use crate::aggregate::{OrganizationAggregate, ProjectAggregate, TaskAggregate};
use crate::status::{ProjectStatus, TaskStatus};
use crate::types::{Date, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

/// A tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: EntityId,
    pub name: String,
    /// Derived from `name` at creation; never changes afterwards.
    pub slug: String,
    pub contact_email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    pub organization_id: EntityId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    /// Calendar date, transmitted as `YYYY-MM-DD`.
    pub due_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub project_id: EntityId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee_email: Option<String>,
    /// Full timestamp, transmitted as RFC 3339.
    pub due_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub task_id: EntityId,
    pub content: String,
    pub author_email: String,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Lineage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: EntityId,
    pub name: String,
    pub organization: OrganizationRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: EntityId,
    pub title: String,
    pub project: ProjectRef,
}

impl From<&Organization> for OrganizationRef {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            name: org.name.clone(),
            slug: org.slug.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    #[serde(flatten)]
    pub organization: Organization,
    #[serde(flatten)]
    pub aggregate: OrganizationAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub organization: OrganizationRef,
    #[serde(flatten)]
    pub aggregate: ProjectAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub project: ProjectRef,
    #[serde(flatten)]
    pub aggregate: TaskAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub task: TaskRef,
}

impl ProjectView {
    pub fn lineage(&self) -> ProjectRef {
        ProjectRef {
            id: self.project.id,
            name: self.project.name.clone(),
            organization: self.organization.clone(),
        }
    }
}

impl TaskView {
    pub fn organization_slug(&self) -> &str {
        &self.project.organization.slug
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn sample_project_view() -> ProjectView {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let org_id = uuid::Uuid::nil();
        ProjectView {
            project: Project {
                id: uuid::Uuid::from_u128(7),
                organization_id: org_id,
                name: "Launch".into(),
                description: String::new(),
                status: ProjectStatus::OnHold,
                due_date: NaiveDate::from_ymd_opt(2024, 6, 30),
                created_at: created,
                updated_at: created,
            },
            organization: OrganizationRef {
                id: org_id,
                name: "Acme Corp".into(),
                slug: "acme-corp".into(),
            },
            aggregate: ProjectAggregate {
                task_count: 3,
                completed_task_count: 1,
                completion_rate: 33,
                is_overdue: false,
            },
        }
    }

    #[test]
    fn project_view_flattens_entity_and_aggregate() {
        let json = serde_json::to_value(sample_project_view()).unwrap();
        assert_eq!(json["name"], "Launch");
        assert_eq!(json["status"], "ON_HOLD");
        assert_eq!(json["dueDate"], "2024-06-30");
        assert_eq!(json["organization"]["slug"], "acme-corp");
        assert_eq!(json["taskCount"], 3);
        assert_eq!(json["completionRate"], 33);
        assert_eq!(json["isOverdue"], false);
    }

    #[test]
    fn project_view_reads_back_from_wire() {
        let view = sample_project_view();
        let json = serde_json::to_string(&view).unwrap();
        let back: ProjectView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
        assert_eq!(back.lineage().organization.slug, "acme-corp");
    }

    #[test]
    fn task_due_date_is_a_timestamp_on_the_wire() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap();
        let task = Task {
            id: uuid::Uuid::from_u128(1),
            project_id: uuid::Uuid::from_u128(2),
            title: "Write docs".into(),
            description: String::new(),
            status: TaskStatus::Todo,
            assignee_email: None,
            due_date: Some(at),
            created_at: at,
            updated_at: at,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "2024-03-01T17:30:00Z");
    }
}
