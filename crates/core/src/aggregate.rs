//! Aggregate engine: derived fields computed from live child collections.
//!
//! Every function here is pure. Callers pass the authoritative child
//! collection and the clock reading; nothing is cached, so an aggregate can
//! never outlive the children it was computed from. Child order is
//! irrelevant to every result.

use serde::{Deserialize, Serialize};

use crate::entity::{Comment, Organization, OrganizationView, Project, Task};
use crate::status::{ProjectStatus, TaskStatus};
use crate::types::{Date, Timestamp};

// ---------------------------------------------------------------------------
// Aggregate records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationAggregate {
    pub project_count: u32,
    pub active_project_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAggregate {
    pub task_count: u32,
    pub completed_task_count: u32,
    /// Integer percentage in `0..=100`.
    pub completion_rate: u8,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAggregate {
    pub comment_count: u32,
    pub is_overdue: bool,
}

/// Tenant-wide statistics returned by `organizationStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStats {
    pub total_projects: u32,
    pub active_projects: u32,
    pub completed_projects: u32,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub completion_rate: u8,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Completion percentage, rounded half up to the nearest integer.
///
/// Computed in integers on the exact rational `100 * completed / total`, so
/// `1/3 -> 33`, `2/3 -> 67`, `1/8 -> 13` (12.5 rounds up). Returns 0 when
/// `total` is 0. `completed` is clamped to `total`.
pub fn completion_rate(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    let rate = (200 * completed + total) / (2 * total);
    // rate <= 100 because completed <= total.
    rate as u8
}

/// A project is overdue when its due date has passed, it is not in a
/// terminal status, and it has at least one task.
pub fn project_is_overdue(
    status: ProjectStatus,
    due_date: Option<Date>,
    task_count: u32,
    today: Date,
) -> bool {
    if task_count == 0 || status.is_terminal() {
        return false;
    }
    matches!(due_date, Some(due) if due < today)
}

/// A task is overdue when its due timestamp has passed and it is not done.
pub fn task_is_overdue(status: TaskStatus, due_date: Option<Timestamp>, now: Timestamp) -> bool {
    if status.is_terminal() {
        return false;
    }
    matches!(due_date, Some(due) if due < now)
}

// ---------------------------------------------------------------------------
// Per-parent computations
// ---------------------------------------------------------------------------

pub fn organization_aggregate(projects: &[Project]) -> OrganizationAggregate {
    OrganizationAggregate {
        project_count: count(projects.iter()),
        active_project_count: count(
            projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active),
        ),
    }
}

pub fn project_aggregate(project: &Project, tasks: &[Task], today: Date) -> ProjectAggregate {
    let task_count = count(tasks.iter());
    let completed_task_count = count(tasks.iter().filter(|t| t.status == TaskStatus::Done));
    ProjectAggregate {
        task_count,
        completed_task_count,
        completion_rate: completion_rate(completed_task_count, task_count),
        is_overdue: project_is_overdue(project.status, project.due_date, task_count, today),
    }
}

pub fn task_aggregate(task: &Task, comments: &[Comment], now: Timestamp) -> TaskAggregate {
    TaskAggregate {
        comment_count: count(comments.iter()),
        is_overdue: task_is_overdue(task.status, task.due_date, now),
    }
}

/// Stats over a tenant's projects and every task of those projects.
pub fn organization_stats(projects: &[Project], tasks: &[Task]) -> OrganizationStats {
    let total_tasks = count(tasks.iter());
    let completed_tasks = count(tasks.iter().filter(|t| t.status == TaskStatus::Done));
    OrganizationStats {
        total_projects: count(projects.iter()),
        active_projects: count(
            projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active),
        ),
        completed_projects: count(
            projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed),
        ),
        total_tasks,
        completed_tasks,
        completion_rate: completion_rate(completed_tasks, total_tasks),
    }
}

/// Convenience: build an [`OrganizationView`] from an organization and its projects.
pub fn organization_view(organization: Organization, projects: &[Project]) -> OrganizationView {
    OrganizationView {
        aggregate: organization_aggregate(projects),
        organization,
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
