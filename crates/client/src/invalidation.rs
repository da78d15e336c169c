//! Which cached queries a successful mutation invalidates.
//!
//! | Mutation | Invalidates |
//! |---|---|
//! | organization created | organization list |
//! | organization updated | organization list, the organization, every cached view carrying it in its lineage |
//! | project created | the organization's projects, the organization, its stats, organization list |
//! | task created | the project's tasks, the project, the organization's projects, the organization, its stats |
//! | task status updated | as task created, plus the task |
//! | comment created | the task, the project's tasks, the task's comments |
//!
//! Lineage is read from the key where the key names the organization, and
//! from the cached data otherwise; an id-keyed entry with no data yet is
//! invalidated. Every page of an affected list is invalidated. Anything
//! computed over a
//! written child's ancestors is recomputed by refetching the whole query;
//! nothing is patched in place.

use taskhub_core::entity::{CommentView, OrganizationView, ProjectView, TaskView};
use taskhub_core::types::EntityId;

use crate::query::{QueryData, QueryKey};

/// A mutation the server applied, carrying the entity it returned.
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    OrganizationCreated(&'a OrganizationView),
    OrganizationUpdated(&'a OrganizationView),
    ProjectCreated(&'a ProjectView),
    TaskCreated(&'a TaskView),
    TaskStatusUpdated(&'a TaskView),
    CommentCreated(&'a CommentView),
}

impl Change<'_> {
    /// Protocol name of the mutation, used as the stale reason.
    pub fn name(&self) -> &'static str {
        match self {
            Change::OrganizationCreated(_) => "createOrganization",
            Change::OrganizationUpdated(_) => "updateOrganization",
            Change::ProjectCreated(_) => "createProject",
            Change::TaskCreated(_) => "createTask",
            Change::TaskStatusUpdated(_) => "updateTaskStatus",
            Change::CommentCreated(_) => "createTaskComment",
        }
    }
}

/// Whether `change` could have altered the result cached under `key`.
///
/// `data` is the last known result for `key`, if any.
pub fn affects(change: &Change<'_>, key: &QueryKey, data: Option<&QueryData>) -> bool {
    match change {
        Change::OrganizationCreated(_) => matches!(key, QueryKey::Organizations { .. }),
        Change::OrganizationUpdated(org) => organization_lineage(key, data, org),
        Change::ProjectCreated(project) => {
            matches!(key, QueryKey::Organizations { .. })
                || organization_aggregates(key, &project.organization.slug)
        }
        Change::TaskCreated(task) => project_aggregates(key, task),
        Change::TaskStatusUpdated(task) => {
            project_aggregates(key, task) || is_task(key, task.task.id)
        }
        Change::CommentCreated(comment) => {
            let task_id = comment.task.id;
            is_task(key, task_id)
                || matches!(key, QueryKey::Tasks { project_id, .. } if *project_id == comment.task.project.id)
                || matches!(key, QueryKey::Comments { task_id: t, .. } if *t == task_id)
        }
    }
}

/// Everything that embeds the organization's own fields.
fn organization_lineage(
    key: &QueryKey,
    data: Option<&QueryData>,
    org: &OrganizationView,
) -> bool {
    let org = &org.organization;
    match key {
        QueryKey::Organizations { .. } => true,
        QueryKey::Organization { slug }
        | QueryKey::Projects {
            organization_slug: slug,
            ..
        }
        | QueryKey::ScopedProject {
            organization_slug: slug,
            ..
        } => *slug == org.slug,
        QueryKey::OrganizationStats { .. } => false,
        QueryKey::Project { .. }
        | QueryKey::Tasks { .. }
        | QueryKey::Task { .. }
        | QueryKey::ScopedTask { .. }
        | QueryKey::Comments { .. } => data.map_or(true, |d| d.mentions_organization(org.id)),
    }
}

/// The organization detail, its stats and its project list.
fn organization_aggregates(key: &QueryKey, organization_slug: &str) -> bool {
    match key {
        QueryKey::Organization { slug } | QueryKey::OrganizationStats { slug } => {
            slug == organization_slug
        }
        QueryKey::Projects {
            organization_slug: slug,
            ..
        } => slug == organization_slug,
        _ => false,
    }
}

/// The project's task list and detail, then everything above the project.
fn project_aggregates(key: &QueryKey, task: &TaskView) -> bool {
    let project_id = task.project.id;
    match key {
        QueryKey::Tasks { project_id: p, .. }
        | QueryKey::Project { id: p }
        | QueryKey::ScopedProject { id: p, .. } => *p == project_id,
        _ => organization_aggregates(key, task.organization_slug()),
    }
}

fn is_task(key: &QueryKey, task_id: EntityId) -> bool {
    matches!(key, QueryKey::Task { id } | QueryKey::ScopedTask { id, .. } if *id == task_id)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use taskhub_core::aggregate::{
        OrganizationAggregate, OrganizationStats, ProjectAggregate, TaskAggregate,
    };
    use taskhub_core::entity::{
        Comment, Organization, OrganizationRef, Project, ProjectRef, Task, TaskRef,
    };
    use taskhub_core::status::{ProjectStatus, TaskStatus};
    use taskhub_core::wire::Page;
    use uuid::Uuid;

    use super::*;

    const ORG: u128 = 1;
    const OTHER_ORG: u128 = 2;
    const PROJECT: u128 = 10;
    const OTHER_PROJECT: u128 = 11;
    const TASK: u128 = 100;
    const OTHER_TASK: u128 = 101;

    fn id(n: u128) -> EntityId {
        Uuid::from_u128(n)
    }

    fn org_ref() -> OrganizationRef {
        OrganizationRef {
            id: id(ORG),
            name: "Acme Corp".into(),
            slug: "acme-corp".into(),
        }
    }

    fn project_ref() -> ProjectRef {
        ProjectRef {
            id: id(PROJECT),
            name: "Apollo".into(),
            organization: org_ref(),
        }
    }

    fn org_view() -> OrganizationView {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        OrganizationView {
            organization: Organization {
                id: id(ORG),
                name: "Acme Corp".into(),
                slug: "acme-corp".into(),
                contact_email: "ops@acme.com".into(),
                created_at: at,
                updated_at: at,
            },
            aggregate: OrganizationAggregate::default(),
        }
    }

    fn project_view() -> ProjectView {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ProjectView {
            project: Project {
                id: id(PROJECT),
                organization_id: id(ORG),
                name: "Apollo".into(),
                description: String::new(),
                status: ProjectStatus::Active,
                due_date: None,
                created_at: at,
                updated_at: at,
            },
            organization: org_ref(),
            aggregate: ProjectAggregate::default(),
        }
    }

    fn task_view() -> TaskView {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TaskView {
            task: Task {
                id: id(TASK),
                project_id: id(PROJECT),
                title: "Write docs".into(),
                description: String::new(),
                status: TaskStatus::Done,
                assignee_email: None,
                due_date: None,
                created_at: at,
                updated_at: at,
            },
            project: project_ref(),
            aggregate: TaskAggregate::default(),
        }
    }

    fn comment_view() -> CommentView {
        CommentView {
            comment: Comment {
                id: id(1000),
                task_id: id(TASK),
                content: "Looks good".into(),
                author_email: "ann@acme.com".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            },
            task: TaskRef {
                id: id(TASK),
                title: "Write docs".into(),
                project: project_ref(),
            },
        }
    }

    fn paged(offset: u32) -> Page {
        Page {
            limit: Some(20),
            offset: Some(offset),
        }
    }

    /// One key of every shape, for this tenant and a neighbouring one.
    fn all_keys() -> Vec<QueryKey> {
        let mut keys = vec![
            QueryKey::Organizations { page: Page::default() },
            QueryKey::Organizations { page: paged(20) },
        ];
        for (slug, project, task) in [
            ("acme-corp", PROJECT, TASK),
            ("globex", OTHER_PROJECT, OTHER_TASK),
        ] {
            keys.extend([
                QueryKey::Organization { slug: slug.into() },
                QueryKey::OrganizationStats { slug: slug.into() },
                QueryKey::Projects {
                    organization_slug: slug.into(),
                    page: paged(0),
                },
                QueryKey::Project { id: id(project) },
                QueryKey::ScopedProject {
                    organization_slug: slug.into(),
                    id: id(project),
                },
                QueryKey::Tasks {
                    project_id: id(project),
                    page: Page::default(),
                },
                QueryKey::Task { id: id(task) },
                QueryKey::ScopedTask {
                    project_id: id(project),
                    id: id(task),
                },
                QueryKey::Comments {
                    task_id: id(task),
                    page: Page::default(),
                },
            ]);
        }
        keys
    }

    /// What the server would have returned for each key in `all_keys`.
    fn cached(key: &QueryKey) -> QueryData {
        let theirs = |n: u128| n == OTHER_PROJECT || n == OTHER_TASK;
        let lineage = |mut data: QueryData, other: bool| {
            if other {
                relabel_to_globex(&mut data);
            }
            data
        };
        match key {
            QueryKey::Organizations { .. } => QueryData::Organizations(vec![org_view()]),
            QueryKey::Organization { slug } => {
                lineage(QueryData::Organization(org_view()), slug == "globex")
            }
            QueryKey::OrganizationStats { .. } => {
                QueryData::OrganizationStats(OrganizationStats::default())
            }
            QueryKey::Projects {
                organization_slug, ..
            }
            | QueryKey::ScopedProject {
                organization_slug, ..
            } => lineage(QueryData::Project(project_view()), organization_slug == "globex"),
            QueryKey::Project { id: p } => {
                lineage(QueryData::Project(project_view()), theirs(p.as_u128()))
            }
            QueryKey::Tasks { project_id, .. } => {
                lineage(QueryData::Tasks(vec![task_view()]), theirs(project_id.as_u128()))
            }
            QueryKey::ScopedTask { project_id, .. } => {
                lineage(QueryData::Task(task_view()), theirs(project_id.as_u128()))
            }
            QueryKey::Task { id: t } => lineage(QueryData::Task(task_view()), theirs(t.as_u128())),
            QueryKey::Comments { task_id, .. } => {
                lineage(QueryData::Comments(vec![comment_view()]), theirs(task_id.as_u128()))
            }
        }
    }

    fn globex() -> OrganizationRef {
        OrganizationRef {
            id: id(OTHER_ORG),
            name: "Globex".into(),
            slug: "globex".into(),
        }
    }

    fn relabel_to_globex(data: &mut QueryData) {
        match data {
            QueryData::Organization(org) => {
                org.organization.id = id(OTHER_ORG);
                org.organization.slug = "globex".into();
            }
            QueryData::Project(project) => project.organization = globex(),
            QueryData::Tasks(tasks) => {
                for task in tasks {
                    task.project.organization = globex();
                }
            }
            QueryData::Task(task) => task.project.organization = globex(),
            QueryData::Comments(comments) => {
                for comment in comments {
                    comment.task.project.organization = globex();
                }
            }
            _ => {}
        }
    }

    fn affected(change: Change<'_>) -> Vec<String> {
        all_keys()
            .iter()
            .filter(|key| affects(&change, key, Some(&cached(key))))
            .map(|key| format!("{key:?}"))
            .collect()
    }

    fn labels(change: Change<'_>) -> Vec<String> {
        all_keys()
            .iter()
            .filter(|key| affects(&change, key, Some(&cached(key))))
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn organization_created_only_touches_the_list() {
        let org = org_view();
        assert_eq!(
            labels(Change::OrganizationCreated(&org)),
            vec!["organizations", "organizations"]
        );
    }

    #[test]
    fn organization_updated_touches_every_view_of_its_lineage() {
        let org = org_view();
        let project = id(PROJECT);
        let task = id(TASK);
        assert_eq!(
            labels(Change::OrganizationUpdated(&org)),
            vec![
                "organizations".to_string(),
                "organizations".to_string(),
                "organization(acme-corp)".to_string(),
                "projects(acme-corp)".to_string(),
                format!("project({project})"),
                format!("project(acme-corp/{project})"),
                format!("tasks({project})"),
                format!("task({task})"),
                format!("task({project}/{task})"),
                format!("comments({task})"),
            ]
        );
    }

    #[test]
    fn organization_updated_reads_lineage_from_cached_data() {
        let org = org_view();
        let change = Change::OrganizationUpdated(&org);
        let key = QueryKey::Task { id: id(OTHER_TASK) };

        let mut theirs = QueryData::Task(task_view());
        relabel_to_globex(&mut theirs);
        assert!(!affects(&change, &key, Some(&theirs)));
        assert!(affects(&change, &key, Some(&QueryData::Task(task_view()))));
        // Nothing cached yet: the lineage is unknown.
        assert!(affects(&change, &key, None));
        assert!(!affects(&change, &key, Some(&QueryData::Tasks(Vec::new()))));
    }

    #[test]
    fn project_created_touches_organization_aggregates() {
        let project = project_view();
        assert_eq!(
            labels(Change::ProjectCreated(&project)),
            vec![
                "organizations",
                "organizations",
                "organization(acme-corp)",
                "organizationStats(acme-corp)",
                "projects(acme-corp)",
            ]
        );
    }

    #[test]
    fn task_created_touches_project_and_organization() {
        let task = task_view();
        let project = id(PROJECT);
        assert_eq!(
            labels(Change::TaskCreated(&task)),
            vec![
                "organization(acme-corp)".to_string(),
                "organizationStats(acme-corp)".to_string(),
                "projects(acme-corp)".to_string(),
                format!("project({project})"),
                format!("project(acme-corp/{project})"),
                format!("tasks({project})"),
            ]
        );
    }

    #[test]
    fn task_status_update_also_touches_the_task() {
        let task = task_view();
        let created = affected(Change::TaskCreated(&task));
        let updated = affected(Change::TaskStatusUpdated(&task));
        let extra: Vec<_> = updated.iter().filter(|k| !created.contains(k)).collect();
        assert_eq!(extra.len(), 2);
        assert!(extra.iter().all(|k| k.contains("Task {") || k.contains("ScopedTask {")));
        assert!(!updated.iter().any(|k| k.starts_with("Organizations")));
    }

    #[test]
    fn comment_created_touches_task_and_lists() {
        let comment = comment_view();
        let project = id(PROJECT);
        let task = id(TASK);
        assert_eq!(
            labels(Change::CommentCreated(&comment)),
            vec![
                format!("tasks({project})"),
                format!("task({task})"),
                format!("task({project}/{task})"),
                format!("comments({task})"),
            ]
        );
    }

    #[test]
    fn other_tenants_are_never_touched() {
        let org = org_view();
        let project = project_view();
        let task = task_view();
        let comment = comment_view();
        for change in [
            Change::OrganizationUpdated(&org),
            Change::ProjectCreated(&project),
            Change::TaskCreated(&task),
            Change::TaskStatusUpdated(&task),
            Change::CommentCreated(&comment),
        ] {
            for key in affected(change) {
                assert!(!key.contains("globex"), "{} touched {key}", change.name());
                assert!(
                    !key.contains(&format!("{:?}", id(OTHER_PROJECT))),
                    "{} touched {key}",
                    change.name()
                );
            }
        }
    }
}
