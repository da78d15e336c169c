//! Query identities and their results.

use std::fmt;

use taskhub_core::aggregate::OrganizationStats;
use taskhub_core::entity::{CommentView, OrganizationView, ProjectView, TaskView};
use taskhub_core::types::EntityId;
use taskhub_core::wire::Page;

use crate::error::ClientError;
use crate::remote::RemoteStore;

/// Identity of one cached query. Two reads with equal keys share a cache
/// entry; list keys include the page, so each page is its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Organizations { page: Page },
    Organization { slug: String },
    OrganizationStats { slug: String },
    Projects { organization_slug: String, page: Page },
    Project { id: EntityId },
    ScopedProject { organization_slug: String, id: EntityId },
    Tasks { project_id: EntityId, page: Page },
    Task { id: EntityId },
    ScopedTask { project_id: EntityId, id: EntityId },
    Comments { task_id: EntityId, page: Page },
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Organizations { .. } => write!(f, "organizations"),
            QueryKey::Organization { slug } => write!(f, "organization({slug})"),
            QueryKey::OrganizationStats { slug } => write!(f, "organizationStats({slug})"),
            QueryKey::Projects {
                organization_slug, ..
            } => write!(f, "projects({organization_slug})"),
            QueryKey::Project { id } => write!(f, "project({id})"),
            QueryKey::ScopedProject {
                organization_slug,
                id,
            } => write!(f, "project({organization_slug}/{id})"),
            QueryKey::Tasks { project_id, .. } => write!(f, "tasks({project_id})"),
            QueryKey::Task { id } => write!(f, "task({id})"),
            QueryKey::ScopedTask { project_id, id } => write!(f, "task({project_id}/{id})"),
            QueryKey::Comments { task_id, .. } => write!(f, "comments({task_id})"),
        }
    }
}

/// The result of a query, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Organizations(Vec<OrganizationView>),
    Organization(OrganizationView),
    OrganizationStats(OrganizationStats),
    Projects(Vec<ProjectView>),
    Project(ProjectView),
    Tasks(Vec<TaskView>),
    Task(TaskView),
    Comments(Vec<CommentView>),
}

macro_rules! into_variant {
    ($($fn_name:ident => $variant:ident($ty:ty)),+ $(,)?) => {
        impl QueryData {
            $(
                pub fn $fn_name(self) -> Result<$ty, ClientError> {
                    match self {
                        QueryData::$variant(value) => Ok(value),
                        other => Err(ClientError::Malformed(format!(
                            concat!("expected ", stringify!($variant), " data, got {}"),
                            other.kind()
                        ))),
                    }
                }
            )+
        }
    };
}

into_variant! {
    into_organizations => Organizations(Vec<OrganizationView>),
    into_organization => Organization(OrganizationView),
    into_organization_stats => OrganizationStats(OrganizationStats),
    into_projects => Projects(Vec<ProjectView>),
    into_project => Project(ProjectView),
    into_tasks => Tasks(Vec<TaskView>),
    into_task => Task(TaskView),
    into_comments => Comments(Vec<CommentView>),
}

impl QueryData {
    /// Whether any view in this result carries organization `id` in its
    /// lineage.
    pub fn mentions_organization(&self, id: EntityId) -> bool {
        match self {
            QueryData::Organizations(orgs) => orgs.iter().any(|o| o.organization.id == id),
            QueryData::Organization(org) => org.organization.id == id,
            QueryData::OrganizationStats(_) => false,
            QueryData::Projects(projects) => projects.iter().any(|p| p.organization.id == id),
            QueryData::Project(project) => project.organization.id == id,
            QueryData::Tasks(tasks) => tasks.iter().any(|t| t.project.organization.id == id),
            QueryData::Task(task) => task.project.organization.id == id,
            QueryData::Comments(comments) => comments
                .iter()
                .any(|c| c.task.project.organization.id == id),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryData::Organizations(_) => "Organizations",
            QueryData::Organization(_) => "Organization",
            QueryData::OrganizationStats(_) => "OrganizationStats",
            QueryData::Projects(_) => "Projects",
            QueryData::Project(_) => "Project",
            QueryData::Tasks(_) => "Tasks",
            QueryData::Task(_) => "Task",
            QueryData::Comments(_) => "Comments",
        }
    }
}

/// Run the remote operation that answers `key`.
pub async fn fetch<R: RemoteStore + ?Sized>(
    remote: &R,
    key: &QueryKey,
) -> Result<QueryData, ClientError> {
    let data = match key {
        QueryKey::Organizations { page } => {
            QueryData::Organizations(remote.list_organizations(*page).await?)
        }
        QueryKey::Organization { slug } => {
            QueryData::Organization(remote.get_organization(slug).await?)
        }
        QueryKey::OrganizationStats { slug } => {
            QueryData::OrganizationStats(remote.organization_stats(slug).await?)
        }
        QueryKey::Projects {
            organization_slug,
            page,
        } => QueryData::Projects(remote.list_projects(organization_slug, *page).await?),
        QueryKey::Project { id } => QueryData::Project(remote.get_project(*id).await?),
        QueryKey::ScopedProject {
            organization_slug,
            id,
        } => QueryData::Project(remote.get_scoped_project(organization_slug, *id).await?),
        QueryKey::Tasks { project_id, page } => {
            QueryData::Tasks(remote.list_tasks(*project_id, *page).await?)
        }
        QueryKey::Task { id } => QueryData::Task(remote.get_task(*id).await?),
        QueryKey::ScopedTask { project_id, id } => {
            QueryData::Task(remote.get_scoped_task(*project_id, *id).await?)
        }
        QueryKey::Comments { task_id, page } => {
            QueryData::Comments(remote.list_comments(*task_id, *page).await?)
        }
    };
    Ok(data)
}
