//! The remote store seam.
//!
//! Everything the client knows about the server goes through
//! [`RemoteStore`]. Implementations must not partially apply a mutation:
//! either the whole write lands and `Applied` comes back, or nothing changes.

use async_trait::async_trait;
use taskhub_core::aggregate::OrganizationStats;
use taskhub_core::entity::{CommentView, OrganizationView, ProjectView, TaskView};
use taskhub_core::status::TaskStatus;
use taskhub_core::types::EntityId;
use taskhub_core::validation::{
    CreateComment, CreateOrganization, CreateProject, CreateTask, UpdateOrganization,
};
use taskhub_core::wire::{MutationResponse, Page};

use crate::error::ClientError;

/// Result of a mutation that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Applied(T),
    /// The server refused the write; nothing changed.
    Rejected(Vec<String>),
}

impl<T> MutationOutcome<T> {
    pub fn applied(&self) -> Option<&T> {
        match self {
            MutationOutcome::Applied(entity) => Some(entity),
            MutationOutcome::Rejected(_) => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

impl<T> TryFrom<MutationResponse<T>> for MutationOutcome<T> {
    type Error = ClientError;

    fn try_from(response: MutationResponse<T>) -> Result<Self, Self::Error> {
        match (response.success, response.entity) {
            (true, Some(entity)) => Ok(MutationOutcome::Applied(entity)),
            (true, None) => Err(ClientError::Malformed(
                "successful mutation carried no entity".to_string(),
            )),
            (false, _) => Ok(MutationOutcome::Rejected(response.errors)),
        }
    }
}

/// Typed operations against the data source.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // ---- queries ----

    async fn list_organizations(&self, page: Page) -> Result<Vec<OrganizationView>, ClientError>;

    async fn get_organization(&self, slug: &str) -> Result<OrganizationView, ClientError>;

    async fn organization_stats(&self, slug: &str) -> Result<OrganizationStats, ClientError>;

    async fn list_projects(
        &self,
        organization_slug: &str,
        page: Page,
    ) -> Result<Vec<ProjectView>, ClientError>;

    async fn get_project(&self, id: EntityId) -> Result<ProjectView, ClientError>;

    /// Fails with `NotFound` when the project lives in another organization.
    async fn get_scoped_project(
        &self,
        organization_slug: &str,
        id: EntityId,
    ) -> Result<ProjectView, ClientError>;

    async fn list_tasks(&self, project_id: EntityId, page: Page)
        -> Result<Vec<TaskView>, ClientError>;

    async fn get_task(&self, id: EntityId) -> Result<TaskView, ClientError>;

    /// Fails with `NotFound` when the task lives in another project.
    async fn get_scoped_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
    ) -> Result<TaskView, ClientError>;

    async fn list_comments(
        &self,
        task_id: EntityId,
        page: Page,
    ) -> Result<Vec<CommentView>, ClientError>;

    // ---- mutations ----

    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError>;

    async fn update_organization(
        &self,
        id: EntityId,
        input: &UpdateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError>;

    async fn create_project(
        &self,
        organization_slug: &str,
        input: &CreateProject,
    ) -> Result<MutationOutcome<ProjectView>, ClientError>;

    async fn create_task(
        &self,
        project_id: EntityId,
        input: &CreateTask,
    ) -> Result<MutationOutcome<TaskView>, ClientError>;

    async fn update_task_status(
        &self,
        task_id: EntityId,
        status: TaskStatus,
    ) -> Result<MutationOutcome<TaskView>, ClientError>;

    async fn create_comment(
        &self,
        task_id: EntityId,
        input: &CreateComment,
    ) -> Result<MutationOutcome<CommentView>, ClientError>;
}
