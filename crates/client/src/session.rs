//! One logical client session: cached reads plus mutations that keep the
//! cache consistent.
//!
//! A mutation is sent first; only once the server reports it applied does
//! the session invalidate the affected queries (see [`invalidation`]) and,
//! with eager refetch on, reload them. Rejected mutations and transport
//! failures leave the cache untouched.

use std::sync::Arc;

use futures::future::join_all;
use taskhub_core::aggregate::OrganizationStats;
use taskhub_core::entity::{CommentView, OrganizationView, ProjectView, TaskView};
use taskhub_core::status::TaskStatus;
use taskhub_core::types::EntityId;
use taskhub_core::validation::{
    CreateComment, CreateOrganization, CreateProject, CreateTask, UpdateOrganization,
};
use taskhub_core::wire::Page;

use crate::cache::{FetchCommit, QueryCache, QueryState, QuerySubscription, Snapshot, StaleReason};
use crate::error::ClientError;
use crate::invalidation::{self, Change};
use crate::query::{self, QueryData, QueryKey};
use crate::remote::{MutationOutcome, RemoteStore};

pub struct Session<R: ?Sized> {
    remote: Arc<R>,
    cache: Arc<QueryCache>,
    eager_refetch: bool,
}

impl<R: ?Sized> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            cache: Arc::clone(&self.cache),
            eager_refetch: self.eager_refetch,
        }
    }
}

impl<R: RemoteStore + ?Sized> Session<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            cache: Arc::new(QueryCache::new()),
            eager_refetch: true,
        }
    }

    /// When off, invalidated queries stay stale until the next read.
    pub fn with_eager_refetch(mut self, eager: bool) -> Self {
        self.eager_refetch = eager;
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Register an observer for `key`.
    pub fn watch(&self, key: QueryKey) -> QuerySubscription {
        self.cache.watch(key)
    }

    /// The cached entry, without fetching.
    pub fn peek(&self, key: &QueryKey) -> Option<Snapshot> {
        self.cache.get(key)
    }

    /// Authoritative data for `key`: the cached value if fresh, otherwise a
    /// refetch.
    ///
    /// Concurrent reads of the same key share one fetch: a reader that finds
    /// a fetch in flight waits for it and gets its result or its error.
    pub async fn read(&self, key: &QueryKey) -> Result<QueryData, ClientError> {
        let mut joined = false;
        loop {
            if let Some(snapshot) = self.cache.get(key) {
                if let Some(data) = snapshot.fresh() {
                    return Ok(data.clone());
                }
                if joined && snapshot.state == QueryState::Stale(StaleReason::FetchFailed) {
                    if let Some(err) = self.cache.last_error(key) {
                        return Err(err);
                    }
                }
            }
            if let Some(settled) = self.cache.in_flight(key) {
                tracing::debug!(query = %key, "Waiting on in-flight fetch");
                settled.cancelled().await;
                joined = true;
                continue;
            }
            joined = false;
            if let Some(data) = self.refetch(key).await? {
                return Ok(data);
            }
        }
    }

    /// Fetch `key` now, superseding any fetch already in flight for it.
    ///
    /// Returns `Ok(None)` if this fetch was itself superseded before it could
    /// commit.
    pub async fn refetch(&self, key: &QueryKey) -> Result<Option<QueryData>, ClientError> {
        let ticket = self.cache.begin_fetch(key);
        let result = tokio::select! {
            biased;
            _ = ticket.cancelled() => None,
            result = query::fetch(&*self.remote, key) => Some(result),
        };
        let Some(result) = result else {
            tracing::debug!(query = %key, "Fetch abandoned");
            return Ok(None);
        };
        match self.cache.complete_fetch(ticket, result) {
            FetchCommit::Committed(data) => Ok(Some(data)),
            FetchCommit::Failed(err) => Err(err),
            FetchCommit::Superseded => Ok(None),
        }
    }

    /// Refetch every stale query concurrently. Returns the failures.
    pub async fn refresh_stale(&self) -> Vec<(QueryKey, ClientError)> {
        self.refetch_all(self.cache.stale_keys()).await
    }

    async fn refetch_all(&self, keys: Vec<QueryKey>) -> Vec<(QueryKey, ClientError)> {
        let results = join_all(keys.iter().map(|key| self.refetch(key))).await;
        keys.into_iter()
            .zip(results)
            .filter_map(|(key, result)| result.err().map(|err| (key, err)))
            .collect()
    }

    /// Invalidate what `change` affects, then optionally reload it.
    async fn settle(&self, change: Change<'_>) {
        let keys = self
            .cache
            .invalidate_where(change.name(), |key, data| invalidation::affects(&change, key, data));
        if !self.eager_refetch || keys.is_empty() {
            return;
        }
        let failures = self.refetch_all(keys).await;
        if !failures.is_empty() {
            tracing::warn!(
                mutation = change.name(),
                failed = failures.len(),
                "Some invalidated queries could not be refetched"
            );
        }
    }

    // ---- typed queries ----

    pub async fn organizations(&self, page: Page) -> Result<Vec<OrganizationView>, ClientError> {
        self.read(&QueryKey::Organizations { page })
            .await?
            .into_organizations()
    }

    pub async fn organization(&self, slug: &str) -> Result<OrganizationView, ClientError> {
        self.read(&QueryKey::Organization { slug: slug.into() })
            .await?
            .into_organization()
    }

    pub async fn organization_stats(&self, slug: &str) -> Result<OrganizationStats, ClientError> {
        self.read(&QueryKey::OrganizationStats { slug: slug.into() })
            .await?
            .into_organization_stats()
    }

    pub async fn projects(
        &self,
        organization_slug: &str,
        page: Page,
    ) -> Result<Vec<ProjectView>, ClientError> {
        let key = QueryKey::Projects {
            organization_slug: organization_slug.into(),
            page,
        };
        self.read(&key).await?.into_projects()
    }

    pub async fn project(&self, id: EntityId) -> Result<ProjectView, ClientError> {
        self.read(&QueryKey::Project { id }).await?.into_project()
    }

    /// A project, only if it belongs to `organization_slug`.
    pub async fn scoped_project(
        &self,
        organization_slug: &str,
        id: EntityId,
    ) -> Result<ProjectView, ClientError> {
        let key = QueryKey::ScopedProject {
            organization_slug: organization_slug.into(),
            id,
        };
        self.read(&key).await?.into_project()
    }

    pub async fn tasks(&self, project_id: EntityId, page: Page) -> Result<Vec<TaskView>, ClientError> {
        self.read(&QueryKey::Tasks { project_id, page })
            .await?
            .into_tasks()
    }

    pub async fn task(&self, id: EntityId) -> Result<TaskView, ClientError> {
        self.read(&QueryKey::Task { id }).await?.into_task()
    }

    /// A task, only if it belongs to `project_id`.
    pub async fn scoped_task(&self, project_id: EntityId, id: EntityId) -> Result<TaskView, ClientError> {
        self.read(&QueryKey::ScopedTask { project_id, id })
            .await?
            .into_task()
    }

    pub async fn comments(&self, task_id: EntityId, page: Page) -> Result<Vec<CommentView>, ClientError> {
        self.read(&QueryKey::Comments { task_id, page })
            .await?
            .into_comments()
    }

    // ---- mutations ----

    pub async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        let outcome = self.remote.create_organization(input).await?;
        if let MutationOutcome::Applied(org) = &outcome {
            self.settle(Change::OrganizationCreated(org)).await;
        }
        Ok(outcome)
    }

    pub async fn update_organization(
        &self,
        id: EntityId,
        input: &UpdateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        let outcome = self.remote.update_organization(id, input).await?;
        if let MutationOutcome::Applied(org) = &outcome {
            self.settle(Change::OrganizationUpdated(org)).await;
        }
        Ok(outcome)
    }

    pub async fn create_project(
        &self,
        organization_slug: &str,
        input: &CreateProject,
    ) -> Result<MutationOutcome<ProjectView>, ClientError> {
        let outcome = self.remote.create_project(organization_slug, input).await?;
        if let MutationOutcome::Applied(project) = &outcome {
            self.settle(Change::ProjectCreated(project)).await;
        }
        Ok(outcome)
    }

    pub async fn create_task(
        &self,
        project_id: EntityId,
        input: &CreateTask,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        let outcome = self.remote.create_task(project_id, input).await?;
        if let MutationOutcome::Applied(task) = &outcome {
            self.settle(Change::TaskCreated(task)).await;
        }
        Ok(outcome)
    }

    pub async fn update_task_status(
        &self,
        task_id: EntityId,
        status: TaskStatus,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        let outcome = self.remote.update_task_status(task_id, status).await?;
        if let MutationOutcome::Applied(task) = &outcome {
            self.settle(Change::TaskStatusUpdated(task)).await;
        }
        Ok(outcome)
    }

    pub async fn create_comment(
        &self,
        task_id: EntityId,
        input: &CreateComment,
    ) -> Result<MutationOutcome<CommentView>, ClientError> {
        let outcome = self.remote.create_comment(task_id, input).await?;
        if let MutationOutcome::Applied(comment) = &outcome {
            self.settle(Change::CommentCreated(comment)).await;
        }
        Ok(outcome)
    }
}
