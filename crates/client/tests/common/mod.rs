//! In-memory [`RemoteStore`] for session tests.
//!
//! Applies the same validation and aggregate rules as the server, counts
//! calls per operation, and can hold a `list_tasks` call open after it has
//! read its data so a test can overtake it. `list_tasks` can also be slowed
//! down to keep a fetch in flight while other readers arrive.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use taskhub_client::{ClientError, MutationOutcome, RemoteStore};
use taskhub_core::aggregate::{self, OrganizationStats};
use taskhub_core::entity::{
    Comment, CommentView, Organization, OrganizationRef, OrganizationView, Project, ProjectRef,
    ProjectView, Task, TaskRef, TaskView,
};
use taskhub_core::error::CoreError;
use taskhub_core::slug::unique_slug;
use taskhub_core::status::TaskStatus;
use taskhub_core::types::{new_entity_id, EntityId};
use taskhub_core::validation::{
    CreateComment, CreateOrganization, CreateProject, CreateTask, UpdateOrganization,
};
use taskhub_core::wire::Page;
use tokio::sync::Notify;

#[derive(Default)]
struct Tables {
    organizations: Vec<Organization>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
}

/// Holds one call open: `entered` fires once the call has read its data,
/// `release` lets it return.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeStore {
    tables: Mutex<Tables>,
    calls: Mutex<HashMap<&'static str, usize>>,
    task_list_gate: Mutex<Option<Arc<Gate>>>,
    offline: AtomicBool,
    task_list_latency_ms: AtomicU64,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Hold the next `list_tasks` call until the returned gate is released.
    pub fn hold_next_list_tasks(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.task_list_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// While offline every call fails with a 503.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every `list_tasks` call by `latency` before it does anything.
    pub fn set_task_list_latency(&self, latency: Duration) {
        self.task_list_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn task_list_delay(&self) {
        let ms = self.task_list_latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn hit(&self, op: &'static str) -> Result<(), ClientError> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Remote {
                status: 503,
                code: "UNAVAILABLE".into(),
                message: "store offline".into(),
            });
        }
        Ok(())
    }
}

fn paged<T>(items: Vec<T>, page: Page) -> Vec<T> {
    let offset = page.sql_offset() as usize;
    let limit = page.sql_limit().map_or(usize::MAX, |l| l as usize);
    items.into_iter().skip(offset).take(limit).collect()
}

fn not_found(entity: &'static str, key: impl ToString) -> ClientError {
    ClientError::NotFound(format!("{entity} {} not found", key.to_string()))
}

fn rejected<T>(err: CoreError) -> Result<MutationOutcome<T>, ClientError> {
    Ok(MutationOutcome::Rejected(err.messages()))
}

impl Tables {
    fn organization_by_slug(&self, slug: &str) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.slug == slug)
    }

    fn organization(&self, id: EntityId) -> &Organization {
        self.organizations.iter().find(|o| o.id == id).unwrap()
    }

    fn project(&self, id: EntityId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn task(&self, id: EntityId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn projects_of(&self, organization_id: EntityId) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        projects
    }

    fn tasks_of(&self, project_id: EntityId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        tasks
    }

    fn comments_of(&self, task_id: EntityId) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.timestamp, c.id));
        comments
    }

    fn organization_view(&self, org: &Organization) -> OrganizationView {
        aggregate::organization_view(org.clone(), &self.projects_of(org.id))
    }

    fn project_ref(&self, project: &Project) -> ProjectRef {
        ProjectRef {
            id: project.id,
            name: project.name.clone(),
            organization: OrganizationRef::from(self.organization(project.organization_id)),
        }
    }

    fn project_view(&self, project: &Project) -> ProjectView {
        let tasks = self.tasks_of(project.id);
        ProjectView {
            aggregate: aggregate::project_aggregate(project, &tasks, Utc::now().date_naive()),
            organization: OrganizationRef::from(self.organization(project.organization_id)),
            project: project.clone(),
        }
    }

    fn task_view(&self, task: &Task) -> TaskView {
        let comments = self.comments_of(task.id);
        let project = self.project(task.project_id).unwrap();
        TaskView {
            aggregate: aggregate::task_aggregate(task, &comments, Utc::now()),
            project: self.project_ref(project),
            task: task.clone(),
        }
    }

    fn comment_view(&self, comment: &Comment) -> CommentView {
        let task = self.task(comment.task_id).unwrap();
        let project = self.project(task.project_id).unwrap();
        CommentView {
            comment: comment.clone(),
            task: TaskRef {
                id: task.id,
                title: task.title.clone(),
                project: self.project_ref(project),
            },
        }
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list_organizations(&self, page: Page) -> Result<Vec<OrganizationView>, ClientError> {
        self.hit("list_organizations")?;
        let tables = self.tables.lock().unwrap();
        let mut orgs = tables.organizations.clone();
        orgs.sort_by(|a, b| (&a.name, &a.slug).cmp(&(&b.name, &b.slug)));
        Ok(paged(orgs, page)
            .iter()
            .map(|o| tables.organization_view(o))
            .collect())
    }

    async fn get_organization(&self, slug: &str) -> Result<OrganizationView, ClientError> {
        self.hit("get_organization")?;
        let tables = self.tables.lock().unwrap();
        let org = tables
            .organization_by_slug(slug)
            .ok_or_else(|| not_found("Organization", slug))?;
        Ok(tables.organization_view(org))
    }

    async fn organization_stats(&self, slug: &str) -> Result<OrganizationStats, ClientError> {
        self.hit("organization_stats")?;
        let tables = self.tables.lock().unwrap();
        let org = tables
            .organization_by_slug(slug)
            .ok_or_else(|| not_found("Organization", slug))?;
        let projects = tables.projects_of(org.id);
        let tasks: Vec<Task> = projects
            .iter()
            .flat_map(|p| tables.tasks_of(p.id))
            .collect();
        Ok(aggregate::organization_stats(&projects, &tasks))
    }

    async fn list_projects(
        &self,
        organization_slug: &str,
        page: Page,
    ) -> Result<Vec<ProjectView>, ClientError> {
        self.hit("list_projects")?;
        let tables = self.tables.lock().unwrap();
        let org = tables
            .organization_by_slug(organization_slug)
            .ok_or_else(|| not_found("Organization", organization_slug))?;
        Ok(paged(tables.projects_of(org.id), page)
            .iter()
            .map(|p| tables.project_view(p))
            .collect())
    }

    async fn get_project(&self, id: EntityId) -> Result<ProjectView, ClientError> {
        self.hit("get_project")?;
        let tables = self.tables.lock().unwrap();
        let project = tables.project(id).ok_or_else(|| not_found("Project", id))?;
        Ok(tables.project_view(project))
    }

    async fn get_scoped_project(
        &self,
        organization_slug: &str,
        id: EntityId,
    ) -> Result<ProjectView, ClientError> {
        self.hit("get_scoped_project")?;
        let tables = self.tables.lock().unwrap();
        let org = tables
            .organization_by_slug(organization_slug)
            .ok_or_else(|| not_found("Organization", organization_slug))?;
        match tables.project(id) {
            Some(project) if project.organization_id == org.id => Ok(tables.project_view(project)),
            _ => Err(not_found("Project", id)),
        }
    }

    async fn list_tasks(
        &self,
        project_id: EntityId,
        page: Page,
    ) -> Result<Vec<TaskView>, ClientError> {
        self.task_list_delay().await;
        self.hit("list_tasks")?;
        let snapshot: Vec<TaskView> = {
            let tables = self.tables.lock().unwrap();
            tables
                .project(project_id)
                .ok_or_else(|| not_found("Project", project_id))?;
            paged(tables.tasks_of(project_id), page)
                .iter()
                .map(|t| tables.task_view(t))
                .collect()
        };
        let gate = self.task_list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(snapshot)
    }

    async fn get_task(&self, id: EntityId) -> Result<TaskView, ClientError> {
        self.hit("get_task")?;
        let tables = self.tables.lock().unwrap();
        let task = tables.task(id).ok_or_else(|| not_found("Task", id))?;
        Ok(tables.task_view(task))
    }

    async fn get_scoped_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
    ) -> Result<TaskView, ClientError> {
        self.hit("get_scoped_task")?;
        let tables = self.tables.lock().unwrap();
        tables
            .project(project_id)
            .ok_or_else(|| not_found("Project", project_id))?;
        match tables.task(task_id) {
            Some(task) if task.project_id == project_id => Ok(tables.task_view(task)),
            _ => Err(not_found("Task", task_id)),
        }
    }

    async fn list_comments(
        &self,
        task_id: EntityId,
        page: Page,
    ) -> Result<Vec<CommentView>, ClientError> {
        self.hit("list_comments")?;
        let tables = self.tables.lock().unwrap();
        tables.task(task_id).ok_or_else(|| not_found("Task", task_id))?;
        Ok(paged(tables.comments_of(task_id), page)
            .iter()
            .map(|c| tables.comment_view(c))
            .collect())
    }

    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        self.hit("create_organization")?;
        let new = match input.validate() {
            Ok(new) => new,
            Err(errors) => return rejected(CoreError::Validation(errors)),
        };
        let mut tables = self.tables.lock().unwrap();
        let slug = unique_slug(&new.name, |candidate| {
            tables.organizations.iter().any(|o| o.slug == candidate)
        });
        let now = Utc::now();
        let org = Organization {
            id: new_entity_id(),
            name: new.name,
            slug,
            contact_email: new.contact_email,
            created_at: now,
            updated_at: now,
        };
        tables.organizations.push(org.clone());
        Ok(MutationOutcome::Applied(tables.organization_view(&org)))
    }

    async fn update_organization(
        &self,
        id: EntityId,
        input: &UpdateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        self.hit("update_organization")?;
        let changes = match input.validate() {
            Ok(changes) => changes,
            Err(errors) => return rejected(CoreError::Validation(errors)),
        };
        let mut tables = self.tables.lock().unwrap();
        let Some(org) = tables.organizations.iter_mut().find(|o| o.id == id) else {
            return rejected(CoreError::not_found("Organization", id));
        };
        if let Some(name) = changes.name {
            org.name = name;
        }
        if let Some(email) = changes.contact_email {
            org.contact_email = email;
        }
        org.updated_at = Utc::now();
        let org = org.clone();
        Ok(MutationOutcome::Applied(tables.organization_view(&org)))
    }

    async fn create_project(
        &self,
        organization_slug: &str,
        input: &CreateProject,
    ) -> Result<MutationOutcome<ProjectView>, ClientError> {
        self.hit("create_project")?;
        let new = match input.validate() {
            Ok(new) => new,
            Err(errors) => return rejected(CoreError::Validation(errors)),
        };
        let mut tables = self.tables.lock().unwrap();
        let Some(org_id) = tables.organization_by_slug(organization_slug).map(|o| o.id) else {
            return rejected(CoreError::not_found("Organization", organization_slug));
        };
        if tables.projects_of(org_id).iter().any(|p| p.name == new.name) {
            return rejected(CoreError::Conflict(
                "name: a project with this name already exists in the organization".into(),
            ));
        }
        let now = Utc::now();
        let project = Project {
            id: new_entity_id(),
            organization_id: org_id,
            name: new.name,
            description: new.description,
            status: new.status,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(MutationOutcome::Applied(tables.project_view(&project)))
    }

    async fn create_task(
        &self,
        project_id: EntityId,
        input: &CreateTask,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        self.hit("create_task")?;
        let new = match input.validate() {
            Ok(new) => new,
            Err(errors) => return rejected(CoreError::Validation(errors)),
        };
        let mut tables = self.tables.lock().unwrap();
        if tables.project(project_id).is_none() {
            return rejected(CoreError::not_found("Project", project_id));
        }
        if tables.tasks_of(project_id).iter().any(|t| t.title == new.title) {
            return rejected(CoreError::Conflict(
                "title: a task with this title already exists in the project".into(),
            ));
        }
        let now = Utc::now();
        let task = Task {
            id: new_entity_id(),
            project_id,
            title: new.title,
            description: new.description,
            status: new.status,
            assignee_email: new.assignee_email,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());
        Ok(MutationOutcome::Applied(tables.task_view(&task)))
    }

    async fn update_task_status(
        &self,
        task_id: EntityId,
        status: TaskStatus,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        self.hit("update_task_status")?;
        let mut tables = self.tables.lock().unwrap();
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == task_id) else {
            return rejected(CoreError::not_found("Task", task_id));
        };
        task.status = status;
        task.updated_at = Utc::now();
        let task = task.clone();
        Ok(MutationOutcome::Applied(tables.task_view(&task)))
    }

    async fn create_comment(
        &self,
        task_id: EntityId,
        input: &CreateComment,
    ) -> Result<MutationOutcome<CommentView>, ClientError> {
        self.hit("create_comment")?;
        let new = match input.validate() {
            Ok(new) => new,
            Err(errors) => return rejected(CoreError::Validation(errors)),
        };
        let mut tables = self.tables.lock().unwrap();
        if tables.task(task_id).is_none() {
            return rejected(CoreError::not_found("Task", task_id));
        }
        let comment = Comment {
            id: new_entity_id(),
            task_id,
            content: new.content,
            author_email: new.author_email,
            timestamp: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(MutationOutcome::Applied(tables.comment_view(&comment)))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn org_input(name: &str) -> CreateOrganization {
    CreateOrganization {
        name: name.into(),
        contact_email: "ops@example.com".into(),
    }
}

pub fn task_input(title: &str) -> CreateTask {
    CreateTask {
        title: title.into(),
        ..CreateTask::default()
    }
}

/// Seed one organization with one empty project, straight through the store.
pub async fn seed(store: &FakeStore, org_name: &str) -> (OrganizationView, ProjectView) {
    let org = store
        .create_organization(&org_input(org_name))
        .await
        .unwrap()
        .applied()
        .cloned()
        .unwrap();
    let project = store
        .create_project(
            &org.organization.slug,
            &CreateProject {
                name: "Apollo".into(),
                ..CreateProject::default()
            },
        )
        .await
        .unwrap()
        .applied()
        .cloned()
        .unwrap();
    (org, project)
}
