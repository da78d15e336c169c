//! [`RemoteStore`] over the Taskhub `/api/v1` HTTP surface, using [`reqwest`].

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taskhub_core::aggregate::OrganizationStats;
use taskhub_core::entity::{CommentView, OrganizationView, ProjectView, TaskView};
use taskhub_core::error::CoreError;
use taskhub_core::slug::is_valid_slug;
use taskhub_core::status::TaskStatus;
use taskhub_core::types::EntityId;
use taskhub_core::validation::{
    CreateComment, CreateOrganization, CreateProject, CreateTask, UpdateOrganization,
    UpdateTaskStatus,
};
use taskhub_core::wire::{EntityKey, ErrorBody, MutationResponse, Page};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::remote::{MutationOutcome, RemoteStore};

/// Query responses arrive as `{ "data": T }`.
#[derive(Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// HTTP client for a single Taskhub server.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Build a client with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, &config.api_url))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    ///
    /// * `api_url` - Server origin, e.g. `http://host:3000`.
    pub fn with_client(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/api/v1", api_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn query<T: DeserializeOwned>(&self, path: &str, page: Option<Page>) -> Result<T, ClientError> {
        let mut request = self.client.get(self.url(path));
        if let Some(page) = page {
            request = request.query(&page);
        }
        let response = request.send().await?;
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        let envelope: DataResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Malformed(format!("GET {path}: {e}")))?;
        Ok(envelope.data)
    }

    async fn mutate<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<MutationOutcome<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + EntityKey,
    {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await?;
        let outcome = Self::parse_mutation(response).await;
        if let Ok(MutationOutcome::Rejected(errors)) = &outcome {
            tracing::debug!(%method, path, ?errors, "Mutation rejected");
        }
        outcome
    }

    // ---- private helpers ----

    /// A slug can only name an organization if it is a valid slug; anything
    /// else never reaches the URL.
    fn slug_segment(slug: &str) -> Result<&str, ClientError> {
        if is_valid_slug(slug) {
            Ok(slug)
        } else {
            Err(ClientError::NotFound(
                CoreError::not_found("Organization", slug).to_string(),
            ))
        }
    }

    /// Ensure the response has a success status code. A 404 becomes
    /// [`ClientError::NotFound`]; any other failure carries the server's
    /// `{error, code}` body when it sent one.
    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let bytes = response.bytes().await.unwrap_or_default();
        Err(Self::remote_error(status, &bytes))
    }

    fn remote_error(status: StatusCode, bytes: &[u8]) -> ClientError {
        let (code, message) = match serde_json::from_slice::<ErrorBody>(bytes) {
            Ok(body) => (body.code, body.error),
            Err(_) => (
                "UNKNOWN".to_string(),
                String::from_utf8_lossy(bytes).into_owned(),
            ),
        };
        if status == StatusCode::NOT_FOUND {
            ClientError::NotFound(message)
        } else {
            ClientError::Remote {
                status: status.as_u16(),
                code,
                message,
            }
        }
    }

    /// Success and client-error statuses both carry the mutation envelope;
    /// anything else is a failure of the request itself.
    async fn parse_mutation<T: DeserializeOwned + EntityKey>(
        response: Response,
    ) -> Result<MutationOutcome<T>, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if !(status.is_success() || status.is_client_error()) {
            return Err(Self::remote_error(status, &bytes));
        }
        match serde_json::from_slice::<MutationResponse<T>>(&bytes) {
            Ok(envelope) => MutationOutcome::try_from(envelope),
            Err(e) if status.is_success() => Err(ClientError::Malformed(e.to_string())),
            // e.g. a plain-text 404 for an unknown route
            Err(_) => Err(Self::remote_error(status, &bytes)),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_organizations(&self, page: Page) -> Result<Vec<OrganizationView>, ClientError> {
        self.query("/organizations", Some(page)).await
    }

    async fn get_organization(&self, slug: &str) -> Result<OrganizationView, ClientError> {
        let slug = Self::slug_segment(slug)?;
        self.query(&format!("/organizations/{slug}"), None).await
    }

    async fn organization_stats(&self, slug: &str) -> Result<OrganizationStats, ClientError> {
        let slug = Self::slug_segment(slug)?;
        self.query(&format!("/organizations/{slug}/stats"), None).await
    }

    async fn list_projects(
        &self,
        organization_slug: &str,
        page: Page,
    ) -> Result<Vec<ProjectView>, ClientError> {
        let organization_slug = Self::slug_segment(organization_slug)?;
        self.query(&format!("/organizations/{organization_slug}/projects"), Some(page))
            .await
    }

    async fn get_project(&self, id: EntityId) -> Result<ProjectView, ClientError> {
        self.query(&format!("/projects/{id}"), None).await
    }

    async fn get_scoped_project(
        &self,
        organization_slug: &str,
        id: EntityId,
    ) -> Result<ProjectView, ClientError> {
        let organization_slug = Self::slug_segment(organization_slug)?;
        self.query(&format!("/organizations/{organization_slug}/projects/{id}"), None)
            .await
    }

    async fn list_tasks(
        &self,
        project_id: EntityId,
        page: Page,
    ) -> Result<Vec<TaskView>, ClientError> {
        self.query(&format!("/projects/{project_id}/tasks"), Some(page))
            .await
    }

    async fn get_task(&self, id: EntityId) -> Result<TaskView, ClientError> {
        self.query(&format!("/tasks/{id}"), None).await
    }

    async fn get_scoped_task(
        &self,
        project_id: EntityId,
        task_id: EntityId,
    ) -> Result<TaskView, ClientError> {
        self.query(&format!("/projects/{project_id}/tasks/{task_id}"), None)
            .await
    }

    async fn list_comments(
        &self,
        task_id: EntityId,
        page: Page,
    ) -> Result<Vec<CommentView>, ClientError> {
        self.query(&format!("/tasks/{task_id}/comments"), Some(page))
            .await
    }

    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        self.mutate(reqwest::Method::POST, "/organizations", input)
            .await
    }

    async fn update_organization(
        &self,
        id: EntityId,
        input: &UpdateOrganization,
    ) -> Result<MutationOutcome<OrganizationView>, ClientError> {
        self.mutate(reqwest::Method::PUT, &format!("/organizations/{id}"), input)
            .await
    }

    async fn create_project(
        &self,
        organization_slug: &str,
        input: &CreateProject,
    ) -> Result<MutationOutcome<ProjectView>, ClientError> {
        if !is_valid_slug(organization_slug) {
            let err = CoreError::not_found("Organization", organization_slug);
            return Ok(MutationOutcome::Rejected(err.messages()));
        }
        let path = format!("/organizations/{organization_slug}/projects");
        self.mutate(reqwest::Method::POST, &path, input).await
    }

    async fn create_task(
        &self,
        project_id: EntityId,
        input: &CreateTask,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        let path = format!("/projects/{project_id}/tasks");
        self.mutate(reqwest::Method::POST, &path, input).await
    }

    async fn update_task_status(
        &self,
        task_id: EntityId,
        status: TaskStatus,
    ) -> Result<MutationOutcome<TaskView>, ClientError> {
        let body = UpdateTaskStatus {
            status: status.as_str().to_string(),
        };
        let path = format!("/tasks/{task_id}/status");
        self.mutate(reqwest::Method::PUT, &path, &body).await
    }

    async fn create_comment(
        &self,
        task_id: EntityId,
        input: &CreateComment,
    ) -> Result<MutationOutcome<CommentView>, ClientError> {
        let path = format!("/tasks/{task_id}/comments");
        self.mutate(reqwest::Method::POST, &path, input).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn base_url_gets_api_prefix() {
        let store = HttpRemoteStore::with_client(reqwest::Client::new(), "http://host:3000/");
        assert_eq!(store.url("/organizations"), "http://host:3000/api/v1/organizations");
    }

    /// Nothing listens here; a request that got sent would fail as transport.
    fn unreachable() -> HttpRemoteStore {
        HttpRemoteStore::with_client(reqwest::Client::new(), "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn malformed_slugs_never_reach_the_url() {
        let store = unreachable();
        for slug in ["acme/../../tasks", "acme?limit=1", "acme#x", "Acme Corp", ""] {
            assert_matches!(store.get_organization(slug).await, Err(ClientError::NotFound(_)), "{slug}");
            assert_matches!(store.organization_stats(slug).await, Err(ClientError::NotFound(_)), "{slug}");
            assert_matches!(
                store.list_projects(slug, Page::default()).await,
                Err(ClientError::NotFound(_)),
                "{slug}"
            );
            assert_matches!(
                store.get_scoped_project(slug, uuid::Uuid::nil()).await,
                Err(ClientError::NotFound(_)),
                "{slug}"
            );
        }
    }

    #[tokio::test]
    async fn project_under_malformed_slug_is_rejected() {
        let input = CreateProject {
            name: "Apollo".into(),
            ..CreateProject::default()
        };
        let outcome = unreachable().create_project("acme/../x", &input).await.unwrap();
        assert_matches!(outcome, MutationOutcome::Rejected(errors) if errors.len() == 1);
    }

    #[test]
    fn valid_slug_passes_through() {
        assert_eq!(HttpRemoteStore::slug_segment("acme-corp-2").unwrap(), "acme-corp-2");
    }

    #[test]
    fn not_found_body_becomes_not_found() {
        let body = br#"{"error": "Project 42 not found", "code": "NOT_FOUND"}"#;
        let err = HttpRemoteStore::remote_error(StatusCode::NOT_FOUND, body);
        assert_matches!(err, ClientError::NotFound(msg) if msg == "Project 42 not found");
    }

    #[test]
    fn server_error_keeps_status_and_code() {
        let body = br#"{"error": "An internal error occurred", "code": "INTERNAL_ERROR"}"#;
        let err = HttpRemoteStore::remote_error(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert_matches!(
            err,
            ClientError::Remote { status: 500, ref code, .. } if code == "INTERNAL_ERROR"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let err = HttpRemoteStore::remote_error(StatusCode::BAD_GATEWAY, b"upstream down");
        assert_matches!(
            err,
            ClientError::Remote { status: 502, ref message, .. } if message == "upstream down"
        );
    }
}
