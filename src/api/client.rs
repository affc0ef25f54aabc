//! reqwest-backed implementation of the agents API.

use super::AgentsApi;
use crate::config;
use crate::error::{ApiError, ConfigError};
use crate::types::{
    CreateTaskRequest, CreateTaskResponse, EntityDiff, EntityRef, EventPage, OutboundEvent,
    PostEventRequest, Task, TaskListResponse,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed content-negotiation header sent with every request.
const ACCEPT_HEADER: &str = "application/vnd.sidekick.v1+json";

/// Page size for event-log fetches.
const EVENTS_PAGE_SIZE: usize = 100;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the organization-scoped agents endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Build a client against `base_url` with an explicit token.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        }
    }

    /// Build a client with the token resolved from the environment.
    pub fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let token = config::auth_token_from_env()?;
        Ok(Self::new(base_url, &token, DEFAULT_TIMEOUT))
    }

    fn tasks_url(&self, org: &str) -> String {
        format!("{}/{org}/tasks", self.base_url)
    }

    fn task_url(&self, org: &str, task_id: &str) -> String {
        format!("{}/{org}/tasks/{task_id}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", ACCEPT_HEADER)
    }

    /// POST one outbound event to the per-task URL; success is 202 exactly.
    async fn post_event(
        &self,
        org: &str,
        task_id: &str,
        event: OutboundEvent,
    ) -> Result<(), ApiError> {
        let url = self.task_url(org, task_id);
        debug!(%url, "post task event");
        let response = self
            .authed(self.http.post(&url))
            .json(&PostEventRequest { event })
            .send()
            .await?;
        expect_status(response, 202).await?;
        Ok(())
    }

    async fn fetch_events(
        &self,
        org: &str,
        task_id: &str,
        continuation_token: Option<&str>,
    ) -> Result<EventPage, ApiError> {
        let url = format!("{}/events", self.task_url(org, task_id));
        let mut query = vec![("pageSize", EVENTS_PAGE_SIZE.to_string())];
        if let Some(token) = continuation_token.filter(|token| !token.is_empty()) {
            query.push(("continuationToken", token.to_string()));
        }
        debug!(%url, "fetch events");
        let response = self.authed(self.http.get(&url)).query(&query).send().await?;
        let response = expect_status(response, 200).await?;
        response.json::<EventPage>().await.map_err(ApiError::from)
    }
}

/// Consume a response, requiring one exact status code.
async fn expect_status(
    response: reqwest::Response,
    expected: u16,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status().as_u16();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body));
    }
    Ok(response)
}

#[async_trait]
impl AgentsApi for ApiClient {
    async fn create_task(
        &self,
        org: &str,
        message: &str,
        entities: Vec<EntityRef>,
    ) -> Result<String, ApiError> {
        let url = self.tasks_url(org);
        debug!(%url, "create task");
        let request = CreateTaskRequest {
            message: OutboundEvent::message(message, EntityDiff::adding(entities)),
        };
        let response = self
            .authed(self.http.post(&url))
            .json(&request)
            .send()
            .await?;
        let response = expect_status(response, 201).await?;
        let created = response.json::<CreateTaskResponse>().await?;
        Ok(created.task_id)
    }

    async fn get_task(&self, org: &str, task_id: &str) -> Result<Task, ApiError> {
        let url = self.task_url(org, task_id);
        debug!(%url, "get task");
        let response = self.authed(self.http.get(&url)).send().await?;
        let response = expect_status(response, 200).await?;
        response.json::<Task>().await.map_err(ApiError::from)
    }

    async fn list_tasks(&self, org: &str, page_size: usize) -> Result<Vec<Task>, ApiError> {
        let url = self.tasks_url(org);
        debug!(%url, page_size, "list tasks");
        let response = self
            .authed(self.http.get(&url))
            .query(&[("pageSize", page_size.to_string())])
            .send()
            .await?;
        let response = expect_status(response, 200).await?;
        let list = response.json::<TaskListResponse>().await?;
        Ok(list.tasks)
    }

    async fn get_events(
        &self,
        org: &str,
        task_id: &str,
        continuation_token: Option<&str>,
    ) -> EventPage {
        match self.fetch_events(org, task_id, continuation_token).await {
            Ok(page) => page,
            Err(err) => {
                // Transient failures inside the poll loop must not kill the
                // watch; the next cycle retries from the same cursor.
                warn!(task_id, error = %err, "event fetch failed; treating as empty page");
                EventPage::default()
            }
        }
    }

    async fn send_approval(
        &self,
        org: &str,
        task_id: &str,
        approval_request_id: &str,
    ) -> Result<(), ApiError> {
        self.post_event(org, task_id, OutboundEvent::confirmation(approval_request_id))
            .await
    }

    async fn send_cancel(&self, org: &str, task_id: &str) -> Result<(), ApiError> {
        self.post_event(org, task_id, OutboundEvent::cancel()).await
    }

    async fn send_message(&self, org: &str, task_id: &str, message: &str) -> Result<(), ApiError> {
        self.post_event(
            org,
            task_id,
            OutboundEvent::message(message, EntityDiff::default()),
        )
        .await
    }
}
