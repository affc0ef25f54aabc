//! HTTP client for the agents REST API.
//!
//! All operations are organization-scoped and authenticated with a token
//! from the environment. Synchronous one-shot calls (create/get/list) fail
//! hard on unexpected statuses; the event fetch used inside the poll loop
//! degrades to an empty page instead, so one bad response never kills an
//! in-progress watch.

use crate::error::ApiError;
use crate::types::{EntityRef, EventPage, Task};
use async_trait::async_trait;

mod client;

pub use client::ApiClient;

/// Minimal API interface used by the poll loop and CLI dispatch.
///
/// This trait lets tests provide deterministic mock responses without
/// network calls while the production path uses [`ApiClient`].
#[async_trait]
pub trait AgentsApi: Send + Sync {
    /// Create a task from an opening message; returns the new task id.
    async fn create_task(
        &self,
        org: &str,
        message: &str,
        entities: Vec<EntityRef>,
    ) -> Result<String, ApiError>;

    /// Fetch one task's current state.
    async fn get_task(&self, org: &str, task_id: &str) -> Result<Task, ApiError>;

    /// List task summaries for an organization.
    async fn list_tasks(&self, org: &str, page_size: usize) -> Result<Vec<Task>, ApiError>;

    /// Fetch events after `continuation_token`, absorbing failures.
    async fn get_events(
        &self,
        org: &str,
        task_id: &str,
        continuation_token: Option<&str>,
    ) -> EventPage;

    /// Confirm a pending approval request.
    async fn send_approval(
        &self,
        org: &str,
        task_id: &str,
        approval_request_id: &str,
    ) -> Result<(), ApiError>;

    /// Cancel a pending request.
    async fn send_cancel(&self, org: &str, task_id: &str) -> Result<(), ApiError>;

    /// Send a follow-up message to an existing task.
    async fn send_message(&self, org: &str, task_id: &str, message: &str) -> Result<(), ApiError>;
}
