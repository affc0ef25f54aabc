//! Data model for the agents REST API.
//!
//! These types serialize/deserialize directly to/from the JSON payloads the
//! service exchanges: task summaries, task events, and the outbound message
//! envelopes posted back to a task.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Server-assigned task status.
///
/// The status set is open-ended on the server side; anything we do not
/// recognize is preserved verbatim in [`TaskStatus::Other`] so list output
/// and log lines never lose information.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Completed,
    Failed,
    WaitingForApproval,
    Other(String),
}

impl TaskStatus {
    /// True when the task will make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The wire string for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::WaitingForApproval => "waiting_for_approval",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "waiting_for_approval" => Self::WaitingForApproval,
            _ => Self::Other(raw),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tasks and events
// ---------------------------------------------------------------------------

/// A server-tracked task summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Creation timestamp as reported by the server (display-only).
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// One immutable event in a task's log.
///
/// The `eventBody` payload is type-specific; unknown event types keep their
/// payload as raw JSON so they can still be shown to the operator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "eventBody", default)]
    pub body: serde_json::Value,
}

/// Typed view over a [`TaskEvent`] payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    AgentResponse {
        content: String,
    },
    UserInput {
        content: String,
    },
    ApprovalRequest {
        request_id: String,
        description: String,
    },
    /// Fallback arm for event types this client does not know about.
    Other {
        kind: String,
        body: serde_json::Value,
    },
}

impl TaskEvent {
    /// Resolve the type-specific payload into an explicit variant.
    pub fn classify(&self) -> EventBody {
        match self.kind.as_str() {
            "agentResponse" => EventBody::AgentResponse {
                content: self.body_str("content"),
            },
            "userInput" => EventBody::UserInput {
                content: self.body_str("content"),
            },
            "approvalRequest" => EventBody::ApprovalRequest {
                request_id: self.body_str("approval_request_id"),
                description: self.body_str("description"),
            },
            _ => EventBody::Other {
                kind: self.kind.clone(),
                body: self.body.clone(),
            },
        }
    }

    /// The approval request id when this is an `approvalRequest` event.
    pub fn approval_request_id(&self) -> Option<String> {
        match self.classify() {
            EventBody::ApprovalRequest { request_id, .. } if !request_id.is_empty() => {
                Some(request_id)
            }
            _ => None,
        }
    }

    fn body_str(&self, key: &str) -> String {
        self.body
            .get(key)
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Entity context
// ---------------------------------------------------------------------------

/// Source forge hosting a repository entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Forge {
    #[default]
    Github,
    Gitlab,
    Bitbucket,
}

impl fmt::Display for Forge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Github => f.write_str("github"),
            Self::Gitlab => f.write_str("gitlab"),
            Self::Bitbucket => f.write_str("bitbucket"),
        }
    }
}

/// Descriptive context attached to a message, never mutated by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityRef {
    Stack {
        name: String,
        project: String,
    },
    Repository {
        name: String,
        org: String,
        forge: Forge,
    },
}

/// Entities to attach to / detach from a task at message time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityDiff {
    pub add: Vec<EntityRef>,
    pub remove: Vec<EntityRef>,
}

impl EntityDiff {
    /// Diff that attaches the given entities and removes nothing.
    pub fn adding(entities: Vec<EntityRef>) -> Self {
        Self {
            add: entities,
            remove: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound envelopes
// ---------------------------------------------------------------------------

/// Client-originated event posted to a task (or used as the opening message).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    UserMessage {
        content: String,
        timestamp: DateTime<Utc>,
        entity_diff: EntityDiff,
    },
    UserConfirmation {
        approval_request_id: String,
        timestamp: DateTime<Utc>,
    },
    UserCancel {
        timestamp: DateTime<Utc>,
    },
}

impl OutboundEvent {
    /// A `user_message` stamped with the current UTC time.
    pub fn message(content: impl Into<String>, entity_diff: EntityDiff) -> Self {
        Self::UserMessage {
            content: content.into(),
            timestamp: Utc::now(),
            entity_diff,
        }
    }

    /// A `user_confirmation` for a pending approval request.
    pub fn confirmation(approval_request_id: impl Into<String>) -> Self {
        Self::UserConfirmation {
            approval_request_id: approval_request_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// A `user_cancel` event.
    pub fn cancel() -> Self {
        Self::UserCancel {
            timestamp: Utc::now(),
        }
    }
}

/// Request body for POST /{org}/tasks.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub message: OutboundEvent,
}

/// Request body for POST /{org}/tasks/{id}.
#[derive(Debug, Clone, Serialize)]
pub struct PostEventRequest {
    pub event: OutboundEvent,
}

/// Response body from POST /{org}/tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(rename = "taskId")]
    pub task_id: String,
}

/// Response body from GET /{org}/tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// One page of a task's event log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub events: Vec<TaskEvent>,
    /// Cursor for the next fetch; absent when the server has nothing newer.
    #[serde(rename = "continuationToken", default)]
    pub continuation_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
