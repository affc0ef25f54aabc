//! The observe-until-terminal poll loop.
//!
//! A [`Poller`] owns the per-session state: the set of event ids already
//! shown, the latest continuation cursor, and the most recent pending
//! approval id. Each iteration fetches status and new events, emits every
//! unseen event exactly once in arrival order, and stops on a terminal
//! status, a required approval, or the configured deadline.

use crate::api::AgentsApi;
use crate::config::PollConfig;
use crate::error::ApiError;
use crate::render::{format_event, RenderSink};
use crate::types::TaskStatus;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Upper bound on pages walked when scanning a full event log.
const APPROVAL_SCAN_PAGE_LIMIT: usize = 50;

/// Timing knobs for one watch session.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Delay between poll iterations.
    pub interval: Duration,
    /// Wall-clock budget before the watch gives up.
    pub max_wait: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

impl From<&PollConfig> for PollOptions {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }
}

/// Why a watch session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    /// The task is blocked on the most recent unresolved approval request.
    AwaitingApproval { approval_request_id: String },
    /// The deadline elapsed; the task may still be running server-side.
    TimedOut,
}

/// Drives the observe-until-terminal loop for a single task.
pub struct Poller<'a> {
    api: &'a dyn AgentsApi,
    org: &'a str,
    task_id: &'a str,
    options: PollOptions,
    seen: HashSet<String>,
    continuation_token: Option<String>,
    pending_approval_id: Option<String>,
}

impl<'a> Poller<'a> {
    pub fn new(
        api: &'a dyn AgentsApi,
        org: &'a str,
        task_id: &'a str,
        options: PollOptions,
    ) -> Self {
        Self {
            api,
            org,
            task_id,
            options,
            seen: HashSet::new(),
            continuation_token: None,
            pending_approval_id: None,
        }
    }

    /// The most recent approval request id observed this session.
    pub fn pending_approval_id(&self) -> Option<&str> {
        self.pending_approval_id.as_deref()
    }

    /// Run until a terminal status, a required approval, or the deadline.
    ///
    /// Status fetch failures are fatal and propagate; event fetch failures
    /// were already absorbed by the API layer and look like an empty page.
    pub async fn run(&mut self, sink: &dyn RenderSink) -> Result<PollOutcome, ApiError> {
        let deadline = Instant::now() + self.options.max_wait;
        loop {
            if Instant::now() >= deadline {
                return Ok(PollOutcome::TimedOut);
            }

            let task = self.api.get_task(self.org, self.task_id).await?;
            let page = self
                .api
                .get_events(self.org, self.task_id, self.continuation_token.as_deref())
                .await;

            for event in &page.events {
                // Cursor overlap can resend events; each id prints once.
                if event.id.is_empty() || !self.seen.insert(event.id.clone()) {
                    continue;
                }
                sink.event(&format_event(event));
                if let Some(request_id) = event.approval_request_id() {
                    // Only the most recent unresolved request matters.
                    self.pending_approval_id = Some(request_id);
                }
            }

            // An absent token leaves the previous cursor in place so the
            // next fetch still starts from the right position.
            if let Some(token) = page.continuation_token.filter(|token| !token.is_empty()) {
                self.continuation_token = Some(token);
            }

            match &task.status {
                TaskStatus::Completed => return Ok(PollOutcome::Completed),
                TaskStatus::Failed => return Ok(PollOutcome::Failed),
                TaskStatus::WaitingForApproval => {
                    if let Some(approval_request_id) = self.pending_approval_id.clone() {
                        return Ok(PollOutcome::AwaitingApproval {
                            approval_request_id,
                        });
                    }
                }
                TaskStatus::Other(_) => {}
            }

            debug!(status = %task.status, "task still in flight");
            sleep(self.options.interval).await;
        }
    }
}

/// Walk the full event log and return the most recent approval request id.
///
/// Used by `--approve` when no explicit id was given. Pages are delivered
/// oldest-to-newest, so the last match wins.
pub async fn find_latest_approval(
    api: &dyn AgentsApi,
    org: &str,
    task_id: &str,
) -> Option<String> {
    let mut continuation_token: Option<String> = None;
    let mut latest = None;
    for _ in 0..APPROVAL_SCAN_PAGE_LIMIT {
        let page = api
            .get_events(org, task_id, continuation_token.as_deref())
            .await;
        if page.events.is_empty() {
            break;
        }
        for event in &page.events {
            if let Some(request_id) = event.approval_request_id() {
                latest = Some(request_id);
            }
        }
        match page.continuation_token.filter(|token| !token.is_empty()) {
            Some(next) => continuation_token = Some(next),
            None => break,
        }
    }
    latest
}
