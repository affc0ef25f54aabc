//! Sidekick — a terminal client for remote agent tasks.
//!
//! This crate drives an organization-scoped agents REST API: it creates
//! tasks, sends follow-up messages and approval decisions, and watches a
//! task's event log until the task reaches a terminal state or asks for
//! user approval.
//!
//! # Quick start
//!
//! ```no_run
//! use sidekick::api::ApiClient;
//! use sidekick::poll::{PollOptions, Poller};
//! use sidekick::render::Renderer;
//!
//! # async fn example() {
//! let client = ApiClient::from_env("https://api.sidekick.dev/api/preview/agents").unwrap();
//! let renderer = Renderer::new(true);
//! let mut poller = Poller::new(&client, "my-org", "task_abc123", PollOptions::default());
//! let outcome = poller.run(&renderer).await.unwrap();
//! println!("{outcome:?}");
//! # }
//! ```

pub mod api;
pub mod build_info;
pub mod config;
pub mod error;
pub mod org;
pub mod poll;
pub mod render;
#[cfg(test)]
pub mod testsupport;
pub mod types;
