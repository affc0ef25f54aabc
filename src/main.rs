//! CLI entry point for sidekick.

mod cli;

use clap::Parser;
use sidekick::api::{AgentsApi, ApiClient};
use sidekick::config;
use sidekick::error::ApiError;
use sidekick::org::{CommandOrgResolver, OrgResolver};
use sidekick::poll::{find_latest_approval, PollOptions, PollOutcome, Poller};
use sidekick::render::{RenderSink, Renderer};
use sidekick::types::Task;
use tracing_subscriber::EnvFilter;

/// Web console base for the "view in browser" hint.
const CONSOLE_BASE_URL: &str = "https://app.sidekick.dev";

/// Environment variable controlling the tracing filter.
const LOG_ENV: &str = "SIDEKICK_LOG";

const LIST_PAGE_SIZE: usize = 20;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = cli::Args::parse();

    let mut config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(interval) = args.poll_interval {
        config.poll.interval_secs = interval;
    }
    if let Some(max_wait) = args.max_wait {
        config.poll.max_wait_secs = max_wait;
    }
    if args.no_color {
        config.display.color = false;
    }

    let renderer = Renderer::new(config.display.color);

    config.poll = match config.poll.validated() {
        Ok(poll) => poll,
        Err(e) => {
            renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };
    let poll_options = PollOptions::from(&config.poll);

    // Reject invalid flag combinations before any network call.
    let entities = match args.entity_context() {
        Ok(entities) => entities,
        Err(msg) => {
            renderer.error(&msg);
            std::process::exit(1);
        }
    };

    let client = match ApiClient::from_env(&config.base_url) {
        Ok(client) => client,
        Err(e) => {
            renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };

    let org = resolve_org(&args.org, config.org.as_deref(), &renderer).await;

    if args.list {
        match client.list_tasks(&org, LIST_PAGE_SIZE).await {
            Ok(tasks) => render_task_list(&renderer, &tasks),
            Err(e) => fatal_api(&renderer, "failed to list tasks", e),
        }
        return;
    }

    if args.approve || args.cancel {
        let Some(task_id) = args.task_id.as_deref() else {
            renderer.error("--task-id is required with --approve/--cancel");
            std::process::exit(1);
        };

        if args.cancel {
            match client.send_cancel(&org, task_id).await {
                Ok(()) => renderer.note("Cancellation sent."),
                Err(e) => fatal_api(&renderer, "failed to send cancellation", e),
            }
            return;
        }

        let approval_id = match args.approval_id.clone() {
            Some(id) => Some(id),
            None => find_latest_approval(&client, &org, task_id).await,
        };
        let Some(approval_id) = approval_id else {
            renderer.error("could not find an approval request id in the task's events");
            renderer.note("Specify one explicitly with --approval-id <id>.");
            std::process::exit(1);
        };
        match client.send_approval(&org, task_id, &approval_id).await {
            Ok(()) => {
                renderer.note("Approval sent. Continuing to watch...");
                watch_task(&client, &renderer, &org, task_id, poll_options).await;
            }
            Err(e) => fatal_api(&renderer, "failed to send approval", e),
        }
        return;
    }

    match (args.task_id.as_deref(), args.message.as_deref()) {
        // Watch an existing task.
        (Some(task_id), None) => {
            watch_task(&client, &renderer, &org, task_id, poll_options).await;
        }
        // Follow-up message to an existing task.
        (Some(task_id), Some(message)) => {
            match client.send_message(&org, task_id, message).await {
                Ok(()) => {
                    renderer.note("Message sent. Watching for a response...");
                    watch_task(&client, &renderer, &org, task_id, poll_options).await;
                }
                Err(e) => fatal_api(&renderer, "failed to send message", e),
            }
        }
        // Create a new task.
        (None, Some(message)) => {
            match client.create_task(&org, message, entities).await {
                Ok(task_id) => {
                    renderer.section("created task");
                    renderer.field("id", &task_id);
                    watch_task(&client, &renderer, &org, &task_id, poll_options).await;
                }
                Err(e) => fatal_api(&renderer, "failed to create task", e),
            }
        }
        (None, None) => {
            renderer.note(
                "Nothing to do. Pass --message to create a task, --task-id to watch one, or --list.",
            );
            renderer.note("See `sidekick --help` for examples.");
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Pick the organization: flag, then config default, then the platform CLI.
async fn resolve_org(flag: &Option<String>, configured: Option<&str>, renderer: &Renderer) -> String {
    if let Some(org) = flag.as_deref().map(str::trim).filter(|org| !org.is_empty()) {
        return org.to_string();
    }
    if let Some(org) = configured {
        return org.to_string();
    }
    if let Some(org) = CommandOrgResolver::default().default_org().await {
        renderer.field("organization", &org);
        return org;
    }
    renderer.error("could not detect an organization");
    renderer.note("Specify one with --org <organization>, or set `org` in sidekick.toml.");
    std::process::exit(1);
}

/// Drive the poll loop and translate its outcome into operator guidance.
async fn watch_task(
    client: &dyn AgentsApi,
    renderer: &Renderer,
    org: &str,
    task_id: &str,
    options: PollOptions,
) {
    renderer.section(&format!("watching task {task_id}"));
    renderer.field("console", &format!("{CONSOLE_BASE_URL}/{org}/tasks/{task_id}"));
    renderer.note(&"-".repeat(60));

    let mut poller = Poller::new(client, org, task_id, options);
    match poller.run(renderer).await {
        Ok(PollOutcome::Completed) => {
            renderer.note("");
            renderer.section("task completed");
        }
        Ok(PollOutcome::Failed) => {
            renderer.note("");
            renderer.section("task failed");
        }
        Ok(PollOutcome::AwaitingApproval {
            approval_request_id,
        }) => {
            renderer.note("");
            renderer.section("task is waiting for approval");
            renderer.field("request", &approval_request_id);
            renderer.note(&format!(
                "Approve: sidekick --org {org} --task-id {task_id} --approve"
            ));
            renderer.note(&format!(
                "Cancel:  sidekick --org {org} --task-id {task_id} --cancel"
            ));
        }
        Ok(PollOutcome::TimedOut) => {
            renderer.note("");
            renderer.section("watch timed out");
            renderer.note("The task may still be running server-side.");
            renderer.note(&format!(
                "Resume with: sidekick --org {org} --task-id {task_id}"
            ));
        }
        Err(e) => fatal_api(renderer, "failed to fetch task", e),
    }
}

fn render_task_list(renderer: &Renderer, tasks: &[Task]) {
    if tasks.is_empty() {
        renderer.note("No tasks found.");
        return;
    }
    renderer.section("tasks");
    for task in tasks {
        let created = task.created_at.as_deref().unwrap_or("-");
        renderer.field(&task.id, &format!("{:<20} {created}", task.status.to_string()));
    }
}

fn fatal_api(renderer: &Renderer, context: &str, err: ApiError) -> ! {
    renderer.error(&format!("{context}: {err}"));
    std::process::exit(1);
}
