//! CLI argument parsing via clap.

use clap::Parser;
use sidekick::build_info;
use sidekick::types::{EntityRef, Forge};

const AFTER_HELP: &str = "\
Examples:
  # Create a new task
  sidekick --org myorg --message \"Analyze my infrastructure\"

  # Create a task with stack context
  sidekick --org myorg -m \"Optimize this stack\" --stack-name prod --stack-project my-infra

  # Create a task with repository context
  sidekick --org myorg -m \"Review this code\" --repo-name my-repo --repo-org my-gh-org

  # List tasks
  sidekick --org myorg --list

  # Watch an existing task
  sidekick --org myorg --task-id task_abc123

  # Approve or cancel a pending request
  sidekick --org myorg --task-id task_abc123 --approve
  sidekick --org myorg --task-id task_abc123 --cancel";

/// Create and watch remote agent tasks from the terminal.
#[derive(Debug, Parser)]
#[command(name = "sidekick", version = &*build_info::cli_version_text().leak(), after_help = AFTER_HELP)]
pub struct Args {
    /// Organization name (auto-detected if not specified).
    #[arg(long)]
    pub org: Option<String>,

    /// Message to send; creates a new task unless --task-id is given.
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Existing task id to watch or respond to.
    #[arg(short = 't', long = "task-id")]
    pub task_id: Option<String>,

    /// List existing tasks.
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Approve the pending request on --task-id.
    #[arg(long, conflicts_with = "cancel")]
    pub approve: bool,

    /// Cancel the pending request on --task-id.
    #[arg(long)]
    pub cancel: bool,

    /// Explicit approval request id (auto-detected from the event log if omitted).
    #[arg(long = "approval-id")]
    pub approval_id: Option<String>,

    /// Stack name for context.
    #[arg(long = "stack-name")]
    pub stack_name: Option<String>,

    /// Stack project for context (required with --stack-name).
    #[arg(long = "stack-project")]
    pub stack_project: Option<String>,

    /// Repository name for context.
    #[arg(long = "repo-name")]
    pub repo_name: Option<String>,

    /// Repository organization for context (required with --repo-name).
    #[arg(long = "repo-org")]
    pub repo_org: Option<String>,

    /// Repository forge.
    #[arg(long = "repo-forge", value_enum, default_value_t = Forge::Github)]
    pub repo_forge: Forge,

    /// Seconds between polls.
    #[arg(long = "poll-interval", value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Maximum seconds to wait before the watch gives up.
    #[arg(long = "max-wait", value_name = "SECONDS")]
    pub max_wait: Option<u64>,

    /// Path to config file (default: ./sidekick.toml or ~/.config/sidekick/sidekick.toml).
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    /// Entity context for task creation, validated before any network call.
    ///
    /// Stack and repository fields must each come complete or not at all.
    pub fn entity_context(&self) -> Result<Vec<EntityRef>, String> {
        let mut entities = Vec::new();
        match (&self.stack_name, &self.stack_project) {
            (Some(name), Some(project)) => entities.push(EntityRef::Stack {
                name: name.clone(),
                project: project.clone(),
            }),
            (Some(_), None) => return Err("--stack-project is required with --stack-name".into()),
            (None, Some(_)) => return Err("--stack-name is required with --stack-project".into()),
            (None, None) => {}
        }
        match (&self.repo_name, &self.repo_org) {
            (Some(name), Some(org)) => entities.push(EntityRef::Repository {
                name: name.clone(),
                org: org.clone(),
                forge: self.repo_forge,
            }),
            (Some(_), None) => return Err("--repo-org is required with --repo-name".into()),
            (None, Some(_)) => return Err("--repo-name is required with --repo-org".into()),
            (None, None) => {}
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use sidekick::types::{EntityRef, Forge};

    #[test]
    fn parses_create_flags() {
        let args = Args::parse_from([
            "sidekick",
            "--org",
            "acme",
            "-m",
            "analyze my infrastructure",
            "--poll-interval",
            "2",
        ]);
        assert_eq!(args.org.as_deref(), Some("acme"));
        assert_eq!(args.message.as_deref(), Some("analyze my infrastructure"));
        assert_eq!(args.poll_interval, Some(2));
        assert!(!args.list);
    }

    #[test]
    fn approve_and_cancel_conflict() {
        let err = Args::try_parse_from(["sidekick", "-t", "task_1", "--approve", "--cancel"])
            .expect_err("flags are mutually exclusive");
        let text = err.to_string();
        assert!(text.contains("--approve"), "got: {text}");
        assert!(text.contains("--cancel"), "got: {text}");
    }

    #[test]
    fn forge_defaults_to_github_and_parses_choices() {
        let args = Args::parse_from(["sidekick"]);
        assert_eq!(args.repo_forge, Forge::Github);

        let args = Args::parse_from(["sidekick", "--repo-forge", "bitbucket"]);
        assert_eq!(args.repo_forge, Forge::Bitbucket);

        assert!(Args::try_parse_from(["sidekick", "--repo-forge", "sourcehut"]).is_err());
    }

    #[test]
    fn stack_name_without_project_is_rejected() {
        let args = Args::parse_from(["sidekick", "--stack-name", "prod"]);
        let err = args.entity_context().expect_err("incomplete stack context");
        assert!(err.contains("--stack-project"), "got: {err}");
    }

    #[test]
    fn complete_stack_context_yields_one_entity() {
        let args = Args::parse_from([
            "sidekick",
            "--stack-name",
            "prod",
            "--stack-project",
            "my-infra",
        ]);
        let entities = args.entity_context().expect("valid stack context");
        assert_eq!(
            entities,
            vec![EntityRef::Stack {
                name: "prod".to_string(),
                project: "my-infra".to_string(),
            }]
        );
    }

    #[test]
    fn repo_context_carries_the_selected_forge() {
        let args = Args::parse_from([
            "sidekick",
            "--repo-name",
            "my-repo",
            "--repo-org",
            "my-gl-org",
            "--repo-forge",
            "gitlab",
        ]);
        let entities = args.entity_context().expect("valid repo context");
        assert_eq!(
            entities,
            vec![EntityRef::Repository {
                name: "my-repo".to_string(),
                org: "my-gl-org".to_string(),
                forge: Forge::Gitlab,
            }]
        );
    }

    #[test]
    fn repo_name_without_org_is_rejected() {
        let args = Args::parse_from(["sidekick", "--repo-name", "my-repo"]);
        let err = args.entity_context().expect_err("incomplete repo context");
        assert!(err.contains("--repo-org"), "got: {err}");
    }
}
