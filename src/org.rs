//! Default-organization resolution.
//!
//! The platform CLI knows the operator's default organization; when `--org`
//! is not given we ask it. Resolution sits behind a trait so tests and other
//! frontends can substitute their own lookup instead of a subprocess.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Injectable lookup for the organization to use when none was given.
#[async_trait]
pub trait OrgResolver: Send + Sync {
    async fn default_org(&self) -> Option<String>;
}

/// Resolves the default organization by running an external command.
///
/// Any failure (missing binary, non-zero exit, timeout, empty output) simply
/// yields `None`; the caller decides how to report the missing organization.
pub struct CommandOrgResolver {
    program: String,
    args: Vec<String>,
}

impl CommandOrgResolver {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for CommandOrgResolver {
    fn default() -> Self {
        Self::new("skyctl", vec!["org".to_string(), "get-default".to_string()])
    }
}

#[async_trait]
impl OrgResolver for CommandOrgResolver {
    async fn default_org(&self) -> Option<String> {
        let run = Command::new(&self.program).args(&self.args).output();
        let output = tokio::time::timeout(RESOLVE_TIMEOUT, run).await.ok()?.ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8(output.stdout).ok()?;
        let org = stdout.trim();
        if org.is_empty() {
            return None;
        }
        // A local state path means no cloud organization is configured.
        if org.starts_with('/') || org.starts_with("file://") {
            return None;
        }
        debug!(org, "resolved default organization");
        Some(org.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_trimmed_command_output() {
        let resolver = CommandOrgResolver::new("echo", vec!["  acme  ".to_string()]);
        assert_eq!(resolver.default_org().await.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn rejects_local_state_paths() {
        let resolver = CommandOrgResolver::new("echo", vec!["/home/user/.state".to_string()]);
        assert!(resolver.default_org().await.is_none());

        let resolver = CommandOrgResolver::new("echo", vec!["file:///tmp/state".to_string()]);
        assert!(resolver.default_org().await.is_none());
    }

    #[tokio::test]
    async fn failing_command_yields_none() {
        let resolver = CommandOrgResolver::new("false", Vec::new());
        assert!(resolver.default_org().await.is_none());
    }

    #[tokio::test]
    async fn missing_binary_yields_none() {
        let resolver = CommandOrgResolver::new("sidekick-no-such-binary", Vec::new());
        assert!(resolver.default_org().await.is_none());
    }

    #[tokio::test]
    async fn empty_output_yields_none() {
        let resolver = CommandOrgResolver::new("true", Vec::new());
        assert!(resolver.default_org().await.is_none());
    }
}
