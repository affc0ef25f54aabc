//! Configuration loading from TOML files and environment variables.
//!
//! Config is resolved in this order of precedence (highest wins):
//! 1. CLI flags (applied by the binary after loading).
//! 2. Environment variables (`SIDEKICK_API_TOKEN`, `SIDEKICK_BASE_URL`).
//! 3. TOML file specified via --config.
//! 4. ./sidekick.toml in the current directory.
//! 5. $XDG_CONFIG_HOME/sidekick/sidekick.toml (or the platform equivalent).
//! 6. Built-in defaults.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Environment variable supplying the API auth token. Required.
pub const TOKEN_ENV: &str = "SIDEKICK_API_TOKEN";

/// Environment variable overriding the API base endpoint.
pub const BASE_URL_ENV: &str = "SIDEKICK_BASE_URL";

/// Default base endpoint for the agents API.
pub const DEFAULT_BASE_URL: &str = "https://api.sidekick.dev/api/preview/agents";

const CONFIG_FILE_NAME: &str = "sidekick.toml";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_MAX_WAIT_SECS: u64 = 600;

/// Top-level runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Default organization when --org is omitted.
    pub org: Option<String>,
    pub poll: PollConfig,
    pub display: DisplayConfig,
}

/// Polling cadence settings stored under `[poll]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }
}

impl PollConfig {
    /// Clamp the interval to a sane floor and reject a zero wait budget.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.max_wait_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll.max_wait_secs must be at least 1".to_string(),
            ));
        }
        self.interval_secs = self.interval_secs.max(1);
        Ok(self)
    }
}

/// Display / rendering preferences stored under `[display]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Raw file shape; every field optional so partial files merge cleanly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    base_url: Option<String>,
    org: Option<String>,
    poll: PollConfig,
    display: DisplayConfig,
}

/// Load configuration, optionally from an explicit file path.
///
/// A missing explicit file is an error; missing default-location files are
/// not. The auth token is not loaded here; it is resolved at client
/// construction so `--help` and argument validation never require it.
pub fn load_config(explicit_path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(explicit_path, |key| std::env::var(key).ok())
}

fn load_config_with(
    explicit_path: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let file = load_file_config(explicit_path)?;

    let base_url = env(BASE_URL_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or(file.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(Config {
        base_url,
        org: file.org.filter(|org| !org.trim().is_empty()),
        poll: file.poll.validated()?,
        display: file.display,
    })
}

fn load_file_config(explicit_path: Option<&str>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let text = fs::read_to_string(path)?;
        return Ok(toml::from_str(&text)?);
    }
    for candidate in default_config_paths() {
        match fs::read_to_string(&candidate) {
            Ok(text) => return Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(FileConfig::default())
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("sidekick").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Resolve the required auth token from the environment.
pub fn auth_token_from_env() -> Result<String, ConfigError> {
    auth_token_with(|key| std::env::var(key).ok())
}

fn auth_token_with(env: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    env(TOKEN_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "{TOKEN_ENV} environment variable not set. Set it with: export {TOKEN_ENV}=<your-token>"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    fn no_env(_key: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let fixture = TestTempDir::new("config-defaults");
        let path = fixture.write_text("sidekick.toml", "");
        let config = load_config_with(Some(path.to_str().unwrap()), no_env).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.org.is_none());
        assert_eq!(config.poll, PollConfig::default());
        assert!(config.display.color);
    }

    #[test]
    fn file_values_override_defaults() {
        let fixture = TestTempDir::new("config-file");
        let path = fixture.write_text(
            "sidekick.toml",
            r#"
base_url = "https://staging.example.com/agents"
org = "acme"

[poll]
interval_secs = 2
max_wait_secs = 120

[display]
color = false
"#,
        );
        let config = load_config_with(Some(path.to_str().unwrap()), no_env).unwrap();
        assert_eq!(config.base_url, "https://staging.example.com/agents");
        assert_eq!(config.org.as_deref(), Some("acme"));
        assert_eq!(config.poll.interval_secs, 2);
        assert_eq!(config.poll.max_wait_secs, 120);
        assert!(!config.display.color);
    }

    #[test]
    fn env_base_url_beats_file_value() {
        let fixture = TestTempDir::new("config-env");
        let path = fixture.write_text("sidekick.toml", "base_url = \"https://file.example.com\"");
        let config = load_config_with(Some(path.to_str().unwrap()), |key| {
            (key == BASE_URL_ENV).then(|| "https://env.example.com".to_string())
        })
        .unwrap();
        assert_eq!(config.base_url, "https://env.example.com");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_with(Some("/nonexistent/sidekick.toml"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "got: {err}");
    }

    #[test]
    fn malformed_file_reports_toml_error() {
        let fixture = TestTempDir::new("config-bad");
        let path = fixture.write_text("sidekick.toml", "org = [unclosed");
        let err = load_config_with(Some(path.to_str().unwrap()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "got: {err}");
    }

    #[test]
    fn zero_interval_clamps_to_one_second() {
        let poll = PollConfig {
            interval_secs: 0,
            max_wait_secs: 60,
        }
        .validated()
        .unwrap();
        assert_eq!(poll.interval_secs, 1);
    }

    #[test]
    fn zero_max_wait_is_rejected() {
        let err = PollConfig {
            interval_secs: 5,
            max_wait_secs: 0,
        }
        .validated()
        .unwrap_err();
        assert!(err.to_string().contains("max_wait_secs"), "got: {err}");
    }

    #[test]
    fn token_resolution_requires_a_non_empty_value() {
        let token = auth_token_with(|key| {
            (key == TOKEN_ENV).then(|| "  tok_secret  ".to_string())
        })
        .unwrap();
        assert_eq!(token, "tok_secret");

        let err = auth_token_with(no_env).unwrap_err();
        assert!(err.to_string().contains(TOKEN_ENV), "got: {err}");

        let err = auth_token_with(|_| Some("   ".to_string())).unwrap_err();
        assert!(err.to_string().contains(TOKEN_ENV), "got: {err}");
    }
}
