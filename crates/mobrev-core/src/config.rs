use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MobrevError;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".mobrev.toml";

const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
const ENV_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_MODEL_NAME: &str = "MODEL_NAME";
const ENV_MAX_PATCH_CHARS: &str = "MAX_PATCH_CHARS";
const ENV_MAX_FILES: &str = "MAX_FILES";
const ENV_FILE_GLOBS: &str = "FILE_GLOBS";
const ENV_RUBRIC_URL: &str = "RUBRIC_URL";
const ENV_RUBRIC_TOKEN: &str = "RUBRIC_TOKEN";
const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
const ENV_SLACK_CHANNEL: &str = "SLACK_CHANNEL";

/// Top-level configuration.
///
/// Resolution order: built-in defaults < `.mobrev.toml` < environment variables.
/// Secrets normally only come from the environment.
///
/// # Examples
///
/// ```
/// use mobrev_core::MobrevConfig;
///
/// let config = MobrevConfig::default();
/// assert_eq!(config.review.max_files, 25);
/// assert_eq!(config.llm.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MobrevConfig {
    /// Code-host settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Chat alert settings.
    #[serde(default)]
    pub alert: AlertConfig,
}

impl MobrevConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Io`] if the file cannot be read, or
    /// [`MobrevError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, MobrevError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::MobrevConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_files = 10
    /// "#;
    /// let config = MobrevConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_files, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, MobrevError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the full configuration for a run.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present. Process environment variables are layered on top.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::FileNotFound`] for a missing explicit file, or
    /// any error from [`MobrevConfig::from_file`] and [`MobrevConfig::apply_env`].
    pub fn load(path: Option<&Path>) -> Result<Self, MobrevError> {
        let mut config = match path {
            Some(p) if !p.exists() => return Err(MobrevError::FileNotFound(p.to_path_buf())),
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay values read through `lookup` (normally the process environment).
    ///
    /// Empty `RUBRIC_URL` disables the remote rubric and empty `FILE_GLOBS`
    /// disables the eligible-extension check. Other empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Config`] if a numeric variable does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::MobrevConfig;
    ///
    /// let mut config = MobrevConfig::default();
    /// config
    ///     .apply_env(|name| (name == "MAX_FILES").then(|| "5".to_string()))
    ///     .unwrap();
    /// assert_eq!(config.review.max_files, 5);
    /// ```
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), MobrevError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_GITHUB_TOKEN) {
            self.github.token = Some(v);
        }
        if let Some(v) = non_empty(ENV_REPOSITORY) {
            self.github.repository = Some(v);
        }
        if let Some(v) = non_empty(ENV_EVENT_PATH) {
            self.github.event_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty(ENV_GITHUB_API_URL) {
            self.github.api_url = v;
        }
        if let Some(v) = non_empty(ENV_OPENAI_API_KEY) {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = non_empty(ENV_OPENAI_BASE_URL) {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = non_empty(ENV_MODEL_NAME) {
            self.llm.model = v;
        }
        if let Some(v) = non_empty(ENV_MAX_PATCH_CHARS) {
            self.review.max_patch_chars = parse_count(ENV_MAX_PATCH_CHARS, &v)?;
        }
        if let Some(v) = non_empty(ENV_MAX_FILES) {
            self.review.max_files = parse_count(ENV_MAX_FILES, &v)?;
        }
        if let Some(v) = lookup(ENV_FILE_GLOBS) {
            self.review.file_globs = v;
        }
        if let Some(v) = lookup(ENV_RUBRIC_URL) {
            self.review.rubric_url = v;
        }
        if let Some(v) = non_empty(ENV_RUBRIC_TOKEN) {
            self.review.rubric_token = Some(v);
        }
        if let Some(v) = non_empty(ENV_SLACK_WEBHOOK_URL) {
            self.alert.webhook_url = Some(v);
        }
        if let Some(v) = non_empty(ENV_SLACK_CHANNEL) {
            self.alert.channel = Some(v);
        }
        Ok(())
    }

    /// Check that every required setting is present and return them.
    ///
    /// Must succeed before any network activity.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Config`] naming every missing variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::MobrevConfig;
    ///
    /// let err = MobrevConfig::default().credentials().unwrap_err();
    /// assert!(err.to_string().contains("GITHUB_TOKEN"));
    /// ```
    pub fn credentials(&self) -> Result<Credentials, MobrevError> {
        fn present(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let github_token = present(self.github.token.as_deref());
        let repository = present(self.github.repository.as_deref());
        let event_path = self
            .github
            .event_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty());
        let openai_api_key = present(self.llm.api_key.as_deref());

        let mut missing = Vec::new();
        if github_token.is_none() {
            missing.push(ENV_GITHUB_TOKEN);
        }
        if repository.is_none() {
            missing.push(ENV_REPOSITORY);
        }
        if event_path.is_none() {
            missing.push(ENV_EVENT_PATH);
        }
        if openai_api_key.is_none() {
            missing.push(ENV_OPENAI_API_KEY);
        }

        match (github_token, repository, event_path, openai_api_key) {
            (Some(github_token), Some(repository), Some(event_path), Some(openai_api_key)) => {
                Ok(Credentials {
                    github_token,
                    repository,
                    event_path,
                    openai_api_key,
                })
            }
            _ => Err(MobrevError::Config(format!(
                "missing required env vars: {}",
                missing.join(" / ")
            ))),
        }
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize, MobrevError> {
    value.trim().parse().map_err(|_| {
        MobrevError::Config(format!(
            "{name} must be a non-negative integer, got '{value}'"
        ))
    })
}

/// The four settings a run cannot start without.
///
/// Only obtainable through [`MobrevConfig::credentials`].
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bearer token for the code host.
    pub github_token: String,
    /// Repository identifier, `owner/name`.
    pub repository: String,
    /// Location of the triggering event payload.
    pub event_path: PathBuf,
    /// Model provider API key.
    pub openai_api_key: String,
}

/// Code-host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API token. Usually supplied via `GITHUB_TOKEN`.
    pub token: Option<String>,
    /// Repository identifier, `owner/name`.
    pub repository: Option<String>,
    /// Path to the pull-request event JSON.
    pub event_path: Option<PathBuf>,
    /// REST API base URL (default: `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            event_path: None,
            api_url: default_github_api_url(),
        }
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use mobrev_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// assert!(config.base_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use mobrev_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_patch_chars, 12000);
/// assert_eq!(config.max_files, 25);
/// assert!(config.file_globs.contains("*.kt"));
/// assert!(config.rubric_location().is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Character budget for each file's patch (default: 12000).
    #[serde(default = "default_max_patch_chars")]
    pub max_patch_chars: usize,
    /// Maximum number of files sent to the model (default: 25).
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Comma-separated globs a file must match to be reviewed. Empty means any.
    #[serde(default = "default_file_globs")]
    pub file_globs: String,
    /// Where to fetch the review rubric from. Empty disables the fetch.
    #[serde(default = "default_rubric_url")]
    pub rubric_url: String,
    /// Bearer token for private rubric locations.
    pub rubric_token: Option<String>,
}

fn default_max_patch_chars() -> usize {
    12000
}

fn default_max_files() -> usize {
    25
}

fn default_file_globs() -> String {
    "*.kt,*.kts,*.java,*.xml,*.swift,*.m,*.mm,*.gradle,*.gradle.kts,*.pro,*.plist,*.md".into()
}

fn default_rubric_url() -> String {
    "https://raw.githubusercontent.com/Ahabdelhak/ai-mobile-pr-reviewer/main/rubric/mobile_review.md"
        .into()
}

impl ReviewConfig {
    /// The rubric URL, or `None` when the remote rubric is disabled.
    pub fn rubric_location(&self) -> Option<&str> {
        let url = self.rubric_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_patch_chars: default_max_patch_chars(),
            max_files: default_max_files(),
            file_globs: default_file_globs(),
            rubric_url: default_rubric_url(),
            rubric_token: None,
        }
    }
}

/// Chat alert configuration. Alerting is off unless a webhook is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Incoming-webhook URL.
    pub webhook_url: Option<String>,
    /// Channel override sent with each alert.
    pub channel: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GITHUB_TOKEN", "ghp_test"),
            ("GITHUB_REPOSITORY", "acme/app"),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = MobrevConfig::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.review.max_patch_chars, 12000);
        assert_eq!(config.review.max_files, 25);
        assert!(config.review.file_globs.contains("*.swift"));
        assert!(config.review.rubric_url.starts_with("https://"));
        assert!(config.alert.webhook_url.is_none());
    }

    #[test]
    fn env_supplies_credentials() {
        let mut config = MobrevConfig::default();
        config.apply_env(env(&required())).unwrap();
        let creds = config.credentials().unwrap();
        assert_eq!(creds.github_token, "ghp_test");
        assert_eq!(creds.repository, "acme/app");
        assert_eq!(creds.event_path, PathBuf::from("/tmp/event.json"));
        assert_eq!(creds.openai_api_key, "sk-test");
    }

    #[test]
    fn missing_required_vars_are_all_named() {
        let mut config = MobrevConfig::default();
        config
            .apply_env(env(&[("GITHUB_TOKEN", "ghp_test"), ("OPENAI_API_KEY", "")]))
            .unwrap();
        let err = config.credentials().unwrap_err().to_string();
        assert!(!err.contains("GITHUB_TOKEN"));
        assert!(err.contains("GITHUB_REPOSITORY"));
        assert!(err.contains("GITHUB_EVENT_PATH"));
        assert!(err.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn whitespace_only_secret_counts_as_missing() {
        let mut config = MobrevConfig::default();
        config.github.token = Some("   ".into());
        let err = config.credentials().unwrap_err().to_string();
        assert!(err.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn optional_env_overrides_defaults() {
        let mut config = MobrevConfig::default();
        config
            .apply_env(env(&[
                ("MODEL_NAME", "gpt-4o"),
                ("MAX_PATCH_CHARS", "500"),
                ("MAX_FILES", "3"),
                ("FILE_GLOBS", "*.swift"),
                ("SLACK_WEBHOOK_URL", "https://hooks.example.com/x"),
                ("SLACK_CHANNEL", "#mobile"),
                ("GITHUB_API_URL", "https://ghe.example.com/api/v3"),
            ]))
            .unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.review.max_patch_chars, 500);
        assert_eq!(config.review.max_files, 3);
        assert_eq!(config.review.file_globs, "*.swift");
        assert_eq!(
            config.alert.webhook_url.as_deref(),
            Some("https://hooks.example.com/x")
        );
        assert_eq!(config.alert.channel.as_deref(), Some("#mobile"));
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn empty_rubric_url_disables_rubric() {
        let mut config = MobrevConfig::default();
        config.apply_env(env(&[("RUBRIC_URL", "")])).unwrap();
        assert!(config.review.rubric_location().is_none());
    }

    #[test]
    fn empty_file_globs_disables_glob_check() {
        let mut config = MobrevConfig::default();
        config.apply_env(env(&[("FILE_GLOBS", "")])).unwrap();
        assert!(config.review.file_globs.is_empty());
    }

    #[test]
    fn empty_model_name_keeps_default() {
        let mut config = MobrevConfig::default();
        config.apply_env(env(&[("MODEL_NAME", "")])).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_number_is_config_error() {
        let mut config = MobrevConfig::default();
        let err = config
            .apply_env(env(&[("MAX_FILES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, MobrevError::Config(_)));
        assert!(err.to_string().contains("MAX_FILES"));
    }

    #[test]
    fn parse_full_toml() {
        let toml = r##"
[github]
api_url = "https://ghe.example.com/api/v3"

[llm]
model = "gpt-4o"
base_url = "http://localhost:11434"

[review]
max_patch_chars = 8000
max_files = 10
file_globs = "*.kt,*.swift"
rubric_url = ""

[alert]
webhook_url = "https://hooks.slack.com/services/T/B/X"
channel = "#mobile-reviews"
"##;
        let config = MobrevConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.review.max_patch_chars, 8000);
        assert_eq!(config.review.max_files, 10);
        assert!(config.review.rubric_location().is_none());
        assert_eq!(config.alert.channel.as_deref(), Some("#mobile-reviews"));
    }

    #[test]
    fn env_wins_over_file() {
        let mut config = MobrevConfig::from_toml("[review]\nmax_files = 10\n").unwrap();
        config.apply_env(env(&[("MAX_FILES", "2")])).unwrap();
        assert_eq!(config.review.max_files, 2);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = MobrevConfig::from_toml("").unwrap();
        assert_eq!(config.review.max_files, 25);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = MobrevConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = MobrevConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, MobrevError::FileNotFound(_)));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mobrev.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4.1\"\n").unwrap();
        let config = MobrevConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.model, "gpt-4.1");
    }
}
