use std::path::PathBuf;

/// Errors that can occur while reviewing a pull request.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary reports it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use mobrev_core::MobrevError;
///
/// let err = MobrevError::Config("missing OPENAI_API_KEY".into());
/// assert!(err.to_string().contains("OPENAI_API_KEY"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MobrevError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(mobrev::config),
        help("required: GITHUB_TOKEN, GITHUB_REPOSITORY, GITHUB_EVENT_PATH, OPENAI_API_KEY")
    )]
    Config(String),

    /// The event payload could not be read or decoded.
    #[error("event payload error: {0}")]
    Event(String),

    /// GitHub API failure.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
