use std::time::Duration;

use mobrev_core::{ChangedFile, MobrevError};
use tracing::{debug, instrument};

/// Items requested per page when listing changed files.
pub const PAGE_SIZE: usize = 100;

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub REST client scoped to one repository.
///
/// Reads the files changed by a pull request and writes issue comments.
/// Every request carries the bearer token; any non-2xx response is an error.
///
/// # Examples
///
/// ```
/// use mobrev_review::github::GitHubClient;
///
/// let client = GitHubClient::new("ghp_xxxx", "acme/app")
///     .unwrap()
///     .with_api_url("https://ghe.example.com/api/v3/");
/// assert_eq!(client.repository(), "acme/app");
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    repository: String,
    token: String,
}

impl GitHubClient {
    /// Create a client for `repository` (`owner/name`).
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::GitHub`] if the HTTP client cannot be built.
    pub fn new(token: &str, repository: &str) -> Result<Self, MobrevError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mobrev/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MobrevError::GitHub(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
        })
    }

    /// Point the client at a different API root (GitHub Enterprise, tests).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// The `owner/name` this client talks to.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn repo_url(&self, endpoint: &str) -> String {
        format!("{}/repos/{}/{endpoint}", self.api_url, self.repository)
    }

    /// Fetch every file changed by a pull request.
    ///
    /// Requests pages of [`PAGE_SIZE`] starting at page 1 and stops at the
    /// first page holding fewer items.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::GitHub`] on network errors, non-2xx responses,
    /// or undecodable bodies. Nothing is retried.
    #[instrument(skip(self), fields(repo = %self.repository))]
    pub async fn list_changed_files(&self, pr_number: u64) -> Result<Vec<ChangedFile>, MobrevError> {
        let url = self.repo_url(&format!("pulls/{pr_number}/files"));
        let mut files = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .http
                .get(&url)
                .query(&[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())])
                .header("Accept", "application/vnd.github+json")
                .bearer_auth(&self.token)
                .timeout(READ_TIMEOUT)
                .send()
                .await
                .map_err(|e| MobrevError::GitHub(format!("failed to list changed files: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MobrevError::GitHub(format!(
                    "GitHub API error {status}: {body}"
                )));
            }

            let chunk: Vec<ChangedFile> = response
                .json()
                .await
                .map_err(|e| MobrevError::GitHub(format!("failed to decode changed files: {e}")))?;
            debug!(page, count = chunk.len(), "fetched changed-file page");

            let last_page = chunk.len() < PAGE_SIZE;
            files.extend(chunk);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Post a comment on the pull request's conversation.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::GitHub`] on network errors or non-2xx responses.
    #[instrument(skip(self, body), fields(repo = %self.repository, chars = body.len()))]
    pub async fn post_comment(&self, pr_number: u64, body: &str) -> Result<(), MobrevError> {
        let url = self.repo_url(&format!("issues/{pr_number}/comments"));

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .timeout(WRITE_TIMEOUT)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| MobrevError::GitHub(format!("failed to post comment: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MobrevError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        debug!("comment posted");
        Ok(())
    }
}
