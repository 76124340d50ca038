use std::fmt;
use std::path::Path;

use mobrev_core::{
    Credentials, MobrevConfig, MobrevError, PullRequest, ReviewConfig, RiskLevel,
};
use mobrev_difflens::filter::FileFilter;
use tracing::{debug, info, warn};

use crate::alert::{high_risk_message, SlackNotifier};
use crate::github::GitHubClient;
use crate::llm::{ChatMessage, LlmClient};
use crate::prompt::{self, PromptBuilder};
use crate::risk::parse_risk_level;
use crate::rubric::RubricLoader;

/// Sampling temperature for the review call.
pub const REVIEW_TEMPERATURE: f64 = 0.2;

/// Prepended to every posted review.
pub const COMMENT_HEADER: &str = "### 🤖 AI Mobile PR Review\n";

/// Appended to every posted review.
pub const COMMENT_FOOTER: &str =
    "\n\n---\n_This is an automated mobile-focused review. Please verify suggestions before applying._";

/// Posted instead of a review when filtering leaves nothing.
pub const NOTHING_TO_REVIEW: &str =
    "🤖 **AI Mobile PR Review**: No eligible text diffs to review (binary/ignored/empty).";

/// Comment posted when the model call or review post fails.
pub fn failure_comment(error: &str) -> String {
    format!("🤖 **AI Mobile PR Review** failed: `{error}`")
}

/// Wrap model output in the review header and footer.
///
/// # Examples
///
/// ```
/// use mobrev_review::pipeline::review_comment;
///
/// let body = review_comment("All good.");
/// assert!(body.starts_with("### 🤖 AI Mobile PR Review\nAll good."));
/// assert!(body.ends_with("Please verify suggestions before applying._"));
/// ```
pub fn review_comment(review: &str) -> String {
    format!("{COMMENT_HEADER}{review}{COMMENT_FOOTER}")
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The event carried no pull request; nothing was written.
    NotPullRequest,
    /// No file survived filtering; the notice comment was posted.
    NothingToReview,
    /// The review was posted.
    Reviewed {
        /// Risk label parsed from the review.
        risk: RiskLevel,
        /// Whether a high-risk alert was delivered.
        alerted: bool,
    },
    /// The model call or review post failed; the failure comment was posted.
    Failed {
        /// What went wrong.
        error: String,
    },
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewOutcome::NotPullRequest => f.write_str("not a pull request event"),
            ReviewOutcome::NothingToReview => f.write_str("no eligible diffs"),
            ReviewOutcome::Reviewed { risk, alerted } => {
                write!(f, "reviewed (risk: {risk}, alerted: {alerted})")
            }
            ReviewOutcome::Failed { error } => write!(f, "review failed: {error}"),
        }
    }
}

/// Drives one review run from event payload to posted comment.
///
/// Every step runs in order; nothing is retried. Fetching the changed files
/// is the only network failure that aborts the run. The model call and the
/// review post are reported back on the pull request instead.
pub struct ReviewPipeline {
    github: GitHubClient,
    llm: LlmClient,
    filter: FileFilter,
    prompts: PromptBuilder,
    notifier: SlackNotifier,
    review: ReviewConfig,
}

impl ReviewPipeline {
    /// Create a pipeline from already-built collaborators.
    pub fn new(
        github: GitHubClient,
        llm: LlmClient,
        filter: FileFilter,
        prompts: PromptBuilder,
        notifier: SlackNotifier,
        review: ReviewConfig,
    ) -> Self {
        Self {
            github,
            llm,
            filter,
            prompts,
            notifier,
            review,
        }
    }

    /// Wire up every collaborator from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the file globs
    /// do not compile.
    pub fn from_config(config: &MobrevConfig, credentials: &Credentials) -> Result<Self, MobrevError> {
        let github = GitHubClient::new(&credentials.github_token, &credentials.repository)?
            .with_api_url(&config.github.api_url);

        let mut llm_config = config.llm.clone();
        llm_config.api_key = Some(credentials.openai_api_key.clone());
        let llm = LlmClient::new(&llm_config)?;

        Ok(Self::new(
            github,
            llm,
            FileFilter::from_config(&config.review)?,
            PromptBuilder::new(RubricLoader::from_config(&config.review)),
            SlackNotifier::from_config(&config.alert),
            config.review.clone(),
        ))
    }

    /// Review the pull request named by the event payload at `event_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be read or decoded, if the
    /// changed files cannot be listed, or if posting a notice or failure
    /// comment fails.
    pub async fn run(&self, event_path: &Path) -> Result<ReviewOutcome, MobrevError> {
        match PullRequest::from_event_file(event_path)? {
            Some(pr) => self.review(&pr).await,
            None => {
                info!("not a pull request event, nothing to do");
                Ok(ReviewOutcome::NotPullRequest)
            }
        }
    }

    /// Review one pull request.
    ///
    /// # Errors
    ///
    /// See [`ReviewPipeline::run`].
    pub async fn review(&self, pr: &PullRequest) -> Result<ReviewOutcome, MobrevError> {
        info!(pr = pr.number, repo = self.github.repository(), "reviewing pull request");

        let changed = self.github.list_changed_files(pr.number).await?;
        let total = changed.len();
        let result = self
            .filter
            .prepare(changed, self.review.max_patch_chars, self.review.max_files);
        info!(
            total,
            kept = result.kept.len(),
            skipped = result.skipped.len(),
            "filtered changed files"
        );

        for file in &result.kept {
            debug!(file = %file.filename, chars = file.patch.chars().count(), "queued for review");
        }

        if result.kept.is_empty() {
            self.github.post_comment(pr.number, NOTHING_TO_REVIEW).await?;
            return Ok(ReviewOutcome::NothingToReview);
        }

        let user_prompt = self.prompts.build(&pr.title, &pr.body, &result.kept).await;

        match self.review_and_post(pr, user_prompt).await {
            Ok(review) => {
                let risk = parse_risk_level(&review);
                let alerted = self.alert_if_high(pr, risk, &review).await;
                info!(%risk, alerted, "review posted");
                Ok(ReviewOutcome::Reviewed { risk, alerted })
            }
            Err(e) => {
                warn!(error = %e, "review failed, reporting on pull request");
                let error = e.to_string();
                self.github
                    .post_comment(pr.number, &failure_comment(&error))
                    .await?;
                Ok(ReviewOutcome::Failed { error })
            }
        }
    }

    async fn review_and_post(
        &self,
        pr: &PullRequest,
        user_prompt: String,
    ) -> Result<String, MobrevError> {
        let messages = vec![
            ChatMessage::system(prompt::system_prompt()),
            ChatMessage::user(user_prompt),
        ];
        let review = self.llm.chat(messages, REVIEW_TEMPERATURE).await?;
        self.github.post_comment(pr.number, &review_comment(&review)).await?;
        Ok(review)
    }

    async fn alert_if_high(&self, pr: &PullRequest, risk: RiskLevel, review: &str) -> bool {
        if risk != RiskLevel::High || !self.notifier.is_enabled() {
            return false;
        }
        let message = high_risk_message(self.github.repository(), pr, review);
        self.notifier.notify(&message).await
    }
}
