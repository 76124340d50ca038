use std::time::Duration;

use mobrev_core::{AlertConfig, PullRequest};
use tracing::{debug, warn};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest review excerpt included in an alert, in characters.
pub const EXCERPT_CHARS: usize = 1000;

/// Best-effort Slack incoming-webhook notifier.
///
/// Disabled when no webhook is configured. Failures are logged and
/// swallowed; they never affect the review outcome.
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
    channel: Option<String>,
    timeout: Duration,
}

impl SlackNotifier {
    /// Notifier posting to `webhook_url`, optionally overriding the channel.
    /// `None` gives a disabled notifier.
    pub fn new(webhook_url: Option<&str>, channel: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.map(str::to_string),
            channel: channel.map(str::to_string),
            timeout: WEBHOOK_TIMEOUT,
        }
    }

    /// Notifier for the `[alert]` settings.
    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.webhook_url.as_deref(), config.channel.as_deref())
    }

    /// Whether a webhook is configured.
    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post `message`. Returns `true` only when the webhook accepted it.
    pub async fn notify(&self, message: &str) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            return false;
        };

        let mut payload = serde_json::json!({ "text": message });
        if let Some(channel) = &self.channel {
            payload["channel"] = serde_json::Value::String(channel.clone());
        }

        let result = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(_) => {
                debug!("slack alert delivered");
                true
            }
            Err(e) => {
                warn!(error = %e, "slack alert failed, continuing");
                false
            }
        }
    }
}

/// Compose the high-risk alert text.
///
/// # Examples
///
/// ```
/// use mobrev_core::PullRequest;
/// use mobrev_review::alert::high_risk_message;
///
/// let pr = PullRequest {
///     number: 7,
///     title: "Rewrite auth".into(),
///     body: String::new(),
///     html_url: "https://github.com/acme/app/pull/7".into(),
/// };
/// let text = high_risk_message("acme/app", &pr, "Risk Assessment: High");
/// assert!(text.contains("acme/app"));
/// assert!(text.contains("<https://github.com/acme/app/pull/7|#7 Rewrite auth>"));
/// ```
pub fn high_risk_message(repository: &str, pr: &PullRequest, review: &str) -> String {
    format!(
        ":rotating_light: *High-risk mobile PR* in `{repository}`\n<{}|#{} {}>\n\n{}",
        pr.html_url,
        pr.number,
        escape_mrkdwn(&pr.title),
        excerpt(review, EXCERPT_CHARS)
    )
}

/// Slack control characters; `&` first so entities are not double-escaped.
fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
