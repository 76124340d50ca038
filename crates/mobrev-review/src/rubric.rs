use std::time::Duration;

use mobrev_core::ReviewConfig;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const FALLBACK_RUBRIC: &str = "\
# AI Mobile PR Review Rubric (Fallback)

## Correctness
- Android lifecycle & coroutines; iOS ARC & SwiftUI state; proper async/error handling.

## Performance
- Avoid UI-thread blocking; efficient Compose/SwiftUI updates; memory/caching.

## Security
- No hardcoded secrets; secure storage (EncryptedSharedPreferences/Keychain); TLS/HTTPS; WebView safety.

## Readability / Maintainability
- Clean architecture (MVVM/MVI); DI; idiomatic Kotlin/Swift.

## Testing / Coverage
- Unit tests for ViewModels/UseCases; UI tests; offline/retry edge cases.
";

/// The built-in rubric, optionally annotated with why the remote one was
/// not used.
///
/// # Examples
///
/// ```
/// use mobrev_review::rubric::fallback_rubric;
///
/// let plain = fallback_rubric(None);
/// assert!(plain.contains("Fallback"));
/// assert!(!plain.contains("Failed to load"));
///
/// let annotated = fallback_rubric(Some(("https://x/r.md", "timed out")));
/// assert!(annotated.contains("Failed to load rubric from https://x/r.md: timed out"));
/// ```
pub fn fallback_rubric(failure: Option<(&str, &str)>) -> String {
    match failure {
        Some((url, reason)) => {
            format!("{FALLBACK_RUBRIC}\n(⚠️ Failed to load rubric from {url}: {reason})\n")
        }
        None => FALLBACK_RUBRIC.to_string(),
    }
}

/// Fetches the team's review rubric, degrading to [`fallback_rubric`].
pub struct RubricLoader {
    http: reqwest::Client,
    url: Option<String>,
    token: Option<String>,
    timeout: Duration,
}

impl RubricLoader {
    /// Loader for `url`; `None` always yields the unannotated fallback.
    pub fn new(url: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.map(str::to_string),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loader for the configured rubric location and token. An empty
    /// location disables the fetch.
    pub fn from_config(config: &ReviewConfig) -> Self {
        let loader = Self::new(config.rubric_location());
        match config.rubric_token.as_deref() {
            Some(token) => loader.with_token(token),
            None => loader,
        }
    }

    /// Send `token` as a bearer credential (private rubric repositories).
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Override the 10 s fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the rubric text. Never fails: any fetch problem is logged and
    /// answered with the annotated fallback.
    pub async fn load(&self) -> String {
        let Some(url) = self.url.as_deref() else {
            debug!("no rubric location configured, using fallback");
            return fallback_rubric(None);
        };

        match self.fetch(url).await {
            Ok(text) => {
                debug!(url, chars = text.len(), "rubric loaded");
                text
            }
            Err(e) => {
                warn!(url, error = %e, "rubric fetch failed, using fallback");
                let reason = e.to_string();
                fallback_rubric(Some((url, reason.as_str())))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let mut request = self.http.get(url).timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await?.error_for_status()?.text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RUBRIC: &str = "# Team Rubric\n\n- Prefer StateFlow over LiveData\n";

    #[tokio::test]
    async fn returns_remote_rubric_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rubric.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RUBRIC))
            .expect(1)
            .mount(&server)
            .await;

        let loader = RubricLoader::new(Some(&format!("{}/rubric.md", server.uri())));
        assert_eq!(loader.load().await, RUBRIC);
    }

    #[tokio::test]
    async fn error_status_falls_back_with_annotation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/rubric.md", server.uri());
        let text = RubricLoader::new(Some(&url)).load().await;
        assert!(text.contains("Fallback"));
        assert!(text.contains(&format!("Failed to load rubric from {url}")));
        assert!(text.contains("404"));
    }

    #[tokio::test]
    async fn slow_endpoint_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RUBRIC)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let text = RubricLoader::new(Some(&server.uri()))
            .with_timeout(Duration::from_millis(100))
            .load()
            .await;
        assert!(text.contains("Fallback"));
        assert!(!text.contains("Prefer StateFlow"));
    }

    #[tokio::test]
    async fn no_location_gives_plain_fallback() {
        let text = RubricLoader::new(None).load().await;
        assert!(text.starts_with("# AI Mobile PR Review Rubric (Fallback)"));
        assert!(!text.contains("Failed to load"));
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer rubric-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RUBRIC))
            .expect(1)
            .mount(&server)
            .await;

        let text = RubricLoader::new(Some(&server.uri()))
            .with_token("rubric-secret")
            .load()
            .await;
        assert_eq!(text, RUBRIC);
    }

    #[test]
    fn from_config_respects_disabled_location() {
        let config = ReviewConfig {
            rubric_url: "  ".into(),
            ..ReviewConfig::default()
        };
        assert!(RubricLoader::from_config(&config).url.is_none());
    }

    #[test]
    fn fallback_covers_every_section() {
        let text = fallback_rubric(None);
        for section in [
            "## Correctness",
            "## Performance",
            "## Security",
            "## Readability / Maintainability",
            "## Testing / Coverage",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
    }
}
