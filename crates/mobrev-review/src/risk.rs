use std::sync::LazyLock;

use mobrev_core::RiskLevel;
use regex::Regex;

static ASSESSMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\brisk\s+assessment[\s*_:\-]*(low|medium|high)(?:[^A-Za-z0-9]|$)")
        .expect("valid risk assessment regex")
});

static HIGH_RISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhigh\s+risk\b").expect("valid high risk regex"));

/// Extract the risk label from review text.
///
/// Looks for `Risk Assessment: <Low|Medium|High>` first, tolerating markdown
/// emphasis around the label. Failing that, a standalone "high risk" counts as
/// high. Anything else is low.
///
/// # Examples
///
/// ```
/// use mobrev_core::RiskLevel;
/// use mobrev_review::risk::parse_risk_level;
///
/// assert_eq!(parse_risk_level("**Risk Assessment:** Medium"), RiskLevel::Medium);
/// assert_eq!(parse_risk_level("This is a high risk change."), RiskLevel::High);
/// assert_eq!(parse_risk_level("LGTM"), RiskLevel::Low);
/// ```
pub fn parse_risk_level(review: &str) -> RiskLevel {
    if let Some(level) = ASSESSMENT
        .captures(review)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
    {
        return level;
    }
    if HIGH_RISK.is_match(review) {
        RiskLevel::High
    } else {
        RiskLevel::Low
    }
}
