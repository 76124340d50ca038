use std::collections::BTreeSet;
use std::sync::LazyLock;

use mobrev_core::PreparedFile;
use regex::Regex;

use crate::rubric::RubricLoader;

const SYSTEM_PROMPT: &str =
    "You are a senior staff mobile engineer reviewing pull requests with precision and practicality.";

const REVIEW_INSTRUCTIONS: &str = "\
You are an expert senior mobile engineer (Android/iOS). Review ONLY the provided diffs.
Produce:
1) High-level PR summary
2) Findings grouped: Correctness, Performance, Security, Readability/Maintainability, Testing/Coverage
3) Actionable suggestions (brief, with code snippet if needed)
4) Risk Assessment: Low/Medium/High + pre-merge checklist
5) TODOs / Follow-ups
Be concise and avoid speculation beyond the diffs.";

const NO_HINTS: &str = "Mobile (Android/iOS) code";
const NO_DESCRIPTION: &str = "(no description)";

/// Hint label and whether the rule also looks inside patches.
struct HintRule {
    label: &'static str,
    pattern: Regex,
    scans_patches: bool,
}

static HINT_RULES: LazyLock<Vec<HintRule>> = LazyLock::new(|| {
    let rule = |label, pattern: &str, scans_patches| HintRule {
        label,
        pattern: Regex::new(pattern).expect("valid hint regex"),
        scans_patches,
    };
    vec![
        rule("Android/Kotlin", r"\.(kt|kts|java)\b", false),
        rule("Jetpack Compose", r"(?i)\bcompose\b|@Composable\b", true),
        rule("iOS/Swift", r"\.(swift|mm|m)\b", false),
        rule("SwiftUI", r"\bSwiftUI\b|@State(Object)?\b", true),
        rule("Gradle/ProGuard", r"(?i)\bgradle(\.kts)?\b|\bproguard\b", false),
        rule("Info.plist", r"\bplist\b", false),
    ]
});

/// Build the system prompt used as the first chat message.
///
/// # Examples
///
/// ```
/// use mobrev_review::prompt::system_prompt;
///
/// assert!(system_prompt().contains("mobile engineer"));
/// ```
pub fn system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Guess which mobile stacks a change touches.
///
/// Extension rules look at filenames only; framework markers such as
/// `@Composable` or `SwiftUI` are also searched for in the patches.
///
/// # Examples
///
/// ```
/// use mobrev_core::{FileStatus, PreparedFile};
/// use mobrev_review::prompt::detect_mobile_context;
///
/// let file = PreparedFile {
///     filename: "app/build.gradle.kts".into(),
///     status: FileStatus::Modified,
///     additions: 1,
///     deletions: 0,
///     patch: "+implementation(libs.core)".into(),
/// };
/// assert_eq!(detect_mobile_context(&[file]), "Android/Kotlin, Gradle/ProGuard");
/// assert_eq!(detect_mobile_context(&[]), "Mobile (Android/iOS) code");
/// ```
pub fn detect_mobile_context(files: &[PreparedFile]) -> String {
    let names = files
        .iter()
        .map(|f| f.filename.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let hints: BTreeSet<&str> = HINT_RULES
        .iter()
        .filter(|rule| {
            rule.pattern.is_match(&names)
                || (rule.scans_patches && files.iter().any(|f| rule.pattern.is_match(&f.patch)))
        })
        .map(|rule| rule.label)
        .collect();

    if hints.is_empty() {
        NO_HINTS.to_string()
    } else {
        hints.into_iter().collect::<Vec<_>>().join(", ")
    }
}

fn file_block(file: &PreparedFile) -> String {
    format!(
        "FILE: {}\nSTATUS: {}\nCHANGES: +{} / -{}\nPATCH (trimmed):\n{}",
        file.filename,
        file.status,
        file.additions,
        file.deletions,
        file.patch.trim_end()
    )
}

/// Assemble the review prompt from an already-loaded rubric.
///
/// Deterministic: the same inputs always give the same text.
///
/// # Examples
///
/// ```
/// use mobrev_review::prompt::build_with_rubric;
///
/// let prompt = build_with_rubric("# Rubric", "Fix crash", "", &[]);
/// assert!(prompt.contains("PR TITLE: Fix crash"));
/// assert!(prompt.contains("(no description)"));
/// assert!(prompt.contains("--- BEGIN DIFFS ---"));
/// ```
pub fn build_with_rubric(
    rubric: &str,
    title: &str,
    body: &str,
    files: &[PreparedFile],
) -> String {
    let hints = detect_mobile_context(files);
    let body = if body.trim().is_empty() {
        NO_DESCRIPTION
    } else {
        body
    };
    let blocks = files.iter().map(file_block).collect::<Vec<_>>().join("\n\n");

    format!(
        "{REVIEW_INSTRUCTIONS}\n\n\
         {rubric}\n\n\
         Detected stack hints: {hints}\n\n\
         PR TITLE: {title}\n\n\
         PR DESCRIPTION:\n{body}\n\n\
         --- BEGIN DIFFS ---\n\
         {blocks}\n\
         --- END DIFFS ---\n"
    )
}

/// Builds review prompts, fetching the rubric for each one.
pub struct PromptBuilder {
    rubric: RubricLoader,
}

impl PromptBuilder {
    /// Builder that loads its rubric through `rubric`.
    pub fn new(rubric: RubricLoader) -> Self {
        Self { rubric }
    }

    /// Load the rubric and assemble the prompt. Rubric failures degrade to
    /// the fallback rubric, so this never fails.
    pub async fn build(&self, title: &str, body: &str, files: &[PreparedFile]) -> String {
        let rubric = self.rubric.load().await;
        build_with_rubric(&rubric, title, body, files)
    }
}
