//! Eligibility rules for changed files.
//!
//! A file is reviewed only if it matches none of the built-in ignore rules
//! (build output, dependency directories, binaries, lockfiles, IDE metadata)
//! and, when an eligible-glob list is configured, matches at least one glob.

use std::sync::LazyLock;

use mobrev_core::{ChangedFile, MobrevError, PreparedFile, ReviewConfig};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Longest line kept intact by [`sanitize_patch`].
pub const MAX_LINE_CHARS: usize = 2000;

/// Appended to every line cut by [`sanitize_patch`].
pub const TRIM_SUFFIX: &str = " …(trimmed)";

const IGNORE_PATTERNS: &[&str] = &[
    r"(^|/)(dist|build|outputs|out|coverage|node_modules|Pods|vendor|\.git)/",
    r"(^|/)DerivedData/",
    r"\.(min\.js|lock|png|jpg|jpeg|gif|svg|ico|pdf|zip|gz|tgz|jar|aab|apk|mp3|mp4|mov|webm|woff2?)$",
    r"(^|/)(package-lock\.json|yarn\.lock|pnpm-lock\.yaml|composer\.lock)$",
    r"(^|/)(\.gradle/|\.idea/|\.vs/)",
];

static IGNORE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    IGNORE_PATTERNS
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("built-in ignore pattern is valid")
        })
        .collect()
});

/// Decides which changed files are eligible for review.
///
/// # Examples
///
/// ```
/// use mobrev_difflens::filter::FileFilter;
///
/// let filter = FileFilter::new("*.kt,*.swift").unwrap();
/// assert!(filter.is_ignored("app/build/output.apk"));
/// assert!(filter.is_ignored("README.txt"));
/// assert!(!filter.is_ignored("app/src/main/MainActivity.kt"));
/// ```
#[derive(Debug, Clone)]
pub struct FileFilter {
    eligible: Option<Regex>,
}

impl FileFilter {
    /// Create a filter from a comma-separated glob list.
    ///
    /// Each glob becomes a suffix-anchored, case-insensitive pattern where
    /// `*` matches any run of characters. An empty list accepts every file
    /// that passes the ignore rules.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Config`] if the combined pattern cannot be compiled.
    pub fn new(file_globs: &str) -> Result<Self, MobrevError> {
        let eligible = compile_globs(file_globs)?;
        Ok(Self { eligible })
    }

    /// Create a filter from review configuration.
    ///
    /// # Errors
    ///
    /// Same as [`FileFilter::new`].
    pub fn from_config(config: &ReviewConfig) -> Result<Self, MobrevError> {
        Self::new(&config.file_globs)
    }

    /// Check if a file should be left out of the review.
    pub fn is_ignored(&self, filename: &str) -> bool {
        self.skip_reason(filename).is_some()
    }

    /// Why a file is left out, or `None` if it is eligible.
    ///
    /// Ignore rules take precedence over the glob list.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_difflens::filter::{FileFilter, SkipReason};
    ///
    /// let filter = FileFilter::new("*.kt").unwrap();
    /// assert_eq!(filter.skip_reason("yarn.lock"), Some(SkipReason::Ignored));
    /// assert_eq!(filter.skip_reason("main.py"), Some(SkipReason::NotEligible));
    /// assert_eq!(filter.skip_reason("Main.kt"), None);
    /// ```
    pub fn skip_reason(&self, filename: &str) -> Option<SkipReason> {
        if IGNORE_RULES.iter().any(|re| re.is_match(filename)) {
            return Some(SkipReason::Ignored);
        }
        if let Some(eligible) = &self.eligible {
            if !eligible.is_match(filename) {
                return Some(SkipReason::NotEligible);
            }
        }
        None
    }

    /// Filter and sanitize changed files in listing order.
    ///
    /// Stops as soon as `max_files` files have been kept; later files are
    /// not evaluated and do not appear in `skipped`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::{ChangedFile, FileStatus};
    /// use mobrev_difflens::filter::FileFilter;
    ///
    /// let files = vec![ChangedFile {
    ///     filename: "Main.kt".into(),
    ///     status: FileStatus::Added,
    ///     additions: 1,
    ///     deletions: 0,
    ///     patch: Some("+fun main() {}".into()),
    /// }];
    /// let filter = FileFilter::new("*.kt").unwrap();
    /// let result = filter.prepare(files, 12000, 25);
    /// assert_eq!(result.kept.len(), 1);
    /// ```
    pub fn prepare(
        &self,
        files: Vec<ChangedFile>,
        max_patch_chars: usize,
        max_files: usize,
    ) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            if kept.len() >= max_files {
                break;
            }
            if let Some(reason) = self.skip_reason(&file.filename) {
                debug!(file = %file.filename, %reason, "skipping file");
                skipped.push(SkippedFile {
                    filename: file.filename,
                    reason,
                });
                continue;
            }

            let patch = sanitize_patch(file.patch.as_deref().unwrap_or_default(), max_patch_chars);
            if patch.trim().is_empty() {
                debug!(file = %file.filename, "skipping file without a text patch");
                skipped.push(SkippedFile {
                    filename: file.filename,
                    reason: SkipReason::EmptyPatch,
                });
                continue;
            }

            kept.push(PreparedFile {
                filename: file.filename,
                status: file.status,
                additions: file.additions,
                deletions: file.deletions,
                patch,
            });
        }

        FilterResult { kept, skipped }
    }
}

fn compile_globs(globs: &str) -> Result<Option<Regex>, MobrevError> {
    let parts: Vec<String> = globs
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|g| {
            g.split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*")
        })
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }

    let pattern = format!("({})$", parts.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| MobrevError::Config(format!("invalid file globs '{globs}': {e}")))
}

/// Cap a patch at `max_chars` characters, then cut any line longer than
/// [`MAX_LINE_CHARS`] and mark it with [`TRIM_SUFFIX`].
///
/// Lines are rejoined with `\n`; a trailing newline is dropped.
///
/// # Examples
///
/// ```
/// use mobrev_difflens::filter::sanitize_patch;
///
/// assert_eq!(sanitize_patch("+a\n+b\n", 100), "+a\n+b");
/// assert_eq!(sanitize_patch("+abcdef", 3), "+ab");
/// assert_eq!(sanitize_patch("", 100), "");
/// ```
pub fn sanitize_patch(patch: &str, max_chars: usize) -> String {
    if patch.is_empty() {
        return String::new();
    }
    let capped = match patch.char_indices().nth(max_chars) {
        Some((idx, _)) => &patch[..idx],
        None => patch,
    };

    capped
        .lines()
        .map(|line| match line.char_indices().nth(MAX_LINE_CHARS) {
            Some((idx, _)) => format!("{}{TRIM_SUFFIX}", &line[..idx]),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result of preparing changed files.
#[derive(Debug, Clone, Default)]
pub struct FilterResult {
    /// Files that will be reviewed, in listing order.
    pub kept: Vec<PreparedFile>,
    /// Files that were evaluated and left out.
    pub skipped: Vec<SkippedFile>,
}

/// A file that was skipped during filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path of the skipped file.
    pub filename: String,
    /// Why the file was skipped.
    pub reason: SkipReason,
}

/// Reason a file was skipped.
///
/// # Examples
///
/// ```
/// use mobrev_difflens::filter::SkipReason;
///
/// assert_eq!(SkipReason::EmptyPatch.to_string(), "no text patch");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Build output, dependency, binary, lockfile or IDE path.
    Ignored,
    /// Did not match any configured glob.
    NotEligible,
    /// Binary, rename-only, or whitespace-only patch.
    EmptyPatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Ignored => write!(f, "ignored path"),
            SkipReason::NotEligible => write!(f, "no matching glob"),
            SkipReason::EmptyPatch => write!(f, "no text patch"),
        }
    }
}
