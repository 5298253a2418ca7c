//! Glob Matching
//!
//! Decides whether the set of files changed by a pull request satisfies a
//! label's match rule.

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

/// A single compiled glob pattern
///
/// A leading `!` negates the pattern: a path satisfies it only when it does
/// NOT match the remaining glob. An even number of leading `!` cancels out.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    matcher: GlobMatcher,
    negated: bool,
}

impl Pattern {
    /// Compile a glob pattern
    ///
    /// `*` and `?` never cross a `/`, `**` spans any number of directories,
    /// and dotfiles are matched like any other path.
    ///
    /// # Errors
    /// Returns an error if the glob syntax is invalid
    pub fn new(source: &str) -> Result<Self> {
        let bangs = source.chars().take_while(|&c| c == '!').count();
        let glob = &source[bangs..];

        let matcher = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::InvalidGlob {
                pattern: source.to_string(),
                source: e,
            })?
            .compile_matcher();

        Ok(Self {
            source: source.to_string(),
            matcher,
            negated: bangs % 2 == 1,
        })
    }

    /// Pattern text as written in the configuration
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern is negated
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Test a path against this pattern, honoring negation
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path) != self.negated
    }
}

/// Compile a list of glob patterns
///
/// # Errors
/// Returns the first compilation error
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>> {
    patterns.iter().map(|p| Pattern::new(p.as_ref())).collect()
}

/// Whether a path satisfies every pattern in the list
fn matches_every_pattern(path: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().all(|pattern| pattern.is_match(path))
}

/// `any` semantics: at least one file satisfies every pattern
pub fn check_any<S: AsRef<str>>(changed_files: &[S], patterns: &[Pattern]) -> bool {
    changed_files
        .iter()
        .any(|file| matches_every_pattern(file.as_ref(), patterns))
}

/// `all` semantics: every file satisfies every pattern
///
/// An empty file set is vacuously satisfied.
pub fn check_all<S: AsRef<str>>(changed_files: &[S], patterns: &[Pattern]) -> bool {
    changed_files
        .iter()
        .all(|file| matches_every_pattern(file.as_ref(), patterns))
}

/// Compiled form of one match configuration entry
#[derive(Debug, Clone, Default)]
pub struct MatchRule {
    /// Satisfied when some changed file matches all of these
    pub any: Option<Vec<Pattern>>,

    /// Satisfied when every changed file matches all of these
    pub all: Option<Vec<Pattern>>,
}

impl MatchRule {
    /// Shorthand form: a bare pattern is `{ any: [pattern] }`
    pub fn single(pattern: Pattern) -> Self {
        Self {
            any: Some(vec![pattern]),
            all: None,
        }
    }

    /// Whether the changed files satisfy every field this rule defines
    pub fn matches<S: AsRef<str>>(&self, changed_files: &[S]) -> bool {
        if let Some(all) = &self.all {
            if !check_all(changed_files, all) {
                return false;
            }
        }

        if let Some(any) = &self.any {
            if !check_any(changed_files, any) {
                return false;
            }
        }

        true
    }
}

/// A label together with the rule entries that select it
#[derive(Debug, Clone)]
pub struct LabelRule {
    /// Label name
    pub name: String,

    /// Alternative entries; the label applies if any of them matches
    pub entries: Vec<MatchRule>,
}

impl LabelRule {
    /// Whether the label applies to the changed files
    pub fn matches<S: AsRef<str>>(&self, changed_files: &[S]) -> bool {
        self.entries.iter().any(|entry| entry.matches(changed_files))
    }
}
