//! Pull Request Labeling
//!
//! Computes and applies the labels a single pull request should carry

use crate::config::LabelRules;
use crate::error::Result;
use crate::github::{PullRequest, PullRequestService};

/// Outcome of labeling one pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutcome {
    /// No rule matched; nothing was done
    NoMatch,

    /// Labels were added
    Applied(Vec<String>),

    /// Labels would have been added (dry-run)
    DryRun(Vec<String>),
}

impl LabelOutcome {
    /// Matched labels, if any
    pub fn labels(&self) -> &[String] {
        match self {
            LabelOutcome::NoMatch => &[],
            LabelOutcome::Applied(labels) | LabelOutcome::DryRun(labels) => labels,
        }
    }
}

/// Human-readable report of labels a dry run would add
///
/// Names the repository, the pull request and the labels, e.g.
/// `owner/repo#7 would be labeled: docs`.
pub fn dry_run_notice(repository: &str, number: u64, labels: &[String]) -> String {
    format!(
        "{}#{} would be labeled: {}",
        repository,
        number,
        labels.join(", ")
    )
}

/// Pull Request Labeler
///
/// Applies loaded label rules to one pull request at a time
pub struct PrLabeler<'a, S: PullRequestService + ?Sized> {
    service: &'a S,
    rules: &'a LabelRules,
    repository: &'a str,
    dry_run: bool,
}

impl<'a, S: PullRequestService + ?Sized> PrLabeler<'a, S> {
    /// Create a new labeler
    ///
    /// # Arguments
    /// - `service`: Hosting platform client
    /// - `rules`: Loaded label rules
    /// - `repository`: "owner/repo", used in dry-run notices
    /// - `dry_run`: Report labels instead of applying them
    pub fn new(service: &'a S, rules: &'a LabelRules, repository: &'a str, dry_run: bool) -> Self {
        Self {
            service,
            rules,
            repository,
            dry_run,
        }
    }

    /// Label a pull request if any rule matches its changed files
    ///
    /// All matching labels are added in a single request. In dry-run mode
    /// a notice is logged instead and nothing is mutated.
    ///
    /// # Errors
    /// Returns an error if fetching changed files or adding labels fails
    pub async fn label_if_matched(&self, pr: &PullRequest) -> Result<LabelOutcome> {
        let changed_files = self.service.list_changed_files(pr.number).await?;
        let labels = self.rules.matching_labels(&changed_files);

        tracing::debug!(
            pr = pr.number,
            files = changed_files.len(),
            matched = labels.len(),
            "Evaluated label rules"
        );

        if labels.is_empty() {
            return Ok(LabelOutcome::NoMatch);
        }

        if self.dry_run {
            tracing::info!(
                title = pr.title.as_deref().unwrap_or_default(),
                "[dry-run] {}",
                dry_run_notice(self.repository, pr.number, &labels)
            );
            return Ok(LabelOutcome::DryRun(labels));
        }

        self.service.add_labels(pr.number, &labels).await?;
        tracing::info!("{}#{} labeled: {}", self.repository, pr.number, labels.join(", "));

        Ok(LabelOutcome::Applied(labels))
    }
}
