//! # gh-label-backfill
//!
//! Retroactively apply path-based labels to existing GitHub pull requests
//!
//! ## Features
//! - Reuses an existing auto-labeler glob configuration (`any`/`all` rules, `!` negation)
//! - Visits every pull request, open or closed
//! - Per pull request retries with page-level throttling
//! - Dry-run mode

pub mod backfill;
pub mod config;
pub mod error;
pub mod github;
pub mod labeler;
pub mod matcher;
pub mod retry;

#[cfg(test)]
mod testing;

pub use backfill::{BackfillSummary, Backfiller};
pub use config::{BackfillConfig, LabelRules, MatchConfig};
pub use error::{Error, Result};
pub use github::{GitHubClient, PullRequest, PullRequestService};
pub use labeler::{LabelOutcome, PrLabeler};
pub use retry::{with_retries, RetryPolicy};

/// Backfill labels for every pull request of a repository
///
/// Uses the default page size, retry policy and page cooldown.
///
/// # Examples
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() -> gh_label_backfill::Result<()> {
///     let summary = gh_label_backfill::backfill_repository_labels(
///         "your_github_token",
///         "owner",
///         "repo",
///         ".github/labeler.yml",
///         true,
///     )
///     .await?;
///
///     println!("Backfill completed: {:?}", summary);
///     Ok(())
/// }
/// ```
pub async fn backfill_repository_labels(
    access_token: &str,
    owner: &str,
    repo: &str,
    config_path: &str,
    dry_run: bool,
) -> Result<BackfillSummary> {
    let config = BackfillConfig::new(access_token, owner, repo, config_path, dry_run);
    let client = GitHubClient::new(access_token, owner, repo)?;

    let backfiller = Backfiller::new(client, config)?;
    backfiller.run().await
}
