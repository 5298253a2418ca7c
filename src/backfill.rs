//! Label Backfill
//!
//! Pages through every pull request of a repository and applies the
//! configured path labels to each of them.

use crate::config::{load_rules, BackfillConfig};
use crate::error::Result;
use crate::github::{PullRequest, PullRequestService};
use crate::labeler::{dry_run_notice, LabelOutcome, PrLabeler};
use crate::retry::with_retries;

/// A pull request left unlabeled after exhausting its retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPullRequest {
    /// Pull request number
    pub number: u64,

    /// Error of the final attempt
    pub error: String,
}

/// Backfill result
#[derive(Debug, Clone, Default)]
pub struct BackfillSummary {
    /// Repository in "owner/repo" form
    pub repository: String,

    /// Non-empty pages fetched
    pub pages: u32,

    /// Pull requests visited
    pub processed: u32,

    /// Pull requests that received labels
    pub labeled: Vec<(u64, Vec<String>)>,

    /// Pull requests that would receive labels (dry-run)
    pub would_label: Vec<(u64, Vec<String>)>,

    /// Pull requests no rule matched
    pub unmatched: u32,

    /// Pull requests skipped after repeated failures
    pub skipped: Vec<SkippedPullRequest>,

    /// Whether this is a dry run
    pub dry_run: bool,
}

impl BackfillSummary {
    /// Create a new empty summary
    pub fn new<S: Into<String>>(repository: S, dry_run: bool) -> Self {
        Self {
            repository: repository.into(),
            dry_run,
            ..Default::default()
        }
    }

    /// Record the outcome for one pull request
    pub fn record(&mut self, number: u64, outcome: LabelOutcome) {
        self.processed += 1;
        match outcome {
            LabelOutcome::NoMatch => self.unmatched += 1,
            LabelOutcome::Applied(labels) => self.labeled.push((number, labels)),
            LabelOutcome::DryRun(labels) => self.would_label.push((number, labels)),
        }
    }

    /// Record a pull request that could not be processed
    pub fn record_skip(&mut self, number: u64, error: String) {
        self.processed += 1;
        self.skipped.push(SkippedPullRequest { number, error });
    }

    /// Dry-run report lines, one per pull request that would be labeled
    pub fn dry_run_notices(&self) -> Vec<String> {
        self.would_label
            .iter()
            .map(|(number, labels)| dry_run_notice(&self.repository, *number, labels))
            .collect()
    }

    /// Whether every pull request was processed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Listing position
///
/// The listing has no explicit last-page marker: paging stops once a
/// fetched page comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageCursor {
    page: u32,
    last_page_size: Option<usize>,
}

impl PageCursor {
    fn start() -> Self {
        Self {
            page: 1,
            last_page_size: None,
        }
    }

    fn has_more(&self) -> bool {
        self.last_page_size != Some(0)
    }

    fn advance(&mut self, fetched: usize) {
        self.last_page_size = Some(fetched);
        if fetched > 0 {
            self.page += 1;
        }
    }
}

/// Label Backfill Engine
///
/// Runs the backfill for one repository
pub struct Backfiller<S: PullRequestService> {
    service: S,
    config: BackfillConfig,
}

impl<S: PullRequestService> Backfiller<S> {
    /// Create a new backfill engine
    ///
    /// # Errors
    /// Returns an error if configuration validation fails
    pub fn new(service: S, config: BackfillConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { service, config })
    }

    /// Hosting platform client
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the backfill to completion
    ///
    /// Rules are loaded once before the first page. Each pull request is
    /// retried per the configured policy; one that still fails is logged
    /// and skipped. After every non-empty page the run pauses for the
    /// configured cooldown.
    ///
    /// # Errors
    /// Returns an error if the label configuration cannot be loaded, or if a
    /// pull request page cannot be listed
    pub async fn run(&self) -> Result<BackfillSummary> {
        let rules = load_rules(
            &self.service,
            &self.config.config_path,
            &self.config.config_ref,
        )
        .await?;

        let repository = self.config.repository();
        let labeler = PrLabeler::new(&self.service, &rules, &repository, self.config.dry_run);
        let mut summary = BackfillSummary::new(repository.as_str(), self.config.dry_run);
        let mut cursor = PageCursor::start();

        tracing::info!(
            repository = %repository,
            dry_run = self.config.dry_run,
            "Starting label backfill"
        );

        while cursor.has_more() {
            let prs = self.fetch_page(cursor.page).await?;
            tracing::info!(page = cursor.page, count = prs.len(), "Fetched pull requests");

            cursor.advance(prs.len());
            if prs.is_empty() {
                break;
            }
            summary.pages += 1;

            for pr in &prs {
                self.process(&labeler, pr, &mut summary).await;
            }

            tracing::debug!(cooldown = ?self.config.page_cooldown, "Pausing before next page");
            tokio::time::sleep(self.config.page_cooldown).await;
        }

        tracing::info!(
            processed = summary.processed,
            labeled = summary.labeled.len(),
            would_label = summary.would_label.len(),
            skipped = summary.skipped.len(),
            "Label backfill finished"
        );

        Ok(summary)
    }

    /// Fetch one page of pull requests, retried like pull request work
    async fn fetch_page(&self, page: u32) -> Result<Vec<PullRequest>> {
        let what = format!("Listing pull request page {page}");
        with_retries(self.config.retry, &what, move || {
            self.service.list_pull_requests(page, self.config.per_page)
        })
        .await
    }

    /// Label one pull request, skipping it once retries are exhausted
    async fn process(
        &self,
        labeler: &PrLabeler<'_, S>,
        pr: &PullRequest,
        summary: &mut BackfillSummary,
    ) {
        let what = format!("Labeling {}#{}", self.config.repository(), pr.number);

        match with_retries(self.config.retry, &what, move || labeler.label_if_matched(pr)).await {
            Ok(outcome) => summary.record(pr.number, outcome),
            Err(e) => {
                tracing::error!(
                    pr = pr.number,
                    title = pr.title.as_deref().unwrap_or_default(),
                    "Skipping pull request: {}",
                    e
                );
                summary.record_skip(pr.number, e.to_string());
            }
        }
    }
}
