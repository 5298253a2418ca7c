//! gh-label-backfill CLI
//!
//! Command line tool for backfilling path-based labels on existing pull requests

use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use gh_label_backfill::{
    config::{DEFAULT_CONFIG_REF, DEFAULT_PER_PAGE},
    retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy},
    BackfillConfig, BackfillSummary, Backfiller, GitHubClient,
};

/// gh-label-backfill CLI
///
/// Apply an auto-labeler configuration to pull requests opened before it existed
#[derive(Parser, Debug)]
#[command(
    name = "gh-label-backfill",
    version,
    about = "Retroactively apply path-based labels to existing pull requests",
    long_about = "Walks every pull request of a repository (open and closed), matches its \
    changed files against the glob rules of a labeler configuration file, and adds the \
    matching labels. Use the DRY_RUN argument to preview without changing anything."
)]
struct Cli {
    /// Repository owner
    owner: String,

    /// Repository name
    repo: String,

    /// GitHub access token
    token: String,

    /// Path of the labeler configuration file in the repository
    config_path: String,

    /// Dry run mode: exactly "true" or "false" (lowercase); "true" reports labels without applying them
    #[arg(action = ArgAction::Set, default_value_t = false, value_name = "true|false")]
    dry_run: bool,

    /// Branch, tag or SHA to read the configuration file at
    #[arg(long = "ref", default_value = DEFAULT_CONFIG_REF)]
    config_ref: String,

    /// Pull requests fetched per page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u8,

    /// Attempts per pull request before it is skipped
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Pause between attempts on the same pull request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Pause after each page of pull requests, in seconds
    #[arg(long, default_value_t = 120)]
    page_cooldown_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Build the run configuration from parsed arguments
    fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            access_token: self.token.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            config_path: self.config_path.clone(),
            config_ref: self.config_ref.clone(),
            dry_run: self.dry_run,
            per_page: self.per_page,
            retry: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_delay_ms),
            ),
            page_cooldown: Duration::from_secs(self.page_cooldown_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.backfill_config();

    if config.dry_run {
        println!(
            "{} Running in dry-run mode (no labels will be added)",
            "!".yellow()
        );
    }

    let client = GitHubClient::new(&config.access_token, &config.owner, &config.repo)
        .context("Failed to create GitHub client")?;
    let repository = config.repository();

    let backfiller = Backfiller::new(client, config)?;
    let summary = backfiller
        .run()
        .await
        .with_context(|| format!("Label backfill for {repository} aborted"))?;

    display_summary(&repository, &summary, cli.verbose);

    Ok(())
}

/// Install the log subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Display backfill results
fn display_summary(repository: &str, summary: &BackfillSummary, verbose: bool) {
    if summary.dry_run {
        println!("\n{} Backfill preview for {} (dry-run mode):", "📋".blue(), repository.cyan());
        for notice in summary.dry_run_notices() {
            println!("  {}", notice.cyan());
        }
    } else {
        println!("\n{} Backfill completed for {}:", "✓".green(), repository.cyan());
        if verbose {
            for (number, labels) in &summary.labeled {
                println!("  #{} labeled: {}", number, labels.join(", ").cyan());
            }
        }
    }

    println!("  Pages:     {}", summary.pages);
    println!("  Processed: {}", summary.processed);
    if summary.dry_run {
        println!(
            "  Would label: {}",
            summary.would_label.len().to_string().green()
        );
    } else {
        println!("  Labeled:   {}", summary.labeled.len().to_string().green());
    }
    println!("  Unmatched: {}", summary.unmatched.to_string().white());
    println!("  Skipped:   {}", summary.skipped.len().to_string().red());

    if !summary.is_complete() {
        eprintln!("\n{} Pull requests left unlabeled:", "✗".red());
        for skipped in &summary.skipped {
            eprintln!("  #{}: {}", skipped.number, skipped.error.red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from([
            "gh-label-backfill",
            "owner",
            "repo",
            "token",
            ".github/labeler.yml",
        ])
        .unwrap();

        assert_eq!(cli.owner, "owner");
        assert_eq!(cli.repo, "repo");
        assert_eq!(cli.token, "token");
        assert_eq!(cli.config_path, ".github/labeler.yml");
        assert!(!cli.dry_run);
        assert_eq!(cli.config_ref, "main");
    }

    #[test]
    fn test_dry_run_argument() {
        let cli = Cli::try_parse_from(["gh-label-backfill", "o", "r", "t", "l.yml", "true"])
            .unwrap();
        assert!(cli.dry_run);

        let cli = Cli::try_parse_from(["gh-label-backfill", "o", "r", "t", "l.yml", "false"])
            .unwrap();
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_dry_run_accepts_only_true_or_false() {
        let result = Cli::try_parse_from(["gh-label-backfill", "o", "r", "t", "l.yml", "yes"]);
        assert!(result.is_err());

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("exactly \"true\" or \"false\""));
    }

    #[test]
    fn test_missing_arguments_is_usage_error() {
        let result = Cli::try_parse_from(["gh-label-backfill", "owner", "repo", "token"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_backfill_config_from_flags() {
        let cli = Cli::try_parse_from([
            "gh-label-backfill",
            "owner",
            "repo",
            "token",
            "l.yml",
            "--ref",
            "master",
            "--max-attempts",
            "5",
            "--retry-delay-ms",
            "0",
            "--page-cooldown-secs",
            "0",
        ])
        .unwrap();

        let config = cli.backfill_config();
        assert_eq!(config.config_ref, "master");
        assert_eq!(config.retry, RetryPolicy::new(5, Duration::ZERO));
        assert_eq!(config.page_cooldown, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_display_summary() {
        let mut summary = BackfillSummary::new("owner/repo", true);
        summary.record(
            1,
            gh_label_backfill::LabelOutcome::DryRun(vec!["docs".to_string()]),
        );
        summary.record_skip(2, "boom".to_string());
        // Should not panic
        display_summary("owner/repo", &summary, true);
    }
}
