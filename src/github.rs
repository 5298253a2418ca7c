//! GitHub API Client
//!
//! Module for managing interactions with the GitHub API

use async_trait::async_trait;
use octocrab::{params, Octocrab};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pull Request Summary
///
/// The parts of a pull request listing this tool needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number
    pub number: u64,

    /// Pull request title
    pub title: Option<String>,
}

/// Hosting platform operations used by the backfill
///
/// Implemented by [`GitHubClient`]; the labeler and driver only talk to this
/// trait so they can run against an in-memory fake.
#[async_trait]
pub trait PullRequestService: Send + Sync {
    /// Fetch the decoded content of a repository file at a reference
    async fn fetch_file_content(&self, path: &str, reference: &str) -> Result<String>;

    /// List one page of pull requests in any state
    async fn list_pull_requests(&self, page: u32, per_page: u8) -> Result<Vec<PullRequest>>;

    /// List every file changed by a pull request
    async fn list_changed_files(&self, number: u64) -> Result<Vec<String>>;

    /// Add labels to a pull request in one request
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;
}

/// GitHub API Client
///
/// Client responsible for interactions with the GitHub API
pub struct GitHubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// No request is made until the first operation.
    ///
    /// # Arguments
    /// - `access_token`: GitHub access token
    /// - `owner`: Repository owner
    /// - `repo`: Repository name
    ///
    /// # Errors
    /// Returns an error if client initialization fails
    pub fn new(access_token: &str, owner: &str, repo: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(access_token.to_string())
            .build()
            .map_err(Error::GitHubApi)?;

        Ok(Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

#[async_trait]
impl PullRequestService for GitHubClient {
    async fn fetch_file_content(&self, path: &str, reference: &str) -> Result<String> {
        let content_items = self
            .octocrab
            .repos(&self.owner, &self.repo)
            .get_content()
            .path(path)
            .r#ref(reference)
            .send()
            .await
            .map_err(Error::GitHubApi)?;

        let file = content_items
            .items
            .first()
            .ok_or_else(|| Error::EmptyContent(path.to_string()))?;

        file.decoded_content()
            .ok_or_else(|| Error::EmptyContent(path.to_string()))
    }

    async fn list_pull_requests(&self, page: u32, per_page: u8) -> Result<Vec<PullRequest>> {
        let response = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .list()
            .state(params::State::All)
            .page(page)
            .per_page(per_page)
            .send()
            .await
            .map_err(Error::GitHubApi)?;

        Ok(response
            .items
            .into_iter()
            .map(|pr| PullRequest {
                number: pr.number,
                title: pr.title,
            })
            .collect())
    }

    async fn list_changed_files(&self, number: u64) -> Result<Vec<String>> {
        let first_page = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .list_files(number)
            .await
            .map_err(Error::GitHubApi)?;

        let entries = self
            .octocrab
            .all_pages(first_page)
            .await
            .map_err(Error::GitHubApi)?;

        Ok(entries.into_iter().map(|entry| entry.filename).collect())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.octocrab
            .issues(&self.owner, &self.repo)
            .add_labels(number, labels)
            .await
            .map_err(Error::GitHubApi)?;

        Ok(())
    }
}
