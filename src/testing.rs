//! In-memory hosting platform used by unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::github::{PullRequest, PullRequestService};

/// Recorded mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLabelsCall {
    pub number: u64,
    pub labels: Vec<String>,
}

/// Fake repository with scripted failures
#[derive(Default)]
pub struct FakeRepository {
    pub config_content: Option<String>,
    pub pages: Vec<Vec<u64>>,
    pub files: HashMap<u64, Vec<String>>,
    /// Remaining injected failures per pull request, consumed by `list_changed_files`
    pub failures: Mutex<HashMap<u64, u32>>,
    /// Remaining injected failures per pull request, consumed by `add_labels`
    pub add_failures: Mutex<HashMap<u64, u32>>,
    pub add_calls: Mutex<Vec<AddLabelsCall>>,
    pub listed_pages: Mutex<Vec<u32>>,
    pub file_requests: Mutex<Vec<(String, String)>>,
}

impl FakeRepository {
    pub fn with_config(content: &str) -> Self {
        Self {
            config_content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn page(mut self, numbers: &[u64]) -> Self {
        self.pages.push(numbers.to_vec());
        self
    }

    pub fn pr_files(mut self, number: u64, files: &[&str]) -> Self {
        self.files
            .insert(number, files.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn failing(self, number: u64, times: u32) -> Self {
        self.failures.lock().unwrap().insert(number, times);
        self
    }

    pub fn failing_add(self, number: u64, times: u32) -> Self {
        self.add_failures.lock().unwrap().insert(number, times);
        self
    }

    pub fn add_calls(&self) -> Vec<AddLabelsCall> {
        self.add_calls.lock().unwrap().clone()
    }

    pub fn listed_pages(&self) -> Vec<u32> {
        self.listed_pages.lock().unwrap().clone()
    }
}

/// Build the error the fake returns for injected failures
fn injected_failure(number: u64) -> Error {
    Error::config_validation(format!("injected failure for #{number}"))
}

/// Consume one injected failure for a pull request, if any remain
fn take_failure(failures: &Mutex<HashMap<u64, u32>>, number: u64) -> bool {
    let mut failures = failures.lock().unwrap();
    match failures.get_mut(&number) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl PullRequestService for FakeRepository {
    async fn fetch_file_content(&self, path: &str, reference: &str) -> Result<String> {
        self.file_requests
            .lock()
            .unwrap()
            .push((path.to_string(), reference.to_string()));

        self.config_content
            .clone()
            .ok_or_else(|| Error::EmptyContent(path.to_string()))
    }

    async fn list_pull_requests(&self, page: u32, _per_page: u8) -> Result<Vec<PullRequest>> {
        self.listed_pages.lock().unwrap().push(page);

        let numbers = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();

        Ok(numbers
            .into_iter()
            .map(|number| PullRequest {
                number,
                title: None,
            })
            .collect())
    }

    async fn list_changed_files(&self, number: u64) -> Result<Vec<String>> {
        if take_failure(&self.failures, number) {
            return Err(injected_failure(number));
        }

        Ok(self.files.get(&number).cloned().unwrap_or_default())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if take_failure(&self.add_failures, number) {
            return Err(injected_failure(number));
        }

        self.add_calls.lock().unwrap().push(AddLabelsCall {
            number,
            labels: labels.to_vec(),
        });
        Ok(())
    }
}
