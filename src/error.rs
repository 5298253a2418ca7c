//! Error Handling
//!
//! Error type definitions used in gh-label-backfill

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gh-label-backfill
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    GitHubApi(#[from] octocrab::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid rule for label '{label}': {detail}")]
    InvalidRule { label: String, detail: String },

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("Remote file '{0}' returned no decodable content")]
    EmptyContent(String),
}

impl Error {
    /// Create a new configuration validation error
    pub fn config_validation<S: Into<String>>(message: S) -> Self {
        Error::ConfigValidation(message.into())
    }

    /// Create a new invalid label rule error
    pub fn invalid_rule<L: Into<String>, D: Into<String>>(label: L, detail: D) -> Self {
        Error::InvalidRule {
            label: label.into(),
            detail: detail.into(),
        }
    }
}
