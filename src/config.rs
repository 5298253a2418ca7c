//! Configuration Management
//!
//! Label rule loading and backfill run settings

use std::time::Duration;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::github::PullRequestService;
use crate::matcher::{compile_patterns, LabelRule, MatchRule};
use crate::retry::RetryPolicy;

/// Default reference the configuration file is read at
pub const DEFAULT_CONFIG_REF: &str = "main";

/// Default page size for pull request listings
pub const DEFAULT_PER_PAGE: u8 = 30;

/// Default pause between pull request pages
pub const DEFAULT_PAGE_COOLDOWN: Duration = Duration::from_secs(120);

/// Match Configuration
///
/// One entry of a label's rule list, as written in the configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchConfig {
    /// Some changed file must match every one of these patterns
    pub any: Option<Vec<String>>,

    /// Every changed file must match every one of these patterns
    pub all: Option<Vec<String>>,
}

impl MatchConfig {
    /// Shorthand entry for a single pattern
    pub fn pattern<S: Into<String>>(pattern: S) -> Self {
        Self {
            any: Some(vec![pattern.into()]),
            all: None,
        }
    }

    /// Compile the patterns of this entry
    ///
    /// # Errors
    /// Returns an error if any pattern is not a valid glob
    pub fn compile(&self) -> Result<MatchRule> {
        Ok(MatchRule {
            any: self.any.as_deref().map(compile_patterns).transpose()?,
            all: self.all.as_deref().map(compile_patterns).transpose()?,
        })
    }
}

/// Rule value of a label as it appears in the configuration file
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    /// `label: "docs/**"`
    SinglePattern(String),

    /// `label: [ "docs/**", { any: [...], all: [...] } ]`
    RuleList(Vec<MatchConfig>),
}

impl RuleValue {
    /// Normalize into the list form used at match time
    pub fn into_match_configs(self) -> Vec<MatchConfig> {
        match self {
            RuleValue::SinglePattern(pattern) => vec![MatchConfig::pattern(pattern)],
            RuleValue::RuleList(configs) => configs,
        }
    }
}

/// Loaded label rules, in configuration order
///
/// Read-only for the whole run once loaded.
#[derive(Debug, Clone, Default)]
pub struct LabelRules {
    rules: Vec<LabelRule>,
}

impl LabelRules {
    /// Compile label rules from their normalized configuration
    ///
    /// # Errors
    /// - If a label name appears twice
    /// - If any pattern is not a valid glob
    pub fn compile(configs: Vec<(String, Vec<MatchConfig>)>) -> Result<Self> {
        let mut rules: Vec<LabelRule> = Vec::with_capacity(configs.len());

        for (name, entries) in configs {
            if rules.iter().any(|rule| rule.name == name) {
                return Err(Error::invalid_rule(name, "label is defined more than once"));
            }

            let entries = entries
                .iter()
                .map(MatchConfig::compile)
                .collect::<Result<Vec<_>>>()?;
            rules.push(LabelRule { name, entries });
        }

        Ok(Self { rules })
    }

    /// Labels whose rule is satisfied by the changed files
    pub fn matching_labels<S: AsRef<str>>(&self, changed_files: &[S]) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(changed_files))
            .map(|rule| rule.name.clone())
            .collect()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no labels are configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over label rules
    pub fn iter(&self) -> impl Iterator<Item = &LabelRule> {
        self.rules.iter()
    }
}

/// Backfill Configuration
///
/// gh-label-backfill execution configuration
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// GitHub access token
    pub access_token: String,

    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Path of the labeler configuration file inside the repository
    pub config_path: String,

    /// Reference (branch, tag or SHA) the configuration file is read at
    pub config_ref: String,

    /// Dry-run mode (report labels instead of applying them)
    pub dry_run: bool,

    /// Pull requests fetched per page
    pub per_page: u8,

    /// Retry policy applied to each pull request
    pub retry: RetryPolicy,

    /// Pause after every non-empty page
    pub page_cooldown: Duration,
}

impl BackfillConfig {
    /// Create a configuration with default paging, retry and cooldown settings
    pub fn new<S: Into<String>>(
        access_token: S,
        owner: S,
        repo: S,
        config_path: S,
        dry_run: bool,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            owner: owner.into(),
            repo: repo.into(),
            config_path: config_path.into(),
            config_ref: DEFAULT_CONFIG_REF.to_string(),
            dry_run,
            per_page: DEFAULT_PER_PAGE,
            retry: RetryPolicy::default(),
            page_cooldown: DEFAULT_PAGE_COOLDOWN,
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    /// - If the token, owner, repository, path or reference is empty
    /// - If the page size is outside 1..=100
    /// - If the retry policy allows no attempt
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::config_validation("Access token is required"));
        }

        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(Error::config_validation(
                "Repository owner and name are required",
            ));
        }

        if self.config_path.trim().is_empty() {
            return Err(Error::config_validation(
                "Configuration file path is required",
            ));
        }

        if self.config_ref.trim().is_empty() {
            return Err(Error::config_validation("Configuration reference is required"));
        }

        if !(1..=100).contains(&self.per_page) {
            return Err(Error::config_validation(format!(
                "Page size must be between 1 and 100: {}",
                self.per_page
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::config_validation(
                "At least one attempt per pull request is required",
            ));
        }

        Ok(())
    }

    /// Repository in "owner/repo" form
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Describe a YAML value's type for error messages
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Read a top-level key as a label name
///
/// YAML reads keys such as `2024` or `true` as scalars; they name labels
/// just like quoted strings do.
fn label_name(key: &Value) -> Option<String> {
    match key {
        Value::String(name) => Some(name.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Parse a pattern list value (`any:` / `all:`)
///
/// A single string is accepted as a one-element list.
fn parse_pattern_list(label: &str, key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(pattern) => Ok(vec![pattern.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(pattern) => Ok(pattern.clone()),
                other => Err(Error::invalid_rule(
                    label,
                    format!("'{key}' patterns must be strings, found {}", describe(other)),
                )),
            })
            .collect(),
        other => Err(Error::invalid_rule(
            label,
            format!(
                "'{key}' must be a pattern or a list of patterns, found {}",
                describe(other)
            ),
        )),
    }
}

/// Parse one entry of a label's rule list
fn parse_match_config(label: &str, value: &Value) -> Result<MatchConfig> {
    match value {
        Value::String(pattern) => Ok(MatchConfig::pattern(pattern.clone())),
        Value::Mapping(fields) => {
            let mut config = MatchConfig::default();

            for (key, field) in fields {
                match key.as_str() {
                    Some("any") => config.any = Some(parse_pattern_list(label, "any", field)?),
                    Some("all") => config.all = Some(parse_pattern_list(label, "all", field)?),
                    Some(other) => {
                        return Err(Error::invalid_rule(
                            label,
                            format!("unknown key '{other}' (expected 'any' or 'all')"),
                        ));
                    }
                    None => {
                        return Err(Error::invalid_rule(
                            label,
                            format!("rule keys must be strings, found {}", describe(key)),
                        ));
                    }
                }
            }

            Ok(config)
        }
        other => Err(Error::invalid_rule(
            label,
            format!(
                "list entries must be a pattern or an any/all mapping, found {}",
                describe(other)
            ),
        )),
    }
}

/// Interpret the value of one top-level label key
///
/// # Errors
/// Returns an error if the value is neither a pattern string nor a list
pub fn parse_rule_value(label: &str, value: &Value) -> Result<RuleValue> {
    match value {
        Value::String(pattern) => Ok(RuleValue::SinglePattern(pattern.clone())),
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| parse_match_config(label, entry))
            .collect::<Result<Vec<_>>>()
            .map(RuleValue::RuleList),
        other => Err(Error::invalid_rule(
            label,
            format!(
                "expected a pattern or a list of rules, found {}",
                describe(other)
            ),
        )),
    }
}

/// Parse raw configuration content into an untyped document
///
/// The format is chosen by the file extension: `.json` is read as JSON,
/// everything else as YAML.
///
/// # Errors
/// If the content is not valid for its format
pub fn parse_document(content: &str, path: &str) -> Result<Value> {
    let ext = path.rsplit('.').next().unwrap_or("");

    let document = match ext {
        "json" => serde_json::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };

    Ok(document)
}

/// Parse label rules from configuration content
///
/// # Arguments
/// - `content`: Raw file content (YAML or JSON)
/// - `path`: File path used to determine the format by extension
///
/// # Errors
/// Any malformed label aborts the whole parse; no label is silently skipped.
pub fn parse_rules(content: &str, path: &str) -> Result<LabelRules> {
    let document = parse_document(content, path)?;

    let mapping = match &document {
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(Error::config_validation(format!(
                "{path}: expected a mapping of label names to rules, found {}",
                describe(other)
            )));
        }
    };

    let mut configs = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let label = label_name(key).ok_or_else(|| {
            Error::config_validation(format!(
                "{path}: label names must be strings, numbers or booleans, found {}",
                describe(key)
            ))
        })?;

        let rule = parse_rule_value(&label, value)?;
        configs.push((label, rule.into_match_configs()));
    }

    LabelRules::compile(configs)
}

/// Fetch and parse the label rules from the repository
///
/// # Arguments
/// - `service`: Hosting platform client
/// - `path`: Configuration file path within the repository
/// - `reference`: Branch, tag or SHA to read the file at
///
/// # Errors
/// If the file cannot be fetched or its content is malformed
pub async fn load_rules<S>(service: &S, path: &str, reference: &str) -> Result<LabelRules>
where
    S: PullRequestService + ?Sized,
{
    let content = service.fetch_file_content(path, reference).await?;
    let rules = parse_rules(&content, path)?;

    tracing::info!(
        path,
        reference,
        labels = rules.len(),
        "Loaded label configuration"
    );

    Ok(rules)
}
