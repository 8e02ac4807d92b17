use crate::error::{Error, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub username: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN")
            .map_err(|_| Error::Config("GITHUB_TOKEN environment variable not set".to_string()))?;

        let username = env::var("GITHUB_USERNAME").ok().filter(|v| !v.is_empty());

        Ok(Self {
            github_token,
            username,
        })
    }
}

/// What to do when a per-repository detail fetch comes back with a 5xx.
/// Client errors (404 on a README, empty language stats) always degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerErrorPolicy {
    /// Substitute the field's null/empty default and keep going.
    #[default]
    Degrade,
    /// Abort the whole run.
    Fail,
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_repos: usize,
    pub include_forks: bool,
    pub skip_inactive_forks: bool,
    pub commits_per_repo: u32,
    pub concurrency_limit: usize,
    pub server_error_policy: ServerErrorPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_repos: 50,
            include_forks: true,
            skip_inactive_forks: true,
            commits_per_repo: 10,
            concurrency_limit: 1,
            server_error_policy: ServerErrorPolicy::Degrade,
        }
    }
}
