use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::commit::CommitSummary;

/// One aggregated repository, ready for serialization. Assembled once by the
/// aggregator and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stars: u32,
    pub forks: u32,
    pub watchers: u32,
    pub open_issues: u32,
    pub language: Option<String>,
    pub languages: HashMap<String, u64>,
    pub topics: Vec<String>,
    pub readme: Option<String>,
    pub license: Option<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub default_branch: String,
    pub file_structure: Vec<String>,
    pub recent_commits: Vec<CommitRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub message: String,
    pub date: DateTime<Utc>,
    pub author: String,
}

impl From<&CommitSummary> for CommitRecord {
    fn from(summary: &CommitSummary) -> Self {
        Self {
            message: summary.commit.message.clone(),
            date: summary.commit.author.date,
            author: summary.commit.author.name.clone(),
        }
    }
}
