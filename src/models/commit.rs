use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitDetails,
    pub author: Option<CommitAuthorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    pub message: String,
    pub author: CommitAuthor,
}

/// The git-level author recorded in the commit itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// The GitHub account attributed to the commit, when GitHub could match one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthorInfo {
    pub login: String,
}
