use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry from the paginated repository listing. Only the fields the
/// fork policy needs; everything else comes from the detail fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub fork: bool,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Extended metadata from the single-repository endpoint. Everything is
/// defaultable so a failed fetch can degrade to an empty shell instead of
/// killing the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoDetails {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub homepage: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    #[serde(default)]
    pub open_issues_count: u32,
    pub language: Option<String>,
    pub license: Option<License>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse {
    #[serde(default)]
    pub names: Vec<String>,
}

/// Raw README payload; `content` is base64 with embedded newlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadmePayload {
    pub content: String,
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}
