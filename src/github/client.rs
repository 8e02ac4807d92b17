use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{header, Client, Response, StatusCode};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::github::paginator::Paginator;
use crate::github::rate_limiter::RateLimiter;
use crate::models::{CommitSummary, ReadmePayload, RepoDetails, Repository, TopicsResponse, TreeResponse};

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, "https://api.github.com")
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("gitportfolio/0.1"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.wait().await;
        let response = self.client.get(url).send().await?;
        self.rate_limiter.update_from_response(&response);
        check_status(response)
    }

    /// One page of the user's repository listing. The boolean is true when
    /// more pages remain.
    pub async fn list_repos_page(
        &self,
        username: &str,
        per_page: u32,
        page: u32,
    ) -> Result<(Vec<Repository>, bool)> {
        let url = format!(
            "{}/users/{}/repos?type=owner&sort=updated",
            self.base_url, username
        );
        let paginator = Paginator::new(&self.client, &self.rate_limiter);

        match paginator.fetch_page(&url, per_page, page).await {
            Err(e) if e.is_not_found() => Err(Error::UserNotFound(username.to_string())),
            other => other,
        }
    }

    pub async fn get_repo_details(&self, owner: &str, repo: &str) -> Result<RepoDetails> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        tracing::debug!("Fetching details for: {}/{}", owner, repo);
        let response = self.get(&url).await?;
        Ok(response.json().await?)
    }

    pub async fn get_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, u64>> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        Ok(response.json().await?)
    }

    pub async fn get_repo_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let url = format!("{}/repos/{}/{}/topics", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        let topics: TopicsResponse = response.json().await?;
        Ok(topics.names)
    }

    /// Decoded README text. A missing README or an undecodable payload is
    /// None, never an error.
    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/{}/readme", self.base_url, owner, repo);
        match self.get(&url).await {
            Ok(response) => {
                let payload: ReadmePayload = response.json().await?;
                Ok(decode_readme(&payload))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> Result<bool> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.base_url, owner, repo, branch
        );
        match self.get(&url).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn get_recent_commits(
        &self,
        owner: &str,
        repo: &str,
        limit: u32,
    ) -> Result<Vec<CommitSummary>> {
        let url = format!("{}/repos/{}/{}/commits", self.base_url, owner, repo);
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::debug!("Fetching commits for: {}/{}", owner, repo);
        paginator.fetch_limited(&url, limit.min(100), limit).await
    }

    /// Blob paths from the recursive tree of `branch`, in listing order.
    pub async fn get_repo_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.base_url, owner, repo, branch
        );
        let response = self.get(&url).await?;
        let listing: TreeResponse = response.json().await?;

        if listing.truncated {
            tracing::warn!("Tree listing truncated for {}/{}", owner, repo);
        }

        Ok(listing
            .tree
            .into_iter()
            .filter(|entry| entry.is_blob())
            .map(|entry| entry.path)
            .collect())
    }
}

/// Maps non-success statuses onto the error taxonomy: 401 is an
/// authentication failure, 403/429 with an exhausted quota is a rate limit,
/// everything else keeps its status for the caller to interpret.
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::AuthRejected);
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if remaining == Some(0) {
            let reset = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(Error::RateLimited(reset));
        }
    }

    Err(Error::GitHubApi {
        status: status.as_u16(),
        url: response.url().to_string(),
    })
}

fn decode_readme(payload: &ReadmePayload) -> Option<String> {
    if payload.encoding != "base64" {
        return None;
    }

    // The API wraps the base64 body in newlines.
    let cleaned: String = payload
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = BASE64.decode(cleaned).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::Server) -> GitHubClient {
        GitHubClient::with_base_url("test-token", &server.url()).unwrap()
    }

    #[test]
    fn decode_readme_round_trips_hello_world() {
        let payload = ReadmePayload {
            content: "SGVsbG8sIFdvcmxkIQ==\n".to_string(),
            encoding: "base64".to_string(),
        };
        assert_eq!(decode_readme(&payload), Some("Hello, World!".to_string()));
    }

    #[test]
    fn decode_readme_rejects_garbage() {
        let payload = ReadmePayload {
            content: "not base64 at all!!".to_string(),
            encoding: "base64".to_string(),
        };
        assert_eq!(decode_readme(&payload), None);

        let payload = ReadmePayload {
            content: "SGVsbG8=".to_string(),
            encoding: "utf-8".to_string(),
        };
        assert_eq!(decode_readme(&payload), None);
    }

    #[tokio::test]
    async fn listing_maps_401_to_auth_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/users/alice/repos?type=owner&sort=updated&per_page=100&page=1",
            )
            .with_status(401)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.list_repos_page("alice", 100, 1).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::AuthRejected)));
    }

    #[tokio::test]
    async fn listing_maps_404_to_user_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/users/ghost/repos?type=owner&sort=updated&per_page=100&page=1",
            )
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.list_repos_page("ghost", 100, 1).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::UserNotFound(name)) if name == "ghost"));
    }

    #[tokio::test]
    async fn listing_maps_exhausted_quota_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/users/alice/repos?type=owner&sort=updated&per_page=100&page=1",
            )
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", "1700000000")
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.list_repos_page("alice", 100, 1).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::RateLimited(1700000000))));
    }

    #[tokio::test]
    async fn readme_404_is_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/demo/readme")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server);
        let readme = client.get_readme("alice", "demo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(readme, None);
    }

    #[tokio::test]
    async fn readme_decodes_base64_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/demo/readme")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": "SGVsbG8sIFdvcmxkIQ==\n", "encoding": "base64"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let readme = client.get_readme("alice", "demo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(readme, Some("Hello, World!".to_string()));
    }

    #[tokio::test]
    async fn readme_500_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/demo/readme")
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.get_readme("alice", "demo").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ref e) if e.is_server_error()));
    }

    #[tokio::test]
    async fn branch_probe_distinguishes_present_and_absent() {
        let mut server = mockito::Server::new_async().await;
        let main_mock = server
            .mock("GET", "/repos/alice/demo/branches/main")
            .with_status(404)
            .create_async()
            .await;
        let master_mock = server
            .mock("GET", "/repos/alice/demo/branches/master")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "master"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        assert!(!client.branch_exists("alice", "demo", "main").await.unwrap());
        assert!(client.branch_exists("alice", "demo", "master").await.unwrap());

        main_mock.assert_async().await;
        master_mock.assert_async().await;
    }

    #[tokio::test]
    async fn tree_listing_keeps_blob_paths_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/demo/git/trees/main?recursive=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "tree": [
                        {"path": "src", "type": "tree"},
                        {"path": "src/main.rs", "type": "blob"},
                        {"path": "Cargo.toml", "type": "blob"}
                    ],
                    "truncated": false
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let paths = client.get_repo_tree("alice", "demo", "main").await.unwrap();

        mock.assert_async().await;
        assert_eq!(paths, vec!["src/main.rs", "Cargo.toml"]);
    }

    #[tokio::test]
    async fn commits_respect_the_requested_limit() {
        let mut server = mockito::Server::new_async().await;

        let mut body = String::from("[");
        for i in 0..3 {
            if i > 0 {
                body.push(',');
            }
            body.push_str(&format!(
                r#"{{"sha": "sha{i}",
                    "commit": {{"message": "commit {i}",
                               "author": {{"name": "Alice", "date": "2024-01-0{}T00:00:00Z"}}}},
                    "author": {{"login": "alice"}}}}"#,
                3 - i
            ));
        }
        body.push(']');

        let mock = server
            .mock("GET", "/repos/alice/demo/commits?per_page=2&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(&body)
            .create_async()
            .await;

        let client = test_client(&server);
        let commits = client.get_recent_commits("alice", "demo", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "sha0");
    }
}
