use std::sync::Arc;

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::aggregator::fork_policy::{user_authored_any, FORK_ACTIVITY_COMMITS};
use crate::config::{AggregatorConfig, ServerErrorPolicy};
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::models::{CommitRecord, Repository, RepositoryRecord};

const LISTING_PAGE_SIZE: u32 = 100;

pub struct RepositoryAggregator {
    github: Arc<GitHubClient>,
    config: AggregatorConfig,
}

impl RepositoryAggregator {
    pub fn new(github: GitHubClient, config: AggregatorConfig) -> Self {
        Self {
            github: Arc::new(github),
            config,
        }
    }

    /// Enumerates the user's repositories, applies the fork policy, and
    /// assembles one record per surviving repository. Output order matches
    /// the upstream listing order. Only a listing failure is fatal; detail
    /// fetches degrade field by field.
    pub async fn fetch_all(&self, username: &str) -> Result<Vec<RepositoryRecord>> {
        if username.is_empty() {
            return Err(Error::Config("username must not be empty".to_string()));
        }
        if self.config.max_repos == 0 {
            return Err(Error::Config("max_repos must be positive".to_string()));
        }

        let candidates = self.list_candidates(username).await?;
        tracing::info!("Assembling {} repository records", candidates.len());
        self.assemble_records(&candidates).await
    }

    /// Pages through the listing until `max_repos` repositories survive the
    /// fork policy or the listing is exhausted. Pages that filter down to
    /// nothing do not stop the walk.
    async fn list_candidates(&self, username: &str) -> Result<Vec<Repository>> {
        let mut survivors = Vec::new();
        let mut page = 1;

        loop {
            let (repos, has_next) = self
                .github
                .list_repos_page(username, LISTING_PAGE_SIZE, page)
                .await?;

            for repo in repos {
                if repo.fork && !self.keep_fork(username, &repo).await? {
                    continue;
                }
                survivors.push(repo);
                if survivors.len() >= self.config.max_repos {
                    return Ok(survivors);
                }
            }

            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(survivors)
    }

    async fn keep_fork(&self, username: &str, repo: &Repository) -> Result<bool> {
        if !self.config.include_forks {
            tracing::info!("Skipping fork: {}", repo.name);
            return Ok(false);
        }
        if !self.config.skip_inactive_forks {
            return Ok(true);
        }

        let commits = self
            .degrade(
                "fork activity check",
                &repo.full_name,
                self.github
                    .get_recent_commits(&repo.owner.login, &repo.name, FORK_ACTIVITY_COMMITS)
                    .await,
            )?
            .unwrap_or_default();

        if user_authored_any(&commits, username) {
            Ok(true)
        } else {
            tracing::info!("Skipping inactive fork: {}", repo.name);
            Ok(false)
        }
    }

    async fn assemble_records(&self, repos: &[Repository]) -> Result<Vec<RepositoryRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit.max(1)));

        let pb = ProgressBar::new(repos.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} repos")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut record_futures = Vec::new();
        for repo in repos {
            let sem = semaphore.clone();
            let pb = pb.clone();

            record_futures.push(async move {
                let _permit = sem.acquire().await.ok();
                let record = self.assemble_record(repo).await;
                pb.inc(1);
                record
            });
        }

        // join_all keeps enumeration order.
        let results = join_all(record_futures).await;
        pb.finish_and_clear();
        results.into_iter().collect()
    }

    async fn assemble_record(&self, repo: &Repository) -> Result<RepositoryRecord> {
        let owner = &repo.owner.login;
        let name = &repo.name;
        tracing::info!("Fetching data for {}", repo.full_name);

        let mut details = self
            .degrade(
                "metadata",
                &repo.full_name,
                self.github.get_repo_details(owner, name).await,
            )?
            .unwrap_or_default();
        if details.name.is_empty() {
            details.name = repo.name.clone();
            details.full_name = repo.full_name.clone();
        }

        let languages = self
            .degrade(
                "languages",
                &repo.full_name,
                self.github.get_repo_languages(owner, name).await,
            )?
            .unwrap_or_default();

        let topics = self
            .degrade(
                "topics",
                &repo.full_name,
                self.github.get_repo_topics(owner, name).await,
            )?
            .unwrap_or_default();

        let readme = self
            .degrade(
                "readme",
                &repo.full_name,
                self.github.get_readme(owner, name).await,
            )?
            .flatten();

        // Branch resolution has to land before the tree fetch; the tree
        // endpoint is branch-scoped.
        let default_branch = self.resolve_default_branch(owner, name).await?;

        let file_structure = self
            .degrade(
                "file tree",
                &repo.full_name,
                self.github
                    .get_repo_tree(owner, name, &default_branch)
                    .await,
            )?
            .unwrap_or_default();

        let recent_commits: Vec<CommitRecord> = self
            .degrade(
                "commits",
                &repo.full_name,
                self.github
                    .get_recent_commits(owner, name, self.config.commits_per_repo)
                    .await,
            )?
            .unwrap_or_default()
            .iter()
            .map(CommitRecord::from)
            .collect();

        Ok(RepositoryRecord {
            name: details.name,
            full_name: details.full_name,
            description: details.description,
            url: details.html_url,
            homepage: details.homepage,
            created_at: details.created_at,
            updated_at: details.updated_at,
            pushed_at: details.pushed_at,
            stars: details.stargazers_count,
            forks: details.forks_count,
            watchers: details.watchers_count,
            open_issues: details.open_issues_count,
            language: details.language,
            languages,
            topics,
            readme,
            license: details.license.map(|l| l.name),
            is_fork: details.fork || repo.fork,
            is_archived: details.archived,
            default_branch,
            file_structure,
            recent_commits,
        })
    }

    /// Probes for "main" and falls back to "master" when it is absent or the
    /// probe itself degraded.
    async fn resolve_default_branch(&self, owner: &str, name: &str) -> Result<String> {
        let full_name = format!("{}/{}", owner, name);
        let has_main = self
            .degrade(
                "branch probe",
                &full_name,
                self.github.branch_exists(owner, name, "main").await,
            )?
            .unwrap_or(false);

        Ok(if has_main { "main" } else { "master" }.to_string())
    }

    /// Field-level degradation: swallows the error and yields None, except
    /// for 5xx under `ServerErrorPolicy::Fail`.
    fn degrade<T>(&self, field: &str, repo: &str, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e)
                if e.is_server_error()
                    && self.config.server_error_policy == ServerErrorPolicy::Fail =>
            {
                Err(e)
            }
            Err(e) => {
                tracing::warn!("{} unavailable for {}: {}", field, repo, e);
                Ok(None)
            }
        }
    }
}
