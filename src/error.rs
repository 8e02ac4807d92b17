use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {status} for {url}")]
    GitHubApi { status: u16, url: String },

    #[error("Authentication rejected by GitHub (check GITHUB_TOKEN)")]
    AuthRejected,

    #[error("Rate limit exhausted, resets at unix timestamp {0}")]
    RateLimited(u64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for 5xx responses from a per-repository detail fetch. Whether
    /// these degrade the field or abort the run is decided by
    /// `ServerErrorPolicy`.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::GitHubApi { status, .. } if *status >= 500)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::GitHubApi { status: 404, .. })
    }
}
