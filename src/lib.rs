pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod aggregator;

pub use config::{AggregatorConfig, Config, ServerErrorPolicy};
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use aggregator::RepositoryAggregator;
