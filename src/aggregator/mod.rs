pub mod fetcher;
pub mod fork_policy;

pub use fetcher::RepositoryAggregator;
