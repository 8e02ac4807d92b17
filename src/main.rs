use clap::Parser;
use tracing_subscriber::EnvFilter;

use gitportfolio::{
    AggregatorConfig, Config, GitHubClient, RepositoryAggregator, ServerErrorPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "gitportfolio")]
#[command(version = "0.1.0")]
#[command(about = "Aggregate a GitHub user's repository metadata into a portfolio JSON file")]
struct Args {
    /// GitHub username (falls back to GITHUB_USERNAME)
    #[arg(short, long)]
    username: Option<String>,

    /// Maximum repositories to include
    #[arg(long, default_value = "50")]
    max_repos: usize,

    /// Exclude forked repositories entirely
    #[arg(long)]
    exclude_forks: bool,

    /// Keep forks even when the user has no commits in them
    #[arg(long)]
    keep_inactive_forks: bool,

    /// Recent commits recorded per repository
    #[arg(long, default_value = "10")]
    commits_per_repo: u32,

    /// Parallel detail fetches (1 = strictly sequential)
    #[arg(long, default_value = "1")]
    concurrency: usize,

    /// Treat 5xx responses on detail fetches as fatal instead of degrading
    /// the affected field
    #[arg(long)]
    fail_on_server_error: bool,

    /// Output file (defaults to <username>_github_portfolio.json)
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gitportfolio=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    let username = args.username.or(config.username).ok_or_else(|| {
        anyhow::anyhow!("no username given; pass --username or set GITHUB_USERNAME")
    })?;

    let github = GitHubClient::new(&config.github_token)?;

    let aggregator_config = AggregatorConfig {
        max_repos: args.max_repos,
        include_forks: !args.exclude_forks,
        skip_inactive_forks: !args.keep_inactive_forks,
        commits_per_repo: args.commits_per_repo,
        concurrency_limit: args.concurrency,
        server_error_policy: if args.fail_on_server_error {
            ServerErrorPolicy::Fail
        } else {
            ServerErrorPolicy::Degrade
        },
    };

    let aggregator = RepositoryAggregator::new(github, aggregator_config);

    tracing::info!("Fetching repositories for GitHub user: {}", username);
    let records = aggregator.fetch_all(&username).await?;

    let path = args
        .output
        .unwrap_or_else(|| format!("{}_github_portfolio.json", username));
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(&path, json)?;

    tracing::info!("Fetched {} repositories", records.len());
    tracing::info!("Data saved to {}", path);

    Ok(())
}
