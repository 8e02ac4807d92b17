use crate::models::CommitSummary;

/// How many of the most recent commits are inspected when deciding whether
/// a fork is active.
pub const FORK_ACTIVITY_COMMITS: u32 = 30;

/// True when any commit is attributed to `username`, either by the git
/// author name or by the matched GitHub login.
pub fn user_authored_any(commits: &[CommitSummary], username: &str) -> bool {
    commits.iter().any(|c| {
        c.commit.author.name == username
            || c.author
                .as_ref()
                .map(|a| a.login == username)
                .unwrap_or(false)
    })
}
