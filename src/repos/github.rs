//! Thin wrapper over the GitHub CLI (`gh`) for the create-and-merge flow.
//!
//! `gh` output is never interpreted beyond the PR number: failures are shown
//! to the user exactly as `gh` printed them and nothing is retried.

use anyhow::Result;

use crate::core::ToolError;
use crate::repos::BranchPair;
use crate::utils::ToolCommand;

/// Verify `gh` is installed and runs.
pub async fn ensure_available() -> Result<()> {
    let probe = ToolCommand::new("gh").arg("--version").probe().await;
    match probe {
        Ok(out) if out.success => Ok(()),
        _ => Err(ToolError::ToolNotFound {
            tool: "gh".to_string(),
        }
        .into()),
    }
}

#[must_use]
pub fn pr_title(pair: &BranchPair) -> String {
    format!("Merge {} into {}", pair.head, pair.base)
}

#[must_use]
pub fn pr_body(pair: &BranchPair) -> String {
    format!("Automatic pull request: {} → {}", pair.head, pair.base)
}

pub fn create_command(repo: &str, pair: &BranchPair) -> ToolCommand {
    ToolCommand::new("gh")
        .args(["pr", "create", "--repo", repo, "--base", pair.base.as_str(), "--head", pair.head.as_str()])
        .arg("--title")
        .arg(pr_title(pair))
        .arg("--body")
        .arg(pr_body(pair))
}

pub fn list_command(repo: &str, head: &str) -> ToolCommand {
    ToolCommand::new("gh").args([
        "pr", "list", "--repo", repo, "--head", head, "--json", "number", "--jq", ".[0].number",
    ])
}

pub fn merge_command(repo: &str, number: &str) -> ToolCommand {
    ToolCommand::new("gh").args(["pr", "merge", number, "--repo", repo, "--merge"])
}

/// Create the pull request; `gh` talks to the terminal directly.
pub async fn create_pull_request(repo: &str, pair: &BranchPair) -> Result<()> {
    create_command(repo, pair).run_interactive_checked().await
}

/// Number of the open PR from `head`, if any.
pub async fn find_pull_request(repo: &str, head: &str) -> Result<Option<String>> {
    let number = list_command(repo, head).execute_stdout().await?;
    Ok(parse_pr_number(&number))
}

/// `gh --jq` prints `null` or nothing when the list is empty.
#[must_use]
pub fn parse_pr_number(output: &str) -> Option<String> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "null" || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub async fn merge_pull_request(repo: &str, number: &str) -> Result<()> {
    merge_command(repo, number).run_interactive_checked().await
}

/// Links printed after a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLinks {
    pub repository: String,
    pub pull_request: String,
    pub actions: String,
}

impl PullRequestLinks {
    pub fn new(repo: &str, number: &str) -> Self {
        let base = format!("https://github.com/{repo}");
        Self {
            pull_request: format!("{base}/pull/{number}"),
            actions: format!("{base}/actions"),
            repository: base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_command() {
        let pair = BranchPair::new("develop", "main");
        let cmd = create_command("acme/site", &pair);
        assert_eq!(
            cmd.get_args(),
            &[
                "pr",
                "create",
                "--repo",
                "acme/site",
                "--base",
                "main",
                "--head",
                "develop",
                "--title",
                "Merge develop into main",
                "--body",
                "Automatic pull request: develop → main",
            ]
        );
    }

    #[test]
    fn test_list_and_merge_commands() {
        assert_eq!(
            list_command("acme/site", "develop").display_line(),
            "gh pr list --repo acme/site --head develop --json number --jq .[0].number"
        );
        assert_eq!(
            merge_command("acme/site", "42").display_line(),
            "gh pr merge 42 --repo acme/site --merge"
        );
    }

    #[test]
    fn test_parse_pr_number() {
        assert_eq!(parse_pr_number("42\n").as_deref(), Some("42"));
        assert_eq!(parse_pr_number("null"), None);
        assert_eq!(parse_pr_number(""), None);
        assert_eq!(parse_pr_number("error"), None);
    }

    #[test]
    fn test_links() {
        let links = PullRequestLinks::new("acme/site", "7");
        assert_eq!(links.repository, "https://github.com/acme/site");
        assert_eq!(links.pull_request, "https://github.com/acme/site/pull/7");
        assert_eq!(links.actions, "https://github.com/acme/site/actions");
    }
}
